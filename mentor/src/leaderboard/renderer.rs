//! Leaderboard renderer
//!
//! Renders ranked rows to a markdown table for the terminal and to a plain
//! HTML page for the dashboard.

use crate::app::LeaderboardRow;
use crate::domain::entities::{EvaluationRecord, RepoStats, OVERALL_MAX, SCORE_MAX};

const SPARK_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the leaderboard as a markdown table
pub fn render_table(rows: &[LeaderboardRow]) -> String {
    let mut buf = String::new();

    buf.push_str("# MLOps Leaderboard\n\n");

    if rows.is_empty() {
        buf.push_str("_No groups evaluated yet. Run `mentor scrape` first._\n");
        return buf;
    }

    buf.push_str("| Rank | Group | Overall | Code | Tests | CI/CD | Conf. | Commits | To main | Contributions | Repository |\n");
    buf.push_str("|------|-------|---------|------|-------|-------|-------|---------|---------|---------------|------------|\n");

    for row in rows {
        let flag = if row.failures.is_empty() { "" } else { " (!)" };
        buf.push_str(&format!(
            "| {} | {}{} | {}/{} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            row.rank,
            row.group,
            flag,
            row.overall_score,
            OVERALL_MAX,
            row.code_quality,
            row.unit_testing,
            row.ci_cd,
            row.confidence,
            or_dash(row.total_commits),
            or_dash(row.num_commits),
            sparkline(&row.contributions),
            truncate(&row.repo_url, 60),
        ));
    }

    if rows.iter().any(|r| !r.failures.is_empty()) {
        buf.push_str("\n(!) some criteria got a fallback score, see `GET /groups/:number`\n");
    }

    buf
}

/// Render one group's record with per-criterion justifications
pub fn render_group_detail(record: &EvaluationRecord) -> String {
    let mut buf = String::new();

    buf.push_str(&format!("# Group {}\n\n", record.group));
    buf.push_str(&format!("**Repository:** {}\n", record.repo_url));
    buf.push_str(&format!("**Students:** {}\n", record.group_size));
    buf.push_str(&format!(
        "**Overall:** {}/{} (confidence {}/10)\n",
        record.overall_score, OVERALL_MAX, record.confidence
    ));
    buf.push_str(&format!(
        "**Evaluated:** {} (run {})\n\n",
        record.evaluated_at.format("%Y-%m-%d %H:%M UTC"),
        record.run_id
    ));

    for score in &record.scores {
        buf.push_str(&format!(
            "## {}: {}/{}\n\n",
            score.criterion.label(),
            score.score,
            SCORE_MAX
        ));
        if let Some(failure) = score.failure {
            buf.push_str(&format!("_Fallback score ({})_\n\n", failure));
        }
        buf.push_str(&score.justification);
        buf.push_str("\n\n");
    }

    if let Some(stats) = &record.stats {
        buf.push_str(&render_stats(stats));
    }

    buf
}

fn render_stats(stats: &RepoStats) -> String {
    let mut buf = String::new();

    buf.push_str("## Repository statistics\n\n");
    buf.push_str(&format!(
        "- Contributors: {} {}\n",
        stats.num_contributors,
        sparkline(&stats.contributions_per_contributor)
    ));
    buf.push_str(&format!(
        "- Commits: {} total, {} on the default branch\n",
        stats.total_commits, stats.num_commits
    ));
    buf.push_str(&format!(
        "- Average commit message: {:.0} chars ({:.0} on the default branch)\n",
        stats.average_commit_length, stats.average_commit_length_to_main
    ));
    buf.push_str(&format!(
        "- Pull requests: {} ({} merged)\n",
        stats.num_prs, stats.num_merged_prs
    ));
    if let Some(latest) = stats.latest_commit {
        buf.push_str(&format!("- Latest commit: {}\n", latest.format("%Y-%m-%d")));
    }
    buf.push_str(&format!(
        "- Python files: {}, Dockerfiles: {}, workflows: {}\n",
        stats.num_python_files, stats.num_docker_files, stats.num_workflow_files
    ));
    buf.push_str(&format!(
        "- requirements.txt: {}, cloudbuild: {}, DVC: {}\n",
        yes_no(stats.has_requirements_file),
        yes_no(stats.has_cloudbuild),
        yes_no(stats.using_dvc)
    ));
    buf.push_str(&format!(
        "- Size: {:.2} MB, README words: {}\n",
        stats.repo_size_mb, stats.readme_words
    ));
    let ci = match stats.actions_passing {
        Some(true) => "passing",
        Some(false) => "failing",
        None => "no runs",
    };
    buf.push_str(&format!("- CI on head commit: {}\n", ci));

    buf
}

/// Render the dashboard page
pub fn render_dashboard_html(rows: &[LeaderboardRow]) -> String {
    let mut buf = String::new();

    buf.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    buf.push_str("<title>MLOps Leaderboard</title>\n");
    buf.push_str(
        "<style>body{font-family:sans-serif;margin:2em}table{border-collapse:collapse}\
         th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
         tr.fallback td{background:#fff4e5}</style>\n",
    );
    buf.push_str("</head>\n<body>\n<h1>MLOps Leaderboard</h1>\n");

    if rows.is_empty() {
        buf.push_str("<p><em>No groups evaluated yet.</em></p>\n</body>\n</html>\n");
        return buf;
    }

    buf.push_str("<table>\n<thead><tr><th>Rank</th><th>Group</th><th>Overall</th><th>Code quality</th>\
                  <th>Unit testing</th><th>CI/CD</th><th>Confidence</th><th>Commits</th><th>Contributions</th>\
                  <th>CI</th><th>Repository</th></tr></thead>\n<tbody>\n");

    for row in rows {
        let class = if row.failures.is_empty() { "" } else { " class=\"fallback\"" };
        let ci = match row.actions_passing {
            Some(true) => "passing",
            Some(false) => "failing",
            None => "-",
        };
        buf.push_str(&format!(
            "<tr{}><td>{}</td><td><a href=\"/groups/{}\">{}</a></td><td>{}</td><td>{}</td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><a href=\"{}\">{}</a></td></tr>\n",
            class,
            row.rank,
            row.group,
            row.group,
            row.overall_score,
            row.code_quality,
            row.unit_testing,
            row.ci_cd,
            row.confidence,
            or_dash(row.total_commits),
            sparkline(&row.contributions),
            ci,
            escape_html(&row.repo_url),
            escape_html(&truncate(&row.repo_url, 60)),
        ));
    }

    buf.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    buf
}

/// Text sparkline scaled to the largest value
pub fn sparkline(values: &[u32]) -> String {
    let max = values.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return String::new();
    }

    values
        .iter()
        .map(|&v| {
            let level = (v as usize * (SPARK_BLOCKS.len() - 1) + max as usize / 2) / max as usize;
            SPARK_BLOCKS[level.min(SPARK_BLOCKS.len() - 1)]
        })
        .collect()
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Truncate a string to max characters, adding ellipsis if needed
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

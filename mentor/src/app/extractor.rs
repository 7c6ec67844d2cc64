//! Feature extractor
//!
//! Reduces a repository snapshot to a bounded text summary per criterion.
//! Everything here is pure; the same snapshot always yields the same text.

use serde::Serialize;

use crate::domain::entities::{Criterion, FileContent, FileRole, RepositorySnapshot};
use crate::domain::ports::{GitHubTreeEntry, TreeEntryKind};

/// Appended when a summary had to be cut to fit the budget
pub const TRUNCATION_MARKER: &str = "\n[... truncated]\n";

/// Smallest per-file content cap, whatever the budget
const MIN_FILE_CAP: usize = 256;

/// Bounded context handed to the evaluator for one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedSummary {
    pub criterion: Criterion,
    pub text: String,
    /// Relevant files found in the tree
    pub file_count: usize,
    pub truncated: bool,
}

impl ExtractedSummary {
    /// Nothing relevant for this criterion exists in the repository
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }
}

/// Files a criterion looks at
pub fn role_for(criterion: Criterion) -> FileRole {
    match criterion {
        Criterion::CodeQuality => FileRole::Source,
        Criterion::UnitTesting => FileRole::Test,
        Criterion::CiCd => FileRole::Ci,
    }
}

/// Pick which blobs the fetcher should download.
///
/// Takes files round-robin across source, test and CI roles so a large
/// source tree can't crowd out the tests, skipping anything over
/// `max_file_bytes`. Shallow paths come first within a role.
pub fn select_files_to_fetch(
    tree: &[GitHubTreeEntry],
    max_files: usize,
    max_file_bytes: u64,
) -> Vec<String> {
    let mut by_role: Vec<Vec<&str>> = [FileRole::Source, FileRole::Test, FileRole::Ci]
        .iter()
        .map(|role| {
            let mut paths: Vec<&str> = tree
                .iter()
                .filter(|e| e.kind == TreeEntryKind::Blob)
                .filter(|e| e.size.map(|s| s <= max_file_bytes).unwrap_or(true))
                .filter(|e| FileRole::classify(&e.path) == *role)
                .map(|e| e.path.as_str())
                .collect();
            paths.sort_by_key(|p| (p.matches('/').count(), *p));
            paths.reverse();
            paths
        })
        .collect();

    let mut selected = Vec::new();
    while selected.len() < max_files && by_role.iter().any(|paths| !paths.is_empty()) {
        for paths in by_role.iter_mut() {
            if selected.len() >= max_files {
                break;
            }
            if let Some(path) = paths.pop() {
                selected.push(path.to_string());
            }
        }
    }

    selected
}

/// Build the summary for one criterion, never longer than `budget` bytes
pub fn extract(snapshot: &RepositorySnapshot, criterion: Criterion, budget: usize) -> ExtractedSummary {
    let role = role_for(criterion);

    let mut listed: Vec<&str> = snapshot
        .blob_paths()
        .filter(|p| FileRole::classify(p) == role)
        .collect();
    listed.sort_unstable();

    let contents: Vec<&FileContent> = snapshot
        .files
        .iter()
        .filter(|f| FileRole::classify(&f.path) == role)
        .collect();

    let mut text = String::new();
    text.push_str(&format!("# {} context for {}\n\n", criterion.label(), snapshot.repo));
    text.push_str(&format!("Default branch: {}\n", snapshot.default_branch));
    if criterion == Criterion::CiCd {
        text.push_str(&format!("CI status on head commit: {}\n", snapshot.ci_status));
    }
    if snapshot.tree_truncated {
        text.push_str("Note: the file tree was too large and is incomplete.\n");
    }

    text.push_str(&format!("\n## Files ({})\n\n", listed.len()));
    if listed.is_empty() {
        text.push_str("_None found._\n");
    }
    for path in &listed {
        text.push_str(&format!("- {}\n", path));
    }

    if !contents.is_empty() {
        let file_cap = (budget / 4).max(MIN_FILE_CAP);
        text.push_str("\n## Contents\n");
        for file in contents {
            let (body, cut) = truncate_utf8(&file.content, file_cap);
            text.push_str(&format!(
                "\n### {}\n```{}\n{}{}\n```\n",
                file.path,
                fence_language(&file.path),
                body,
                if cut { "\n# ... file truncated" } else { "" }
            ));
        }
    }

    let (bounded, truncated) = fit_to_budget(&text, budget);

    ExtractedSummary {
        criterion,
        text: bounded,
        file_count: listed.len(),
        truncated,
    }
}

/// Cut `text` to at most `budget` bytes, marking the cut when there's room
fn fit_to_budget(text: &str, budget: usize) -> (String, bool) {
    if text.len() <= budget {
        return (text.to_string(), false);
    }
    if budget < TRUNCATION_MARKER.len() {
        let (head, _) = truncate_utf8(text, budget);
        return (head.to_string(), true);
    }

    let (head, _) = truncate_utf8(text, budget - TRUNCATION_MARKER.len());
    (format!("{}{}", head, TRUNCATION_MARKER), true)
}

/// Longest prefix of at most `max_bytes` ending on a char boundary
pub fn truncate_utf8(s: &str, max_bytes: usize) -> (&str, bool) {
    if s.len() <= max_bytes {
        return (s, false);
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    (&s[..end], true)
}

fn fence_language(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".py") {
        "python"
    } else if lower.ends_with(".yml") || lower.ends_with(".yaml") {
        "yaml"
    } else if lower.contains("dockerfile") {
        "dockerfile"
    } else {
        ""
    }
}

//! Roster loading
//!
//! The roster is a CSV file with a header row and the columns
//! `group_number, student_1, ..., student_5, repo_url`.

use std::collections::HashSet;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::domain::entities::{Group, GroupId, MAX_STUDENTS};
use crate::error::DomainError;

/// group number + students + repository URL
const COLUMNS: usize = 1 + MAX_STUDENTS + 1;

/// Read and parse a roster file
pub async fn load_roster(path: &Path) -> Result<Vec<Group>, DomainError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::Validation(format!("Cannot read roster {}: {}", path.display(), e))
    })?;
    parse_roster(&content)
}

/// Parse roster CSV text into groups
pub fn parse_roster(content: &str) -> Result<Vec<Group>, DomainError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut groups = Vec::new();
    let mut seen = HashSet::new();

    for result in reader.records() {
        let record = result.map_err(|e| DomainError::Validation(format!("Roster: {}", e)))?;
        let line_number = record.position().map(|p| p.line()).unwrap_or_default();
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let group = parse_record(&record)
            .map_err(|e| DomainError::Validation(format!("Roster line {}: {}", line_number, e)))?;

        if !seen.insert(group.id) {
            return Err(DomainError::Validation(format!(
                "Roster line {}: duplicate group {}",
                line_number, group.id
            )));
        }
        groups.push(group);
    }

    Ok(groups)
}

fn parse_record(record: &StringRecord) -> Result<Group, String> {
    if record.len() != COLUMNS {
        return Err(format!(
            "expected {} columns, found {}",
            COLUMNS,
            record.len()
        ));
    }

    let number: i32 = record[0]
        .trim()
        .parse()
        .map_err(|_| format!("group number '{}' is not an integer", record[0].trim()))?;

    let students = record
        .iter()
        .skip(1)
        .take(MAX_STUDENTS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    Ok(Group {
        id: GroupId(number),
        students,
        repo_url: record[COLUMNS - 1].trim().to_string(),
    })
}

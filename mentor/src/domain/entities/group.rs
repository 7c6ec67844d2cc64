//! Group domain entity
//!
//! A student group from the roster and the repository it submitted.

use serde::{Deserialize, Serialize};

use crate::error::GitHubError;

/// Maximum number of students listed per group in the roster
pub const MAX_STUDENTS: usize = 5;

/// Unique identifier for a group (the roster's group number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub i32);

impl From<i32> for GroupId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner/name pair identifying a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse a repository URL such as `https://github.com/owner/name(.git)`.
    ///
    /// Extra path segments (`/tree/main`, `/pulls`) are ignored. Anything
    /// that doesn't point at github.com is rejected.
    pub fn parse_url(url: &str) -> Result<Self, GitHubError> {
        let invalid = || GitHubError::InvalidRepoUrl(url.to_string());

        let trimmed = url.trim();
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let rest = rest.strip_prefix("www.").unwrap_or(rest);
        let path = rest.strip_prefix("github.com/").ok_or_else(invalid)?;

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let owner = segments.next().ok_or_else(invalid)?;
        let name = segments.next().ok_or_else(invalid)?;
        let name = name.strip_suffix(".git").unwrap_or(name);

        let valid_segment = |s: &str| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid_segment(owner) || !valid_segment(name) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A group of students and their project repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Student identifiers, blanks already removed
    pub students: Vec<String>,
    pub repo_url: String,
}

impl Group {
    /// Number of students in the group
    pub fn group_size(&self) -> usize {
        self.students.len()
    }

    /// The repository this group points at
    pub fn repo_ref(&self) -> Result<RepoRef, GitHubError> {
        RepoRef::parse_url(&self.repo_url)
    }
}

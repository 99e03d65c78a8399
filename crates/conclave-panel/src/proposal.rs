//! Proposal types: the subject under debate.

use serde::{Deserialize, Serialize};

/// A proposed change or question submitted to the council.
///
/// Immutable once a debate starts. The file list and diff size feed the
/// specialty inferencer and complexity estimator; supervisors receive the
/// whole proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Human-readable description of the change or question.
    pub description: String,
    /// Paths touched by the proposed change.
    pub files: Vec<String>,
    /// Total diff size in changed lines.
    pub diff_size: usize,
}

impl Proposal {
    /// Creates a new proposal with no files and an empty diff.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            files: Vec::new(),
            diff_size: 0,
        }
    }

    /// Adds a touched file path.
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Replaces the touched file list.
    pub fn with_files(mut self, paths: Vec<String>) -> Self {
        self.files = paths;
        self
    }

    /// Sets the diff size in changed lines.
    pub fn with_diff_size(mut self, lines: usize) -> Self {
        self.diff_size = lines;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_new() {
        let proposal = Proposal::new("rename the config module");
        assert_eq!(proposal.description, "rename the config module");
        assert!(proposal.files.is_empty());
        assert_eq!(proposal.diff_size, 0);
    }

    #[test]
    fn test_proposal_builders() {
        let proposal = Proposal::new("migrate auth")
            .with_file("src/auth.rs")
            .with_file("web/login.tsx")
            .with_diff_size(240);
        assert_eq!(proposal.files.len(), 2);
        assert_eq!(proposal.diff_size, 240);
    }

    #[test]
    fn test_proposal_serialization() {
        let proposal = Proposal::new("test").with_file("a.rs");
        let json = serde_json::to_string(&proposal).unwrap();
        let parsed: Proposal = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.files, vec!["a.rs"]);
    }
}

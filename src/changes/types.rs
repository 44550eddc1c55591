use serde::Serialize;
use std::fmt;

/// Net status of a file within a pull request.
///
/// Upstream sources disagree on vocabulary ("changed", "copied", ...);
/// anything we cannot classify degrades to `Modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    #[default]
    Modified,
    Removed,
    Renamed,
}

impl ChangeStatus {
    /// Map an upstream status string onto the enum. Unknown values
    /// fall back to `Modified`.
    pub fn from_upstream(raw: &str) -> ChangeStatus {
        match raw.trim().to_ascii_lowercase().as_str() {
            "added" => ChangeStatus::Added,
            "removed" | "deleted" => ChangeStatus::Removed,
            "renamed" => ChangeStatus::Renamed,
            _ => ChangeStatus::Modified,
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Removed => "removed",
            ChangeStatus::Renamed => "renamed",
        };
        write!(f, "{label}")
    }
}

/// Canonical record of one file's net change, independent of which
/// upstream strategy produced it.
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    /// Repository-relative path (e.g., "src/auth/config.rs")
    pub path: String,
    /// Net status; `Modified` when undeterminable
    pub status: ChangeStatus,
    /// Lines added, accumulated across merged chunks
    pub additions: usize,
    /// Lines deleted, accumulated across merged chunks
    pub deletions: usize,
    /// Unified-diff body for this file; chunks from repeated sightings
    /// of the same path are newline-joined
    pub patch: String,
}

impl FileChange {
    pub fn new(path: impl Into<String>) -> FileChange {
        FileChange {
            path: path.into(),
            status: ChangeStatus::default(),
            additions: 0,
            deletions: 0,
            patch: String::new(),
        }
    }
}

/// Identifies the pull request being reconciled. Constructed once per
/// invocation and never mutated.
#[derive(Debug, Clone)]
pub struct PrTarget {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    /// Base commit SHA, when the caller knows it
    pub base_sha: Option<String>,
    /// Head commit SHA, when the caller knows it
    pub head_sha: Option<String>,
}

impl PrTarget {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> PrTarget {
        PrTarget {
            owner: owner.into(),
            repo: repo.into(),
            number,
            base_sha: None,
            head_sha: None,
        }
    }

    /// Both SHAs present, as needed by the commit-range compare strategy.
    pub fn commit_range(&self) -> Option<(&str, &str)> {
        match (self.base_sha.as_deref(), self.head_sha.as_deref()) {
            (Some(base), Some(head)) if !base.is_empty() && !head.is_empty() => Some((base, head)),
            _ => None,
        }
    }
}

use std::fmt;

use url::Url;

pub const UNKNOWN: &str = "Unknown";
pub const NO_COMMIT_MESSAGE: &str = "No commit message";

/// A push notification, reduced to what a build needs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PushEvent {
    pub author: String,
    pub repository_url: String,
    pub commit_sha: String,
    /// `ref` without the `refs/heads/` prefix.
    pub branch: String,
    pub commit_message: String,
    pub owner: String,
    pub repository_name: String,
}

/// Header fields of a persisted build log.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BuildSummary {
    pub id: u64,
    pub commit_id: Option<String>,
    pub build_date: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BuildOutcome {
    Success,
    Failure,
    Unknown,
}

impl BuildOutcome {
    pub fn commit_state(&self) -> CommitState {
        match self {
            Self::Success => CommitState::Success,
            Self::Failure => CommitState::Failure,
            Self::Unknown => CommitState::Error,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Success => "Build succeeded",
            Self::Failure => "Build failed",
            Self::Unknown => "Build finished without a recognizable result",
        }
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::Unknown => "Unknown",
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CommitState {
    Pending,
    Success,
    Failure,
    Error,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A commit status to publish on the source host.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommitStatus {
    pub owner: String,
    pub repo: String,
    pub sha: String,
    pub state: CommitState,
    pub description: String,
    pub target_url: Option<Url>,
}

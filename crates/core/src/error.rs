use std::{fmt, io, path::PathBuf, process::ExitStatus, time::Duration};

use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(AuthFailure),
    #[error("invalid payload: {0}")]
    Validation(#[source] serde_json::Error),
    #[error("{} escapes sandbox root {}", path.display(), root.display())]
    SandboxViolation { path: PathBuf, root: PathBuf },
    #[error("build log {0} not found")]
    NotFound(String),
    #[error("failed to start `{command}`: {source}")]
    Spawn { command: String, source: io::Error },
    #[error("`{command}` exited with {status}")]
    ExitStatus { command: String, status: ExitStatus, output: String },
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
    #[error("{context}: {source}")]
    Io { context: String, source: io::Error },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AuthFailure {
    Missing,
    Malformed,
    Mismatch,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "X-Hub-Signature-256 missing",
            Self::Malformed => "X-Hub-Signature-256 malformed",
            Self::Mismatch => "signature mismatch",
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    Authentication,
    Validation,
    SandboxViolation,
    NotFound,
    Execution,
    Timeout,
}

impl Error {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Validation(_) => ErrorKind::Validation,
            Self::SandboxViolation { .. } => ErrorKind::SandboxViolation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Spawn { .. } | Self::ExitStatus { .. } | Self::Io { .. } => ErrorKind::Execution,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Text safe to send to a client. Sandbox errors carry resolved local
    /// paths, which stay in the server log.
    pub fn client_message(&self) -> String {
        match self {
            Self::SandboxViolation { .. } => "path escapes its permitted root".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            // A missing or unparsable header is a malformed request, only a
            // well-formed signature that does not verify is unauthorized.
            Self::Authentication(AuthFailure::Missing | AuthFailure::Malformed) => {
                StatusCode::BAD_REQUEST
            }
            Self::Authentication(AuthFailure::Mismatch) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) | Self::SandboxViolation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Spawn { .. } | Self::ExitStatus { .. } | Self::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

pub type KitResult<T> = Result<T, KitError>;

#[derive(Debug, Error)]
pub enum KitError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid filter parameter: {0}")]
    InvalidFilterParameter(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ffprobe failed on {}: {reason}", path.display())]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("`{0}` not found in PATH")]
    ExternalToolNotFound(String),

    #[error("{tool} exited with code {exit_code}")]
    ExternalToolFailed { tool: String, exit_code: i32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KitError {
    /// Exit code a driver should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            KitError::ExternalToolFailed { exit_code, .. } if *exit_code != 0 => *exit_code,
            _ => 1,
        }
    }
}

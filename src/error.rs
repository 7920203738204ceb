use std::path::PathBuf;

use thiserror::Error;

/// Unified application error type to simplify bubbling errors through async flows.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Errored while handling a file. {0}")]
    Command(#[from] std::io::Error),
    #[error("Error serializing json. {0}")]
    SerdeJsonSer(#[from] serde_json::Error),
    #[error("{0}")]
    Revision(#[from] RevisionError),
    #[error("{0}")]
    Output(#[from] OutputError),
}

/// Convenience alias for results that bubble `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// User input errors while interpreting a revision expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevisionError {
    #[error("Invalid commit in range: {0}")]
    InvalidEndpoint(String),
    #[error("Invalid revision: {0}")]
    InvalidRevision(String),
}

/// Failures from the version-control binary. Never leaves the git module:
/// the runner logs it and hands back empty output instead.
#[derive(Error, Debug)]
pub enum DiffToolError {
    #[error("Unable to start git. {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git exited with status {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },
}

/// Errors raised while merging into or writing the target document.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write {}. {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read {}. {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("The auto output mode must be resolved before merging")]
    UnresolvedAuto,
}

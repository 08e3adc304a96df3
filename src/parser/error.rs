use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot access {path}: {reason}")]
    FileAccess { path: PathBuf, reason: String },

    #[error("failed to read {path}")]
    Failure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

//! Error types for the Shoal core crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::job::JobState;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the data model and configuration layer.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("job {job_id}: illegal state transition {from} -> {to}")]
    InvalidTransition {
        job_id: u64,
        from: JobState,
        to: JobState,
    },

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    ConfigRender(#[from] toml::ser::Error),
}

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for datascope operations.
pub type Result<T> = std::result::Result<T, DatascopeError>;

/// Error taxonomy shared by the data and model layers.
///
/// Recovery expectations differ per variant: a `NotFound` or `Corrupt` model
/// artifact is healed by retraining, a `Corrupt` dataset is fatal to the view
/// (there is no fallback dataset), `WriteDenied` leaves the in-memory artifact
/// usable for the session, and `SchemaMismatch` / `InvalidFeature` abort only
/// the offending interaction.
#[derive(Error, Debug)]
pub enum DatascopeError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("corrupt artifact {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("cannot write {}: {source}", path.display())]
    WriteDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("filter references unknown or incompatible column '{column}': {reason}")]
    SchemaMismatch { column: String, reason: String },

    #[error("invalid value for feature '{feature}': {reason}")]
    InvalidFeature { feature: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatascopeError {
    /// Whether the error can be healed by re-deriving the artifact from the
    /// dataset (the model provider retrains on these instead of failing).
    pub fn is_recoverable_artifact(&self) -> bool {
        matches!(
            self,
            DatascopeError::NotFound(_) | DatascopeError::Corrupt { .. }
        )
    }
}

use thiserror::Error;

/// Rejection of a router command.
///
/// Validation failures go back to the caller only; `ComputationFailure` is
/// additionally announced to every subscriber as a `clustering-failed` event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Clustering failed: {0}")]
    ComputationFailure(String),
}

impl CommandError {
    /// Stable wire code
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::NotFound(_) => "not-found",
            CommandError::InvalidArgument(_) => "invalid-argument",
            CommandError::ComputationFailure(_) => "computation-failure",
        }
    }
}

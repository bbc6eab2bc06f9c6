//! Error Types
//!
//! The error taxonomy for every user-triggered flow. Each variant maps
//! to a distinct surfacing strategy: inline text, a modal, or silence.
//! None of them should ever abort the application.

use thiserror::Error;

/// Errors produced by core application flows.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed local validation. Surfaced inline; no backend call
    /// is made for these.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// Credentials were rejected. Deliberately generic: the message
    /// never distinguishes an unknown user from a wrong password.
    #[error("authentication failed")]
    AuthFailed,

    /// A network or service error on any backend call. The operation
    /// is never retried automatically; the user must re-trigger it.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The vote target's contact address has no matching profile.
    #[error("no profile matches the selected member")]
    TargetNotFound,

    /// The vote insert itself was rejected by the backend. Local
    /// selection state is left untouched so the caller may retry.
    #[error("vote submission failed: {0}")]
    SubmissionFailed(String),
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::BackendUnavailable(err.to_string())
    }
}

impl CoreError {
    /// Whether this error was raised before any backend call was made.
    pub fn is_local(&self) -> bool {
        matches!(self, CoreError::InputInvalid(_))
    }
}

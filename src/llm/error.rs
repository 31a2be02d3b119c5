//! Completion failures.

use std::fmt::Display;

/// Why a completion did not produce text.
///
/// Cancellation is always distinct from every other failure so callers can
/// show it as a notice instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The caller fired the cancellation token before the motor answered.
    #[error("process cancelled by user")]
    Cancelled,

    /// Non-2xx answer, transport failure, or an unreadable response body.
    #[error("{message}")]
    Remote {
        /// HTTP status when the motor answered at all
        status: Option<u16>,
        /// Human-readable explanation, surfaced verbatim
        message: String,
    },
}

impl CompletionError {
    /// Motor answered with a non-2xx status.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        CompletionError::Remote {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Transport or decoding failure with no usable HTTP status.
    pub fn transport<E: Display>(detail: E) -> Self {
        CompletionError::Remote {
            status: None,
            message: format!("Error IA: {detail}"),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompletionError::Cancelled)
    }
}

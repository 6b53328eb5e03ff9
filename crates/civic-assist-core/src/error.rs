//! Turn-level error taxonomy.
//!
//! Only input errors and fatal completion failures are represented here.
//! Degradable failures (retrieval, recommendations) and best-effort
//! failures (interaction logging) are absorbed where they happen and never
//! reach the caller.

use std::time::Duration;

use thiserror::Error;

/// Message shown to users for any fatal failure, distinct from real answers.
pub const GENERIC_FAILURE: &str = "An error occurred processing your request";

/// Errors that end an assistant turn.
#[derive(Error, Debug)]
pub enum AssistError {
    /// Missing or malformed query. No downstream calls were made.
    #[error("Query is required")]
    InvalidQuery,

    /// The completion service returned a non-success response or could not be reached.
    #[error("completion service error: {0}")]
    Completion(String),

    /// The completion service did not answer within the configured bound.
    #[error("completion service timed out after {}s", .0.as_secs())]
    CompletionTimeout(Duration),

    /// The completion service answered but the payload was unusable.
    #[error("malformed completion response: {0}")]
    MalformedCompletion(String),
}

impl AssistError {
    /// HTTP status equivalent.
    pub fn status_code(&self) -> u16 {
        match self {
            AssistError::InvalidQuery => 400,
            AssistError::Completion(_)
            | AssistError::CompletionTimeout(_)
            | AssistError::MalformedCompletion(_) => 500,
        }
    }

    /// User-facing message. Fatal errors share one generic text.
    pub fn public_message(&self) -> &'static str {
        match self {
            AssistError::InvalidQuery => "Query is required",
            _ => GENERIC_FAILURE,
        }
    }

    /// Diagnostic detail for the `details` field, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            AssistError::InvalidQuery => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.status_code() >= 500
    }
}

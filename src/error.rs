//! Errors surfaced at the HTTP boundary.

use axum::http::StatusCode;
use thiserror::Error;

/// Failure of a `/chat` request.
///
/// Internal details are logged; callers only see the generic message.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request carried no usable message.
    #[error("No message provided")]
    MissingMessage,

    /// A table could not be loaded from its source.
    #[error("Data loading failed")]
    DataUnavailable(#[source] anyhow::Error),

    /// The LLM call failed.
    #[error("Insight generation failed")]
    Llm(#[source] anyhow::Error),
}

impl ChatError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::MissingMessage => StatusCode::BAD_REQUEST,
            ChatError::DataUnavailable(_) | ChatError::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ChatError::MissingMessage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ChatError::DataUnavailable(anyhow::anyhow!("missing file")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ChatError::Llm(anyhow::anyhow!("timeout")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_hide_details() {
        let err = ChatError::DataUnavailable(anyhow::anyhow!("/secret/path.csv not found"));
        assert_eq!(err.to_string(), "Data loading failed");
    }
}

//! Error types for the identity storage SDK.

/// Result type for SDK operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur when talking to the identity store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl StorageError {
    /// Create an API error from a status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = body.trim();
        Self::Api {
            status,
            message: if message.is_empty() {
                "no response body".to_string()
            } else {
                message.to_string()
            },
        }
    }

    /// Status code of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_mentions_status() {
        let err = StorageError::from_response(401, "Unauthorized access");
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("Unauthorized access"));
    }

    #[test]
    fn test_empty_body_message() {
        let err = StorageError::from_response(500, "  ");
        assert!(err.to_string().contains("no response body"));
        assert!(!err.is_not_found());
    }
}

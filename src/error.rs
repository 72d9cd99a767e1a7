use thiserror::Error;

/// Type alias for Result with CleanupError
pub type Result<T> = std::result::Result<T, CleanupError>;

/// Error types shared by the Drive and Gmail cleanup tools
#[derive(Error, Debug)]
pub enum CleanupError {
    /// Google API returned an error not covered by a more specific variant
    #[error("Google API error: {0}")]
    ApiError(String),

    /// Token grant or refresh failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// A listed record is missing a field the pipeline depends on
    #[error("Malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    /// User typed something we could not interpret
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// User cancelled operation
    #[error("Operation cancelled: {0}")]
    OperationCancelled(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CleanupError {
    /// Map a non-success HTTP status from a Google API into an error variant
    pub fn from_status(status: u16, reason: Option<&str>) -> Self {
        let message = format!("HTTP {}: {}", status, reason.unwrap_or("Unknown"));
        match status {
            400 => CleanupError::BadRequest(message),
            401 => CleanupError::AuthError(message),
            403 => CleanupError::Forbidden(message),
            404 => CleanupError::NotFound(message),
            429 => CleanupError::RateLimited(message),
            500..=599 => CleanupError::ServerError { status, message },
            _ => CleanupError::ApiError(message),
        }
    }

    /// True when the remote side reported the resource as gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, CleanupError::NotFound(_))
    }

    /// True for errors that should stop the process before any listing happens
    pub fn is_fatal_auth(&self) -> bool {
        matches!(self, CleanupError::AuthError(_))
    }
}

// google-gmail1 and google-drive3 are generated from the same code base and
// share their error type through google-apis-common, so this single
// conversion serves both hubs.
impl From<google_gmail1::Error> for CleanupError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                CleanupError::from_status(status.as_u16(), status.canonical_reason())
            }
            google_gmail1::Error::BadRequest(ref err) => {
                CleanupError::BadRequest(format!("{}", err))
            }
            google_gmail1::Error::HttpError(ref err) => {
                CleanupError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => CleanupError::NetworkError(err.to_string()),
            google_gmail1::Error::MissingToken(ref err) => {
                CleanupError::AuthError(format!("No token available: {}", err))
            }
            _ => CleanupError::ApiError(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            CleanupError::from_status(404, Some("Not Found")),
            CleanupError::NotFound(_)
        ));
        assert!(matches!(
            CleanupError::from_status(403, None),
            CleanupError::Forbidden(_)
        ));
        assert!(matches!(
            CleanupError::from_status(400, None),
            CleanupError::BadRequest(_)
        ));
        assert!(matches!(
            CleanupError::from_status(401, None),
            CleanupError::AuthError(_)
        ));
        assert!(matches!(
            CleanupError::from_status(429, None),
            CleanupError::RateLimited(_)
        ));
        assert!(matches!(
            CleanupError::from_status(418, None),
            CleanupError::ApiError(_)
        ));
    }

    #[test]
    fn test_server_error_keeps_status() {
        match CleanupError::from_status(503, Some("Service Unavailable")) {
            CleanupError::ServerError { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("Service Unavailable"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_is_not_found() {
        assert!(CleanupError::NotFound("msg".to_string()).is_not_found());
        assert!(!CleanupError::Forbidden("msg".to_string()).is_not_found());
    }

    #[test]
    fn test_error_display() {
        let error = CleanupError::MalformedRecord {
            id: "abc".to_string(),
            reason: "missing From header".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("abc"));
        assert!(display.contains("missing From header"));

        let auth_error = CleanupError::AuthError("Invalid token".to_string());
        assert!(auth_error.to_string().contains("Authentication failed"));
        assert!(auth_error.is_fatal_auth());
    }
}

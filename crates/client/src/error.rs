//! Client error types

use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// The server rejected the bearer credential (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// An authenticated call was made without an access token
    #[error("Not authenticated: log in first")]
    NotAuthenticated,

    /// The token endpoint rejected the supplied credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The access token was rejected and could not be renewed
    #[error("Session expired: log in again")]
    SessionExpired,

    /// Token storage could not be read or written
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether the server answered with HTTP 401
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
            || matches!(self, Self::Request(e) if e.status() == Some(reqwest::StatusCode::UNAUTHORIZED))
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        let err = ClientError::from_status(StatusCode::UNAUTHORIZED, "expired".into());
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));

        let err = ClientError::from_status(StatusCode::NOT_FOUND, "missing".into());
        assert!(matches!(err, ClientError::NotFound(_)));
        assert!(!err.is_unauthorized());

        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, "upstream".into());
        assert!(matches!(err, ClientError::ServerError { status: 502, .. }));
    }

    #[test]
    fn test_session_errors_have_no_status() {
        assert_eq!(ClientError::NotAuthenticated.status(), None);
        assert_eq!(ClientError::SessionExpired.status(), None);
        assert!(!ClientError::SessionExpired.is_unauthorized());
    }
}

//! Error types for AWS calls.

use thiserror::Error;

/// Errors that can occur when talking to AWS.
#[derive(Debug, Error)]
pub enum AwsError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// No usable credentials.
    #[error("Missing credentials: {0}")]
    Credentials(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Invalid client configuration (bad endpoint, etc.).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The service rejected the request.
    #[error("{service} returned {status} {code}: {message}")]
    Service {
        service: &'static str,
        status: u16,
        code: String,
        message: String,
    },
}

impl AwsError {
    /// Returns true if the service refused the call for lack of privilege.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            AwsError::Service { code, .. }
                if code == "AccessDenied" || code == "AccessDeniedException"
        )
    }

    /// The service's error message, if this is a service rejection.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            AwsError::Service { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AwsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AwsError::Timeout
        } else if err.is_connect() {
            AwsError::Connection(err.to_string())
        } else {
            AwsError::Http(err.to_string())
        }
    }
}

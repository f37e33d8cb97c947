use serde::Deserialize;
use std::fmt;

/// Error types for calls against the identity provider and Azure Resource Manager
#[derive(Debug)]
pub enum AzureError {
    /// Token acquisition was rejected or returned no token
    Authentication(String),

    /// ARM answered with a non-success status
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Request never produced a response (DNS, TLS, connection reset)
    Transport(reqwest::Error),

    /// A long-running operation reached a terminal non-success state
    OperationFailed {
        status: String,
        message: Option<String>,
    },

    /// Response body did not match the expected shape
    Serialization(String),

    /// A URL could not be built or parsed
    InvalidUrl(String),
}

impl fmt::Display for AzureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AzureError::Authentication(msg) => {
                write!(f, "Authentication failed: {}", msg)
            }
            AzureError::Api {
                status,
                code,
                message,
            } => {
                write!(f, "Azure API returned HTTP {}", status)?;

                if let Some(code) = code {
                    write!(f, " ({})", code)?;
                }

                write!(f, ": {}", message)
            }
            AzureError::Transport(err) => {
                write!(f, "Request to Azure failed: {}", err)
            }
            AzureError::OperationFailed { status, message } => {
                write!(f, "Operation finished with status '{}'", status)?;

                if let Some(message) = message {
                    write!(f, ": {}", message)?;
                }

                Ok(())
            }
            AzureError::Serialization(msg) => {
                write!(f, "Unexpected response from Azure: {}", msg)
            }
            AzureError::InvalidUrl(msg) => {
                write!(f, "Invalid URL: {}", msg)
            }
        }
    }
}

impl std::error::Error for AzureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AzureError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AzureError {
    fn from(err: reqwest::Error) -> Self {
        AzureError::Transport(err)
    }
}

impl From<serde_json::Error> for AzureError {
    fn from(err: serde_json::Error) -> Self {
        AzureError::Serialization(err.to_string())
    }
}

/// Result type for Azure calls
pub type AzureResult<T> = Result<T, AzureError>;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Build an `Api` error from a failed response body.
///
/// ARM wraps failures as `{"error": {"code": ..., "message": ...}}`; anything
/// else is surfaced verbatim.
pub fn api_error(status: u16, body: &str) -> AzureError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => AzureError::Api {
            status,
            code: envelope.error.code,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| "no error message".to_string()),
        },
        Err(_) => AzureError::Api {
            status,
            code: None,
            message: if body.trim().is_empty() {
                "empty response body".to_string()
            } else {
                body.trim().to_string()
            },
        },
    }
}

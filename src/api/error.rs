//! API error types for the Redmine client.

use thiserror::Error;

/// Errors that can occur when interacting with the Redmine API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or HTTP transport error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a status outside `[200, 400)`.
    #[error("HTTP {status}: {message}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// A human readable summary extracted from the body.
        message: String,
        /// The raw response body.
        body: String,
    },

    /// The response body was not valid JSON or did not match the expected shape.
    #[error("Invalid API response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request body could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Exchanging username and password for an API key failed.
    #[error("Authentication failed: {0}")]
    AuthFailed(#[source] Box<ApiError>),

    /// The current user record did not carry an API key.
    #[error("Authentication failed: the server did not return an API key (is the REST API enabled?)")]
    MissingApiKey,
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code and response body.
    ///
    /// Redmine reports validation and lookup failures as
    /// `{"errors": ["...", "..."]}`; those messages are joined for display.
    /// Anything else falls back to the raw body, then to the status reason.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = redmine_error_messages(body)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string()
            });

        ApiError::Http {
            status: status.as_u16(),
            message,
            body: body.to_string(),
        }
    }

    /// The HTTP status code, if this error came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::AuthFailed(inner) => inner.status(),
            _ => None,
        }
    }

    /// Whether the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the server rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

fn redmine_error_messages(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let messages: Vec<&str> = json
        .get("errors")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str())
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join(", "))
    }
}

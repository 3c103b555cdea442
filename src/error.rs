//! Centralized error types for the Redmine CLI.
//!
//! This module aggregates library and configuration errors into one
//! application error with user-friendly messages.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// IO errors (file system, stdout, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or conflicting command-line input.
    #[error("{0}")]
    Usage(String),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Create a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        AppError::Usage(msg.into())
    }

    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) | ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file is readable."
                        .to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => format!("Profile '{}' not found.", name),
            },
            AppError::Api(e) => match e {
                ApiError::AuthFailed(_) | ApiError::Http { status: 401, .. } => {
                    "Authentication failed. Please check your credentials.".to_string()
                }
                ApiError::MissingApiKey => {
                    "The server did not return an API key for this account.".to_string()
                }
                ApiError::Http { status: 403, .. } => {
                    "Access denied. You don't have permission to access this resource.".to_string()
                }
                ApiError::Http { status: 404, .. } => "The resource was not found.".to_string(),
                ApiError::Http { status: 422, message, .. } => {
                    format!("The server rejected the change: {}", message)
                }
                ApiError::Http { status, .. } if *status >= 500 => {
                    "Redmine server error. Please try again later.".to_string()
                }
                ApiError::Http { status, message, .. } => {
                    format!("Request failed (HTTP {}): {}", status, message)
                }
                ApiError::Network(_) => {
                    "Connection failed. Please check the server URL and your network.".to_string()
                }
                ApiError::Decode(_) => {
                    "Unexpected response from Redmine. Is the URL pointing at a Redmine server?"
                        .to_string()
                }
                ApiError::Encode(_) => "Could not encode the request. Internal error.".to_string(),
            },
            AppError::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            AppError::Usage(msg) => msg.clone(),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::ProfileNotFound(_))
            | AppError::Config(ConfigError::ParseError(_)) => {
                Some("Check the profiles in your config.toml.")
            }
            AppError::Api(ApiError::MissingApiKey) => {
                Some("Ask an administrator to enable the REST web service in Redmine settings.")
            }
            AppError::Api(e) if e.is_unauthorized() => Some(
                "Check your API key under 'My account' in Redmine, or set REDMINE_API_KEY.",
            ),
            AppError::Api(ApiError::AuthFailed(_)) => {
                Some("Check your username and REDMINE_PASSWORD.")
            }
            AppError::Api(ApiError::Network(_)) | AppError::Api(ApiError::Decode(_)) => {
                Some("Check the server URL and your network connection.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

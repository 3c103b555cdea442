//! Authentication handling for the Redmine API.
//!
//! Redmine accepts either an API key in the `X-Redmine-API-Key` header or
//! HTTP Basic credentials. A session picks exactly one of the two.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{header, RequestBuilder};

/// Header carrying the Redmine API key.
pub const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Authentication credentials for Redmine.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Sign requests with an API key.
    ApiKey(String),
    /// Sign requests with HTTP Basic credentials.
    Basic {
        /// The login name.
        username: String,
        /// The Base64-encoded authorization header value.
        auth_header: String,
    },
}

impl Auth {
    /// Authenticate with an API key.
    pub fn api_key(key: &str) -> Self {
        Auth::ApiKey(key.to_string())
    }

    /// Authenticate with username and password.
    ///
    /// The password is immediately encoded and the raw value is not stored.
    pub fn basic(username: &str, password: &str) -> Self {
        Auth::Basic {
            username: username.to_string(),
            auth_header: build_auth_header(username, password),
        }
    }

    /// Whether this credential is an API key.
    pub fn is_api_key(&self) -> bool {
        matches!(self, Auth::ApiKey(_))
    }

    /// Get the username for Basic credentials.
    pub fn username(&self) -> Option<&str> {
        match self {
            Auth::Basic { username, .. } => Some(username),
            Auth::ApiKey(_) => None,
        }
    }

    /// Attach exactly one authentication header to a request.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::ApiKey(key) => request.header(API_KEY_HEADER, key),
            Auth::Basic { auth_header, .. } => {
                request.header(header::AUTHORIZATION, auth_header.as_str())
            }
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::ApiKey(_) => f.debug_tuple("ApiKey").field(&"*****").finish(),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"*****")
                .finish(),
        }
    }
}

/// Build the Basic Auth header value.
///
/// Encodes "username:password" in Base64 and prepends "Basic ".
fn build_auth_header(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    let encoded = BASE64.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}

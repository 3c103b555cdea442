//! Application settings configuration.

use serde::{Deserialize, Serialize};

use crate::api::pagination::MAX_PAGE_SIZE;

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// Items requested per page for collection endpoints.
    ///
    /// The client clamps it to 1..=100.
    pub page_size: u32,
    /// How many days back `time-entries` looks by default.
    pub days_back: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            page_size: MAX_PAGE_SIZE,
            days_back: 7,
        }
    }
}

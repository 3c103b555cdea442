//! Offset-based pagination for Redmine collection endpoints.
//!
//! Collection responses carry `total_count`, `offset` and `limit` next to the
//! items. A complete collection is assembled by re-requesting with `offset`
//! set to the number of items fetched so far until `total_count` is reached.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{Issue, Project, TimeEntry};

/// Query parameters for a request, kept sorted for stable URLs.
pub type Params = BTreeMap<String, String>;

/// The largest page size Redmine honors.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A collection envelope that can be unpacked into a page of items.
pub trait Paginated: DeserializeOwned {
    /// The record type contained in the collection.
    type Item;

    /// Unpack the envelope.
    fn into_page(self) -> Page<Self::Item>;
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
}

/// What to do after a page has been appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// The collection is complete.
    Done,
    /// The server reported more items but sent an empty page.
    Stalled,
    /// Request the next page at this offset.
    Next(usize),
}

/// Decide the next step from the number of items fetched so far, the size of
/// the last page, and the server-reported total.
pub fn next_step(fetched: usize, page_len: usize, total_count: usize) -> PageStep {
    if fetched >= total_count {
        PageStep::Done
    } else if page_len == 0 {
        PageStep::Stalled
    } else {
        PageStep::Next(fetched)
    }
}

/// `{"issues": [...], "total_count": n, ...}`
#[derive(Debug, Deserialize)]
pub struct IssuesPage {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

impl Paginated for IssuesPage {
    type Item = Issue;

    fn into_page(self) -> Page<Issue> {
        Page {
            items: self.issues,
            total_count: self.total_count,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// `{"projects": [...], "total_count": n, ...}`
#[derive(Debug, Deserialize)]
pub struct ProjectsPage {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

impl Paginated for ProjectsPage {
    type Item = Project;

    fn into_page(self) -> Page<Project> {
        Page {
            items: self.projects,
            total_count: self.total_count,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// `{"time_entries": [...], "total_count": n, ...}`
#[derive(Debug, Deserialize)]
pub struct TimeEntriesPage {
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

impl Paginated for TimeEntriesPage {
    type Item = TimeEntry;

    fn into_page(self) -> Page<TimeEntry> {
        Page {
            items: self.time_entries,
            total_count: self.total_count,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Encode parameters as a query string (without the leading `?`).
pub fn to_query_string(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

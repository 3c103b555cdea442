//! Redmine API client and types.
//!
//! This module provides the interface for communicating with the Redmine REST API.

mod auth;
mod client;
pub mod error;
pub mod pagination;
pub mod query;
pub mod types;

pub use auth::{Auth, API_KEY_HEADER};
pub use client::RedmineClient;
pub use error::{ApiError, Result};
pub use pagination::Params;
pub use types::{
    Identifier, Issue, IssueStatus, IssueUpdate, Project, TimeEntry, User, ValueField,
};

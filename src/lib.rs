//! # redmine-client
//!
//! A client library for the Redmine REST API, plus the `redmine` command-line
//! tool built on it.
//!
//! ## Module Structure
//!
//! - [`api`]: session handling, transport, pagination and typed resources
//! - [`config`]: connection profiles and settings from `config.toml`
//! - [`cli`]: command-line definitions and command execution
//! - [`error`]: application-level errors with user-facing messages
//! - [`logging`]: tracing subscriber setup
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use redmine_client::api::{query, RedmineClient};
//!
//! # async fn example() -> redmine_client::api::Result<()> {
//! let client = RedmineClient::login("https://redmine.example.com", "alice", "s3cret").await?;
//!
//! for issue in client.watched_issues().await? {
//!     println!("{}", issue);
//! }
//!
//! let entries = client
//!     .time_entries(query::time_entry_params("me", "", 7))
//!     .await?;
//! println!("{} time entries this week", entries.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

pub use api::{ApiError, RedmineClient};
pub use cli::Cli;
pub use config::Config;

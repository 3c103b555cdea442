//! Command-line interface definitions and command execution.
//!
//! Every subcommand maps onto one [`RedmineClient`] operation. Connection
//! details come from flags, environment variables and the active profile,
//! in that order.

use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use crate::api::{query, Issue, IssueUpdate, RedmineClient};
use crate::config::{config_path, Config, Profile, API_KEY_ENV, PASSWORD_ENV};
use crate::error::{AppError, Result};

#[derive(Parser, Debug)]
#[command(
    name = "redmine",
    version,
    about = "Work with a Redmine server from the command line",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalOptions,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Profile from config.toml to use
    #[arg(long, short = 'p', global = true, env = "REDMINE_PROFILE")]
    pub profile: Option<String>,

    /// Redmine server URL (overrides the profile)
    #[arg(long, global = true, env = "REDMINE_URL")]
    pub url: Option<String>,

    /// API key (see "My account" in Redmine)
    #[arg(long, global = true, env = "REDMINE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Login name; the password is read from REDMINE_PASSWORD
    #[arg(long, short = 'u', global = true, env = "REDMINE_USERNAME")]
    pub username: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange username and password for your API key
    Login {
        /// Store the server URL and username as a profile with this name
        ///
        /// The API key and password are never written to the config file.
        #[arg(long, value_name = "NAME")]
        save_profile: Option<String>,
    },
    /// Show the authenticated user
    Whoami,
    /// List issues you are watching
    Issues,
    /// Show one issue
    Issue {
        /// Issue id
        id: u32,
    },
    /// Update fields of an issue
    Update(UpdateArgs),
    /// List projects
    Projects,
    /// List issue statuses
    Statuses,
    /// List time entries spent in the last days
    #[command(name = "time-entries")]
    TimeEntries {
        /// Only entries of this user ("me" for yourself)
        #[arg(long)]
        user_id: Option<String>,
        /// Only entries of this project (id or identifier)
        #[arg(long)]
        project_id: Option<String>,
        /// How many days back to look (defaults to settings.days_back)
        #[arg(long)]
        days: Option<u32>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Issue id
    pub id: u32,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status_id: Option<u32>,
    #[arg(long)]
    pub priority_id: Option<u32>,
    #[arg(long)]
    pub assigned_to_id: Option<u32>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub done_ratio: Option<u32>,
    #[arg(long)]
    pub estimated_hours: Option<f64>,
    /// Journal note to add with the change
    #[arg(long)]
    pub notes: Option<String>,
}

impl UpdateArgs {
    /// Build the sparse update from the flags that were given.
    pub fn to_update(&self) -> IssueUpdate {
        IssueUpdate {
            subject: self.subject.clone(),
            description: self.description.clone(),
            status_id: self.status_id,
            priority_id: self.priority_id,
            assigned_to_id: self.assigned_to_id,
            done_ratio: self.done_ratio,
            estimated_hours: self.estimated_hours,
            notes: self.notes.clone(),
            ..Default::default()
        }
    }
}

/// How to authenticate against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    Password { username: String, password: String },
}

/// A resolved server URL and credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub url: String,
    pub credential: Credential,
}

impl Connection {
    /// Resolve the connection from flags, the config file and a password.
    ///
    /// An explicit `--url` bypasses profile lookup unless `--profile` is also
    /// given. A non-empty API key wins over username and password.
    pub fn resolve(
        global: &GlobalOptions,
        config: &Config,
        password: Option<String>,
    ) -> Result<Self> {
        let profile = match (&global.url, &global.profile) {
            (Some(_), None) => None,
            (_, name) => Some(config.profile(name.as_deref())?),
        };

        let url = global
            .url
            .clone()
            .or_else(|| profile.map(|p| p.url.clone()))
            .ok_or_else(|| AppError::usage("no server URL: pass --url or configure a profile"))?;

        let username = global
            .username
            .clone()
            .or_else(|| profile.and_then(|p| p.username.clone()));

        let api_key = global.api_key.clone().filter(|k| !k.is_empty());
        let password = password.filter(|p| !p.is_empty());

        let credential = match (api_key, username, password) {
            (Some(key), _, _) => Credential::ApiKey(key),
            (None, Some(username), Some(password)) => Credential::Password { username, password },
            (None, Some(_), None) => {
                return Err(AppError::usage(format!(
                    "no password: set {} for the configured username",
                    PASSWORD_ENV
                )))
            }
            (None, None, _) => {
                return Err(AppError::usage(format!(
                    "no credentials: set {} or --username with {}",
                    API_KEY_ENV, PASSWORD_ENV
                )))
            }
        };

        Ok(Self { url, credential })
    }

    /// Open a session for this connection.
    pub async fn open(&self, page_size: u32) -> Result<RedmineClient> {
        let client = match &self.credential {
            Credential::ApiKey(key) => RedmineClient::with_api_key(&self.url, key),
            Credential::Password { username, password } => {
                RedmineClient::login(&self.url, username, password).await?
            }
        };
        Ok(client.with_page_size(page_size))
    }
}

/// Run a parsed command line against the loaded configuration.
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    let password = std::env::var(PASSWORD_ENV).ok();
    let connection = Connection::resolve(&cli.global, config, password)?;
    let json = cli.global.json;
    debug!(url = %connection.url, "Resolved connection");

    if let Command::Login { .. } = cli.command {
        if !matches!(connection.credential, Credential::Password { .. }) {
            return Err(AppError::usage(format!(
                "login needs --username and {}",
                PASSWORD_ENV
            )));
        }
    }

    let client = connection.open(config.settings.page_size).await?;

    match cli.command {
        Command::Login { save_profile } => {
            let key = client
                .api_key()
                .ok_or_else(|| AppError::other("session has no API key"))?;
            info!("Credential exchange succeeded");
            if let Some(name) = save_profile {
                let path = match &cli.global.config {
                    Some(path) => path.clone(),
                    None => config_path()?,
                };
                save_login_profile(config, &path, &name, &connection)?;
                eprintln!("Saved profile '{}' to {}", name, path.display());
            }
            if json {
                print_json(&serde_json::json!({ "api_key": key }))
            } else {
                print_line(key)
            }
        }
        Command::Whoami => {
            let user = client.current_user().await?;
            if json {
                print_json(&user)
            } else {
                print_line(&user)
            }
        }
        Command::Issues => print_all(&client.watched_issues().await?, json),
        Command::Issue { id } => {
            let issue = client.issue(id).await?;
            if json {
                print_json(&issue)
            } else {
                print_line(&issue_details(&issue, &client.issue_url(id)))
            }
        }
        Command::Update(args) => {
            let update = args.to_update();
            if update.is_empty() {
                return Err(AppError::usage("nothing to update: pass at least one field"));
            }
            client.update_issue(args.id, &update).await?;
            print_line(&format!("Updated {}", client.issue_url(args.id)))
        }
        Command::Projects => print_all(&client.projects().await?, json),
        Command::Statuses => print_all(&client.issue_statuses().await?, json),
        Command::TimeEntries {
            user_id,
            project_id,
            days,
        } => {
            let params = query::time_entry_params(
                user_id.as_deref().unwrap_or_default(),
                project_id.as_deref().unwrap_or_default(),
                days.unwrap_or(config.settings.days_back),
            );
            let entries = client.time_entries(params).await?;
            print_all(&entries, json)?;
            if !json {
                let total: f64 = entries.iter().map(|e| e.hours).sum();
                print_line(&format!("Total: {:.2}h", total))?;
            }
            Ok(())
        }
    }
}

/// Store the URL and username of a successful login as a named profile.
///
/// Writes a copy of `config` with the profile added or replaced.
pub fn save_login_profile(
    config: &Config,
    path: &Path,
    name: &str,
    connection: &Connection,
) -> Result<()> {
    let username = match &connection.credential {
        Credential::Password { username, .. } => Some(username.clone()),
        Credential::ApiKey(_) => None,
    };

    let mut updated = config.clone();
    updated.upsert_profile(Profile::new(
        name.to_string(),
        connection.url.clone(),
        username,
    ));
    updated.save_to(path)?;
    debug!(profile = name, path = %path.display(), "Saved profile");
    Ok(())
}

/// Multi-line text rendering of a single issue.
pub fn issue_details(issue: &Issue, url: &str) -> String {
    let mut out = format!(
        "#{} {}\n{}\n\nProject:   {}\nTracker:   {}\nStatus:    {}\nPriority:  {}\nAuthor:    {}\nAssignee:  {}\nDone:      {}%\n",
        issue.id,
        issue.subject,
        url,
        issue.project,
        issue.tracker,
        issue.status,
        issue.priority,
        issue.author,
        issue.assignee_name(),
        issue.done_ratio,
    );
    if let Some(category) = &issue.category {
        out.push_str(&format!("Category:  {}\n", category));
    }
    if let Some(hours) = issue.estimated_hours {
        out.push_str(&format!("Estimated: {:.2}h\n", hours));
    }
    if let Some(due) = &issue.due_date {
        out.push_str(&format!("Due:       {}\n", due));
    }
    for field in issue.custom_fields.iter().filter(|f| !f.value.is_empty()) {
        out.push_str(&format!("{}: {}\n", field.field.name, field.value));
    }
    if !issue.description.is_empty() {
        out.push('\n');
        out.push_str(&issue.description);
        out.push('\n');
    }
    out
}

fn print_all<T: Serialize + Display>(items: &[T], json: bool) -> Result<()> {
    if json {
        return print_json(&items);
    }
    let mut stdout = std::io::stdout().lock();
    for item in items {
        writeln!(stdout, "{}", item)?;
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::other(format!("failed to render JSON: {}", e)))?;
    print_line(&text)
}

fn print_line<T: Display + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", value)?;
    Ok(())
}

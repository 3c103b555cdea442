//! Redmine API request and response types.
//!
//! These types model the Redmine REST API JSON documents for users, issues,
//! projects, time entries and issue statuses. Cross-entity references are
//! [`Identifier`]s, never embedded records.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A compact id/name reference to another entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// The referenced entity's id.
    pub id: u32,
    /// The referenced entity's display name (empty when the server sends only an id).
    #[serde(default)]
    pub name: String,
}

impl Identifier {
    /// Create a new reference.
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "#{}", self.id)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A custom field: an [`Identifier`] with an associated value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueField {
    /// The custom field reference.
    #[serde(flatten)]
    pub field: Identifier,
    /// The value, normalized to a string.
    #[serde(default, deserialize_with = "deserialize_field_value")]
    pub value: String,
}

/// Accepts the shapes Redmine uses for custom field values.
///
/// Single-value fields are strings (or null when unset); multi-value fields
/// are arrays, which are joined with ", ".
fn deserialize_field_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(field_value_to_string(&value))
}

fn field_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(field_value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// A Redmine user.
///
/// Returned by `GET /users/current.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user id.
    pub id: u32,
    /// The user's API key. Only present for the current user.
    #[serde(default)]
    pub api_key: String,
    /// The login name.
    #[serde(default)]
    pub login: String,
    /// The email address.
    #[serde(default)]
    pub mail: String,
    /// When the user last logged in.
    #[serde(default)]
    pub last_login_on: Option<String>,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub created_on: Option<String>,
}

impl User {
    /// The user's full name, falling back to the login.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.firstname, self.lastname);
        let full = full.trim();
        if full.is_empty() {
            self.login.clone()
        } else {
            full.to_string()
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.login)
    }
}

/// A Redmine project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The project id.
    pub id: u32,
    /// The project name.
    pub name: String,
    /// The project identifier used in URLs (e.g., "my-project").
    #[serde(default)]
    pub identifier: String,
    /// The project description.
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub description: String,
    /// Whether the project is public.
    #[serde(default)]
    pub is_public: bool,
    /// The project status code (1 = active, 5 = closed, 9 = archived).
    #[serde(default)]
    pub status: Option<u32>,
    /// The parent project, for subprojects.
    #[serde(default)]
    pub parent: Option<Identifier>,
    /// When the project was created.
    #[serde(default)]
    pub created_on: Option<String>,
    /// When the project was last updated.
    #[serde(default)]
    pub updated_on: Option<String>,
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}

fn deserialize_null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A Redmine issue.
///
/// Returned by `GET /issues/{id}.json` or as part of issue listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// The issue id.
    pub id: u32,
    /// The project this issue belongs to.
    pub project: Identifier,
    /// The tracker (Bug, Feature, Support, ...).
    pub tracker: Identifier,
    /// The issue status.
    pub status: Identifier,
    /// The issue priority.
    pub priority: Identifier,
    /// Who created the issue.
    pub author: Identifier,
    /// The assignee, if any.
    #[serde(default)]
    pub assigned_to: Option<Identifier>,
    /// The issue category, if any.
    #[serde(default)]
    pub category: Option<Identifier>,
    /// The issue subject/title.
    pub subject: String,
    /// The issue description.
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    /// Percent done, 0-100.
    #[serde(default)]
    pub done_ratio: u32,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    /// Custom field values.
    #[serde(default)]
    pub custom_fields: Vec<ValueField>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
}

impl Issue {
    /// Get the assignee name, or "Unassigned" if not set.
    pub fn assignee_name(&self) -> &str {
        self.assigned_to
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("Unassigned")
    }

    /// Look up a custom field value by name.
    pub fn custom_field(&self, name: &str) -> Option<&str> {
        self.custom_fields
            .iter()
            .find(|f| f.field.name == name)
            .map(|f| f.value.as_str())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}] {}", self.id, self.status, self.subject)
    }
}

/// A sparse issue update.
///
/// Only fields set to `Some` are sent; `Some(0)` and `Some(String::new())`
/// are sent as-is, so a field can be cleared explicitly. Associations are
/// given as bare ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_ratio: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    /// A journal note recorded alongside the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IssueUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status_id(mut self, id: u32) -> Self {
        self.status_id = Some(id);
        self
    }

    pub fn priority_id(mut self, id: u32) -> Self {
        self.priority_id = Some(id);
        self
    }

    pub fn assigned_to_id(mut self, id: u32) -> Self {
        self.assigned_to_id = Some(id);
        self
    }

    pub fn done_ratio(mut self, ratio: u32) -> Self {
        self.done_ratio = Some(ratio);
        self
    }

    pub fn estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One of the issue statuses configured on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStatus {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_closed: bool,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)?;
        if self.is_default {
            write!(f, " (default)")?;
        }
        if self.is_closed {
            write!(f, " (closed)")?;
        }
        Ok(())
    }
}

/// A bare issue reference, as embedded in time entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: u32,
}

/// A single time entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u32,
    pub hours: f64,
    /// The day the time was spent (YYYY-MM-DD).
    pub spent_on: String,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
    pub user: Identifier,
    pub project: Identifier,
    pub activity: Identifier,
    /// The issue the time was logged against; absent for project-level entries.
    #[serde(default)]
    pub issue: Option<IssueRef>,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub comments: String,
}

impl TimeEntry {
    /// The id of the issue this entry was logged against.
    pub fn issue_id(&self) -> Option<u32> {
        self.issue.map(|i| i.id)
    }
}

impl fmt::Display for TimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>6.2}h {} / {}",
            self.spent_on, self.hours, self.project, self.activity
        )?;
        if let Some(id) = self.issue_id() {
            write!(f, " #{}", id)?;
        }
        Ok(())
    }
}

/// `{"user": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

/// `{"issue": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct IssueEnvelope {
    pub issue: Issue,
}

/// `{"issue": {...}}` as sent in an update.
#[derive(Debug, Serialize)]
pub(crate) struct IssueUpdateEnvelope<'a> {
    pub issue: &'a IssueUpdate,
}

/// `{"issue_statuses": [...]}`
#[derive(Debug, Deserialize)]
pub(crate) struct IssueStatusesEnvelope {
    pub issue_statuses: Vec<IssueStatus>,
}

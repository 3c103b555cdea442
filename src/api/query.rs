//! Query parameter builders for collection endpoints.

use chrono::{Days, Local, NaiveDate};

use super::pagination::Params;

/// Date format used by Redmine filters.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parameters for the issues watched by the current user.
pub fn watched_issue_params(limit: u32) -> Params {
    let mut params = project_params(limit);
    params.insert("watcher_id".to_string(), "me".to_string());
    params
}

/// Parameters for the project listing.
pub fn project_params(limit: u32) -> Params {
    let mut params = Params::new();
    params.insert("limit".to_string(), limit.to_string());
    params
}

/// Parameters for time entries spent between `days_back` days ago and today.
///
/// Empty `user_id` / `project_id` are left out of the query. No `limit` is
/// set, so [`RedmineClient::time_entries`](super::RedmineClient::time_entries)
/// applies its page size.
pub fn time_entry_params(user_id: &str, project_id: &str, days_back: u32) -> Params {
    time_entry_params_on(user_id, project_id, days_back, Local::now().date_naive())
}

/// Like [`time_entry_params`], with an explicit "today".
pub fn time_entry_params_on(
    user_id: &str,
    project_id: &str,
    days_back: u32,
    today: NaiveDate,
) -> Params {
    let since = today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .unwrap_or(NaiveDate::MIN);

    let mut params = Params::new();
    if !user_id.is_empty() {
        params.insert("user_id".to_string(), user_id.to_string());
    }
    if !project_id.is_empty() {
        params.insert("project_id".to_string(), project_id.to_string());
    }
    params.insert("spent_on".to_string(), spent_between(since, today));
    params
}

/// Redmine's "between" filter: `><SINCE|UNTIL`.
fn spent_between(since: NaiveDate, until: NaiveDate) -> String {
    format!(
        "><{}|{}",
        since.format(DATE_FORMAT),
        until.format(DATE_FORMAT)
    )
}

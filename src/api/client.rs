//! Redmine API client implementation.
//!
//! This module provides the session handle for the Redmine REST API. It
//! handles authentication, request signing, status classification, JSON
//! decoding and offset-based pagination. Requests are never retried.

use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::pagination::{
    next_step, to_query_string, IssuesPage, PageStep, Paginated, Params, ProjectsPage,
    TimeEntriesPage, MAX_PAGE_SIZE,
};
use super::query;
use super::types::{
    Issue, IssueEnvelope, IssueStatus, IssueStatusesEnvelope, IssueUpdate, IssueUpdateEnvelope,
    Project, TimeEntry, User, UserEnvelope,
};

/// The Redmine API client.
///
/// Holds the server URL and one resolved credential. Cloning is cheap; the
/// underlying HTTP connection pool is shared.
#[derive(Debug, Clone)]
pub struct RedmineClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the Redmine instance, without a trailing slash.
    base_url: String,
    /// Authentication credentials.
    auth: Auth,
    /// Page size for collection requests.
    page_size: u32,
}

impl RedmineClient {
    /// Open a session by exchanging username and password for the user's API key.
    ///
    /// Fetches the current user with Basic auth and returns a client that
    /// signs all further requests with the API key from that record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::AuthFailed` wrapping the underlying failure if the
    /// current user cannot be fetched, or `ApiError::MissingApiKey` if the
    /// server did not include a key.
    pub async fn login(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Self::login_with_http_client(Client::new(), base_url, username, password).await
    }

    /// Like [`RedmineClient::login`], using a caller-owned HTTP client.
    #[instrument(skip(client, password))]
    pub async fn login_with_http_client(
        client: Client,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        info!("Exchanging credentials for API key");

        let basic = Self::with_http_client(client, base_url, Auth::basic(username, password));
        let user = basic.current_user().await.map_err(|e| {
            error!("Credential exchange failed: {}", e);
            ApiError::AuthFailed(Box::new(e))
        })?;

        if user.api_key.is_empty() {
            warn!(user_id = user.id, "Current user has no API key");
            return Err(ApiError::MissingApiKey);
        }

        info!(user_id = user.id, login = %user.login, "Session established");
        Ok(Self {
            auth: Auth::ApiKey(user.api_key),
            ..basic
        })
    }

    /// Open a session with a known API key. Makes no network call.
    pub fn with_api_key(base_url: &str, api_key: &str) -> Self {
        Self::with_http_client(Client::new(), base_url, Auth::api_key(api_key))
    }

    /// Create a client from a caller-owned HTTP client and explicit credentials.
    ///
    /// Does NOT validate the connection.
    pub fn with_http_client(client: Client, base_url: &str, auth: Auth) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            auth,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Set the page size for collection requests (clamped to 1..=100).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the credentials this client signs requests with.
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Get the API key, if the session uses one.
    pub fn api_key(&self) -> Option<&str> {
        match &self.auth {
            Auth::ApiKey(key) => Some(key),
            Auth::Basic { .. } => None,
        }
    }

    /// The browser URL for an issue.
    pub fn issue_url(&self, id: u32) -> String {
        format!("{}/issues/{}", self.base_url, id)
    }

    /// Get the current authenticated user.
    ///
    /// Calls `GET /users/current.json`.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User> {
        let envelope: UserEnvelope = self.get_json("/users/current.json", None).await?;
        debug!(user_id = envelope.user.id, "Fetched current user");
        Ok(envelope.user)
    }

    /// Get every issue the current user is watching.
    #[instrument(skip(self))]
    pub async fn watched_issues(&self) -> Result<Vec<Issue>> {
        let params = query::watched_issue_params(self.page_size);
        self.fetch_all::<IssuesPage>("/issues.json", params).await
    }

    /// Get a single issue by id.
    ///
    /// A missing issue surfaces as `ApiError::Http` with status 404.
    #[instrument(skip(self))]
    pub async fn issue(&self, id: u32) -> Result<Issue> {
        let path = format!("/issues/{}.json", id);
        let envelope: IssueEnvelope = self.get_json(&path, None).await?;
        debug!(subject = %envelope.issue.subject, "Fetched issue");
        Ok(envelope.issue)
    }

    /// Apply a sparse update to an issue.
    ///
    /// Sends `PUT /issues/{id}.json` with `{"issue": {...}}` containing only
    /// the fields set on `update`.
    #[instrument(skip(self, update))]
    pub async fn update_issue(&self, id: u32, update: &IssueUpdate) -> Result<()> {
        let path = format!("/issues/{}.json", id);
        let response = self
            .send_json(Method::PUT, &path, &IssueUpdateEnvelope { issue: update })
            .await?;
        debug!(response_len = response.len(), "Issue updated");
        Ok(())
    }

    /// Get every time entry matching `params`.
    ///
    /// Build `params` with [`query::time_entry_params`]. The client's page
    /// size is used as `limit` unless `params` already carries one.
    #[instrument(skip(self, params))]
    pub async fn time_entries(&self, mut params: Params) -> Result<Vec<TimeEntry>> {
        params
            .entry("limit".to_string())
            .or_insert_with(|| self.page_size.to_string());
        self.fetch_all::<TimeEntriesPage>("/time_entries.json", params)
            .await
    }

    /// Get every project visible to the current user.
    #[instrument(skip(self))]
    pub async fn projects(&self) -> Result<Vec<Project>> {
        let params = query::project_params(self.page_size);
        self.fetch_all::<ProjectsPage>("/projects.json", params).await
    }

    /// Get all configured issue statuses. The list is not paginated.
    #[instrument(skip(self))]
    pub async fn issue_statuses(&self) -> Result<Vec<IssueStatus>> {
        let envelope: IssueStatusesEnvelope = self.get_json("/issue_statuses.json", None).await?;
        Ok(envelope.issue_statuses)
    }

    /// Request every page of a collection and concatenate the items.
    ///
    /// The first request carries no `offset`; each following request sets
    /// `offset` to the number of items fetched so far.
    async fn fetch_all<P: Paginated>(&self, path: &str, mut params: Params) -> Result<Vec<P::Item>> {
        let mut items = Vec::new();

        loop {
            let page = self.get_json::<P>(path, Some(&params)).await?.into_page();
            let page_len = page.items.len();
            items.extend(page.items);

            debug!(
                path,
                offset = page.offset,
                page_len,
                fetched = items.len(),
                total = page.total_count,
                "Fetched page"
            );

            match next_step(items.len(), page_len, page.total_count) {
                PageStep::Done => break,
                PageStep::Stalled => {
                    warn!(
                        path,
                        fetched = items.len(),
                        total = page.total_count,
                        "Server returned an empty page before the reported total; stopping"
                    );
                    break;
                }
                PageStep::Next(offset) => {
                    params.insert("offset".to_string(), offset.to_string());
                }
            }
        }

        Ok(items)
    }

    /// GET a path and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: Option<&Params>) -> Result<T> {
        let url = self.url(path, params);
        let body = self.send(Method::GET, &url, None).await?;
        serde_json::from_slice(&body).map_err(ApiError::Decode)
    }

    /// Send a JSON body to a path.
    async fn send_json<B: Serialize>(&self, method: Method, path: &str, body: &B) -> Result<Vec<u8>> {
        let url = self.url(path, None);
        let body = serde_json::to_vec(body).map_err(ApiError::Encode)?;
        self.send(method, &url, Some(body)).await
    }

    /// Issue a single signed request and return the raw response body.
    ///
    /// Statuses in `[200, 400)` succeed; anything else becomes `ApiError::Http`.
    pub async fn send(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
        debug!(%method, url, "Sending request");

        let mut request = self
            .client
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");
        request = self.auth.apply(request);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if (200..400).contains(&status.as_u16()) {
            Ok(body.to_vec())
        } else {
            let text = String::from_utf8_lossy(&body);
            debug!(%status, "Error response body: {}", text);
            Err(ApiError::from_status(status, &text))
        }
    }

    /// Build a full URL from a path and optional query parameters.
    fn url(&self, path: &str, params: Option<&Params>) -> String {
        match params.map(to_query_string) {
            Some(query) if !query.is_empty() => format!("{}{}?{}", self.base_url, path, query),
            _ => format!("{}{}", self.base_url, path),
        }
    }
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Warn if not HTTPS (but don't enforce for localhost/testing)
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. Credentials will be sent in clear text.", url);
    }

    url.to_string()
}

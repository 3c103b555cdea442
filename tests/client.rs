//! HTTP-level tests for the Redmine client against a local mock server.

use mockito::{Matcher, Server};
use reqwest::Method;
use serde_json::{json, Value};

use redmine_client::api::{query, ApiError, Auth, IssueUpdate, RedmineClient};

const API_KEY: &str = "test-api-key";

fn issue_json(id: u32) -> Value {
    json!({
        "id": id,
        "project": {"id": 1, "name": "Website"},
        "tracker": {"id": 1, "name": "Bug"},
        "status": {"id": 1, "name": "New"},
        "priority": {"id": 2, "name": "Normal"},
        "author": {"id": 5, "name": "Alice Smith"},
        "assigned_to": {"id": 6, "name": "Bob Jones"},
        "subject": format!("Issue {}", id),
        "description": "Steps to reproduce...",
        "start_date": "2024-01-02",
        "due_date": null,
        "done_ratio": 0,
        "estimated_hours": null,
        "custom_fields": [{"id": 1, "name": "Browser", "value": "Firefox"}],
        "created_on": "2024-01-02T10:00:00Z",
        "updated_on": "2024-01-02T10:00:00Z"
    })
}

fn issues_page(ids: &[u32], total: usize, offset: usize) -> String {
    json!({
        "issues": ids.iter().map(|id| issue_json(*id)).collect::<Vec<_>>(),
        "total_count": total,
        "offset": offset,
        "limit": 100
    })
    .to_string()
}

fn project_json(id: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Project {}", id),
        "identifier": format!("project-{}", id),
        "description": null,
        "status": 1,
        "is_public": true,
        "created_on": "2023-05-01T08:00:00Z",
        "updated_on": "2023-06-01T08:00:00Z"
    })
}

fn time_entry_json(id: u32, hours: f64) -> Value {
    json!({
        "id": id,
        "project": {"id": 1, "name": "Website"},
        "issue": {"id": 42},
        "user": {"id": 5, "name": "Alice Smith"},
        "activity": {"id": 9, "name": "Development"},
        "hours": hours,
        "comments": "",
        "spent_on": "2024-01-08",
        "created_on": "2024-01-08T17:00:00Z",
        "updated_on": "2024-01-08T17:00:00Z"
    })
}

fn api_key_client(server: &Server) -> RedmineClient {
    RedmineClient::with_api_key(&server.url(), API_KEY)
}

#[tokio::test]
async fn test_watched_issues_accumulates_pages_in_order() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", "/issues.json")
        .match_query(Matcher::Exact("limit=100&watcher_id=me".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(issues_page(&[1, 2], 5, 0))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/issues.json")
        .match_query(Matcher::Exact("limit=100&offset=2&watcher_id=me".into()))
        .with_status(200)
        .with_body(issues_page(&[3, 4], 5, 2))
        .expect(1)
        .create_async()
        .await;
    let third = server
        .mock("GET", "/issues.json")
        .match_query(Matcher::Exact("limit=100&offset=4&watcher_id=me".into()))
        .with_status(200)
        .with_body(issues_page(&[5], 5, 4))
        .expect(1)
        .create_async()
        .await;

    let issues = api_key_client(&server).watched_issues().await.unwrap();

    let ids: Vec<u32> = issues.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(issues[0].assignee_name(), "Bob Jones");

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
}

#[tokio::test]
async fn test_empty_collection_makes_exactly_one_request() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/issues.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(issues_page(&[], 0, 0))
        .expect(1)
        .create_async()
        .await;

    let issues = api_key_client(&server).watched_issues().await.unwrap();

    assert!(issues.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_page_before_total_stops_pagination() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", "/issues.json")
        .match_query(Matcher::Exact("limit=100&watcher_id=me".into()))
        .with_status(200)
        .with_body(issues_page(&[1, 2], 10, 0))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/issues.json")
        .match_query(Matcher::Exact("limit=100&offset=2&watcher_id=me".into()))
        .with_status(200)
        .with_body(issues_page(&[], 10, 2))
        .expect(1)
        .create_async()
        .await;

    let issues = api_key_client(&server).watched_issues().await.unwrap();

    assert_eq!(issues.len(), 2);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_projects_use_same_offset_rule() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", "/projects.json")
        .match_query(Matcher::Exact("limit=2".into()))
        .with_status(200)
        .with_body(
            json!({"projects": [project_json(1), project_json(2)], "total_count": 3, "offset": 0, "limit": 2})
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/projects.json")
        .match_query(Matcher::Exact("limit=2&offset=2".into()))
        .with_status(200)
        .with_body(
            json!({"projects": [project_json(3)], "total_count": 3, "offset": 2, "limit": 2})
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let projects = api_key_client(&server)
        .with_page_size(2)
        .projects()
        .await
        .unwrap();

    let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Project 1", "Project 2", "Project 3"]);
    assert_eq!(projects[0].description, "");
    assert!(projects[0].is_public);

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_time_entries_sends_filter_params() {
    let mut server = Server::new_async().await;
    let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

    let mock = server
        .mock("GET", "/time_entries.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("user_id".into(), "me".into()),
            Matcher::UrlEncoded("spent_on".into(), "><2024-01-03|2024-01-10".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "time_entries": [time_entry_json(1, 1.5), time_entry_json(2, 0.5)],
                "total_count": 2,
                "offset": 0,
                "limit": 100
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let params = query::time_entry_params_on("me", "", 7, today);
    let entries = api_key_client(&server).time_entries(params).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].issue_id(), Some(42));
    assert_eq!(entries.iter().map(|e| e.hours).sum::<f64>(), 2.0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_time_entries_use_client_page_size_and_offset() {
    let mut server = Server::new_async().await;
    let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

    let first = server
        .mock("GET", "/time_entries.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::Regex("^limit=2&spent_on=".into()),
            Matcher::UrlEncoded("user_id".into(), "me".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "time_entries": [time_entry_json(1, 1.0), time_entry_json(2, 2.0)],
                "total_count": 3,
                "offset": 0,
                "limit": 2
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/time_entries.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "2".into()),
            Matcher::UrlEncoded("offset".into(), "2".into()),
            Matcher::UrlEncoded("spent_on".into(), "><2024-01-03|2024-01-10".into()),
            Matcher::UrlEncoded("user_id".into(), "me".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "time_entries": [time_entry_json(3, 0.5)],
                "total_count": 3,
                "offset": 2,
                "limit": 2
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let params = query::time_entry_params_on("me", "", 7, today);
    let entries = api_key_client(&server)
        .with_page_size(2)
        .time_entries(params)
        .await
        .unwrap();

    let ids: Vec<u32> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_api_key_mode_sends_only_key_header() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/issue_statuses.json")
        .match_header("x-redmine-api-key", API_KEY)
        .match_header("authorization", Matcher::Missing)
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body(
            json!({"issue_statuses": [
                {"id": 1, "name": "New", "is_default": true, "is_closed": false},
                {"id": 5, "name": "Closed", "is_closed": true}
            ]})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let statuses = api_key_client(&server).issue_statuses().await.unwrap();

    assert_eq!(statuses.len(), 2);
    assert!(statuses[0].is_default);
    assert!(statuses[1].is_closed);
    assert!(!statuses[1].is_default);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_basic_mode_sends_only_authorization_header() {
    let mut server = Server::new_async().await;

    // base64("alice:s3cret")
    let mock = server
        .mock("GET", "/users/current.json")
        .match_header("authorization", "Basic YWxpY2U6czNjcmV0")
        .match_header("x-redmine-api-key", Matcher::Missing)
        .with_status(200)
        .with_body(json!({"user": {"id": 5, "login": "alice", "api_key": "abc"}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = RedmineClient::with_http_client(
        reqwest::Client::new(),
        &server.url(),
        Auth::basic("alice", "s3cret"),
    );
    let user = client.current_user().await.unwrap();

    assert_eq!(user.login, "alice");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_login_exchanges_credentials_for_api_key() {
    let mut server = Server::new_async().await;

    let current_user = server
        .mock("GET", "/users/current.json")
        .match_header("authorization", "Basic YWxpY2U6czNjcmV0")
        .with_status(200)
        .with_body(
            json!({"user": {
                "id": 5,
                "login": "alice",
                "firstname": "Alice",
                "lastname": "Smith",
                "mail": "alice@example.com",
                "api_key": "exchanged-key",
                "last_login_on": "2024-01-09T08:00:00Z"
            }})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let statuses = server
        .mock("GET", "/issue_statuses.json")
        .match_header("x-redmine-api-key", "exchanged-key")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(json!({"issue_statuses": []}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = RedmineClient::login(&server.url(), "alice", "s3cret")
        .await
        .unwrap();
    assert_eq!(client.api_key(), Some("exchanged-key"));

    client.issue_statuses().await.unwrap();

    current_user.assert_async().await;
    statuses.assert_async().await;
}

#[tokio::test]
async fn test_login_with_bad_credentials_is_auth_failure() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/users/current.json")
        .with_status(401)
        .with_body("")
        .create_async()
        .await;

    let err = RedmineClient::login(&server.url(), "alice", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::AuthFailed(_)));
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_login_with_malformed_user_is_auth_failure() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/users/current.json")
        .with_status(200)
        .with_body("<html>login</html>")
        .create_async()
        .await;

    let err = RedmineClient::login(&server.url(), "alice", "s3cret")
        .await
        .unwrap_err();

    match err {
        ApiError::AuthFailed(inner) => assert!(matches!(*inner, ApiError::Decode(_))),
        other => panic!("Expected AuthFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_login_without_api_key_in_response() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/users/current.json")
        .with_status(200)
        .with_body(json!({"user": {"id": 5, "login": "alice"}}).to_string())
        .create_async()
        .await;

    let err = RedmineClient::login(&server.url(), "alice", "s3cret")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::MissingApiKey));
}

#[tokio::test]
async fn test_missing_issue_is_http_404() {
    let mut server = Server::new_async().await;
    let body = r#"{"errors":["Not found"]}"#;

    server
        .mock("GET", "/issues/999.json")
        .with_status(404)
        .with_body(body)
        .create_async()
        .await;

    let err = api_key_client(&server).issue(999).await.unwrap_err();

    assert!(err.is_not_found());
    match err {
        ApiError::Http {
            status,
            message,
            body: raw,
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not found");
            assert_eq!(raw, body);
        }
        other => panic!("Expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_issue_twice_yields_equal_records() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/issues/42.json")
        .with_status(200)
        .with_body(json!({"issue": issue_json(42)}).to_string())
        .expect(2)
        .create_async()
        .await;

    let client = api_key_client(&server);
    let first = client.issue(42).await.unwrap();
    let second = client.issue(42).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.subject, "Issue 42");
    assert_eq!(first.custom_field("Browser"), Some("Firefox"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_issue_sends_only_set_fields() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("PUT", "/issues/42.json")
        .match_header("x-redmine-api-key", API_KEY)
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"issue": {"subject": "New subject"}})))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let update = IssueUpdate::new().subject("New subject");
    api_key_client(&server)
        .update_issue(42, &update)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_issue_can_clear_fields() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("PUT", "/issues/42.json")
        .match_body(Matcher::Json(json!({
            "issue": {"done_ratio": 0, "description": "", "notes": "Reset progress"}
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let update = IssueUpdate::new()
        .done_ratio(0)
        .description("")
        .notes("Reset progress");
    api_key_client(&server)
        .update_issue(42, &update)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_validation_failure_reports_messages() {
    let mut server = Server::new_async().await;

    server
        .mock("PUT", "/issues/42.json")
        .with_status(422)
        .with_body(r#"{"errors":["Subject cannot be blank"]}"#)
        .create_async()
        .await;

    let err = api_key_client(&server)
        .update_issue(42, &IssueUpdate::new().subject(""))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "HTTP 422: Subject cannot be blank");
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/issues/1.json")
        .with_status(200)
        .with_body(r#"{"issue": {"id": "not a number"}}"#)
        .create_async()
        .await;

    let err = api_key_client(&server).issue(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_redirect_status_without_location_is_success() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/legacy")
        .with_status(302)
        .with_body("moved")
        .create_async()
        .await;

    let client = api_key_client(&server);
    let url = format!("{}/legacy", client.base_url());
    let body = client.send(Method::GET, &url, None).await.unwrap();

    assert_eq!(body, b"moved");
}

#[tokio::test]
async fn test_server_error_is_http_error() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/projects.json")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("Internal error")
        .create_async()
        .await;

    let err = api_key_client(&server).projects().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = RedmineClient::with_api_key("http://127.0.0.1:1", API_KEY);
    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

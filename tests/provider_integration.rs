//! Integration tests for the forge provider using wiremock and a temporary cache directory

use chrono::{TimeZone, Utc};
use core::time::Duration;
use repo_stats::facts::{Cache, Provider, RepoSpec};
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUES_PATH: &str = "/repos/etcd-io/etcd/issues";
const RELEASES_PATH: &str = "/repos/etcd-io/etcd/releases";

fn repo() -> RepoSpec {
    "etcd-io/etcd".parse().expect("valid repository")
}

fn cache(dir: &Path) -> Cache {
    Cache::new(dir, Duration::from_secs(24 * 3600), Utc::now(), false)
}

fn issue(number: u64, created_at: &str, closed_at: Option<&str>, login: &str) -> serde_json::Value {
    json!({
        "number": number,
        "state": if closed_at.is_some() { "closed" } else { "open" },
        "created_at": created_at,
        "closed_at": closed_at,
        "user": { "login": login },
    })
}

async fn mount_releases(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "tag_name": "v3.5.0",
                "created_at": "2024-01-02T00:00:00Z",
                "assets": [{ "download_count": 120 }, { "download_count": 30 }]
            }
        ])))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_follows_pagination() {
    let server = MockServer::start().await;

    let next_link = format!(r#"<{}{ISSUES_PATH}?page=2>; rel="next""#, server.uri());
    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .and(query_param("state", "all"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next_link.as_str())
                .insert_header("x-ratelimit-remaining", "4999")
                .insert_header("x-ratelimit-reset", "1700000000")
                .set_body_json(json!([
                    issue(1, "2024-01-01T00:00:00Z", None, "alice"),
                    issue(2, "2024-01-02T00:00:00Z", Some("2024-01-03T00:00:00Z"), "bob"),
                ])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue(3, "2024-01-04T00:00:00Z", None, "carol")])))
        .expect(1)
        .mount(&server)
        .await;

    mount_releases(&server, 1).await;

    let tmp = tempfile::tempdir().expect("temp dir");
    let provider = Provider::new(Some("secret"), &server.uri(), cache(tmp.path())).expect("provider");
    let data = provider.get_repo_data(&repo()).await.expect("repository data");

    let numbers: Vec<u64> = data.issues().iter().map(|i| i.number).collect();
    assert_eq!(numbers, [1, 2, 3]);
    assert_eq!(data.issues()[1].closed_at, Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()));
    assert_eq!(data.releases().len(), 1);
    assert_eq!(data.releases()[0].downloads(), 150);
    assert_eq!(data.collection_start(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_second_run_uses_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue(1, "2024-01-01T00:00:00Z", None, "alice")])))
        .expect(1)
        .mount(&server)
        .await;
    mount_releases(&server, 1).await;

    let tmp = tempfile::tempdir().expect("temp dir");

    let first = Provider::new(None, &server.uri(), cache(tmp.path())).expect("provider");
    let first_data = first.get_repo_data(&repo()).await.expect("first fetch");

    let second = Provider::new(None, &server.uri(), cache(tmp.path())).expect("provider");
    let second_data = second.get_repo_data(&repo()).await.expect("cached fetch");

    assert_eq!(first_data.issues(), second_data.issues());
    assert_eq!(first_data.releases(), second_data.releases());
    assert!(tmp.path().join("github.com/etcd-io/etcd/issues.json").exists());
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_ignore_cached_fetches_again() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    mount_releases(&server, 2).await;

    let tmp = tempfile::tempdir().expect("temp dir");

    let provider = Provider::new(None, &server.uri(), cache(tmp.path())).expect("provider");
    let _ = provider.get_repo_data(&repo()).await.expect("first fetch");

    let ignoring = Cache::new(tmp.path(), Duration::from_secs(24 * 3600), Utc::now(), true);
    let provider = Provider::new(None, &server.uri(), ignoring).expect("provider");
    let data = provider.get_repo_data(&repo()).await.expect("second fetch");
    assert!(data.issues().is_empty());
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_skips_records_missing_required_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            issue(1, "2024-01-01T00:00:00Z", None, "alice"),
            { "number": 2, "user": { "login": "bob" } },
            { "number": 3, "created_at": "2024-01-02T00:00:00Z" },
            { "number": 4, "created_at": "2024-01-02T00:00:00Z", "user": { "login": "dave" }, "pull_request": { "merged_at": null } },
        ])))
        .mount(&server)
        .await;
    mount_releases(&server, 1).await;

    let tmp = tempfile::tempdir().expect("temp dir");
    let provider = Provider::new(None, &server.uri(), cache(tmp.path())).expect("provider");
    let data = provider.get_repo_data(&repo()).await.expect("repository data");

    let numbers: Vec<u64> = data.issues().iter().map(|i| i.number).collect();
    assert_eq!(numbers, [1, 4]);
    assert!(data.issues()[1].is_pull_request);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_not_found_is_an_error_and_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().expect("temp dir");

    let provider = Provider::new(None, &server.uri(), cache(tmp.path())).expect("provider");
    let err = provider.get_repo_data(&repo()).await.expect_err("missing repository");
    assert!(err.to_string().contains("not found"), "unexpected error: {err}");

    let provider = Provider::new(None, &server.uri(), cache(tmp.path())).expect("provider");
    let err = provider.get_repo_data(&repo()).await.expect_err("cached missing repository");
    assert!(err.to_string().contains("(cached)"), "unexpected error: {err}");
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_rate_limited_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1700000000")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().expect("temp dir");
    let provider = Provider::new(None, &server.uri(), cache(tmp.path())).expect("provider");
    let err = provider.get_repo_data(&repo()).await.expect_err("rate limited");
    assert!(err.to_string().contains("rate limit"), "unexpected error: {err}");

    // a refused request must not poison the cache
    assert!(!tmp.path().join("github.com/etcd-io/etcd/issues.json").exists());
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_server_error_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().expect("temp dir");
    let provider = Provider::new(None, &server.uri(), cache(tmp.path())).expect("provider");
    let _ = provider.get_repo_data(&repo()).await.expect_err("server error");
}

//! Forge API client
//!
//! Minimal client for the GitHub REST API (v3) and compatible forges, covering the issue and
//! release listings. Wire types keep every field optional so that a single malformed record
//! never fails a whole page; validation happens in [`records`](super::records).

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, LINK};
use serde::{Deserialize, Serialize};

/// Issue or pull request as listed by `/repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Issue {
    #[serde(default)]
    pub number: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub user: Option<User>,

    /// Present only when the issue is a pull request.
    pub pull_request: Option<PullRequestMarker>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub login: Option<String>,
}

/// Marker type to detect if an issue is actually a pull request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PullRequestMarker {
    pub merged_at: Option<DateTime<Utc>>,
}

/// Release as listed by `/repos/{owner}/{repo}/releases`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Release {
    #[serde(default)]
    pub id: u64,
    pub tag_name: Option<String>,
    pub name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseAsset {
    #[serde(default)]
    pub download_count: u64,
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a forge API call
#[derive(Debug)]
pub enum ApiResult<T> {
    /// Request succeeded, with the rate limit reported alongside it
    Success(T, Option<RateLimitInfo>),

    /// The forge refused the request because the quota is used up
    RateLimited(Option<RateLimitInfo>),

    /// The requested resource was not found (404)
    NotFound,

    /// Any other failure
    Failed(ohno::AppError),
}

/// Forge API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new client with an optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: &str) -> crate::Result<Self> {
        use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("repo-stats/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request and classify the response
    pub async fn api_call(&self, url: &str) -> ApiResult<reqwest::Response> {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return ApiResult::Failed(e.into()),
        };

        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        let status = resp.status();
        if status.is_success() {
            return ApiResult::Success(resp, rate_limit);
        }

        match status.as_u16() {
            403 | 429 => ApiResult::RateLimited(rate_limit),
            404 => ApiResult::NotFound,
            _ => match resp.error_for_status() {
                Err(e) => ApiResult::Failed(e.into()),
                Ok(_) => ApiResult::Failed(ohno::app_err!("unexpected HTTP status {status} for {url}")),
            },
        }
    }
}

/// Whether the `Link` header advertises another page
#[must_use]
pub fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|link| link.contains(r#"rel="next""#))
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_issue_deserialize() {
        let json = r#"{
            "number": 42,
            "state": "closed",
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": "2024-01-02T00:00:00Z",
            "user": { "login": "alice", "id": 1 },
            "labels": []
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.number, 42);
        assert!(issue.closed_at.is_some());
        assert_eq!(issue.user.unwrap().login.as_deref(), Some("alice"));
        assert!(issue.pull_request.is_none());
    }

    #[test]
    fn test_issue_deserialize_with_pull_request() {
        let json = r#"{
            "number": 7,
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": null,
            "pull_request": {
                "url": "https://api.github.com/repos/owner/repo/pulls/7",
                "merged_at": null
            }
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert!(issue.pull_request.is_some());
        assert!(issue.user.is_none());
    }

    #[test]
    fn test_issue_tolerates_missing_fields() {
        let issue: Issue = serde_json::from_str("{}").unwrap();
        assert_eq!(issue.number, 0);
        assert!(issue.created_at.is_none());
    }

    #[test]
    fn test_release_deserialize() {
        let json = r#"{
            "id": 1,
            "tag_name": "v3.5.0",
            "name": "v3.5.0",
            "created_at": "2024-01-01T00:00:00Z",
            "assets": [
                { "name": "etcd-linux-amd64.tar.gz", "download_count": 1200 },
                { "name": "etcd-darwin-amd64.zip", "download_count": 300 }
            ]
        }"#;

        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name.as_deref(), Some("v3.5.0"));
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.assets[0].download_count, 1200);
    }

    #[test]
    fn test_release_without_assets() {
        let release: Release = serde_json::from_str(r#"{ "tag_name": "v1" }"#).unwrap();
        assert!(release.assets.is_empty());
    }

    #[test]
    fn test_wire_types_round_trip_through_cache_format() {
        let json = r#"{ "number": 3, "created_at": "2024-01-01T00:00:00Z", "user": { "login": "bob" } }"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        let again: Issue = serde_json::from_str(&serde_json::to_string(&issue).unwrap()).unwrap();
        assert_eq!(again.number, 3);
        assert_eq!(again.user.unwrap().login.as_deref(), Some("bob"));
    }

    #[test]
    fn test_has_next_page() {
        let mut headers = HeaderMap::new();
        assert!(!has_next_page(&headers));

        let _ = headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://api.github.com/repositories/1/issues?page=2>; rel="next", <https://api.github.com/repositories/1/issues?page=9>; rel="last""#,
            ),
        );
        assert!(has_next_page(&headers));

        let _ = headers.insert(
            LINK,
            HeaderValue::from_static(r#"<https://api.github.com/repositories/1/issues?page=1>; rel="prev""#),
        );
        assert!(!has_next_page(&headers));
    }

    #[test]
    fn test_extract_rate_limit() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("42"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));

        let info = extract_rate_limit_from_headers(&headers).unwrap();
        assert_eq!(info.remaining, 42);
        assert_eq!(info.reset_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_extract_rate_limit_missing_or_invalid() {
        let mut headers = HeaderMap::new();
        assert!(extract_rate_limit_from_headers(&headers).is_none());

        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("lots"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
        assert!(extract_rate_limit_from_headers(&headers).is_none());
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = Client::new(Some("secret"), "https://api.github.com/").unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");
    }
}

use std::time::Duration;

use anyhow::bail;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use warden_issues::issue_model::{GithubIssue, IssueUpdate};

use crate::error::{truncate_for_error, GithubError, ERROR_BODY_MAX_CHARS};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

const ISSUES_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Target repository reference in `owner/name` form.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let trimmed = raw.trim();
        let Some((owner, name)) = trimmed.split_once('/') else {
            bail!("invalid repository '{raw}', expected owner/name");
        };
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{raw}', expected owner/name");
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
/// Response for a created issue comment.
pub struct CommentCreateResponse {
    pub id: u64,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone)]
/// Authenticated tracker client for one repository.
///
/// Every call is a single attempt with a bounded timeout; failures surface
/// as `GithubError` and the caller decides whether to continue.
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    repo: RepoRef,
}

impl GithubApiClient {
    pub fn new(
        api_base: String,
        token: String,
        repo: RepoRef,
        request_timeout_ms: u64,
    ) -> Result<Self, GithubError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("warden-backlog-bot"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        let auth_value = reqwest::header::HeaderValue::from_str(&auth_header).map_err(|_| {
            GithubError::AuthFailure {
                message: "installation token is not a valid authorization header".to_string(),
            }
        })?;
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Lists every open issue for the repository, oldest update first.
    ///
    /// Pages until a short page so no open issue is missed regardless of
    /// backlog size. Pull requests share the listing and are returned as-is;
    /// the policies skip them.
    pub async fn list_open_issues(&self) -> Result<Vec<GithubIssue>, GithubError> {
        let mut page = 1_u32;
        let mut rows = Vec::new();
        loop {
            let page_value = page.to_string();
            let chunk: Vec<GithubIssue> = self
                .request_json("list open issues", || {
                    self.http
                        .get(format!(
                            "{}/repos/{}/{}/issues",
                            self.api_base, self.repo.owner, self.repo.name
                        ))
                        .query(&[
                            ("state", "open"),
                            ("sort", "updated"),
                            ("direction", "asc"),
                            ("per_page", "100"),
                            ("page", page_value.as_str()),
                        ])
                })
                .await?;
            let chunk_len = chunk.len();
            rows.extend(chunk);
            if chunk_len < ISSUES_PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    pub async fn get_issue(&self, issue_number: u64) -> Result<GithubIssue, GithubError> {
        self.request_json("get issue", || {
            self.http.get(format!(
                "{}/repos/{}/{}/issues/{}",
                self.api_base, self.repo.owner, self.repo.name, issue_number
            ))
        })
        .await
    }

    pub async fn update_issue(
        &self,
        issue_number: u64,
        update: &IssueUpdate,
    ) -> Result<GithubIssue, GithubError> {
        self.request_json("update issue", || {
            self.http
                .patch(format!(
                    "{}/repos/{}/{}/issues/{}",
                    self.api_base, self.repo.owner, self.repo.name, issue_number
                ))
                .json(update)
        })
        .await
    }

    pub async fn create_issue_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<CommentCreateResponse, GithubError> {
        let payload = json!({ "body": body });
        self.request_json("create issue comment", || {
            self.http
                .post(format!(
                    "{}/repos/{}/{}/issues/{}/comments",
                    self.api_base, self.repo.owner, self.repo.name, issue_number
                ))
                .json(&payload)
        })
        .await
    }

    async fn request_json<T, F>(
        &self,
        operation: &'static str,
        request_builder: F,
    ) -> Result<T, GithubError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> reqwest::RequestBuilder,
    {
        let response = request_builder().send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GithubError::ApiStatus {
            operation,
            status: status.as_u16(),
            body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
        })
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use warden_issues::issue_model::IssueUpdate;

    use super::{GithubApiClient, GithubError, RepoRef};

    fn issue_row(number: u64, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": number + 1_000,
            "number": number,
            "title": title,
            "body": "body",
            "state": "open",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
            "user": {"login": "alice"},
            "labels": []
        })
    }

    fn test_client(base_url: &str) -> GithubApiClient {
        let repo = RepoRef::parse("acme/launcher").expect("test repo");
        GithubApiClient::new(base_url.to_string(), "test-token".to_string(), repo, 3_000)
            .expect("test client")
    }

    #[test]
    fn unit_repo_ref_parse_accepts_owner_name_and_rejects_garbage() {
        let repo = RepoRef::parse(" acme / launcher ").expect("parsed");
        assert_eq!(repo.as_slug(), "acme/launcher");
        assert!(RepoRef::parse("acme").is_err());
        assert!(RepoRef::parse("acme/").is_err());
        assert!(RepoRef::parse("acme/launcher/extra").is_err());
    }

    #[tokio::test]
    async fn functional_list_open_issues_pages_until_short_page() {
        let server = MockServer::start_async().await;
        let full_page: Vec<serde_json::Value> = (1..=100)
            .map(|number| issue_row(number, "older issue"))
            .collect();
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/acme/launcher/issues")
                    .query_param("state", "open")
                    .query_param("sort", "updated")
                    .query_param("direction", "asc")
                    .query_param("page", "1");
                then.status(200).json_body(serde_json::json!(full_page));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/acme/launcher/issues")
                    .query_param("page", "2");
                then.status(200)
                    .json_body(serde_json::json!([issue_row(101, "newest issue")]));
            })
            .await;

        let client = test_client(&server.base_url());
        let issues = client.list_open_issues().await.expect("list issues");
        assert_eq!(issues.len(), 101);
        assert_eq!(issues[100].number, 101);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn functional_update_issue_patches_state_reason_and_labels() {
        let server = MockServer::start_async().await;
        let patch = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/repos/acme/launcher/issues/17")
                    .json_body(serde_json::json!({
                        "state": "closed",
                        "state_reason": "not_planned",
                        "labels": ["long time no reply"]
                    }));
                then.status(200).json_body(issue_row(17, "stale issue"));
            })
            .await;

        let client = test_client(&server.base_url());
        let update = IssueUpdate {
            state: Some("closed".to_string()),
            state_reason: Some("not_planned".to_string()),
            labels: Some(vec!["long time no reply".to_string()]),
        };
        client.update_issue(17, &update).await.expect("update issue");
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn functional_create_issue_comment_posts_body() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/launcher/issues/17/comments")
                    .json_body(serde_json::json!({"body": "a notice"}));
                then.status(201).json_body(serde_json::json!({
                    "id": 900,
                    "html_url": "https://example.invalid/comment/900"
                }));
            })
            .await;

        let client = test_client(&server.base_url());
        let created = client
            .create_issue_comment(17, "a notice")
            .await
            .expect("create comment");
        assert_eq!(created.id, 900);
        post.assert_async().await;
    }

    #[tokio::test]
    async fn regression_non_success_status_surfaces_operation_and_body_once() {
        let server = MockServer::start_async().await;
        let failing = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/launcher/issues/99");
                then.status(404).body("missing issue");
            })
            .await;

        let client = test_client(&server.base_url());
        let error = client.get_issue(99).await.expect_err("expected failure");
        match error {
            GithubError::ApiStatus {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, "get issue");
                assert_eq!(status, 404);
                assert_eq!(body, "missing issue");
            }
            other => panic!("unexpected error: {other}"),
        }
        // exactly one attempt per call
        failing.assert_hits_async(1).await;
    }
}

//! Tracker client: the `IssueTracker` seam and its GitHub REST implementation.
//!
//! Every call goes through the configured [`RetryPolicy`](crate::RetryPolicy),
//! so callers see one definitive outcome per operation.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{TrackerConfig, DEFAULT_WEB_URL};
use crate::error::{TrackerError, TrackerResult};
use crate::types::{CreatedIssue, IssueUpdate, NewIssue, RawIssue, RawLabel, TrackerLabel};

const LABEL_PAGE_SIZE: u32 = 100;
const GITHUB_API_VERSION: &str = "2022-11-28";
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Operations the release orchestrator needs from an issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create an issue and return the tracker's record of it.
    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<CreatedIssue>;

    /// Fetch a single issue by number.
    async fn get_issue(&self, number: u64) -> TrackerResult<CreatedIssue>;

    /// Apply a partial update to an issue.
    async fn update_issue(&self, number: u64, update: &IssueUpdate)
        -> TrackerResult<CreatedIssue>;

    /// All labels defined on the repository, in tracker order.
    async fn list_labels(&self) -> TrackerResult<Vec<TrackerLabel>>;

    /// Browser-facing root of the tracker, e.g. `https://github.com`.
    fn web_url(&self) -> String {
        DEFAULT_WEB_URL.to_string()
    }
}

#[async_trait]
impl<T: IssueTracker + ?Sized> IssueTracker for &T {
    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<CreatedIssue> {
        (**self).create_issue(issue).await
    }

    async fn get_issue(&self, number: u64) -> TrackerResult<CreatedIssue> {
        (**self).get_issue(number).await
    }

    async fn update_issue(
        &self,
        number: u64,
        update: &IssueUpdate,
    ) -> TrackerResult<CreatedIssue> {
        (**self).update_issue(number, update).await
    }

    async fn list_labels(&self) -> TrackerResult<Vec<TrackerLabel>> {
        (**self).list_labels().await
    }

    fn web_url(&self) -> String {
        (**self).web_url()
    }
}

/// Repository identifier in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    owner: String,
    name: String,
}

impl RepoSlug {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Web page where repository labels are managed on the tracker at `web_url`.
    pub fn labels_page(&self, web_url: &str) -> String {
        format!("{}/{self}/labels", web_url.trim_end_matches('/'))
    }

    /// Repository argument for the `gh` CLI: bare `owner/repo` on github.com,
    /// `HOST/owner/repo` anywhere else.
    pub fn gh_repo_arg(&self, web_url: &str) -> String {
        let web_url = web_url.trim_end_matches('/');
        if web_url == DEFAULT_WEB_URL {
            return self.to_string();
        }
        let host = web_url
            .split_once("://")
            .map_or(web_url, |(_, host)| host);
        format!("{host}/{self}")
    }
}

impl FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("expected repository as 'owner/repo', got '{s}'")),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// GitHub REST API implementation of [`IssueTracker`].
pub struct GitHubTracker {
    http: reqwest::Client,
    config: TrackerConfig,
    repo: RepoSlug,
}

impl GitHubTracker {
    /// Build an authenticated client for `repo`.
    pub fn new(config: TrackerConfig, repo: RepoSlug, token: &str) -> TrackerResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| TrackerError::Config("access token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TrackerError::Config(e.to_string()))?;

        Ok(Self { http, config, repo })
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.config.base_url(), self.repo, path)
    }

    /// Send one request and map the response onto a typed result.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> TrackerResult<T> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Tracker response");

        if status.is_success() {
            return response.json::<T>().await.map_err(TrackerError::from);
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &headers, &body))
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<CreatedIssue> {
        let url = self.repo_url("issues");
        let raw: RawIssue = self
            .config
            .retry
            .run("create_issue", || self.execute(self.http.post(&url).json(issue)))
            .await?;
        Ok(raw.into())
    }

    async fn get_issue(&self, number: u64) -> TrackerResult<CreatedIssue> {
        let url = self.repo_url(&format!("issues/{number}"));
        let raw: RawIssue = self
            .config
            .retry
            .run("get_issue", || self.execute(self.http.get(&url)))
            .await?;
        Ok(raw.into())
    }

    async fn update_issue(
        &self,
        number: u64,
        update: &IssueUpdate,
    ) -> TrackerResult<CreatedIssue> {
        let url = self.repo_url(&format!("issues/{number}"));
        let raw: RawIssue = self
            .config
            .retry
            .run("update_issue", || self.execute(self.http.patch(&url).json(update)))
            .await?;
        Ok(raw.into())
    }

    async fn list_labels(&self) -> TrackerResult<Vec<TrackerLabel>> {
        let url = self.repo_url("labels");
        let mut labels = Vec::new();
        let mut page: u32 = 1;

        loop {
            let batch: Vec<RawLabel> = self
                .config
                .retry
                .run("list_labels", || {
                    self.execute(
                        self.http
                            .get(&url)
                            .query(&[("per_page", LABEL_PAGE_SIZE), ("page", page)]),
                    )
                })
                .await?;

            let fetched = batch.len();
            labels.extend(batch.into_iter().map(TrackerLabel::from));
            if fetched < LABEL_PAGE_SIZE as usize {
                break;
            }
            page += 1;
        }

        debug!(count = labels.len(), pages = page, "Fetched tracker labels");
        Ok(labels)
    }

    fn web_url(&self) -> String {
        self.config.web_url()
    }
}

/// Map a non-success response onto the error taxonomy.
///
/// 403 counts as rate limiting only when GitHub says so: an exhausted
/// `x-ratelimit-remaining` or an explicit `Retry-After`.
pub fn classify_failure(status: StatusCode, headers: &HeaderMap, body: &str) -> TrackerError {
    let retry_after = parse_retry_after(headers);

    match status {
        StatusCode::UNAUTHORIZED => TrackerError::Auth(error_message(status, body)),
        StatusCode::TOO_MANY_REQUESTS => TrackerError::RateLimited { retry_after },
        StatusCode::FORBIDDEN if retry_after.is_some() || quota_exhausted(headers) => {
            TrackerError::RateLimited { retry_after }
        }
        _ => TrackerError::Http {
            status: status.as_u16(),
            message: error_message(status, body),
        },
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values fall back to backoff.
fn parse_retry_after(headers: &HeaderMap) -> Option<std::time::Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(std::time::Duration::from_secs)
}

fn quota_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// Prefer GitHub's `{"message": ...}`; otherwise a truncated raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));

    let message = from_json
        .unwrap_or_else(|| body.trim().chars().take(MAX_ERROR_MESSAGE_CHARS).collect());
    if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        message
    }
}

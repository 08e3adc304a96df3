use super::issue::{Issue, IssueDraft, IssueState, IssueUpdate, RepositoryInfo};
use super::{with_retries, IssueTracker, RetryConfig, TrackerError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use validator::Validate;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const PAGE_SIZE: &str = "100";

pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    retry: RetryConfig,
}

impl GitHubClient {
    pub fn new(token: &str, owner: &str, repo: &str, base_url: &str) -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("mdiss/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|e| TrackerError::ValidationError(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("token {}", token.trim()))
                .map_err(|e| TrackerError::ValidationError(format!("Invalid token: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TrackerError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            retry: RetryConfig::new(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.base_url, self.owner, self.repo, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, TrackerError> {
        with_retries(&self.retry, move || {
            self.send_once(method.clone(), url, query, body)
        })
        .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, TrackerError> {
        debug!(%method, url, "github request");
        let mut request = self.client.request(method, url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TrackerError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let rate_limited = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|remaining| remaining == "0");
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(status_error(status, rate_limited, error_body));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| TrackerError::NetworkError(format!("Failed to read response body: {}", e)))?;

        serde_json::from_str(&response_text).map_err(|e| {
            TrackerError::ParseError(format!("Failed to parse GitHub response: {}", e))
        })
    }
}

fn status_error(status: StatusCode, rate_limited: bool, body: String) -> TrackerError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => TrackerError::RateLimitError(body),
        StatusCode::FORBIDDEN if rate_limited => TrackerError::RateLimitError(body),
        StatusCode::UNAUTHORIZED => TrackerError::AuthenticationError("Invalid GitHub token".to_string()),
        StatusCode::FORBIDDEN => TrackerError::AuthenticationError(format!("Access denied: {}", body)),
        StatusCode::NOT_FOUND => TrackerError::NotFound(body),
        StatusCode::UNPROCESSABLE_ENTITY => TrackerError::ValidationError(body),
        status => TrackerError::APIError {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn test_connection(&self) -> Result<RepositoryInfo, TrackerError> {
        self.execute(Method::GET, &self.repo_url(""), &[], None).await
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<Issue, TrackerError> {
        draft.validate()?;
        let body = serde_json::to_value(draft)?;
        let issue: Issue = self
            .execute(Method::POST, &self.repo_url("/issues"), &[], Some(&body))
            .await?;
        info!(number = issue.number, url = %issue.html_url, "created issue");
        Ok(issue)
    }

    async fn list_issues(&self, state: IssueState, labels: Option<&str>) -> Result<Vec<Issue>, TrackerError> {
        let mut query = vec![
            ("state", state.as_str().to_string()),
            ("per_page", PAGE_SIZE.to_string()),
        ];
        if let Some(labels) = labels.filter(|l| !l.trim().is_empty()) {
            query.push(("labels", labels.to_string()));
        }

        let issues: Vec<Issue> = self
            .execute(Method::GET, &self.repo_url("/issues"), &query, None)
            .await?;
        Ok(issues.into_iter().filter(|i| i.pull_request.is_none()).collect())
    }

    async fn get_issue(&self, number: u64) -> Result<Issue, TrackerError> {
        self.execute(Method::GET, &self.repo_url(&format!("/issues/{}", number)), &[], None)
            .await
    }

    async fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<Issue, TrackerError> {
        let body = serde_json::to_value(update)?;
        self.execute(
            Method::PATCH,
            &self.repo_url(&format!("/issues/{}", number)),
            &[],
            Some(&body),
        )
        .await
    }
}

use crate::models::{AnalysisResult, CommandRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

mod error;
mod github;
pub mod issue;

pub use error::TrackerError;
pub use github::GitHubClient;
pub use issue::{
    DraftOptions, Issue, IssueDraft, IssueState, IssueUpdate, RepositoryInfo, StatusUpdate,
};

const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY: u64 = 1000; // milliseconds
const MAX_RETRY_DELAY: u64 = 10000; // 10 seconds max delay

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: u64,
    pub max_delay: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: INITIAL_RETRY_DELAY,
            max_delay: MAX_RETRY_DELAY,
        }
    }

    fn should_retry(&self, error: &TrackerError) -> bool {
        matches!(
            error,
            TrackerError::RateLimitError(_) | TrackerError::NetworkError(_)
        )
    }

    fn get_delay(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay.min(self.max_delay))
    }
}

pub(crate) async fn with_retries<T, F, Fut>(config: &RetryConfig, f: F) -> Result<T, TrackerError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, TrackerError>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if config.should_retry(&e) && attempt + 1 < config.max_retries => {
                let delay = config.get_delay(attempt);
                warn!(error = %e, ?delay, "request failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Issue operations the filing workflow needs from a hosted tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn test_connection(&self) -> Result<RepositoryInfo, TrackerError>;
    async fn create_issue(&self, draft: &IssueDraft) -> Result<Issue, TrackerError>;
    async fn list_issues(&self, state: IssueState, labels: Option<&str>) -> Result<Vec<Issue>, TrackerError>;
    async fn get_issue(&self, number: u64) -> Result<Issue, TrackerError>;
    async fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<Issue, TrackerError>;
}

pub async fn update_status<T>(tracker: &T, number: u64, status: StatusUpdate) -> Result<Issue, TrackerError>
where
    T: IssueTracker + ?Sized,
{
    let current = tracker.get_issue(number).await?;
    let update = status.to_update(&current.label_names());
    tracker.update_issue(number, &update).await
}

#[derive(Debug, Clone, Default)]
pub struct FilingOptions {
    pub dry_run: bool,
    pub skip_existing: bool,
    pub draft: DraftOptions,
}

#[derive(Debug)]
pub enum FilingOutcome {
    Created(Issue),
    Skipped { title: String, existing: Issue },
    DryRun(IssueDraft),
    Failed { title: String, error: TrackerError },
}

/// Files one issue per (record, analysis) pair. A failure on one pair is
/// recorded and the batch continues.
pub async fn file_issues<T>(
    tracker: &T,
    pairs: &[(CommandRecord, AnalysisResult)],
    options: &FilingOptions,
) -> Vec<FilingOutcome>
where
    T: IssueTracker + ?Sized,
{
    let drafts = pairs
        .iter()
        .map(|(record, analysis)| IssueDraft::compose(record, analysis, &options.draft));

    if options.dry_run {
        return drafts.map(FilingOutcome::DryRun).collect();
    }

    let mut existing: HashMap<String, Issue> = HashMap::new();
    if options.skip_existing {
        match tracker.list_issues(IssueState::Open, None).await {
            Ok(issues) => {
                existing.extend(issues.into_iter().map(|issue| (issue.title.clone(), issue)))
            }
            Err(e) => warn!(error = %e, "could not list open issues; duplicates will not be detected"),
        }
    }

    let mut outcomes = Vec::with_capacity(pairs.len());
    for draft in drafts {
        if let Some(issue) = existing.get(&draft.title) {
            info!(number = issue.number, title = %draft.title, "skipping existing issue");
            outcomes.push(FilingOutcome::Skipped {
                title: draft.title,
                existing: issue.clone(),
            });
            continue;
        }

        match tracker.create_issue(&draft).await {
            Ok(issue) => {
                if options.skip_existing {
                    existing.insert(issue.title.clone(), issue.clone());
                }
                outcomes.push(FilingOutcome::Created(issue));
            }
            Err(error) => {
                warn!(title = %draft.title, error = %error, "failed to create issue");
                outcomes.push(FilingOutcome::Failed {
                    title: draft.title,
                    error,
                });
            }
        }
    }
    outcomes
}

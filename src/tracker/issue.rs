use super::TrackerError;
use crate::models::{AnalysisResult, CommandRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;
use validator::Validate;

pub const TITLE_PREFIX: &str = "Fix failed command: ";
const MAX_TITLE_CHARS: usize = 100;
const MAX_OUTPUT_CHARS: usize = 4000;

/// Labels that encode workflow status. Setting a status replaces any of these.
pub const STATUS_LABELS: [&str; 2] = ["in progress", "done"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IssueState {
    Open,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Issue ready to be sent to the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct IssueDraft {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct DraftOptions {
    pub default_labels: Vec<String>,
    pub assignees: Vec<String>,
    pub milestone: Option<u64>,
}

impl IssueDraft {
    pub fn compose(record: &CommandRecord, analysis: &AnalysisResult, options: &DraftOptions) -> Self {
        Self {
            title: issue_title(record),
            body: issue_body(record, analysis),
            labels: issue_labels(record, analysis, &options.default_labels),
            assignees: options.assignees.clone(),
            milestone: options.milestone,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Open,
    Closed,
    InProgress,
    Reopened,
    Done,
}

impl FromStr for StatusUpdate {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "open" => Ok(Self::Open),
            "closed" | "close" => Ok(Self::Closed),
            "in_progress" => Ok(Self::InProgress),
            "reopened" | "reopen" => Ok(Self::Reopened),
            "done" => Ok(Self::Done),
            _ => Err(TrackerError::InvalidStatus(s.to_string())),
        }
    }
}

impl StatusUpdate {
    pub fn state(&self) -> &'static str {
        match self {
            Self::Open | Self::InProgress | Self::Reopened => "open",
            Self::Closed | Self::Done => "closed",
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::InProgress => Some("in progress"),
            Self::Done => Some("done"),
            _ => None,
        }
    }

    /// State change plus the label set with the old status label swapped out.
    pub fn to_update(&self, current_labels: &[String]) -> IssueUpdate {
        let mut labels: Vec<String> = current_labels
            .iter()
            .filter(|label| !STATUS_LABELS.contains(&label.as_str()))
            .cloned()
            .collect();
        if let Some(label) = self.label() {
            labels.push(label.to_string());
        }

        IssueUpdate {
            state: Some(self.state().to_string()),
            labels: Some(labels),
            ..Default::default()
        }
    }
}

pub fn issue_title(record: &CommandRecord) -> String {
    let title = format!("{}{}", TITLE_PREFIX, record.title);
    if title.chars().count() <= MAX_TITLE_CHARS {
        title
    } else {
        let kept: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{}...", kept)
    }
}

pub fn issue_labels(record: &CommandRecord, analysis: &AnalysisResult, defaults: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    let candidates = defaults
        .iter()
        .filter(|label| !(label.as_str() == "bug" && record.is_success()))
        .cloned()
        .chain(analysis.labels())
        .chain(std::iter::once(format!("type:{}", record.command_type)));

    for label in candidates {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_OUTPUT_CHARS {
        text.to_string()
    } else {
        let kept: String = text.chars().take(MAX_OUTPUT_CHARS).collect();
        format!("{}\n... (truncated)", kept)
    }
}

pub fn issue_body(record: &CommandRecord, analysis: &AnalysisResult) -> String {
    let mut body = String::new();
    let source = if record.source.is_empty() {
        "unknown"
    } else {
        record.source.as_str()
    };

    let _ = writeln!(body, "## Problem Description\n");
    let _ = writeln!(
        body,
        "Command `{}` failed with return code {}.\n",
        record.command, record.return_code
    );
    let _ = writeln!(
        body,
        "**Priority:** {} | **Category:** {} | **Confidence:** {:.0}%\n",
        analysis.priority.as_str().to_uppercase(),
        analysis.category,
        analysis.confidence * 100.0
    );

    let _ = writeln!(body, "## Command Details\n");
    let _ = writeln!(body, "- **Command:** `{}`", record.command);
    let _ = writeln!(body, "- **Source:** {}", source);
    let _ = writeln!(body, "- **Type:** {}", record.command_type);
    let _ = writeln!(body, "- **Status:** {}", record.status);
    let _ = writeln!(body, "- **Return Code:** {}", record.return_code);
    let _ = writeln!(body, "- **Execution Time:** {:.2}s\n", record.execution_time);

    let _ = writeln!(body, "## Error Analysis\n");
    let _ = writeln!(body, "**Root Cause:** {}\n", analysis.root_cause);

    if let Some(error) = record.error_output.as_ref().filter(|e| !e.content.trim().is_empty()) {
        let _ = writeln!(body, "## Error Output\n\n```\n{}\n```\n", clip(&error.content));
    }

    if !record.output.trim().is_empty() {
        let _ = writeln!(body, "## Standard Output\n\n```\n{}\n```\n", clip(&record.output));
    }

    if !record.metadata.is_empty() {
        let _ = writeln!(body, "## Metadata\n");
        for (key, value) in &record.metadata {
            let _ = writeln!(body, "- **{}:** {}", key, value);
        }
        let _ = writeln!(body);
    }

    let _ = writeln!(body, "## Steps to Reproduce\n");
    let _ = writeln!(body, "1. Check out the project at {}", source);
    let _ = writeln!(body, "2. Run `{}`", record.command);
    let _ = writeln!(body, "3. Observe the failure (return code {})\n", record.return_code);

    let _ = writeln!(body, "## Suggested Solution\n");
    let _ = writeln!(body, "{}\n", analysis.suggested_solution);

    let _ = writeln!(body, "---");
    let _ = write!(body, "*Filed automatically by mdiss v{}.*", env!("CARGO_PKG_VERSION"));
    body
}

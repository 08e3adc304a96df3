use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_COMMAND_TYPE: &str = "shell";
pub const DEFAULT_STATUS: &str = "Failed";
pub const DEFAULT_RETURN_CODE: i32 = 1;

/// One command extracted from a markdown report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub title: String,
    pub command: String,
    pub source: String,
    pub command_type: String,
    pub status: String,
    pub return_code: i32,
    pub execution_time: f64,
    pub output: String,
    pub error_output: Option<ErrorOutput>,
    #[serde(default)]
    pub metadata: IndexMap<String, String>,
    #[serde(default)]
    pub sections: IndexMap<String, Section>,
}

impl CommandRecord {
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            command: String::new(),
            source: source.into(),
            command_type: DEFAULT_COMMAND_TYPE.to_string(),
            status: DEFAULT_STATUS.to_string(),
            return_code: DEFAULT_RETURN_CODE,
            execution_time: 0.0,
            output: String::new(),
            error_output: None,
            metadata: IndexMap::new(),
            sections: IndexMap::new(),
        }
    }

    /// Error text, or an empty string when none was captured.
    pub fn error_text(&self) -> &str {
        self.error_output
            .as_ref()
            .map(|e| e.content.as_str())
            .unwrap_or("")
    }

    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success") && self.return_code == 0
    }

    pub fn append_error(&mut self, text: &str, from_code_block: bool) {
        match self.error_output.as_mut() {
            Some(existing) => existing.append(text, from_code_block),
            None => {
                self.error_output = Some(ErrorOutput {
                    content: text.to_string(),
                    from_code_block,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorOutput {
    pub content: String,
    pub from_code_block: bool,
}

impl ErrorOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            from_code_block: false,
        }
    }

    /// Appends on a new line. The code-block flag sticks once any fenced
    /// content has been added.
    pub fn append(&mut self, text: &str, from_code_block: bool) {
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.content.push_str(text);
        self.from_code_block |= from_code_block;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub content: String,
    pub code_blocks: Vec<CodeBlock>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn push_line(&mut self, line: &str) {
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.content.push_str(line);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub content: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Dependencies,
    MissingFiles,
    Permissions,
    Timeout,
    Syntax,
    Configuration,
    BuildFailure,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::MissingFiles => "missing-files",
            Self::Permissions => "permissions",
            Self::Timeout => "timeout",
            Self::Syntax => "syntax",
            Self::Configuration => "configuration",
            Self::BuildFailure => "build-failure",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub category: Category,
    pub priority: Priority,
    pub confidence: f64,
    pub root_cause: String,
    pub suggested_solution: String,
    pub rule: &'static str,
}

impl AnalysisResult {
    pub fn labels(&self) -> Vec<String> {
        vec![
            format!("priority:{}", self.priority),
            format!("category:{}", self.category),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_record_defaults() {
        let record = CommandRecord::new("Make target: install", "build.md");
        assert_eq!(record.command_type, "shell");
        assert_eq!(record.status, "Failed");
        assert_eq!(record.return_code, 1);
        assert_eq!(record.execution_time, 0.0);
        assert!(record.error_output.is_none());
        assert_eq!(record.error_text(), "");
    }

    #[test]
    fn test_error_output_joins() {
        let mut error = ErrorOutput::new("first line");
        error.append("second line", false);
        assert_eq!(error.content, "first line\nsecond line");
        assert!(!error.from_code_block);

        error.append("Traceback:\n  boom", true);
        assert_eq!(error.content, "first line\nsecond line\nTraceback:\n  boom");
        assert!(error.from_code_block);

        error.append("more fenced output", true);
        assert!(error.content.ends_with("  boom\nmore fenced output"));
    }

    #[test]
    fn test_category_and_priority_wire_names() {
        assert_eq!(serde_json::to_string(&Category::MissingFiles).unwrap(), "\"missing-files\"");
        assert_eq!(serde_json::to_string(&Category::BuildFailure).unwrap(), "\"build-failure\"");
        assert_eq!(serde_json::to_string(&Priority::Critical).unwrap(), "\"critical\"");
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::Medium > Priority::Low);
    }
}

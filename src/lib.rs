pub mod analyzer;
pub mod batch;
pub mod config;
pub mod export;
pub mod models;
pub mod parser;
pub mod stats;
pub mod theme;
pub mod tracker;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use analyzer::ErrorAnalyzer;
pub use config::Config;
pub use models::{AnalysisResult, Category, CommandRecord, ErrorOutput, Priority};
pub use parser::{MarkdownParser, ParseError};
pub use stats::{AnalysisSummary, CommandStatistics};
pub use tracker::{GitHubClient, IssueTracker, TrackerError};

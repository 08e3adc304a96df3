use crate::models::CommandRecord;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

mod builder;
mod code_block;
mod error;
pub mod fields;
mod segmenter;

pub use builder::{build_record, numbered_title};
pub use code_block::{parse_code_blocks, CODE_BLOCK_TITLE};
pub use error::ParseError;
pub use segmenter::{SectionKind, Segmenter};

type Strategy = fn(&str, &str) -> Vec<CommandRecord>;

/// Tried in order; the first strategy that yields anything wins outright.
const STRATEGIES: [(&str, Strategy); 2] = [
    ("numbered-sections", parse_numbered_sections),
    ("code-blocks", parse_code_blocks),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownParser;

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_file(&self, path: &Path) -> Result<Vec<CommandRecord>, ParseError> {
        let metadata = fs::metadata(path).map_err(|e| ParseError::FileAccess {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(ParseError::FileAccess {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => ParseError::FileAccess {
                path: path.to_path_buf(),
                reason: source.to_string(),
            },
            _ => ParseError::Failure {
                path: path.to_path_buf(),
                source,
            },
        })?;

        Ok(self.parse_content(&content, &path.display().to_string()))
    }

    /// Never fails: malformed input yields fewer records, not an error.
    pub fn parse_content(&self, content: &str, source: &str) -> Vec<CommandRecord> {
        for (name, strategy) in STRATEGIES {
            let records = strategy(content, source);
            if !records.is_empty() {
                debug!(strategy = name, count = records.len(), "parsed markdown");
                return records;
            }
        }
        debug!("no commands found in document");
        Vec::new()
    }
}

pub fn parse_numbered_sections(content: &str, source: &str) -> Vec<CommandRecord> {
    split_blocks(content)
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .filter_map(|chunk| build_record(&chunk, source))
        .collect()
}

/// Splits on lines that are exactly `---`. Separators inside fenced code
/// do not count.
pub fn split_blocks(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut fence: Option<char> = None;

    for line in content.lines() {
        let trimmed = line.trim();

        match fence {
            Some(marker) if trimmed.len() >= 3 && trimmed.chars().all(|c| c == marker) => {
                fence = None
            }
            Some(_) => {}
            None if trimmed.starts_with("```") && !trimmed[3..].contains('`') => fence = Some('`'),
            None if trimmed.starts_with("~~~") && !trimmed[3..].contains('~') => fence = Some('~'),
            None if trimmed == "---" => {
                blocks.push(std::mem::take(&mut current));
                continue;
            }
            None => {}
        }

        current.push_str(line);
        current.push('\n');
    }
    blocks.push(current);
    blocks
}

use crate::models::CommandRecord;
use crate::parser::{MarkdownParser, ParseError};
use anyhow::{anyhow, Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const DEFAULT_PATTERN: &str = "*.md";

/// A file path is returned as-is; a directory is walked for file names
/// matching `pattern`.
pub fn collect_markdown_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        return Err(anyhow!("{} is neither a file nor a directory", root.display()));
    }

    let pattern = Pattern::new(pattern).with_context(|| format!("invalid glob pattern '{}'", pattern))?;
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry.file_name().to_str()) || entry.depth() == 0)
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.matches(name))
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!(root = %root.display(), count = files.len(), "collected markdown files");
    Ok(files)
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}

#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub records: Result<Vec<CommandRecord>, ParseError>,
}

/// Parses every file on a blocking task. Results keep the input order.
pub async fn parse_all(files: Vec<PathBuf>) -> Result<Vec<FileResult>> {
    let mut tasks = JoinSet::new();
    for (index, path) in files.into_iter().enumerate() {
        tasks.spawn_blocking(move || {
            let records = MarkdownParser::new().parse_file(&path);
            (index, FileResult { path, records })
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("parser task panicked")?);
    }
    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, result)| result).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn setup_reports() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nightly")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("b.md"), "## 1. B\n**Command:** `make b`\n").unwrap();
        fs::write(dir.path().join("a.md"), "## 1. A\n**Command:** `make a`\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "## 1. Txt\n**Command:** ls\n").unwrap();
        fs::write(dir.path().join("nightly").join("c.md"), "```\ncargo test\n```\n").unwrap();
        fs::write(dir.path().join(".cache").join("d.md"), "## 1. D\n**Command:** x\n").unwrap();
        dir
    }

    #[test]
    fn test_collect_walks_and_filters() {
        let dir = setup_reports();
        let files = collect_markdown_files(dir.path(), DEFAULT_PATTERN).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md", "nightly/c.md"]);
    }

    #[test]
    fn test_collect_single_file_and_missing_path() {
        let dir = setup_reports();
        let file = dir.path().join("notes.txt");
        assert_eq!(collect_markdown_files(&file, DEFAULT_PATTERN).unwrap(), vec![file]);
        assert!(collect_markdown_files(&dir.path().join("nope"), DEFAULT_PATTERN).is_err());
        assert!(collect_markdown_files(dir.path(), "[").is_err());
    }

    #[tokio::test]
    async fn test_parse_all_keeps_order_and_errors() {
        let dir = setup_reports();
        let mut files = collect_markdown_files(dir.path(), DEFAULT_PATTERN).unwrap();
        files.push(dir.path().join("missing.md"));

        let results = parse_all(files).await.unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].records.as_ref().unwrap()[0].command, "make a");
        assert_eq!(results[1].records.as_ref().unwrap()[0].command, "make b");
        assert_eq!(results[2].records.as_ref().unwrap()[0].command, "cargo test");
        assert!(matches!(results[3].records, Err(ParseError::FileAccess { .. })));
    }
}

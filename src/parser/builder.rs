use super::segmenter::Segmenter;
use crate::models::CommandRecord;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static NUMBERED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{1,3}\s+\d+\.\s+(.+?)\s*$").expect("valid numbered title regex")
});

/// Title text of a `## <N>. <title>` line, bold markers removed.
pub fn numbered_title(line: &str) -> Option<String> {
    let caps = NUMBERED_TITLE.captures(line.trim())?;
    let title = caps[1].trim_matches('*').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Builds a record from one `---`-delimited chunk. Returns `None` when the
/// chunk has no numbered title or never names a command.
pub fn build_record(chunk: &str, source: &str) -> Option<CommandRecord> {
    let mut lines = chunk.lines().skip_while(|line| line.trim().is_empty());
    let first = lines.next()?;

    let Some(title) = numbered_title(first) else {
        debug!(line = first.trim(), "chunk does not start with a numbered title");
        return None;
    };

    let mut record = CommandRecord::new(title, source);
    Segmenter::new(&mut record).run(lines);

    if record.command.is_empty() {
        debug!(title = %record.title, "dropping block without a command");
        return None;
    }

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numbered_title_variants() {
        assert_eq!(numbered_title("## 1. Make target: install").as_deref(), Some("Make target: install"));
        assert_eq!(numbered_title("# 12. **Lint**").as_deref(), Some("Lint"));
        assert_eq!(numbered_title("### 3. Deploy **").as_deref(), Some("Deploy"));
        assert_eq!(numbered_title("## Overview"), None);
        assert_eq!(numbered_title("#### 4. Too deep"), None);
    }

    #[test]
    fn test_build_record_with_defaults() {
        let record = build_record("\n## 1. Quick check\n\n**Command:** `cargo check`\n", "ci.md")
            .expect("record");
        assert_eq!(record.title, "Quick check");
        assert_eq!(record.command, "cargo check");
        assert_eq!(record.source, "ci.md");
        assert_eq!(record.status, "Failed");
        assert_eq!(record.return_code, 1);
        assert_eq!(record.command_type, "shell");
    }

    #[test]
    fn test_declared_source_overrides_path() {
        let record = build_record("## 1. x\n**Command:** ls\n**Source:** /srv/Makefile\n", "ci.md").unwrap();
        assert_eq!(record.source, "/srv/Makefile");
    }

    #[test]
    fn test_block_without_command_is_dropped() {
        assert!(build_record("## 2. Nothing here\n**Return Code:** 3\n", "").is_none());
        assert!(build_record("Just prose\n**Command:** ls\n", "").is_none());
    }
}

use crate::models::CommandRecord;
use regex::Regex;
use std::sync::LazyLock;

pub const CODE_BLOCK_TITLE: &str = "Command from code block";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?ms)^[ \t]*```([\w+-]*)[^\n]*\n(.*?)^[ \t]*```[ \t]*\r?$",
        r"|^[ \t]*~~~([\w+-]*)[^\n]*\n(.*?)^[ \t]*~~~[ \t]*\r?$",
    ))
    .expect("valid fenced block regex")
});

/// Every non-empty fenced block in the document becomes a record.
pub fn parse_code_blocks(content: &str, source: &str) -> Vec<CommandRecord> {
    FENCED_BLOCK
        .captures_iter(content)
        .filter_map(|caps| {
            let language = caps.get(1).or_else(|| caps.get(3)).map(|m| m.as_str());
            let body = caps.get(2).or_else(|| caps.get(4))?.as_str().trim();
            if body.is_empty() {
                return None;
            }

            let mut record = CommandRecord::new(CODE_BLOCK_TITLE, source);
            record.command = body.to_string();
            if let Some(language) = language.filter(|l| !l.is_empty() && *l != "bash") {
                record.command_type = language.to_lowercase();
            }
            Some(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_language_sets_command_type() {
        let records = parse_code_blocks(
            "intro\n```bash\nmake test\n```\n\n```python\nprint('hi')\n```\n~~~\nls -la\n~~~\n",
            "notes.md",
        );
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].command, "make test");
        assert_eq!(records[0].command_type, "shell");
        assert_eq!(records[1].command_type, "python");
        assert_eq!(records[2].command, "ls -la");
        assert!(records.iter().all(|r| r.title == CODE_BLOCK_TITLE && r.source == "notes.md"));
    }

    #[test]
    fn test_fence_closes_only_on_its_own_line() {
        let records = parse_code_blocks(
            "```bash\necho ```inline``` done\nls\n```\n\n  ```\n  pwd\n  ```\n",
            "",
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].command, "echo ```inline``` done\nls");
        assert_eq!(records[1].command, "pwd");
    }

    #[test]
    fn test_empty_blocks_are_skipped() {
        assert!(parse_code_blocks("```\n\n```\n", "").is_empty());
        assert!(parse_code_blocks("no fences at all", "").is_empty());
    }
}

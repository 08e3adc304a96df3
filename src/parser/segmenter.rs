use super::fields::{map_field, strip_backticks};
use crate::models::{CodeBlock, CommandRecord, Section};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,3}\s+(.+?)\s*$").expect("valid heading regex"));

// `**Output:**` or `**Output**:` alone on a line.
static BOLD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*([^*]+?)(?::\*\*|\*\*:)\s*$").expect("valid label regex")
});

static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[*-]?\s*\*\*([^*]+?)(?::\*\*|\*\*:)\s*(.+?)\s*$").expect("valid field regex")
});

#[derive(Debug, Clone, PartialEq)]
pub enum SectionKind {
    Command,
    Output,
    ErrorOutput,
    SuggestedSolution,
    Metadata,
    Custom(String),
}

impl SectionKind {
    pub fn from_heading(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("command") {
            Self::Command
        } else if lower.contains("output") && !lower.contains("error") {
            Self::Output
        } else if lower.contains("error") || lower.contains("stderr") {
            Self::ErrorOutput
        } else if lower.contains("suggested") && lower.contains("solution") {
            Self::SuggestedSolution
        } else if lower.contains("metadata") {
            Self::Metadata
        } else {
            Self::Custom(lower)
        }
    }
}

#[derive(Debug)]
struct Fence {
    marker: char,
    language: Option<String>,
}

/// Walks the body of one block and fills in `record`. Fenced code is
/// buffered and only interpreted once its closing fence is seen.
pub struct Segmenter<'r, 'l> {
    record: &'r mut CommandRecord,
    current: Option<SectionKind>,
    fence: Option<Fence>,
    buffer: Vec<&'l str>,
}

impl<'r, 'l> Segmenter<'r, 'l> {
    pub fn new(record: &'r mut CommandRecord) -> Self {
        Self {
            record,
            current: None,
            fence: None,
            buffer: Vec::new(),
        }
    }

    pub fn run<I>(mut self, lines: I)
    where
        I: IntoIterator<Item = &'l str>,
    {
        for line in lines {
            self.process_line(line);
        }
        if self.fence.is_some() && !self.buffer.is_empty() {
            debug!(
                title = %self.record.title,
                lines = self.buffer.len(),
                "dropping unterminated code block"
            );
        }
    }

    fn process_line(&mut self, line: &'l str) {
        let trimmed = line.trim();

        if let Some(fence) = &self.fence {
            if is_closing_fence(trimmed, fence.marker) {
                self.close_code_block();
            } else {
                self.buffer.push(line);
            }
            return;
        }

        if let Some(fence) = opening_fence(trimmed) {
            self.fence = Some(fence);
            self.buffer.clear();
            return;
        }

        if trimmed.is_empty() {
            return;
        }

        if let Some(name) = section_header(trimmed) {
            let kind = SectionKind::from_heading(&name);
            if let SectionKind::Custom(key) = &kind {
                self.record
                    .sections
                    .entry(key.clone())
                    .or_insert_with(|| Section::new(name.clone()));
            }
            self.current = Some(kind);
            return;
        }

        match self.current.clone() {
            // Field list above the first heading, same treatment as a metadata section.
            None | Some(SectionKind::Metadata) => self.process_field_line(trimmed),
            Some(kind) => self.process_section_line(kind, trimmed),
        }
    }

    fn process_field_line(&mut self, line: &str) {
        match FIELD_LINE.captures(line) {
            Some(caps) => map_field(&caps[1], &caps[2]).apply(self.record),
            None => debug!(line, "skipping line outside any field or section"),
        }
    }

    fn process_section_line(&mut self, kind: SectionKind, line: &str) {
        match kind {
            SectionKind::Command => self.record.command = strip_backticks(line),
            SectionKind::Output => {
                if !self.record.output.is_empty() {
                    self.record.output.push('\n');
                }
                self.record.output.push_str(line);
            }
            SectionKind::ErrorOutput => self.record.append_error(line, false),
            SectionKind::SuggestedSolution => self.append_solution(line),
            SectionKind::Custom(key) => {
                if let Some(section) = self.record.sections.get_mut(&key) {
                    section.push_line(line);
                }
            }
            SectionKind::Metadata => self.process_field_line(line),
        }
    }

    fn close_code_block(&mut self) {
        let fence = self.fence.take();
        let lines = std::mem::take(&mut self.buffer);
        let content = lines.join("\n");
        let content = content.trim_matches('\n');

        let Some(kind) = self.current.clone() else {
            return;
        };
        if content.trim().is_empty() {
            return;
        }

        match kind {
            SectionKind::ErrorOutput => self.record.append_error(content, true),
            SectionKind::Output => self.record.output = content.to_string(),
            SectionKind::Command => self.record.command = strip_backticks(content),
            SectionKind::SuggestedSolution => self.append_solution(content),
            SectionKind::Metadata => {}
            SectionKind::Custom(key) => {
                if let Some(section) = self.record.sections.get_mut(&key) {
                    section.code_blocks.push(CodeBlock {
                        content: content.to_string(),
                        language: fence.and_then(|f| f.language),
                    });
                }
            }
        }
    }

    fn append_solution(&mut self, text: &str) {
        self.record
            .metadata
            .entry("suggested_solution".to_string())
            .and_modify(|existing| {
                existing.push('\n');
                existing.push_str(text);
            })
            .or_insert_with(|| text.to_string());
    }
}

/// Heading or bold label text with bold markers and trailing colon removed.
fn section_header(line: &str) -> Option<String> {
    let raw = HEADING
        .captures(line)
        .or_else(|| BOLD_LABEL.captures(line))
        .map(|caps| caps[1].to_string())?;

    let name = raw.trim().trim_end_matches(':').trim();
    let name = name.trim_matches('*').trim().trim_end_matches(':').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn opening_fence(line: &str) -> Option<Fence> {
    let marker = if line.starts_with("```") {
        '`'
    } else if line.starts_with("~~~") {
        '~'
    } else {
        return None;
    };

    let info = line.trim_start_matches(marker).trim();
    if info.contains(marker) {
        return None;
    }
    let language = info
        .split_whitespace()
        .next()
        .map(|tag| tag.to_string());

    Some(Fence { marker, language })
}

fn is_closing_fence(line: &str, marker: char) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == marker)
}

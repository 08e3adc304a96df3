use crate::models::{AnalysisResult, CommandRecord};
use anyhow::Result;
use indexmap::IndexMap;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Table,
    Json,
    Yaml,
    Csv,
}

/// Flat, serializable view of a record and its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportRow {
    pub title: String,
    pub command: String,
    pub source: String,
    pub command_type: String,
    pub status: String,
    pub return_code: i32,
    pub execution_time: f64,
    pub error_output: Option<String>,
    pub metadata: IndexMap<String, String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub confidence: Option<f64>,
}

impl ExportRow {
    pub fn new(record: &CommandRecord, analysis: Option<&AnalysisResult>) -> Self {
        Self {
            title: record.title.clone(),
            command: record.command.clone(),
            source: record.source.clone(),
            command_type: record.command_type.clone(),
            status: record.status.clone(),
            return_code: record.return_code,
            execution_time: record.execution_time,
            error_output: record.error_output.as_ref().map(|e| e.content.clone()),
            metadata: record.metadata.clone(),
            category: analysis.map(|a| a.category.to_string()),
            priority: analysis.map(|a| a.priority.to_string()),
            confidence: analysis.map(|a| a.confidence),
        }
    }
}

const CSV_HEADER: [&str; 12] = [
    "title",
    "command",
    "source",
    "command_type",
    "status",
    "return_code",
    "execution_time",
    "error_output",
    "metadata",
    "category",
    "priority",
    "confidence",
];

pub fn render(rows: &[ExportRow], format: ExportFormat, max_cell_width: usize) -> Result<String> {
    Ok(match format {
        ExportFormat::Json => serde_json::to_string_pretty(rows)? + "\n",
        ExportFormat::Yaml => serde_yaml::to_string(rows)?,
        ExportFormat::Csv => render_csv(rows),
        ExportFormat::Table => render_table(rows, max_cell_width),
    })
}

pub fn export_schema() -> Result<String> {
    let schema = schema_for!(Vec<ExportRow>);
    Ok(serde_json::to_string_pretty(&schema)?)
}

fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for row in rows {
        let metadata = row
            .metadata
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        let fields = [
            row.title.clone(),
            row.command.clone(),
            row.source.clone(),
            row.command_type.clone(),
            row.status.clone(),
            row.return_code.to_string(),
            row.execution_time.to_string(),
            row.error_output.clone().unwrap_or_default(),
            metadata,
            row.category.clone().unwrap_or_default(),
            row.priority.clone().unwrap_or_default(),
            row.confidence.map(|c| format!("{:.2}", c)).unwrap_or_default(),
        ];
        out.push_str(
            &fields
                .iter()
                .map(|field| csv_field(field))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_table(rows: &[ExportRow], max_width: usize) -> String {
    let header = ["#", "Title", "Command", "Type", "RC", "Time", "Category", "Priority"];
    let body: Vec<[String; 8]> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            [
                (i + 1).to_string(),
                truncate(&row.title, max_width),
                truncate(&row.command, max_width),
                row.command_type.clone(),
                row.return_code.to_string(),
                format!("{:.2}s", row.execution_time),
                row.category.clone().unwrap_or_else(|| "-".to_string()),
                row.priority.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = format_line(&header.map(String::from));
    out.push('\n');
    out.push_str(&format_line(&widths.map(|w| "-".repeat(w))));
    out.push('\n');
    for cells in &body {
        out.push_str(&format_line(cells));
        out.push('\n');
    }
    out
}

/// Single-line cell text no longer than `max` characters.
pub fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() <= max && !text.contains('\n') {
        return line.to_string();
    }
    let keep = max.saturating_sub(3);
    format!("{}...", line.chars().take(keep).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ErrorAnalyzer;
    use pretty_assertions::assert_eq;

    fn sample_row() -> ExportRow {
        let mut record = CommandRecord::new("Build, then test", "ci.md");
        record.command = "make test".to_string();
        record.return_code = 2;
        record.execution_time = 1.5;
        record.append_error("said \"no\"\nsecond line", false);
        record.metadata.insert("target".to_string(), "test".to_string());
        let analysis = ErrorAnalyzer::new().analyze(&record);
        ExportRow::new(&record, Some(&analysis))
    }

    #[test]
    fn test_csv_quoting() {
        let csv = render(&[sample_row()], ExportFormat::Csv, 40).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER.join(",").as_str()));
        assert!(csv.contains("\"Build, then test\",make test,ci.md,shell,Failed,2,1.5,"));
        assert!(csv.contains("\"said \"\"no\"\"\nsecond line\""));
        assert!(csv.contains(",target=test,build-failure,low,0.40\n"));
    }

    #[test]
    fn test_json_and_yaml_round_trip() {
        let rows = vec![sample_row()];
        let json = render(&rows, ExportFormat::Json, 40).unwrap();
        let back: Vec<ExportRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rows);

        let yaml = render(&rows, ExportFormat::Yaml, 40).unwrap();
        let back: Vec<ExportRow> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_table_layout() {
        let table = render(&[sample_row()], ExportFormat::Table, 10).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("#  Title"));
        assert!(lines[2].contains("Build, ..."));
        assert!(lines[2].contains("build-failure"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
        assert_eq!(truncate("line one\nline two", 40), "line one...");
    }

    #[test]
    fn test_schema_names_fields() {
        let schema = export_schema().unwrap();
        assert!(schema.contains("\"return_code\""));
        assert!(schema.contains("\"ExportRow\""));
    }
}

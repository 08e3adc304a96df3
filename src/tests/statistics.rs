use super::TestUtils;
use crate::analyzer::ErrorAnalyzer;
use crate::config::AnalysisSettings;
use crate::export::{self, ExportFormat, ExportRow};
use crate::stats::{AnalysisSummary, CommandStatistics};
use pretty_assertions::assert_eq;

#[test]
fn test_sample_statistics() {
    let records = TestUtils::sample_records();
    let stats = CommandStatistics::collect(&records, &AnalysisSettings::default());

    assert_eq!(stats.total, 3);
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.success_rate, 0.0);
    assert_eq!(stats.command_types["make_target"], 2);
    assert_eq!(stats.command_types["npm_script"], 1);
    assert_eq!(stats.return_codes[&-1], 1);
    assert_eq!(stats.timeout_count, 1);
    assert_eq!(stats.critical_count, 0);
    assert!((stats.average_execution_time - 21.42).abs() < 1e-9);
}

#[test]
fn test_sample_summary() {
    let records = TestUtils::sample_records();
    let summary = AnalysisSummary::collect(&ErrorAnalyzer::new().analyze_all(&records));

    assert_eq!(summary.categories["dependencies"], 1);
    assert_eq!(summary.categories["missing-files"], 1);
    assert_eq!(summary.categories["timeout"], 1);
    assert_eq!(summary.priorities["high"], 2);
    assert_eq!(summary.priorities["medium"], 1);
}

#[test]
fn test_sample_exports() {
    let records = TestUtils::sample_records();
    let analyzer = ErrorAnalyzer::new();
    let rows: Vec<ExportRow> = records
        .iter()
        .map(|record| ExportRow::new(record, Some(&analyzer.analyze(record))))
        .collect();

    let json = export::render(&rows, ExportFormat::Json, 40).unwrap();
    let parsed: Vec<ExportRow> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, rows);

    let csv = export::render(&rows, ExportFormat::Csv, 40).unwrap();
    assert_eq!(csv.lines().count(), 1 + records.len() + 2);
    assert!(csv.contains("\"npm error code ENOENT\nnpm error syscall open"));

    let table = export::render(&rows, ExportFormat::Table, 20).unwrap();
    assert!(table.contains("make install"));
}

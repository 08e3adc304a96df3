use super::TestUtils;
use crate::analyzer::ErrorAnalyzer;
use crate::config::AnalysisSettings;
use crate::models::{Category, CommandRecord, Priority};
use crate::tracker::{DraftOptions, IssueDraft};
use pretty_assertions::assert_eq;

#[test]
fn test_sample_classification() {
    let records = TestUtils::sample_records();
    let analyses = ErrorAnalyzer::new().analyze_all(&records);

    let install = &analyses[0];
    assert_eq!(install.category, Category::Dependencies);
    assert_eq!(install.priority, Priority::High);
    assert_eq!(install.confidence, 0.9);
    assert!(install.suggested_solution.contains("poetry lock"));

    let npm = &analyses[1];
    assert_eq!(npm.category, Category::MissingFiles);
    assert_eq!(npm.priority, Priority::Medium);
    assert_eq!(npm.confidence, 0.85);
    assert!(npm.root_cause.contains("/home/test/package.json"));

    let timeout = &analyses[2];
    assert_eq!(timeout.category, Category::Timeout);
    assert_eq!(timeout.priority, Priority::High);
}

#[test]
fn test_classification_is_repeatable() {
    let records = TestUtils::sample_records();
    let analyzer = ErrorAnalyzer::new();
    assert_eq!(analyzer.analyze_all(&records), analyzer.analyze_all(&records));
}

#[test]
fn test_confidence_stays_in_range() {
    let mut records = TestUtils::sample_records();
    records.push(CommandRecord::new("empty", ""));
    for analysis in ErrorAnalyzer::new().analyze_all(&records) {
        assert!((0.0..=1.0).contains(&analysis.confidence));
        assert!(!analysis.root_cause.is_empty());
        assert!(!analysis.suggested_solution.is_empty());
    }
}

#[test]
fn test_custom_critical_codes() {
    let mut record = CommandRecord::new("Exit 77", "");
    record.command = "./run-suite".to_string();
    record.return_code = 77;

    assert_eq!(ErrorAnalyzer::new().analyze(&record).priority, Priority::Low);

    let settings = AnalysisSettings {
        critical_return_codes: vec![77],
        ..AnalysisSettings::default()
    };
    let analysis = ErrorAnalyzer::from_settings(&settings).analyze(&record);
    assert_eq!(analysis.priority, Priority::Critical);
}

#[test]
fn test_sample_issue_drafts() {
    let records = TestUtils::sample_records();
    let analyzer = ErrorAnalyzer::new();
    let drafts: Vec<IssueDraft> = records
        .iter()
        .map(|record| IssueDraft::compose(record, &analyzer.analyze(record), &DraftOptions::default()))
        .collect();

    assert_eq!(drafts[0].title, "Fix failed command: Make target: install");
    assert!(drafts[0].labels.contains(&"category:dependencies".to_string()));
    assert!(drafts[1].labels.contains(&"type:npm_script".to_string()));
    assert!(drafts[2].labels.contains(&"category:timeout".to_string()));
    assert!(drafts[1].body.contains("npm run test"));
}

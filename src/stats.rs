use crate::config::AnalysisSettings;
use crate::models::{AnalysisResult, CommandRecord};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandStatistics {
    pub total: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub command_types: BTreeMap<String, usize>,
    pub return_codes: BTreeMap<i32, usize>,
    pub timeout_count: usize,
    pub critical_count: usize,
    pub average_execution_time: f64,
}

impl CommandStatistics {
    pub fn collect(records: &[CommandRecord], settings: &AnalysisSettings) -> Self {
        let mut command_types = BTreeMap::new();
        let mut return_codes = BTreeMap::new();
        let mut failed = 0;
        let mut timeout_count = 0;
        let mut critical_count = 0;
        let mut total_time = 0.0;

        for record in records {
            *command_types.entry(record.command_type.clone()).or_insert(0) += 1;
            *return_codes.entry(record.return_code).or_insert(0) += 1;

            if !record.is_success() {
                failed += 1;
            }
            if record.execution_time >= settings.timeout_threshold_secs {
                timeout_count += 1;
            }
            if settings.critical_return_codes.contains(&record.return_code) {
                critical_count += 1;
            }
            total_time += record.execution_time;
        }

        let total = records.len();
        let (success_rate, average_execution_time) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                (total - failed) as f64 / total as f64,
                total_time / total as f64,
            )
        };

        Self {
            total,
            failed,
            success_rate,
            command_types,
            return_codes,
            timeout_count,
            critical_count,
            average_execution_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub categories: BTreeMap<String, usize>,
    pub priorities: BTreeMap<String, usize>,
    pub average_confidence: f64,
}

impl AnalysisSummary {
    pub fn collect(analyses: &[AnalysisResult]) -> Self {
        let mut summary = Self::default();
        for analysis in analyses {
            *summary
                .categories
                .entry(analysis.category.to_string())
                .or_insert(0) += 1;
            *summary
                .priorities
                .entry(analysis.priority.to_string())
                .or_insert(0) += 1;
        }
        if !analyses.is_empty() {
            summary.average_confidence =
                analyses.iter().map(|a| a.confidence).sum::<f64>() / analyses.len() as f64;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ErrorAnalyzer;
    use pretty_assertions::assert_eq;

    fn record(command_type: &str, return_code: i32, execution_time: f64) -> CommandRecord {
        let mut record = CommandRecord::new("t", "");
        record.command = "cmd".to_string();
        record.command_type = command_type.to_string();
        record.return_code = return_code;
        record.execution_time = execution_time;
        record
    }

    #[test]
    fn test_empty_batch() {
        let stats = CommandStatistics::collect(&[], &AnalysisSettings::default());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_execution_time, 0.0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_counts() {
        let mut ok = record("shell", 0, 1.0);
        ok.status = "Success".to_string();
        let records = vec![
            record("make_target", 2, 1.0),
            record("make_target", 139, 4.0),
            record("npm_script", -1, 60.0),
            ok,
        ];

        let stats = CommandStatistics::collect(&records, &AnalysisSettings::default());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.success_rate, 0.25);
        assert_eq!(stats.command_types.get("make_target"), Some(&2));
        assert_eq!(stats.return_codes.get(&139), Some(&1));
        assert_eq!(stats.timeout_count, 1);
        assert_eq!(stats.critical_count, 1);
        assert_eq!(stats.average_execution_time, 16.5);
    }

    #[test]
    fn test_analysis_summary() {
        let mut timeout = record("make_target", -1, 60.0);
        timeout.append_error("Command timed out after 60 seconds", false);
        let records = vec![timeout, record("shell", 1, 0.0)];
        let analyses = ErrorAnalyzer::new().analyze_all(&records);

        let summary = AnalysisSummary::collect(&analyses);
        assert_eq!(summary.categories.get("timeout"), Some(&1));
        assert_eq!(summary.categories.get("build-failure"), Some(&1));
        assert_eq!(summary.priorities.get("high"), Some(&1));
        assert_eq!(summary.priorities.get("low"), Some(&1));
    }
}

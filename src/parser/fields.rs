use crate::models::{CommandRecord, ErrorOutput, DEFAULT_RETURN_CODE};

/// Result of mapping one `**Key:** value` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Command(String),
    Source(String),
    CommandType(String),
    Status(String),
    ReturnCode(i32),
    ExecutionTime(f64),
    Output(String),
    ErrorOutput(ErrorOutput),
    Metadata(String, String),
    Unchanged,
}

impl FieldUpdate {
    pub fn apply(self, record: &mut CommandRecord) {
        match self {
            Self::Command(command) => record.command = command,
            Self::Source(source) => record.source = source,
            Self::CommandType(command_type) => record.command_type = command_type,
            Self::Status(status) => record.status = status,
            Self::ReturnCode(code) => record.return_code = code,
            Self::ExecutionTime(seconds) => record.execution_time = seconds,
            Self::Output(output) => record.output = output,
            Self::ErrorOutput(error) => record.error_output = Some(error),
            Self::Metadata(key, value) => {
                record.metadata.insert(key, value);
            }
            Self::Unchanged => {}
        }
    }
}

/// Maps a markdown key (any case) to the field it populates. Never fails:
/// values that don't coerce fall back to a default or leave the field alone.
pub fn map_field(key: &str, value: &str) -> FieldUpdate {
    let key = key.trim().to_lowercase();
    let value = value.trim();

    match key.as_str() {
        "command" => FieldUpdate::Command(strip_backticks(value)),
        "source" => FieldUpdate::Source(value.to_string()),
        "type" => FieldUpdate::CommandType(value.to_lowercase()),
        "status" => FieldUpdate::Status(clean_status(value)),
        "return code" | "return_code" | "exit code" | "exit_code" => {
            FieldUpdate::ReturnCode(parse_return_code(value))
        }
        "execution time" | "execution_time" => match parse_execution_time(value) {
            Some(seconds) => FieldUpdate::ExecutionTime(seconds),
            None => FieldUpdate::Unchanged,
        },
        "output" | "stdout" => FieldUpdate::Output(value.to_string()),
        "error" | "error_output" | "stderr" => FieldUpdate::ErrorOutput(ErrorOutput::new(value)),
        _ => FieldUpdate::Metadata(key, value.to_string()),
    }
}

pub fn strip_backticks(value: &str) -> String {
    value.trim().trim_matches('`').trim().to_string()
}

pub fn parse_return_code(value: &str) -> i32 {
    value.trim().parse().unwrap_or(DEFAULT_RETURN_CODE)
}

/// `"3.42s"` and `"3.42 s"` both yield 3.42. Negative or non-finite values
/// are rejected.
pub fn parse_execution_time(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix('s').unwrap_or(trimmed).trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

/// Drops emoji and other decoration, then folds known spellings onto
/// `Failed` / `Success`. Unknown words are kept as written.
pub fn clean_status(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    match cleaned.to_lowercase().as_str() {
        "failed" | "failure" | "fail" | "error" => "Failed".to_string(),
        "success" | "succeeded" | "passed" | "pass" | "ok" => "Success".to_string(),
        "" => {
            if value.contains('✅') {
                "Success".to_string()
            } else {
                "Failed".to_string()
            }
        }
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_strips_backticks() {
        assert_eq!(
            map_field("Command", "`make install`"),
            FieldUpdate::Command("make install".to_string())
        );
    }

    #[test]
    fn test_return_code_falls_back_to_one() {
        assert_eq!(map_field("return code", "2"), FieldUpdate::ReturnCode(2));
        assert_eq!(map_field("Return Code", "-1"), FieldUpdate::ReturnCode(-1));
        assert_eq!(map_field("return_code", "abc"), FieldUpdate::ReturnCode(1));
        assert_eq!(map_field("exit code", ""), FieldUpdate::ReturnCode(1));
    }

    #[test]
    fn test_execution_time_parsing() {
        assert_eq!(parse_execution_time("3.42s"), Some(3.42));
        assert_eq!(parse_execution_time(" 0.16 s "), Some(0.16));
        assert_eq!(parse_execution_time("12"), Some(12.0));
        assert_eq!(parse_execution_time("N/A"), None);
        assert_eq!(parse_execution_time("-4s"), None);
        assert_eq!(map_field("Execution Time", "N/A"), FieldUpdate::Unchanged);
    }

    #[test]
    fn test_execution_time_keeps_previous_value() {
        let mut record = CommandRecord::new("t", "");
        map_field("execution time", "1.5s").apply(&mut record);
        map_field("execution time", "unknown").apply(&mut record);
        assert_eq!(record.execution_time, 1.5);
    }

    #[test]
    fn test_status_cleaning() {
        assert_eq!(clean_status("❌ Failed"), "Failed");
        assert_eq!(clean_status("✅ Passed"), "Success");
        assert_eq!(clean_status("**Success**"), "Success");
        assert_eq!(clean_status("⏱️ Timeout"), "Timeout");
        assert_eq!(clean_status("❌"), "Failed");
    }

    #[test]
    fn test_type_is_lowercased() {
        assert_eq!(
            map_field("Type", "Make_Target"),
            FieldUpdate::CommandType("make_target".to_string())
        );
    }

    #[test]
    fn test_error_aliases() {
        for key in ["error", "Error_Output", "stderr"] {
            assert_eq!(
                map_field(key, "boom"),
                FieldUpdate::ErrorOutput(ErrorOutput::new("boom"))
            );
        }
        assert_eq!(map_field("stdout", "ok"), FieldUpdate::Output("ok".to_string()));
    }

    #[test]
    fn test_unknown_keys_go_to_metadata() {
        assert_eq!(
            map_field("Target", " install "),
            FieldUpdate::Metadata("target".to_string(), "install".to_string())
        );
    }
}

use crate::config::AnalysisSettings;
use crate::models::{AnalysisResult, Category, CommandRecord, Priority};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub mod templates;

use templates::*;

pub const DEFAULT_CRITICAL_CODES: [i32; 3] = [134, 136, 139];

const SIGNAL_MARKERS: &[&str] = &[
    "segmentation fault",
    "segfault",
    "core dumped",
    "sigsegv",
    "sigabrt",
];

const DEPENDENCY_MARKERS: &[&str] = &[
    "poetry.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "cargo.lock",
    "gemfile.lock",
    "composer.lock",
    "lock file",
    "was last generated",
    "out of sync",
    "pyproject.toml changed",
    "version solving failed",
    "could not resolve dependenc",
    "eresolve",
    "dependency conflict",
];

const MISSING_FILE_MARKERS: &[&str] = &[
    "enoent",
    "no such file",
    "not found",
    "cannot find module",
    "could not find",
    "missing script",
];

const PACKAGE_MANAGERS: &[&str] = &[
    "npm", "yarn", "pnpm", "pip", "poetry", "cargo", "make", "bundle", "composer",
];

const MANIFESTS: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "cargo.toml",
    "makefile",
    "gemfile",
    "composer.json",
    "requirements.txt",
];

const TIMEOUT_MARKERS: &[&str] = &[
    "timed out",
    "timeout",
    "time limit exceeded",
    "deadline exceeded",
];

const PERMISSION_MARKERS: &[&str] = &[
    "permission denied",
    "eacces",
    "eperm",
    "operation not permitted",
    "access denied",
];

const SYNTAX_MARKERS: &[&str] = &[
    "syntax error",
    "syntaxerror",
    "parse error",
    "parseerror",
    "invalid syntax",
    "unexpected token",
    "jsondecodeerror",
    "json decode",
    "mapping values are not allowed",
];

const CONFIGURATION_MARKERS: &[&str] = &[
    "config",
    "settings",
    ".cfg",
    ".ini",
    "invalid option",
    "unknown option",
    "environment variable",
];

static MISSING_PATH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?im)\bpath\s+(\S+)\s*$",
        r"(?i)open\s+'([^']+)'",
        r"(?i)cannot find module\s+'([^']+)'",
        r"(?i)no such file or directory:\s*'([^']+)'",
        r"(?im)([^\s:]+):\s*no such file or directory",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Lower-cased view of a record. Marker lists are matched against the
/// error text only; the command just refines confidence and templates.
struct Evidence<'a> {
    command: String,
    error: String,
    status: String,
    return_code: i32,
    raw_error: &'a str,
    critical_codes: &'a [i32],
}

impl<'a> Evidence<'a> {
    fn new(record: &'a CommandRecord, critical_codes: &'a [i32]) -> Self {
        let command = record.command.to_lowercase();
        let error = record.error_text().to_lowercase();
        Self {
            command,
            error,
            status: record.status.to_lowercase(),
            return_code: record.return_code,
            raw_error: record.error_text(),
            critical_codes,
        }
    }

    fn mentions(&self, markers: &[&str]) -> bool {
        markers.iter().any(|marker| self.error.contains(marker))
    }

    fn has_error_text(&self) -> bool {
        !self.error.trim().is_empty()
    }
}

struct Finding {
    category: Category,
    priority: Priority,
    confidence: f64,
    root_cause: String,
    suggested_solution: String,
}

struct Rule {
    name: &'static str,
    check: fn(&Evidence) -> Option<Finding>,
}

/// Evaluated top to bottom; the first rule that matches decides the result.
const RULES: &[Rule] = &[
    Rule { name: "fatal-signal", check: fatal_signal },
    Rule { name: "dependency-lock", check: dependency_lock },
    Rule { name: "missing-file", check: missing_file },
    Rule { name: "timeout", check: timeout },
    Rule { name: "permission", check: permission },
    Rule { name: "syntax", check: syntax },
    Rule { name: "configuration", check: configuration },
];

#[derive(Debug, Clone)]
pub struct ErrorAnalyzer {
    critical_codes: Vec<i32>,
}

impl Default for ErrorAnalyzer {
    fn default() -> Self {
        Self {
            critical_codes: DEFAULT_CRITICAL_CODES.to_vec(),
        }
    }
}

impl ErrorAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self {
            critical_codes: settings.critical_return_codes.clone(),
        }
    }

    pub fn analyze(&self, record: &CommandRecord) -> AnalysisResult {
        let evidence = Evidence::new(record, &self.critical_codes);

        for rule in RULES {
            if let Some(finding) = (rule.check)(&evidence) {
                debug!(title = %record.title, rule = rule.name, "classified failure");
                return finding.into_result(rule.name);
            }
        }

        fallback(&evidence).into_result("fallback")
    }

    pub fn analyze_all(&self, records: &[CommandRecord]) -> Vec<AnalysisResult> {
        records.iter().map(|record| self.analyze(record)).collect()
    }
}

impl Finding {
    fn into_result(self, rule: &'static str) -> AnalysisResult {
        AnalysisResult {
            category: self.category,
            priority: self.priority,
            confidence: self.confidence.clamp(0.0, 1.0),
            root_cause: self.root_cause,
            suggested_solution: self.suggested_solution,
            rule,
        }
    }
}

fn is_timeout(e: &Evidence) -> bool {
    e.status.contains("timeout")
        || e.status.contains("timed out")
        || e.return_code == 124
        || e.mentions(TIMEOUT_MARKERS)
        || (e.return_code == -1 && e.error.contains("killed"))
}

fn fatal_signal(e: &Evidence) -> Option<Finding> {
    let signalled = SIGNAL_MARKERS.iter().any(|m| e.error.contains(m))
        || e.critical_codes.contains(&e.return_code)
        || e.return_code < -1;
    if !signalled || is_timeout(e) {
        return None;
    }

    Some(Finding {
        category: Category::BuildFailure,
        priority: Priority::Critical,
        confidence: 0.9,
        root_cause: fatal_signal_root_cause(e.return_code),
        suggested_solution: FATAL_SIGNAL_SOLUTION.to_string(),
    })
}

fn dependency_lock(e: &Evidence) -> Option<Finding> {
    if !e.mentions(DEPENDENCY_MARKERS) {
        return None;
    }

    let pair = lock_pair_for(&format!("{}\n{}", e.error, e.command));
    let both_named = e.error.contains(&pair.lock.to_lowercase())
        && e.error.contains(&pair.manifest.to_lowercase());

    Some(Finding {
        category: Category::Dependencies,
        priority: Priority::High,
        confidence: if both_named { 0.95 } else { 0.9 },
        root_cause: dependency_root_cause(pair),
        suggested_solution: dependency_solution(pair),
    })
}

fn missing_file(e: &Evidence) -> Option<Finding> {
    if !e.mentions(MISSING_FILE_MARKERS) {
        return None;
    }

    let package_manager = e
        .command
        .split_whitespace()
        .next()
        .is_some_and(|program| PACKAGE_MANAGERS.contains(&program))
        || e.mentions(MANIFESTS);
    let path = extract_missing_path(e.raw_error);

    Some(Finding {
        category: Category::MissingFiles,
        priority: Priority::Medium,
        confidence: if package_manager { 0.85 } else { 0.8 },
        root_cause: missing_file_root_cause(path.as_deref()),
        suggested_solution: missing_file_solution(path.as_deref()),
    })
}

fn timeout(e: &Evidence) -> Option<Finding> {
    if !is_timeout(e) {
        return None;
    }

    Some(Finding {
        category: Category::Timeout,
        priority: Priority::High,
        confidence: 0.9,
        root_cause: TIMEOUT_ROOT_CAUSE.to_string(),
        suggested_solution: TIMEOUT_SOLUTION.to_string(),
    })
}

fn permission(e: &Evidence) -> Option<Finding> {
    let user_install = e.error.contains("--user")
        && (e.error.contains("virtualenv") || e.error.contains("venv"));
    if !(user_install || e.return_code == 126 || e.mentions(PERMISSION_MARKERS)) {
        return None;
    }

    Some(Finding {
        category: Category::Permissions,
        priority: Priority::Medium,
        confidence: if user_install { 0.85 } else { 0.8 },
        root_cause: permission_root_cause(user_install),
        suggested_solution: permission_solution(user_install),
    })
}

fn syntax(e: &Evidence) -> Option<Finding> {
    let yaml = e.error.contains("yaml");
    let yaml_failure = yaml && (e.error.contains("constructor") || e.error.contains("scanner"));
    if !(yaml_failure || e.mentions(SYNTAX_MARKERS)) {
        return None;
    }

    Some(Finding {
        category: Category::Syntax,
        priority: Priority::Medium,
        confidence: 0.8,
        root_cause: syntax_root_cause(yaml),
        suggested_solution: syntax_solution(yaml),
    })
}

fn configuration(e: &Evidence) -> Option<Finding> {
    if !e.mentions(CONFIGURATION_MARKERS) {
        return None;
    }

    Some(Finding {
        category: Category::Configuration,
        priority: Priority::Medium,
        confidence: 0.6,
        root_cause: CONFIGURATION_ROOT_CAUSE.to_string(),
        suggested_solution: CONFIGURATION_SOLUTION.to_string(),
    })
}

fn fallback(e: &Evidence) -> Finding {
    Finding {
        category: if e.return_code == 0 {
            Category::Unknown
        } else {
            Category::BuildFailure
        },
        priority: Priority::Low,
        confidence: if e.has_error_text() { 0.4 } else { 0.3 },
        root_cause: fallback_root_cause(e.return_code),
        suggested_solution: FALLBACK_SOLUTION.to_string(),
    }
}

fn extract_missing_path(error: &str) -> Option<String> {
    MISSING_PATH_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(error)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_matches(|c| c == '\'' || c == '"').to_string())
            .filter(|path| !path.is_empty())
    })
}

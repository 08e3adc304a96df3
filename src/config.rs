use crate::analyzer::DEFAULT_CRITICAL_CODES;
use crate::theme::Theme;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),

    #[error("no repository given; pass owner/name or set github.owner and github.repo")]
    MissingRepository,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub github: GitHubSettings,
    pub analysis: AnalysisSettings,
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GitHubSettings {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
    pub api_url: String,
    pub default_labels: Vec<String>,
    pub assignees: Vec<String>,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            default_labels: vec!["bug".to_string(), "automated".to_string()],
            assignees: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Runs at or above this many seconds count as timeouts in statistics.
    pub timeout_threshold_secs: f64,
    pub critical_return_codes: Vec<i32>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            timeout_threshold_secs: 60.0,
            critical_return_codes: DEFAULT_CRITICAL_CODES.to_vec(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub color_output: bool,
    pub max_cell_width: usize,
    pub theme: Theme,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color_output: true,
            max_cell_width: 40,
            theme: Theme::default(),
        }
    }
}

impl Config {
    pub fn create_default(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present and built-in defaults otherwise.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let path = get_config_path()?;
        if path.exists() {
            debug!(path = %path.display(), "loading config");
            Self::load(&path)
        } else {
            debug!("no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Returns `(owner, repo)`, preferring an `owner/name` argument over the
    /// configured values.
    pub fn repository(&self, arg: Option<&str>) -> Result<(String, String), ConfigError> {
        if let Some(arg) = arg {
            return parse_repository(arg);
        }
        match (&self.github.owner, &self.github.repo) {
            (Some(owner), Some(repo)) => Ok((owner.clone(), repo.clone())),
            _ => Err(ConfigError::MissingRepository),
        }
    }
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = ProjectDirs::from("com", "mdiss", "mdiss").ok_or(ConfigError::NoConfigDir)?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn parse_repository(value: &str) -> Result<(String, String), ConfigError> {
    match value.trim().split_once('/') {
        Some((owner, repo))
            if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
        {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ConfigError::InvalidRepository(value.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Argument,
    TokenFile,
    ConfigFile,
    Environment,
    DotEnv,
}

/// Where to look for an API token, highest priority first.
#[derive(Debug, Default, Clone)]
pub struct TokenLookup<'a> {
    pub argument: Option<&'a str>,
    pub token_file: Option<&'a Path>,
    pub env_value: Option<String>,
    pub dotenv_dir: Option<&'a Path>,
}

impl<'a> TokenLookup<'a> {
    /// Reads `GITHUB_TOKEN` from the process environment and `.env` from the
    /// current directory.
    pub fn from_env(argument: Option<&'a str>, token_file: Option<&'a Path>) -> Self {
        Self {
            argument,
            token_file,
            env_value: std::env::var(TOKEN_ENV_VAR).ok(),
            dotenv_dir: Some(Path::new(".")),
        }
    }

    pub fn resolve(&self, config: &Config) -> Result<Option<(String, TokenSource)>, ConfigError> {
        if let Some(token) = non_empty(self.argument) {
            return Ok(Some((token, TokenSource::Argument)));
        }

        if let Some(path) = self.token_file {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if let Some(token) = non_empty(Some(&content)) {
                return Ok(Some((token, TokenSource::TokenFile)));
            }
        }

        if let Some(token) = non_empty(config.github.token.as_deref()) {
            return Ok(Some((token, TokenSource::ConfigFile)));
        }

        if let Some(token) = non_empty(self.env_value.as_deref()) {
            return Ok(Some((token, TokenSource::Environment)));
        }

        if let Some(dir) = self.dotenv_dir {
            if let Some(token) = read_dotenv_token(&dir.join(".env")) {
                return Ok(Some((token, TokenSource::DotEnv)));
            }
        }

        Ok(None)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn read_dotenv_token(path: &Path) -> Option<String> {
    let entries = dotenv::from_path_iter(path).ok()?;
    entries
        .filter_map(Result::ok)
        .find(|(key, _)| key == TOKEN_ENV_VAR)
        .and_then(|(_, value)| non_empty(Some(&value)))
}

/// Writes the token into `<dir>/.env`, replacing an existing entry, and makes
/// sure `.env` is listed in `<dir>/.gitignore`.
pub fn save_token_to_dotenv(dir: &Path, token: &str) -> Result<PathBuf, ConfigError> {
    let env_path = dir.join(".env");
    let existing = read_optional(&env_path)?;

    let mut lines: Vec<String> = existing
        .lines()
        .filter(|line| !line.trim_start().starts_with(&format!("{}=", TOKEN_ENV_VAR)))
        .map(String::from)
        .collect();
    lines.push(format!("{}={}", TOKEN_ENV_VAR, token.trim()));
    write_file(&env_path, &(lines.join("\n") + "\n"))?;

    let gitignore = dir.join(".gitignore");
    let ignored = read_optional(&gitignore)?;
    if !ignored.lines().any(|line| line.trim() == ".env") {
        let mut content = ignored;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(".env\n");
        write_file(&gitignore, &content)?;
    }

    Ok(env_path)
}

pub fn save_token_to_file(path: &Path, token: &str) -> Result<(), ConfigError> {
    write_file(path, &format!("{}\n", token.trim()))
}

fn read_optional(path: &Path) -> Result<String, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

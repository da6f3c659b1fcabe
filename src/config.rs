use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

use crate::parser::{ParserOptions, DEFAULT_MAX_FILE_SIZE};
use crate::scanner::{ScanOptions, DEFAULT_MAX_TAIL_BYTES};
use crate::theme::ThemeName;

pub const ARTIFACTS_PATH_ENV: &str = "RCA_ARTIFACTS_PATH";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ai: AIConfig,
    pub scan: ScanConfig,
    pub parser: ParserConfig,
    pub report: ReportConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(default)]
pub struct AIConfig {
    pub provider: AIProvider,
    #[validate(length(min = 1))]
    pub model: String,
    pub api_url: Option<String>,
    #[validate(range(min = 1, max = 3600))]
    pub timeout_secs: u64,
    #[validate(range(min = 1))]
    pub max_tokens: u32,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            provider: AIProvider::Ollama,
            model: "granite3.3:8b".to_string(),
            api_url: None,
            timeout_secs: 300,
            max_tokens: 4000,
            anthropic_api_key: None,
            openai_api_key: None,
        }
    }
}

impl AIConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AIProvider {
    #[default]
    Ollama,
    Anthropic,
    OpenAI,
}

impl AIProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AIProvider::Ollama => "ollama",
            AIProvider::Anthropic => "anthropic",
            AIProvider::OpenAI => "openai",
        }
    }
}

impl std::str::FromStr for AIProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(AIProvider::Ollama),
            "anthropic" => Ok(AIProvider::Anthropic),
            "openai" => Ok(AIProvider::OpenAI),
            other => Err(format!(
                "unknown provider '{}' (expected ollama, anthropic or openai)",
                other
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(default)]
pub struct ScanConfig {
    pub hours_back: u32,
    #[validate(range(min = 1, max = 600))]
    pub journal_timeout_secs: u64,
    #[validate(range(min = 1, max = 600))]
    pub file_timeout_secs: u64,
    #[validate(range(min = 1, max = 600))]
    pub command_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub max_lines_per_file: usize,
    #[validate(range(min = 1))]
    pub max_tail_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            hours_back: 24,
            journal_timeout_secs: 10,
            file_timeout_secs: 5,
            command_timeout_secs: 5,
            max_lines_per_file: 1000,
            max_tail_bytes: DEFAULT_MAX_TAIL_BYTES,
        }
    }
}

impl ScanConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            journal_timeout: Duration::from_secs(self.journal_timeout_secs),
            file_timeout: Duration::from_secs(self.file_timeout_secs),
            max_lines_per_file: self.max_lines_per_file,
            max_tail_bytes: self.max_tail_bytes,
            ..ScanOptions::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    pub artifacts_path: Option<PathBuf>,
    pub show_hints: bool,
    pub max_file_size: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            artifacts_path: None,
            show_hints: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl ParserConfig {
    pub fn options(&self) -> ParserOptions {
        ParserOptions {
            artifacts_path: self.artifacts_path.clone(),
            show_hints: self.show_hints,
            max_file_size: self.max_file_size,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub directory: Option<PathBuf>,
}

impl ReportConfig {
    pub fn directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("rca-agent"))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub color_output: bool,
    pub show_progress: bool,
    pub theme: ThemeName,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color_output: true,
            show_progress: true,
            theme: ThemeName::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match get_config_path() {
                Ok(default) if default.exists() => Self::load(&default)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.ai.anthropic_api_key.is_none() {
            self.ai.anthropic_api_key = lookup("ANTHROPIC_API_KEY");
        }
        if self.ai.openai_api_key.is_none() {
            self.ai.openai_api_key = lookup("OPENAI_API_KEY");
        }
        if let Some(path) = lookup(ARTIFACTS_PATH_ENV).filter(|p| !p.is_empty()) {
            self.parser.artifacts_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.ai
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [ai] config: {}", e))?;
        self.scan
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [scan] config: {}", e))?;
        Ok(())
    }

    pub fn write_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "rca-agent", "rca-agent")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration file structure for cistat.
///
/// Lets users pin the query service and recipe thresholds once instead of
/// repeating them on every run. Command-line flags override file values,
/// file values override built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Query service connection
    #[serde(default)]
    pub service: ServiceConfig,

    /// Classification-time recipe thresholds
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceConfig {
    /// Query service base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Branch to gather statistics for
    #[serde(default = "default_branch")]
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassificationConfig {
    /// Percentage of fastest response times to use (0..=100)
    #[serde(default = "default_percent")]
    pub percent: u8,

    /// Time in seconds in which a job should be classified
    #[serde(default = "default_response_limit")]
    pub response_limit: i64,

    /// Maximum time in seconds after a push in which a job has to start
    #[serde(default = "default_start_delay")]
    pub start_delay: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            branch: default_branch(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            percent: default_percent(),
            response_limit: default_response_limit(),
            start_delay: default_start_delay(),
        }
    }
}

fn default_base_url() -> String {
    "https://activedata.allizom.org".to_string()
}

fn default_branch() -> String {
    "autoland".to_string()
}

fn default_percent() -> u8 {
    95
}

fn default_response_limit() -> i64 {
    15 * 60
}

fn default_start_delay() -> i64 {
    4 * 60 * 60
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./cistat.toml
    /// 3. ./cistat.json
    /// 4. ./cistat.yaml
    /// 5. ./cistat.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        Self::load_from_dir(Path::new("."))
    }

    fn load_from_dir(dir: &Path) -> Result<Self> {
        let candidates = ["cistat.toml", "cistat.json", "cistat.yaml", "cistat.yml"];

        for candidate in &candidates {
            let path = dir.join(candidate);
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

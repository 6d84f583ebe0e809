use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::drd::DrdScope;

/// Output format for snapshots and exports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            _ => anyhow::bail!("Unknown output format '{}' (expected yaml or json)", s),
        }
    }
}

/// Tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailorConfig {
    /// Which requirements count towards the DRD list
    pub drd_scope: DrdScope,

    /// Log filter used when RUST_LOG is not set
    pub log_level: String,

    /// Default format for snapshots and exports
    pub output_format: OutputFormat,
}

impl Default for TailorConfig {
    fn default() -> Self {
        Self {
            drd_scope: DrdScope::Selected,
            log_level: "info".to_string(),
            output_format: OutputFormat::Yaml,
        }
    }
}

impl TailorConfig {
    /// Loads the configuration; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Saves the configuration, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }
}

/// Gets the path to the configuration file
pub fn get_config_path() -> Result<PathBuf> {
    // Check if TAILOR_CONFIG environment variable is set
    if let Ok(path) = std::env::var("TAILOR_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    // Default to <config dir>/tailor/config.yaml
    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;

    Ok(config_dir.join("tailor").join("config.yaml"))
}

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file when `--config` is absent.
pub const CONFIG_ENV: &str = "AUDIT_CLAW_CONFIG";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where acquired tools are cloned to.
    pub tools_dir: PathBuf,
    /// YAML tool catalog replacing the built-in one.
    pub catalog: Option<PathBuf>,
    pub tool_timeout_secs: Option<u64>,
    pub confirmation_timeout_secs: Option<u64>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tools_dir: PathBuf::from("./tools"),
            catalog: None,
            tool_timeout_secs: None,
            confirmation_timeout_secs: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Config from `explicit`, else from the file named by `AUDIT_CLAW_CONFIG`,
    /// else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: AppConfig = if content.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse config")?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tools_dir.as_os_str().is_empty() {
            bail!("tools_dir cannot be empty");
        }
        if self.tool_timeout_secs == Some(0) {
            bail!("tool_timeout_secs must be greater than zero");
        }
        if self.confirmation_timeout_secs == Some(0) {
            bail!("confirmation_timeout_secs must be greater than zero");
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!(
                "Unknown log_level '{}' (expected one of {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }
}

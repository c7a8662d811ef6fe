//! ⚙️ Container configuration
//!
//! Presets для типичных окружений плюс загрузка из TOML/JSON файлов и
//! переменных окружения. Приоритет при [`ContainerConfig::load`]: переменные
//! окружения поверх файла, файл поверх preset defaults.

use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default environment variable prefix (`IOC_NAME`, `IOC_MAX_RESOLUTION_DEPTH`, ...)
pub const DEFAULT_ENV_PREFIX: &str = "IOC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Container name used in logs and stats
    pub name: String,
    /// Optional bound on the build-stack depth of one call tree. `None`
    /// lets acyclic chains grow as deep as the graph is.
    pub max_resolution_depth: Option<usize>,
    /// Log every resolution step at debug level
    pub verbose_logging: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_resolution_depth: None,
            verbose_logging: cfg!(debug_assertions),
        }
    }
}

impl ContainerConfig {
    pub fn production() -> Self {
        Self {
            name: "production".to_string(),
            max_resolution_depth: None,
            verbose_logging: false,
        }
    }

    pub fn development() -> Self {
        Self {
            name: "development".to_string(),
            max_resolution_depth: Some(1024),
            verbose_logging: true,
        }
    }

    /// Small limits for tests
    pub fn minimal() -> Self {
        Self {
            name: "minimal".to_string(),
            max_resolution_depth: Some(16),
            verbose_logging: false,
        }
    }

    pub fn from_preset_name(preset: &str) -> Result<Self> {
        match preset.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::default()),
            "production" | "prod" => Ok(Self::production()),
            "development" | "dev" => Ok(Self::development()),
            "minimal" | "test" => Ok(Self::minimal()),
            other => Err(anyhow::anyhow!("Unknown container preset: {other}")),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = Some(depth);
        self
    }

    pub fn without_depth_limit(mut self) -> Self {
        self.max_resolution_depth = None;
        self
    }

    pub fn with_verbose_logging(mut self, enabled: bool) -> Self {
        self.verbose_logging = enabled;
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML container config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(content).context("Invalid JSON container config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read container config {}", path.display()))?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(anyhow::anyhow!(
                "Unsupported configuration file format: {:?}",
                path.extension()
            )),
        }
    }

    /// Apply `{prefix}_NAME`, `{prefix}_MAX_RESOLUTION_DEPTH` and
    /// `{prefix}_VERBOSE_LOGGING` when set.
    pub fn apply_environment_variables(&mut self, prefix: &str) -> Result<()> {
        self.apply_overrides(|name| env::var(format!("{prefix}_{name}")).ok())
    }

    /// `file` when given, else `preset`, then environment variables on top.
    pub fn load(preset: Option<&str>, file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::load_from_file(path)?,
            None => match preset {
                Some(name) => Self::from_preset_name(name)?,
                None => Self::default(),
            },
        };
        config.apply_environment_variables(DEFAULT_ENV_PREFIX)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow::anyhow!("Container name must not be empty"));
        }
        if self.max_resolution_depth == Some(0) {
            return Err(anyhow::anyhow!("max_resolution_depth must be at least 1"));
        }
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(name) = lookup("NAME") {
            self.name = name;
        }
        if let Some(depth) = lookup("MAX_RESOLUTION_DEPTH") {
            self.max_resolution_depth = match depth.trim().to_ascii_lowercase().as_str() {
                "" | "none" | "unlimited" => None,
                value => Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid MAX_RESOLUTION_DEPTH value: {depth}"))?,
                ),
            };
        }
        if let Some(verbose) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_bool(&verbose)
                .with_context(|| format!("Invalid VERBOSE_LOGGING value: {verbose}"))?;
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("not a boolean: {other}")),
    }
}

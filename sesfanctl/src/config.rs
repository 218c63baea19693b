//! CLI configuration management
//!
//! Settings are resolved once at startup and passed down explicitly; nothing
//! below `main` reads the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sesfan_hardware::{DEFAULT_DEVICE_GLOBS, DEFAULT_SG_SES};
use std::path::{Path, PathBuf};

/// Environment variable naming the `sg_ses` binary
pub const ENV_SG_SES_PATH: &str = "SESFAN_SG_SES_PATH";
/// Older spelling still honoured for the `sg_ses` binary
pub const ENV_SG_SES_PATH_LEGACY: &str = "sg_ses_path";
pub const ENV_SETTLE_DELAY: &str = "SESFAN_SETTLE_DELAY";
pub const ENV_FORMAT: &str = "SESFAN_FORMAT";
pub const ENV_VERBOSE: &str = "SESFAN_VERBOSE";
/// Colon-separated list of device globs
pub const ENV_DEVICE_GLOBS: &str = "SESFAN_DEVICE_GLOBS";

const MAX_SETTLE_DELAY_SECS: u64 = 300;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// Path or name of the `sg_ses` binary
    pub sg_ses_path: String,

    /// Seconds to wait after a speed change before re-reading fans
    pub settle_delay_secs: u64,

    /// Default output format
    pub output_format: String,

    /// Enable verbose output by default
    pub verbose: bool,

    /// Device node patterns to search
    pub device_globs: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            sg_ses_path: DEFAULT_SG_SES.to_string(),
            settle_delay_secs: 10,
            output_format: "table".to_string(),
            verbose: false,
            device_globs: DEFAULT_DEVICE_GLOBS.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl CliConfig {
    /// Load configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&content).context("Failed to parse CLI config file")
    }

    /// Default configuration file path: `<config dir>/sesfan/cli.toml`
    pub fn config_path() -> Result<PathBuf> {
        let Some(config_dir) = dirs::config_dir() else {
            anyhow::bail!("Cannot determine config directory");
        };

        Ok(config_dir.join("sesfan").join("cli.toml"))
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Priority chain (lowest to highest):
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    sg_ses_path: Option<String>,
    settle_delay_secs: Option<u64>,
    output_format: Option<String>,
    verbose: Option<bool>,
    device_globs: Option<Vec<String>>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `sg_ses` binary (with validation)
    pub fn with_sg_ses_path(mut self, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        Self::validate_sg_ses_path(&path)?;
        self.sg_ses_path = Some(path);
        Ok(self)
    }

    /// Set the settle delay (with validation)
    pub fn with_settle_delay(mut self, secs: u64) -> Result<Self> {
        Self::validate_settle_delay(secs)?;
        self.settle_delay_secs = Some(secs);
        Ok(self)
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        Self::validate_output_format(&format)?;
        self.output_format = Some(format);
        Ok(self)
    }

    /// Set verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set device globs (with validation)
    pub fn with_device_globs(mut self, globs: Vec<String>) -> Result<Self> {
        Self::validate_device_globs(&globs)?;
        self.device_globs = Some(globs);
        Ok(self)
    }

    /// Load configuration from file
    ///
    /// `path` overrides the default location. A missing file at the default
    /// location is not an error; an explicitly named one is.
    pub fn with_config_file(self, load_file: bool, path: Option<&Path>) -> Result<Self> {
        if !load_file {
            return Ok(self);
        }

        let config = match path {
            Some(path) => CliConfig::load_from(path)?,
            None => match CliConfig::config_path().and_then(|p| CliConfig::load_from(&p)) {
                Ok(config) => config,
                // If file doesn't exist or can't be loaded, continue with current builder
                Err(_) => return Ok(self),
            },
        };

        // Only use file values if they weren't already set (preserving priority)
        Ok(Self {
            sg_ses_path: self.sg_ses_path.or(Some(config.sg_ses_path)),
            settle_delay_secs: self.settle_delay_secs.or(Some(config.settle_delay_secs)),
            output_format: self.output_format.or(Some(config.output_format)),
            verbose: self.verbose.or(Some(config.verbose)),
            device_globs: self.device_globs.or(Some(config.device_globs)),
        })
    }

    /// Apply environment variable overrides
    ///
    /// Environment values override the config file but invalid ones are
    /// ignored.
    pub fn with_env_overrides(mut self) -> Self {
        let sg_ses = std::env::var(ENV_SG_SES_PATH)
            .or_else(|_| std::env::var(ENV_SG_SES_PATH_LEGACY))
            .ok();
        if let Some(path) = sg_ses {
            if Self::validate_sg_ses_path(&path).is_ok() {
                self.sg_ses_path = Some(path);
            }
        }

        if let Ok(delay) = std::env::var(ENV_SETTLE_DELAY) {
            if let Ok(delay) = delay.parse() {
                if Self::validate_settle_delay(delay).is_ok() {
                    self.settle_delay_secs = Some(delay);
                }
            }
        }

        if let Ok(format) = std::env::var(ENV_FORMAT) {
            if Self::validate_output_format(&format).is_ok() {
                self.output_format = Some(format);
            }
        }

        if let Ok(verbose) = std::env::var(ENV_VERBOSE) {
            self.verbose = Some(verbose.to_lowercase() == "true" || verbose == "1");
        }

        if let Ok(globs) = std::env::var(ENV_DEVICE_GLOBS) {
            let globs: Vec<String> = globs
                .split(':')
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect();
            if Self::validate_device_globs(&globs).is_ok() {
                self.device_globs = Some(globs);
            }
        }

        self
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let defaults = CliConfig::default();

        let sg_ses_path = self.sg_ses_path.unwrap_or(defaults.sg_ses_path);
        let settle_delay_secs = self.settle_delay_secs.unwrap_or(defaults.settle_delay_secs);
        let output_format = self.output_format.unwrap_or(defaults.output_format);
        let device_globs = self.device_globs.unwrap_or(defaults.device_globs);

        // Validate final values
        Self::validate_sg_ses_path(&sg_ses_path)?;
        Self::validate_settle_delay(settle_delay_secs)?;
        Self::validate_output_format(&output_format)?;
        Self::validate_device_globs(&device_globs)?;

        Ok(CliConfig {
            sg_ses_path,
            settle_delay_secs,
            output_format,
            verbose: self.verbose.unwrap_or(defaults.verbose),
            device_globs,
        })
    }

    fn validate_sg_ses_path(path: &str) -> Result<()> {
        if path.trim().is_empty() {
            return Err(anyhow::anyhow!("sg_ses path cannot be empty"));
        }
        Ok(())
    }

    fn validate_settle_delay(secs: u64) -> Result<()> {
        if secs > MAX_SETTLE_DELAY_SECS {
            return Err(anyhow::anyhow!(
                "Settle delay must be less than or equal to {} seconds",
                MAX_SETTLE_DELAY_SECS
            ));
        }
        Ok(())
    }

    fn validate_output_format(format: &str) -> Result<()> {
        match format {
            "table" | "json" => Ok(()),
            _ => Err(anyhow::anyhow!(
                "Invalid output format '{}'. Must be 'table' or 'json'",
                format
            )),
        }
    }

    fn validate_device_globs(globs: &[String]) -> Result<()> {
        if globs.is_empty() {
            return Err(anyhow::anyhow!("At least one device glob is required"));
        }
        Ok(())
    }
}

//! # CLI Configuration
//!
//! Optional YAML settings, read from `--config <path>` or from
//! `mandate.yaml` in the working directory when present.
//!
//! ```yaml
//! log_filter: "mandate_dispatch=debug"
//! pretty: true
//! verify_chain: true
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "mandate.yaml";

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// `EnvFilter` directive; overrides `-v` but not `RUST_LOG`.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Pretty-print JSON output.
    #[serde(default = "enabled")]
    pub pretty: bool,
    /// Verify the hash chain after `run`.
    #[serde(default = "enabled")]
    pub verify_chain: bool,
}

fn enabled() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            pretty: true,
            verify_chain: true,
        }
    }
}

impl CliConfig {
    /// Parse a config document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes as unit, not as a map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("parsing CLI config YAML")
    }

    /// Load the config at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("in config file {}", path.display()))
    }

    /// Load `explicit` if given, else `dir/mandate.yaml` if it exists, else
    /// defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load_from(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

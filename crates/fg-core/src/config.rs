//! Engine configuration and path discovery.
//!
//! Resolution order: CLI argument → `FG_CONFIG` → `FG_CONFIG_DIR/engine.toml`
//! → XDG config directory → built-in defaults.

use crate::error::{Error, Result};
use crate::ordering::OrderingHeuristic;
use crate::variable::MARGINAL_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming a config file directly.
pub const ENV_CONFIG_PATH: &str = "FG_CONFIG";
/// Environment variable naming a directory that holds `engine.toml`.
pub const ENV_CONFIG_DIR: &str = "FG_CONFIG_DIR";

const CONFIG_FILENAME: &str = "engine.toml";
const APP_NAME: &str = "factor-graph";

/// Tunables for the inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Greedy heuristic used to order hidden variables.
    pub ordering: OrderingHeuristic,

    /// Normalisation denominators at or below this value are degenerate.
    pub zero_tolerance: f64,

    /// Allowed drift of a variable's marginal sum from one.
    pub marginal_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ordering: OrderingHeuristic::default(),
            zero_tolerance: 0.0,
            marginal_tolerance: MARGINAL_TOLERANCE,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !self.zero_tolerance.is_finite() || self.zero_tolerance < 0.0 {
            return Err(Error::Config(format!(
                "zero_tolerance must be a finite non-negative number, got {}",
                self.zero_tolerance
            )));
        }
        if !self.marginal_tolerance.is_finite() || self.marginal_tolerance < 0.0 {
            return Err(Error::Config(format!(
                "marginal_tolerance must be a finite non-negative number, got {}",
                self.marginal_tolerance
            )));
        }
        Ok(())
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A loaded configuration together with its provenance.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: EngineConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Locate the config file using the process environment and XDG paths.
pub fn resolve_path(cli_path: Option<&Path>) -> Result<(Option<PathBuf>, ConfigSource)> {
    resolve_path_with(cli_path, |key| std::env::var(key).ok(), dirs::config_dir())
}

/// [`resolve_path`] with the environment and XDG root supplied by the caller.
pub fn resolve_path_with<E>(
    cli_path: Option<&Path>,
    env: E,
    xdg_root: Option<PathBuf>,
) -> Result<(Option<PathBuf>, ConfigSource)>
where
    E: Fn(&str) -> Option<String>,
{
    // 1. CLI argument; naming a missing file is an error, not a fallthrough.
    if let Some(path) = cli_path {
        if path.is_file() {
            return Ok((Some(path.to_path_buf()), ConfigSource::CliArgument));
        }
        return Err(Error::Config(format!("config file {} does not exist", path.display())));
    }

    // 2. Environment variable (direct path)
    if let Some(env_path) = env(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.is_file() {
            return Ok((Some(path), ConfigSource::Environment));
        }
    }

    // 3. Environment variable (config dir)
    if let Some(dir) = env(ENV_CONFIG_DIR) {
        let path = PathBuf::from(dir).join(CONFIG_FILENAME);
        if path.is_file() {
            return Ok((Some(path), ConfigSource::Environment));
        }
    }

    // 4. XDG config directory
    if let Some(root) = xdg_root {
        let path = root.join(APP_NAME).join(CONFIG_FILENAME);
        if path.is_file() {
            return Ok((Some(path), ConfigSource::XdgConfig));
        }
    }

    Ok((None, ConfigSource::BuiltinDefault))
}

/// Resolve and load the engine configuration.
pub fn load(cli_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (path, source) = resolve_path(cli_path)?;
    load_from(path, source)
}

fn load_from(path: Option<PathBuf>, source: ConfigSource) -> Result<ResolvedConfig> {
    let config = match &path {
        Some(p) => EngineConfig::from_path(p)?,
        None => EngineConfig::default(),
    };
    debug!(source = %source, path = ?path, ordering = %config.ordering, "engine config resolved");
    Ok(ResolvedConfig { config, path, source })
}

/// XDG config directory for this tool.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

//! Configuration file loading and parsing
//!
//! Settings are read from `dockyard.yaml`, then environment variables with
//! the `DOCKYARD_` prefix override individual values.

use crate::error::{Error, Result};
use crate::types::PlanKind;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["dockyard.yaml", "dockyard.yml"];

/// Default location of image definitions, relative to the config file
const DEFAULT_IMAGES_PATH: &str = "images";

const ENV_IMAGES_PATH: &str = "DOCKYARD_IMAGES_PATH";
const ENV_PLAN_KIND: &str = "DOCKYARD_PLAN_KIND";
const ENV_PLAN_DEPTH: &str = "DOCKYARD_PLAN_DEPTH";

/// Which planner to use and how deep a cascade goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlanSettings {
    pub kind: PlanKind,
    /// Cascade depth, negative or absent means unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,
}

/// Registry coordinates applied to definitions that leave them empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegistryDefaults {
    pub host: String,
    pub namespace: String,
}

/// Dockyard settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockyardConfig {
    /// File or directory holding image definitions
    pub images_path: Utf8PathBuf,
    pub plan: PlanSettings,
    pub registry: RegistryDefaults,
}

impl Default for DockyardConfig {
    fn default() -> Self {
        Self {
            images_path: Utf8PathBuf::from(DEFAULT_IMAGES_PATH),
            plan: PlanSettings::default(),
            registry: RegistryDefaults::default(),
        }
    }
}

impl DockyardConfig {
    /// Load configuration from the specified path or search for it
    ///
    /// A relative `images_path` is resolved against the directory holding
    /// the configuration file.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.as_str())
                    } else {
                        Error::Io(e)
                    }
                })?;
                (p.to_owned(), content)
            }
            None => Self::find_config()?,
        };

        debug!("Loading configuration from {}", config_path);
        let mut config = Self::from_yaml(&content)?;

        if config.images_path.is_relative() {
            if let Some(dir) = config_path.parent() {
                config.images_path = dir.join(&config.images_path);
            }
        }

        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "dockyard.yaml (searched current and parent directories)",
        ))
    }

    /// Apply `DOCKYARD_*` environment variable overrides
    pub fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(path) = env::var(ENV_IMAGES_PATH) {
            debug!("Overriding images path from {}", ENV_IMAGES_PATH);
            self.images_path = Utf8PathBuf::from(path);
        }

        if let Ok(kind) = env::var(ENV_PLAN_KIND) {
            self.plan.kind = kind.parse().map_err(|_| {
                Error::invalid_config(format!("{} has an unknown plan '{}'", ENV_PLAN_KIND, kind))
            })?;
        }

        if let Ok(depth) = env::var(ENV_PLAN_DEPTH) {
            let depth = depth.trim().parse::<i32>().map_err(|_| {
                Error::invalid_config(format!(
                    "{} must be an integer, found '{}'",
                    ENV_PLAN_DEPTH, depth
                ))
            })?;
            self.plan.depth = Some(depth);
        }

        Ok(self)
    }
}

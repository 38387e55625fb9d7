use std::path::{Path, PathBuf};
use std::str::FromStr;

use cashlens_classify::DEFAULT_ANOMALY_THRESHOLD;
use cashlens_forecast::DEFAULT_NOISE_STD_DEV;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_ANOMALY_THRESHOLD: &str = "CASHLENS_ANOMALY_THRESHOLD";
pub const ENV_NOISE_STD_DEV: &str = "CASHLENS_NOISE_STD_DEV";

const CONFIG_FILE: &str = "cashlens.toml";
const RULES_FILE: &str = "rules.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid value for {var}: '{value}'")]
    InvalidOverride { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub anomaly_threshold: Decimal,
    pub noise_std_dev: f64,
    pub horizon_days: i64,
    pub starting_balance: Decimal,
    pub rules_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            noise_std_dev: DEFAULT_NOISE_STD_DEV,
            horizon_days: 90,
            starting_balance: Decimal::new(523_467, 2),
            rules_path: None,
        }
    }
}

pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "cashlens", "Cashlens")
}

impl Settings {
    /// An explicit `path` must exist. Without one, the per-user config file
    /// is read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let (path, required) = match path {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (project_dirs().map(|d| d.config_dir().join(CONFIG_FILE)), false),
        };
        let Some(path) = path else {
            return Ok(Self::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "Loading settings");
                Self::from_toml(&content).map_err(|source| SettingsError::Parse { path, source })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SettingsError::NotFound(path)),
            Err(source) => Err(SettingsError::Io { path, source }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn apply_env(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ANOMALY_THRESHOLD) {
            self.anomaly_threshold =
                Decimal::from_str(value.trim()).map_err(|_| SettingsError::InvalidOverride {
                    var: ENV_ANOMALY_THRESHOLD,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(ENV_NOISE_STD_DEV) {
            self.noise_std_dev = value.trim().parse().map_err(|_| SettingsError::InvalidOverride {
                var: ENV_NOISE_STD_DEV,
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    /// Configured rules file, else `rules.toml` in the per-user data dir.
    pub fn rules_path(&self) -> Option<PathBuf> {
        self.rules_path
            .clone()
            .or_else(|| project_dirs().map(|d| d.data_dir().join(RULES_FILE)))
    }
}

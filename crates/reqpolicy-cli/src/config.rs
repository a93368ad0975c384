//! `reqpolicy.toml`: default paths, validation knobs, and the cap override
//! table. Every field is optional; command-line flags win over the file.

use reqpolicy_kernel::MarkerMatch;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "reqpolicy.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub validate: ValidateConfig,
    pub cap: CapConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub global_requirements: String,
    pub upper_constraints: String,
    pub blacklist: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            global_requirements: "global-requirements.txt".to_string(),
            upper_constraints: "upper-constraints.txt".to_string(),
            blacklist: "blacklist.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidateConfig {
    pub skip_lower_constraint_files: Vec<String>,
    pub marker_matching: MarkerMatch,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            skip_lower_constraint_files: reqpolicy_check::DEFAULT_SKIP_FILES
                .iter()
                .map(ToString::to_string)
                .collect(),
            marker_matching: MarkerMatch::Literal,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapConfig {
    /// Package to replacement line; an empty string leaves it uncapped.
    /// When absent, the built-in table applies.
    pub overrides: Option<BTreeMap<String, String>>,
}

impl CapConfig {
    pub fn overrides(&self) -> Option<BTreeMap<String, Option<String>>> {
        self.overrides.as_ref().map(|table| {
            table
                .iter()
                .map(|(name, line)| {
                    let replacement = (!line.is_empty()).then(|| line.clone());
                    (name.clone(), replacement)
                })
                .collect()
        })
    }
}

impl Config {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` when given (it must exist), otherwise
    /// `reqpolicy.toml` if present, otherwise defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => PathBuf::from(path),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Self::from_toml(&path, &text)
    }
}

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! The hook is configured through the host project's manifest, i.e., the
//! `composer.json` file at the top-level of a Magento project. Only the
//! `extra` map of that manifest is of interest to us, and only a single
//! section of it keyed by [`CONFIG_KEY`]:
//!
//! ```json
//! {
//!     "extra": {
//!         "hryvinskyi-quality-patches": {
//!             "enabled": true,
//!             "patches": ["ACSD-52277", "ACSD-53583"]
//!         }
//!     }
//! }
//! ```
//!
//! Absence is never a failure here. A missing section, a missing `enabled`
//! flag, or a missing `patches` listing each fall back to their defaults
//! on their own.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::{
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// Key of the configuration section inside the manifest's `extra` map.
pub const CONFIG_KEY: &str = "hryvinskyi-quality-patches";

/// Default file name of the host project manifest.
pub const DEFAULT_MANIFEST: &str = "composer.json";

/// Plugin configuration.
///
/// Immutable once resolved. Patch identifiers keep the order they were
/// listed in.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PluginConfig {
    /// Whether patches should be applied at all.
    pub enabled: bool,

    /// Ordered listing of patch identifiers to apply.
    pub patches: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patches: Vec::new(),
        }
    }
}

impl PluginConfig {
    /// Resolve plugin configuration from the manifest's `extra` map.
    ///
    /// Values of the wrong type are treated as missing, and non-string
    /// entries in the patch listing are ignored.
    pub fn resolve(extra: &Value) -> Self {
        let Some(section) = extra.get(CONFIG_KEY) else {
            debug!("no {CONFIG_KEY:?} section in manifest extra, using defaults");
            return Self::default();
        };

        let enabled = section
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let patches = section
            .get("patches")
            .and_then(Value::as_array)
            .map(|patches| {
                patches
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Self { enabled, patches }
    }
}

/// Host project manifest.
///
/// Only carries what the hook needs from the manifest. Everything else the
/// host stores in there is ignored.
#[derive(Default, Debug, PartialEq, Clone, Deserialize)]
pub struct ProjectManifest {
    /// Extensible metadata map of the project.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl ProjectManifest {
    /// Load project manifest from target project directory.
    ///
    /// A missing manifest is treated as an empty one so that configuration
    /// defaults apply.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ReadManifest`] if the manifest exists but
    ///   cannot be read.
    /// - Return [`ConfigError::Deserialize`] if the manifest is not valid.
    pub fn load(base: impl AsRef<Path>, file_name: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = base.as_ref().join(file_name.as_ref());
        let data = match read_to_string(&manifest_path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no manifest at {:?}", manifest_path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::ReadManifest {
                    source: err,
                    manifest_path,
                })
            }
        };

        data.parse()
    }

    /// Resolve plugin configuration from this manifest.
    pub fn plugin_config(&self) -> PluginConfig {
        PluginConfig::resolve(&Value::Object(self.extra.clone()))
    }
}

impl FromStr for ProjectManifest {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(data).map_err(ConfigError::Deserialize)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Manifest exists, but cannot be read.
    #[error("failed to read manifest at {:?}", manifest_path.display())]
    ReadManifest {
        #[source]
        source: std::io::Error,
        manifest_path: PathBuf,
    },

    /// Failed to deserialize manifest.
    #[error(transparent)]
    Deserialize(#[from] serde_json::Error),
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

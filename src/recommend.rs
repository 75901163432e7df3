// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version-filtered patch recommendations.
//!
//! The quality patches package ships a catalog of every patch it knows about,
//! each tagged with the Magento releases it applies to. Given the Magento
//! release installed in a project, the catalog tells us which patches are
//! worth applying.
//!
//! This lookup is never part of a regular hook run. It is only used when a
//! caller asks for it explicitly, e.g., through `quality-patcher recommend`.
//!
//! # Release Detection
//!
//! The installed release is read from the host's local package repository,
//! i.e., `vendor/composer/installed.json`. The first core package found in
//! [`CORE_PACKAGES`] order decides the release. Its version string is reduced
//! to `major.minor.patch[-pN]` through [`normalize_version`].
//!
//! # Conservative Selection
//!
//! Catalog entries that declare any requirements are never recommended, even
//! when the requirements would be met.

use crate::path::{installed_packages, patch_catalog};

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::{debug, instrument};

/// Core packages that pin the installed Magento release.
pub const CORE_PACKAGES: [&str; 3] = [
    "magento/product-enterprise-edition",
    "magento/product-community-edition",
    "magento/magento2-base",
];

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+\.\d+\.\d+(?:-p\d+)?)").expect("version pattern is valid")
});

/// Single entry of the patch catalog.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
pub struct PatchCatalogEntry {
    /// Patch identifiers of this entry.
    #[serde(rename = "id", deserialize_with = "one_or_many")]
    pub ids: Vec<String>,

    /// Releases this entry applies to, none if the entry omits them.
    #[serde(default, deserialize_with = "one_or_many")]
    pub releases: Vec<String>,

    /// Entry should no longer be applied.
    #[serde(default, deserialize_with = "truthy")]
    pub deprecated: bool,

    /// Entry depends on other patches or packages.
    #[serde(default, rename = "require", deserialize_with = "non_empty")]
    pub has_requirements: bool,
}

impl PatchCatalogEntry {
    /// Entry is safe to recommend for target release.
    pub fn recommended_for(&self, version: &str) -> bool {
        !self.deprecated
            && !self.has_requirements
            && self.releases.iter().any(|release| release == version)
    }
}

#[derive(Debug, Deserialize)]
struct PatchCatalog {
    patches: Vec<PatchCatalogEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstalledRepository {
    Listing { packages: Vec<InstalledPackage> },
    Legacy(Vec<InstalledPackage>),
}

#[derive(Debug, Deserialize)]
struct InstalledPackage {
    name: String,
    #[serde(default)]
    version: String,
}

/// Recommend patches for the Magento release installed under base path.
///
/// Empty if no core package is installed, or if the catalog is absent or
/// malformed.
#[instrument(skip(base), level = "debug")]
pub fn recommended_patches(base: impl AsRef<Path>) -> Vec<String> {
    let Some(version) = detect_version(base.as_ref()) else {
        debug!("no magento release detected");
        return Vec::new();
    };

    match load_catalog(base.as_ref()) {
        Ok(catalog) => select_patches(&catalog, &version),
        Err(error) => {
            debug!("{error}");
            Vec::new()
        }
    }
}

/// Select patch identifiers for target release in catalog order.
pub fn select_patches(catalog: &[PatchCatalogEntry], version: &str) -> Vec<String> {
    catalog
        .iter()
        .filter(|entry| entry.recommended_for(version))
        .flat_map(|entry| entry.ids.iter().cloned())
        .collect()
}

/// Detect normalized Magento release installed under base path.
pub fn detect_version(base: impl AsRef<Path>) -> Option<String> {
    let installed_path = installed_packages(base);
    let data = read_to_string(&installed_path)
        .inspect_err(|err| debug!("cannot read {:?}: {err}", installed_path.display()))
        .ok()?;
    let packages = match serde_json::from_str(&data).ok()? {
        InstalledRepository::Listing { packages } => packages,
        InstalledRepository::Legacy(packages) => packages,
    };

    let core = CORE_PACKAGES
        .iter()
        .find_map(|name| packages.iter().find(|package| package.name == *name))?;
    debug!("found core package {} at {}", core.name, core.version);

    normalize_version(&core.version)
}

/// Reduce version string to `major.minor.patch[-pN]`.
///
/// A leading "v" and any trailing qualifier are dropped. Returns nothing if
/// the version does not start with a `major.minor.patch` triple.
pub fn normalize_version(raw: impl AsRef<str>) -> Option<String> {
    VERSION
        .captures(raw.as_ref().trim())
        .and_then(|caps| caps.get(1))
        .map(|version| version.as_str().to_string())
}

/// Load patch catalog from base path.
///
/// # Errors
///
/// - Return [`RecommendError::ReadCatalog`] if catalog cannot be read.
/// - Return [`RecommendError::ParseCatalog`] if catalog is malformed.
pub fn load_catalog(base: impl AsRef<Path>) -> Result<Vec<PatchCatalogEntry>> {
    let catalog_path = patch_catalog(base);
    let data = read_to_string(&catalog_path).map_err(|err| RecommendError::ReadCatalog {
        source: err,
        catalog_path: catalog_path.clone(),
    })?;

    parse_catalog(&data).map_err(|err| RecommendError::ParseCatalog {
        source: err,
        catalog_path,
    })
}

fn parse_catalog(data: &str) -> serde_json::Result<Vec<PatchCatalogEntry>> {
    serde_json::from_str::<PatchCatalog>(data).map(|catalog| catalog.patches)
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn non_empty<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::String(value) => !value.is_empty(),
        Value::Array(values) => !values.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    })
}

/// Recommendation lookup error types.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    /// Patch catalog cannot be read.
    #[error("failed to read patch catalog at {:?}", catalog_path.display())]
    ReadCatalog {
        #[source]
        source: std::io::Error,
        catalog_path: PathBuf,
    },

    /// Patch catalog is malformed.
    #[error("failed to parse patch catalog at {:?}", catalog_path.display())]
    ParseCatalog {
        #[source]
        source: serde_json::Error,
        catalog_path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = RecommendError> = std::result::Result<T, E>;

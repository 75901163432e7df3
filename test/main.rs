// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use quality_patcher::path::{patch_binary, INSTALLED_PACKAGES, PATCH_CATALOG};
use std::{
    fs::{create_dir_all, read_to_string, write},
    path::Path,
};
use tempfile::TempDir;

/// Stand-in for the patch-application binary.
///
/// Logs every call to "calls.log" in its working directory, and answers
/// depending on the patch identifier it was asked to apply.
pub(crate) const FAKE_BINARY: &str = r#"#!/bin/sh
echo "$*" >> calls.log
case "$3" in
    ACSD-2) echo "Patch already applied." >&2; exit 1 ;;
    ACSD-99999) echo "Patch ACSD-99999 not found in repository"; exit 1 ;;
    BROKEN) echo "Syntax error in patch file" >&2; exit 1 ;;
    SLOW) sleep 5; exit 0 ;;
    *) echo "Patch $3 applied"; exit 0 ;;
esac
"#;

pub(crate) struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub(crate) fn new(manifest: impl AsRef<str>) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        write(dir.path().join("composer.json"), manifest.as_ref())?;

        Ok(Self { dir })
    }

    pub(crate) fn with_patches(patches: &[&str]) -> Result<Self> {
        let manifest = serde_json::json!({
            "name": "acme/shop",
            "extra": { "hryvinskyi-quality-patches": { "patches": patches } }
        });

        Self::new(manifest.to_string())
    }

    #[cfg(unix)]
    pub(crate) fn install_binary(&self) -> Result<()> {
        use std::{
            fs::{set_permissions, Permissions},
            os::unix::fs::PermissionsExt,
        };

        let binary = patch_binary(self.path());
        self.place(&binary, FAKE_BINARY)?;
        set_permissions(&binary, Permissions::from_mode(0o755))?;

        Ok(())
    }

    pub(crate) fn install_catalog(&self, version: &str, catalog: &str) -> Result<()> {
        let installed = serde_json::json!({
            "packages": [ { "name": "magento/product-community-edition", "version": version } ]
        });
        self.place(self.path().join(INSTALLED_PACKAGES), installed.to_string())?;
        self.place(self.path().join(PATCH_CATALOG), catalog)?;

        Ok(())
    }

    pub(crate) fn place(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<()> {
        let path = self.path().join(path);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, contents.as_ref())?;

        Ok(())
    }

    /// Arguments of every call the fake binary received, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        read_to_string(self.path().join("calls.log"))
            .map(|log| log.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }
}

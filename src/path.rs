// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevant path information for external files the hook needs to
//! interact with. Every path here is relative to the project base path, i.e.,
//! the directory holding the host project manifest. The base path is always
//! passed in explicitly, never read from the process state.

use std::path::{Path, PathBuf};

/// Location of patch-application binary relative to project base path.
pub const PATCH_BINARY: &str = "vendor/bin/magento-patches";

/// Location of patch catalog relative to project base path.
pub const PATCH_CATALOG: &str = "vendor/magento/quality-patches/patches-info.json";

/// Location of host's local package repository relative to project base path.
pub const INSTALLED_PACKAGES: &str = "vendor/composer/installed.json";

/// Determine absolute path to patch-application binary.
///
/// Does not check if the path returned actually exists.
pub fn patch_binary(base: impl AsRef<Path>) -> PathBuf {
    base.as_ref().join(PATCH_BINARY)
}

/// Determine absolute path to patch catalog.
pub fn patch_catalog(base: impl AsRef<Path>) -> PathBuf {
    base.as_ref().join(PATCH_CATALOG)
}

/// Determine absolute path to host's local package repository.
pub fn installed_packages(base: impl AsRef<Path>) -> PathBuf {
    base.as_ref().join(INSTALLED_PACKAGES)
}

/// Check if patch-application binary can be invoked.
///
/// True if and only if the binary exists as a regular file under the base
/// path and is marked executable. Performs no invocation.
pub fn binary_available(base: impl AsRef<Path>) -> bool {
    is_executable(patch_binary(base))
}

#[cfg(unix)]
fn is_executable(path: impl AsRef<Path>) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path.as_ref())
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{
        fs::{create_dir_all, set_permissions, write, Permissions},
        os::unix::fs::PermissionsExt,
    };

    fn place_binary(base: &Path, mode: u32) -> anyhow::Result<()> {
        let path = patch_binary(base);
        create_dir_all(path.parent().unwrap())?;
        write(&path, "#!/bin/sh\nexit 0\n")?;
        set_permissions(&path, Permissions::from_mode(mode))?;
        Ok(())
    }

    #[test]
    fn binary_available_when_executable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        place_binary(dir.path(), 0o755)?;
        assert!(binary_available(dir.path()));

        Ok(())
    }

    #[test]
    fn binary_unavailable_when_not_executable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        place_binary(dir.path(), 0o644)?;
        assert!(!binary_available(dir.path()));

        Ok(())
    }

    #[test]
    fn binary_unavailable_when_missing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(!binary_available(dir.path()));

        Ok(())
    }

    #[test]
    fn binary_unavailable_when_directory() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        create_dir_all(patch_binary(dir.path()))?;
        assert!(!binary_available(dir.path()));

        Ok(())
    }
}

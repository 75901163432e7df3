// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Hook entry point.
//!
//! Ties configuration, availability probing, and orchestration together into
//! one run that the host triggers after it finishes installing or updating
//! packages:
//!
//! 1. Resolve [`PluginConfig`] from the project manifest.
//! 2. Stop if the hook is disabled.
//! 3. Stop if the patch-application binary is unavailable.
//! 4. Apply configured patches through the [`Orchestrator`].
//!
//! # Error Boundary
//!
//! The host's own workflow must never be disturbed by the hook. Use
//! [`Plugin::run_guarded`] at the outermost layer. It logs any failure, even
//! a panic, and hands back an empty [`RunSummary`] instead.

use crate::{
    config::{ConfigError, PluginConfig, ProjectManifest, DEFAULT_MANIFEST},
    patch::{
        invoke::{PatchRunner, ProcessRunner},
        outcome::RunSummary,
        Orchestrator,
    },
    path::{binary_available, PATCH_BINARY},
};

use futures::FutureExt;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    future::Future,
    panic::AssertUnwindSafe,
    path::PathBuf,
};
use tracing::{debug, error, info, instrument, trace};

/// Host event that triggered a run.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub enum HookEvent {
    /// Host finished installing packages.
    #[default]
    PostInstall,

    /// Host finished updating packages.
    PostUpdate,

    /// User asked for patches to be applied directly.
    Manual,
}

impl Display for HookEvent {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::PostInstall => fmt.write_str("post-install-cmd"),
            Self::PostUpdate => fmt.write_str("post-update-cmd"),
            Self::Manual => fmt.write_str("manual"),
        }
    }
}

/// Quality patches hook for one project.
#[derive(Debug)]
pub struct Plugin<R = ProcessRunner>
where
    R: PatchRunner,
{
    base: PathBuf,
    manifest: PathBuf,
    orchestrator: Orchestrator<R>,
}

impl Plugin {
    /// Construct new hook for project at base path.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_orchestrator(base, Orchestrator::default())
    }
}

impl<R> Plugin<R>
where
    R: PatchRunner,
{
    /// Construct new hook with custom orchestrator.
    pub fn with_orchestrator(base: impl Into<PathBuf>, orchestrator: Orchestrator<R>) -> Self {
        Self {
            base: base.into(),
            manifest: DEFAULT_MANIFEST.into(),
            orchestrator,
        }
    }

    /// Read a different manifest file relative to base path.
    pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.manifest = manifest.into();
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator<R> {
        &self.orchestrator
    }

    /// Resolve plugin configuration from project manifest.
    ///
    /// # Errors
    ///
    /// - Return [`PluginError::Config`] if the manifest cannot be loaded.
    pub fn config(&self) -> Result<PluginConfig> {
        Ok(ProjectManifest::load(&self.base, &self.manifest)?.plugin_config())
    }

    /// Run hook with configuration from project manifest.
    ///
    /// # Errors
    ///
    /// - Return [`PluginError::Config`] if the manifest cannot be loaded.
    #[instrument(skip(self), level = "debug")]
    pub async fn run(&self, event: HookEvent) -> Result<RunSummary> {
        debug!("triggered by {event} in {:?}", self.base.display());
        let config = self.config()?;
        Ok(self.run_with(&config).await)
    }

    /// Run hook with given configuration.
    pub async fn run_with(&self, config: &PluginConfig) -> RunSummary {
        if !config.enabled {
            info!("quality patches are disabled");
            return RunSummary::default();
        }

        info!("checking for {PATCH_BINARY}");
        if !binary_available(&self.base) {
            info!("{PATCH_BINARY} not found or not executable, skipping quality patches");
            return RunSummary::default();
        }

        self.orchestrator.apply(&self.base, &config.patches).await
    }

    /// Run hook, swallowing every failure.
    ///
    /// The full error chain is only logged at trace level.
    pub async fn run_guarded(&self, event: HookEvent) -> RunSummary {
        guard(self.run(event)).await
    }
}

/// Convert any failure or panic of a run into a logged, empty summary.
pub async fn guard<F, E>(run: F) -> RunSummary
where
    F: Future<Output = std::result::Result<RunSummary, E>>,
    E: Into<anyhow::Error>,
{
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(Ok(summary)) => summary,
        Ok(Err(error)) => {
            let error = error.into();
            error!("quality patches could not be applied: {error}");
            trace!("{error:?}");
            RunSummary::default()
        }
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".into());
            error!("quality patches aborted unexpectedly: {reason}");
            RunSummary::default()
        }
    }
}

/// Hook error types.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Project manifest cannot be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Friendly result alias :3
pub type Result<T, E = PluginError> = std::result::Result<T, E>;

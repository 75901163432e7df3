// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Patch application orchestration.
//!
//! Drives the patch-application binary once for each configured patch
//! identifier. Patches are applied one after another in the order they were
//! configured, never in parallel.
//!
//! # Partial Failure
//!
//! Every configured patch is always attempted. A patch whose invocation
//! fails, times out, or cannot be spawned at all is reported and counted,
//! but never stops the remaining patches from being attempted. Each
//! invocation outcome is classified through [`PatchOutcome::classify`].
//!
//! # See Also
//!
//! 1. [`outcome`]
//! 2. [`invoke`]

pub mod invoke;
pub mod outcome;

use crate::{
    patch::{
        invoke::{CommandInvocation, PatchRunner, ProcessRunner},
        outcome::{PatchOutcome, RunSummary},
    },
    path::patch_binary,
};

use indicatif::{ProgressBar, ProgressStyle};
use std::{path::Path, time::Duration};
use tracing::{error, info, instrument, warn};

/// Default amount of time a single patch may take to apply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Apply patches through the patch-application binary.
#[derive(Debug, Clone)]
pub struct Orchestrator<R = ProcessRunner>
where
    R: PatchRunner,
{
    runner: R,
    timeout: Duration,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(ProcessRunner::new())
    }
}

impl<R> Orchestrator<R>
where
    R: PatchRunner,
{
    /// Construct new orchestrator with default timeout.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different per-patch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Build invocation of patch-application binary for target patch.
    pub fn invocation(&self, base: &Path, patch: &str) -> CommandInvocation {
        CommandInvocation {
            program: patch_binary(base),
            args: vec!["apply".into(), "--no-interaction".into(), patch.into()],
            working_dir: base.to_path_buf(),
            timeout: self.timeout,
        }
    }

    /// Apply listing of patches in order.
    ///
    /// Does not invoke anything if the listing is empty.
    #[instrument(skip(self, base, patches), level = "debug")]
    pub async fn apply(&self, base: &Path, patches: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        if patches.is_empty() {
            info!("no patches configured");
            return summary;
        }

        info!("applying {} patch(es)", patches.len());
        for patch in patches {
            let outcome = self.apply_one(base, patch).await;
            summary.record(&outcome);
        }

        summary.report();
        summary
    }

    /// Apply one patch, and report its outcome.
    pub async fn apply_one(&self, base: &Path, patch: &str) -> PatchOutcome {
        let invocation = self.invocation(base, patch);
        let bar = spinner(patch);
        let result = self.runner.invoke(&invocation).await;
        bar.finish_and_clear();

        let outcome = match result {
            Ok(output) => PatchOutcome::classify(patch, &output),
            Err(err) => PatchOutcome::Failed {
                patch: patch.into(),
                message: err.to_string(),
            },
        };

        match &outcome {
            PatchOutcome::Applied { patch } => info!("patch {patch} applied"),
            PatchOutcome::AlreadyApplied { patch } => {
                info!("patch {patch} already applied, skipping")
            }
            PatchOutcome::NotAvailable { patch } => {
                warn!("patch {patch} is not available, skipping")
            }
            PatchOutcome::Failed { patch, message } => {
                error!("failed to apply patch {patch}: {message}")
            }
        }

        outcome
    }
}

// INVARIANT: Spinner is only drawn when stderr is a terminal.
fn spinner(patch: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.green} {elapsed:.dim} applying {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let bar = ProgressBar::new_spinner().with_style(style);
    bar.set_message(patch.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

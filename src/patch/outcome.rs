// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Patch outcome classification.
//!
//! The patch-application binary does not hand out structured exit codes. A
//! non-zero exit status can mean the patch is already in place, the patch
//! does not exist for this release, or that applying it really broke. The
//! diagnostic text it prints is the only signal left, so classification is a
//! best-effort case-insensitive substring match over that text.

use crate::patch::invoke::CommandOutput;

use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::info;

/// Diagnostic fragments meaning the patch is already in place.
const ALREADY_APPLIED: [&str; 2] = ["already applied", "already installed"];

/// Diagnostic fragments meaning the patch is unknown to the binary.
const NOT_AVAILABLE: [&str; 4] = ["weren't found", "not found", "does not exist", "cannot find"];

/// Result of applying a single patch.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PatchOutcome {
    /// Patch was applied.
    Applied { patch: String },

    /// Patch was skipped, because it is already applied.
    AlreadyApplied { patch: String },

    /// Patch was skipped, because the binary does not know about it.
    NotAvailable { patch: String },

    /// Patch could not be applied.
    Failed { patch: String, message: String },
}

impl PatchOutcome {
    /// Classify the output of a finished invocation for a given patch.
    pub fn classify(patch: impl Into<String>, output: &CommandOutput) -> Self {
        let patch = patch.into();
        if output.success {
            return Self::Applied { patch };
        }

        let message = output.diagnostic();
        match FailureKind::of(message) {
            FailureKind::AlreadyApplied => Self::AlreadyApplied { patch },
            FailureKind::NotAvailable => Self::NotAvailable { patch },
            FailureKind::Hard => Self::Failed {
                patch,
                message: if message.is_empty() {
                    "command exited unsuccessfully without output".into()
                } else {
                    message.into()
                },
            },
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::AlreadyApplied { .. } | Self::NotAvailable { .. })
    }
}

/// Why an invocation exited unsuccessfully.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum FailureKind {
    AlreadyApplied,
    NotAvailable,
    Hard,
}

impl FailureKind {
    /// Determine failure kind from diagnostic text.
    ///
    /// # Invariant
    ///
    /// - "Already applied" fragments are matched before "not found"
    ///   fragments.
    pub fn of(message: impl AsRef<str>) -> Self {
        let message = message.as_ref().to_lowercase();
        if ALREADY_APPLIED.iter().any(|frag| message.contains(frag)) {
            Self::AlreadyApplied
        } else if NOT_AVAILABLE.iter().any(|frag| message.contains(frag)) {
            Self::NotAvailable
        } else {
            Self::Hard
        }
    }
}

/// Tally of one orchestration pass.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub struct RunSummary {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Count outcome into summary.
    pub fn record(&mut self, outcome: &PatchOutcome) {
        match outcome {
            PatchOutcome::Applied { .. } => self.applied += 1,
            PatchOutcome::AlreadyApplied { .. } | PatchOutcome::NotAvailable { .. } => {
                self.skipped += 1
            }
            PatchOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Total number of patches that were attempted.
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failed
    }

    /// Emit one line for each non-zero counter.
    pub fn report(&self) {
        if self.applied > 0 {
            info!("applied {} patch(es)", self.applied);
        }

        if self.skipped > 0 {
            info!("skipped {} patch(es)", self.skipped);
        }

        if self.failed > 0 {
            info!("failed to apply {} patch(es)", self.failed);
        }
    }
}

impl Display for RunSummary {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "applied: {}, skipped: {}, failed: {}",
            self.applied, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn failed_with(stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            success: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    #[test_case("Patch already applied.", FailureKind::AlreadyApplied; "already applied")]
    #[test_case("ERROR: PATCH IS ALREADY INSTALLED!", FailureKind::AlreadyApplied; "already installed uppercase")]
    #[test_case("Patch ACSD-99999 not found in repository", FailureKind::NotAvailable; "not found")]
    #[test_case("The following patches weren't found: ACSD-1", FailureKind::NotAvailable; "weren't found")]
    #[test_case("Patch file does not exist", FailureKind::NotAvailable; "does not exist")]
    #[test_case("Cannot find patch ACSD-3", FailureKind::NotAvailable; "cannot find")]
    #[test_case("Syntax error in patch file", FailureKind::Hard; "syntax error")]
    #[test_case("", FailureKind::Hard; "empty message")]
    #[test]
    fn failure_kind_of_message(message: &str, expect: FailureKind) {
        use pretty_assertions::assert_eq;

        assert_eq!(FailureKind::of(message), expect);
    }

    #[test]
    fn already_applied_wins_over_not_found() {
        let message = "Patch already applied, target file not found";
        assert_eq!(FailureKind::of(message), FailureKind::AlreadyApplied);
    }

    #[test]
    fn classify_success_ignores_output() {
        let output = CommandOutput {
            success: true,
            stdout: "Patch not found".into(),
            stderr: String::new(),
        };
        let expect = PatchOutcome::Applied {
            patch: "ACSD-1".into(),
        };

        assert_eq!(PatchOutcome::classify("ACSD-1", &output), expect);
    }

    #[test]
    fn classify_prefers_stderr() {
        let output = failed_with("Patch already applied.", "Syntax error in patch file\n");
        let expect = PatchOutcome::Failed {
            patch: "ACSD-1".into(),
            message: "Syntax error in patch file".into(),
        };

        assert_eq!(PatchOutcome::classify("ACSD-1", &output), expect);
    }

    #[test]
    fn classify_falls_back_to_stdout() {
        let output = failed_with("Patch ACSD-99999 not found in repository\n", "  \n");
        let expect = PatchOutcome::NotAvailable {
            patch: "ACSD-99999".into(),
        };

        assert_eq!(PatchOutcome::classify("ACSD-99999", &output), expect);
    }

    #[test]
    fn classify_without_output() {
        let outcome = PatchOutcome::classify("ACSD-7", &failed_with("", ""));
        assert!(matches!(outcome, PatchOutcome::Failed { ref patch, .. } if patch == "ACSD-7"));
    }

    #[test]
    fn summary_records_outcomes() {
        let mut summary = RunSummary::default();
        let outcomes = [
            PatchOutcome::Applied { patch: "A".into() },
            PatchOutcome::AlreadyApplied { patch: "B".into() },
            PatchOutcome::NotAvailable { patch: "C".into() },
            PatchOutcome::Failed {
                patch: "D".into(),
                message: "boom".into(),
            },
        ];
        for outcome in &outcomes {
            summary.record(outcome);
        }

        let expect = RunSummary {
            applied: 1,
            skipped: 2,
            failed: 1,
        };
        assert_eq!(summary, expect);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.to_string(), "applied: 1, skipped: 2, failed: 1");
    }
}

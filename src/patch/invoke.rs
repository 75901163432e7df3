// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command invocation.
//!
//! The patch-application binary is treated as an opaque external command.
//! Invoking it never throws its failure at the caller. A finished command
//! always comes back as a [`CommandOutput`], whether it exited successfully
//! or not. Only failures to run the command at all, e.g., it could not be
//! spawned or it ran past its timeout, are reported as [`InvokeError`].

use std::{
    ffi::OsString,
    path::PathBuf,
    process::Stdio,
    time::Duration,
};
use tokio::{process::Command, time::timeout};
use tracing::{debug, instrument};

/// One call of an external command.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CommandInvocation {
    /// Path to executable.
    pub program: PathBuf,

    /// Arguments passed to executable.
    pub args: Vec<OsString>,

    /// Working directory of executable.
    pub working_dir: PathBuf,

    /// Maximum amount of time the command may run for.
    pub timeout: Duration,
}

/// Captured result of a finished command.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct CommandOutput {
    /// Command exited with zero exit status.
    pub success: bool,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Diagnostic message of command.
    ///
    /// Standard error if it holds anything besides whitespace, standard
    /// output otherwise. Surrounding whitespace is trimmed.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Run external commands.
#[allow(async_fn_in_trait)]
pub trait PatchRunner {
    /// Run command to completion, or until its timeout elapses.
    async fn invoke(&self, invocation: &CommandInvocation) -> Result<CommandOutput>;
}

/// Run external commands as child processes.
#[derive(Debug, Default, Copy, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl PatchRunner for ProcessRunner {
    /// Spawn command as child process and capture its output.
    ///
    /// Standard input is closed. The child is killed if it outlives its
    /// timeout.
    ///
    /// # Errors
    ///
    /// - Return [`InvokeError::Spawn`] if child process cannot be spawned.
    /// - Return [`InvokeError::Wait`] if child process output cannot be
    ///   collected.
    /// - Return [`InvokeError::TimedOut`] if child process runs past its
    ///   timeout.
    #[instrument(skip(self), level = "debug")]
    async fn invoke(&self, invocation: &CommandInvocation) -> Result<CommandOutput> {
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| InvokeError::Spawn {
                source: err,
                program: invocation.program.clone(),
            })?;

        // INVARIANT: Dropping the child on timeout kills it.
        let output = timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| InvokeError::TimedOut {
                program: invocation.program.clone(),
                timeout: invocation.timeout,
            })?
            .map_err(|err| InvokeError::Wait {
                source: err,
                program: invocation.program.clone(),
            })?;

        debug!("command exited with {}", output.status);

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).into_owned(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).into_owned(),
        })
    }
}

/// Command invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// Child process cannot be spawned.
    #[error("failed to spawn {:?}", program.display())]
    Spawn {
        #[source]
        source: std::io::Error,
        program: PathBuf,
    },

    /// Output of child process cannot be collected.
    #[error("failed to wait on {:?}", program.display())]
    Wait {
        #[source]
        source: std::io::Error,
        program: PathBuf,
    },

    /// Child process ran past its timeout.
    #[error("{:?} timed out after {} seconds", program.display(), timeout.as_secs())]
    TimedOut { program: PathBuf, timeout: Duration },
}

/// Friendly result alias :3
pub type Result<T, E = InvokeError> = std::result::Result<T, E>;

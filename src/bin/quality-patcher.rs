// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use quality_patcher::{
    config::DEFAULT_MANIFEST,
    patch::{Orchestrator, DEFAULT_TIMEOUT},
    plugin::{guard, HookEvent, Plugin},
    recommend::recommended_patches,
    RunSummary,
};

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::{
    env::current_dir, io::IsTerminal, path::PathBuf, process::exit, time::Duration,
};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  quality-patcher [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalOptions,
}

impl Cli {
    async fn run(self) -> Result<()> {
        match self.command {
            Command::Hook(opts) => run_hook(&self.global, opts.event.into(), Vec::new()).await,
            Command::Apply(opts) => run_hook(&self.global, HookEvent::Manual, opts.patches).await,
            Command::Recommend => run_recommend(&self.global),
        }
    }

    fn log_level(&self) -> &'static str {
        if self.global.quiet {
            return "error";
        }

        match self.global.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Apply configured patches in response to a host event.
    #[command(override_usage = "quality-patcher hook [options] <event>")]
    Hook(HookOptions),

    /// Apply configured patches, or the given patches instead.
    #[command(override_usage = "quality-patcher apply [options] [<patch>]...")]
    Apply(ApplyOptions),

    /// List patches recommended for the installed Magento release.
    #[command(override_usage = "quality-patcher recommend [options]")]
    Recommend,
}

#[derive(Args, Clone, Debug)]
struct GlobalOptions {
    /// Project directory holding the manifest.
    #[arg(short = 'd', long, global = true, value_name = "path")]
    pub working_dir: Option<PathBuf>,

    /// Manifest file name relative to project directory.
    #[arg(long, global = true, env = "COMPOSER", default_value = DEFAULT_MANIFEST, value_name = "file")]
    pub manifest: PathBuf,

    /// Seconds a single patch may take to apply.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT.as_secs(), value_name = "seconds")]
    pub timeout: u64,

    /// Increase logging verbosity.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl GlobalOptions {
    fn project_dir(&self) -> Result<PathBuf> {
        match &self.working_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(current_dir()?),
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct HookOptions {
    /// Host event that triggered the hook.
    #[arg(value_enum, value_name = "event")]
    pub event: EventArg,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ApplyOptions {
    /// Patches to apply instead of the configured ones.
    #[arg(value_name = "patch")]
    pub patches: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EventArg {
    PostInstallCmd,
    PostUpdateCmd,
}

impl From<EventArg> for HookEvent {
    fn from(event: EventArg) -> Self {
        match event {
            EventArg::PostInstallCmd => HookEvent::PostInstall,
            EventArg::PostUpdateCmd => HookEvent::PostUpdate,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli.log_level()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = cli.run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

// INVARIANT: Never fails, the host's own exit status must not depend on us.
async fn run_hook(opts: &GlobalOptions, event: HookEvent, patches: Vec<String>) -> Result<()> {
    let summary = guard(apply_patches(opts, event, patches)).await;
    debug!("{event} attempted {} patch(es), {summary}", summary.total());

    Ok(())
}

async fn apply_patches(
    opts: &GlobalOptions,
    event: HookEvent,
    patches: Vec<String>,
) -> Result<RunSummary> {
    let orchestrator = Orchestrator::default().with_timeout(Duration::from_secs(opts.timeout));
    let plugin =
        Plugin::with_orchestrator(opts.project_dir()?, orchestrator).with_manifest(&opts.manifest);

    if patches.is_empty() {
        return Ok(plugin.run(event).await?);
    }

    let mut config = plugin.config()?;
    config.patches = patches;
    Ok(plugin.run_with(&config).await)
}

fn run_recommend(opts: &GlobalOptions) -> Result<()> {
    let patches = recommended_patches(opts.project_dir()?);
    if patches.is_empty() {
        info!("no patches recommended for installed release");
    }

    for patch in patches {
        println!("{patch}");
    }

    Ok(())
}

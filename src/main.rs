// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: CLI entry point for the platinit platform orchestrator.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! CLI entry point for the platinit platform orchestrator.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::{debug, error};

use platform_init::config::{
    delay_from_secs, load_config, resolve_config_path, ConfigOverrides, LockMode, RuntimeConfig,
};
use platform_init::logging::init_logging;
use platform_init::{CommandInvocation, Dispatcher, PlatformRegistry, ResetFlags};

/// Platform driver setup, teardown and reset.
#[derive(Debug, Parser)]
#[command(author = "Lukas Bower", version, about = "Platform driver setup, teardown and reset")]
struct Cli {
    /// Run without hardware or root; lock and log files are generated per run.
    #[arg(short, long, global = true)]
    simulation: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Append logs to FILE instead of stderr.
    #[arg(short = 'l', long = "logfile", value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Lock file guarding setup and clean.
    #[arg(long = "lockfile", value_name = "FILE", global = true)]
    lock_path: Option<PathBuf>,

    /// Behaviour when another setup or clean holds the lock.
    #[arg(long, value_enum, global = true)]
    lock_mode: Option<LockMode>,

    /// Platform identifier (see `platforms`).
    #[arg(short, long, global = true)]
    platform: Option<String>,

    /// Configuration TOML (default: $PLATINIT_CONFIG or /etc/platinit/platinit.toml).
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Inventory file read by `syseeprom`.
    #[arg(long, value_name = "FILE", global = true)]
    inventory: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List known platform identifiers.
    Platforms,
    /// Print system inventory key/value pairs.
    Syseeprom,
    /// Describe the platform as JSON.
    Dump,
    /// Set up platform drivers.
    Setup(SetupArgs),
    /// Tear platform drivers down.
    Clean(CleanArgs),
    /// Put components in or out of reset.
    Reset(ResetArgs),
    /// Report platform status (not implemented).
    Status,
}

#[derive(Debug, Args)]
struct SetupArgs {
    /// Take components out of reset after critical drivers are up.
    #[arg(short, long)]
    reset: bool,
    /// Enable driver debugging.
    #[arg(short, long)]
    debug: bool,
    /// Finish slow drivers in a background process.
    #[arg(short, long)]
    background: bool,
}

#[derive(Debug, Args)]
struct CleanArgs {
    /// Put components in reset before cleaning.
    #[arg(short, long)]
    reset: bool,
}

#[derive(Debug, Args)]
struct ResetArgs {
    /// Put components in reset.
    #[arg(short = 'i', long = "in")]
    put_in: bool,
    /// Take components out of reset.
    #[arg(short, long)]
    out: bool,
    /// Reset in, wait, then reset out.
    #[arg(short, long)]
    toggle: bool,
    /// Seconds to wait when toggling (default 1, or the configured delay).
    #[arg(short, long, value_name = "SECONDS")]
    delay: Option<f64>,
}

impl Command {
    fn into_invocation(self, config: &RuntimeConfig) -> Result<CommandInvocation> {
        let invocation = match self {
            Command::Platforms => CommandInvocation::new("platforms"),
            Command::Syseeprom => CommandInvocation::new("syseeprom"),
            Command::Dump => CommandInvocation::new("dump"),
            Command::Status => CommandInvocation::new("status"),
            Command::Setup(args) => CommandInvocation {
                reset: args.reset,
                debug: args.debug,
                background: args.background,
                ..CommandInvocation::new("setup")
            },
            Command::Clean(args) => CommandInvocation {
                reset: args.reset,
                ..CommandInvocation::new("clean")
            },
            Command::Reset(args) => {
                let delay = match args.delay {
                    Some(secs) => delay_from_secs(secs)?,
                    None => config.reset_delay,
                };
                CommandInvocation {
                    reset_flags: ResetFlags {
                        out: args.out,
                        put_in: args.put_in,
                        toggle: args.toggle,
                        delay,
                    },
                    ..CommandInvocation::new("reset")
                }
            }
        };
        Ok(invocation)
    }
}

fn resolve_runtime_config(cli: &Cli) -> Result<RuntimeConfig> {
    let file = match resolve_config_path(cli.config.clone()) {
        Some(path) => Some(load_config(&path)?),
        None => None,
    };
    let overrides = ConfigOverrides {
        simulation: cli.simulation,
        verbose: cli.verbose,
        lock_path: cli.lock_path.clone(),
        lock_mode: cli.lock_mode,
        log_file: cli.log_file.clone(),
        platform: cli.platform.clone(),
        inventory_path: cli.inventory.clone(),
    };
    RuntimeConfig::resolve(file.as_ref(), overrides)
}

fn run(cli: Cli, config: RuntimeConfig) -> Result<()> {
    let invocation = cli.command.into_invocation(&config)?;
    debug!(
        "running {} (simulation={}, lock={})",
        invocation.action,
        config.simulation,
        config.lock_path.display()
    );
    let dispatcher = Dispatcher::new(config, PlatformRegistry::builtin());
    let mut out = io::stdout();
    dispatcher.run(&invocation, &mut out)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match resolve_runtime_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("platinit: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging(config.verbose, config.log_file.as_deref()) {
        eprintln!("platinit: {err:#}");
        return ExitCode::FAILURE;
    }
    let logs_to_file = config.log_file.is_some();
    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            if logs_to_file {
                eprintln!("platinit: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

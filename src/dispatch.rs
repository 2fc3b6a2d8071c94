// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Route command invocations to their handlers.
// Author: Lukas Bower
#![forbid(unsafe_code)]

//! Command dispatch.
//!
//! Handlers live in two tables: commands that need no platform and commands
//! that run against a resolved platform. Unknown names are logged and
//! reported as [`InitError::UnknownCommand`].

use std::io::Write;

use anyhow::{Context, Result};
use log::{error, info};

use crate::config::RuntimeConfig;
use crate::error::InitError;
use crate::inventory::{read_inventory, simulated_inventory};
use crate::orchestrator::{CleanOptions, Orchestrator, SetupOptions, SetupOutcome};
use crate::platform::{Platform, PlatformRegistry};
use crate::reset::{apply_reset, ResetFlags, ResetIntent};

/// One command execution, built from external input and consumed once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandInvocation {
    /// Action name, e.g. `setup`.
    pub action: String,
    /// `setup --reset` / `clean --reset`.
    pub reset: bool,
    /// `setup --debug`.
    pub debug: bool,
    /// `setup --background`.
    pub background: bool,
    /// `reset --in/--out/--toggle/--delay`.
    pub reset_flags: ResetFlags,
}

impl CommandInvocation {
    /// Invocation of `action` with every flag cleared.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }
}

type GlobalHandler = fn(&Dispatcher, &CommandInvocation, &mut dyn Write) -> Result<()>;
type PlatformHandler =
    fn(&Dispatcher, &CommandInvocation, &mut dyn Platform, &mut dyn Write) -> Result<()>;

const GLOBAL_COMMANDS: &[(&str, GlobalHandler)] =
    &[("platforms", list_platforms), ("syseeprom", dump_inventory)];

const PLATFORM_COMMANDS: &[(&str, PlatformHandler)] = &[
    ("dump", dump_platform),
    ("setup", setup_platform),
    ("clean", clean_platform),
    ("reset", reset_platform),
    ("status", platform_status),
];

/// Whether `action` needs a resolved platform. `None` for unknown actions.
#[must_use]
pub fn requires_platform(action: &str) -> Option<bool> {
    if GLOBAL_COMMANDS.iter().any(|(name, _)| *name == action) {
        Some(false)
    } else if PLATFORM_COMMANDS.iter().any(|(name, _)| *name == action) {
        Some(true)
    } else {
        None
    }
}

/// Maps invocations to handlers for one process run.
#[derive(Debug)]
pub struct Dispatcher {
    config: RuntimeConfig,
    registry: PlatformRegistry,
    orchestrator: Orchestrator,
}

impl Dispatcher {
    /// Dispatcher using the default orchestrator for `config`.
    pub fn new(config: RuntimeConfig, registry: PlatformRegistry) -> Self {
        let orchestrator = Orchestrator::new(&config);
        Self {
            config,
            registry,
            orchestrator,
        }
    }

    /// Replace the orchestrator.
    #[must_use]
    pub fn with_orchestrator(mut self, orchestrator: Orchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    /// Resolve the configured platform from the registry.
    pub fn resolve_platform(&self) -> Result<Option<Box<dyn Platform>>> {
        match &self.config.platform {
            Some(name) => Ok(Some(self.registry.resolve(name)?)),
            None => Ok(None),
        }
    }

    /// Resolve the platform when the action needs one, then dispatch.
    pub fn run(&self, invocation: &CommandInvocation, out: &mut dyn Write) -> Result<()> {
        let mut resolved = match requires_platform(&invocation.action) {
            Some(true) => self.resolve_platform()?,
            _ => None,
        };
        match resolved.as_mut() {
            Some(platform) => self.dispatch(invocation, Some(&mut **platform), out),
            None => self.dispatch(invocation, None, out),
        }
    }

    /// Invoke the handler for `invocation.action`.
    pub fn dispatch(
        &self,
        invocation: &CommandInvocation,
        platform: Option<&mut dyn Platform>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let action = invocation.action.as_str();
        if let Some((_, handler)) = GLOBAL_COMMANDS.iter().find(|(name, _)| *name == action) {
            return handler(self, invocation, out);
        }
        if let Some((name, handler)) = PLATFORM_COMMANDS.iter().find(|(name, _)| *name == action)
        {
            let platform = platform.ok_or(InitError::MissingPlatform(*name))?;
            return handler(self, invocation, platform, out);
        }
        error!("unknown command '{action}'");
        Err(InitError::UnknownCommand(action.to_owned()).into())
    }
}

fn list_platforms(
    dispatcher: &Dispatcher,
    _invocation: &CommandInvocation,
    out: &mut dyn Write,
) -> Result<()> {
    for entry in dispatcher.registry.entries() {
        writeln!(out, "{:<16} {}", entry.name, entry.description)?;
    }
    Ok(())
}

fn dump_inventory(
    dispatcher: &Dispatcher,
    _invocation: &CommandInvocation,
    out: &mut dyn Write,
) -> Result<()> {
    let inventory = if dispatcher.config.simulation {
        simulated_inventory()
    } else {
        read_inventory(&dispatcher.config.inventory_path)?
    };
    for (key, value) in &inventory {
        writeln!(out, "{key}: {value}")?;
    }
    Ok(())
}

fn dump_platform(
    _dispatcher: &Dispatcher,
    _invocation: &CommandInvocation,
    platform: &mut dyn Platform,
    out: &mut dyn Write,
) -> Result<()> {
    let dump = platform
        .dump()
        .with_context(|| format!("dump of {}", platform.name()))?;
    let json = serde_json::to_string_pretty(&dump).context("serialize platform dump")?;
    writeln!(out, "{json}")?;
    Ok(())
}

fn setup_platform(
    dispatcher: &Dispatcher,
    invocation: &CommandInvocation,
    platform: &mut dyn Platform,
    _out: &mut dyn Write,
) -> Result<()> {
    let options = SetupOptions {
        reset: invocation.reset,
        debug: invocation.debug,
        background: invocation.background,
    };
    match dispatcher.orchestrator.setup(platform, options)? {
        SetupOutcome::Complete => info!("setup complete"),
        SetupOutcome::Deferred { pid } => {
            info!("default drivers ready; background setup running in pid {pid}")
        }
    }
    Ok(())
}

fn clean_platform(
    dispatcher: &Dispatcher,
    invocation: &CommandInvocation,
    platform: &mut dyn Platform,
    _out: &mut dyn Write,
) -> Result<()> {
    let options = CleanOptions {
        reset: invocation.reset,
    };
    dispatcher.orchestrator.clean(platform, options)
}

fn reset_platform(
    _dispatcher: &Dispatcher,
    invocation: &CommandInvocation,
    platform: &mut dyn Platform,
    _out: &mut dyn Write,
) -> Result<()> {
    apply_reset(platform, ResetIntent::from_flags(&invocation.reset_flags))
}

fn platform_status(
    _dispatcher: &Dispatcher,
    _invocation: &CommandInvocation,
    _platform: &mut dyn Platform,
    _out: &mut dyn Write,
) -> Result<()> {
    Err(InitError::Unimplemented("status").into())
}

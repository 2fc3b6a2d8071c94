// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Staged priority setup with optional reset-out and background deferral.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use log::info;

use super::Orchestrator;
use crate::background::{run_in_background, BackgroundOutcome};
use crate::lock::ProcessLock;
use crate::platform::{Platform, Priority};

/// Flags accepted by `setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetupOptions {
    /// Take components out of reset once `Default` drivers are up.
    pub reset: bool,
    /// Enable driver debugging before any setup call.
    pub debug: bool,
    /// Defer the `Background` tier to a detached worker.
    pub background: bool,
}

/// State of the platform when `setup` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Both tiers are initialised.
    Complete,
    /// `Default` is initialised; `Background` continues in the worker.
    Deferred {
        /// Worker pid.
        pid: u32,
    },
}

impl Orchestrator {
    /// Bring `platform` up.
    ///
    /// `setup(Default)` always finishes before `setup(Background)` starts.
    /// The reset-out runs straight after the `Default` tier, which assumes no
    /// resettable device is initialised in the `Background` tier.
    pub fn setup(
        &self,
        platform: &mut dyn Platform,
        options: SetupOptions,
    ) -> Result<SetupOutcome> {
        self.check_privileges("setup")?;
        if options.debug {
            platform.set_debug(true);
        }

        if !options.background {
            let _guard = self.lock.acquire()?;
            setup_default_tier(platform, options.reset)?;
            finish_setup(platform)?;
            return Ok(SetupOutcome::Complete);
        }

        {
            let _guard = self.lock.acquire()?;
            setup_default_tier(platform, options.reset)?;
        }
        let lock = self.lock.clone();
        let outcome = run_in_background(
            self.spawner.as_ref(),
            Box::new(move || deferred_setup(&lock, platform)),
        )?;
        Ok(match outcome {
            BackgroundOutcome::Detached { pid } => SetupOutcome::Deferred { pid },
            BackgroundOutcome::Inline => SetupOutcome::Complete,
        })
    }
}

fn setup_default_tier(platform: &mut dyn Platform, reset: bool) -> Result<()> {
    info!("setting up {} {} drivers", platform.name(), Priority::Default);
    platform
        .setup(Priority::Default)
        .with_context(|| format!("{} setup of {}", Priority::Default, platform.name()))?;
    if reset {
        info!("taking {} components out of reset", platform.name());
        platform
            .reset_out()
            .with_context(|| format!("reset out of {}", platform.name()))?;
    }
    Ok(())
}

fn deferred_setup(lock: &ProcessLock, platform: &mut dyn Platform) -> Result<()> {
    let _guard = lock.acquire()?;
    finish_setup(platform)
}

fn finish_setup(platform: &mut dyn Platform) -> Result<()> {
    info!("setting up {} {} drivers", platform.name(), Priority::Background);
    platform
        .setup(Priority::Background)
        .with_context(|| format!("{} setup of {}", Priority::Background, platform.name()))?;
    platform
        .wait_for_it()
        .with_context(|| format!("waiting for {} initialization", platform.name()))?;
    info!("{} initialization complete", platform.name());
    Ok(())
}

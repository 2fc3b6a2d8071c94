// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Sequence privileged platform setup and teardown under the process lock.
// Author: Lukas Bower
#![forbid(unsafe_code)]

//! Initialization orchestration.
//!
//! [`Orchestrator::setup`] brings drivers up tier by tier and
//! [`Orchestrator::clean`] tears them down. Both require root unless the run
//! is simulated, and both hold the [`ProcessLock`] while touching drivers.
//!
//! With background setup the lock is held for the `Default` tier (and the
//! optional reset-out) only. It is released before the worker is spawned,
//! and the worker takes it again for the `Background` tier.

mod clean;
mod setup;

pub use clean::CleanOptions;
pub use setup::{SetupOptions, SetupOutcome};

use log::error;
use nix::unistd::geteuid;

use crate::background::{ForkSpawner, Spawner};
use crate::config::RuntimeConfig;
use crate::error::InitError;
use crate::lock::ProcessLock;

/// Answers whether the caller holds root-equivalent privileges.
pub type PrivilegeProbe = fn() -> bool;

/// Effective uid check used outside tests.
#[must_use]
pub fn running_as_root() -> bool {
    geteuid().is_root()
}

/// Runs setup and clean for one command execution.
pub struct Orchestrator {
    simulation: bool,
    lock: ProcessLock,
    spawner: Box<dyn Spawner>,
    privileged: PrivilegeProbe,
}

impl Orchestrator {
    /// Orchestrator for `config`, forking for background work.
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            simulation: config.simulation,
            lock: ProcessLock::from_config(config),
            spawner: Box::new(ForkSpawner),
            privileged: running_as_root,
        }
    }

    /// Replace the spawner used for background setup.
    #[must_use]
    pub fn with_spawner(mut self, spawner: Box<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Replace the privilege probe.
    #[must_use]
    pub fn with_privilege_probe(mut self, probe: PrivilegeProbe) -> Self {
        self.privileged = probe;
        self
    }

    /// Lock guarding setup and clean.
    #[must_use]
    pub fn lock(&self) -> &ProcessLock {
        &self.lock
    }

    fn check_privileges(&self, action: &'static str) -> Result<(), InitError> {
        if self.simulation || (self.privileged)() {
            return Ok(());
        }
        error!("{action} must be run as root");
        Err(InitError::Permission { action })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("simulation", &self.simulation)
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}

// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Provide a hardware-free platform that journals every capability call.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use anyhow::{anyhow, Result};
use log::info;

use super::{DriverInfo, Platform, PlatformDump, Priority};

/// Capability invocation observed on a [`SimulatedPlatform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    /// `set_debug(enabled)`.
    SetDebug(bool),
    /// `setup(priority)`.
    Setup(Priority),
    /// `clean()`.
    Clean,
    /// `reset_in()`.
    ResetIn,
    /// `reset_out()`.
    ResetOut,
    /// `wait_for_it()`.
    WaitForIt,
    /// `dump()`.
    Dump,
}

/// Journal entry with the instant the call started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRecord {
    /// The call.
    pub call: Call,
    /// When it was made.
    pub at: Instant,
}

/// Shared call journal; clones observe the same entries.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    records: Arc<Mutex<Vec<CallRecord>>>,
}

impl Journal {
    /// Calls in the order they were made.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.entries().iter().map(|record| record.call).collect()
    }

    /// Calls with their timestamps.
    #[must_use]
    pub fn records(&self) -> Vec<CallRecord> {
        self.entries().clone()
    }

    fn push(&self, call: Call) {
        self.entries().push(CallRecord {
            call,
            at: Instant::now(),
        });
    }

    fn entries(&self) -> MutexGuard<'_, Vec<CallRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Platform without hardware, used by simulation mode.
#[derive(Debug, Clone)]
pub struct SimulatedPlatform {
    name: String,
    journal: Journal,
    failures: HashSet<Call>,
    debug: bool,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new("simulated")
    }
}

impl SimulatedPlatform {
    /// Create a simulated platform with an empty journal.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            journal: Journal::default(),
            failures: HashSet::new(),
            debug: false,
        }
    }

    /// Make `call` fail every time it is made. The attempt is still journaled.
    #[must_use]
    pub fn failing_on(mut self, call: Call) -> Self {
        self.failures.insert(call);
        self
    }

    /// Handle onto the call journal.
    #[must_use]
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Whether driver debugging was enabled.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    fn record(&self, call: Call) -> Result<()> {
        self.journal.push(call);
        if self.failures.contains(&call) {
            return Err(anyhow!("simulated failure in {call:?} on {}", self.name));
        }
        Ok(())
    }
}

impl Platform for SimulatedPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_debug(&mut self, enabled: bool) {
        self.journal.push(Call::SetDebug(enabled));
        self.debug = enabled;
    }

    fn setup(&mut self, priority: Priority) -> Result<()> {
        self.record(Call::Setup(priority))?;
        info!("{}: {priority} drivers set up", self.name);
        Ok(())
    }

    fn clean(&mut self) -> Result<()> {
        self.record(Call::Clean)?;
        info!("{}: drivers cleaned", self.name);
        Ok(())
    }

    fn reset_in(&mut self) -> Result<()> {
        self.record(Call::ResetIn)?;
        info!("{}: components in reset", self.name);
        Ok(())
    }

    fn reset_out(&mut self) -> Result<()> {
        self.record(Call::ResetOut)?;
        info!("{}: components out of reset", self.name);
        Ok(())
    }

    fn wait_for_it(&mut self) -> Result<()> {
        self.record(Call::WaitForIt)
    }

    fn dump(&self) -> Result<PlatformDump> {
        self.record(Call::Dump)?;
        Ok(PlatformDump {
            name: self.name.clone(),
            description: "simulated platform without hardware access".to_owned(),
            drivers: vec![
                DriverInfo {
                    name: "scd".to_owned(),
                    priority: Priority::Default,
                    resettable: true,
                },
                DriverInfo {
                    name: "i2c-mux".to_owned(),
                    priority: Priority::Default,
                    resettable: false,
                },
                DriverInfo {
                    name: "fan-controller".to_owned(),
                    priority: Priority::Background,
                    resettable: false,
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_failure_is_journaled_and_returned() {
        let mut platform = SimulatedPlatform::default().failing_on(Call::Clean);
        let journal = platform.journal();
        platform.setup(Priority::Default).unwrap();
        assert!(platform.clean().is_err());
        assert_eq!(journal.calls(), vec![Call::Setup(Priority::Default), Call::Clean]);
    }

    #[test]
    fn dump_lists_both_tiers() {
        let dump = SimulatedPlatform::default().dump().unwrap();
        assert!(dump.drivers.iter().any(|d| d.priority == Priority::Default));
        assert!(dump.drivers.iter().any(|d| d.priority == Priority::Background));
    }
}

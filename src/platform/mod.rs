// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define the platform capability set driven by the orchestrator.
// Author: Lukas Bower
#![forbid(unsafe_code)]

//! Platform capability set.
//!
//! The orchestrator never looks inside a platform. It only calls the
//! capabilities of [`Platform`] in a fixed order, tagging setup calls with a
//! [`Priority`] tier.

use std::fmt;

use anyhow::Result;
use serde::Serialize;

mod registry;
mod simulated;

pub use registry::{PlatformEntry, PlatformFactory, PlatformRegistry};
pub use simulated::{Call, CallRecord, Journal, SimulatedPlatform};

/// Driver initialization tier. `Default` always precedes `Background`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Critical drivers that must be up before the caller returns.
    Default,
    /// Slow or non-critical drivers that may be deferred.
    Background,
}

impl Priority {
    /// Lowercase label used in logs and dumps.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Priority::Default => "default",
            Priority::Background => "background",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One driver as reported by [`Platform::dump`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverInfo {
    /// Driver name.
    pub name: String,
    /// Tier the driver is initialised in.
    pub priority: Priority,
    /// Whether the driver manages a reset line.
    pub resettable: bool,
}

/// Platform self-description printed by the `dump` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformDump {
    /// Platform identifier.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Drivers managed by the platform.
    pub drivers: Vec<DriverInfo>,
}

/// Capabilities a hardware platform exposes to the orchestrator.
///
/// Every capability may fail; failures propagate unchanged to the caller.
pub trait Platform {
    /// Platform identifier.
    fn name(&self) -> &str;

    /// Enable driver debugging. Called before any [`Platform::setup`].
    fn set_debug(&mut self, _enabled: bool) {}

    /// Bring up the drivers of one tier. Returns once the tier is set up.
    fn setup(&mut self, priority: Priority) -> Result<()>;

    /// Tear down every driver.
    fn clean(&mut self) -> Result<()>;

    /// Put resettable components in reset.
    fn reset_in(&mut self) -> Result<()>;

    /// Take resettable components out of reset.
    fn reset_out(&mut self) -> Result<()>;

    /// Block until all initialization, including platform-internal work, is done.
    fn wait_for_it(&mut self) -> Result<()>;

    /// Describe the platform.
    fn dump(&self) -> Result<PlatformDump>;
}

impl<P: Platform + ?Sized> Platform for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn set_debug(&mut self, enabled: bool) {
        (**self).set_debug(enabled)
    }

    fn setup(&mut self, priority: Priority) -> Result<()> {
        (**self).setup(priority)
    }

    fn clean(&mut self) -> Result<()> {
        (**self).clean()
    }

    fn reset_in(&mut self) -> Result<()> {
        (**self).reset_in()
    }

    fn reset_out(&mut self) -> Result<()> {
        (**self).reset_out()
    }

    fn wait_for_it(&mut self) -> Result<()> {
        (**self).wait_for_it()
    }

    fn dump(&self) -> Result<PlatformDump> {
        (**self).dump()
    }
}

// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Map platform identifiers to platform constructors.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use super::{Platform, SimulatedPlatform};
use crate::config::SIMULATED_PLATFORM;
use crate::error::InitError;

/// Constructor for a registered platform.
pub type PlatformFactory = fn() -> Box<dyn Platform>;

fn simulated() -> Box<dyn Platform> {
    Box::new(SimulatedPlatform::new(SIMULATED_PLATFORM))
}

/// Registered platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformEntry {
    /// Identifier used by `--platform` and listed by `platforms`.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    factory: PlatformFactory,
}

impl PlatformEntry {
    /// Build a fresh platform handle.
    #[must_use]
    pub fn create(&self) -> Box<dyn Platform> {
        (self.factory)()
    }
}

/// Known platforms, ordered by identifier.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    entries: BTreeMap<&'static str, PlatformEntry>,
}

impl PlatformRegistry {
    /// Registry with the platforms shipped in this crate.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(
            SIMULATED_PLATFORM,
            "hardware-free platform for simulation runs",
            simulated,
        );
        registry
    }

    /// Add or replace a platform.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        factory: PlatformFactory,
    ) {
        self.entries.insert(
            name,
            PlatformEntry {
                name,
                description,
                factory,
            },
        );
    }

    /// Registered entries in identifier order.
    pub fn entries(&self) -> impl Iterator<Item = &PlatformEntry> {
        self.entries.values()
    }

    /// Build the platform registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<Box<dyn Platform>, InitError> {
        self.entries
            .get(name)
            .map(PlatformEntry::create)
            .ok_or_else(|| InitError::UnknownPlatform(name.to_owned()))
    }
}

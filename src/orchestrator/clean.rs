// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Tear platform drivers down under the process lock.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use log::info;

use super::Orchestrator;
use crate::platform::Platform;

/// Flags accepted by `clean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanOptions {
    /// Put components in reset before taking the lock.
    pub reset: bool,
}

impl Orchestrator {
    /// Tear `platform` down. The reset-in, when requested, happens before the
    /// lock is taken.
    pub fn clean(&self, platform: &mut dyn Platform, options: CleanOptions) -> Result<()> {
        self.check_privileges("clean")?;
        if options.reset {
            info!("putting {} components in reset", platform.name());
            platform
                .reset_in()
                .with_context(|| format!("reset in of {}", platform.name()))?;
        }
        let _guard = self.lock.acquire()?;
        info!("cleaning {} drivers", platform.name());
        platform
            .clean()
            .with_context(|| format!("clean of {}", platform.name()))
    }
}

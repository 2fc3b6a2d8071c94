// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Translate reset requests into ordered platform reset calls.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::info;

use crate::platform::Platform;

/// Reset flags as supplied on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetFlags {
    /// `--out`.
    pub out: bool,
    /// `--in`.
    pub put_in: bool,
    /// `--toggle`.
    pub toggle: bool,
    /// `--delay`, used by toggles only.
    pub delay: Duration,
}

/// A single reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetIntent {
    /// Release components from reset.
    Out,
    /// Hold components in reset.
    In,
    /// Reset in, wait, then reset out.
    Toggle(Duration),
}

impl ResetIntent {
    /// Pick the honoured intent; precedence is `out`, then `in`, then
    /// `toggle`. Remaining flags are ignored. `None` when nothing was asked.
    #[must_use]
    pub fn from_flags(flags: &ResetFlags) -> Option<Self> {
        if flags.out {
            Some(Self::Out)
        } else if flags.put_in {
            Some(Self::In)
        } else if flags.toggle {
            Some(Self::Toggle(flags.delay))
        } else {
            None
        }
    }
}

/// Apply `intent` to the platform. Toggles block the caller for the delay.
pub fn apply_reset<P: Platform + ?Sized>(
    platform: &mut P,
    intent: Option<ResetIntent>,
) -> Result<()> {
    match intent {
        Some(ResetIntent::Out) => {
            info!("taking {} components out of reset", platform.name());
            platform.reset_out()
        }
        Some(ResetIntent::In) => {
            info!("putting {} components in reset", platform.name());
            platform.reset_in()
        }
        Some(ResetIntent::Toggle(delay)) => {
            info!(
                "toggling {} reset with {:.3}s delay",
                platform.name(),
                delay.as_secs_f64()
            );
            platform.reset_in()?;
            thread::sleep(delay);
            platform.reset_out()
        }
        None => {
            info!("no reset requested; use --in, --out or --toggle");
            Ok(())
        }
    }
}

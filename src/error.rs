// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define the error taxonomy surfaced by platform orchestration.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Errors raised by the orchestration core.
///
/// Platform capability failures are not represented here; they travel as
/// opaque [`anyhow::Error`] values and are never caught by the core.
#[derive(Debug, Error)]
pub enum InitError {
    /// The caller lacks the privilege required by the action.
    #[error("{action} requires root privileges (or --simulation)")]
    Permission {
        /// Action that was refused.
        action: &'static str,
    },
    /// The process lock could not be created or taken.
    #[error("failed to acquire lock {}: {source}", path.display())]
    Lock {
        /// Lock file path.
        path: PathBuf,
        /// Underlying filesystem or locking failure.
        #[source]
        source: io::Error,
    },
    /// Process creation for deferred work failed.
    #[error("failed to fork background worker: {0}")]
    Fork(#[from] Errno),
    /// The action exists but has no implementation.
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
    /// The dispatcher was handed an action it does not know.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    /// The requested platform identifier is not registered.
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),
    /// A platform command ran without a resolved platform.
    #[error("{0} requires a platform (use --platform or --simulation)")]
    MissingPlatform(&'static str),
    /// A reset toggle delay was negative or not finite.
    #[error("invalid reset delay {0}: must be a non-negative number of seconds")]
    InvalidDelay(f64),
    /// The configuration file could not be loaded.
    #[error("invalid configuration {}: {reason}", path.display())]
    Config {
        /// Configuration file path.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },
}

impl InitError {
    pub(crate) fn lock(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Lock {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

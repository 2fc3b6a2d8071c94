// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Expose the platform initialization orchestrator library.
// Author: Lukas Bower
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Platform initialization orchestrator.
//!
//! Brings platform drivers up in priority order, optionally finishing the
//! slow tier in a detached worker, tears them down again, and drives reset
//! lines. Setup and clean are serialised through a file lock.

/// Deferred background execution.
pub mod background;
/// Runtime configuration layering.
pub mod config;
/// Command dispatch.
pub mod dispatch;
/// Error taxonomy.
pub mod error;
/// `syseeprom` inventory sources.
pub mod inventory;
/// Process lock.
pub mod lock;
/// Logger initialisation.
pub mod logging;
/// Setup and clean orchestration.
pub mod orchestrator;
/// Platform capability set and registry.
pub mod platform;
/// Reset controller.
pub mod reset;

pub use config::{LockMode, RuntimeConfig};
pub use dispatch::{CommandInvocation, Dispatcher};
pub use error::InitError;
pub use orchestrator::{CleanOptions, Orchestrator, SetupOptions, SetupOutcome};
pub use platform::{Platform, PlatformRegistry, Priority};
pub use reset::{ResetFlags, ResetIntent};

// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Defer lower-priority initialization to a detached process.
// Author: Lukas Bower
#![deny(unsafe_code)]

//! Background execution of deferred setup work.
//!
//! A [`Spawner`] hands the work to another process. If spawning fails the
//! work comes back to the caller, which then runs it inline, so deferred
//! setup always runs eventually.

use std::fmt;
use std::io::{self, Write};
use std::process;

use anyhow::Result;
use log::{error, info, warn};
use nix::unistd::{fork, ForkResult};

use crate::error::InitError;

/// Work deferred to the background.
pub type DeferredWork<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

/// Spawn failure; carries the work back for inline execution.
pub struct SpawnError<'a> {
    /// The work that was not started.
    pub work: DeferredWork<'a>,
    /// Why spawning failed.
    pub error: InitError,
}

impl fmt::Debug for SpawnError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Starts deferred work outside the caller's control flow.
pub trait Spawner {
    /// Start `work` elsewhere and return without waiting for it. Returns the
    /// identifier of the worker.
    fn spawn<'a>(&self, work: DeferredWork<'a>) -> Result<u32, SpawnError<'a>>;
}

/// Spawner that forks the current process.
///
/// The child runs the work, exits with status 0 on success or 1 on failure,
/// and never returns into the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForkSpawner;

impl Spawner for ForkSpawner {
    fn spawn<'a>(&self, work: DeferredWork<'a>) -> Result<u32, SpawnError<'a>> {
        // SAFETY: platinit forks from its single main thread, and the child
        // only runs `work` before calling `process::exit`.
        #[allow(unsafe_code)]
        let forked = unsafe { fork() };
        match forked {
            Ok(ForkResult::Parent { child }) => Ok(child.as_raw().unsigned_abs()),
            Ok(ForkResult::Child) => run_child(work),
            Err(errno) => Err(SpawnError {
                work,
                error: InitError::Fork(errno),
            }),
        }
    }
}

fn run_child(work: DeferredWork<'_>) -> ! {
    let status = match work() {
        Ok(()) => {
            info!("background setup complete (pid {})", process::id());
            0
        }
        Err(err) => {
            error!("background setup failed: {err:#}");
            1
        }
    };
    let _ = io::stdout().flush();
    log::logger().flush();
    process::exit(status)
}

/// How deferred work was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundOutcome {
    /// Running in a detached worker; completion is not awaited.
    Detached {
        /// Worker identifier (the child pid for [`ForkSpawner`]).
        pid: u32,
    },
    /// Spawning failed and the work already ran to completion inline.
    Inline,
}

/// Run `work` in the background, falling back to running it inline when the
/// spawner fails. Errors from inline work propagate.
pub fn run_in_background<S: Spawner + ?Sized>(
    spawner: &S,
    work: DeferredWork<'_>,
) -> Result<BackgroundOutcome> {
    match spawner.spawn(work) {
        Ok(pid) => {
            info!("background setup continues in pid {pid}");
            Ok(BackgroundOutcome::Detached { pid })
        }
        Err(SpawnError { work, error }) => {
            warn!("{error}; running background setup in the foreground");
            work()?;
            Ok(BackgroundOutcome::Inline)
        }
    }
}

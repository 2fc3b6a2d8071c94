// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Provide the scoped file lock serialising setup and clean.
// Author: Lukas Bower
#![forbid(unsafe_code)]

//! Scoped, file-based mutual exclusion.
//!
//! The lock is an exclusive `flock(2)` on a named file. Locks belong to the
//! open file description, so two [`ProcessLock::acquire`] calls conflict even
//! inside one process, and the lock is dropped by the kernel if the holder
//! dies.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};

use crate::config::{LockMode, RuntimeConfig};
use crate::error::InitError;

/// Named lock file shared by every setup and clean on a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLock {
    path: PathBuf,
    mode: LockMode,
}

impl ProcessLock {
    /// Describe a lock without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>, mode: LockMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    /// Lock configured for this run.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.lock_path.clone(), config.lock_mode)
    }

    /// Lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the lock according to the configured [`LockMode`].
    ///
    /// In [`LockMode::Block`] this waits for the current holder; in
    /// [`LockMode::Fail`] contention is reported as [`InitError::Lock`].
    pub fn acquire(&self) -> Result<LockGuard, InitError> {
        match self.mode {
            LockMode::Block => {
                let file = self.open()?;
                debug!("waiting for lock {}", self.path.display());
                let flock = Flock::lock(file, FlockArg::LockExclusive)
                    .map_err(|(_, errno)| InitError::lock(&self.path, io::Error::from(errno)))?;
                Ok(LockGuard::new(self.path.clone(), flock))
            }
            LockMode::Fail => self.try_acquire()?.ok_or_else(|| {
                InitError::lock(
                    &self.path,
                    io::Error::new(io::ErrorKind::WouldBlock, "lock held by another process"),
                )
            }),
        }
    }

    /// Take the lock without waiting; `None` when another holder exists.
    pub fn try_acquire(&self) -> Result<Option<LockGuard>, InitError> {
        let file = self.open()?;
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Some(LockGuard::new(self.path.clone(), flock))),
            Err((_, Errno::EWOULDBLOCK)) => Ok(None),
            Err((_, errno)) => Err(InitError::lock(&self.path, io::Error::from(errno))),
        }
    }

    fn open(&self) -> Result<File, InitError> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)
            .map_err(|err| InitError::lock(&self.path, err))
    }
}

/// Exclusive ownership of a [`ProcessLock`]; released on drop.
pub struct LockGuard {
    path: PathBuf,
    flock: Option<Flock<File>>,
}

impl LockGuard {
    fn new(path: PathBuf, flock: Flock<File>) -> Self {
        debug!("acquired lock {}", path.display());
        Self {
            path,
            flock: Some(flock),
        }
    }

    /// Lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("path", &self.path)
            .field("held", &self.flock.is_some())
            .finish()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(flock) = self.flock.take() {
            if let Err((_, errno)) = flock.unlock() {
                warn!("unlock {} failed: {errno}", self.path.display());
            }
        }
        debug!("released lock {}", self.path.display());
    }
}

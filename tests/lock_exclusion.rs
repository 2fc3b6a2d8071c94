// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate that concurrent setup and clean never overlap on one lock path.
// Author: Lukas Bower

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use platform_init::platform::{PlatformDump, Priority};
use platform_init::{CleanOptions, LockMode, Orchestrator, Platform, RuntimeConfig, SetupOptions};
use tempfile::TempDir;

type Spans = Arc<Mutex<Vec<(Instant, Instant)>>>;

/// Platform whose critical sections take a while and are recorded as spans.
struct SlowPlatform {
    spans: Spans,
    hold: Duration,
}

impl SlowPlatform {
    fn busy(&self) -> Result<()> {
        let start = Instant::now();
        thread::sleep(self.hold);
        self.spans.lock().unwrap().push((start, Instant::now()));
        Ok(())
    }
}

impl Platform for SlowPlatform {
    fn name(&self) -> &str {
        "slow"
    }

    fn setup(&mut self, priority: Priority) -> Result<()> {
        match priority {
            Priority::Default => self.busy(),
            Priority::Background => Ok(()),
        }
    }

    fn clean(&mut self) -> Result<()> {
        self.busy()
    }

    fn reset_in(&mut self) -> Result<()> {
        Ok(())
    }

    fn reset_out(&mut self) -> Result<()> {
        Ok(())
    }

    fn wait_for_it(&mut self) -> Result<()> {
        Ok(())
    }

    fn dump(&self) -> Result<PlatformDump> {
        anyhow::bail!("not described")
    }
}

fn orchestrator(lock_path: PathBuf) -> Orchestrator {
    let config = RuntimeConfig {
        lock_path,
        lock_mode: LockMode::Block,
        ..RuntimeConfig::default()
    };
    Orchestrator::new(&config).with_privilege_probe(|| true)
}

#[test]
fn concurrent_setup_and_clean_are_serialised() -> Result<()> {
    let dir = TempDir::new()?;
    let lock_path = dir.path().join("platinit.lock");
    let spans: Spans = Arc::default();
    let hold = Duration::from_millis(150);

    let workers: Vec<_> = (0..4)
        .map(|index| {
            let lock_path = lock_path.clone();
            let spans = Arc::clone(&spans);
            thread::spawn(move || -> Result<()> {
                let orchestrator = orchestrator(lock_path);
                let mut platform = SlowPlatform { spans, hold };
                if index % 2 == 0 {
                    orchestrator.setup(&mut platform, SetupOptions::default())?;
                } else {
                    orchestrator.clean(&mut platform, CleanOptions::default())?;
                }
                Ok(())
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked")?;
    }

    let mut spans = spans.lock().unwrap().clone();
    assert_eq!(spans.len(), 4);
    spans.sort_by_key(|(start, _)| *start);
    for pair in spans.windows(2) {
        assert!(
            pair[0].1 <= pair[1].0,
            "critical sections overlapped: {:?}",
            pair
        );
    }
    Ok(())
}

// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate reset intents, precedence and toggle timing.
// Author: Lukas Bower

use std::time::Duration;

use anyhow::Result;
use platform_init::platform::{Call, SimulatedPlatform};
use platform_init::reset::apply_reset;
use platform_init::{ResetFlags, ResetIntent};

#[test]
fn toggle_resets_in_then_waits_then_out() -> Result<()> {
    let delay = Duration::from_millis(200);
    let mut platform = SimulatedPlatform::default();
    let journal = platform.journal();

    apply_reset(&mut platform, Some(ResetIntent::Toggle(delay)))?;

    let records = journal.records();
    assert_eq!(
        records.iter().map(|r| r.call).collect::<Vec<_>>(),
        vec![Call::ResetIn, Call::ResetOut]
    );
    assert!(records[1].at.duration_since(records[0].at) >= delay);
    Ok(())
}

#[test]
fn single_direction_intents() -> Result<()> {
    let mut platform = SimulatedPlatform::default();
    let journal = platform.journal();

    apply_reset(&mut platform, Some(ResetIntent::In))?;
    apply_reset(&mut platform, Some(ResetIntent::Out))?;

    assert_eq!(journal.calls(), vec![Call::ResetIn, Call::ResetOut]);
    Ok(())
}

#[test]
fn no_intent_is_a_no_op() -> Result<()> {
    let mut platform = SimulatedPlatform::default();
    let journal = platform.journal();

    apply_reset(&mut platform, ResetIntent::from_flags(&ResetFlags::default()))?;

    assert!(journal.calls().is_empty());
    Ok(())
}

#[test]
fn combined_flags_honour_out_first() -> Result<()> {
    let mut platform = SimulatedPlatform::default();
    let journal = platform.journal();
    let flags = ResetFlags {
        out: true,
        put_in: true,
        toggle: true,
        delay: Duration::from_secs(5),
    };

    apply_reset(&mut platform, ResetIntent::from_flags(&flags))?;

    assert_eq!(journal.calls(), vec![Call::ResetOut]);
    Ok(())
}

#[test]
fn toggle_failure_skips_reset_out() {
    let mut platform = SimulatedPlatform::default().failing_on(Call::ResetIn);
    let journal = platform.journal();

    let result = apply_reset(
        &mut platform,
        Some(ResetIntent::Toggle(Duration::from_millis(10))),
    );

    assert!(result.is_err());
    assert_eq!(journal.calls(), vec![Call::ResetIn]);
}

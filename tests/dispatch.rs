// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate command routing through the dispatcher.
// Author: Lukas Bower

use std::fs;

use anyhow::Result;
use platform_init::platform::{Call, SimulatedPlatform};
use platform_init::{
    CommandInvocation, Dispatcher, InitError, Orchestrator, PlatformRegistry, Priority,
    RuntimeConfig,
};
use tempfile::TempDir;

fn simulation(dir: &TempDir) -> RuntimeConfig {
    RuntimeConfig {
        simulation: true,
        platform: Some("simulated".to_owned()),
        lock_path: dir.path().join("platinit.lock"),
        ..RuntimeConfig::default()
    }
}

fn run(dispatcher: &Dispatcher, invocation: &CommandInvocation) -> Result<String> {
    let mut out = Vec::new();
    dispatcher.run(invocation, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn unknown_command_is_rejected_without_touching_the_platform() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = Dispatcher::new(simulation(&dir), PlatformRegistry::builtin());
    let mut platform = SimulatedPlatform::default();
    let journal = platform.journal();
    let mut out = Vec::new();

    let err = dispatcher
        .dispatch(
            &CommandInvocation::new("frobnicate"),
            Some(&mut platform),
            &mut out,
        )
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InitError>(),
        Some(InitError::UnknownCommand(name)) if name == "frobnicate"
    ));
    assert!(journal.calls().is_empty());
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn status_is_unimplemented() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = Dispatcher::new(simulation(&dir), PlatformRegistry::builtin());

    let err = run(&dispatcher, &CommandInvocation::new("status")).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InitError>(),
        Some(InitError::Unimplemented("status"))
    ));
    Ok(())
}

#[test]
fn platforms_lists_the_registry() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = Dispatcher::new(simulation(&dir), PlatformRegistry::builtin());

    let listing = run(&dispatcher, &CommandInvocation::new("platforms"))?;

    assert!(listing.lines().any(|line| line.starts_with("simulated")));
    Ok(())
}

#[test]
fn syseeprom_in_simulation_prints_fixed_inventory() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = Dispatcher::new(simulation(&dir), PlatformRegistry::builtin());

    let inventory = run(&dispatcher, &CommandInvocation::new("syseeprom"))?;

    assert!(inventory.lines().any(|line| line == "SKU: SIM-0001"));
    Ok(())
}

#[test]
fn syseeprom_reads_the_inventory_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("prefdl");
    fs::write(&path, "SKU: DCS-7050\nSerialNumber: JPE123\n")?;
    let config = RuntimeConfig {
        inventory_path: path,
        ..RuntimeConfig::default()
    };
    let dispatcher = Dispatcher::new(config, PlatformRegistry::builtin());

    let inventory = run(&dispatcher, &CommandInvocation::new("syseeprom"))?;

    assert_eq!(inventory, "SKU: DCS-7050\nSerialNumber: JPE123\n");
    Ok(())
}

#[test]
fn dump_prints_platform_json() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = Dispatcher::new(simulation(&dir), PlatformRegistry::builtin());

    let dump = run(&dispatcher, &CommandInvocation::new("dump"))?;

    let value: serde_json::Value = serde_json::from_str(&dump)?;
    assert_eq!(value["name"], "simulated");
    assert!(value["drivers"].as_array().is_some_and(|d| !d.is_empty()));
    Ok(())
}

#[test]
fn platform_commands_need_a_platform() -> Result<()> {
    let dir = TempDir::new()?;
    let config = RuntimeConfig {
        platform: None,
        ..simulation(&dir)
    };
    let dispatcher = Dispatcher::new(config, PlatformRegistry::builtin());

    let err = run(&dispatcher, &CommandInvocation::new("setup")).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InitError>(),
        Some(InitError::MissingPlatform("setup"))
    ));
    Ok(())
}

#[test]
fn unknown_platform_is_reported() -> Result<()> {
    let dir = TempDir::new()?;
    let config = RuntimeConfig {
        platform: Some("nonesuch".to_owned()),
        ..simulation(&dir)
    };
    let dispatcher = Dispatcher::new(config, PlatformRegistry::builtin());

    let err = run(&dispatcher, &CommandInvocation::new("dump")).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InitError>(),
        Some(InitError::UnknownPlatform(name)) if name == "nonesuch"
    ));
    Ok(())
}

#[test]
fn setup_and_reset_flags_reach_the_platform() -> Result<()> {
    let dir = TempDir::new()?;
    let config = simulation(&dir);
    let orchestrator = Orchestrator::new(&config);
    let dispatcher =
        Dispatcher::new(config, PlatformRegistry::builtin()).with_orchestrator(orchestrator);
    let mut platform = SimulatedPlatform::default();
    let journal = platform.journal();
    let mut out = Vec::new();

    let setup = CommandInvocation {
        reset: true,
        debug: true,
        ..CommandInvocation::new("setup")
    };
    dispatcher.dispatch(&setup, Some(&mut platform), &mut out)?;
    let mut clean = CommandInvocation {
        reset: true,
        ..CommandInvocation::new("clean")
    };
    dispatcher.dispatch(&clean, Some(&mut platform), &mut out)?;
    clean.action = "reset".to_owned();
    clean.reset_flags.out = true;
    dispatcher.dispatch(&clean, Some(&mut platform), &mut out)?;

    assert_eq!(
        journal.calls(),
        vec![
            Call::SetDebug(true),
            Call::Setup(Priority::Default),
            Call::ResetOut,
            Call::Setup(Priority::Background),
            Call::WaitForIt,
            Call::ResetIn,
            Call::Clean,
            Call::ResetOut,
        ]
    );
    Ok(())
}

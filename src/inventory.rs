// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load key/value system inventory data for the syseeprom command.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Inventory fields keyed by name.
pub type Inventory = BTreeMap<String, String>;

/// Parse `key: value` lines. Blank lines and `#` comments are skipped.
pub fn parse_inventory(text: &str) -> Result<Inventory> {
    let mut inventory = Inventory::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| anyhow!("line {}: expected 'key: value'", index + 1))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("line {}: empty key", index + 1));
        }
        inventory.insert(key.to_owned(), value.trim().to_owned());
    }
    Ok(inventory)
}

/// Read the inventory file at `path`.
pub fn read_inventory(path: &Path) -> Result<Inventory> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read inventory {}", path.display()))?;
    parse_inventory(&text).with_context(|| format!("parse inventory {}", path.display()))
}

/// Fixed inventory reported in simulation mode.
#[must_use]
pub fn simulated_inventory() -> Inventory {
    [
        ("SKU", "SIM-0001"),
        ("SerialNumber", "SIM0000000000"),
        ("MAC", "00:00:5e:00:53:00"),
        ("HwApi", "01.00"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect()
}

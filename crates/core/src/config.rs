// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Core-level knobs. Every field has a default, so a YAML document only
/// needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Enable the instruction decode cache for the CPU core.
    pub decode_cache_enabled: bool,
    /// Value of the read-only CPUID register.
    pub cpuid: u32,
    /// Value of the read-only SysTick CALIB register.
    pub systick_calib: u32,
    /// CCR after reset (STKALIGN set).
    pub ccr_reset: u32,
    /// Overrides the initial MSP taken from the vector table.
    pub initial_sp: Option<u32>,
    /// Overrides the reset handler taken from the vector table.
    pub entry_point: Option<u32>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            decode_cache_enabled: true,
            cpuid: 0x410F_C241, // Cortex-M4 r0p1
            systick_calib: 0x4000_0000, // No reference clock, no skew
            ccr_reset: 0x200,
            initial_sp: None,
            entry_point: None,
        }
    }
}

impl CoreConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse core configuration YAML")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read core configuration at {:?}", path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid core configuration in {:?}", path))
    }
}

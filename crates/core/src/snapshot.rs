// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::registers::state::CoreState;
use crate::registers::SpecialRegisterId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Raw processor storage: the sixteen core slots (slot 13 unused, the PC
/// holding the address of the next instruction) and every persistent
/// special register in `SpecialRegisterId` order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub registers: Vec<u32>,
    pub special_registers: Vec<u32>,
}

impl CpuSnapshot {
    pub fn capture<S: CoreState>(state: &S) -> Self {
        Self {
            registers: state.core().to_vec(),
            special_registers: state.special().to_vec(),
        }
    }

    /// Copies the snapshot into `state`. Missing trailing entries keep
    /// their current value.
    pub fn restore<S: CoreState>(&self, state: &mut S) {
        if self.registers.len() != 16
            || self.special_registers.len() != SpecialRegisterId::PERSISTENT_COUNT
        {
            tracing::warn!(
                "snapshot shape mismatch: {} core / {} special registers",
                self.registers.len(),
                self.special_registers.len()
            );
        }
        for (slot, value) in state.core_mut().iter_mut().zip(&self.registers) {
            *slot = *value;
        }
        for (slot, value) in state.special_mut().iter_mut().zip(&self.special_registers) {
            *slot = *value;
        }
    }

    pub fn special(&self, id: SpecialRegisterId) -> Option<u32> {
        id.slot()
            .and_then(|slot| self.special_registers.get(slot).copied())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize CPU snapshot")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse CPU snapshot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::state::CpuState;

    #[test]
    fn test_capture_restore_via_json() {
        let mut state = CpuState::new();
        state.core_mut()[0] = 42;
        state.core_mut()[15] = 0x0800_0100;
        state.special_mut()[SpecialRegisterId::SpMain as usize] = 0x2000_1000;

        let json = CpuSnapshot::capture(&state).to_json().unwrap();
        let snap = CpuSnapshot::from_json(&json).unwrap();
        assert_eq!(snap.special(SpecialRegisterId::SpMain), Some(0x2000_1000));

        let mut restored = CpuState::new();
        snap.restore(&mut restored);
        assert_eq!(restored, state);
    }

    #[test]
    fn test_short_snapshot_keeps_remaining_values() {
        let mut state = CpuState::new();
        let snap = CpuSnapshot {
            registers: vec![7],
            special_registers: vec![],
        };
        snap.restore(&mut state);
        assert_eq!(state.core()[0], 7);
        assert_eq!(state.special()[SpecialRegisterId::Cpuid as usize], 0x410F_C241);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(CpuSnapshot::from_json("{\"registers\": 1}").is_err());
    }
}

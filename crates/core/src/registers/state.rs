// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{ccr, SpecialRegisterId, SysCtrl};
use crate::config::CoreConfig;

pub const SPECIAL_SLOTS: usize = SpecialRegisterId::PERSISTENT_COUNT;

/// Storage behind the register-access engine.
///
/// Slot 13 of the core array is not used: the stack pointer lives in the
/// banked `SpMain`/`SpProcess` special registers.
pub trait CoreState {
    fn core(&self) -> &[u32; 16];
    fn core_mut(&mut self) -> &mut [u32; 16];
    fn special(&self) -> &[u32; SPECIAL_SLOTS];
    fn special_mut(&mut self) -> &mut [u32; SPECIAL_SLOTS];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuState {
    core: [u32; 16],
    special: [u32; SPECIAL_SLOTS],
}

impl CpuState {
    pub fn new() -> Self {
        Self::from_config(&CoreConfig::default())
    }

    /// Reset values: thread mode, privileged, MSP selected, Thumb state.
    pub fn from_config(config: &CoreConfig) -> Self {
        let mut special = [0; SPECIAL_SLOTS];
        special[SpecialRegisterId::SysCtrl as usize] = SysCtrl::THUMB.bits();
        special[SpecialRegisterId::Ccr as usize] = config.ccr_reset & ccr::WRITABLE;
        special[SpecialRegisterId::SysTickCalib as usize] = config.systick_calib;
        special[SpecialRegisterId::Cpuid as usize] = config.cpuid;
        Self {
            core: [0; 16],
            special,
        }
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreState for CpuState {
    #[inline(always)]
    fn core(&self) -> &[u32; 16] {
        &self.core
    }

    #[inline(always)]
    fn core_mut(&mut self) -> &mut [u32; 16] {
        &mut self.core
    }

    #[inline(always)]
    fn special(&self) -> &[u32; SPECIAL_SLOTS] {
        &self.special
    }

    #[inline(always)]
    fn special_mut(&mut self) -> &mut [u32; SPECIAL_SLOTS] {
        &mut self.special
    }
}

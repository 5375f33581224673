// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod access;
pub mod it;
pub mod operand;
pub mod state;
pub mod strategy;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum RegisterId {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    Sp,
    Lr,
    Pc,
}

impl RegisterId {
    pub const ALL: [RegisterId; 16] = [
        RegisterId::R0,
        RegisterId::R1,
        RegisterId::R2,
        RegisterId::R3,
        RegisterId::R4,
        RegisterId::R5,
        RegisterId::R6,
        RegisterId::R7,
        RegisterId::R8,
        RegisterId::R9,
        RegisterId::R10,
        RegisterId::R11,
        RegisterId::R12,
        RegisterId::Sp,
        RegisterId::Lr,
        RegisterId::Pc,
    ];

    /// Only the low four bits of `index` are significant.
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 0xF) as usize]
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        const NAMES: [&str; 16] = [
            "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9", "R10", "R11", "R12", "SP",
            "LR", "PC",
        ];
        NAMES[self.index()]
    }
}

/// System registers outside the general purpose file.
///
/// Variants up to and including `Cpuid` are stored in the processor state.
/// `Epsr`, `Xpsr` and `Control` are composed from stored registers on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpecialRegisterId {
    SysCtrl = 0,
    Apsr,
    Istate,
    Ipsr,
    Vtor,
    Ccr,
    Cfsr,
    Bfar,
    SpMain,
    SpProcess,
    Primask,
    Faultmask,
    Basepri,
    SysTickCsr,
    SysTickRvr,
    SysTickCvr,
    SysTickCalib,
    Cpuid,
    Epsr,
    Xpsr,
    Control,
}

impl SpecialRegisterId {
    pub const PERSISTENT_COUNT: usize = SpecialRegisterId::Cpuid as usize + 1;

    pub const PERSISTENT: [SpecialRegisterId; Self::PERSISTENT_COUNT] = [
        SpecialRegisterId::SysCtrl,
        SpecialRegisterId::Apsr,
        SpecialRegisterId::Istate,
        SpecialRegisterId::Ipsr,
        SpecialRegisterId::Vtor,
        SpecialRegisterId::Ccr,
        SpecialRegisterId::Cfsr,
        SpecialRegisterId::Bfar,
        SpecialRegisterId::SpMain,
        SpecialRegisterId::SpProcess,
        SpecialRegisterId::Primask,
        SpecialRegisterId::Faultmask,
        SpecialRegisterId::Basepri,
        SpecialRegisterId::SysTickCsr,
        SpecialRegisterId::SysTickRvr,
        SpecialRegisterId::SysTickCvr,
        SpecialRegisterId::SysTickCalib,
        SpecialRegisterId::Cpuid,
    ];

    /// Slot in the persistent special register array, if stored.
    pub const fn slot(self) -> Option<usize> {
        let index = self as usize;
        if index < Self::PERSISTENT_COUNT {
            Some(index)
        } else {
            None
        }
    }
}

bitflags! {
    /// Application program status register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Apsr: u32 {
        const N = 1 << 31;
        const Z = 1 << 30;
        const C = 1 << 29;
        const V = 1 << 28;
        const Q = 1 << 27;
        const GE = 0xF << 16;
    }
}

impl Apsr {
    pub const NZCV: Apsr = Apsr::N.union(Apsr::Z).union(Apsr::C).union(Apsr::V);
}

bitflags! {
    /// Internal execution state that backs EPSR.T, IPSR mode and CONTROL.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SysCtrl: u32 {
        const THUMB = 1 << 0;
        const HANDLER = 1 << 1;
        const NPRIV = 1 << 2;
        const SPSEL = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Control: u32 {
        const NPRIV = 1 << 0;
        const SPSEL = 1 << 1;
    }
}

pub mod epsr {
    pub const T: u32 = 1 << 24;
    pub const IT_LOW_SHIFT: u32 = 25;
    pub const IT_HIGH_SHIFT: u32 = 10;
}

pub mod ccr {
    pub const NONBASETHRDENA: u32 = 1 << 0;
    pub const USERSETMPEND: u32 = 1 << 1;
    pub const UNALIGN_TRP: u32 = 1 << 3;
    pub const DIV_0_TRP: u32 = 1 << 4;
    pub const BFHFNMIGN: u32 = 1 << 8;
    pub const STKALIGN: u32 = 1 << 9;
    pub const WRITABLE: u32 =
        NONBASETHRDENA | USERSETMPEND | UNALIGN_TRP | DIV_0_TRP | BFHFNMIGN | STKALIGN;
}

pub mod systick {
    pub const ENABLE: u32 = 1 << 0;
    pub const TICKINT: u32 = 1 << 1;
    pub const CLKSOURCE: u32 = 1 << 2;
    pub const COUNTFLAG: u32 = 1 << 16;
    pub const RELOAD_MASK: u32 = 0x00FF_FFFF;
}

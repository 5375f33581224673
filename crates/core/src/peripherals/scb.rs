// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{merge, RegisterBlock};
use crate::registers::access::SpecialRegisters;
use crate::registers::SpecialRegisterId;
use crate::{AccessFault, ReadResult};

/// AIRCR read value: VECTKEYSTAT with every other field at reset.
pub const AIRCR_RESET: u32 = 0xFA05_0000;

/// System Control Block (SCB)
/// Standard address: 0xE000_ED00
#[derive(Debug, Clone, Copy, Default)]
pub struct Scb;

impl Scb {
    fn register(offset: u32) -> Option<SpecialRegisterId> {
        match offset {
            0x00 => Some(SpecialRegisterId::Cpuid),
            0x08 => Some(SpecialRegisterId::Vtor),
            0x14 => Some(SpecialRegisterId::Ccr),
            0x28 => Some(SpecialRegisterId::Cfsr),
            0x38 => Some(SpecialRegisterId::Bfar),
            _ => None,
        }
    }
}

impl RegisterBlock for Scb {
    const BASE: u32 = 0xE000_ED00;
    const SIZE: u32 = 0x40;

    fn read_reg<P: SpecialRegisters + ?Sized>(cpu: &mut P, offset: u32) -> ReadResult<u32> {
        match offset {
            // VECTACTIVE
            0x04 => Ok(cpu.read_special(SpecialRegisterId::Ipsr)? & 0x1FF),
            0x0C => Ok(AIRCR_RESET),
            _ => match Self::register(offset) {
                Some(id) => cpu.read_special(id),
                None => Err(AccessFault::UnmappedSystemRegister(Self::BASE + offset)),
            },
        }
    }

    fn write_reg<P: SpecialRegisters + ?Sized>(
        cpu: &mut P,
        offset: u32,
        value: u32,
        mask: u32,
    ) -> ReadResult<()> {
        match offset {
            // Pend and reset requests are left to the exception model
            0x04 | 0x0C => Ok(()),
            0x28 => {
                let old = cpu.read_special(SpecialRegisterId::Cfsr)?;
                cpu.write_special(SpecialRegisterId::Cfsr, old & !(value & mask))
            }
            _ => match Self::register(offset) {
                Some(id) if mask == 0xFFFF_FFFF => cpu.write_special(id, value),
                Some(id) => {
                    let old = cpu.read_special(id)?;
                    cpu.write_special(id, merge(old, value, mask))
                }
                None => Err(AccessFault::UnmappedSystemRegister(Self::BASE + offset)),
            },
        }
    }
}

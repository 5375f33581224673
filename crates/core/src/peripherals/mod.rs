// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Memory-mapped system register blocks of the private peripheral bus.
//!
//! The blocks hold no state of their own: every register is a special
//! register of the core, so loads and stores obey the same legality rules
//! as MRS/MSR and direct engine access.

pub mod scb;
pub mod systick;

use crate::registers::access::SpecialRegisters;
use crate::registers::SpecialRegisterId;
use crate::{AccessFault, ReadResult};

pub use scb::Scb;
pub use systick::Systick;

/// A block of word-sized registers addressed by offset.
///
/// `mask` selects the byte lanes touched by the access; a word access
/// passes `0xFFFF_FFFF`.
pub trait RegisterBlock {
    const BASE: u32;
    const SIZE: u32;

    fn read_reg<P: SpecialRegisters + ?Sized>(cpu: &mut P, offset: u32) -> ReadResult<u32>;

    fn write_reg<P: SpecialRegisters + ?Sized>(
        cpu: &mut P,
        offset: u32,
        value: u32,
        mask: u32,
    ) -> ReadResult<()>;

    fn contains(address: u32) -> bool {
        address >= Self::BASE && address - Self::BASE < Self::SIZE
    }
}

pub fn is_system_register(address: u32) -> bool {
    Systick::contains(address) || Scb::contains(address)
}

/// Byte lane shift and mask of an access, rejecting accesses that straddle
/// two registers.
fn lane(address: u32, size: u8) -> ReadResult<(u32, u32)> {
    let byte = address & 3;
    if byte + size as u32 > 4 {
        return Err(AccessFault::UnmappedSystemRegister(address));
    }
    let shift = byte * 8;
    let mask = match size {
        1 => 0xFF,
        2 => 0xFFFF,
        _ => 0xFFFF_FFFF,
    };
    Ok((shift, mask << shift))
}

pub fn read<P: SpecialRegisters + ?Sized>(
    cpu: &mut P,
    address: u32,
    size: u8,
) -> ReadResult<u32> {
    let (shift, mask) = lane(address, size)?;
    let word = address & !3;
    let value = if Systick::contains(word) {
        Systick::read_reg(cpu, word - Systick::BASE)?
    } else if Scb::contains(word) {
        Scb::read_reg(cpu, word - Scb::BASE)?
    } else {
        return Err(AccessFault::UnmappedSystemRegister(address));
    };
    Ok((value & mask) >> shift)
}

pub fn write<P: SpecialRegisters + ?Sized>(
    cpu: &mut P,
    address: u32,
    size: u8,
    value: u32,
) -> ReadResult<()> {
    let (shift, mask) = lane(address, size)?;
    let word = address & !3;
    let value = value << shift;
    if Systick::contains(word) {
        Systick::write_reg(cpu, word - Systick::BASE, value, mask)
    } else if Scb::contains(word) {
        Scb::write_reg(cpu, word - Scb::BASE, value, mask)
    } else {
        Err(AccessFault::UnmappedSystemRegister(address))
    }
}

/// Whether any of `words` consecutive words from `start` lands in a block.
pub fn spans_system_registers(start: u32, words: u32) -> bool {
    (0..words).any(|i| is_system_register(start.wrapping_add(4 * i)))
}

/// Special registers a block access can change, read side effects included.
const BACKED: [SpecialRegisterId; 7] = [
    SpecialRegisterId::SysTickCsr,
    SpecialRegisterId::SysTickRvr,
    SpecialRegisterId::SysTickCvr,
    SpecialRegisterId::Vtor,
    SpecialRegisterId::Ccr,
    SpecialRegisterId::Cfsr,
    SpecialRegisterId::Bfar,
];

/// Saved values of the block-backed registers. Multi-word transfers take one
/// before touching a block and restore it when a later word faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint([u32; BACKED.len()]);

impl Checkpoint {
    pub fn take<P: SpecialRegisters + ?Sized>(cpu: &P) -> ReadResult<Self> {
        let mut values = [0; BACKED.len()];
        for (value, id) in values.iter_mut().zip(BACKED) {
            *value = cpu.read_special(id)?;
        }
        Ok(Self(values))
    }

    pub fn restore<P: SpecialRegisters + ?Sized>(&self, cpu: &mut P) -> ReadResult<()> {
        for (id, value) in BACKED.into_iter().zip(self.0) {
            cpu.write_special(id, value)?;
        }
        Ok(())
    }
}

/// Merges the written lanes into the current register value.
pub(crate) fn merge(old: u32, value: u32, mask: u32) -> u32 {
    (old & !mask) | (value & mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::access::RegisterAccess;
    use crate::registers::systick;

    #[test]
    fn test_routing() {
        assert!(is_system_register(0xE000_E010));
        assert!(is_system_register(0xE000_E01C));
        assert!(!is_system_register(0xE000_E020));
        assert!(is_system_register(0xE000_ED08));
        assert!(!is_system_register(0x2000_0000));
    }

    #[test]
    fn test_byte_lanes() {
        let mut cpu = RegisterAccess::new();
        write(&mut cpu, 0xE000_ED08, 4, 0x0800_0400).unwrap();
        assert_eq!(read(&mut cpu, 0xE000_ED0B, 1), Ok(0x08));
        assert_eq!(read(&mut cpu, 0xE000_ED0A, 2), Ok(0x0800));

        write(&mut cpu, 0xE000_ED09, 1, 0x12).unwrap();
        assert_eq!(
            cpu.read_special(SpecialRegisterId::Vtor),
            Ok(0x0800_1200)
        );
    }

    #[test]
    fn test_straddling_and_unknown_offsets() {
        let mut cpu = RegisterAccess::new();
        assert_eq!(
            read(&mut cpu, 0xE000_ED0A, 4),
            Err(AccessFault::UnmappedSystemRegister(0xE000_ED0A))
        );
        assert_eq!(
            read(&mut cpu, 0xE000_ED10, 4),
            Err(AccessFault::UnmappedSystemRegister(0xE000_ED10))
        );
    }

    #[test]
    fn test_span_detection() {
        assert!(spans_system_registers(0xE000_E008, 3));
        assert!(!spans_system_registers(0xE000_E008, 2));
        assert!(spans_system_registers(0xE000_ED3C, 1));
        assert!(!spans_system_registers(0x2000_0000, 16));
    }

    #[test]
    fn test_checkpoint_restores_read_side_effects() {
        let mut cpu = RegisterAccess::new();
        cpu.write_special(
            SpecialRegisterId::SysTickCsr,
            systick::ENABLE | systick::COUNTFLAG,
        )
        .unwrap();
        write(&mut cpu, 0xE000_ED08, 4, 0x0800_0000).unwrap();
        let checkpoint = Checkpoint::take(&cpu).unwrap();

        read(&mut cpu, 0xE000_E010, 4).unwrap();
        write(&mut cpu, 0xE000_ED08, 4, 0x2000_0000).unwrap();
        assert_ne!(Checkpoint::take(&cpu).unwrap(), checkpoint);

        checkpoint.restore(&mut cpu).unwrap();
        assert_eq!(Checkpoint::take(&cpu).unwrap(), checkpoint);
        assert_eq!(
            read(&mut cpu, 0xE000_E010, 4),
            Ok(systick::ENABLE | systick::COUNTFLAG)
        );
    }
}

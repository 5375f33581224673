// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::commit;
use crate::registers::access::Processor;
use crate::registers::operand::RArg;
use crate::SimResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendKind {
    Sxtb,
    Sxth,
    Uxtb,
    Uxth,
}

/// Sign/zero extend of a rotated register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extend {
    pub kind: ExtendKind,
    pub d: RArg,
    pub m: RArg,
    pub rotation: u8,
}

impl Extend {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let rotated = cpu
            .read_register(self.m)
            .rotate_right(self.rotation as u32);
        let extended = match self.kind {
            ExtendKind::Sxtb => rotated as u8 as i8 as i32 as u32,
            ExtendKind::Sxth => rotated as u16 as i16 as i32 as u32,
            ExtendKind::Uxtb => rotated & 0xFF,
            ExtendKind::Uxth => rotated & 0xFFFF,
        };
        commit(cpu, self.d, extended, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitFieldKind {
    Bfi,
    Bfc,
    Sbfx,
    Ubfx,
}

/// Bit-field insert/clear/extract. `lsb + width <= 32` and `width >= 1`
/// are checked when the operation is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub kind: BitFieldKind,
    pub d: RArg,
    pub n: RArg,
    pub lsb: u8,
    pub width: u8,
}

fn low_mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

impl BitField {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let lsb = self.lsb as u32;
        let width = self.width as u32;
        let field = low_mask(width) << lsb;
        let value = match self.kind {
            BitFieldKind::Bfi => {
                let src = cpu.read_register(self.n);
                (cpu.read_register(self.d) & !field) | ((src << lsb) & field)
            }
            BitFieldKind::Bfc => cpu.read_register(self.d) & !field,
            BitFieldKind::Ubfx => (cpu.read_register(self.n) >> lsb) & low_mask(width),
            BitFieldKind::Sbfx => {
                let top = 32 - lsb - width;
                (((cpu.read_register(self.n) << top) as i32) >> (top + lsb)) as u32
            }
        };
        commit(cpu, self.d, value, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitOpKind {
    Clz,
    Rbit,
    Rev,
    Rev16,
    Revsh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitOp {
    pub kind: BitOpKind,
    pub d: RArg,
    pub m: RArg,
}

impl BitOp {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let m = cpu.read_register(self.m);
        let value = match self.kind {
            BitOpKind::Clz => m.leading_zeros(),
            BitOpKind::Rbit => m.reverse_bits(),
            BitOpKind::Rev => m.swap_bytes(),
            BitOpKind::Rev16 => ((m & 0x00FF_00FF) << 8) | ((m & 0xFF00_FF00) >> 8),
            BitOpKind::Revsh => (m as u16).swap_bytes() as i16 as i32 as u32,
        };
        commit(cpu, self.d, value, None)
    }
}

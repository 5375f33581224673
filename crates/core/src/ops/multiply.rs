// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{commit, nzcv, InstrFlags};
use crate::registers::access::Processor;
use crate::registers::operand::RArg;
use crate::registers::{ccr, Apsr, SpecialRegisterId};
use crate::{SimResult, SimulationError, UsageFault};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MulKind {
    Mul,
    Mla,
    Mls,
}

/// 32-bit multiply. The flag-setting form only updates N and Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiply {
    pub kind: MulKind,
    pub d: RArg,
    pub n: RArg,
    pub m: RArg,
    pub a: RArg,
    pub flags: InstrFlags,
}

impl Multiply {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let product = cpu
            .read_register(self.n)
            .wrapping_mul(cpu.read_register(self.m));
        let value = match self.kind {
            MulKind::Mul => product,
            MulKind::Mla => product.wrapping_add(cpu.read_register(self.a)),
            MulKind::Mls => cpu.read_register(self.a).wrapping_sub(product),
        };
        let flags = self.flags.contains(InstrFlags::SET_FLAGS).then(|| {
            nzcv(
                apsr,
                value,
                apsr.contains(Apsr::C),
                apsr.contains(Apsr::V),
            )
        });
        commit(cpu, self.d, value, flags)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LongMulKind {
    Smull,
    Umull,
    Smlal,
    Umlal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongMultiply {
    pub kind: LongMulKind,
    pub dlo: RArg,
    pub dhi: RArg,
    pub n: RArg,
    pub m: RArg,
}

impl LongMultiply {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let n = cpu.read_register(self.n);
        let m = cpu.read_register(self.m);
        let accumulator =
            ((cpu.read_register(self.dhi) as u64) << 32) | cpu.read_register(self.dlo) as u64;
        let result = match self.kind {
            LongMulKind::Smull => (n as i32 as i64).wrapping_mul(m as i32 as i64) as u64,
            LongMulKind::Umull => (n as u64).wrapping_mul(m as u64),
            LongMulKind::Smlal => (n as i32 as i64)
                .wrapping_mul(m as i32 as i64)
                .wrapping_add(accumulator as i64) as u64,
            LongMulKind::Umlal => (n as u64)
                .wrapping_mul(m as u64)
                .wrapping_add(accumulator),
        };
        cpu.write_register(self.dlo, result as u32);
        cpu.write_register(self.dhi, (result >> 32) as u32);
        Ok(())
    }
}

/// SDIV/UDIV, rounding towards zero. Division by zero yields zero unless
/// CCR.DIV_0_TRP is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divide {
    pub signed: bool,
    pub d: RArg,
    pub n: RArg,
    pub m: RArg,
}

impl Divide {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let n = cpu.read_register(self.n);
        let m = cpu.read_register(self.m);
        let value = if m == 0 {
            if cpu.read_special(SpecialRegisterId::Ccr)? & ccr::DIV_0_TRP != 0 {
                return Err(SimulationError::UsageFault(UsageFault::DivideByZero));
            }
            0
        } else if self.signed {
            (n as i32).wrapping_div(m as i32) as u32
        } else {
            n / m
        };
        commit(cpu, self.d, value, None)
    }
}

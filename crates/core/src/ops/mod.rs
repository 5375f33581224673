// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Executable operations.
//!
//! Each operation reads every operand it needs before it writes anything, so
//! an error leaves the processor as it found it.

pub mod bits;
pub mod branch;
pub mod data;
pub mod memory;
pub mod mnemonic;
pub mod multiply;
pub mod system;

use crate::registers::access::Processor;
use crate::registers::operand::{PcArg, RArg, RegArg, SpArg};
use crate::registers::{Apsr, SpecialRegisterId};
use crate::{Bus, SimResult};
use bitflags::bitflags;

pub use bits::{BitField, BitFieldKind, BitOp, BitOpKind, Extend, ExtendKind};
pub use branch::{Branch, BranchExchange, BranchLink, CompareBranch, TableBranch};
pub use data::{
    Adr, ArithImm, ArithOp, ArithReg, LogicImm, LogicOp, LogicReg, MoveImm, MoveReg, MoveWide,
    Rrx, ShiftReg, TestImm, TestOp, TestReg,
};
pub use memory::{Access, BlockMode, LoadStore, LoadStoreDual, Multiple, Offset};
pub use mnemonic::Conditional;
pub use multiply::{Divide, LongMulKind, LongMultiply, MulKind, Multiply};
pub use system::{Cps, It, Mrs, Msr, SysmTarget};

bitflags! {
    /// Per-instruction options resolved at build time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstrFlags: u8 {
        const SET_FLAGS = 1 << 0;
        const INDEX = 1 << 1;
        const ADD = 1 << 2;
        const WBACK = 1 << 3;
        /// LDRT/STRT: the access is made as unprivileged code.
        const UNPRIV = 1 << 4;
    }
}

impl InstrFlags {
    pub fn set_flags(setflags: bool) -> Self {
        if setflags {
            InstrFlags::SET_FLAGS
        } else {
            InstrFlags::empty()
        }
    }

    /// Addressing mode of a load/store: pre-indexed, add offset, write back.
    pub fn addressing(index: bool, add: bool, wback: bool) -> Self {
        let mut flags = InstrFlags::empty();
        flags.set(InstrFlags::INDEX, index);
        flags.set(InstrFlags::ADD, add);
        flags.set(InstrFlags::WBACK, wback);
        flags
    }

    /// Plain offset addressing, `[Rn, #+imm]`.
    pub fn offset() -> Self {
        InstrFlags::INDEX | InstrFlags::ADD
    }
}

/// APSR with N and Z taken from `value` and C and V replaced.
pub(crate) fn nzcv(apsr: Apsr, value: u32, carry: bool, overflow: bool) -> Apsr {
    let mut next = apsr.difference(Apsr::NZCV);
    next.set(Apsr::N, value >> 31 != 0);
    next.set(Apsr::Z, value == 0);
    next.set(Apsr::C, carry);
    next.set(Apsr::V, overflow);
    next
}

/// Writes `value` to `d` and, when given, the new flags.
pub(crate) fn commit<P: Processor, D: RegArg>(
    cpu: &mut P,
    d: D,
    value: u32,
    flags: Option<Apsr>,
) -> SimResult<()> {
    cpu.write_register(d, value);
    if let Some(apsr) = flags {
        cpu.write_special(SpecialRegisterId::Apsr, apsr.bits())?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ArithImm(ArithImm),
    ArithSpImm(ArithImm<SpArg>),
    ArithReg(ArithReg),
    LogicImm(LogicImm),
    LogicReg(LogicReg),
    MoveImm(MoveImm),
    MoveReg(MoveReg),
    Rrx(Rrx),
    TestImm(TestImm),
    TestReg(TestReg),
    ShiftReg(ShiftReg),
    Adr(Adr),
    MoveWide(MoveWide),

    Multiply(Multiply),
    LongMultiply(LongMultiply),
    Divide(Divide),

    Extend(Extend),
    BitField(BitField),
    BitOp(BitOp),

    Branch(Branch),
    BranchLink(BranchLink),
    BranchExchange(BranchExchange),
    CompareBranch(CompareBranch),
    TableBranch(TableBranch),

    Load(LoadStore),
    LoadLiteral(LoadStore<PcArg>),
    Store(LoadStore),
    LoadDual(LoadStoreDual),
    StoreDual(LoadStoreDual),
    LoadMultiple(Multiple),
    StoreMultiple(Multiple),

    It(It),
    Mrs(Mrs),
    Msr(Msr),
    Cps(Cps),
    Nop,
    Breakpoint(u8),
    SupervisorCall(u8),
}

impl Operation {
    /// IT itself loads the IT state, so the step must not advance it.
    pub fn is_it(&self) -> bool {
        matches!(self, Operation::It(_))
    }

    pub fn execute<P: Processor, B: Bus + ?Sized>(&self, cpu: &mut P, bus: &mut B) -> SimResult<()> {
        match self {
            Operation::ArithImm(op) => op.execute(cpu),
            Operation::ArithSpImm(op) => op.execute(cpu),
            Operation::ArithReg(op) => op.execute(cpu),
            Operation::LogicImm(op) => op.execute(cpu),
            Operation::LogicReg(op) => op.execute(cpu),
            Operation::MoveImm(op) => op.execute(cpu),
            Operation::MoveReg(op) => op.execute(cpu),
            Operation::Rrx(op) => op.execute(cpu),
            Operation::TestImm(op) => op.execute(cpu),
            Operation::TestReg(op) => op.execute(cpu),
            Operation::ShiftReg(op) => op.execute(cpu),
            Operation::Adr(op) => op.execute(cpu),
            Operation::MoveWide(op) => op.execute(cpu),

            Operation::Multiply(op) => op.execute(cpu),
            Operation::LongMultiply(op) => op.execute(cpu),
            Operation::Divide(op) => op.execute(cpu),

            Operation::Extend(op) => op.execute(cpu),
            Operation::BitField(op) => op.execute(cpu),
            Operation::BitOp(op) => op.execute(cpu),

            Operation::Branch(op) => op.execute(cpu),
            Operation::BranchLink(op) => op.execute(cpu),
            Operation::BranchExchange(op) => op.execute(cpu),
            Operation::CompareBranch(op) => op.execute(cpu),
            Operation::TableBranch(op) => op.execute(cpu, bus),

            Operation::Load(op) => op.load(cpu, bus),
            Operation::LoadLiteral(op) => op.load(cpu, bus),
            Operation::Store(op) => op.store(cpu, bus),
            Operation::LoadDual(op) => op.load(cpu, bus),
            Operation::StoreDual(op) => op.store(cpu, bus),
            Operation::LoadMultiple(op) => op.load(cpu, bus),
            Operation::StoreMultiple(op) => op.store(cpu, bus),

            Operation::It(op) => op.execute(cpu),
            Operation::Mrs(op) => op.execute(cpu),
            Operation::Msr(op) => op.execute(cpu),
            Operation::Cps(op) => op.execute(cpu),
            Operation::Nop => Ok(()),
            Operation::Breakpoint(imm) => Err(crate::SimulationError::Breakpoint {
                address: cpu.instruction_address(),
                imm: *imm,
            }),
            Operation::SupervisorCall(imm) => Err(crate::SimulationError::SupervisorCall {
                address: cpu.instruction_address(),
                imm: *imm,
            }),
        }
    }
}

/// Convenience for builders: an encoded register operand.
pub(crate) fn reg(bits: u32) -> RArg {
    RArg::from_bits(bits)
}

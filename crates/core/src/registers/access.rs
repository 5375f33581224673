// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Register-access engine.
//!
//! Operations see the processor only through [`CoreRegisters`] and
//! [`SpecialRegisters`]. [`RegisterAccess`] implements both over a
//! [`CoreState`] and a [`RegisterOps`] strategy.

use super::operand::RegArg;
use super::state::{CoreState, CpuState};
use super::strategy::{ArchRegisterOps, RegisterOps};
use super::{Apsr, RegisterId, SpecialRegisterId, SysCtrl};
use crate::ReadResult;

/// Thumb pipeline offset applied to PC reads.
pub const PC_READ_OFFSET: u32 = 4;

pub trait CoreRegisters {
    /// Architectural read: the PC reads as the instruction address plus four.
    fn read_core(&self, id: RegisterId) -> u32;

    /// Architectural write: writing the PC is a branch (bit 0 is dropped).
    fn write_core(&mut self, id: RegisterId, value: u32);

    /// Address of the instruction being executed.
    fn instruction_address(&self) -> u32;

    /// Sets the next fetch address without any interworking check.
    fn branch_to(&mut self, address: u32);

    /// Moves the PC to the pending branch target, or past the instruction.
    fn retire(&mut self, instr_size: u32);

    #[inline(always)]
    fn read_register<A: RegArg>(&self, arg: A) -> u32 {
        self.read_core(arg.id())
    }

    #[inline(always)]
    fn write_register<A: RegArg>(&mut self, arg: A, value: u32) {
        self.write_core(arg.id(), value)
    }
}

pub trait SpecialRegisters {
    fn read_special(&self, id: SpecialRegisterId) -> ReadResult<u32>;
    fn write_special(&mut self, id: SpecialRegisterId, value: u32) -> ReadResult<()>;

    fn apsr(&self) -> ReadResult<Apsr> {
        self.read_special(SpecialRegisterId::Apsr)
            .map(Apsr::from_bits_retain)
    }

    fn sys_ctrl(&self) -> ReadResult<SysCtrl> {
        self.read_special(SpecialRegisterId::SysCtrl)
            .map(SysCtrl::from_bits_retain)
    }

    fn is_privileged(&self) -> ReadResult<bool> {
        let sys = self.sys_ctrl()?;
        Ok(sys.contains(SysCtrl::HANDLER) || !sys.contains(SysCtrl::NPRIV))
    }
}

/// Everything an operation may touch.
pub trait Processor: CoreRegisters + SpecialRegisters {}

impl<T: CoreRegisters + SpecialRegisters> Processor for T {}

#[derive(Debug, Clone)]
pub struct RegisterAccess<S = CpuState, O = ArchRegisterOps> {
    state: S,
    ops: O,
    pending_branch: Option<u32>,
}

impl RegisterAccess {
    pub fn new() -> Self {
        Self::with_parts(CpuState::new(), ArchRegisterOps)
    }
}

impl Default for RegisterAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CoreState, O: RegisterOps<S>> RegisterAccess<S, O> {
    pub fn with_parts(state: S, ops: O) -> Self {
        Self {
            state,
            ops,
            pending_branch: None,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Direct storage access, bypassing every legality rule. Used to
    /// restore snapshots.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Swaps in fresh storage, dropping any pending branch.
    pub fn replace_state(&mut self, state: S) -> S {
        self.pending_branch = None;
        std::mem::replace(&mut self.state, state)
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    pub fn into_parts(self) -> (S, O) {
        (self.state, self.ops)
    }

    /// Target written to the PC by the current instruction, if any.
    pub fn pending_branch(&self) -> Option<u32> {
        self.pending_branch
    }

    /// Places the PC directly, dropping any pending branch.
    pub fn set_instruction_address(&mut self, address: u32) {
        self.pending_branch = None;
        self.ops
            .write_register(&mut self.state, RegisterId::Pc, address & !1);
    }

    /// Raw read with no pipeline offset, for debuggers and snapshots.
    pub fn raw_register(&self, id: RegisterId) -> u32 {
        self.ops.read_register(&self.state, id)
    }

    /// Raw write with no branch semantics, for debuggers and snapshots.
    pub fn set_raw_register(&mut self, id: RegisterId, value: u32) {
        if id == RegisterId::Pc {
            self.set_instruction_address(value);
        } else {
            self.ops.write_register(&mut self.state, id, value);
        }
    }
}

impl<S: CoreState, O: RegisterOps<S>> CoreRegisters for RegisterAccess<S, O> {
    #[inline(always)]
    fn read_core(&self, id: RegisterId) -> u32 {
        let value = self.ops.read_register(&self.state, id);
        if id == RegisterId::Pc {
            value.wrapping_add(PC_READ_OFFSET)
        } else {
            value
        }
    }

    #[inline(always)]
    fn write_core(&mut self, id: RegisterId, value: u32) {
        if id == RegisterId::Pc {
            self.branch_to(value & !1);
        } else {
            self.ops.write_register(&mut self.state, id, value);
        }
    }

    #[inline(always)]
    fn instruction_address(&self) -> u32 {
        self.ops.read_register(&self.state, RegisterId::Pc)
    }

    #[inline(always)]
    fn branch_to(&mut self, address: u32) {
        self.pending_branch = Some(address);
    }

    #[inline(always)]
    fn retire(&mut self, instr_size: u32) {
        let next = match self.pending_branch.take() {
            Some(target) => target,
            None => self.instruction_address().wrapping_add(instr_size),
        };
        self.ops.write_register(&mut self.state, RegisterId::Pc, next);
    }
}

impl<S: CoreState, O: RegisterOps<S>> SpecialRegisters for RegisterAccess<S, O> {
    #[inline(always)]
    fn read_special(&self, id: SpecialRegisterId) -> ReadResult<u32> {
        self.ops.read_special(&self.state, id)
    }

    #[inline(always)]
    fn write_special(&mut self, id: SpecialRegisterId, value: u32) -> ReadResult<()> {
        self.ops.write_special(&mut self.state, id, value)
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Thumb instruction classification.
//!
//! The decoder only sorts an encoding into its family and hands it to the
//! matching builder in [`crate::builders`]. Patterns that belong to no
//! supported family are rejected as undefined; builders reject operand
//! combinations the architecture leaves unpredictable.

pub mod raw;
mod thumb16;
mod thumb32;

pub use raw::RawInstr;

use crate::ops::Operation;
use crate::registers::it;
use crate::{SimResult, SimulationError};

/// Position of the instruction relative to an IT block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecodeContext {
    pub in_it_block: bool,
    pub last_in_it_block: bool,
}

impl DecodeContext {
    pub const OUTSIDE_IT: DecodeContext = DecodeContext {
        in_it_block: false,
        last_in_it_block: false,
    };

    pub fn from_istate(istate: u32) -> Self {
        Self {
            in_it_block: it::in_it_block(istate),
            last_in_it_block: it::last_in_it_block(istate),
        }
    }

    /// Branches may only appear outside a block or as its last instruction.
    pub fn may_branch(self) -> bool {
        !self.in_it_block || self.last_in_it_block
    }
}

/// Why an encoding produced no operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No supported instruction family matches.
    Undefined,
    /// The family matched but the operands are architecturally unpredictable.
    Unpredictable,
}

impl Rejection {
    pub fn at(self, raw: &RawInstr) -> SimulationError {
        let (address, opcode) = (raw.address, raw.opcode());
        match self {
            Rejection::Undefined => SimulationError::DecodeFailure { address, opcode },
            Rejection::Unpredictable => SimulationError::BuildFailure { address, opcode },
        }
    }
}

pub type Decoded = Result<Operation, Rejection>;

/// Decodes and builds one instruction.
pub fn decode(raw: &RawInstr, ctx: DecodeContext) -> SimResult<Operation> {
    let decoded = if raw.is_wide() {
        thumb32::decode(raw.opcode(), ctx)
    } else {
        thumb16::decode(raw.low, ctx)
    };
    decoded.map_err(|rejection| rejection.at(raw))
}

/// Bits `hi..=lo` of `op`, right aligned.
#[inline(always)]
pub(crate) const fn bits(op: u32, hi: u32, lo: u32) -> u32 {
    (op >> lo) & ((1 << (hi - lo + 1)) - 1)
}

#[inline(always)]
pub(crate) const fn bit(op: u32, n: u32) -> bool {
    (op >> n) & 1 != 0
}

/// Sign-extends the low `width` bits of `value`.
#[inline(always)]
pub(crate) const fn sign_extend(value: u32, width: u32) -> i32 {
    let shift = 32 - width;
    ((value << shift) as i32) >> shift
}

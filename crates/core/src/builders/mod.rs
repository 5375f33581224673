// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Operation builders, one per encoding.
//!
//! A builder takes the raw opcode (a halfword, or `first << 16 | second` for
//! 32-bit forms), pulls out its fields, resolves register operands and checks
//! the combinations the architecture marks unpredictable. Functions are named
//! after the instruction and encoding they build, e.g. `rsb_immediate_t2`.

pub mod bits;
pub mod branch;
pub mod data;
pub mod memory;
pub mod multiply;
pub mod system;

use crate::decoder::{self, DecodeContext, Rejection};
use crate::ops::{self, InstrFlags};
use crate::registers::operand::RArg;

/// Register operand from the field `hi..=lo`.
#[inline(always)]
pub(crate) fn r(op: u32, hi: u32, lo: u32) -> RArg {
    ops::reg(decoder::bits(op, hi, lo))
}

/// Rejects the encoding as unpredictable when `condition` holds.
#[inline(always)]
pub(crate) fn forbid(condition: bool) -> Result<(), Rejection> {
    if condition {
        Err(Rejection::Unpredictable)
    } else {
        Ok(())
    }
}

/// Narrow data-processing encodings update flags only outside IT blocks.
#[inline(always)]
pub(crate) fn narrow_flags(ctx: DecodeContext) -> InstrFlags {
    InstrFlags::set_flags(!ctx.in_it_block)
}

/// The instruction writes the PC, so it must not be followed by more
/// instructions of the same IT block.
#[inline(always)]
pub(crate) fn last_in_it(ctx: DecodeContext) -> Result<(), Rejection> {
    forbid(!ctx.may_branch())
}

#[inline(always)]
pub(crate) fn outside_it(ctx: DecodeContext) -> Result<(), Rejection> {
    forbid(ctx.in_it_block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_it_position_checks() {
        let inside = DecodeContext {
            in_it_block: true,
            last_in_it_block: false,
        };
        let last = DecodeContext {
            in_it_block: true,
            last_in_it_block: true,
        };
        assert_eq!(last_in_it(inside), Err(Rejection::Unpredictable));
        assert_eq!(last_in_it(last), Ok(()));
        assert_eq!(outside_it(last), Err(Rejection::Unpredictable));
        assert_eq!(outside_it(DecodeContext::OUTSIDE_IT), Ok(()));
        assert_eq!(narrow_flags(inside), InstrFlags::empty());
        assert_eq!(
            narrow_flags(DecodeContext::OUTSIDE_IT),
            InstrFlags::SET_FLAGS
        );
    }
}

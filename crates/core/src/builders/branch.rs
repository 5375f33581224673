// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{forbid, last_in_it, outside_it, r};
use crate::decoder::{bit, bits, sign_extend, DecodeContext, Decoded};
use crate::ops::{Branch, BranchExchange, BranchLink, CompareBranch, Operation, TableBranch};
use crate::registers::it::Condition;
use crate::registers::operand::RegArg;

/// Bcc with an 8-bit offset. Not allowed inside an IT block.
pub fn b_t1(op: u32, ctx: DecodeContext) -> Decoded {
    outside_it(ctx)?;
    Ok(Operation::Branch(Branch {
        cond: Condition::from_bits(bits(op, 11, 8)),
        offset: sign_extend(bits(op, 7, 0) << 1, 9),
    }))
}

/// Unconditional B with an 11-bit offset.
pub fn b_t2(op: u32, ctx: DecodeContext) -> Decoded {
    last_in_it(ctx)?;
    Ok(Operation::Branch(Branch {
        cond: Condition::AL,
        offset: sign_extend(bits(op, 10, 0) << 1, 12),
    }))
}

/// Bcc.W
pub fn b_t3(op: u32, ctx: DecodeContext) -> Decoded {
    outside_it(ctx)?;
    let imm = (bits(op, 26, 26) << 20)
        | (bits(op, 11, 11) << 19)
        | (bits(op, 13, 13) << 18)
        | (bits(op, 21, 16) << 12)
        | (bits(op, 10, 0) << 1);
    Ok(Operation::Branch(Branch {
        cond: Condition::from_bits(bits(op, 25, 22)),
        offset: sign_extend(imm, 21),
    }))
}

/// The `S:I1:I2:imm10:imm11:0` offset shared by B.W and BL, where
/// `I = NOT(J XOR S)`.
fn long_offset(op: u32) -> i32 {
    let s = bit(op, 26);
    let i1 = !(bit(op, 13) ^ s);
    let i2 = !(bit(op, 11) ^ s);
    let imm = ((s as u32) << 24)
        | ((i1 as u32) << 23)
        | ((i2 as u32) << 22)
        | (bits(op, 25, 16) << 12)
        | (bits(op, 10, 0) << 1);
    sign_extend(imm, 25)
}

/// B.W
pub fn b_t4(op: u32, ctx: DecodeContext) -> Decoded {
    last_in_it(ctx)?;
    Ok(Operation::Branch(Branch {
        cond: Condition::AL,
        offset: long_offset(op),
    }))
}

pub fn bl_t1(op: u32, ctx: DecodeContext) -> Decoded {
    last_in_it(ctx)?;
    Ok(Operation::BranchLink(BranchLink {
        offset: long_offset(op),
    }))
}

fn exchange(op: u32, ctx: DecodeContext, link: bool) -> Decoded {
    let m = r(op, 6, 3);
    forbid(bits(op, 2, 0) != 0)?;
    forbid(link && m.is_pc())?;
    last_in_it(ctx)?;
    Ok(Operation::BranchExchange(BranchExchange { m, link }))
}

pub fn bx_t1(op: u32, ctx: DecodeContext) -> Decoded {
    exchange(op, ctx, false)
}

pub fn blx_register_t1(op: u32, ctx: DecodeContext) -> Decoded {
    exchange(op, ctx, true)
}

/// CBZ and CBNZ.
pub fn cbz_t1(op: u32, ctx: DecodeContext) -> Decoded {
    outside_it(ctx)?;
    Ok(Operation::CompareBranch(CompareBranch {
        n: r(op, 2, 0),
        offset: (bits(op, 9, 9) << 6) | (bits(op, 7, 3) << 1),
        nonzero: bit(op, 11),
    }))
}

/// TBB and TBH.
pub fn table_branch_t1(op: u32, ctx: DecodeContext) -> Decoded {
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    forbid(bits(op, 15, 5) != 0b111_1000_0000)?;
    forbid(n.is_sp() || m.is_sp_or_pc())?;
    last_in_it(ctx)?;
    Ok(Operation::TableBranch(TableBranch {
        n,
        m,
        half: bit(op, 4),
    }))
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{forbid, r};
use crate::decoder::Decoded;
use crate::ops::{
    Divide, InstrFlags, LongMulKind, LongMultiply, MulKind, Multiply, Operation,
};
use crate::registers::operand::RegArg;

/// MUL.W, MLA and MLS. `Ra` is bits 15:12; MUL has it set to 0b1111.
pub fn multiply_t1(op: u32, kind: MulKind) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    let a = r(op, 15, 12);
    forbid(d.is_sp_or_pc() || n.is_sp_or_pc() || m.is_sp_or_pc())?;
    match kind {
        MulKind::Mul => {}
        MulKind::Mla => forbid(a.is_sp())?,
        MulKind::Mls => forbid(a.is_sp_or_pc())?,
    }
    Ok(Operation::Multiply(Multiply {
        kind,
        d,
        n,
        m,
        a,
        flags: InstrFlags::empty(),
    }))
}

/// SMULL, UMULL, SMLAL, UMLAL.
pub fn long_multiply_t1(op: u32, kind: LongMulKind) -> Decoded {
    let dlo = r(op, 15, 12);
    let dhi = r(op, 11, 8);
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    forbid(dlo.is_sp_or_pc() || dhi.is_sp_or_pc() || n.is_sp_or_pc() || m.is_sp_or_pc())?;
    forbid(dhi == dlo)?;
    Ok(Operation::LongMultiply(LongMultiply {
        kind,
        dlo,
        dhi,
        n,
        m,
    }))
}

/// SDIV and UDIV.
pub fn divide_t1(op: u32, signed: bool) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    forbid(d.is_sp_or_pc() || n.is_sp_or_pc() || m.is_sp_or_pc())?;
    Ok(Operation::Divide(Divide { signed, d, n, m }))
}

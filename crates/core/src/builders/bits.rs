// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{forbid, r};
use crate::decoder::{bits, Decoded, Rejection};
use crate::ops::{BitField, BitFieldKind, BitOp, BitOpKind, Extend, ExtendKind, Operation};
use crate::registers::operand::RegArg;

/// SXTB/SXTH/UXTB/UXTH Rd, Rm with low registers.
pub fn extend_t1(op: u32, kind: ExtendKind) -> Decoded {
    Ok(Operation::Extend(Extend {
        kind,
        d: r(op, 2, 0),
        m: r(op, 5, 3),
        rotation: 0,
    }))
}

/// Wide extends with an optional rotation. The add forms (SXTAB and
/// friends, Rn other than PC) belong to the DSP extension and are undefined.
pub fn extend_t2(op: u32, kind: ExtendKind) -> Decoded {
    if bits(op, 19, 16) != 0xF {
        return Err(Rejection::Undefined);
    }
    let d = r(op, 11, 8);
    let m = r(op, 3, 0);
    forbid(d.is_sp_or_pc() || m.is_sp_or_pc())?;
    Ok(Operation::Extend(Extend {
        kind,
        d,
        m,
        rotation: (bits(op, 5, 4) * 8) as u8,
    }))
}

/// SBFX, UBFX, BFI, BFC. The low field holds `width - 1` for the extracts
/// and the most significant bit for insert and clear.
pub fn bit_field_t1(op: u32, kind: BitFieldKind) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    let lsb = (bits(op, 14, 12) << 2) | bits(op, 7, 6);
    let field = bits(op, 4, 0);
    let width = match kind {
        BitFieldKind::Sbfx | BitFieldKind::Ubfx => {
            forbid(d.is_sp_or_pc() || n.is_sp_or_pc())?;
            forbid(lsb + field > 31)?;
            field + 1
        }
        BitFieldKind::Bfi | BitFieldKind::Bfc => {
            forbid(d.is_sp_or_pc())?;
            forbid(kind == BitFieldKind::Bfi && n.is_sp())?;
            forbid(field < lsb)?;
            field - lsb + 1
        }
    };
    Ok(Operation::BitField(BitField {
        kind,
        d,
        n,
        lsb: lsb as u8,
        width: width as u8,
    }))
}

/// REV, REV16, REVSH with low registers.
pub fn reverse_t1(op: u32, kind: BitOpKind) -> Decoded {
    Ok(Operation::BitOp(BitOp {
        kind,
        d: r(op, 2, 0),
        m: r(op, 5, 3),
    }))
}

/// REV.W, REV16.W, REVSH.W, RBIT, CLZ. `Rm` is encoded twice and both copies
/// must agree.
pub fn bit_op_t2(op: u32, kind: BitOpKind) -> Decoded {
    let d = r(op, 11, 8);
    let m = r(op, 3, 0);
    forbid(r(op, 19, 16) != m)?;
    forbid(d.is_sp_or_pc() || m.is_sp_or_pc())?;
    Ok(Operation::BitOp(BitOp { kind, d, m }))
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Load/store builders.

use super::{forbid, last_in_it, r};
use crate::decoder::{bit, bits, DecodeContext, Decoded, Rejection};
use crate::ops::{
    Access, BlockMode, InstrFlags, LoadStore, LoadStoreDual, Multiple, Offset, Operation,
};
use crate::registers::operand::{PcArg, RArg, RegArg};

fn single(load: bool, access: Access, t: RArg, n: RArg, offset: Offset, flags: InstrFlags) -> Operation {
    let op = LoadStore {
        access,
        t,
        n,
        offset,
        flags,
    };
    if load {
        Operation::Load(op)
    } else {
        Operation::Store(op)
    }
}

fn literal(access: Access, t: RArg, imm: u32, add: bool) -> Operation {
    Operation::LoadLiteral(LoadStore {
        access,
        t,
        n: PcArg::default(),
        offset: Offset::Imm(imm),
        flags: InstrFlags::addressing(true, add, false),
    })
}

// ---- 16-bit ----

/// LDR Rt, [PC, #imm8]
pub fn ldr_literal_t1(op: u32) -> Decoded {
    Ok(literal(Access::Word, r(op, 10, 8), bits(op, 7, 0) << 2, true))
}

/// Register offset group: STR, STRH, STRB, LDRSB, LDR, LDRH, LDRB, LDRSH.
pub fn load_store_register_t1(op: u32, access: Access, load: bool) -> Decoded {
    Ok(single(
        load,
        access,
        r(op, 2, 0),
        r(op, 5, 3),
        Offset::Reg {
            m: r(op, 8, 6),
            shift: 0,
        },
        InstrFlags::offset(),
    ))
}

/// `[Rn, #imm5]` forms; the offset is scaled by the access size.
pub fn load_store_immediate_t1(op: u32, access: Access, load: bool) -> Decoded {
    let scale = access.size().trailing_zeros();
    Ok(single(
        load,
        access,
        r(op, 2, 0),
        r(op, 5, 3),
        Offset::Imm(bits(op, 10, 6) << scale),
        InstrFlags::offset(),
    ))
}

/// LDR/STR Rt, [SP, #imm8]
pub fn load_store_sp_t2(op: u32, load: bool) -> Decoded {
    Ok(single(
        load,
        Access::Word,
        r(op, 10, 8),
        RArg::SP,
        Offset::Imm(bits(op, 7, 0) << 2),
        InstrFlags::offset(),
    ))
}

/// STMIA Rn!, {list}
pub fn stm_t1(op: u32) -> Decoded {
    let registers = bits(op, 7, 0) as u16;
    forbid(registers == 0)?;
    Ok(Operation::StoreMultiple(Multiple {
        n: r(op, 10, 8),
        registers,
        mode: BlockMode::IncrementAfter,
        wback: true,
    }))
}

/// LDMIA Rn{!}, {list}. Writes back unless Rn is in the list.
pub fn ldm_t1(op: u32) -> Decoded {
    let n = r(op, 10, 8);
    let registers = bits(op, 7, 0) as u16;
    forbid(registers == 0)?;
    Ok(Operation::LoadMultiple(Multiple {
        n,
        registers,
        mode: BlockMode::IncrementAfter,
        wback: registers & (1 << n.index()) == 0,
    }))
}

pub fn push_t1(op: u32) -> Decoded {
    let registers = (bits(op, 7, 0) | (bits(op, 8, 8) << 14)) as u16;
    forbid(registers == 0)?;
    Ok(Operation::StoreMultiple(Multiple {
        n: RArg::SP,
        registers,
        mode: BlockMode::DecrementBefore,
        wback: true,
    }))
}

pub fn pop_t1(op: u32, ctx: DecodeContext) -> Decoded {
    let registers = (bits(op, 7, 0) | (bits(op, 8, 8) << 15)) as u16;
    forbid(registers == 0)?;
    if registers & (1 << 15) != 0 {
        last_in_it(ctx)?;
    }
    Ok(Operation::LoadMultiple(Multiple {
        n: RArg::SP,
        registers,
        mode: BlockMode::IncrementAfter,
        wback: true,
    }))
}

// ---- 32-bit ----

/// LDM.W, LDMDB, STM.W, STMDB, and PUSH.W/POP.W which are the SP forms.
pub fn load_store_multiple_t2(op: u32, ctx: DecodeContext) -> Decoded {
    let mode = match bits(op, 24, 23) {
        0b01 => BlockMode::IncrementAfter,
        0b10 => BlockMode::DecrementBefore,
        _ => return Err(Rejection::Undefined),
    };
    let n = r(op, 19, 16);
    let wback = bit(op, 21);
    let load = bit(op, 20);
    let registers = bits(op, 15, 0) as u16;

    forbid(n.is_pc() || registers.count_ones() < 2)?;
    forbid(registers & (1 << 13) != 0)?;
    forbid(wback && registers & (1 << n.index()) != 0)?;
    if load {
        let pc = registers & (1 << 15) != 0;
        forbid(pc && registers & (1 << 14) != 0)?;
        if pc {
            last_in_it(ctx)?;
        }
    } else {
        forbid(registers & (1 << 15) != 0)?;
    }

    let multiple = Multiple {
        n,
        registers,
        mode,
        wback,
    };
    Ok(if load {
        Operation::LoadMultiple(multiple)
    } else {
        Operation::StoreMultiple(multiple)
    })
}

/// LDRD and STRD with an immediate offset, including the literal LDRD.
pub fn load_store_dual_t1(op: u32) -> Decoded {
    let t = r(op, 15, 12);
    let t2 = r(op, 11, 8);
    let n = r(op, 19, 16);
    let flags = InstrFlags::addressing(bit(op, 24), bit(op, 23), bit(op, 21));
    let load = bit(op, 20);
    let wback = flags.contains(InstrFlags::WBACK);

    forbid(wback && (n == t || n == t2))?;
    forbid(n.is_pc() && (!load || wback))?;
    forbid(t.is_sp_or_pc() || t2.is_sp_or_pc())?;
    forbid(load && t == t2)?;

    let dual = LoadStoreDual {
        t,
        t2,
        n,
        imm: bits(op, 7, 0) << 2,
        flags,
    };
    Ok(if load {
        Operation::LoadDual(dual)
    } else {
        Operation::StoreDual(dual)
    })
}

/// Byte and halfword loads with `Rt == PC` are preload hints.
fn is_preload(access: Access, t: RArg) -> bool {
    access != Access::Word && t.is_pc()
}

/// Rules shared by every wide load once the address form is known.
fn check_load_target(access: Access, t: RArg, ctx: DecodeContext) -> Result<(), Rejection> {
    if access == Access::Word {
        if t.is_pc() {
            last_in_it(ctx)?;
        }
        Ok(())
    } else {
        forbid(t.is_sp())
    }
}

/// LDR{B,H,SB,SH}.W Rt, [PC, #+/-imm12]
pub fn load_literal_t2(op: u32, access: Access, ctx: DecodeContext) -> Decoded {
    let t = r(op, 15, 12);
    if is_preload(access, t) {
        return Ok(Operation::Nop);
    }
    check_load_target(access, t, ctx)?;
    Ok(literal(access, t, bits(op, 11, 0), bit(op, 23)))
}

/// `[Rn, #imm12]` forms of the wide loads and stores.
pub fn load_store_immediate_t3(op: u32, access: Access, load: bool, ctx: DecodeContext) -> Decoded {
    let t = r(op, 15, 12);
    let n = r(op, 19, 16);
    if load {
        if is_preload(access, t) {
            return Ok(Operation::Nop);
        }
        check_load_target(access, t, ctx)?;
    } else {
        forbid(n.is_pc())?;
        forbid(t.is_pc() || (access != Access::Word && t.is_sp()))?;
    }
    Ok(single(
        load,
        access,
        t,
        n,
        Offset::Imm(bits(op, 11, 0)),
        InstrFlags::offset(),
    ))
}

/// `[Rn, #-imm8]`, `[Rn], #+/-imm8` and `[Rn, #+/-imm8]!` forms, and the
/// unprivileged `[Rn, #+imm8]` of LDRT and friends.
pub fn load_store_immediate_t4(op: u32, access: Access, load: bool, ctx: DecodeContext) -> Decoded {
    let t = r(op, 15, 12);
    let n = r(op, 19, 16);
    let index = bit(op, 10);
    let add = bit(op, 9);
    let wback = bit(op, 8);
    if !index && !wback {
        return Err(Rejection::Undefined);
    }
    if index && add && !wback && !(load && is_preload(access, t)) {
        forbid(t.is_sp_or_pc() || (!load && n.is_pc()))?;
        let flags = InstrFlags::offset() | InstrFlags::UNPRIV;
        return Ok(single(load, access, t, n, Offset::Imm(bits(op, 7, 0)), flags));
    }
    if load {
        if is_preload(access, t) {
            // Only the negative offset form is a hint
            forbid(!index || add || wback)?;
            return Ok(Operation::Nop);
        }
        check_load_target(access, t, ctx)?;
    } else {
        forbid(n.is_pc())?;
        forbid(t.is_pc() || (access != Access::Word && t.is_sp()))?;
    }
    forbid(wback && n == t)?;
    Ok(single(
        load,
        access,
        t,
        n,
        Offset::Imm(bits(op, 7, 0)),
        InstrFlags::addressing(index, add, wback),
    ))
}

/// `[Rn, Rm, LSL #imm2]` forms.
pub fn load_store_register_t2(op: u32, access: Access, load: bool, ctx: DecodeContext) -> Decoded {
    let t = r(op, 15, 12);
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    forbid(m.is_sp_or_pc())?;
    if load {
        if is_preload(access, t) {
            return Ok(Operation::Nop);
        }
        check_load_target(access, t, ctx)?;
    } else {
        forbid(n.is_pc())?;
        forbid(t.is_pc() || (access != Access::Word && t.is_sp()))?;
    }
    Ok(single(
        load,
        access,
        t,
        n,
        Offset::Reg {
            m,
            shift: bits(op, 5, 4) as u8,
        },
        InstrFlags::offset(),
    ))
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Data-processing builders.

use super::{forbid, last_in_it, narrow_flags, outside_it, r};
use crate::alu::{decode_imm_shift, decode_reg_shift, thumb_expand_imm_c, ExpandedImm, ImmShift, ShiftType};
use crate::decoder::{bit, bits, DecodeContext, Decoded, Rejection};
use crate::ops::{
    Adr, ArithImm, ArithOp, ArithReg, InstrFlags, LogicImm, LogicOp, LogicReg, MoveImm, MoveReg,
    MoveWide, MulKind, Multiply, Operation, Rrx, ShiftReg, TestImm, TestOp, TestReg,
};
use crate::registers::operand::{RArg, RegArg, SpArg};

fn wide_flags(op: u32) -> InstrFlags {
    InstrFlags::set_flags(bit(op, 20))
}

/// `i:imm3:imm8` of the 32-bit immediate forms.
fn imm12(op: u32) -> u32 {
    (bits(op, 26, 26) << 11) | (bits(op, 14, 12) << 8) | bits(op, 7, 0)
}

fn expand(op: u32) -> Result<ExpandedImm, Rejection> {
    thumb_expand_imm_c(imm12(op)).ok_or(Rejection::Unpredictable)
}

/// `imm3:imm2` shift of the 32-bit shifted register forms.
fn imm_shift(op: u32) -> ImmShift {
    decode_imm_shift(bits(op, 5, 4), (bits(op, 14, 12) << 2) | bits(op, 7, 6))
}

// ---- 16-bit ----

fn shift_immediate_t1(op: u32, ctx: DecodeContext, kind: u32) -> Decoded {
    Ok(Operation::MoveReg(MoveReg {
        d: r(op, 2, 0),
        m: r(op, 5, 3),
        shift: decode_imm_shift(kind, bits(op, 10, 6)),
        negate: false,
        flags: narrow_flags(ctx),
    }))
}

/// LSLS Rd, Rm, #imm5. A zero shift is MOVS Rd, Rm, which IT blocks forbid.
pub fn lsl_immediate_t1(op: u32, ctx: DecodeContext) -> Decoded {
    if bits(op, 10, 6) == 0 {
        outside_it(ctx)?;
    }
    shift_immediate_t1(op, ctx, 0)
}

pub fn lsr_immediate_t1(op: u32, ctx: DecodeContext) -> Decoded {
    shift_immediate_t1(op, ctx, 1)
}

pub fn asr_immediate_t1(op: u32, ctx: DecodeContext) -> Decoded {
    shift_immediate_t1(op, ctx, 2)
}

/// ADD/SUB Rd, Rn, Rm.
pub fn arith_register_t1(op: u32, ctx: DecodeContext, kind: ArithOp) -> Decoded {
    Ok(Operation::ArithReg(ArithReg {
        op: kind,
        d: r(op, 2, 0),
        n: r(op, 5, 3),
        m: r(op, 8, 6),
        shift: ImmShift::NONE,
        flags: narrow_flags(ctx),
    }))
}

/// ADD/SUB Rd, Rn, #imm3.
pub fn arith_immediate_t1(op: u32, ctx: DecodeContext, kind: ArithOp) -> Decoded {
    Ok(Operation::ArithImm(ArithImm {
        op: kind,
        d: r(op, 2, 0),
        n: r(op, 5, 3),
        imm: bits(op, 8, 6),
        flags: narrow_flags(ctx),
    }))
}

/// ADD/SUB Rdn, #imm8.
pub fn arith_immediate_t2(op: u32, ctx: DecodeContext, kind: ArithOp) -> Decoded {
    let dn = r(op, 10, 8);
    Ok(Operation::ArithImm(ArithImm {
        op: kind,
        d: dn,
        n: dn,
        imm: bits(op, 7, 0),
        flags: narrow_flags(ctx),
    }))
}

pub fn mov_immediate_t1(op: u32, ctx: DecodeContext) -> Decoded {
    Ok(Operation::MoveImm(MoveImm {
        d: r(op, 10, 8),
        imm: ExpandedImm::plain(bits(op, 7, 0)),
        negate: false,
        flags: narrow_flags(ctx),
    }))
}

pub fn cmp_immediate_t1(op: u32) -> Decoded {
    Ok(Operation::TestImm(TestImm {
        op: TestOp::Cmp,
        n: r(op, 10, 8),
        imm: ExpandedImm::plain(bits(op, 7, 0)),
    }))
}

/// The sixteen two-register operations of the `010000` group.
pub fn alu_register_t1(op: u32, ctx: DecodeContext) -> Decoded {
    let dn = r(op, 2, 0);
    let m = r(op, 5, 3);
    let flags = narrow_flags(ctx);
    let logic = |kind| {
        Operation::LogicReg(LogicReg {
            op: kind,
            d: dn,
            n: dn,
            m,
            shift: ImmShift::NONE,
            flags,
        })
    };
    let arith = |kind| {
        Operation::ArithReg(ArithReg {
            op: kind,
            d: dn,
            n: dn,
            m,
            shift: ImmShift::NONE,
            flags,
        })
    };
    let shift = |kind| {
        Operation::ShiftReg(ShiftReg {
            kind,
            d: dn,
            n: dn,
            m,
            flags,
        })
    };
    let test = |kind| {
        Operation::TestReg(TestReg {
            op: kind,
            n: dn,
            m,
            shift: ImmShift::NONE,
        })
    };

    Ok(match bits(op, 9, 6) {
        0x0 => logic(LogicOp::And),
        0x1 => logic(LogicOp::Eor),
        0x2 => shift(ShiftType::Lsl),
        0x3 => shift(ShiftType::Lsr),
        0x4 => shift(ShiftType::Asr),
        0x5 => arith(ArithOp::Adc),
        0x6 => arith(ArithOp::Sbc),
        0x7 => shift(ShiftType::Ror),
        0x8 => test(TestOp::Tst),
        0x9 => return rsb_immediate_t1(op, ctx),
        0xA => test(TestOp::Cmp),
        0xB => test(TestOp::Cmn),
        0xC => logic(LogicOp::Orr),
        0xD => Operation::Multiply(Multiply {
            kind: MulKind::Mul,
            d: dn,
            n: m,
            m: dn,
            a: dn,
            flags,
        }),
        0xE => logic(LogicOp::Bic),
        _ => Operation::MoveReg(MoveReg {
            d: dn,
            m,
            shift: ImmShift::NONE,
            negate: true,
            flags,
        }),
    })
}

/// RSBS Rd, Rn, #0 (NEG).
pub fn rsb_immediate_t1(op: u32, ctx: DecodeContext) -> Decoded {
    Ok(Operation::ArithImm(ArithImm {
        op: ArithOp::Rsb,
        d: r(op, 2, 0),
        n: r(op, 5, 3),
        imm: 0,
        flags: narrow_flags(ctx),
    }))
}

/// `D:Rdn` and `Rm` of the high register forms.
fn high_registers(op: u32) -> (RArg, RArg) {
    let dn = crate::ops::reg((bits(op, 7, 7) << 3) | bits(op, 2, 0));
    (dn, r(op, 6, 3))
}

/// ADD Rdn, Rm with any registers. Never sets flags.
pub fn add_register_t2(op: u32, ctx: DecodeContext) -> Decoded {
    let (dn, m) = high_registers(op);
    if dn.is_pc() {
        last_in_it(ctx)?;
        forbid(m.is_pc())?;
    }
    Ok(Operation::ArithReg(ArithReg {
        op: ArithOp::Add,
        d: dn,
        n: dn,
        m,
        shift: ImmShift::NONE,
        flags: InstrFlags::empty(),
    }))
}

pub fn cmp_register_t2(op: u32) -> Decoded {
    let (n, m) = high_registers(op);
    forbid(n.index() < 8 && m.index() < 8)?;
    forbid(n.is_pc() || m.is_pc())?;
    Ok(Operation::TestReg(TestReg {
        op: TestOp::Cmp,
        n,
        m,
        shift: ImmShift::NONE,
    }))
}

pub fn mov_register_t1(op: u32, ctx: DecodeContext) -> Decoded {
    let (d, m) = high_registers(op);
    if d.is_pc() {
        last_in_it(ctx)?;
    }
    Ok(Operation::MoveReg(MoveReg {
        d,
        m,
        shift: ImmShift::NONE,
        negate: false,
        flags: InstrFlags::empty(),
    }))
}

pub fn adr_t1(op: u32) -> Decoded {
    Ok(Operation::Adr(Adr {
        d: r(op, 10, 8),
        imm: bits(op, 7, 0) << 2,
        add: true,
    }))
}

fn sp_arith(kind: ArithOp, d: RArg, imm: u32) -> Operation {
    Operation::ArithSpImm(ArithImm {
        op: kind,
        d,
        n: SpArg::default(),
        imm,
        flags: InstrFlags::empty(),
    })
}

/// ADD Rd, SP, #imm8.
pub fn add_sp_immediate_t1(op: u32) -> Decoded {
    Ok(sp_arith(ArithOp::Add, r(op, 10, 8), bits(op, 7, 0) << 2))
}

/// ADD SP, SP, #imm7.
pub fn add_sp_immediate_t2(op: u32) -> Decoded {
    Ok(sp_arith(ArithOp::Add, RArg::SP, bits(op, 6, 0) << 2))
}

/// SUB SP, SP, #imm7.
pub fn sub_sp_immediate_t1(op: u32) -> Decoded {
    Ok(sp_arith(ArithOp::Sub, RArg::SP, bits(op, 6, 0) << 2))
}

// ---- 32-bit, modified immediate ----

/// AND, BIC, ORR, ORN, EOR with a modified immediate.
pub fn logic_immediate_t1(op: u32, kind: LogicOp) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    forbid(d.is_sp_or_pc() || n.is_sp_or_pc())?;
    Ok(Operation::LogicImm(LogicImm {
        op: kind,
        d,
        n,
        imm: expand(op)?,
        flags: wide_flags(op),
    }))
}

/// TST, TEQ, CMP, CMN with a modified immediate.
pub fn test_immediate_t1(op: u32, kind: TestOp) -> Decoded {
    let n = r(op, 19, 16);
    match kind {
        TestOp::Tst | TestOp::Teq => forbid(n.is_sp_or_pc())?,
        TestOp::Cmp | TestOp::Cmn => forbid(n.is_pc())?,
    }
    Ok(Operation::TestImm(TestImm {
        op: kind,
        n,
        imm: expand(op)?,
    }))
}

/// MOV.W and MVN with a modified immediate.
pub fn mov_immediate_t2(op: u32, negate: bool) -> Decoded {
    let d = r(op, 11, 8);
    forbid(d.is_sp_or_pc())?;
    Ok(Operation::MoveImm(MoveImm {
        d,
        imm: expand(op)?,
        negate,
        flags: wide_flags(op),
    }))
}

/// ADD, ADC, SUB, SBC, RSB with a modified immediate. ADD and SUB with an SP
/// base use the fixed SP operand.
pub fn arith_immediate_t3(op: u32, kind: ArithOp) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    let imm = expand(op)?.value;
    if n.is_sp() && matches!(kind, ArithOp::Add | ArithOp::Sub) {
        forbid(d.is_pc())?;
        return Ok(Operation::ArithSpImm(ArithImm {
            op: kind,
            d,
            n: SpArg::default(),
            imm,
            flags: wide_flags(op),
        }));
    }
    forbid(d.is_sp_or_pc() || n.is_sp_or_pc())?;
    Ok(Operation::ArithImm(ArithImm {
        op: kind,
        d,
        n,
        imm,
        flags: wide_flags(op),
    }))
}

/// RSB.W Rd, Rn, #const.
pub fn rsb_immediate_t2(op: u32) -> Decoded {
    arith_immediate_t3(op, ArithOp::Rsb)
}

// ---- 32-bit, plain binary immediate ----

/// ADDW/SUBW Rd, Rn, #imm12.
pub fn arith_immediate_t4(op: u32, kind: ArithOp) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    let imm = imm12(op);
    if n.is_sp() {
        forbid(d.is_pc())?;
        return Ok(sp_arith(kind, d, imm));
    }
    forbid(d.is_sp_or_pc())?;
    Ok(Operation::ArithImm(ArithImm {
        op: kind,
        d,
        n,
        imm,
        flags: InstrFlags::empty(),
    }))
}

fn adr_wide(op: u32, add: bool) -> Decoded {
    let d = r(op, 11, 8);
    forbid(d.is_sp_or_pc())?;
    Ok(Operation::Adr(Adr {
        d,
        imm: imm12(op),
        add,
    }))
}

/// ADR.W Rd, label with a label before the instruction.
pub fn adr_t2(op: u32) -> Decoded {
    adr_wide(op, false)
}

pub fn adr_t3(op: u32) -> Decoded {
    adr_wide(op, true)
}

/// MOVW (`top == false`) and MOVT.
pub fn move_wide_t1(op: u32, top: bool) -> Decoded {
    let d = r(op, 11, 8);
    forbid(d.is_sp_or_pc())?;
    let imm16 = (bits(op, 19, 16) << 12) | imm12(op);
    Ok(Operation::MoveWide(MoveWide {
        d,
        imm16: imm16 as u16,
        top,
    }))
}

// ---- 32-bit, shifted register ----

pub fn logic_register_t2(op: u32, kind: LogicOp) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    forbid(d.is_sp_or_pc() || n.is_sp_or_pc() || m.is_sp_or_pc())?;
    Ok(Operation::LogicReg(LogicReg {
        op: kind,
        d,
        n,
        m,
        shift: imm_shift(op),
        flags: wide_flags(op),
    }))
}

pub fn test_register_t2(op: u32, kind: TestOp) -> Decoded {
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    match kind {
        TestOp::Tst | TestOp::Teq => forbid(n.is_sp_or_pc() || m.is_sp_or_pc())?,
        TestOp::Cmp | TestOp::Cmn => forbid(n.is_pc() || m.is_sp_or_pc())?,
    }
    Ok(Operation::TestReg(TestReg {
        op: kind,
        n,
        m,
        shift: imm_shift(op),
    }))
}

/// MOV.W Rd, Rm and the immediate shifts LSL/LSR/ASR/ROR/RRX that share its
/// encoding.
pub fn mov_register_t3(op: u32) -> Decoded {
    let d = r(op, 11, 8);
    let m = r(op, 3, 0);
    let flags = wide_flags(op);
    let shift = imm_shift(op);
    if shift == ImmShift::NONE {
        if flags.contains(InstrFlags::SET_FLAGS) {
            forbid(d.is_sp_or_pc() || m.is_sp_or_pc())?;
        } else {
            forbid(d.is_pc() || m.is_pc() || (d.is_sp() && m.is_sp()))?;
        }
    } else {
        forbid(d.is_sp_or_pc() || m.is_sp_or_pc())?;
    }
    if shift.kind == ShiftType::Rrx {
        return Ok(Operation::Rrx(Rrx { d, m, flags }));
    }
    Ok(Operation::MoveReg(MoveReg {
        d,
        m,
        shift,
        negate: false,
        flags,
    }))
}

pub fn mvn_register_t2(op: u32) -> Decoded {
    let d = r(op, 11, 8);
    let m = r(op, 3, 0);
    forbid(d.is_sp_or_pc() || m.is_sp_or_pc())?;
    Ok(Operation::MoveReg(MoveReg {
        d,
        m,
        shift: imm_shift(op),
        negate: true,
        flags: wide_flags(op),
    }))
}

/// ADD, ADC, SUB, SBC, RSB with a shifted register.
pub fn arith_register_t3(op: u32, kind: ArithOp) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    let shift = imm_shift(op);
    if n.is_sp() && matches!(kind, ArithOp::Add | ArithOp::Sub) {
        forbid(d.is_pc() || m.is_sp_or_pc())?;
        forbid(d.is_sp() && (shift.kind != ShiftType::Lsl || shift.amount > 3))?;
    } else {
        forbid(d.is_sp_or_pc() || n.is_sp_or_pc() || m.is_sp_or_pc())?;
    }
    Ok(Operation::ArithReg(ArithReg {
        op: kind,
        d,
        n,
        m,
        shift,
        flags: wide_flags(op),
    }))
}

/// RRX Rd, Rm; built through the MOV.W encoding with ROR #0.
pub fn rrx_t1(op: u32) -> Decoded {
    mov_register_t3(op)
}

// ---- 32-bit, register controlled shift ----

/// LSL.W/LSR.W/ASR.W/ROR.W Rd, Rn, Rm.
pub fn shift_register_t2(op: u32) -> Decoded {
    let d = r(op, 11, 8);
    let n = r(op, 19, 16);
    let m = r(op, 3, 0);
    forbid(d.is_sp_or_pc() || n.is_sp_or_pc() || m.is_sp_or_pc())?;
    Ok(Operation::ShiftReg(ShiftReg {
        kind: decode_reg_shift(bits(op, 22, 21)),
        d,
        n,
        m,
        flags: wide_flags(op),
    }))
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{bit, bits, DecodeContext, Decoded, Rejection};
use crate::builders::{self, branch, data, memory, multiply, system};
use crate::ops::{
    Access, ArithOp, BitFieldKind, BitOpKind, ExtendKind, LogicOp, LongMulKind, MulKind, TestOp,
};

/// `op` holds the first halfword in bits 31:16.
pub(super) fn decode(op: u32, ctx: DecodeContext) -> Decoded {
    match bits(op, 28, 27) {
        0b01 => {
            if bit(op, 26) {
                // Coprocessor
                Err(Rejection::Undefined)
            } else if bit(op, 25) {
                shifted_register(op)
            } else if bit(op, 22) {
                dual_exclusive_table(op, ctx)
            } else {
                memory::load_store_multiple_t2(op, ctx)
            }
        }
        0b10 if bit(op, 15) => branch_misc_control(op, ctx),
        0b10 if bit(op, 25) => plain_immediate(op),
        0b10 => modified_immediate(op),
        0b11 => {
            if bit(op, 26) {
                Err(Rejection::Undefined)
            } else if bit(op, 25) {
                match bits(op, 24, 23) {
                    0b00 | 0b01 => data_register(op),
                    0b10 => multiply_accumulate(op),
                    _ => long_multiply_divide(op),
                }
            } else if bit(op, 20) {
                load(op, ctx)
            } else if bit(op, 24) {
                // Advanced SIMD element or structure load/store
                Err(Rejection::Undefined)
            } else {
                store(op, ctx)
            }
        }
        _ => Err(Rejection::Undefined),
    }
}

/// Rd == PC with S set turns a data-processing op into its compare form.
fn is_compare(op: u32) -> bool {
    bits(op, 11, 8) == 0xF && bit(op, 20)
}

fn rn_is_pc(op: u32) -> bool {
    bits(op, 19, 16) == 0xF
}

fn modified_immediate(op: u32) -> Decoded {
    match bits(op, 24, 21) {
        0b0000 if is_compare(op) => data::test_immediate_t1(op, TestOp::Tst),
        0b0000 => data::logic_immediate_t1(op, LogicOp::And),
        0b0001 => data::logic_immediate_t1(op, LogicOp::Bic),
        0b0010 if rn_is_pc(op) => data::mov_immediate_t2(op, false),
        0b0010 => data::logic_immediate_t1(op, LogicOp::Orr),
        0b0011 if rn_is_pc(op) => data::mov_immediate_t2(op, true),
        0b0011 => data::logic_immediate_t1(op, LogicOp::Orn),
        0b0100 if is_compare(op) => data::test_immediate_t1(op, TestOp::Teq),
        0b0100 => data::logic_immediate_t1(op, LogicOp::Eor),
        0b1000 if is_compare(op) => data::test_immediate_t1(op, TestOp::Cmn),
        0b1000 => data::arith_immediate_t3(op, ArithOp::Add),
        0b1010 => data::arith_immediate_t3(op, ArithOp::Adc),
        0b1011 => data::arith_immediate_t3(op, ArithOp::Sbc),
        0b1101 if is_compare(op) => data::test_immediate_t1(op, TestOp::Cmp),
        0b1101 => data::arith_immediate_t3(op, ArithOp::Sub),
        0b1110 => data::rsb_immediate_t2(op),
        _ => Err(Rejection::Undefined),
    }
}

fn plain_immediate(op: u32) -> Decoded {
    match bits(op, 24, 20) {
        0b00000 if rn_is_pc(op) => data::adr_t3(op),
        0b00000 => data::arith_immediate_t4(op, ArithOp::Add),
        0b00100 => data::move_wide_t1(op, false),
        0b01010 if rn_is_pc(op) => data::adr_t2(op),
        0b01010 => data::arith_immediate_t4(op, ArithOp::Sub),
        0b01100 => data::move_wide_t1(op, true),
        0b10100 => builders::bits::bit_field_t1(op, BitFieldKind::Sbfx),
        0b10110 if rn_is_pc(op) => builders::bits::bit_field_t1(op, BitFieldKind::Bfc),
        0b10110 => builders::bits::bit_field_t1(op, BitFieldKind::Bfi),
        0b11100 => builders::bits::bit_field_t1(op, BitFieldKind::Ubfx),
        // SSAT, USAT and the halfword saturates
        _ => Err(Rejection::Undefined),
    }
}

fn shifted_register(op: u32) -> Decoded {
    match bits(op, 24, 21) {
        0b0000 if is_compare(op) => data::test_register_t2(op, TestOp::Tst),
        0b0000 => data::logic_register_t2(op, LogicOp::And),
        0b0001 => data::logic_register_t2(op, LogicOp::Bic),
        0b0010 if rn_is_pc(op) => data::mov_register_t3(op),
        0b0010 => data::logic_register_t2(op, LogicOp::Orr),
        0b0011 if rn_is_pc(op) => data::mvn_register_t2(op),
        0b0011 => data::logic_register_t2(op, LogicOp::Orn),
        0b0100 if is_compare(op) => data::test_register_t2(op, TestOp::Teq),
        0b0100 => data::logic_register_t2(op, LogicOp::Eor),
        0b1000 if is_compare(op) => data::test_register_t2(op, TestOp::Cmn),
        0b1000 => data::arith_register_t3(op, ArithOp::Add),
        0b1010 => data::arith_register_t3(op, ArithOp::Adc),
        0b1011 => data::arith_register_t3(op, ArithOp::Sbc),
        0b1101 if is_compare(op) => data::test_register_t2(op, TestOp::Cmp),
        0b1101 => data::arith_register_t3(op, ArithOp::Sub),
        0b1110 => data::arith_register_t3(op, ArithOp::Rsb),
        // PKHBT/PKHTB and unallocated
        _ => Err(Rejection::Undefined),
    }
}

/// LDRD/STRD, the exclusives and TBB/TBH. Exclusive access is not modelled.
fn dual_exclusive_table(op: u32, ctx: DecodeContext) -> Decoded {
    if bit(op, 24) || bit(op, 21) {
        return memory::load_store_dual_t1(op);
    }
    if bits(op, 24, 20) == 0b01101 && bits(op, 7, 5) == 0 {
        return branch::table_branch_t1(op, ctx);
    }
    Err(Rejection::Undefined)
}

fn branch_misc_control(op: u32, ctx: DecodeContext) -> Decoded {
    match bits(op, 14, 12) & 0b101 {
        0b101 => return branch::bl_t1(op, ctx),
        // BLX (immediate) has no M-profile form
        0b100 => return Err(Rejection::Undefined),
        0b001 => return branch::b_t4(op, ctx),
        _ => {}
    }
    let sel = bits(op, 26, 20);
    if sel & 0b011_1000 != 0b011_1000 {
        return branch::b_t3(op, ctx);
    }
    match sel {
        0b011_1000 | 0b011_1001 => system::msr_t1(op),
        // CPS.W does not exist on M-profile
        0b011_1010 if bits(op, 10, 8) != 0 => Err(Rejection::Undefined),
        0b011_1010 => system::hint(op),
        0b011_1011 => match bits(op, 7, 4) {
            // CLREX, DSB, DMB, ISB
            0b0010 | 0b0100 | 0b0101 | 0b0110 => system::hint(op),
            _ => Err(Rejection::Undefined),
        },
        0b011_1110 | 0b011_1111 => system::mrs_t1(op),
        // UDF.W and unallocated
        _ => Err(Rejection::Undefined),
    }
}

fn store(op: u32, ctx: DecodeContext) -> Decoded {
    let access = match bits(op, 22, 21) {
        0b00 => Access::Byte,
        0b01 => Access::Half,
        0b10 => Access::Word,
        _ => return Err(Rejection::Undefined),
    };
    if bit(op, 23) {
        memory::load_store_immediate_t3(op, access, false, ctx)
    } else if bit(op, 11) {
        memory::load_store_immediate_t4(op, access, false, ctx)
    } else if bits(op, 10, 6) == 0 {
        memory::load_store_register_t2(op, access, false, ctx)
    } else {
        Err(Rejection::Undefined)
    }
}

fn load(op: u32, ctx: DecodeContext) -> Decoded {
    let access = match (bits(op, 22, 21), bit(op, 24)) {
        (0b00, false) => Access::Byte,
        (0b00, true) => Access::SignedByte,
        (0b01, false) => Access::Half,
        (0b01, true) => Access::SignedHalf,
        (0b10, false) => Access::Word,
        _ => return Err(Rejection::Undefined),
    };
    if rn_is_pc(op) {
        memory::load_literal_t2(op, access, ctx)
    } else if bit(op, 23) {
        memory::load_store_immediate_t3(op, access, true, ctx)
    } else if bit(op, 11) {
        memory::load_store_immediate_t4(op, access, true, ctx)
    } else if bits(op, 10, 6) == 0 {
        memory::load_store_register_t2(op, access, true, ctx)
    } else {
        Err(Rejection::Undefined)
    }
}

fn data_register(op: u32) -> Decoded {
    if bits(op, 15, 12) != 0xF {
        return Err(Rejection::Undefined);
    }
    let extended = bit(op, 7);
    match (bits(op, 23, 20), bits(op, 7, 4)) {
        (0b0000..=0b0111, 0b0000) => data::shift_register_t2(op),
        (0b0000, _) if extended => builders::bits::extend_t2(op, ExtendKind::Sxth),
        (0b0001, _) if extended => builders::bits::extend_t2(op, ExtendKind::Uxth),
        (0b0100, _) if extended => builders::bits::extend_t2(op, ExtendKind::Sxtb),
        (0b0101, _) if extended => builders::bits::extend_t2(op, ExtendKind::Uxtb),
        (0b1001, 0b1000) => builders::bits::bit_op_t2(op, BitOpKind::Rev),
        (0b1001, 0b1001) => builders::bits::bit_op_t2(op, BitOpKind::Rev16),
        (0b1001, 0b1010) => builders::bits::bit_op_t2(op, BitOpKind::Rbit),
        (0b1001, 0b1011) => builders::bits::bit_op_t2(op, BitOpKind::Revsh),
        (0b1011, 0b1000) => builders::bits::bit_op_t2(op, BitOpKind::Clz),
        // Parallel add/subtract, saturating arithmetic, SEL, 16-bit extends
        _ => Err(Rejection::Undefined),
    }
}

fn multiply_accumulate(op: u32) -> Decoded {
    if bits(op, 7, 6) != 0 {
        return Err(Rejection::Undefined);
    }
    match (bits(op, 22, 20), bits(op, 5, 4)) {
        (0b000, 0b00) if bits(op, 15, 12) == 0xF => multiply::multiply_t1(op, MulKind::Mul),
        (0b000, 0b00) => multiply::multiply_t1(op, MulKind::Mla),
        (0b000, 0b01) => multiply::multiply_t1(op, MulKind::Mls),
        // Halfword, dual and most-significant-word multiplies
        _ => Err(Rejection::Undefined),
    }
}

fn long_multiply_divide(op: u32) -> Decoded {
    match (bits(op, 22, 20), bits(op, 7, 4)) {
        (0b000, 0b0000) => multiply::long_multiply_t1(op, LongMulKind::Smull),
        (0b001, 0b1111) => multiply::divide_t1(op, true),
        (0b010, 0b0000) => multiply::long_multiply_t1(op, LongMulKind::Umull),
        (0b011, 0b1111) => multiply::divide_t1(op, false),
        (0b100, 0b0000) => multiply::long_multiply_t1(op, LongMulKind::Smlal),
        (0b110, 0b0000) => multiply::long_multiply_t1(op, LongMulKind::Umlal),
        _ => Err(Rejection::Undefined),
    }
}

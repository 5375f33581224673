// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{bit, bits, DecodeContext, Decoded, Rejection};
use crate::builders::{self, branch, data, memory, system};
use crate::ops::{Access, ArithOp, BitOpKind, ExtendKind};

pub(super) fn decode(halfword: u16, ctx: DecodeContext) -> Decoded {
    let op = halfword as u32;
    match bits(op, 15, 10) {
        // 00xxxx: shift (immediate), add, subtract, move, compare
        0b000000..=0b001111 => shift_add_sub_move_compare(op, ctx),
        0b010000 => data::alu_register_t1(op, ctx),
        0b010001 => special_data_branch_exchange(op, ctx),
        0b010010 | 0b010011 => memory::ldr_literal_t1(op),
        // 0101xx, 011xxx, 100xxx: load/store single data item
        0b010100..=0b100111 => load_store_single(op),
        0b101000 | 0b101001 => data::adr_t1(op),
        0b101010 | 0b101011 => data::add_sp_immediate_t1(op),
        0b101100..=0b101111 => miscellaneous(op, ctx),
        0b110000 | 0b110001 => memory::stm_t1(op),
        0b110010 | 0b110011 => memory::ldm_t1(op),
        0b110100..=0b110111 => conditional_branch_supervisor_call(op, ctx),
        0b111000 | 0b111001 => branch::b_t2(op, ctx),
        // 11101x and 1111xx are first halves of 32-bit instructions
        _ => Err(Rejection::Undefined),
    }
}

fn shift_add_sub_move_compare(op: u32, ctx: DecodeContext) -> Decoded {
    match bits(op, 13, 11) {
        0b000 => data::lsl_immediate_t1(op, ctx),
        0b001 => data::lsr_immediate_t1(op, ctx),
        0b010 => data::asr_immediate_t1(op, ctx),
        0b011 => match bits(op, 10, 9) {
            0b00 => data::arith_register_t1(op, ctx, ArithOp::Add),
            0b01 => data::arith_register_t1(op, ctx, ArithOp::Sub),
            0b10 => data::arith_immediate_t1(op, ctx, ArithOp::Add),
            _ => data::arith_immediate_t1(op, ctx, ArithOp::Sub),
        },
        0b100 => data::mov_immediate_t1(op, ctx),
        0b101 => data::cmp_immediate_t1(op),
        0b110 => data::arith_immediate_t2(op, ctx, ArithOp::Add),
        _ => data::arith_immediate_t2(op, ctx, ArithOp::Sub),
    }
}

fn special_data_branch_exchange(op: u32, ctx: DecodeContext) -> Decoded {
    match bits(op, 9, 6) {
        0b0000..=0b0011 => data::add_register_t2(op, ctx),
        0b0100 => Err(Rejection::Unpredictable),
        0b0101..=0b0111 => data::cmp_register_t2(op),
        0b1000..=0b1011 => data::mov_register_t1(op, ctx),
        _ if bit(op, 7) => branch::blx_register_t1(op, ctx),
        _ => branch::bx_t1(op, ctx),
    }
}

fn load_store_single(op: u32) -> Decoded {
    match bits(op, 15, 12) {
        0b0101 => {
            let (access, load) = match bits(op, 11, 9) {
                0b000 => (Access::Word, false),
                0b001 => (Access::Half, false),
                0b010 => (Access::Byte, false),
                0b011 => (Access::SignedByte, true),
                0b100 => (Access::Word, true),
                0b101 => (Access::Half, true),
                0b110 => (Access::Byte, true),
                _ => (Access::SignedHalf, true),
            };
            memory::load_store_register_t1(op, access, load)
        }
        0b0110 => memory::load_store_immediate_t1(op, Access::Word, bit(op, 11)),
        0b0111 => memory::load_store_immediate_t1(op, Access::Byte, bit(op, 11)),
        0b1000 => memory::load_store_immediate_t1(op, Access::Half, bit(op, 11)),
        _ => memory::load_store_sp_t2(op, bit(op, 11)),
    }
}

/// The `1011xx` group.
fn miscellaneous(op: u32, ctx: DecodeContext) -> Decoded {
    match bits(op, 11, 5) {
        0b000_0000..=0b000_0011 => data::add_sp_immediate_t2(op),
        0b000_0100..=0b000_0111 => data::sub_sp_immediate_t1(op),
        0b000_1000..=0b000_1111
        | 0b001_1000..=0b001_1111
        | 0b100_1000..=0b100_1111
        | 0b101_1000..=0b101_1111 => branch::cbz_t1(op, ctx),
        0b001_0000 | 0b001_0001 => builders::bits::extend_t1(op, ExtendKind::Sxth),
        0b001_0010 | 0b001_0011 => builders::bits::extend_t1(op, ExtendKind::Sxtb),
        0b001_0100 | 0b001_0101 => builders::bits::extend_t1(op, ExtendKind::Uxth),
        0b001_0110 | 0b001_0111 => builders::bits::extend_t1(op, ExtendKind::Uxtb),
        0b010_0000..=0b010_1111 => memory::push_t1(op),
        0b011_0011 => system::cps_t1(op, ctx),
        0b101_0000 | 0b101_0001 => builders::bits::reverse_t1(op, BitOpKind::Rev),
        0b101_0010 | 0b101_0011 => builders::bits::reverse_t1(op, BitOpKind::Rev16),
        0b101_0110 | 0b101_0111 => builders::bits::reverse_t1(op, BitOpKind::Revsh),
        0b110_0000..=0b110_1111 => memory::pop_t1(op, ctx),
        0b111_0000..=0b111_0111 => system::bkpt_t1(op),
        0b111_1000..=0b111_1111 if bits(op, 3, 0) != 0 => system::it_t1(op, ctx),
        0b111_1000..=0b111_1111 => system::hint(op),
        _ => Err(Rejection::Undefined),
    }
}

fn conditional_branch_supervisor_call(op: u32, ctx: DecodeContext) -> Decoded {
    match bits(op, 11, 8) {
        // UDF
        0b1110 => Err(Rejection::Undefined),
        0b1111 => system::svc_t1(op),
        _ => branch::b_t1(op, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{
        ArithImm, BlockMode, InstrFlags, LoadStore, Multiple, Offset, Operation, TestImm, TestOp,
    };
    use crate::registers::operand::{PcArg, RArg};

    const OUT: DecodeContext = DecodeContext::OUTSIDE_IT;

    #[test]
    fn test_decode_basic_arithmetic() {
        // SUBS R2, #3
        assert_eq!(
            decode(0x3A03, OUT),
            Ok(Operation::ArithImm(ArithImm {
                op: ArithOp::Sub,
                d: RArg::from_bits(2),
                n: RArg::from_bits(2),
                imm: 3,
                flags: InstrFlags::SET_FLAGS,
            }))
        );
        // CMP R1, #5
        assert!(matches!(
            decode(0x2905, OUT),
            Ok(Operation::TestImm(TestImm {
                op: TestOp::Cmp,
                ..
            }))
        ));
        // NEGS R0, R1
        assert!(matches!(
            decode(0x4248, OUT),
            Ok(Operation::ArithImm(ArithImm {
                op: ArithOp::Rsb,
                imm: 0,
                ..
            }))
        ));
    }

    #[test]
    fn test_decode_memory_ops() {
        // LDR R0, [PC, #8]
        assert_eq!(
            decode(0x4802, OUT),
            Ok(Operation::LoadLiteral(LoadStore {
                access: Access::Word,
                t: RArg::from_bits(0),
                n: PcArg::default(),
                offset: Offset::Imm(8),
                flags: InstrFlags::offset(),
            }))
        );
        // LDRSH R0, [R1, R2]
        assert!(matches!(
            decode(0x5E88, OUT),
            Ok(Operation::Load(LoadStore {
                access: Access::SignedHalf,
                ..
            }))
        ));
        // STR R0, [SP, #4]
        assert!(matches!(
            decode(0x9001, OUT),
            Ok(Operation::Store(LoadStore {
                n: RArg::SP,
                offset: Offset::Imm(4),
                ..
            }))
        ));
        // POP {R0, PC}
        assert_eq!(
            decode(0xBD01, OUT),
            Ok(Operation::LoadMultiple(Multiple {
                n: RArg::SP,
                registers: 0x8001,
                mode: BlockMode::IncrementAfter,
                wback: true,
            }))
        );
    }

    #[test]
    fn test_decode_misc() {
        assert_eq!(decode(0xBF00, OUT), Ok(Operation::Nop));
        assert_eq!(decode(0xBF30, OUT), Ok(Operation::Nop)); // WFI
        assert_eq!(decode(0xBEAB, OUT), Ok(Operation::Breakpoint(0xAB)));
        assert_eq!(decode(0xDF05, OUT), Ok(Operation::SupervisorCall(5)));
        assert!(matches!(decode(0xBF18, OUT), Ok(Operation::It(_))));
        assert!(matches!(decode(0xBA08, OUT), Ok(Operation::BitOp(_))));
    }

    #[test]
    fn test_decode_rejections() {
        // UDF
        assert_eq!(decode(0xDE00, OUT), Err(Rejection::Undefined));
        // REV with op 10 is unallocated
        assert_eq!(decode(0xBA80, OUT), Err(Rejection::Undefined));
        // opcode 0100 of the special data group
        assert_eq!(decode(0x4500, OUT), Err(Rejection::Unpredictable));
        // first half of a wide instruction
        assert_eq!(decode(0xF000, OUT), Err(Rejection::Undefined));
    }

    #[test]
    fn test_decode_is_total() {
        let contexts = [
            DecodeContext::OUTSIDE_IT,
            DecodeContext {
                in_it_block: true,
                last_in_it_block: false,
            },
            DecodeContext {
                in_it_block: true,
                last_in_it_block: true,
            },
        ];
        for ctx in contexts {
            for halfword in 0..=u16::MAX {
                // Either outcome is fine, it must simply return
                let _ = decode(halfword, ctx);
            }
        }
    }
}

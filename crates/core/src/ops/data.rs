// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{commit, nzcv, InstrFlags};
use crate::alu::{self, AddCarry, ExpandedImm, ImmShift, ShiftType};
use crate::registers::access::Processor;
use crate::registers::operand::{PcArg, RArg, RegArg};
use crate::registers::Apsr;
use crate::SimResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Adc,
    Sub,
    Sbc,
    Rsb,
}

impl ArithOp {
    pub fn apply(self, n: u32, m: u32, carry: bool) -> AddCarry {
        match self {
            ArithOp::Add => alu::add_with_carry(n, m, false),
            ArithOp::Adc => alu::add_with_carry(n, m, carry),
            ArithOp::Sub => alu::add_with_carry(n, !m, true),
            ArithOp::Sbc => alu::add_with_carry(n, !m, carry),
            ArithOp::Rsb => alu::add_with_carry(!n, m, true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Bic,
    Orr,
    Orn,
    Eor,
}

impl LogicOp {
    pub fn apply(self, n: u32, m: u32) -> u32 {
        match self {
            LogicOp::And => n & m,
            LogicOp::Bic => n & !m,
            LogicOp::Orr => n | m,
            LogicOp::Orn => n | !m,
            LogicOp::Eor => n ^ m,
        }
    }
}

/// Flag-only forms. They never write a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestOp {
    Tst,
    Teq,
    Cmp,
    Cmn,
}

impl TestOp {
    fn flags(self, apsr: Apsr, n: u32, m: u32, shifter_carry: bool) -> Apsr {
        let overflow = apsr.contains(Apsr::V);
        match self {
            TestOp::Tst => nzcv(apsr, n & m, shifter_carry, overflow),
            TestOp::Teq => nzcv(apsr, n ^ m, shifter_carry, overflow),
            TestOp::Cmp => {
                let r = alu::add_with_carry(n, !m, true);
                nzcv(apsr, r.value, r.carry_out, r.overflow)
            }
            TestOp::Cmn => {
                let r = alu::add_with_carry(n, m, false);
                nzcv(apsr, r.value, r.carry_out, r.overflow)
            }
        }
    }
}

fn arith_flags(flags: InstrFlags, apsr: Apsr, r: AddCarry) -> Option<Apsr> {
    flags
        .contains(InstrFlags::SET_FLAGS)
        .then(|| nzcv(apsr, r.value, r.carry_out, r.overflow))
}

fn logic_flags(flags: InstrFlags, apsr: Apsr, value: u32, carry: bool) -> Option<Apsr> {
    flags
        .contains(InstrFlags::SET_FLAGS)
        .then(|| nzcv(apsr, value, carry, apsr.contains(Apsr::V)))
}

/// ADD, ADC, SUB, SBC, RSB with an immediate. `N` is [`SpArg`] for the
/// SP-relative forms.
///
/// [`SpArg`]: crate::registers::operand::SpArg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithImm<N: RegArg = RArg> {
    pub op: ArithOp,
    pub d: RArg,
    pub n: N,
    pub imm: u32,
    pub flags: InstrFlags,
}

impl<N: RegArg> ArithImm<N> {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let n = cpu.read_register(self.n);
        let r = self.op.apply(n, self.imm, apsr.contains(Apsr::C));
        commit(cpu, self.d, r.value, arith_flags(self.flags, apsr, r))
    }
}

/// Arithmetic with a second register passed through an immediate shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithReg {
    pub op: ArithOp,
    pub d: RArg,
    pub n: RArg,
    pub m: RArg,
    pub shift: ImmShift,
    pub flags: InstrFlags,
}

impl ArithReg {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let carry = apsr.contains(Apsr::C);
        let n = cpu.read_register(self.n);
        let shifted = self.shift.apply(cpu.read_register(self.m), carry).value;
        let r = self.op.apply(n, shifted, carry);
        commit(cpu, self.d, r.value, arith_flags(self.flags, apsr, r))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicImm {
    pub op: LogicOp,
    pub d: RArg,
    pub n: RArg,
    pub imm: ExpandedImm,
    pub flags: InstrFlags,
}

impl LogicImm {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let value = self.op.apply(cpu.read_register(self.n), self.imm.value);
        let carry = self.imm.carry(apsr.contains(Apsr::C));
        commit(cpu, self.d, value, logic_flags(self.flags, apsr, value, carry))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicReg {
    pub op: LogicOp,
    pub d: RArg,
    pub n: RArg,
    pub m: RArg,
    pub shift: ImmShift,
    pub flags: InstrFlags,
}

impl LogicReg {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let shifted = self
            .shift
            .apply(cpu.read_register(self.m), apsr.contains(Apsr::C));
        let value = self.op.apply(cpu.read_register(self.n), shifted.value);
        commit(
            cpu,
            self.d,
            value,
            logic_flags(self.flags, apsr, value, shifted.carry_out),
        )
    }
}

/// MOV or MVN with a modified immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveImm {
    pub d: RArg,
    pub imm: ExpandedImm,
    pub negate: bool,
    pub flags: InstrFlags,
}

impl MoveImm {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let value = if self.negate {
            !self.imm.value
        } else {
            self.imm.value
        };
        let carry = self.imm.carry(apsr.contains(Apsr::C));
        commit(cpu, self.d, value, logic_flags(self.flags, apsr, value, carry))
    }
}

/// MOV, MVN and the immediate shifts LSL/LSR/ASR/ROR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReg {
    pub d: RArg,
    pub m: RArg,
    pub shift: ImmShift,
    pub negate: bool,
    pub flags: InstrFlags,
}

impl MoveReg {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let shifted = self
            .shift
            .apply(cpu.read_register(self.m), apsr.contains(Apsr::C));
        let value = if self.negate {
            !shifted.value
        } else {
            shifted.value
        };
        commit(
            cpu,
            self.d,
            value,
            logic_flags(self.flags, apsr, value, shifted.carry_out),
        )
    }
}

/// Rotate right with extend: one bit, carry in at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rrx {
    pub d: RArg,
    pub m: RArg,
    pub flags: InstrFlags,
}

impl Rrx {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let r = alu::rrx_c(cpu.read_register(self.m), apsr.contains(Apsr::C));
        commit(
            cpu,
            self.d,
            r.value,
            logic_flags(self.flags, apsr, r.value, r.carry_out),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestImm {
    pub op: TestOp,
    pub n: RArg,
    pub imm: ExpandedImm,
}

impl TestImm {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let carry = self.imm.carry(apsr.contains(Apsr::C));
        let next = self
            .op
            .flags(apsr, cpu.read_register(self.n), self.imm.value, carry);
        cpu.write_special(crate::SpecialRegisterId::Apsr, next.bits())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestReg {
    pub op: TestOp,
    pub n: RArg,
    pub m: RArg,
    pub shift: ImmShift,
}

impl TestReg {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let shifted = self
            .shift
            .apply(cpu.read_register(self.m), apsr.contains(Apsr::C));
        let next = self.op.flags(
            apsr,
            cpu.read_register(self.n),
            shifted.value,
            shifted.carry_out,
        );
        cpu.write_special(crate::SpecialRegisterId::Apsr, next.bits())?;
        Ok(())
    }
}

/// LSL/LSR/ASR/ROR by the bottom byte of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftReg {
    pub kind: ShiftType,
    pub d: RArg,
    pub n: RArg,
    pub m: RArg,
    pub flags: InstrFlags,
}

impl ShiftReg {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let apsr = cpu.apsr()?;
        let amount = cpu.read_register(self.m) & 0xFF;
        let r = alu::shift_c(
            cpu.read_register(self.n),
            self.kind,
            amount,
            apsr.contains(Apsr::C),
        );
        commit(
            cpu,
            self.d,
            r.value,
            logic_flags(self.flags, apsr, r.value, r.carry_out),
        )
    }
}

/// ADR: Align(PC, 4) plus or minus an offset. Never touches the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adr {
    pub d: RArg,
    pub imm: u32,
    pub add: bool,
}

impl Adr {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let base = cpu.read_register(PcArg::default()) & !0x3;
        let op = if self.add { ArithOp::Add } else { ArithOp::Sub };
        let value = op.apply(base, self.imm, false).value;
        commit(cpu, self.d, value, None)
    }
}

/// MOVW writes the low half, MOVT replaces the high half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveWide {
    pub d: RArg,
    pub imm16: u16,
    pub top: bool,
}

impl MoveWide {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let value = if self.top {
            (cpu.read_register(self.d) & 0xFFFF) | ((self.imm16 as u32) << 16)
        } else {
            self.imm16 as u32
        };
        commit(cpu, self.d, value, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::*;
    use crate::registers::operand::SpArg;

    fn rsb_imm(imm: u32, flags: InstrFlags) -> ArithImm {
        ArithImm {
            op: ArithOp::Rsb,
            d: RArg::from_bits(0),
            n: RArg::from_bits(1),
            imm,
            flags,
        }
    }

    #[test]
    fn test_rsb_immediate_sets_flags() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 5);
        rsb_imm(3, InstrFlags::SET_FLAGS).execute(&mut cpu).unwrap();
        assert_eq!(get(&cpu, 0), 0xFFFF_FFFE);
        assert_eq!(flags(&cpu), Apsr::N);
    }

    #[test]
    fn test_non_flag_setting_variant_leaves_flags() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 5);
        set_flags(&mut cpu, Apsr::Z | Apsr::C | Apsr::Q);
        rsb_imm(3, InstrFlags::empty()).execute(&mut cpu).unwrap();
        assert_eq!(get(&cpu, 0), 0xFFFF_FFFE);
        assert_eq!(flags(&cpu), Apsr::Z | Apsr::C | Apsr::Q);
    }

    #[test]
    fn test_flag_update_keeps_q_and_ge() {
        let mut cpu = cpu_at(0x100);
        set_flags(&mut cpu, Apsr::Q | Apsr::GE | Apsr::V);
        set(&mut cpu, 1, 3);
        rsb_imm(3, InstrFlags::SET_FLAGS).execute(&mut cpu).unwrap();
        assert_eq!(get(&cpu, 0), 0);
        assert_eq!(flags(&cpu), Apsr::Q | Apsr::GE | Apsr::Z | Apsr::C);
    }

    #[test]
    fn test_rsb_register_with_shift() {
        // RSBS R2, R3, R4, LSL #2 : 4*4 - 20 = -4
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 3, 20);
        set(&mut cpu, 4, 4);
        ArithReg {
            op: ArithOp::Rsb,
            d: RArg::from_bits(2),
            n: RArg::from_bits(3),
            m: RArg::from_bits(4),
            shift: ImmShift::lsl(2),
            flags: InstrFlags::SET_FLAGS,
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(get(&cpu, 2), (-4i32) as u32);
        assert_eq!(flags(&cpu), Apsr::N);
    }

    #[test]
    fn test_adc_sbc_use_carry() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 10);
        set(&mut cpu, 2, 3);
        set_flags(&mut cpu, Apsr::C);
        let adc = ArithReg {
            op: ArithOp::Adc,
            d: RArg::from_bits(0),
            n: RArg::from_bits(1),
            m: RArg::from_bits(2),
            shift: ImmShift::NONE,
            flags: InstrFlags::empty(),
        };
        adc.execute(&mut cpu).unwrap();
        assert_eq!(get(&cpu, 0), 14);

        set_flags(&mut cpu, Apsr::empty());
        ArithReg {
            op: ArithOp::Sbc,
            ..adc
        }
        .execute(&mut cpu)
        .unwrap();
        // 10 - 3 - 1
        assert_eq!(get(&cpu, 0), 6);
    }

    #[test]
    fn test_logic_keeps_overflow_and_uses_shifter_carry() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 0xFFFF_0000);
        set(&mut cpu, 2, 0x8000_0001);
        set_flags(&mut cpu, Apsr::V);
        LogicReg {
            op: LogicOp::And,
            d: RArg::from_bits(0),
            n: RArg::from_bits(1),
            m: RArg::from_bits(2),
            shift: ImmShift::lsl(1),
            flags: InstrFlags::SET_FLAGS,
        }
        .execute(&mut cpu)
        .unwrap();
        // (0x80000001 << 1) = 0x00000002, carry out = 1
        assert_eq!(get(&cpu, 0), 0);
        assert_eq!(flags(&cpu), Apsr::Z | Apsr::C | Apsr::V);
    }

    #[test]
    fn test_rrx_moves_carry_into_top_bit() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 0x0000_0003);
        set_flags(&mut cpu, Apsr::C);
        Rrx {
            d: RArg::from_bits(0),
            m: RArg::from_bits(1),
            flags: InstrFlags::SET_FLAGS,
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(get(&cpu, 0), 0x8000_0001);
        assert_eq!(flags(&cpu), Apsr::N | Apsr::C);
    }

    #[test]
    fn test_adr_aligns_pc_and_ignores_flags() {
        let mut cpu = cpu_at(0x102);
        set_flags(&mut cpu, Apsr::Z);
        Adr {
            d: RArg::from_bits(3),
            imm: 0x10,
            add: true,
        }
        .execute(&mut cpu)
        .unwrap();
        // PC reads 0x106, aligned to 0x104
        assert_eq!(get(&cpu, 3), 0x114);

        Adr {
            d: RArg::from_bits(3),
            imm: 0x200,
            add: false,
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(get(&cpu, 3), 0x104u32.wrapping_sub(0x200));
        assert_eq!(flags(&cpu), Apsr::Z);
    }

    #[test]
    fn test_compare_and_test() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 5);
        TestImm {
            op: TestOp::Cmp,
            n: RArg::from_bits(1),
            imm: ExpandedImm {
                value: 5,
                carry_out: None,
            },
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(flags(&cpu), Apsr::Z | Apsr::C);

        TestImm {
            op: TestOp::Tst,
            n: RArg::from_bits(1),
            imm: ExpandedImm {
                value: 0x8000_0000,
                carry_out: Some(true),
            },
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(flags(&cpu), Apsr::Z | Apsr::C);
        assert_eq!(get(&cpu, 1), 5);
    }

    #[test]
    fn test_add_sp_immediate_uses_fixed_operand() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 13, 0x2000_0100);
        ArithImm {
            op: ArithOp::Add,
            d: RArg::from_bits(2),
            n: SpArg::default(),
            imm: 8,
            flags: InstrFlags::empty(),
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(get(&cpu, 2), 0x2000_0108);
    }

    #[test]
    fn test_shift_by_register_uses_low_byte() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 0x8000_0000);
        set(&mut cpu, 2, 0x0000_0120);
        ShiftReg {
            kind: ShiftType::Lsr,
            d: RArg::from_bits(0),
            n: RArg::from_bits(1),
            m: RArg::from_bits(2),
            flags: InstrFlags::SET_FLAGS,
        }
        .execute(&mut cpu)
        .unwrap();
        // Amount 0x20 = 32: result 0, carry = bit 31
        assert_eq!(get(&cpu, 0), 0);
        assert_eq!(flags(&cpu), Apsr::Z | Apsr::C);
    }

    #[test]
    fn test_movw_movt() {
        let mut cpu = cpu_at(0x100);
        let d = RArg::from_bits(4);
        MoveWide {
            d,
            imm16: 0x5678,
            top: false,
        }
        .execute(&mut cpu)
        .unwrap();
        MoveWide {
            d,
            imm16: 0x1234,
            top: true,
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(get(&cpu, 4), 0x1234_5678);
    }

    #[test]
    fn test_mov_to_pc_branches() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 0x2001);
        MoveReg {
            d: RArg::PC,
            m: RArg::from_bits(1),
            shift: ImmShift::NONE,
            negate: false,
            flags: InstrFlags::empty(),
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(cpu.pending_branch(), Some(0x2000));
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Disassembly text for built operations, used by the instruction trace.
//!
//! Immediates print in decimal. Branch offsets are relative to the
//! instruction's PC value (its address + 4).

use super::*;
use crate::alu::{ImmShift, ShiftType};
use crate::registers::it::Condition;
use std::fmt;

fn s(flags: InstrFlags) -> &'static str {
    if flags.contains(InstrFlags::SET_FLAGS) {
        "S"
    } else {
        ""
    }
}

fn shift_name(kind: ShiftType) -> &'static str {
    match kind {
        ShiftType::Lsl => "LSL",
        ShiftType::Lsr => "LSR",
        ShiftType::Asr => "ASR",
        ShiftType::Ror => "ROR",
        ShiftType::Rrx => "RRX",
    }
}

/// `, LSL #2` style suffix of a shifted register operand.
struct Shifted(ImmShift);

impl fmt::Display for Shifted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ImmShift {
                kind: ShiftType::Rrx,
                ..
            } => f.write_str(", RRX"),
            ImmShift { amount: 0, .. } => Ok(()),
            ImmShift { kind, amount } => write!(f, ", {} #{}", shift_name(kind), amount),
        }
    }
}

/// `[Rn, #imm]`, `[Rn], #imm` or `[Rn, #imm]!`.
struct Address<N: RegArg> {
    n: N,
    offset: Offset,
    flags: InstrFlags,
}

impl<N: RegArg> fmt::Display for Address<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.flags.contains(InstrFlags::ADD) {
            ""
        } else {
            "-"
        };
        let offset = match self.offset {
            Offset::Imm(imm) => format!("#{}{}", sign, imm),
            Offset::Reg { m, shift: 0 } => format!("{}", m),
            Offset::Reg { m, shift } => format!("{}, LSL #{}", m, shift),
        };
        let index = self.flags.contains(InstrFlags::INDEX);
        let wback = self.flags.contains(InstrFlags::WBACK);
        match (index, wback) {
            (true, false) => write!(f, "[{}, {}]", self.n, offset),
            (false, _) => write!(f, "[{}], {}", self.n, offset),
            (true, true) => write!(f, "[{}, {}]!", self.n, offset),
        }
    }
}

struct RegisterList(u16);

impl fmt::Display for RegisterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for i in (0..16u32).filter(|i| self.0 & (1 << i) != 0) {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}", RArg::from_bits(i))?;
            first = false;
        }
        f.write_str("}")
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "ADD",
            ArithOp::Adc => "ADC",
            ArithOp::Sub => "SUB",
            ArithOp::Sbc => "SBC",
            ArithOp::Rsb => "RSB",
        })
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicOp::And => "AND",
            LogicOp::Bic => "BIC",
            LogicOp::Orr => "ORR",
            LogicOp::Orn => "ORN",
            LogicOp::Eor => "EOR",
        })
    }
}

impl fmt::Display for TestOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestOp::Tst => "TST",
            TestOp::Teq => "TEQ",
            TestOp::Cmp => "CMP",
            TestOp::Cmn => "CMN",
        })
    }
}

impl<N: RegArg> fmt::Display for ArithImm<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}, {}, #{}",
            self.op,
            s(self.flags),
            self.d,
            self.n,
            self.imm
        )
    }
}

impl fmt::Display for ArithReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}, {}, {}{}",
            self.op,
            s(self.flags),
            self.d,
            self.n,
            self.m,
            Shifted(self.shift)
        )
    }
}

impl fmt::Display for LogicImm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}, {}, #{}",
            self.op,
            s(self.flags),
            self.d,
            self.n,
            self.imm.value
        )
    }
}

impl fmt::Display for LogicReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}, {}, {}{}",
            self.op,
            s(self.flags),
            self.d,
            self.n,
            self.m,
            Shifted(self.shift)
        )
    }
}

impl fmt::Display for MoveImm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = if self.negate { "MVN" } else { "MOV" };
        write!(f, "{}{} {}, #{}", mnemonic, s(self.flags), self.d, self.imm.value)
    }
}

impl fmt::Display for MoveReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = s(self.flags);
        if self.negate {
            write!(f, "MVN{} {}, {}{}", flags, self.d, self.m, Shifted(self.shift))
        } else if self.shift == ImmShift::NONE {
            write!(f, "MOV{} {}, {}", flags, self.d, self.m)
        } else {
            // Shifts by an immediate are MOV with a shifted operand
            write!(
                f,
                "{}{} {}, {}, #{}",
                shift_name(self.shift.kind),
                flags,
                self.d,
                self.m,
                self.shift.amount
            )
        }
    }
}

impl fmt::Display for Rrx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RRX{} {}, {}", s(self.flags), self.d, self.m)
    }
}

impl fmt::Display for TestImm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, #{}", self.op, self.n, self.imm.value)
    }
}

impl fmt::Display for TestReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, {}{}", self.op, self.n, self.m, Shifted(self.shift))
    }
}

impl fmt::Display for ShiftReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}, {}, {}",
            shift_name(self.kind),
            s(self.flags),
            self.d,
            self.n,
            self.m
        )
    }
}

impl fmt::Display for Adr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.add { "" } else { "-" };
        write!(f, "ADR {}, #{}{}", self.d, sign, self.imm)
    }
}

impl fmt::Display for MoveWide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = if self.top { "MOVT" } else { "MOVW" };
        write!(f, "{} {}, #{}", mnemonic, self.d, self.imm16)
    }
}

impl fmt::Display for Multiply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MulKind::Mul => write!(
                f,
                "MUL{} {}, {}, {}",
                s(self.flags),
                self.d,
                self.n,
                self.m
            ),
            MulKind::Mla | MulKind::Mls => {
                let mnemonic = if self.kind == MulKind::Mla {
                    "MLA"
                } else {
                    "MLS"
                };
                write!(f, "{} {}, {}, {}, {}", mnemonic, self.d, self.n, self.m, self.a)
            }
        }
    }
}

impl fmt::Display for LongMultiply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self.kind {
            LongMulKind::Smull => "SMULL",
            LongMulKind::Umull => "UMULL",
            LongMulKind::Smlal => "SMLAL",
            LongMulKind::Umlal => "UMLAL",
        };
        write!(
            f,
            "{} {}, {}, {}, {}",
            mnemonic, self.dlo, self.dhi, self.n, self.m
        )
    }
}

impl fmt::Display for Divide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = if self.signed { "SDIV" } else { "UDIV" };
        write!(f, "{} {}, {}, {}", mnemonic, self.d, self.n, self.m)
    }
}

impl fmt::Display for Extend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self.kind {
            ExtendKind::Sxtb => "SXTB",
            ExtendKind::Sxth => "SXTH",
            ExtendKind::Uxtb => "UXTB",
            ExtendKind::Uxth => "UXTH",
        };
        write!(f, "{} {}, {}", mnemonic, self.d, self.m)?;
        if self.rotation != 0 {
            write!(f, ", ROR #{}", self.rotation)?;
        }
        Ok(())
    }
}

impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BitFieldKind::Bfc => write!(f, "BFC {}, #{}, #{}", self.d, self.lsb, self.width),
            kind => {
                let mnemonic = match kind {
                    BitFieldKind::Bfi => "BFI",
                    BitFieldKind::Sbfx => "SBFX",
                    _ => "UBFX",
                };
                write!(
                    f,
                    "{} {}, {}, #{}, #{}",
                    mnemonic, self.d, self.n, self.lsb, self.width
                )
            }
        }
    }
}

impl fmt::Display for BitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self.kind {
            BitOpKind::Clz => "CLZ",
            BitOpKind::Rbit => "RBIT",
            BitOpKind::Rev => "REV",
            BitOpKind::Rev16 => "REV16",
            BitOpKind::Revsh => "REVSH",
        };
        write!(f, "{} {}, {}", mnemonic, self.d, self.m)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{} #{}", self.cond.suffix(), self.offset)
    }
}

impl fmt::Display for BranchLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BL #{}", self.offset)
    }
}

impl fmt::Display for BranchExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = if self.link { "BLX" } else { "BX" };
        write!(f, "{} {}", mnemonic, self.m)
    }
}

impl fmt::Display for CompareBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = if self.nonzero { "CBNZ" } else { "CBZ" };
        write!(f, "{} {}, #{}", mnemonic, self.n, self.offset)
    }
}

impl fmt::Display for TableBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.half {
            write!(f, "TBH [{}, {}, LSL #1]", self.n, self.m)
        } else {
            write!(f, "TBB [{}, {}]", self.n, self.m)
        }
    }
}

fn access_suffix(access: Access) -> &'static str {
    match access {
        Access::Byte => "B",
        Access::SignedByte => "SB",
        Access::Half => "H",
        Access::SignedHalf => "SH",
        Access::Word => "",
    }
}

impl<N: RegArg> LoadStore<N> {
    fn render(&self, f: &mut fmt::Formatter<'_>, base: &str) -> fmt::Result {
        let unprivileged = if self.flags.contains(InstrFlags::UNPRIV) {
            "T"
        } else {
            ""
        };
        let address = Address {
            n: self.n,
            offset: self.offset,
            flags: self.flags,
        };
        write!(
            f,
            "{}{}{} {}, {}",
            base,
            access_suffix(self.access),
            unprivileged,
            self.t,
            address
        )
    }
}

impl LoadStoreDual {
    fn render(&self, f: &mut fmt::Formatter<'_>, mnemonic: &str) -> fmt::Result {
        let address = Address {
            n: self.n,
            offset: Offset::Imm(self.imm),
            flags: self.flags,
        };
        write!(f, "{} {}, {}, {}", mnemonic, self.t, self.t2, address)
    }
}

impl Multiple {
    fn render(&self, f: &mut fmt::Formatter<'_>, load: bool) -> fmt::Result {
        let list = RegisterList(self.registers);
        let stack = self.n.is_sp() && self.wback;
        match (load, self.mode) {
            (true, BlockMode::IncrementAfter) if stack => write!(f, "POP {}", list),
            (false, BlockMode::DecrementBefore) if stack => write!(f, "PUSH {}", list),
            _ => {
                let base = if load { "LDM" } else { "STM" };
                let mode = match self.mode {
                    BlockMode::IncrementAfter => "",
                    BlockMode::DecrementBefore => "DB",
                };
                let wback = if self.wback { "!" } else { "" };
                write!(f, "{}{} {}{}, {}", base, mode, self.n, wback, list)
            }
        }
    }
}

impl fmt::Display for It {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IT")?;
        let first = self.firstcond & 1;
        let length = 3u32.saturating_sub((self.mask & 0xF).trailing_zeros());
        for i in 0..length {
            let bit = (self.mask >> (3 - i)) & 1;
            f.write_str(if bit == first { "T" } else { "E" })?;
        }
        let cond = Condition::from_bits(self.firstcond as u32);
        match cond.suffix() {
            "" => f.write_str(" AL"),
            suffix => write!(f, " {}", suffix),
        }
    }
}

impl SysmTarget {
    fn name(self) -> &'static str {
        match self {
            SysmTarget::Psr {
                ipsr: false,
                apsr: true,
            } => "APSR",
            SysmTarget::Psr {
                ipsr: true,
                apsr: true,
            } => "IAPSR",
            SysmTarget::Psr {
                ipsr: true,
                apsr: false,
            } => "IPSR",
            SysmTarget::Psr { .. } => "EPSR",
            SysmTarget::Msp => "MSP",
            SysmTarget::Psp => "PSP",
            SysmTarget::Primask => "PRIMASK",
            SysmTarget::Basepri => "BASEPRI",
            SysmTarget::BasepriMax => "BASEPRI_MAX",
            SysmTarget::Faultmask => "FAULTMASK",
            SysmTarget::Control => "CONTROL",
        }
    }
}

impl fmt::Display for Mrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MRS {}, {}", self.d, self.target.name())
    }
}

impl fmt::Display for Msr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MSR {}", self.target.name())?;
        if let SysmTarget::Psr { apsr: true, .. } = self.target {
            f.write_str("_")?;
            if self.mask & 0b10 != 0 {
                f.write_str("nzcvq")?;
            }
            if self.mask & 0b01 != 0 {
                f.write_str("g")?;
            }
        }
        write!(f, ", {}", self.n)
    }
}

impl fmt::Display for Cps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = if self.enable { "CPSIE" } else { "CPSID" };
        write!(f, "{} ", mnemonic)?;
        if self.primask {
            f.write_str("i")?;
        }
        if self.faultmask {
            f.write_str("f")?;
        }
        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ArithImm(op) => op.fmt(f),
            Operation::ArithSpImm(op) => op.fmt(f),
            Operation::ArithReg(op) => op.fmt(f),
            Operation::LogicImm(op) => op.fmt(f),
            Operation::LogicReg(op) => op.fmt(f),
            Operation::MoveImm(op) => op.fmt(f),
            Operation::MoveReg(op) => op.fmt(f),
            Operation::Rrx(op) => op.fmt(f),
            Operation::TestImm(op) => op.fmt(f),
            Operation::TestReg(op) => op.fmt(f),
            Operation::ShiftReg(op) => op.fmt(f),
            Operation::Adr(op) => op.fmt(f),
            Operation::MoveWide(op) => op.fmt(f),

            Operation::Multiply(op) => op.fmt(f),
            Operation::LongMultiply(op) => op.fmt(f),
            Operation::Divide(op) => op.fmt(f),

            Operation::Extend(op) => op.fmt(f),
            Operation::BitField(op) => op.fmt(f),
            Operation::BitOp(op) => op.fmt(f),

            Operation::Branch(op) => op.fmt(f),
            Operation::BranchLink(op) => op.fmt(f),
            Operation::BranchExchange(op) => op.fmt(f),
            Operation::CompareBranch(op) => op.fmt(f),
            Operation::TableBranch(op) => op.fmt(f),

            Operation::Load(op) => op.render(f, "LDR"),
            Operation::LoadLiteral(op) => op.render(f, "LDR"),
            Operation::Store(op) => op.render(f, "STR"),
            Operation::LoadDual(op) => op.render(f, "LDRD"),
            Operation::StoreDual(op) => op.render(f, "STRD"),
            Operation::LoadMultiple(op) => op.render(f, true),
            Operation::StoreMultiple(op) => op.render(f, false),

            Operation::It(op) => op.fmt(f),
            Operation::Mrs(op) => op.fmt(f),
            Operation::Msr(op) => op.fmt(f),
            Operation::Cps(op) => op.fmt(f),
            Operation::Nop => f.write_str("NOP"),
            Operation::Breakpoint(imm) => write!(f, "BKPT #{}", imm),
            Operation::SupervisorCall(imm) => write!(f, "SVC #{}", imm),
        }
    }
}

/// An operation rendered under the condition of its IT block slot.
pub struct Conditional<'a> {
    pub op: &'a Operation,
    pub cond: Condition,
}

impl fmt::Display for Conditional<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.op.to_string();
        match text.split_once(' ') {
            Some((mnemonic, operands)) => {
                write!(f, "{}{} {}", mnemonic, self.cond.suffix(), operands)
            }
            None => write!(f, "{}{}", text, self.cond.suffix()),
        }
    }
}

impl Operation {
    /// Display adapter that adds the condition suffix of an IT block slot.
    pub fn conditional(&self, cond: Condition) -> Conditional<'_> {
        Conditional { op: self, cond }
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::branch::bx_write_pc;
use super::InstrFlags;
use crate::peripherals::{self, Checkpoint};
use crate::registers::access::Processor;
use crate::registers::operand::{RArg, RegArg};
use crate::registers::{ccr, SpecialRegisterId};
use crate::{AccessFault, Bus, SimResult, SimulationError, UsageFault};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Byte,
    SignedByte,
    Half,
    SignedHalf,
    Word,
}

impl Access {
    pub fn size(self) -> u8 {
        match self {
            Access::Byte | Access::SignedByte => 1,
            Access::Half | Access::SignedHalf => 2,
            Access::Word => 4,
        }
    }

    fn extend(self, raw: u32) -> u32 {
        match self {
            Access::SignedByte => raw as u8 as i8 as i32 as u32,
            Access::SignedHalf => raw as u16 as i16 as i32 as u32,
            _ => raw,
        }
    }
}

/// Unaligned halfword/word accesses are allowed unless CCR.UNALIGN_TRP is
/// set. Strictly aligned accesses (LDRD, LDM, ...) always fault.
fn check_alignment<P: Processor>(cpu: &P, address: u32, size: u8, strict: bool) -> SimResult<()> {
    if size == 1 || address % size as u32 == 0 {
        return Ok(());
    }
    if strict || cpu.read_special(SpecialRegisterId::Ccr)? & ccr::UNALIGN_TRP != 0 {
        return Err(SimulationError::UsageFault(UsageFault::Unaligned));
    }
    Ok(())
}

/// The system register blocks only answer privileged accesses.
fn check_privilege<P: Processor>(cpu: &P, address: u32, unprivileged: bool) -> SimResult<()> {
    if peripherals::is_system_register(address) && (unprivileged || !cpu.is_privileged()?) {
        return Err(AccessFault::Unprivileged(address).into());
    }
    Ok(())
}

fn load_raw<P: Processor, B: Bus + ?Sized>(
    cpu: &mut P,
    bus: &B,
    address: u32,
    size: u8,
) -> SimResult<u32> {
    if peripherals::is_system_register(address) {
        check_privilege(cpu, address, false)?;
        return Ok(peripherals::read(cpu, address, size)?);
    }
    let addr = address as u64;
    let value = match size {
        1 => bus.read_u8(addr)? as u32,
        2 => bus.read_u16(addr)? as u32,
        _ => bus.read_u32(addr)?,
    };
    Ok(value)
}

/// Data read through the system register blocks or the bus.
pub(crate) fn read_memory<P: Processor, B: Bus + ?Sized>(
    cpu: &mut P,
    bus: &B,
    address: u32,
    access: Access,
) -> SimResult<u32> {
    check_alignment(cpu, address, access.size(), false)?;
    let raw = load_raw(cpu, bus, address, access.size())?;
    Ok(access.extend(raw))
}

pub(crate) fn write_memory<P: Processor, B: Bus + ?Sized>(
    cpu: &mut P,
    bus: &mut B,
    address: u32,
    size: u8,
    value: u32,
) -> SimResult<()> {
    check_alignment(cpu, address, size, false)?;
    if peripherals::is_system_register(address) {
        check_privilege(cpu, address, false)?;
        return Ok(peripherals::write(cpu, address, size, value)?);
    }
    let addr = address as u64;
    match size {
        1 => bus.write_u8(addr, value as u8)?,
        2 => bus.write_u16(addr, value as u16)?,
        _ => bus.write_u32(addr, value)?,
    }
    Ok(())
}

fn read_word_aligned<P: Processor, B: Bus + ?Sized>(
    cpu: &mut P,
    bus: &B,
    address: u32,
) -> SimResult<u32> {
    check_alignment(cpu, address, 4, true)?;
    load_raw(cpu, bus, address, 4)
}

fn write_word_aligned<P: Processor, B: Bus + ?Sized>(
    cpu: &mut P,
    bus: &mut B,
    address: u32,
    value: u32,
) -> SimResult<()> {
    check_alignment(cpu, address, 4, true)?;
    write_memory(cpu, bus, address, 4, value)
}

/// Runs a transfer of `words` words from `start`. When the span reaches a
/// system register block, the block-backed registers are put back if the
/// transfer fails, so a fault on a later word leaves no register changed.
/// Words already stored to the bus stay written.
fn transfer<P: Processor>(
    cpu: &mut P,
    start: u32,
    words: u32,
    body: impl FnOnce(&mut P) -> SimResult<()>,
) -> SimResult<()> {
    if !peripherals::spans_system_registers(start, words) {
        return body(cpu);
    }
    let checkpoint = Checkpoint::take(cpu)?;
    let result = body(cpu);
    if result.is_err() {
        checkpoint.restore(cpu)?;
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Imm(u32),
    /// Register shifted left by 0-3.
    Reg { m: RArg, shift: u8 },
}

/// Single register load/store. A PC base (literal loads) is word aligned
/// before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStore<N: RegArg = RArg> {
    pub access: Access,
    pub t: RArg,
    pub n: N,
    pub offset: Offset,
    pub flags: InstrFlags,
}

impl<N: RegArg> LoadStore<N> {
    /// (address used for the access, address written back)
    fn addresses<P: Processor>(&self, cpu: &P) -> (u32, u32) {
        let mut base = cpu.read_register(self.n);
        if self.n.is_pc() {
            base &= !0x3;
        }
        let offset = match self.offset {
            Offset::Imm(imm) => imm,
            Offset::Reg { m, shift } => cpu.read_register(m) << shift,
        };
        let offset_addr = if self.flags.contains(InstrFlags::ADD) {
            base.wrapping_add(offset)
        } else {
            base.wrapping_sub(offset)
        };
        let address = if self.flags.contains(InstrFlags::INDEX) {
            offset_addr
        } else {
            base
        };
        (address, offset_addr)
    }

    pub fn load<P: Processor, B: Bus + ?Sized>(&self, cpu: &mut P, bus: &mut B) -> SimResult<()> {
        let (address, offset_addr) = self.addresses(cpu);
        check_privilege(cpu, address, self.flags.contains(InstrFlags::UNPRIV))?;
        let value = read_memory(cpu, bus, address, self.access)?;
        if self.t.is_pc() {
            if address & 0x3 != 0 {
                return Err(SimulationError::UsageFault(UsageFault::Unaligned));
            }
            bx_write_pc(cpu, value)?;
        }
        if self.flags.contains(InstrFlags::WBACK) {
            cpu.write_register(self.n, offset_addr);
        }
        if !self.t.is_pc() {
            cpu.write_register(self.t, value);
        }
        Ok(())
    }

    pub fn store<P: Processor, B: Bus + ?Sized>(&self, cpu: &mut P, bus: &mut B) -> SimResult<()> {
        let (address, offset_addr) = self.addresses(cpu);
        check_privilege(cpu, address, self.flags.contains(InstrFlags::UNPRIV))?;
        let value = cpu.read_register(self.t);
        write_memory(cpu, bus, address, self.access.size(), value)?;
        if self.flags.contains(InstrFlags::WBACK) {
            cpu.write_register(self.n, offset_addr);
        }
        Ok(())
    }
}

/// LDRD/STRD with an immediate offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStoreDual {
    pub t: RArg,
    pub t2: RArg,
    pub n: RArg,
    pub imm: u32,
    pub flags: InstrFlags,
}

impl LoadStoreDual {
    fn addresses<P: Processor>(&self, cpu: &P) -> (u32, u32) {
        let mut base = cpu.read_register(self.n);
        if self.n.is_pc() {
            base &= !0x3;
        }
        let offset_addr = if self.flags.contains(InstrFlags::ADD) {
            base.wrapping_add(self.imm)
        } else {
            base.wrapping_sub(self.imm)
        };
        let address = if self.flags.contains(InstrFlags::INDEX) {
            offset_addr
        } else {
            base
        };
        (address, offset_addr)
    }

    pub fn load<P: Processor, B: Bus + ?Sized>(&self, cpu: &mut P, bus: &mut B) -> SimResult<()> {
        let (address, offset_addr) = self.addresses(cpu);
        transfer(cpu, address, 2, |cpu| {
            let first = read_word_aligned(cpu, bus, address)?;
            let second = read_word_aligned(cpu, bus, address.wrapping_add(4))?;
            if self.flags.contains(InstrFlags::WBACK) {
                cpu.write_register(self.n, offset_addr);
            }
            cpu.write_register(self.t, first);
            cpu.write_register(self.t2, second);
            Ok(())
        })
    }

    pub fn store<P: Processor, B: Bus + ?Sized>(&self, cpu: &mut P, bus: &mut B) -> SimResult<()> {
        let (address, offset_addr) = self.addresses(cpu);
        let first = cpu.read_register(self.t);
        let second = cpu.read_register(self.t2);
        transfer(cpu, address, 2, |cpu| {
            write_word_aligned(cpu, bus, address, first)?;
            write_word_aligned(cpu, bus, address.wrapping_add(4), second)?;
            if self.flags.contains(InstrFlags::WBACK) {
                cpu.write_register(self.n, offset_addr);
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockMode {
    IncrementAfter,
    DecrementBefore,
}

/// LDM/STM family, including PUSH and POP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiple {
    pub n: RArg,
    pub registers: u16,
    pub mode: BlockMode,
    pub wback: bool,
}

impl Multiple {
    fn span(&self) -> u32 {
        4 * self.registers.count_ones()
    }

    /// (lowest address accessed, value written back)
    fn addresses<P: Processor>(&self, cpu: &P) -> (u32, u32) {
        let base = cpu.read_register(self.n);
        match self.mode {
            BlockMode::IncrementAfter => (base, base.wrapping_add(self.span())),
            BlockMode::DecrementBefore => {
                let start = base.wrapping_sub(self.span());
                (start, start)
            }
        }
    }

    fn listed(&self) -> impl Iterator<Item = RArg> + '_ {
        (0..16u32)
            .filter(move |i| self.registers & (1 << i) != 0)
            .map(RArg::from_bits)
    }

    pub fn load<P: Processor, B: Bus + ?Sized>(&self, cpu: &mut P, bus: &mut B) -> SimResult<()> {
        let (start, final_addr) = self.addresses(cpu);
        transfer(cpu, start, self.registers.count_ones(), |cpu| {
            let mut values = [0u32; 16];
            let mut address = start;
            for reg in self.listed() {
                values[reg.index() as usize] = read_word_aligned(cpu, bus, address)?;
                address = address.wrapping_add(4);
            }
            if self.registers & (1 << 15) != 0 {
                bx_write_pc(cpu, values[15])?;
            }
            for reg in self.listed().filter(|r| !r.is_pc()) {
                cpu.write_register(reg, values[reg.index() as usize]);
            }
            if self.wback && self.registers & (1 << self.n.index()) == 0 {
                cpu.write_register(self.n, final_addr);
            }
            Ok(())
        })
    }

    pub fn store<P: Processor, B: Bus + ?Sized>(&self, cpu: &mut P, bus: &mut B) -> SimResult<()> {
        let (start, final_addr) = self.addresses(cpu);
        let mut values = [0u32; 16];
        for reg in self.listed() {
            values[reg.index() as usize] = cpu.read_register(reg);
        }
        transfer(cpu, start, self.registers.count_ones(), |cpu| {
            let mut address = start;
            for reg in self.listed() {
                write_word_aligned(cpu, bus, address, values[reg.index() as usize])?;
                address = address.wrapping_add(4);
            }
            if self.wback {
                cpu.write_register(self.n, final_addr);
            }
            Ok(())
        })
    }
}

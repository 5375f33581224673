// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The fetch, decode, execute cycle.
//!
//! [`step`] runs one instruction against anything implementing
//! [`Processor`]. [`CortexM`] wraps it with a decode cache, reset and the
//! [`crate::Cpu`] harness interface.

pub mod cortex_m;

pub use cortex_m::CortexM;

use crate::decoder::{self, DecodeContext, RawInstr};
use crate::ops::Operation;
use crate::registers::access::Processor;
use crate::registers::{it, SpecialRegisterId, SysCtrl};
use crate::{Bus, Fetch, SimResult, SimulationError, UsageFault};

/// Executes the instruction at the current PC.
///
/// On error the processor state, the PC included, is left as it was.
pub fn step<P: Processor, B: Bus + ?Sized>(cpu: &mut P, bus: &mut B) -> SimResult<()> {
    let raw = fetch(cpu, bus)?;
    let istate = cpu.read_special(SpecialRegisterId::Istate)?;
    let op = decode(&raw, DecodeContext::from_istate(istate))?;
    execute(cpu, bus, &raw, &op, istate)
}

/// Reads the next instruction, refusing to run outside Thumb state.
pub(crate) fn fetch<P: Processor, B: Bus + ?Sized>(cpu: &P, bus: &mut B) -> SimResult<RawInstr> {
    if !cpu.sys_ctrl()?.contains(SysCtrl::THUMB) {
        return Err(SimulationError::UsageFault(UsageFault::InvalidState));
    }
    bus.next_raw_instr(cpu.instruction_address())
}

pub(crate) fn decode(raw: &RawInstr, ctx: DecodeContext) -> SimResult<Operation> {
    decoder::decode(raw, ctx).inspect_err(|e| {
        tracing::warn!("{}", e);
    })
}

/// Runs a built operation under the IT condition, then advances the IT
/// state and the PC.
pub(crate) fn execute<P: Processor, B: Bus + ?Sized>(
    cpu: &mut P,
    bus: &mut B,
    raw: &RawInstr,
    op: &Operation,
    istate: u32,
) -> SimResult<()> {
    let cond = it::current_condition(istate)
        .ok_or(SimulationError::UsageFault(UsageFault::InvalidState))?;

    if cond.passed(cpu.apsr()?) {
        #[cfg(debug_assertions)]
        tracing::debug!(
            "PC={:#x}, Opcode={:#x}, {}",
            raw.address,
            raw.opcode(),
            op.conditional(cond)
        );
        op.execute(cpu, bus)?;
    }

    if istate != 0 && !op.is_it() {
        cpu.write_special(SpecialRegisterId::Istate, it::advance(istate))?;
    }
    cpu.retire(raw.size());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SystemBus;
    use crate::memory::ProgramImage;
    use crate::registers::access::{CoreRegisters, RegisterAccess, SpecialRegisters};
    use crate::registers::operand::RArg;
    use crate::registers::Apsr;

    fn load(code: &[u16]) -> (RegisterAccess, SystemBus) {
        let mut bus = SystemBus::new();
        let mut image = ProgramImage::new();
        image.add_thumb(0x100, code);
        bus.load_image(&image).unwrap();
        let mut cpu = RegisterAccess::new();
        cpu.set_instruction_address(0x100);
        (cpu, bus)
    }

    #[test]
    fn test_narrow_and_wide_advance_pc() {
        // MOVS r0, #5 ; MOVW r1, #0x1234
        let (mut cpu, mut bus) = load(&[0x2005, 0xF241, 0x2134]);
        step(&mut cpu, &mut bus).unwrap();
        assert_eq!(cpu.instruction_address(), 0x102);
        assert_eq!(cpu.read_register(RArg::from_bits(0)), 5);

        step(&mut cpu, &mut bus).unwrap();
        assert_eq!(cpu.instruction_address(), 0x106);
        assert_eq!(cpu.read_register(RArg::from_bits(1)), 0x1234);
    }

    #[test]
    fn test_undefined_instruction_leaves_state() {
        // UDF #0
        let (mut cpu, mut bus) = load(&[0xDE00]);
        let before = cpu.state().clone();
        assert_eq!(
            step(&mut cpu, &mut bus),
            Err(SimulationError::DecodeFailure {
                address: 0x100,
                opcode: 0xDE00
            })
        );
        assert_eq!(cpu.state(), &before);
    }

    #[test]
    fn test_it_block_skips_failed_condition() {
        // CMP r0, #0 ; ITE EQ ; MOVEQ r1, #1 ; MOVNE r1, #2 ; MOVS r2, #3
        let (mut cpu, mut bus) = load(&[0x2800, 0xBF0C, 0x2101, 0x2102, 0x2203]);
        for _ in 0..5 {
            step(&mut cpu, &mut bus).unwrap();
        }
        assert_eq!(cpu.read_register(RArg::from_bits(1)), 1);
        assert_eq!(cpu.read_register(RArg::from_bits(2)), 3);
        assert_eq!(cpu.read_special(SpecialRegisterId::Istate), Ok(0));
        // MOV inside the block does not set flags, MOVS after it does
        assert_eq!(cpu.apsr().unwrap() & Apsr::Z, Apsr::empty());
    }

    #[test]
    fn test_cleared_thumb_bit_faults() {
        let (mut cpu, mut bus) = load(&[0xBF00]);
        cpu.write_special(SpecialRegisterId::SysCtrl, 0).unwrap();
        assert_eq!(
            step(&mut cpu, &mut bus),
            Err(SimulationError::UsageFault(UsageFault::InvalidState))
        );
        assert_eq!(cpu.instruction_address(), 0x100);
    }

    #[test]
    fn test_fetch_outside_memory() {
        let (mut cpu, mut bus) = load(&[]);
        cpu.set_instruction_address(0x1000_0000);
        assert!(matches!(
            step(&mut cpu, &mut bus),
            Err(SimulationError::FetchFailure {
                address: 0x1000_0000,
                ..
            })
        ));
    }
}

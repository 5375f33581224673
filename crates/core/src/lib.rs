// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod alu;
pub mod builders;
pub mod bus;
pub mod config;
pub mod cpu;
pub mod decoder;
pub mod memory;
pub mod metrics;
pub mod ops;
pub mod peripherals;
pub mod registers;
pub mod snapshot;

use std::sync::Arc;

pub use config::CoreConfig;
pub use cpu::{step, CortexM};
pub use decoder::{DecodeContext, RawInstr};
pub use ops::Operation;
pub use registers::access::{CoreRegisters, Processor, RegisterAccess, SpecialRegisters};
pub use registers::{RegisterId, SpecialRegisterId};

/// Failures of a register or memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessFault {
    #[error("Memory access violation at {0:#x}")]
    MemoryViolation(u64),
    #[error("Write to read-only memory at {0:#x}")]
    ReadOnlyMemory(u64),
    #[error("Unaligned {size}-byte access at {address:#x}")]
    Unaligned { address: u32, size: u8 },
    #[error("Special register {0:?} is read-only")]
    ReadOnlyRegister(SpecialRegisterId),
    #[error("Special register {0:?} is not accessible")]
    Inaccessible(SpecialRegisterId),
    #[error("No system register at {0:#x}")]
    UnmappedSystemRegister(u32),
    #[error("Unprivileged access to system register at {0:#x}")]
    Unprivileged(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageFault {
    DivideByZero,
    InvalidState,
    Unaligned,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Undefined instruction {opcode:#x} at {address:#x}")]
    DecodeFailure { address: u32, opcode: u32 },
    #[error("Unpredictable operands in instruction {opcode:#x} at {address:#x}")]
    BuildFailure { address: u32, opcode: u32 },
    #[error(transparent)]
    AccessFault(#[from] AccessFault),
    #[error("Instruction fetch failed at {address:#x}: {source}")]
    FetchFailure {
        address: u32,
        #[source]
        source: AccessFault,
    },
    #[error("Usage fault ({0:?})")]
    UsageFault(UsageFault),
    #[error("Breakpoint #{imm} at {address:#x}")]
    Breakpoint { address: u32, imm: u8 },
    #[error("Supervisor call #{imm} at {address:#x}")]
    SupervisorCall { address: u32, imm: u8 },
    #[error("Exception return requested with {0:#x}")]
    ExceptionReturn(u32),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Outcome of a register or bus read, and of the matching write.
pub type ReadResult<T> = Result<T, AccessFault>;

/// Trait for observing simulation events in a modular way.
pub trait SimulationObserver: std::fmt::Debug + Send + Sync {
    fn on_step_start(&self, _pc: u32, _opcode: u32) {}
    fn on_step_end(&self, _cycles: u32) {}
    fn on_step_failed(&self, _pc: u32, _error: &SimulationError) {}
}

/// Trait representing a CPU core driven by a harness
pub trait Cpu: Send {
    fn reset(&mut self, bus: &mut dyn Bus) -> SimResult<()>;
    fn step(
        &mut self,
        bus: &mut dyn Bus,
        observers: &[Arc<dyn SimulationObserver>],
    ) -> SimResult<()>;
    fn set_pc(&mut self, val: u32);
    fn get_pc(&self) -> u32;
    fn set_sp(&mut self, val: u32);

    // Debug Access
    fn get_register(&self, id: u8) -> u32;
    fn set_register(&mut self, id: u8, val: u32);
    fn snapshot(&self) -> snapshot::CpuSnapshot;
    fn apply_snapshot(&mut self, snapshot: &snapshot::CpuSnapshot);
    fn get_register_names(&self) -> Vec<String>;
}

/// Trait representing the system bus
pub trait Bus {
    fn read_u8(&self, addr: u64) -> ReadResult<u8>;
    fn write_u8(&mut self, addr: u64, value: u8) -> ReadResult<()>;

    fn read_u16(&self, addr: u64) -> ReadResult<u16> {
        let b0 = self.read_u8(addr)? as u16;
        let b1 = self.read_u8(addr + 1)? as u16;
        // Little Endian
        Ok(b0 | (b1 << 8))
    }

    fn read_u32(&self, addr: u64) -> ReadResult<u32> {
        let b0 = self.read_u8(addr)? as u32;
        let b1 = self.read_u8(addr + 1)? as u32;
        let b2 = self.read_u8(addr + 2)? as u32;
        let b3 = self.read_u8(addr + 3)? as u32;
        Ok(b0 | (b1 << 8) | (b2 << 16) | (b3 << 24))
    }

    fn write_u32(&mut self, addr: u64, value: u32) -> ReadResult<()> {
        self.write_u8(addr, (value & 0xFF) as u8)?;
        self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        self.write_u8(addr + 2, ((value >> 16) & 0xFF) as u8)?;
        self.write_u8(addr + 3, ((value >> 24) & 0xFF) as u8)?;
        Ok(())
    }

    fn write_u16(&mut self, addr: u64, value: u16) -> ReadResult<()> {
        self.write_u8(addr, (value & 0xFF) as u8)?;
        self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        Ok(())
    }
}

/// Supplies raw instructions to the decoder.
pub trait Fetch {
    fn next_raw_instr(&mut self, address: u32) -> SimResult<RawInstr>;
}

impl<B: Bus + ?Sized> Fetch for B {
    fn next_raw_instr(&mut self, address: u32) -> SimResult<RawInstr> {
        let fetch = |addr: u32| {
            self.read_u16(addr as u64)
                .map_err(|source| SimulationError::FetchFailure { address, source })
        };
        let low = fetch(address)?;
        if RawInstr::is_wide_prefix(low) {
            let high = fetch(address.wrapping_add(2))?;
            Ok(RawInstr::wide(address, low, high))
        } else {
            Ok(RawInstr::narrow(address, low))
        }
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::config::CoreConfig;
use crate::decoder::{DecodeContext, RawInstr};
use crate::ops::Operation;
use crate::peripherals::Systick;
use crate::registers::access::{CoreRegisters, RegisterAccess, SpecialRegisters};
use crate::registers::state::{CoreState, CpuState};
use crate::registers::strategy::{ArchRegisterOps, RegisterOps};
use crate::registers::{RegisterId, SpecialRegisterId, SysCtrl};
use crate::snapshot::CpuSnapshot;
use crate::{Bus, Cpu, ReadResult, SimResult, SimulationObserver};
use std::sync::Arc;

const DECODE_CACHE_SIZE: usize = 4096;

/// A built operation together with everything its build depended on.
#[derive(Debug, Clone, Copy)]
pub struct DecodeCacheEntry {
    pub raw: RawInstr,
    pub ctx: DecodeContext,
    pub op: Operation,
}

#[derive(Debug)]
pub struct CortexM<O = ArchRegisterOps> {
    regs: RegisterAccess<CpuState, O>,
    config: CoreConfig,
    decode_cache: Box<[Option<DecodeCacheEntry>]>,
}

impl Default for CortexM {
    fn default() -> Self {
        Self::new()
    }
}

impl CortexM {
    pub fn new() -> Self {
        Self::with_config(CoreConfig::default())
    }

    pub fn with_config(config: CoreConfig) -> Self {
        Self::with_ops(config, ArchRegisterOps)
    }
}

impl<O: RegisterOps<CpuState>> CortexM<O> {
    pub fn with_ops(config: CoreConfig, ops: O) -> Self {
        Self {
            regs: RegisterAccess::with_parts(CpuState::from_config(&config), ops),
            config,
            decode_cache: vec![None; DECODE_CACHE_SIZE].into_boxed_slice(),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn registers(&self) -> &RegisterAccess<CpuState, O> {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut RegisterAccess<CpuState, O> {
        &mut self.regs
    }

    pub fn get_vtor(&self) -> u32 {
        self.regs.state().special()[SpecialRegisterId::Vtor as usize]
    }

    pub fn set_vtor(&mut self, val: u32) -> ReadResult<()> {
        self.regs.write_special(SpecialRegisterId::Vtor, val)
    }

    pub fn clear_decode_cache(&mut self) {
        self.decode_cache.fill(None);
    }

    /// One SysTick clock. Returns true when the SysTick exception should pend.
    pub fn tick_systick(&mut self) -> ReadResult<bool> {
        Systick::tick(&mut self.regs)
    }

    fn cached_op(&mut self, raw: &RawInstr, ctx: DecodeContext) -> SimResult<Operation> {
        if !self.config.decode_cache_enabled {
            return super::decode(raw, ctx);
        }
        let idx = ((raw.address >> 1) as usize) & (DECODE_CACHE_SIZE - 1);
        if let Some(entry) = self.decode_cache[idx] {
            if entry.raw == *raw && entry.ctx == ctx {
                return Ok(entry.op);
            }
        }
        let op = super::decode(raw, ctx)?;
        self.decode_cache[idx] = Some(DecodeCacheEntry {
            raw: *raw,
            ctx,
            op,
        });
        Ok(op)
    }

    /// [`super::step`] with the decode cache and observer callbacks.
    pub fn step_with<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        observers: &[Arc<dyn SimulationObserver>],
    ) -> SimResult<()> {
        let pc = self.regs.instruction_address();
        let result = self.step_inner(bus, observers);
        if let Err(e) = &result {
            // Nothing may be left behind for the next retire
            self.regs.set_instruction_address(pc);
            for observer in observers {
                observer.on_step_failed(pc, e);
            }
        }
        result
    }

    fn step_inner<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        observers: &[Arc<dyn SimulationObserver>],
    ) -> SimResult<()> {
        let raw = super::fetch(&self.regs, bus)?;
        for observer in observers {
            observer.on_step_start(raw.address, raw.opcode());
        }

        let istate = self.regs.read_special(SpecialRegisterId::Istate)?;
        let op = self.cached_op(&raw, DecodeContext::from_istate(istate))?;
        super::execute(&mut self.regs, bus, &raw, &op, istate)?;

        let cycles = if raw.is_wide() { 2 } else { 1 };
        for observer in observers {
            observer.on_step_end(cycles);
        }
        Ok(())
    }
}

impl<O: RegisterOps<CpuState> + Send> Cpu for CortexM<O> {
    /// Loads MSP and the entry point from the vector table at VTOR, unless
    /// the configuration overrides them. VTOR survives the reset.
    fn reset(&mut self, bus: &mut dyn Bus) -> SimResult<()> {
        let vtor = self.get_vtor();
        let sp = match self.config.initial_sp {
            Some(sp) => sp,
            None => bus.read_u32(vtor as u64)?,
        };
        let (entry, thumb) = match self.config.entry_point {
            Some(entry) => (entry, true),
            None => {
                let vector = bus.read_u32(vtor as u64 + 4)?;
                (vector, vector & 1 != 0)
            }
        };

        let mut state = CpuState::from_config(&self.config);
        {
            let special = state.special_mut();
            special[SpecialRegisterId::Vtor as usize] = vtor;
            special[SpecialRegisterId::SpMain as usize] = sp & !0x3;
            if !thumb {
                special[SpecialRegisterId::SysCtrl as usize] &= !SysCtrl::THUMB.bits();
            }
        }
        self.regs.replace_state(state);
        self.regs.set_instruction_address(entry);
        self.clear_decode_cache();

        tracing::info!(
            "Reset: VTOR={:#x}, SP={:#x}, PC={:#x}",
            vtor,
            sp,
            entry & !1
        );
        Ok(())
    }

    fn step(
        &mut self,
        bus: &mut dyn Bus,
        observers: &[Arc<dyn SimulationObserver>],
    ) -> SimResult<()> {
        self.step_with(bus, observers)
    }

    fn get_pc(&self) -> u32 {
        self.regs.instruction_address()
    }

    fn set_pc(&mut self, val: u32) {
        self.regs.set_instruction_address(val);
    }

    fn set_sp(&mut self, val: u32) {
        self.regs.set_raw_register(RegisterId::Sp, val);
    }

    fn get_register(&self, id: u8) -> u32 {
        if id > 15 {
            return 0;
        }
        self.regs.raw_register(RegisterId::from_index(id))
    }

    fn set_register(&mut self, id: u8, val: u32) {
        if id <= 15 {
            self.regs.set_raw_register(RegisterId::from_index(id), val);
        }
    }

    fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot::capture(self.regs.state())
    }

    fn apply_snapshot(&mut self, snapshot: &CpuSnapshot) {
        snapshot.restore(self.regs.state_mut());
        let pc = self.regs.instruction_address();
        self.regs.set_instruction_address(pc);
        self.clear_decode_cache();
    }

    fn get_register_names(&self) -> Vec<String> {
        RegisterId::ALL
            .iter()
            .map(|id| id.name().to_string())
            .collect()
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{SimulationError, SimulationObserver};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counts retired instructions, cycles and failed steps.
#[derive(Debug)]
pub struct InstructionMetrics {
    instruction_count: AtomicU64,
    cycle_count: AtomicU64,
    failure_count: AtomicU64,
    start_time: Instant,
}

impl Default for InstructionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionMetrics {
    pub fn new() -> Self {
        Self {
            instruction_count: AtomicU64::new(0),
            cycle_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn reset(&self) {
        self.instruction_count.store(0, Ordering::SeqCst);
        self.cycle_count.store(0, Ordering::SeqCst);
        self.failure_count.store(0, Ordering::SeqCst);
    }

    pub fn get_instructions(&self) -> u64 {
        self.instruction_count.load(Ordering::SeqCst)
    }

    pub fn get_cycles(&self) -> u64 {
        self.cycle_count.load(Ordering::SeqCst)
    }

    pub fn get_failures(&self) -> u64 {
        self.failure_count.load(Ordering::SeqCst)
    }

    pub fn get_ips(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.get_instructions() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl SimulationObserver for InstructionMetrics {
    fn on_step_end(&self, cycles: u32) {
        self.instruction_count.fetch_add(1, Ordering::SeqCst);
        self.cycle_count.fetch_add(cycles as u64, Ordering::SeqCst);
    }

    fn on_step_failed(&self, _pc: u32, _error: &SimulationError) {
        self.failure_count.fetch_add(1, Ordering::SeqCst);
    }
}

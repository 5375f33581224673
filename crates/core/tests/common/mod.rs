// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#![allow(dead_code)]

use labwired_thumb::bus::SystemBus;
use labwired_thumb::memory::ProgramImage;
use labwired_thumb::{CoreConfig, CortexM, Cpu, SimResult};

pub const STACK_TOP: u32 = 0x2000_4000;
pub const CODE_BASE: u32 = 0x100;

/// Vector table at 0 (initial MSP and reset vector) followed by `code`
/// at `CODE_BASE`.
pub fn image(code: &[u16]) -> ProgramImage {
    let mut image = ProgramImage::new();
    let vectors = [STACK_TOP, CODE_BASE | 1]
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .collect();
    image.add_segment(0, vectors);
    image.add_thumb(CODE_BASE as u64, code);
    image
}

pub fn boot_with(config: CoreConfig, code: &[u16]) -> anyhow::Result<(CortexM, SystemBus)> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut bus = SystemBus::new();
    bus.load_image(&image(code))?;
    let mut cpu = CortexM::with_config(config);
    cpu.reset(&mut bus)?;
    Ok((cpu, bus))
}

pub fn boot(code: &[u16]) -> anyhow::Result<(CortexM, SystemBus)> {
    boot_with(CoreConfig::default(), code)
}

pub fn run(cpu: &mut CortexM, bus: &mut SystemBus, steps: usize) -> SimResult<()> {
    for _ in 0..steps {
        cpu.step(bus, &[])?;
    }
    Ok(())
}

/// Steps until the PC reaches `stop`, giving up after `limit` steps.
pub fn run_until(cpu: &mut CortexM, bus: &mut SystemBus, stop: u32, limit: usize) -> usize {
    let mut steps = 0;
    while cpu.get_pc() != stop && steps < limit {
        if cpu.step(bus, &[]).is_err() {
            break;
        }
        steps += 1;
    }
    steps
}

/// A 32-bit literal as two little-endian halfwords.
pub fn literal(word: u32) -> [u16; 2] {
    [word as u16, (word >> 16) as u16]
}

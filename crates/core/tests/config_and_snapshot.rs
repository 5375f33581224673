// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod common;

use common::{boot, boot_with, run};
use labwired_thumb::metrics::InstructionMetrics;
use labwired_thumb::snapshot::CpuSnapshot;
use labwired_thumb::{CoreConfig, Cpu, SimulationObserver};
use std::sync::Arc;

const PROGRAM: [u16; 4] = [
    0x2005, // MOVS r0, #5
    0x2103, // MOVS r1, #3
    0x1842, // ADDS r2, r0, r1
    0xE7FE, // B .
];

#[test]
fn test_core_config_from_yaml_file() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("labwired-thumb-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "decode_cache_enabled: false\nentry_point: 0x102\ninitial_sp: 0x20001000\n",
    )?;
    let config = CoreConfig::from_file(&path)?;
    std::fs::remove_file(&path)?;

    let (mut cpu, mut bus) = boot_with(config, &PROGRAM)?;
    assert_eq!(cpu.get_pc(), 0x102);
    assert_eq!(cpu.get_register(13), 0x2000_1000);

    run(&mut cpu, &mut bus, 2)?;
    // MOVS r0 was skipped by the entry override
    assert_eq!(cpu.get_register(2), 3);
    Ok(())
}

#[test]
fn test_cache_does_not_change_results() -> anyhow::Result<()> {
    let uncached = CoreConfig {
        decode_cache_enabled: false,
        ..Default::default()
    };
    let (mut a, mut bus_a) = boot(&PROGRAM)?;
    let (mut b, mut bus_b) = boot_with(uncached, &PROGRAM)?;
    run(&mut a, &mut bus_a, 10)?;
    run(&mut b, &mut bus_b, 10)?;
    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.get_register(2), 8);
    Ok(())
}

#[test]
fn test_snapshot_json_restores_execution_point() -> anyhow::Result<()> {
    let (mut cpu, mut bus) = boot(&PROGRAM)?;
    run(&mut cpu, &mut bus, 2)?;
    let json = cpu.snapshot().to_json()?;

    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(cpu.get_register(2), 8);

    cpu.apply_snapshot(&CpuSnapshot::from_json(&json)?);
    assert_eq!(cpu.get_pc(), 0x104);
    assert_eq!(cpu.get_register(2), 0);
    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(cpu.get_register(2), 8);
    Ok(())
}

#[test]
fn test_metrics_observer_counts_cycles() -> anyhow::Result<()> {
    let (mut cpu, mut bus) = boot(&[
        0xF240, 0x0005, // MOVW r0, #5
        0xBF00, // NOP
        0xE7FE, // B .
    ])?;
    let metrics = Arc::new(InstructionMetrics::new());
    let observers: Vec<Arc<dyn SimulationObserver>> = vec![metrics.clone()];
    for _ in 0..3 {
        cpu.step(&mut bus, &observers)?;
    }
    assert_eq!(metrics.get_instructions(), 3);
    assert_eq!(metrics.get_cycles(), 4);
    assert_eq!(cpu.get_register(0), 5);
    Ok(())
}

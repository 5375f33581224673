// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{merge, RegisterBlock};
use crate::registers::access::SpecialRegisters;
use crate::registers::{systick, SpecialRegisterId};
use crate::{AccessFault, ReadResult};

/// SysTick Timer
/// Standard address: 0xE000_E010
#[derive(Debug, Clone, Copy, Default)]
pub struct Systick;

impl Systick {
    /// Advances the counter by one clock. Returns true when the counter
    /// wrapped with TICKINT set, i.e. the SysTick exception should pend.
    pub fn tick<P: SpecialRegisters + ?Sized>(cpu: &mut P) -> ReadResult<bool> {
        let csr = cpu.read_special(SpecialRegisterId::SysTickCsr)?;
        if csr & systick::ENABLE == 0 {
            return Ok(false);
        }

        let cvr = cpu.read_special(SpecialRegisterId::SysTickCvr)?;
        if cvr == 0 {
            let rvr = cpu.read_special(SpecialRegisterId::SysTickRvr)?;
            cpu.write_special(SpecialRegisterId::SysTickCvr, rvr)?;
            cpu.write_special(SpecialRegisterId::SysTickCsr, csr | systick::COUNTFLAG)?;
            Ok(csr & systick::TICKINT != 0)
        } else {
            cpu.write_special(SpecialRegisterId::SysTickCvr, cvr - 1)?;
            Ok(false)
        }
    }
}

impl RegisterBlock for Systick {
    const BASE: u32 = 0xE000_E010;
    const SIZE: u32 = 0x10;

    fn read_reg<P: SpecialRegisters + ?Sized>(cpu: &mut P, offset: u32) -> ReadResult<u32> {
        match offset {
            0x00 => {
                let csr = cpu.read_special(SpecialRegisterId::SysTickCsr)?;
                if csr & systick::COUNTFLAG != 0 {
                    cpu.write_special(SpecialRegisterId::SysTickCsr, csr & !systick::COUNTFLAG)?;
                }
                Ok(csr)
            }
            0x04 => cpu.read_special(SpecialRegisterId::SysTickRvr),
            0x08 => cpu.read_special(SpecialRegisterId::SysTickCvr),
            0x0C => cpu.read_special(SpecialRegisterId::SysTickCalib),
            _ => Err(AccessFault::UnmappedSystemRegister(Self::BASE + offset)),
        }
    }

    fn write_reg<P: SpecialRegisters + ?Sized>(
        cpu: &mut P,
        offset: u32,
        value: u32,
        mask: u32,
    ) -> ReadResult<()> {
        match offset {
            0x00 => {
                let old = cpu.read_special(SpecialRegisterId::SysTickCsr)?;
                // COUNTFLAG is read-only from software
                let csr = (merge(old, value, mask) & !systick::COUNTFLAG)
                    | (old & systick::COUNTFLAG);
                if old & systick::ENABLE == 0 && csr & systick::ENABLE != 0 {
                    let rvr = cpu.read_special(SpecialRegisterId::SysTickRvr)?;
                    cpu.write_special(SpecialRegisterId::SysTickCvr, rvr)?;
                }
                cpu.write_special(SpecialRegisterId::SysTickCsr, csr)
            }
            0x04 => {
                let old = cpu.read_special(SpecialRegisterId::SysTickRvr)?;
                cpu.write_special(SpecialRegisterId::SysTickRvr, merge(old, value, mask))
            }
            0x08 => {
                let csr = cpu.read_special(SpecialRegisterId::SysTickCsr)?;
                cpu.write_special(SpecialRegisterId::SysTickCvr, 0)?;
                cpu.write_special(SpecialRegisterId::SysTickCsr, csr & !systick::COUNTFLAG)
            }
            0x0C => Err(AccessFault::ReadOnlyRegister(SpecialRegisterId::SysTickCalib)),
            _ => Err(AccessFault::UnmappedSystemRegister(Self::BASE + offset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::access::RegisterAccess;

    const FULL: u32 = 0xFFFF_FFFF;

    fn enabled(reload: u32, csr: u32) -> RegisterAccess {
        let mut cpu = RegisterAccess::new();
        Systick::write_reg(&mut cpu, 0x04, reload, FULL).unwrap();
        Systick::write_reg(&mut cpu, 0x00, csr, FULL).unwrap();
        cpu
    }

    #[test]
    fn test_enable_reloads_counter() {
        let mut cpu = enabled(0x0100_0005, systick::ENABLE);
        // RVR keeps 24 bits
        assert_eq!(Systick::read_reg(&mut cpu, 0x04), Ok(5));
        assert_eq!(Systick::read_reg(&mut cpu, 0x08), Ok(5));
    }

    #[test]
    fn test_wrap_sets_countflag_and_reports_tickint() {
        let mut cpu = enabled(2, systick::ENABLE | systick::TICKINT);
        assert_eq!(Systick::tick(&mut cpu), Ok(false));
        assert_eq!(Systick::tick(&mut cpu), Ok(false));
        assert_eq!(Systick::tick(&mut cpu), Ok(true));
        assert_eq!(Systick::read_reg(&mut cpu, 0x08), Ok(2));

        // First read returns COUNTFLAG and clears it
        let csr = Systick::read_reg(&mut cpu, 0x00).unwrap();
        assert_ne!(csr & systick::COUNTFLAG, 0);
        let csr = Systick::read_reg(&mut cpu, 0x00).unwrap();
        assert_eq!(csr & systick::COUNTFLAG, 0);
    }

    #[test]
    fn test_wrap_without_tickint_does_not_interrupt() {
        let mut cpu = enabled(0, systick::ENABLE);
        assert_eq!(Systick::tick(&mut cpu), Ok(false));
        let csr = Systick::read_reg(&mut cpu, 0x00).unwrap();
        assert_ne!(csr & systick::COUNTFLAG, 0);
    }

    #[test]
    fn test_disabled_timer_does_not_count() {
        let mut cpu = RegisterAccess::new();
        Systick::write_reg(&mut cpu, 0x04, 10, FULL).unwrap();
        assert_eq!(Systick::tick(&mut cpu), Ok(false));
        assert_eq!(Systick::read_reg(&mut cpu, 0x08), Ok(0));
    }

    #[test]
    fn test_cvr_write_clears_counter_and_flag() {
        let mut cpu = enabled(0, systick::ENABLE);
        Systick::tick(&mut cpu).unwrap();
        Systick::write_reg(&mut cpu, 0x04, 7, FULL).unwrap();
        Systick::tick(&mut cpu).unwrap();
        assert_eq!(Systick::read_reg(&mut cpu, 0x08), Ok(7));

        Systick::write_reg(&mut cpu, 0x08, 0x1234, FULL).unwrap();
        assert_eq!(Systick::read_reg(&mut cpu, 0x08), Ok(0));
        let csr = Systick::read_reg(&mut cpu, 0x00).unwrap();
        assert_eq!(csr & systick::COUNTFLAG, 0);
    }

    #[test]
    fn test_calib_is_read_only() {
        let mut cpu = RegisterAccess::new();
        assert_eq!(Systick::read_reg(&mut cpu, 0x0C), Ok(0x4000_0000));
        assert_eq!(
            Systick::write_reg(&mut cpu, 0x0C, 0, FULL),
            Err(AccessFault::ReadOnlyRegister(SpecialRegisterId::SysTickCalib))
        );
    }
}

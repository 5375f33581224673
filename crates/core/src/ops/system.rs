// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::registers::access::Processor;
use crate::registers::operand::RArg;
use crate::registers::SpecialRegisterId;
use crate::SimResult;

const APSR_FLAGS: u32 = 0xF800_0000;
const APSR_GE: u32 = 0x000F_0000;

/// IT: loads the IT state for the following one to four instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct It {
    pub firstcond: u8,
    pub mask: u8,
}

impl It {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let istate = ((self.firstcond as u32) << 4) | (self.mask as u32 & 0xF);
        cpu.write_special(SpecialRegisterId::Istate, istate)?;
        Ok(())
    }
}

/// Register selected by the SYSm field of MRS and MSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SysmTarget {
    /// Any combination of the program status registers. EPSR always reads
    /// as zero.
    Psr { ipsr: bool, apsr: bool },
    Msp,
    Psp,
    Primask,
    Basepri,
    BasepriMax,
    Faultmask,
    Control,
}

impl SysmTarget {
    pub fn from_sysm(sysm: u32) -> Option<Self> {
        Some(match sysm {
            0..=3 | 5..=7 => SysmTarget::Psr {
                ipsr: sysm & 0b001 != 0,
                apsr: sysm & 0b100 == 0,
            },
            8 => SysmTarget::Msp,
            9 => SysmTarget::Psp,
            16 => SysmTarget::Primask,
            17 => SysmTarget::Basepri,
            18 => SysmTarget::BasepriMax,
            19 => SysmTarget::Faultmask,
            20 => SysmTarget::Control,
            _ => return None,
        })
    }

    fn register(self) -> Option<SpecialRegisterId> {
        match self {
            SysmTarget::Psr { .. } => None,
            SysmTarget::Msp => Some(SpecialRegisterId::SpMain),
            SysmTarget::Psp => Some(SpecialRegisterId::SpProcess),
            SysmTarget::Primask => Some(SpecialRegisterId::Primask),
            SysmTarget::Basepri | SysmTarget::BasepriMax => Some(SpecialRegisterId::Basepri),
            SysmTarget::Faultmask => Some(SpecialRegisterId::Faultmask),
            SysmTarget::Control => Some(SpecialRegisterId::Control),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mrs {
    pub d: RArg,
    pub target: SysmTarget,
}

impl Mrs {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let value = match self.target {
            SysmTarget::Psr { ipsr, apsr } => {
                let mut value = 0;
                if ipsr {
                    value |= cpu.read_special(SpecialRegisterId::Ipsr)? & 0x1FF;
                }
                if apsr {
                    value |= cpu.read_special(SpecialRegisterId::Apsr)? & (APSR_FLAGS | APSR_GE);
                }
                value
            }
            SysmTarget::Control => cpu.read_special(SpecialRegisterId::Control)? & 0x3,
            other => match other.register() {
                Some(id) if cpu.is_privileged()? => cpu.read_special(id)?,
                _ => 0,
            },
        };
        cpu.write_register(self.d, value);
        Ok(())
    }
}

/// MSR. `mask` is the two-bit field of the encoding: bit 1 writes NZCVQ,
/// bit 0 writes GE. It only applies to the status registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msr {
    pub n: RArg,
    pub target: SysmTarget,
    pub mask: u8,
}

impl Msr {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let value = cpu.read_register(self.n);
        match self.target {
            SysmTarget::Psr { apsr: false, .. } => Ok(()),
            SysmTarget::Psr { apsr: true, .. } => {
                let mut lanes = 0;
                if self.mask & 0b10 != 0 {
                    lanes |= APSR_FLAGS;
                }
                if self.mask & 0b01 != 0 {
                    lanes |= APSR_GE;
                }
                let current = cpu.read_special(SpecialRegisterId::Apsr)?;
                cpu.write_special(
                    SpecialRegisterId::Apsr,
                    (current & !lanes) | (value & lanes),
                )?;
                Ok(())
            }
            target => {
                if !cpu.is_privileged()? {
                    return Ok(());
                }
                let Some(id) = target.register() else {
                    return Ok(());
                };
                if target == SysmTarget::BasepriMax {
                    let requested = value & 0xFF;
                    let current = cpu.read_special(id)?;
                    if requested == 0 || (current != 0 && requested >= current) {
                        return Ok(());
                    }
                }
                cpu.write_special(id, value)?;
                Ok(())
            }
        }
    }
}

/// CPSIE/CPSID. Ignored when unprivileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cps {
    /// true for CPSIE (clear the mask), false for CPSID
    pub enable: bool,
    pub primask: bool,
    pub faultmask: bool,
}

impl Cps {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        if !cpu.is_privileged()? {
            return Ok(());
        }
        let value = u32::from(!self.enable);
        if self.primask {
            cpu.write_special(SpecialRegisterId::Primask, value)?;
        }
        if self.faultmask {
            cpu.write_special(SpecialRegisterId::Faultmask, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::*;
    use crate::registers::access::SpecialRegisters;
    use crate::registers::{Apsr, SysCtrl};

    fn make_unprivileged(cpu: &mut crate::RegisterAccess) {
        cpu.write_special(SpecialRegisterId::Control, 0b01).unwrap();
    }

    #[test]
    fn test_it_loads_state() {
        let mut cpu = cpu_at(0x100);
        // ITE EQ
        It {
            firstcond: 0x0,
            mask: 0xC,
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Istate), Ok(0x0C));
    }

    #[test]
    fn test_sysm_decoding() {
        assert_eq!(
            SysmTarget::from_sysm(0),
            Some(SysmTarget::Psr {
                ipsr: false,
                apsr: true
            })
        );
        assert_eq!(
            SysmTarget::from_sysm(5),
            Some(SysmTarget::Psr {
                ipsr: true,
                apsr: false
            })
        );
        assert_eq!(SysmTarget::from_sysm(4), None);
        assert_eq!(SysmTarget::from_sysm(20), Some(SysmTarget::Control));
        assert_eq!(SysmTarget::from_sysm(21), None);
    }

    #[test]
    fn test_mrs_reads_psr_without_epsr() {
        let mut cpu = cpu_at(0x100);
        set_flags(&mut cpu, Apsr::N | Apsr::C);
        cpu.write_special(SpecialRegisterId::Ipsr, 11).unwrap();
        Mrs {
            d: RArg::from_bits(0),
            target: SysmTarget::from_sysm(3).unwrap(),
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(get(&cpu, 0), 0xA000_000B);
    }

    #[test]
    fn test_msr_apsr_mask() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 1, 0xF80F_0000);
        let msr = Msr {
            n: RArg::from_bits(1),
            target: SysmTarget::from_sysm(0).unwrap(),
            mask: 0b01,
        };
        msr.execute(&mut cpu).unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Apsr), Ok(0x000F_0000));
        Msr { mask: 0b10, ..msr }.execute(&mut cpu).unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Apsr), Ok(0xF80F_0000));
    }

    #[test]
    fn test_msr_requires_privilege() {
        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 2, 1);
        let msr = Msr {
            n: RArg::from_bits(2),
            target: SysmTarget::Primask,
            mask: 0b10,
        };
        make_unprivileged(&mut cpu);
        msr.execute(&mut cpu).unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Primask), Ok(0));

        let mut cpu = cpu_at(0x100);
        set(&mut cpu, 2, 1);
        msr.execute(&mut cpu).unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Primask), Ok(1));
    }

    #[test]
    fn test_basepri_max_only_raises_priority() {
        let mut cpu = cpu_at(0x100);
        let msr = Msr {
            n: RArg::from_bits(0),
            target: SysmTarget::BasepriMax,
            mask: 0b10,
        };
        set(&mut cpu, 0, 0x40);
        msr.execute(&mut cpu).unwrap();
        set(&mut cpu, 0, 0x80);
        msr.execute(&mut cpu).unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Basepri), Ok(0x40));
        set(&mut cpu, 0, 0x20);
        msr.execute(&mut cpu).unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Basepri), Ok(0x20));
    }

    #[test]
    fn test_mrs_msp_unprivileged_reads_zero() {
        let mut cpu = cpu_at(0x100);
        cpu.write_special(SpecialRegisterId::SpMain, 0x2000_1000)
            .unwrap();
        make_unprivileged(&mut cpu);
        set(&mut cpu, 4, 0xFFFF);
        Mrs {
            d: RArg::from_bits(4),
            target: SysmTarget::Msp,
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(get(&cpu, 4), 0);
    }

    #[test]
    fn test_cps() {
        let mut cpu = cpu_at(0x100);
        let cpsid = Cps {
            enable: false,
            primask: true,
            faultmask: false,
        };
        cpsid.execute(&mut cpu).unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Primask), Ok(1));
        Cps {
            enable: true,
            ..cpsid
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Primask), Ok(0));

        cpu.write_special(SpecialRegisterId::SysCtrl, SysCtrl::THUMB.bits())
            .unwrap();
        make_unprivileged(&mut cpu);
        cpsid.execute(&mut cpu).unwrap();
        assert_eq!(cpu.read_special(SpecialRegisterId::Primask), Ok(0));
    }
}

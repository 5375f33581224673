// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::memory::{read_memory, Access};
use crate::registers::access::Processor;
use crate::registers::it::Condition;
use crate::registers::operand::{LrArg, PcArg, RArg};
use crate::registers::{SpecialRegisterId, SysCtrl};
use crate::{Bus, SimResult, SimulationError};

/// BXWritePC / LoadWritePC: interworking branch. Bit 0 becomes EPSR.T, and
/// an EXC_RETURN value in handler mode is handed to the exception logic.
pub(crate) fn bx_write_pc<P: Processor>(cpu: &mut P, address: u32) -> SimResult<()> {
    let sys = cpu.sys_ctrl()?;
    if sys.contains(SysCtrl::HANDLER) && address & 0xF000_0000 == 0xF000_0000 {
        return Err(SimulationError::ExceptionReturn(address));
    }
    blx_write_pc(cpu, sys, address)
}

fn blx_write_pc<P: Processor>(cpu: &mut P, sys: SysCtrl, address: u32) -> SimResult<()> {
    let mut next = sys;
    next.set(SysCtrl::THUMB, address & 1 != 0);
    if next != sys {
        cpu.write_special(SpecialRegisterId::SysCtrl, next.bits())?;
    }
    cpu.branch_to(address & !1);
    Ok(())
}

/// B, with or without a condition of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub cond: Condition,
    pub offset: i32,
}

impl Branch {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        if self.cond != Condition::AL && !self.cond.passed(cpu.apsr()?) {
            return Ok(());
        }
        let pc = PcArg::default();
        let target = cpu.read_register(pc).wrapping_add(self.offset as u32);
        cpu.write_register(pc, target);
        Ok(())
    }
}

/// BL: return address into LR with the Thumb bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchLink {
    pub offset: i32,
}

impl BranchLink {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let pc = cpu.read_register(PcArg::default());
        cpu.write_register(LrArg::default(), pc | 1);
        cpu.write_register(PcArg::default(), pc.wrapping_add(self.offset as u32));
        Ok(())
    }
}

/// BX and BLX (register).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchExchange {
    pub m: RArg,
    pub link: bool,
}

impl BranchExchange {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let target = cpu.read_register(self.m);
        if !self.link {
            return bx_write_pc(cpu, target);
        }
        // 16-bit encoding: the next instruction is at PC - 2
        let ret = cpu.read_register(PcArg::default()).wrapping_sub(2) | 1;
        let sys = cpu.sys_ctrl()?;
        blx_write_pc(cpu, sys, target)?;
        cpu.write_register(LrArg::default(), ret);
        Ok(())
    }
}

/// CBZ/CBNZ. Forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareBranch {
    pub n: RArg,
    pub offset: u32,
    pub nonzero: bool,
}

impl CompareBranch {
    pub fn execute<P: Processor>(&self, cpu: &mut P) -> SimResult<()> {
        let is_zero = cpu.read_register(self.n) == 0;
        if is_zero != self.nonzero {
            let pc = PcArg::default();
            let target = cpu.read_register(pc).wrapping_add(self.offset);
            cpu.write_register(pc, target);
        }
        Ok(())
    }
}

/// TBB/TBH: branch forward by twice a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableBranch {
    pub n: RArg,
    pub m: RArg,
    pub half: bool,
}

impl TableBranch {
    pub fn execute<P: Processor, B: Bus + ?Sized>(&self, cpu: &mut P, bus: &mut B) -> SimResult<()> {
        let base = cpu.read_register(self.n);
        let index = cpu.read_register(self.m);
        let entry = if self.half {
            read_memory(cpu, bus, base.wrapping_add(index << 1), Access::Half)?
        } else {
            read_memory(cpu, bus, base.wrapping_add(index), Access::Byte)?
        };
        let pc = PcArg::default();
        let target = cpu.read_register(pc).wrapping_add(entry << 1);
        cpu.write_register(pc, target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::*;
    use crate::registers::access::SpecialRegisters;
    use crate::registers::Apsr;
    use crate::Bus;

    #[test]
    fn test_conditional_branch() {
        let mut cpu = cpu_at(0x100);
        let beq = Branch {
            cond: Condition::EQ,
            offset: -8,
        };
        beq.execute(&mut cpu).unwrap();
        assert_eq!(cpu.pending_branch(), None);

        set_flags(&mut cpu, Apsr::Z);
        beq.execute(&mut cpu).unwrap();
        assert_eq!(cpu.pending_branch(), Some(0xFC));
    }

    #[test]
    fn test_branch_link_sets_thumb_return() {
        let mut cpu = cpu_at(0x200);
        BranchLink { offset: 0x1000 }.execute(&mut cpu).unwrap();
        assert_eq!(get(&cpu, 14), 0x205);
        assert_eq!(cpu.pending_branch(), Some(0x1204));
    }

    #[test]
    fn test_bx_clears_thumb_bit_on_even_target() {
        let mut cpu = cpu_at(0x200);
        set(&mut cpu, 1, 0x400);
        BranchExchange {
            m: RArg::from_bits(1),
            link: false,
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(cpu.pending_branch(), Some(0x400));
        assert!(!cpu.sys_ctrl().unwrap().contains(SysCtrl::THUMB));
    }

    #[test]
    fn test_blx_register() {
        let mut cpu = cpu_at(0x200);
        set(&mut cpu, 3, 0x801);
        BranchExchange {
            m: RArg::from_bits(3),
            link: true,
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(get(&cpu, 14), 0x203);
        assert_eq!(cpu.pending_branch(), Some(0x800));
    }

    #[test]
    fn test_exception_return_is_reported_without_side_effects() {
        let mut cpu = cpu_at(0x200);
        cpu.write_special(
            SpecialRegisterId::SysCtrl,
            (SysCtrl::THUMB | SysCtrl::HANDLER).bits(),
        )
        .unwrap();
        set(&mut cpu, 14, 0xFFFF_FFF9);
        let result = BranchExchange {
            m: RArg::LR,
            link: false,
        }
        .execute(&mut cpu);
        assert_eq!(result, Err(SimulationError::ExceptionReturn(0xFFFF_FFF9)));
        assert_eq!(cpu.pending_branch(), None);
    }

    #[test]
    fn test_compare_branch() {
        let mut cpu = cpu_at(0x100);
        let cbz = CompareBranch {
            n: RArg::from_bits(0),
            offset: 0x20,
            nonzero: false,
        };
        cbz.execute(&mut cpu).unwrap();
        assert_eq!(cpu.pending_branch(), Some(0x124));

        let mut cpu = cpu_at(0x100);
        CompareBranch {
            nonzero: true,
            ..cbz
        }
        .execute(&mut cpu)
        .unwrap();
        assert_eq!(cpu.pending_branch(), None);
    }

    #[test]
    fn test_table_branch_halfword() {
        let mut cpu = cpu_at(0x100);
        let mut bus = bus();
        bus.write_u16(0x2000_0004, 0x0010).unwrap();
        set(&mut cpu, 0, 0x2000_0000);
        set(&mut cpu, 1, 2);
        TableBranch {
            n: RArg::from_bits(0),
            m: RArg::from_bits(1),
            half: true,
        }
        .execute(&mut cpu, &mut bus)
        .unwrap();
        assert_eq!(cpu.pending_branch(), Some(0x124));
    }
}

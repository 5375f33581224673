// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{forbid, outside_it, r};
use crate::decoder::{bit, bits, DecodeContext, Decoded, Rejection};
use crate::ops::{Cps, It, Mrs, Msr, Operation, SysmTarget};

/// IT{x{y{z}}} firstcond. A zero mask is a hint and never reaches here.
pub fn it_t1(op: u32, ctx: DecodeContext) -> Decoded {
    let firstcond = bits(op, 7, 4);
    let mask = bits(op, 3, 0);
    forbid(firstcond == 0xF)?;
    forbid(firstcond == 0xE && mask.count_ones() != 1)?;
    outside_it(ctx)?;
    Ok(Operation::It(It {
        firstcond: firstcond as u8,
        mask: mask as u8,
    }))
}

/// CPSIE/CPSID with the I and F masks.
pub fn cps_t1(op: u32, ctx: DecodeContext) -> Decoded {
    let primask = bit(op, 1);
    let faultmask = bit(op, 0);
    forbid(bits(op, 3, 2) != 0)?;
    forbid(!primask && !faultmask)?;
    outside_it(ctx)?;
    Ok(Operation::Cps(Cps {
        enable: !bit(op, 4),
        primask,
        faultmask,
    }))
}

pub fn bkpt_t1(op: u32) -> Decoded {
    Ok(Operation::Breakpoint(bits(op, 7, 0) as u8))
}

pub fn svc_t1(op: u32) -> Decoded {
    Ok(Operation::SupervisorCall(bits(op, 7, 0) as u8))
}

/// NOP, YIELD, WFE, WFI, SEV and the barriers. None of them has an effect
/// on a single core without an event model.
pub fn hint(_op: u32) -> Decoded {
    Ok(Operation::Nop)
}

fn sysm(op: u32) -> Result<SysmTarget, Rejection> {
    SysmTarget::from_sysm(bits(op, 7, 0)).ok_or(Rejection::Unpredictable)
}

pub fn msr_t1(op: u32) -> Decoded {
    let n = r(op, 19, 16);
    let mask = bits(op, 11, 10);
    let target = sysm(op)?;
    let status = matches!(target, SysmTarget::Psr { .. });
    forbid(mask == 0 || (mask != 0b10 && !status))?;
    forbid(n.is_sp_or_pc())?;
    Ok(Operation::Msr(Msr {
        n,
        target,
        mask: mask as u8,
    }))
}

pub fn mrs_t1(op: u32) -> Decoded {
    let d = r(op, 11, 8);
    forbid(d.is_sp_or_pc())?;
    Ok(Operation::Mrs(Mrs {
        d,
        target: sysm(op)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::operand::RArg;

    const OUT: DecodeContext = DecodeContext::OUTSIDE_IT;

    #[test]
    fn test_it_validation() {
        // ITE EQ
        assert_eq!(
            it_t1(0xBF0C, OUT),
            Ok(Operation::It(It {
                firstcond: 0,
                mask: 0xC
            }))
        );
        // IT AL with a three instruction mask
        assert_eq!(it_t1(0xBFEC, OUT), Err(Rejection::Unpredictable));
        // IT inside an IT block
        let inside = DecodeContext {
            in_it_block: true,
            last_in_it_block: true,
        };
        assert_eq!(it_t1(0xBF08, inside), Err(Rejection::Unpredictable));
    }

    #[test]
    fn test_cps_forms() {
        assert_eq!(
            cps_t1(0xB672, OUT),
            Ok(Operation::Cps(Cps {
                enable: false,
                primask: true,
                faultmask: false
            }))
        );
        assert_eq!(cps_t1(0xB660, OUT), Err(Rejection::Unpredictable));
    }

    #[test]
    fn test_msr_mrs() {
        // MSR APSR_nzcvq, R0
        assert_eq!(
            msr_t1(0xF380_8800),
            Ok(Operation::Msr(Msr {
                n: RArg::from_bits(0),
                target: SysmTarget::Psr {
                    ipsr: false,
                    apsr: true
                },
                mask: 0b10
            }))
        );
        // MSR PRIMASK with the GE mask
        assert_eq!(msr_t1(0xF380_8410), Err(Rejection::Unpredictable));
        // MRS R0, CONTROL
        assert_eq!(
            mrs_t1(0xF3EF_8014),
            Ok(Operation::Mrs(Mrs {
                d: RArg::from_bits(0),
                target: SysmTarget::Control
            }))
        );
        // MRS R0, SYSm 4
        assert_eq!(mrs_t1(0xF3EF_8004), Err(Rejection::Unpredictable));
    }
}

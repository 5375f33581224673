// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::state::CoreState;
use super::{ccr, epsr, systick, Apsr, Control, RegisterId, SpecialRegisterId, SysCtrl};
use crate::{AccessFault, ReadResult};

/// Storage-level rules for registers: stack banking and per-register write
/// masks. The engine holds one of these by value so tests can inject a double.
pub trait RegisterOps<S: CoreState> {
    /// Raw value, with no pipeline adjustment for the PC.
    fn read_register(&self, state: &S, id: RegisterId) -> u32;
    fn write_register(&mut self, state: &mut S, id: RegisterId, value: u32);
    fn read_special(&self, state: &S, id: SpecialRegisterId) -> ReadResult<u32>;
    fn write_special(&mut self, state: &mut S, id: SpecialRegisterId, value: u32)
        -> ReadResult<()>;
}

/// ARMv7-M register semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchRegisterOps;

fn stored<S: CoreState>(state: &S, id: SpecialRegisterId) -> u32 {
    state.special()[id as usize]
}

fn store<S: CoreState>(state: &mut S, id: SpecialRegisterId, value: u32) {
    state.special_mut()[id as usize] = value;
}

fn sys_ctrl<S: CoreState>(state: &S) -> SysCtrl {
    SysCtrl::from_bits_retain(stored(state, SpecialRegisterId::SysCtrl))
}

fn active_stack<S: CoreState>(state: &S) -> SpecialRegisterId {
    if sys_ctrl(state).contains(SysCtrl::SPSEL) {
        SpecialRegisterId::SpProcess
    } else {
        SpecialRegisterId::SpMain
    }
}

fn compose_epsr<S: CoreState>(state: &S) -> u32 {
    let istate = stored(state, SpecialRegisterId::Istate);
    let thumb = if sys_ctrl(state).contains(SysCtrl::THUMB) {
        epsr::T
    } else {
        0
    };
    thumb | ((istate & 0x3) << epsr::IT_LOW_SHIFT) | (((istate >> 2) & 0x3F) << epsr::IT_HIGH_SHIFT)
}

fn compose_control<S: CoreState>(state: &S) -> u32 {
    let sys = sys_ctrl(state);
    let mut control = Control::empty();
    control.set(Control::NPRIV, sys.contains(SysCtrl::NPRIV));
    control.set(Control::SPSEL, sys.contains(SysCtrl::SPSEL));
    control.bits()
}

impl<S: CoreState> RegisterOps<S> for ArchRegisterOps {
    #[inline(always)]
    fn read_register(&self, state: &S, id: RegisterId) -> u32 {
        match id {
            RegisterId::Sp => stored(state, active_stack(state)),
            _ => state.core()[id.index()],
        }
    }

    #[inline(always)]
    fn write_register(&mut self, state: &mut S, id: RegisterId, value: u32) {
        match id {
            RegisterId::Sp => {
                let bank = active_stack(state);
                store(state, bank, value & !0x3);
            }
            _ => state.core_mut()[id.index()] = value,
        }
    }

    fn read_special(&self, state: &S, id: SpecialRegisterId) -> ReadResult<u32> {
        if let Some(slot) = id.slot() {
            return Ok(state.special()[slot]);
        }
        match id {
            SpecialRegisterId::Epsr => Ok(compose_epsr(state)),
            SpecialRegisterId::Xpsr => {
                let apsr = stored(state, SpecialRegisterId::Apsr);
                let ipsr = stored(state, SpecialRegisterId::Ipsr) & 0x1FF;
                Ok(apsr | compose_epsr(state) | ipsr)
            }
            SpecialRegisterId::Control => Ok(compose_control(state)),
            _ => Err(AccessFault::Inaccessible(id)),
        }
    }

    fn write_special(
        &mut self,
        state: &mut S,
        id: SpecialRegisterId,
        value: u32,
    ) -> ReadResult<()> {
        tracing::trace!("special register {:?} <- {:#x}", id, value);
        let apsr_mask = (Apsr::NZCV | Apsr::Q | Apsr::GE).bits();
        let masked = match id {
            SpecialRegisterId::SysCtrl => value & SysCtrl::all().bits(),
            SpecialRegisterId::Apsr => value & apsr_mask,
            SpecialRegisterId::Istate => value & 0xFF,
            SpecialRegisterId::Ipsr => value & 0x1FF,
            SpecialRegisterId::Vtor => value & 0xFFFF_FF80,
            SpecialRegisterId::Ccr => value & ccr::WRITABLE,
            SpecialRegisterId::Cfsr | SpecialRegisterId::Bfar => value,
            SpecialRegisterId::SpMain | SpecialRegisterId::SpProcess => value & !0x3,
            SpecialRegisterId::Primask | SpecialRegisterId::Faultmask => value & 0x1,
            SpecialRegisterId::Basepri => value & 0xFF,
            SpecialRegisterId::SysTickCsr => {
                value
                    & (systick::ENABLE | systick::TICKINT | systick::CLKSOURCE | systick::COUNTFLAG)
            }
            SpecialRegisterId::SysTickRvr | SpecialRegisterId::SysTickCvr => {
                value & systick::RELOAD_MASK
            }
            SpecialRegisterId::SysTickCalib | SpecialRegisterId::Cpuid => {
                return Err(AccessFault::ReadOnlyRegister(id));
            }
            SpecialRegisterId::Epsr => {
                let mut sys = sys_ctrl(state);
                sys.set(SysCtrl::THUMB, value & epsr::T != 0);
                let istate = ((value >> epsr::IT_LOW_SHIFT) & 0x3)
                    | (((value >> epsr::IT_HIGH_SHIFT) & 0x3F) << 2);
                store(state, SpecialRegisterId::SysCtrl, sys.bits());
                store(state, SpecialRegisterId::Istate, istate);
                return Ok(());
            }
            SpecialRegisterId::Xpsr => {
                store(state, SpecialRegisterId::Apsr, value & apsr_mask);
                return Ok(());
            }
            SpecialRegisterId::Control => {
                let mut sys = sys_ctrl(state);
                // Unprivileged writes are ignored
                if sys.contains(SysCtrl::NPRIV) && !sys.contains(SysCtrl::HANDLER) {
                    return Ok(());
                }
                let control = Control::from_bits_truncate(value);
                sys.set(SysCtrl::NPRIV, control.contains(Control::NPRIV));
                if !sys.contains(SysCtrl::HANDLER) {
                    sys.set(SysCtrl::SPSEL, control.contains(Control::SPSEL));
                }
                store(state, SpecialRegisterId::SysCtrl, sys.bits());
                return Ok(());
            }
        };
        store(state, id, masked);
        Ok(())
    }
}

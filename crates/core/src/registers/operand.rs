// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Operand references.
//!
//! [`RArg`] names a register taken from instruction bits. [`RConst`] names a
//! register implied by the operation itself, so the identifier is a constant
//! the optimizer can fold through the register accessors.

use super::RegisterId;
use std::fmt;

pub trait RegArg: Copy + fmt::Debug + fmt::Display {
    fn id(&self) -> RegisterId;

    fn is_pc(&self) -> bool {
        self.id() == RegisterId::Pc
    }

    fn is_sp(&self) -> bool {
        self.id() == RegisterId::Sp
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RArg(RegisterId);

impl RArg {
    pub const SP: RArg = RArg(RegisterId::Sp);
    pub const LR: RArg = RArg(RegisterId::Lr);
    pub const PC: RArg = RArg(RegisterId::Pc);

    pub const fn new(id: RegisterId) -> Self {
        Self(id)
    }

    /// Register from an encoding field. Only the low four bits are used.
    pub const fn from_bits(bits: u32) -> Self {
        Self(RegisterId::from_index(bits as u8))
    }

    pub const fn index(self) -> u8 {
        self.0 as u8
    }

    /// R13 or R15, the registers most encodings reserve.
    pub fn is_sp_or_pc(self) -> bool {
        matches!(self.0, RegisterId::Sp | RegisterId::Pc)
    }
}

impl RegArg for RArg {
    #[inline(always)]
    fn id(&self) -> RegisterId {
        self.0
    }
}

impl fmt::Debug for RArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

impl fmt::Display for RArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

impl From<RegisterId> for RArg {
    fn from(id: RegisterId) -> Self {
        Self(id)
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RConst<const ID: u8>;

impl<const ID: u8> RConst<ID> {
    pub const ID: RegisterId = RegisterId::from_index(ID);
}

impl<const ID: u8> RegArg for RConst<ID> {
    #[inline(always)]
    fn id(&self) -> RegisterId {
        Self::ID
    }
}

impl<const ID: u8> fmt::Debug for RConst<ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::ID.name())
    }
}

impl<const ID: u8> fmt::Display for RConst<ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::ID.name())
    }
}

impl<const ID: u8> PartialEq<RArg> for RConst<ID> {
    fn eq(&self, other: &RArg) -> bool {
        Self::ID == other.id()
    }
}

impl<const ID: u8> PartialEq<RConst<ID>> for RArg {
    fn eq(&self, _other: &RConst<ID>) -> bool {
        self.id() == RConst::<ID>::ID
    }
}

pub type SpArg = RConst<13>;
pub type LrArg = RConst<14>;
pub type PcArg = RConst<15>;

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::Apsr;

/// A four-bit condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Condition(u8);

impl Condition {
    pub const EQ: Condition = Condition(0x0);
    pub const NE: Condition = Condition(0x1);
    pub const AL: Condition = Condition(0xE);

    pub const fn from_bits(bits: u32) -> Self {
        Self((bits & 0xF) as u8)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Mnemonic suffix, empty for AL.
    pub fn suffix(self) -> &'static str {
        const SUFFIXES: [&str; 16] = [
            "EQ", "NE", "CS", "CC", "MI", "PL", "VS", "VC", "HI", "LS", "GE", "LT", "GT", "LE", "",
            "",
        ];
        SUFFIXES[self.0 as usize]
    }

    #[inline(always)]
    pub fn passed(self, flags: Apsr) -> bool {
        let n = flags.contains(Apsr::N);
        let z = flags.contains(Apsr::Z);
        let c = flags.contains(Apsr::C);
        let v = flags.contains(Apsr::V);

        match self.0 {
            0x0 => z,              // EQ (Equal)
            0x1 => !z,             // NE (Not Equal)
            0x2 => c,              // CS/HS (Carry Set)
            0x3 => !c,             // CC/LO (Carry Clear)
            0x4 => n,              // MI (Minus)
            0x5 => !n,             // PL (Plus)
            0x6 => v,              // VS (Overflow)
            0x7 => !v,             // VC (No Overflow)
            0x8 => c && !z,        // HI (Unsigned Higher)
            0x9 => !c || z,        // LS (Unsigned Lower or Same)
            0xA => n == v,         // GE (Signed Greater or Equal)
            0xB => n != v,         // LT (Signed Less Than)
            0xC => !z && (n == v), // GT (Signed Greater Than)
            0xD => z || (n != v),  // LE (Signed Less or Equal)
            _ => true,             // AL
        }
    }
}

#[inline(always)]
pub fn in_it_block(istate: u32) -> bool {
    istate & 0xF != 0
}

#[inline(always)]
pub fn last_in_it_block(istate: u32) -> bool {
    istate & 0xF == 0x8
}

/// Condition of the instruction about to execute. `None` means the IT bits
/// hold a pattern no IT instruction can produce.
pub fn current_condition(istate: u32) -> Option<Condition> {
    let istate = istate & 0xFF;
    if in_it_block(istate) {
        Some(Condition::from_bits(istate >> 4))
    } else if istate == 0 {
        Some(Condition::AL)
    } else {
        None
    }
}

/// ITAdvance
pub fn advance(istate: u32) -> u32 {
    if istate & 0x7 == 0 {
        0
    } else {
        (istate & 0xE0) | ((istate << 1) & 0x1F)
    }
}

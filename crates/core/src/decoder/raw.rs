// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// One fetched Thumb instruction, either a single halfword or a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawInstr {
    pub address: u32,
    pub low: u16,
    pub high: u16,
    wide: bool,
}

impl RawInstr {
    /// First halfwords 0b11101, 0b11110 and 0b11111 in the top five bits
    /// start a 32-bit instruction.
    pub const fn is_wide_prefix(halfword: u16) -> bool {
        matches!(halfword >> 11, 0b11101 | 0b11110 | 0b11111)
    }

    pub const fn narrow(address: u32, low: u16) -> Self {
        Self {
            address,
            low,
            high: 0,
            wide: false,
        }
    }

    pub const fn wide(address: u32, low: u16, high: u16) -> Self {
        Self {
            address,
            low,
            high,
            wide: true,
        }
    }

    pub const fn is_wide(&self) -> bool {
        self.wide
    }

    /// The encoding as one word: `low` alone, or `low:high` for 32-bit forms.
    pub const fn opcode(&self) -> u32 {
        if self.wide {
            ((self.low as u32) << 16) | self.high as u32
        } else {
            self.low as u32
        }
    }

    /// Instruction size in bytes.
    pub const fn size(&self) -> u32 {
        if self.wide {
            4
        } else {
            2
        }
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Shift and add primitives shared by every data-processing operation.
//!
//! All functions here are total and side-effect free. Callers decide whether the
//! produced carry/overflow ever reaches the APSR.

/// Result of a shift or rotate together with the bit shifted out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCarry {
    pub value: u32,
    pub carry_out: bool,
}

/// Result of a 32-bit addition with carry-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddCarry {
    pub value: u32,
    pub carry_out: bool,
    pub overflow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftType {
    Lsl,
    Lsr,
    Asr,
    Ror,
    Rrx,
}

/// A shift whose amount is fixed by the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImmShift {
    pub kind: ShiftType,
    pub amount: u8,
}

impl ImmShift {
    pub const NONE: ImmShift = ImmShift {
        kind: ShiftType::Lsl,
        amount: 0,
    };

    pub const fn lsl(amount: u8) -> Self {
        Self {
            kind: ShiftType::Lsl,
            amount,
        }
    }

    pub fn apply(self, value: u32, carry_in: bool) -> ShiftCarry {
        shift_c(value, self.kind, self.amount as u32, carry_in)
    }
}

/// Modified immediate after ThumbExpandImm. `carry_out` is `None` when the
/// encoding does not rotate, in which case the APSR carry passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpandedImm {
    pub value: u32,
    pub carry_out: Option<bool>,
}

impl ExpandedImm {
    /// A plain immediate that leaves the carry flag alone.
    pub const fn plain(value: u32) -> Self {
        Self {
            value,
            carry_out: None,
        }
    }

    pub fn carry(self, carry_in: bool) -> bool {
        self.carry_out.unwrap_or(carry_in)
    }
}

pub fn lsl_c(value: u32, amount: u32, carry_in: bool) -> ShiftCarry {
    match amount {
        0 => ShiftCarry {
            value,
            carry_out: carry_in,
        },
        1..=31 => ShiftCarry {
            value: value << amount,
            carry_out: (value >> (32 - amount)) & 1 != 0,
        },
        32 => ShiftCarry {
            value: 0,
            carry_out: value & 1 != 0,
        },
        _ => ShiftCarry {
            value: 0,
            carry_out: false,
        },
    }
}

pub fn lsr_c(value: u32, amount: u32, carry_in: bool) -> ShiftCarry {
    match amount {
        0 => ShiftCarry {
            value,
            carry_out: carry_in,
        },
        1..=31 => ShiftCarry {
            value: value >> amount,
            carry_out: (value >> (amount - 1)) & 1 != 0,
        },
        32 => ShiftCarry {
            value: 0,
            carry_out: value >> 31 != 0,
        },
        _ => ShiftCarry {
            value: 0,
            carry_out: false,
        },
    }
}

pub fn asr_c(value: u32, amount: u32, carry_in: bool) -> ShiftCarry {
    match amount {
        0 => ShiftCarry {
            value,
            carry_out: carry_in,
        },
        1..=31 => ShiftCarry {
            value: ((value as i32) >> amount) as u32,
            carry_out: (value >> (amount - 1)) & 1 != 0,
        },
        _ => {
            let sign = value >> 31 != 0;
            ShiftCarry {
                value: if sign { u32::MAX } else { 0 },
                carry_out: sign,
            }
        }
    }
}

/// Rotate right. A zero amount is a no-op and is never the RRX form.
pub fn ror_c(value: u32, amount: u32, carry_in: bool) -> ShiftCarry {
    if amount == 0 {
        return ShiftCarry {
            value,
            carry_out: carry_in,
        };
    }
    let result = value.rotate_right(amount % 32);
    ShiftCarry {
        value: result,
        carry_out: result >> 31 != 0,
    }
}

/// Rotate right by exactly one bit through the carry.
pub fn rrx_c(value: u32, carry_in: bool) -> ShiftCarry {
    ShiftCarry {
        value: (value >> 1) | ((carry_in as u32) << 31),
        carry_out: value & 1 != 0,
    }
}

pub fn add_with_carry(a: u32, b: u32, carry_in: bool) -> AddCarry {
    let unsigned_sum = a as u64 + b as u64 + carry_in as u64;
    let signed_sum = a as i32 as i64 + b as i32 as i64 + carry_in as i64;
    let value = unsigned_sum as u32;
    AddCarry {
        value,
        carry_out: unsigned_sum > u32::MAX as u64,
        overflow: value as i32 as i64 != signed_sum,
    }
}

pub fn shift_c(value: u32, kind: ShiftType, amount: u32, carry_in: bool) -> ShiftCarry {
    match kind {
        ShiftType::Lsl => lsl_c(value, amount, carry_in),
        ShiftType::Lsr => lsr_c(value, amount, carry_in),
        ShiftType::Asr => asr_c(value, amount, carry_in),
        ShiftType::Ror => ror_c(value, amount, carry_in),
        ShiftType::Rrx => rrx_c(value, carry_in),
    }
}

pub fn shift(value: u32, kind: ShiftType, amount: u32, carry_in: bool) -> u32 {
    shift_c(value, kind, amount, carry_in).value
}

/// DecodeImmShift: maps the two type bits and imm5 onto a shift.
pub fn decode_imm_shift(type_bits: u32, imm5: u32) -> ImmShift {
    let imm5 = (imm5 & 0x1F) as u8;
    match type_bits & 0x3 {
        0 => ImmShift {
            kind: ShiftType::Lsl,
            amount: imm5,
        },
        1 => ImmShift {
            kind: ShiftType::Lsr,
            amount: if imm5 == 0 { 32 } else { imm5 },
        },
        2 => ImmShift {
            kind: ShiftType::Asr,
            amount: if imm5 == 0 { 32 } else { imm5 },
        },
        _ if imm5 == 0 => ImmShift {
            kind: ShiftType::Rrx,
            amount: 1,
        },
        _ => ImmShift {
            kind: ShiftType::Ror,
            amount: imm5,
        },
    }
}

/// DecodeRegShift: shift kind for register-controlled shifts.
pub fn decode_reg_shift(type_bits: u32) -> ShiftType {
    match type_bits & 0x3 {
        0 => ShiftType::Lsl,
        1 => ShiftType::Lsr,
        2 => ShiftType::Asr,
        _ => ShiftType::Ror,
    }
}

/// ThumbExpandImm_C over `i:imm3:imm8`. Returns `None` for the replicated
/// patterns whose byte is zero, which the architecture leaves unpredictable.
pub fn thumb_expand_imm_c(imm12: u32) -> Option<ExpandedImm> {
    let imm12 = imm12 & 0xFFF;
    let byte = imm12 & 0xFF;

    if imm12 >> 10 == 0 {
        let value = match (imm12 >> 8) & 0x3 {
            0 => byte,
            1 => (byte << 16) | byte,
            2 => (byte << 24) | (byte << 8),
            _ => (byte << 24) | (byte << 16) | (byte << 8) | byte,
        };
        if (imm12 >> 8) & 0x3 != 0 && byte == 0 {
            return None;
        }
        return Some(ExpandedImm {
            value,
            carry_out: None,
        });
    }

    let unrotated = 0x80 | (imm12 & 0x7F);
    let rotated = ror_c(unrotated, (imm12 >> 7) & 0x1F, false);
    Some(ExpandedImm {
        value: rotated.value,
        carry_out: Some(rotated.carry_out),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_with_carry_boundaries() {
        let r = add_with_carry(0xFFFF_FFFF, 1, false);
        assert_eq!(
            r,
            AddCarry {
                value: 0,
                carry_out: true,
                overflow: false
            }
        );

        // INT_MAX + 1 overflows signed but not unsigned
        let r = add_with_carry(0x7FFF_FFFF, 1, false);
        assert_eq!(r.value, 0x8000_0000);
        assert!(!r.carry_out);
        assert!(r.overflow);

        // INT_MIN + INT_MIN
        let r = add_with_carry(0x8000_0000, 0x8000_0000, false);
        assert_eq!(r.value, 0);
        assert!(r.carry_out);
        assert!(r.overflow);

        // Carry-in alone wraps the maximum value
        let r = add_with_carry(0xFFFF_FFFF, 0, true);
        assert_eq!(r.value, 0);
        assert!(r.carry_out);
        assert!(!r.overflow);

        let r = add_with_carry(0, 0, false);
        assert_eq!(r.value, 0);
        assert!(!r.carry_out);
        assert!(!r.overflow);
    }

    #[test]
    fn test_subtraction_as_complement_add() {
        // 5 - 3: no borrow, carry set
        let r = add_with_carry(5, !3, true);
        assert_eq!(r.value, 2);
        assert!(r.carry_out);

        // 3 - 5: borrow, carry clear
        let r = add_with_carry(3, !5, true);
        assert_eq!(r.value, 0xFFFF_FFFE);
        assert!(!r.carry_out);
        assert!(!r.overflow);

        // INT_MIN - 1 overflows
        let r = add_with_carry(0x8000_0000, !1, true);
        assert_eq!(r.value, 0x7FFF_FFFF);
        assert!(r.overflow);
    }

    #[test]
    fn test_add_with_carry_matches_wide_arithmetic() {
        let samples = [
            0u32,
            1,
            2,
            0x7FFF_FFFE,
            0x7FFF_FFFF,
            0x8000_0000,
            0x8000_0001,
            0xFFFF_FFFE,
            0xFFFF_FFFF,
            0x1234_5678,
        ];
        for &a in &samples {
            for &b in &samples {
                for carry in [false, true] {
                    let r = add_with_carry(a, b, carry);
                    let wide = a as u64 + b as u64 + carry as u64;
                    assert_eq!(r.value, wide as u32);
                    assert_eq!(r.carry_out, wide >> 32 != 0);
                    let signed = a as i32 as i64 + b as i32 as i64 + carry as i64;
                    assert_eq!(
                        r.overflow,
                        signed > i32::MAX as i64 || signed < i32::MIN as i64
                    );
                }
            }
        }
    }

    #[test]
    fn test_zero_amount_passes_carry_through() {
        for carry in [false, true] {
            assert_eq!(lsl_c(0xA5A5_0001, 0, carry).carry_out, carry);
            assert_eq!(lsr_c(0xA5A5_0001, 0, carry).carry_out, carry);
            assert_eq!(asr_c(0xA5A5_0001, 0, carry).carry_out, carry);
            assert_eq!(
                ror_c(0xA5A5_0001, 0, carry),
                ShiftCarry {
                    value: 0xA5A5_0001,
                    carry_out: carry
                }
            );
        }
    }

    #[test]
    fn test_rotate_and_extend_are_distinct() {
        // ROR #0 is a no-op
        assert_eq!(ror_c(0x0000_0003, 0, false).value, 0x0000_0003);
        // RRX always moves one bit and pulls the carry in at the top
        let r = rrx_c(0x0000_0003, false);
        assert_eq!(r.value, 0x0000_0001);
        assert!(r.carry_out);
        let r = rrx_c(0x0000_0002, true);
        assert_eq!(r.value, 0x8000_0001);
        assert!(!r.carry_out);
        // DecodeImmShift maps ROR #0 onto RRX
        assert_eq!(
            decode_imm_shift(0b11, 0),
            ImmShift {
                kind: ShiftType::Rrx,
                amount: 1
            }
        );
        assert_eq!(
            decode_imm_shift(0b11, 4),
            ImmShift {
                kind: ShiftType::Ror,
                amount: 4
            }
        );
    }

    #[test]
    fn test_shifts_by_32_and_beyond() {
        assert_eq!(
            lsl_c(0x0000_0001, 32, false),
            ShiftCarry {
                value: 0,
                carry_out: true
            }
        );
        assert_eq!(
            lsl_c(0xFFFF_FFFF, 33, true),
            ShiftCarry {
                value: 0,
                carry_out: false
            }
        );
        assert_eq!(
            lsr_c(0x8000_0000, 32, false),
            ShiftCarry {
                value: 0,
                carry_out: true
            }
        );
        assert_eq!(
            asr_c(0x8000_0000, 32, false),
            ShiftCarry {
                value: 0xFFFF_FFFF,
                carry_out: true
            }
        );
        assert_eq!(
            asr_c(0x7FFF_FFFF, 200, true),
            ShiftCarry {
                value: 0,
                carry_out: false
            }
        );
        // ROR by a multiple of 32 keeps the value and copies bit 31 into carry
        assert_eq!(
            ror_c(0x8000_0001, 32, false),
            ShiftCarry {
                value: 0x8000_0001,
                carry_out: true
            }
        );
    }

    #[test]
    fn test_shift_carries() {
        assert_eq!(
            lsl_c(0x8000_0001, 1, false),
            ShiftCarry {
                value: 0x0000_0002,
                carry_out: true
            }
        );
        assert_eq!(
            lsr_c(0x0000_0003, 1, false),
            ShiftCarry {
                value: 0x0000_0001,
                carry_out: true
            }
        );
        assert_eq!(
            asr_c(0x8000_0000, 4, false),
            ShiftCarry {
                value: 0xF800_0000,
                carry_out: false
            }
        );
        assert_eq!(
            ror_c(0x0000_0001, 1, false),
            ShiftCarry {
                value: 0x8000_0000,
                carry_out: true
            }
        );
    }

    #[test]
    fn test_primitives_are_deterministic() {
        for amount in 0..40 {
            for carry in [false, true] {
                let a = ror_c(0xDEAD_BEEF, amount, carry);
                let b = ror_c(0xDEAD_BEEF, amount, carry);
                assert_eq!(a, b);
                assert_eq!(lsl_c(0xDEAD_BEEF, amount, carry), lsl_c(0xDEAD_BEEF, amount, carry));
            }
        }
    }

    #[test]
    fn test_decode_imm_shift_zero_means_32() {
        assert_eq!(decode_imm_shift(0b00, 0), ImmShift::NONE);
        assert_eq!(decode_imm_shift(0b01, 0).amount, 32);
        assert_eq!(decode_imm_shift(0b10, 0).amount, 32);
        assert_eq!(decode_imm_shift(0b10, 5).kind, ShiftType::Asr);
    }

    #[test]
    fn test_thumb_expand_imm() {
        assert_eq!(
            thumb_expand_imm_c(0x0AB),
            Some(ExpandedImm {
                value: 0xAB,
                carry_out: None
            })
        );
        assert_eq!(thumb_expand_imm_c(0x1AB).map(|i| i.value), Some(0x00AB_00AB));
        assert_eq!(thumb_expand_imm_c(0x2AB).map(|i| i.value), Some(0xAB00_AB00));
        assert_eq!(thumb_expand_imm_c(0x3AB).map(|i| i.value), Some(0xABAB_ABAB));
        // Replicated zero bytes are unpredictable
        assert_eq!(thumb_expand_imm_c(0x100), None);
        assert_eq!(thumb_expand_imm_c(0x300), None);
        // Plain zero is fine
        assert_eq!(thumb_expand_imm_c(0x000).map(|i| i.value), Some(0));
        // 0x4FF: rotation 9 of 0xFF -> 0x7F800000, carry from bit 31 = 0
        assert_eq!(
            thumb_expand_imm_c(0x4FF),
            Some(ExpandedImm {
                value: 0x7F80_0000,
                carry_out: Some(false)
            })
        );
        // rotation 8 of 0x80 -> 0x80000000, carry set
        assert_eq!(
            thumb_expand_imm_c(0x400),
            Some(ExpandedImm {
                value: 0x8000_0000,
                carry_out: Some(true)
            })
        );
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{AccessFault, ReadResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start_addr: u64,
    pub data: Vec<u8>,
}

/// Code and data to place in memory before reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramImage {
    pub segments: Vec<Segment>,
}

impl ProgramImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_segment(&mut self, start_addr: u64, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }

    /// Adds a segment of little-endian halfwords, the unit Thumb code is
    /// written in.
    pub fn add_thumb(&mut self, start_addr: u64, halfwords: &[u16]) {
        let data = halfwords.iter().flat_map(|h| h.to_le_bytes()).collect();
        self.add_segment(start_addr, data);
    }
}

/// A contiguous, byte-backed part of the address map.
///
/// Accesses are little-endian and must lie entirely inside the region.
/// A read-only region can still be filled through [`Region::load`].
#[derive(Debug, Clone)]
pub struct Region {
    base: u64,
    bytes: Box<[u8]>,
    writable: bool,
}

impl Region {
    pub fn rom(base: u64, size: usize) -> Self {
        Self {
            base,
            bytes: vec![0; size].into_boxed_slice(),
            writable: false,
        }
    }

    pub fn ram(base: u64, size: usize) -> Self {
        Self {
            writable: true,
            ..Self::rom(base, size)
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// First address past the region.
    pub fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }

    fn span(&self, addr: u64, len: usize) -> Option<std::ops::Range<usize>> {
        let start = addr.checked_sub(self.base)? as usize;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }

    /// Reads 1, 2 or 4 bytes. `None` when any byte falls outside.
    pub fn read(&self, addr: u64, size: usize) -> Option<u32> {
        let bytes = &self.bytes[self.span(addr, size)?];
        Some(
            bytes
                .iter()
                .rev()
                .fold(0u32, |acc, &b| (acc << 8) | b as u32),
        )
    }

    /// Writes the low `size` bytes of `value`. Nothing is written when the
    /// access leaves the region or the region is read-only.
    pub fn write(&mut self, addr: u64, size: usize, value: u32) -> ReadResult<()> {
        let Some(span) = self.span(addr, size) else {
            let fault = if self.contains(addr) { self.end() } else { addr };
            return Err(AccessFault::MemoryViolation(fault));
        };
        if !self.writable {
            return Err(AccessFault::ReadOnlyMemory(addr));
        }
        self.bytes[span].copy_from_slice(&value.to_le_bytes()[..size]);
        Ok(())
    }

    /// Copies `data` in regardless of write protection. Returns false, and
    /// copies nothing, when it does not fit.
    pub fn load(&mut self, addr: u64, data: &[u8]) -> bool {
        match self.span(addr, data.len()) {
            Some(span) => {
                self.bytes[span].copy_from_slice(data);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halfword_fetch_order() {
        let mut flash = Region::rom(0, 0x200);
        let mut image = ProgramImage::new();
        image.add_thumb(0x100, &[0xF241, 0x2134]);
        let segment = &image.segments[0];
        assert!(flash.load(segment.start_addr, &segment.data));

        assert_eq!(flash.read(0x100, 2), Some(0xF241));
        assert_eq!(flash.read(0x102, 2), Some(0x2134));
        assert_eq!(flash.read(0x100, 4), Some(0x2134_F241));
        // Unaligned reads are plain byte gathers
        assert_eq!(flash.read(0x101, 2), Some(0x34F2));
    }

    #[test]
    fn test_access_must_fit() {
        let mut ram = Region::ram(0x2000_0000, 0x10);
        ram.write(0x2000_000C, 4, 0xAABB_CCDD).unwrap();
        assert_eq!(ram.read(0x2000_000E, 2), Some(0xAABB));
        assert_eq!(ram.read(0x2000_000E, 4), None);
        assert_eq!(ram.read(0x1FFF_FFFF, 1), None);

        assert_eq!(
            ram.write(0x2000_000E, 4, 0),
            Err(AccessFault::MemoryViolation(0x2000_0010))
        );
        // The straddling store left the last word alone
        assert_eq!(ram.read(0x2000_000C, 4), Some(0xAABB_CCDD));
        assert_eq!(
            ram.write(0x3000_0000, 1, 0),
            Err(AccessFault::MemoryViolation(0x3000_0000))
        );
    }

    #[test]
    fn test_rom_rejects_stores_but_loads() {
        let mut flash = Region::rom(0, 0x100);
        assert!(!flash.is_writable());
        assert_eq!(
            flash.write(0x10, 2, 0xBF00),
            Err(AccessFault::ReadOnlyMemory(0x10))
        );
        assert!(flash.load(0x10, &[0x00, 0xBF]));
        assert_eq!(flash.read(0x10, 2), Some(0xBF00));
        assert!(!flash.load(0xFF, &[1, 2]));
        assert_eq!(flash.read(0xFF, 1), Some(0));
    }
}

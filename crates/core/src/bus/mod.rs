// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::memory::{ProgramImage, Region};
use crate::{AccessFault, Bus, ReadResult};

pub const FLASH_BASE: u64 = 0x0000_0000;
pub const RAM_BASE: u64 = 0x2000_0000;

/// Flash and SRAM of a typical Cortex-M part. Flash is read-only to the
/// core and only filled through [`SystemBus::load_image`].
pub struct SystemBus {
    pub flash: Region,
    pub ram: Region,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus {
    pub fn new() -> Self {
        Self::with_sizes(1024 * 1024, 1024 * 1024)
    }

    pub fn with_sizes(flash: usize, ram: usize) -> Self {
        Self {
            flash: Region::rom(FLASH_BASE, flash),
            ram: Region::ram(RAM_BASE, ram),
        }
    }

    /// Copies every segment into flash or RAM. A segment that fits neither
    /// is reported with its start address.
    pub fn load_image(&mut self, image: &ProgramImage) -> ReadResult<()> {
        for segment in &image.segments {
            let (addr, data) = (segment.start_addr, &segment.data);
            if !self.flash.load(addr, data) && !self.ram.load(addr, data) {
                tracing::warn!(
                    "segment at {:#x} ({} bytes) does not fit any memory region",
                    addr,
                    data.len()
                );
                return Err(AccessFault::MemoryViolation(addr));
            }
        }
        Ok(())
    }

    fn region(&self, addr: u64) -> Option<&Region> {
        [&self.ram, &self.flash]
            .into_iter()
            .find(|region| region.contains(addr))
    }

    fn read(&self, addr: u64, size: usize) -> ReadResult<u32> {
        let region = self
            .region(addr)
            .ok_or(AccessFault::MemoryViolation(addr))?;
        // Only the tail of an access can run past the region
        region
            .read(addr, size)
            .ok_or(AccessFault::MemoryViolation(region.end()))
    }

    fn write(&mut self, addr: u64, size: usize, value: u32) -> ReadResult<()> {
        if self.flash.contains(addr) {
            self.flash.write(addr, size, value)
        } else {
            self.ram.write(addr, size, value)
        }
    }
}

impl Bus for SystemBus {
    fn read_u8(&self, addr: u64) -> ReadResult<u8> {
        Ok(self.read(addr, 1)? as u8)
    }

    fn write_u8(&mut self, addr: u64, value: u8) -> ReadResult<()> {
        self.write(addr, 1, value as u32)
    }

    fn read_u16(&self, addr: u64) -> ReadResult<u16> {
        Ok(self.read(addr, 2)? as u16)
    }

    fn read_u32(&self, addr: u64) -> ReadResult<u32> {
        self.read(addr, 4)
    }

    fn write_u16(&mut self, addr: u64, value: u16) -> ReadResult<()> {
        self.write(addr, 2, value as u32)
    }

    fn write_u32(&mut self, addr: u64, value: u32) -> ReadResult<()> {
        self.write(addr, 4, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_round_trip_little_endian() {
        let mut bus = SystemBus::new();
        bus.write_u32(0x2000_0010, 0x1122_3344).unwrap();
        assert_eq!(bus.read_u8(0x2000_0010), Ok(0x44));
        assert_eq!(bus.read_u16(0x2000_0012), Ok(0x1122));
    }

    #[test]
    fn test_flash_is_read_only() {
        let mut bus = SystemBus::new();
        assert_eq!(
            bus.write_u8(0x100, 1),
            Err(AccessFault::ReadOnlyMemory(0x100))
        );
        assert_eq!(
            bus.read_u8(0x4000_0000),
            Err(AccessFault::MemoryViolation(0x4000_0000))
        );
    }

    #[test]
    fn test_load_image() {
        let mut bus = SystemBus::new();
        let mut image = ProgramImage::new();
        image.add_thumb(0x100, &[0xBF00]);
        image.add_segment(0x2000_0000, vec![0xAA]);
        bus.load_image(&image).unwrap();
        assert_eq!(bus.read_u16(0x100), Ok(0xBF00));
        assert_eq!(bus.read_u8(0x2000_0000), Ok(0xAA));

        let mut stray = ProgramImage::new();
        stray.add_segment(0x1000_0000, vec![0]);
        assert_eq!(
            bus.load_image(&stray),
            Err(AccessFault::MemoryViolation(0x1000_0000))
        );
    }

    #[test]
    fn test_fetch_past_end_of_flash() {
        let mut bus = SystemBus::with_sizes(0x104, 0x100);
        let mut image = ProgramImage::new();
        image.add_thumb(0x100, &[0xBF00, 0xF000]);
        bus.load_image(&image).unwrap();
        assert_eq!(bus.read_u32(0x100), Ok(0xF000_BF00));
        assert_eq!(
            bus.read_u32(0x102),
            Err(AccessFault::MemoryViolation(0x104))
        );
        assert_eq!(
            bus.write_u16(0x200F_FFFF, 0),
            Err(AccessFault::MemoryViolation(0x200F_FFFF))
        );
    }
}

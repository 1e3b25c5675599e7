//! # trimfat
//!
//! Trims a FAT32 filesystem image to the smallest size that still contains
//! all allocated data.
//!
//! The File Allocation Table maps every cluster of the data region to a
//! marker saying whether it is free, part of a file's cluster chain, or
//! reserved. Scanning every FAT copy for the highest cluster marked as
//! allocated tells us where the useful part of the image ends; everything
//! after it can be cut off.
//!
//! ```rust
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), trimfat::error::TrimError> {
//! # let mut image = Cursor::new(trimfat::demo_image());
//! let plan = trimfat::trim::plan(&mut image)?;
//! println!("can trim to {} bytes", plan.new_size);
//! # Ok(())
//! # }
//! ```
//!
//! ## Limitations
//! Only raw FAT32 volumes starting at sector 0 are supported: no FAT12/16,
//! no partition tables, no repair of inconsistent filesystems.

pub mod boot_sector;
pub mod error;
pub mod fat;
pub mod fields;
pub mod human;
pub mod trim;

pub const GB: u32 = 1024 * 1024 * 1024;
pub const MB: u32 = 1024 * 1024;
pub const KB: u16 = 1024;

/// A minimal valid FAT32 image for the crate docs.
#[doc(hidden)]
pub fn demo_image() -> Vec<u8> {
    let mut image = vec![0u8; 68 * 512];
    // 512-byte sectors, 1 sector per cluster, 32 reserved, 2 FATs of 16 sectors
    image[0x00B..0x00D].copy_from_slice(&512u16.to_le_bytes());
    image[0x00D] = 1;
    image[0x00E..0x010].copy_from_slice(&32u16.to_le_bytes());
    image[0x010] = 2;
    image[0x024..0x028].copy_from_slice(&16u32.to_le_bytes());
    image[0x052..0x05A].copy_from_slice(b"FAT32   ");
    image[510] = 0x55;
    image[511] = 0xAA;
    image
}

//! One on-disk copy of the File Allocation Table, viewed as a sequence of
//! 32-bit cluster entries.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::boot_sector::BootSector;
use crate::error::{FieldError, TrimError};
use crate::fields::{get32, set32};

/// FAT32 stores 28-bit entries; the top 4 bits are reserved and must be
/// masked off when reading.
pub const ENTRY_MASK: u32 = 0x0FFF_FFFF;

#[derive(Debug)]
pub struct Fat {
    data: Vec<u8>,
}

impl Fat {
    /// Reads FAT copy `index` from the image, located via the boot sector.
    pub fn read<T: Read + Seek>(
        image: &mut T,
        boot: &BootSector,
        index: u8,
    ) -> Result<Fat, TrimError> {
        let (offset, length) = boot.fat_range(index)?;
        image.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; length as usize];
        image.read_exact(&mut data).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => TrimError::DataEndsWithinFat(index),
            _ => TrimError::Io(e),
        })?;
        Ok(Fat::new(data))
    }

    fn new(data: Vec<u8>) -> Fat {
        // guaranteed by the geometry formula; a violation is a bug
        assert_eq!(data.len() % 4, 0, "FAT length not a multiple of 4");
        Fat { data }
    }

    /// Entry for cluster `index`, masked to the 28 significant bits.
    pub fn entry(&self, index: usize) -> u32 {
        get32(&self.data, index * 4) & ENTRY_MASK
    }

    /// Stores a raw 32-bit entry, reserved top bits included.
    pub fn set_entry(&mut self, index: usize, value: u64) -> Result<(), FieldError> {
        set32(&mut self.data, index * 4, value)
    }

    /// Number of entries in this copy.
    pub fn len(&self) -> usize {
        self.data.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Writes all entries in hexadecimal, 8 per line.
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for index in 0..self.len() {
            let sep = if index % 8 == 7 { '\n' } else { ' ' };
            write!(out, "{:08X}{}", self.entry(index), sep)?;
        }
        if self.len() % 8 != 0 {
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
use std::io::Cursor;

#[cfg(test)]
use crate::boot_sector::synthetic_boot_sector;

#[cfg(test)]
fn boot_with_one_fat(sectors_per_fat: u64) -> BootSector {
    let data = synthetic_boot_sector(512, 1, 1, 1, sectors_per_fat);
    BootSector::read(&mut Cursor::new(data.to_vec())).unwrap()
}

#[test]
fn reads_fat_at_computed_range() {
    let boot = boot_with_one_fat(1);
    // one reserved sector, then a one-sector FAT
    let mut image = vec![0u8; 2 * 512];
    image[512..516].copy_from_slice(&0xFFFF_FFF8u32.to_le_bytes());
    image[516..520].copy_from_slice(&3u32.to_le_bytes());

    let fat = Fat::read(&mut Cursor::new(image), &boot, 0).unwrap();
    assert_eq!(fat.len(), 128);
    assert_eq!(fat.entry(1), 3);
}

#[test]
fn entry_masks_reserved_top_bits() {
    let boot = boot_with_one_fat(1);
    let mut image = vec![0u8; 2 * 512];
    image[512..516].copy_from_slice(&0xF000_0003u32.to_le_bytes());

    let fat = Fat::read(&mut Cursor::new(image), &boot, 0).unwrap();
    assert_eq!(fat.entry(0), 3);
    for index in 0..fat.len() {
        assert!(fat.entry(index) <= ENTRY_MASK);
    }
}

#[test]
fn set_entry_stores_raw_value() {
    let boot = boot_with_one_fat(1);
    let mut fat = Fat::read(&mut Cursor::new(vec![0u8; 2 * 512]), &boot, 0).unwrap();

    fat.set_entry(5, 0xFFFF_FFFF).unwrap();
    // raw store, masked read
    assert_eq!(get32(&fat.data, 5 * 4), 0xFFFF_FFFF);
    assert_eq!(fat.entry(5), ENTRY_MASK);
    assert!(fat.set_entry(5, 0x1_0000_0000).is_err());
}

#[test]
fn short_fat_is_an_error() {
    let boot = boot_with_one_fat(4);
    // image ends one sector into the four-sector FAT
    let mut image = Cursor::new(vec![0u8; 2 * 512]);
    let err = Fat::read(&mut image, &boot, 0).unwrap_err();
    assert_eq!(err.to_string(), "Data ends within FAT0");
}

#[test]
fn dump_prints_eight_entries_per_line() {
    let fat = Fat::new(vec![0u8; 12 * 4]);
    let mut out = Vec::new();
    fat.dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].split_whitespace().count(), 8);
    assert_eq!(lines[1].split_whitespace().count(), 4);
    assert!(text.starts_with("00000000 "));
}

//! The FAT32 boot sector: the first 512 bytes of the volume, holding the
//! geometry every other structure is located from.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::error::{FieldError, TrimError};
use crate::fields::{check_power_of_two, get8, get16, get32};

/// Size of the boot sector record, independent of the volume's sector size.
pub const BOOT_SECTOR_SIZE: usize = 512;

/// `55 AA` marker in the last two bytes of the boot sector.
const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// File system type string at offset 0x052, space-padded to 8 bytes.
const FILESYSTEM_TYPE: &[u8; 8] = b"FAT32   ";

/// An immutable view over a validated FAT32 boot sector.
///
/// Geometry fields live at fixed offsets inside the raw record; accessors
/// decode them on demand, and the two fields required to be powers of two
/// are re-checked on every read so a corrupt image that slipped past the
/// signature checks still fails loudly.
#[derive(Clone)]
pub struct BootSector {
    data: [u8; BOOT_SECTOR_SIZE],
}

impl BootSector {
    /// Reads and validates the boot sector from the start of the image.
    pub fn read<T: Read + Seek>(image: &mut T) -> Result<BootSector, TrimError> {
        image.seek(SeekFrom::Start(0))?;
        let mut data = [0u8; BOOT_SECTOR_SIZE];
        image.read_exact(&mut data).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => TrimError::ShortBootSector,
            _ => TrimError::Io(e),
        })?;

        // A few sanity checks: is this really a FAT32 partition?
        if data[BOOT_SECTOR_SIZE - 2..] != BOOT_SIGNATURE {
            return Err(TrimError::MissingBootSignature);
        }
        if &data[0x052..0x05A] != FILESYSTEM_TYPE {
            return Err(TrimError::MissingFilesystemType);
        }

        Ok(BootSector { data })
    }

    /// Bytes per sector. Must be a power of two.
    pub fn sector_size(&self) -> Result<u16, FieldError> {
        let n = get16(&self.data, 0x00B);
        check_power_of_two(n as u64, "Sector size")?;
        Ok(n)
    }

    /// Sectors per allocation cluster. Must be a power of two.
    pub fn sectors_per_cluster(&self) -> Result<u8, FieldError> {
        let n = get8(&self.data, 0x00D);
        check_power_of_two(n as u64, "Sectors per cluster")?;
        Ok(n)
    }

    /// Sectors preceding the first FAT copy.
    pub fn reserved_sectors(&self) -> u16 {
        get16(&self.data, 0x00E)
    }

    /// Number of redundant FAT copies on the volume.
    pub fn num_fats(&self) -> u8 {
        get8(&self.data, 0x010)
    }

    /// Length of one FAT copy, in sectors.
    pub fn sectors_per_fat(&self) -> u32 {
        get32(&self.data, 0x024)
    }

    /// Returns the offset and length (both in bytes) of the given FAT copy.
    pub fn fat_range(&self, index: u8) -> Result<(u64, u64), FieldError> {
        assert!(index < self.num_fats(), "FAT index out of range: {index}");
        let sector_size = self.sector_size()? as u64;
        let length = self.sectors_per_fat() as u64 * sector_size;
        let offset = self.reserved_sectors() as u64 * sector_size + index as u64 * length;
        Ok((offset, length))
    }
}

#[cfg(test)]
pub(crate) fn synthetic_boot_sector(
    sector_size: u64,
    sectors_per_cluster: u64,
    reserved_sectors: u64,
    num_fats: u64,
    sectors_per_fat: u64,
) -> [u8; BOOT_SECTOR_SIZE] {
    use crate::fields::{set8, set16, set32};

    let mut data = [0u8; BOOT_SECTOR_SIZE];
    set16(&mut data, 0x00B, sector_size).unwrap();
    set8(&mut data, 0x00D, sectors_per_cluster).unwrap();
    set16(&mut data, 0x00E, reserved_sectors).unwrap();
    set8(&mut data, 0x010, num_fats).unwrap();
    set32(&mut data, 0x024, sectors_per_fat).unwrap();
    data[0x052..0x05A].copy_from_slice(FILESYSTEM_TYPE);
    data[BOOT_SECTOR_SIZE - 2..].copy_from_slice(&BOOT_SIGNATURE);
    data
}

#[cfg(test)]
use std::io::Cursor;

#[test]
fn parses_valid_boot_sector() {
    let data = synthetic_boot_sector(512, 4, 32, 2, 16);
    let boot = BootSector::read(&mut Cursor::new(data.to_vec())).unwrap();

    assert_eq!(boot.sector_size().unwrap(), 512);
    assert_eq!(boot.sectors_per_cluster().unwrap(), 4);
    assert_eq!(boot.reserved_sectors(), 32);
    assert_eq!(boot.num_fats(), 2);
    assert_eq!(boot.sectors_per_fat(), 16);
}

#[test]
fn rejects_short_image() {
    let mut image = Cursor::new(vec![0u8; 100]);
    assert!(matches!(
        BootSector::read(&mut image),
        Err(TrimError::ShortBootSector)
    ));
}

#[test]
fn rejects_missing_signature() {
    let mut data = synthetic_boot_sector(512, 1, 32, 2, 16);
    data[510] = 0;
    assert!(matches!(
        BootSector::read(&mut Cursor::new(data.to_vec())),
        Err(TrimError::MissingBootSignature)
    ));
}

#[test]
fn rejects_missing_filesystem_type() {
    let mut data = synthetic_boot_sector(512, 1, 32, 2, 16);
    data[0x052..0x05A].copy_from_slice(b"FAT16   ");
    assert!(matches!(
        BootSector::read(&mut Cursor::new(data.to_vec())),
        Err(TrimError::MissingFilesystemType)
    ));
}

#[test]
fn checks_geometry_on_every_read() {
    // signature and type string are fine, but the sector size is garbage
    let mut data = synthetic_boot_sector(512, 1, 32, 2, 16);
    data[0x00B] = 0x01;
    data[0x00C] = 0x02; // 0x0201 = 513
    let boot = BootSector::read(&mut Cursor::new(data.to_vec())).unwrap();
    assert!(matches!(
        boot.sector_size(),
        Err(FieldError::NotPowerOfTwo { value: 513, .. })
    ));
}

#[test]
fn fat_ranges_are_contiguous() {
    let data = synthetic_boot_sector(512, 1, 32, 2, 16);
    let boot = BootSector::read(&mut Cursor::new(data.to_vec())).unwrap();

    let (offset0, length0) = boot.fat_range(0).unwrap();
    let (offset1, length1) = boot.fat_range(1).unwrap();
    assert_eq!(offset0, 32 * 512);
    assert_eq!(length0, 16 * 512);
    assert_eq!(offset1, offset0 + length0);
    assert_eq!(length1, length0);
}

#[test]
#[should_panic(expected = "FAT index out of range")]
fn fat_range_rejects_bad_index() {
    let data = synthetic_boot_sector(512, 1, 32, 2, 16);
    let boot = BootSector::read(&mut Cursor::new(data.to_vec())).unwrap();
    let _ = boot.fat_range(2);
}

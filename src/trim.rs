//! The scan that decides where a FAT32 image can be cut.
//!
//! Every FAT copy is walked entry by entry to find the highest cluster whose
//! entry marks it as allocated; the image can then be truncated right after
//! that cluster's data. The scan never writes, so a failed run leaves the
//! image untouched.

use std::io::{Read, Seek, SeekFrom};

use crate::boot_sector::BootSector;
use crate::error::TrimError;
use crate::fat::Fat;

/// Clusters 0 and 1 are reserved; data clusters start here.
pub const FIRST_DATA_CLUSTER: usize = 2;

/// Highest entry value that is a pointer to the next cluster of a chain.
const MAX_CHAIN_POINTER: u32 = 0x0FFF_FFEF;

/// Lowest end-of-chain marker value. Everything from here up is in use.
const MIN_END_OF_CHAIN: u32 = 0x0FFF_FFF8;

/// Result of a scan: where the image can be cut and what that saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPlan {
    /// Current size of the image in bytes.
    pub image_size: u64,
    /// Bytes per sector, as declared by the boot sector.
    pub sector_size: u16,
    /// Highest cluster index found allocated in any FAT copy. At least 2
    /// even on an empty volume, so the data region start is always kept.
    pub last_cluster: usize,
    /// First sector that is no longer needed.
    pub first_free_sector: u64,
    /// Image size after truncation, in bytes.
    pub new_size: u64,
}

impl TrimPlan {
    /// Bytes the truncation frees. Zero if the image is already no larger
    /// than the computed size.
    pub fn saved(&self) -> u64 {
        self.image_size.saturating_sub(self.new_size)
    }
}

/// Whether the entry marks its cluster as allocated: a chain pointer or an
/// end-of-chain marker, but not free (0), reserved (1), the reserved band
/// 0x0FFFFFF0..=0x0FFFFFF6 or the bad-cluster marker 0x0FFFFFF7.
fn in_use(value: u32) -> bool {
    value >= 2 && (value <= MAX_CHAIN_POINTER || value >= MIN_END_OF_CHAIN)
}

/// Scans the image and computes the truncation point. Read-only; the caller
/// decides whether to apply the plan.
pub fn plan<T: Read + Seek>(image: &mut T) -> Result<TrimPlan, TrimError> {
    // Size of the container (partition/image). Note: stat-based approaches
    // don't work for device nodes.
    let image_size = image.seek(SeekFrom::End(0))?;

    let boot = BootSector::read(image)?;
    let sector_size = boot.sector_size()?;
    if image_size % sector_size as u64 != 0 {
        return Err(TrimError::UnalignedImageSize {
            image_size,
            sector_size: sector_size as u64,
        });
    }

    let num_fats = boot.num_fats();
    let mut last = FIRST_DATA_CLUSTER;
    for index in 0..num_fats {
        // one copy in memory at a time; disagreeing copies resolve to the max
        let fat = Fat::read(image, &boot, index)?;
        for cluster in FIRST_DATA_CLUSTER..fat.len() {
            if in_use(fat.entry(cluster)) && cluster > last {
                last = cluster;
            }
        }
    }

    let first_free_sector = boot.reserved_sectors() as u64
        + boot.sectors_per_fat() as u64 * num_fats as u64
        + (last as u64 + 1) * boot.sectors_per_cluster()? as u64;

    Ok(TrimPlan {
        image_size,
        sector_size,
        last_cluster: last,
        first_free_sector,
        new_size: first_free_sector * sector_size as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot_sector::synthetic_boot_sector;
    use crate::fields::set32;
    use std::io::Cursor;

    /// A 200-sector image with a small fixed geometry: 512-byte sectors, one
    /// sector per cluster, 32 reserved sectors, two 16-sector FAT copies.
    fn small_image() -> Vec<u8> {
        let mut image = vec![0u8; 200 * 512];
        let boot = synthetic_boot_sector(512, 1, 32, 2, 16);
        image[..512].copy_from_slice(&boot);
        image
    }

    fn set_fat_entry(image: &mut [u8], copy: usize, cluster: usize, value: u64) {
        let offset = (32 + copy * 16) * 512 + cluster * 4;
        set32(image, offset, value).unwrap();
    }

    #[test]
    fn trims_after_highest_allocated_cluster() {
        let mut image = small_image();
        for copy in 0..2 {
            set_fat_entry(&mut image, copy, 2, 3);
            set_fat_entry(&mut image, copy, 3, 0x0FFF_FFF8);
            set_fat_entry(&mut image, copy, 100, 0x0FFF_FFFF);
        }

        let plan = plan(&mut Cursor::new(image)).unwrap();
        assert_eq!(plan.last_cluster, 100);
        assert_eq!(plan.first_free_sector, 32 + 16 * 2 + 101);
        assert_eq!(plan.new_size, 165 * 512);
        assert_eq!(plan.saved(), 200 * 512 - 165 * 512);
    }

    #[test]
    fn empty_volume_keeps_minimum() {
        let plan = plan(&mut Cursor::new(small_image())).unwrap();
        assert_eq!(plan.last_cluster, 2);
        assert_eq!(plan.first_free_sector, 32 + 16 * 2 + 3);
    }

    #[test]
    fn reserved_and_bad_entries_do_not_count() {
        let mut image = small_image();
        set_fat_entry(&mut image, 0, 50, 3); // in use
        set_fat_entry(&mut image, 0, 60, 1); // reserved
        set_fat_entry(&mut image, 0, 70, 0x0FFF_FFF0); // reserved band
        set_fat_entry(&mut image, 0, 80, 0x0FFF_FFF7); // bad cluster

        let plan = plan(&mut Cursor::new(image)).unwrap();
        assert_eq!(plan.last_cluster, 50);
    }

    #[test]
    fn end_of_chain_band_counts() {
        let mut image = small_image();
        set_fat_entry(&mut image, 0, 90, 0x0FFF_FFF8);

        let plan = plan(&mut Cursor::new(image)).unwrap();
        assert_eq!(plan.last_cluster, 90);
    }

    #[test]
    fn disagreeing_copies_resolve_to_the_maximum() {
        let mut image = small_image();
        set_fat_entry(&mut image, 0, 40, 0x0FFF_FFFF);
        set_fat_entry(&mut image, 1, 120, 0x0FFF_FFFF);

        let plan = plan(&mut Cursor::new(image)).unwrap();
        assert_eq!(plan.last_cluster, 120);
    }

    #[test]
    fn masked_top_bits_do_not_rescue_free_entries() {
        // raw 0xF0000000 masks to 0 (free) and must not count
        let mut image = small_image();
        set_fat_entry(&mut image, 0, 99, 0xF000_0000);

        let plan = plan(&mut Cursor::new(image)).unwrap();
        assert_eq!(plan.last_cluster, 2);
    }

    #[test]
    fn trimming_is_a_fixed_point() {
        let mut image = small_image();
        for copy in 0..2 {
            set_fat_entry(&mut image, copy, 100, 0x0FFF_FFFF);
        }

        let first = plan(&mut Cursor::new(image.clone())).unwrap();
        image.truncate(first.new_size as usize);

        let second = plan(&mut Cursor::new(image)).unwrap();
        assert_eq!(second.new_size, first.new_size);
        assert_eq!(second.first_free_sector, first.first_free_sector);
        assert_eq!(second.saved(), 0);
    }

    #[test]
    fn missing_filesystem_type_aborts_before_any_fat_read() {
        let mut image = small_image();
        image[0x052] = b'X';
        assert!(matches!(
            plan(&mut Cursor::new(image)),
            Err(TrimError::MissingFilesystemType)
        ));
    }

    #[test]
    fn unaligned_image_size_aborts_before_any_fat_read() {
        let mut image = small_image();
        image.truncate(200 * 512 - 100);
        // the FATs themselves are intact, so the failure can only come from
        // the size check
        let err = plan(&mut Cursor::new(image)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Partition/image size (102300) is not a multiple of sector size (512)"
        );
    }

    #[test]
    fn truncated_fat_aborts() {
        let mut image = small_image();
        image.truncate(40 * 512); // ends inside the first FAT copy
        let err = plan(&mut Cursor::new(image)).unwrap_err();
        assert_eq!(err.to_string(), "Data ends within FAT0");
    }
}

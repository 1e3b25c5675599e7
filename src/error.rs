use std::io;

/// Violations of the fixed-width binary field contracts.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("Value does not fit in {bits} bits: {value}")]
    OutOfRange { bits: u32, value: u64 },
    #[error("{name} ({value}) is not a power of two")]
    NotPowerOfTwo { name: &'static str, value: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum TrimError {
    #[error("Too little data to even contain a boot sector")]
    ShortBootSector,
    #[error("Missing boot sector signature")]
    MissingBootSignature,
    #[error("Missing FAT32 file system type string")]
    MissingFilesystemType,
    #[error(
        "Partition/image size ({image_size}) is not a multiple of sector size ({sector_size})"
    )]
    UnalignedImageSize { image_size: u64, sector_size: u64 },
    #[error("Data ends within FAT{0}")]
    DataEndsWithinFat(u8),
    #[error("{0}")]
    Field(#[from] FieldError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

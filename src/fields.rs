//! Little-endian field accessors over raw on-disk byte buffers.
//!
//! Readers panic on out-of-bounds offsets (caller bug, not recoverable);
//! writers range-check the value before storing it.

use crate::error::FieldError;

pub fn get8(data: &[u8], offset: usize) -> u8 {
    data[offset]
}

pub fn get16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(data[offset..offset + 2].try_into().unwrap())
}

pub fn get32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

pub fn set8(data: &mut [u8], offset: usize, value: u64) -> Result<(), FieldError> {
    let value = u8::try_from(value).map_err(|_| FieldError::OutOfRange { bits: 8, value })?;
    data[offset] = value;
    Ok(())
}

pub fn set16(data: &mut [u8], offset: usize, value: u64) -> Result<(), FieldError> {
    let value = u16::try_from(value).map_err(|_| FieldError::OutOfRange { bits: 16, value })?;
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

pub fn set32(data: &mut [u8], offset: usize, value: u64) -> Result<(), FieldError> {
    let value = u32::try_from(value).map_err(|_| FieldError::OutOfRange { bits: 32, value })?;
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Returns `n` unchanged if it is a power of two, otherwise fails naming the
/// offending field.
pub fn check_power_of_two(n: u64, name: &'static str) -> Result<u64, FieldError> {
    if !n.is_power_of_two() {
        return Err(FieldError::NotPowerOfTwo { name, value: n });
    }
    Ok(n)
}

#[test]
fn little_endian_reads() {
    let data = [0x12u8, 0x34, 0x56, 0x78, 0x9A];
    assert_eq!(get8(&data, 1), 0x34);
    assert_eq!(get16(&data, 1), 0x5634);
    assert_eq!(get32(&data, 0), 0x78563412);
    assert_eq!(get32(&data, 1), 0x9A785634);
}

#[test]
fn set16_rejects_out_of_range() {
    let mut data = [0u8; 4];
    assert!(matches!(
        set16(&mut data, 0, 0x10000),
        Err(FieldError::OutOfRange { bits: 16, value: 0x10000 })
    ));
    // nothing written on failure
    assert_eq!(data, [0u8; 4]);
}

#[test]
fn set16_round_trips() {
    let mut data = [0u8; 4];
    set16(&mut data, 1, 0xFFFF).unwrap();
    assert_eq!(get16(&data, 1), 0xFFFF);
    assert_eq!(data, [0x00, 0xFF, 0xFF, 0x00]);
}

#[test]
fn set8_and_set32_check_width() {
    let mut data = [0u8; 8];
    assert!(set8(&mut data, 0, 0x100).is_err());
    assert!(set8(&mut data, 0, 0xFF).is_ok());
    assert!(set32(&mut data, 4, 0x1_0000_0000).is_err());
    set32(&mut data, 4, 0xDEADBEEF).unwrap();
    assert_eq!(get32(&data, 4), 0xDEADBEEF);
}

#[test]
fn power_of_two_check() {
    assert!(check_power_of_two(0, "sector size").is_err());
    assert!(check_power_of_two(3, "sector size").is_err());
    assert!(check_power_of_two(513, "sector size").is_err());
    assert_eq!(check_power_of_two(512, "sector size").unwrap(), 512);
    assert_eq!(check_power_of_two(4096, "sector size").unwrap(), 4096);
}

#[test]
fn power_of_two_error_names_field() {
    let err = check_power_of_two(513, "Sector size").unwrap_err();
    assert_eq!(err.to_string(), "Sector size (513) is not a power of two");
}

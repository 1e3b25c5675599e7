//! Human-readable byte sizes using binary (1024) units.

const SUFFIXES: [&str; 4] = ["bytes", "KiB", "MiB", "GiB"];

/// Formats a size in bytes with a precision that scales with magnitude:
/// no decimals at three digits, one at two, two below that.
pub fn format_size(size: u64) -> String {
    let mut value = size as f64;
    let mut tier = 0;
    while tier + 1 < SUFFIXES.len() && value >= 1024.0 {
        value /= 1024.0;
        tier += 1;
    }
    let suffix = SUFFIXES[tier];
    if value >= 100.0 {
        format!("{value:.0} {suffix}")
    } else if value >= 10.0 {
        format!("{value:.1} {suffix}")
    } else {
        format!("{value:.2} {suffix}")
    }
}

/// Like [`format_size`], for sizes known to be powers of two: renders the
/// exact value with no decimals.
pub fn format_pow2_size(size: u64) -> String {
    let mut value = size;
    let mut tier = 0;
    while tier + 1 < SUFFIXES.len() && value >= 1024 {
        assert_eq!(value % 1024, 0, "not a power of two: {size}");
        value /= 1024;
        tier += 1;
    }
    format!("{} {}", value, SUFFIXES[tier])
}

#[test]
fn formats_with_scaled_precision() {
    assert_eq!(format_size(0), "0.00 bytes");
    assert_eq!(format_size(500), "500 bytes");
    assert_eq!(format_size(2048), "2.00 KiB");
    assert_eq!(format_size(1536000), "1.46 MiB");
    assert_eq!(format_size(15 * crate::MB as u64), "15.0 MiB");
    assert_eq!(format_size(3 * crate::GB as u64), "3.00 GiB");
}

#[test]
fn formats_powers_of_two_exactly() {
    assert_eq!(format_pow2_size(512), "512 bytes");
    assert_eq!(format_pow2_size(crate::KB as u64), "1 KiB");
    assert_eq!(format_pow2_size(4 * crate::KB as u64), "4 KiB");
    assert_eq!(format_pow2_size(crate::GB as u64), "1 GiB");
}

#[test]
#[should_panic(expected = "not a power of two")]
fn pow2_variant_rejects_inexact_sizes() {
    format_pow2_size(1536);
}

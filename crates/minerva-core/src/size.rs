//! File-size parsing.

use crate::error::AppError;

/// Bytes per megabyte (decimal).
pub const BYTES_PER_MB: f64 = 1_000_000.0;

/// Converts a `"<number> MB"` size to a byte count.
///
/// `MB` is the only unit curators use; any other suffix is an input error.
///
/// # Examples
///
/// ```
/// use minerva_core::size::parse_file_size;
///
/// assert_eq!(parse_file_size("2.5 MB").unwrap(), 2_500_000);
/// assert!(parse_file_size("2.5 GB").is_err());
/// ```
pub fn parse_file_size(raw: &str) -> Result<u64, AppError> {
    let invalid = || AppError::InvalidFileSize(raw.to_string());

    let number = raw.strip_suffix(" MB").ok_or_else(invalid)?;
    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    let bytes = (value * BYTES_PER_MB).round();
    // `as` saturates, so out-of-range sizes must be rejected explicitly
    if bytes >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(bytes as u64)
}

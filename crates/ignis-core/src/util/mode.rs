//! Decimal file mode detection
//!
//! YAML reads `mode: 644` as the decimal number 644, which is almost never
//! what the author meant. A mode is flagged when its decimal digits, read as
//! octal, would have been a sensible permission set.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::error::ConfigError;

/// Modes people commonly give regular files
const FILE_MODES: &[i64] = &[
    0o400, 0o440, 0o444, 0o500, 0o550, 0o555, 0o600, 0o640, 0o644, 0o660, 0o664, 0o666,
    0o700, 0o750, 0o755, 0o770, 0o775, 0o777, 0o1777, 0o2750, 0o2755, 0o2775, 0o4750,
    0o4755, 0o6755,
];

/// Modes people commonly give directories
const DIRECTORY_MODES: &[i64] = &[
    0o500, 0o550, 0o555, 0o700, 0o750, 0o755, 0o770, 0o775, 0o777, 0o1755, 0o1777,
    0o2750, 0o2755, 0o2770, 0o2775, 0o3777,
];

/// Warn when `mode` looks like an octal mode written without its leading zero
///
/// Values 0 through 7 read the same in both bases and never warn.
pub fn check_for_decimal_mode(mode: i64, is_dir: bool) -> Result<(), ConfigError> {
    if mode < 8 {
        return Ok(());
    }
    match decimal_as_octal(mode) {
        Some(octal) if is_reasonable_mode(octal, is_dir) => Err(ConfigError::DecimalMode),
        _ => Ok(()),
    }
}

/// Reinterpret the decimal digits of `mode` as octal; `None` if a digit is 8 or 9
fn decimal_as_octal(mode: i64) -> Option<i64> {
    let digits = mode.to_string();
    if digits.bytes().any(|b| b == b'8' || b == b'9') {
        return None;
    }
    i64::from_str_radix(&digits, 8).ok()
}

/// Whether `mode` is one of the permission sets listed for its node type
pub fn is_reasonable_mode(mode: i64, is_dir: bool) -> bool {
    let table = if is_dir { DIRECTORY_MODES } else { FILE_MODES };
    table.contains(&mode)
}

//! Numeric field decoding for fixed-width data records
//!
//! Lower levels are plain whitespace-padded integers. Values use a packed
//! mantissa/exponent layout in which the `E` separator is only sometimes
//! present, e.g. `1.234E+00` and `1.234-100` are both valid tokens.

use crate::constants::EXPONENT_WIDTH;
use crate::error::{Result, Sh95Error};

/// Decode a whitespace-padded integer field such as `" 12"`
pub fn decode_int(token: &str) -> Result<u32> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(Sh95Error::format(token, "empty integer field"));
    }

    trimmed
        .parse::<u32>()
        .map_err(|e| Sh95Error::format(token, format!("invalid integer ({})", e)))
}

/// Decode a packed float field
///
/// The last four characters hold the exponent, with one leading `E`
/// dropped when present; everything before them is the mantissa. The sign
/// of the exponent is taken exactly as written.
pub fn decode_float(token: &str) -> Result<f64> {
    let trimmed = token.trim();

    if !trimmed.is_ascii() {
        return Err(Sh95Error::format(token, "non-ASCII characters in float field"));
    }
    if trimmed.len() <= EXPONENT_WIDTH {
        return Err(Sh95Error::format(
            token,
            format!("float field shorter than {} characters", EXPONENT_WIDTH + 1),
        ));
    }

    let (mantissa, exponent) = trimmed.split_at(trimmed.len() - EXPONENT_WIDTH);
    let exponent = exponent
        .strip_prefix('E')
        .or_else(|| exponent.strip_prefix('e'))
        .unwrap_or(exponent);

    let literal = format!("{}E{}", mantissa, exponent);
    let value = literal.parse::<f64>().map_err(|e| {
        Sh95Error::format(token, format!("'{}' is not a float literal ({})", literal, e))
    })?;

    if !value.is_finite() {
        return Err(Sh95Error::format(token, format!("'{}' is not finite", literal)));
    }

    Ok(value)
}

/// Encode a value the way the data files write it, e.g. `1.234E+00`
///
/// Mirrors the dataset's formatting so fixtures and benchmarks can produce
/// realistic tokens.
pub fn encode_float(value: f64) -> String {
    let formatted = format!("{:.3E}", value);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            if digits.len() >= 3 {
                format!("{}{}{}", mantissa, sign, digits)
            } else {
                format!("{}E{}{:0>2}", mantissa, sign, digits)
            }
        }
        None => formatted,
    }
}

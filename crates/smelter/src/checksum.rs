//! EAN-13 check digits and barcode normalization.
//!
//! Barcodes arrive from spreadsheets in every shape: as text with separators,
//! as integers, or as floats that picked up a scientific-notation rendering
//! somewhere upstream. [`normalize_barcode`] folds all of them into a 13-digit
//! code, or an empty string when the input cannot be one.
//!
//! A 13-digit input is returned as-is. Its trailing digit is *not*
//! re-verified; only 12-digit inputs get a computed check digit.

use std::borrow::Cow;

/// Length of a code that still needs its check digit.
pub const PAYLOAD_LEN: usize = 12;

/// Length of a complete EAN-13 code.
pub const EAN13_LEN: usize = 13;

/// A raw barcode value as it may appear in a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarcodeInput<'a> {
    Text(&'a str),
    Integer(i64),
    /// Floats are truncated to their integer part first.
    Real(f64),
}

impl<'a> From<&'a str> for BarcodeInput<'a> {
    fn from(value: &'a str) -> Self {
        BarcodeInput::Text(value)
    }
}

impl<'a> From<&'a String> for BarcodeInput<'a> {
    fn from(value: &'a String) -> Self {
        BarcodeInput::Text(value.as_str())
    }
}

impl From<i64> for BarcodeInput<'_> {
    fn from(value: i64) -> Self {
        BarcodeInput::Integer(value)
    }
}

impl From<f64> for BarcodeInput<'_> {
    fn from(value: f64) -> Self {
        BarcodeInput::Real(value)
    }
}

impl BarcodeInput<'_> {
    fn as_text(&self) -> Cow<'_, str> {
        match self {
            BarcodeInput::Text(s) => Cow::Borrowed(s.trim()),
            BarcodeInput::Integer(i) => Cow::Owned(i.to_string()),
            // f64 Display never uses exponent notation, so 7.89E12 renders
            // as "7890000000000".
            BarcodeInput::Real(f) if f.is_finite() => Cow::Owned(f.trunc().to_string()),
            BarcodeInput::Real(_) => Cow::Borrowed(""),
        }
    }
}

/// Compute the EAN-13 check digit for a 12-digit payload.
///
/// Positions are weighted 1, 3, 1, 3, ... from the left (0-indexed, even
/// positions weigh 1). Returns `None` if `payload` is not exactly twelve
/// ASCII digits.
///
/// ```
/// use smelter::checksum::compute_check_digit;
///
/// assert_eq!(compute_check_digit("123456789012"), Some(8));
/// ```
pub fn compute_check_digit(payload: &str) -> Option<u8> {
    if payload.len() != PAYLOAD_LEN || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = payload
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 0 { digit } else { digit * 3 }
        })
        .sum();

    Some(((10 - (sum % 10)) % 10) as u8)
}

/// Normalize a raw barcode into a 13-digit EAN code.
///
/// All non-digit characters are stripped. The result is empty unless 12 or
/// 13 digits remain; twelve digits get their check digit appended, thirteen
/// are trusted as complete.
pub fn normalize_barcode<'a>(raw: impl Into<BarcodeInput<'a>>) -> String {
    let input = raw.into();
    let digits: String = input.as_text().chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        EAN13_LEN => digits,
        PAYLOAD_LEN => match compute_check_digit(&digits) {
            Some(check) => format!("{digits}{check}"),
            None => String::new(),
        },
        _ => String::new(),
    }
}

/// Text-to-text form of [`normalize_barcode`], suitable for registering as
/// a store scalar function.
pub fn normalize_barcode_text(raw: &str) -> String {
    normalize_barcode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_digit_worked_example() {
        // 1+6+3+12+5+18+7+24+9+0+1+6 = 92 -> (10 - 2) % 10 = 8
        assert_eq!(compute_check_digit("123456789012"), Some(8));
    }

    #[test]
    fn test_check_digit_zero_sum() {
        assert_eq!(compute_check_digit("000000000000"), Some(0));
    }

    #[test]
    fn test_check_digit_known_ean() {
        // 4006381333931 is a published EAN-13.
        assert_eq!(compute_check_digit("400638133393"), Some(1));
    }

    #[test]
    fn test_check_digit_rejects_bad_payload() {
        assert_eq!(compute_check_digit("12345678901"), None);
        assert_eq!(compute_check_digit("1234567890123"), None);
        assert_eq!(compute_check_digit("12345678901a"), None);
    }

    #[test]
    fn test_normalize_twelve_digits() {
        assert_eq!(normalize_barcode("123456789012"), "1234567890128");
    }

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize_barcode(" 1234-5678 9012 "), "1234567890128");
    }

    #[test]
    fn test_normalize_trusts_thirteen_digits() {
        // Wrong check digit, returned unchanged.
        assert_eq!(normalize_barcode("1234567890120"), "1234567890120");
    }

    #[test]
    fn test_normalize_rejects_other_lengths() {
        assert_eq!(normalize_barcode("12345678"), "");
        assert_eq!(normalize_barcode("12345678901234"), "");
        assert_eq!(normalize_barcode("abc"), "");
        assert_eq!(normalize_barcode(""), "");
    }

    #[test]
    fn test_normalize_integer_input() {
        assert_eq!(normalize_barcode(123456789012_i64), "1234567890128");
    }

    #[test]
    fn test_normalize_float_input() {
        assert_eq!(normalize_barcode(7.89e12_f64), "7890000000000");
        assert_eq!(normalize_barcode(123456789012.0_f64), "1234567890128");
        assert_eq!(normalize_barcode(f64::NAN), "");
    }

    #[test]
    fn test_normalize_is_idempotent_on_output() {
        let once = normalize_barcode("123456789012");
        assert_eq!(normalize_barcode(once.as_str()), once);
    }
}

//! Mobile number rules

use std::sync::LazyLock;

use regex::Regex;

/// `1`, then `3`-`9`, then nine more ASCII digits
static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[3-9][0-9]{9}$").expect("valid mobile regex"));

/// First three and last four digits of an 11-digit run
static MASK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{3})[0-9]{4}([0-9]{4})").expect("valid mask regex"));

/// Character replacing the hidden middle digits
pub const MASK_CHAR: char = '*';

/// Check an already-trimmed phone number
pub fn is_valid_phone(phone: &str) -> bool {
    MOBILE_PATTERN.is_match(phone)
}

/// Hide the four middle digits: `13812345678` -> `138****5678`
///
/// Only the first 11-digit run is masked; text that is already masked (or
/// holds no such run) comes back unchanged.
pub fn mask_phone(phone: &str) -> String {
    let mask = MASK_CHAR.to_string().repeat(4);
    MASK_PATTERN
        .replace(phone, format!("${{1}}{mask}${{2}}").as_str())
        .into_owned()
}

/// Drop everything that is not an ASCII digit (input-field filter)
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phones() {
        assert!(is_valid_phone("13812345678"));
        assert!(is_valid_phone("19900000000"));
        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone("12812345678"));
        assert!(!is_valid_phone("138123456789"));
        assert!(!is_valid_phone("1381234567a"));
        assert!(!is_valid_phone(" 13812345678"));
    }

    #[test]
    fn test_rejects_non_ascii_digits() {
        // Arabic-Indic and full-width digits
        assert!(!is_valid_phone("138١٢٣٤٥٦٧٨"));
        assert!(!is_valid_phone("１３８１２３４５６７８"));
        assert_eq!(mask_phone("138١٢٣٤٥٦٧٨"), "138١٢٣٤٥٦٧٨");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask_phone("13812345678"), "138****5678");
        assert!(!mask_phone("13812345678").contains("1234"));
    }

    #[test]
    fn test_mask_is_idempotent() {
        let once = mask_phone("13812345678");
        assert_eq!(mask_phone(&once), once);
        assert_eq!(mask_phone("n/a"), "n/a");
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("138-1234 5678"), "13812345678");
    }
}

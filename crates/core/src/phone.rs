//! Phone number validation
//!
//! Free text is reduced to its digits and `+` signs, then checked against
//! an international-ish shape: optional leading `+` followed by 7 to 20
//! digits.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d{7,20}$").unwrap());

fn strip(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// True when the cleaned form of `text` is a plausible phone number
pub fn is_valid_phone(text: &str) -> bool {
    PHONE_RE.is_match(&strip(text))
}

/// Cleaned form of `text` if it is a valid phone number
pub fn normalize_phone(text: &str) -> Option<String> {
    let cleaned = strip(text);
    PHONE_RE.is_match(&cleaned).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbers() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("79991234567"));
        assert!(is_valid_phone("+7 999 000-11-22"));
        assert!(is_valid_phone("1234567"));
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(!is_valid_phone("abc"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("123456"));
        assert!(!is_valid_phone("123456789012345678901"));
        assert!(!is_valid_phone("++79991234567"));
        assert!(!is_valid_phone("7999+1234567"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize_phone("+7 (999) 000-11-22"),
            Some("+79990001122".to_string())
        );
        assert_eq!(normalize_phone("call me"), None);
    }
}

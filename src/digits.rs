//! Digit normalization
//!
//! Everything downstream works on the ASCII digits of the input only.

/// Remove every character that is not an ASCII digit, preserving order.
pub fn strip_non_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Alias used by display code to undo punctuation.
pub fn remove_formatting(value: &str) -> String {
    strip_non_digits(value)
}

/// True when the (already normalized) string is one digit repeated.
pub(crate) fn is_repeated_digit(digits: &str) -> bool {
    let mut bytes = digits.bytes();
    match bytes.next() {
        Some(first) => bytes.all(|b| b == first),
        None => false,
    }
}

/// Numeric values of a normalized digit string.
pub(crate) fn values(digits: &str) -> Vec<u8> {
    digits.bytes().map(|b| b - b'0').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_keeps_only_digits_in_order() {
        assert_eq!(strip_non_digits("529.982.247-25"), "52998224725");
        assert_eq!(strip_non_digits("a1b2 c3/"), "123");
    }

    #[test]
    fn test_strip_empty_and_non_numeric() {
        assert_eq!(strip_non_digits(""), "");
        assert_eq!(strip_non_digits("   "), "");
        assert_eq!(strip_non_digits("abc-./"), "");
    }

    #[test]
    fn test_strip_ignores_non_ascii_digits() {
        // Arabic-Indic and fullwidth digits are not ASCII.
        assert_eq!(strip_non_digits("١٢٣１２３9"), "9");
    }

    #[test]
    fn test_repeated_digit() {
        assert!(is_repeated_digit("11111111111"));
        assert!(!is_repeated_digit("11111111112"));
        assert!(!is_repeated_digit(""));
    }

    #[test]
    fn test_values() {
        assert_eq!(values("0907"), vec![0, 9, 0, 7]);
    }
}

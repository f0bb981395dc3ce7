//! Contact fields - Brazilian phone numbers, postal codes (CEP) and email
//!
//! Phone and CEP are length-only checks: punctuation is ignored, area codes
//! are not verified. Email is a shape check, not deliverability.

use regex::Regex;
use std::sync::OnceLock;

use crate::digits::strip_non_digits;

/// Something, an `@`, something, a dot, something; no whitespace or extra `@`.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Landline (10 digits with area code) or mobile (11 digits).
pub fn is_valid_phone(input: &str) -> bool {
    matches!(strip_non_digits(input).len(), 10 | 11)
}

/// CEP: exactly 8 digits, `01310-100` or `01310100`.
pub fn is_valid_cep(input: &str) -> bool {
    strip_non_digits(input).len() == 8
}

pub fn is_valid_email(input: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(input))
}

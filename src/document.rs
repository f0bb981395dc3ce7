//! Document System - CPF/CNPJ checksums and canonical formatting
//!
//! The boolean and string functions are total: any input yields a result.
//! `Document::parse` is the structured entry point when the caller needs
//! to know *why* a number was rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::digits::{is_repeated_digit, strip_non_digits, values};

pub const CPF_LEN: usize = 11;
pub const CNPJ_LEN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Cadastro de Pessoas Físicas (individuals)
    Cpf,
    /// Cadastro Nacional da Pessoa Jurídica (legal entities)
    Cnpj,
}

impl DocumentKind {
    pub fn expected_len(self) -> usize {
        match self {
            Self::Cpf => CPF_LEN,
            Self::Cnpj => CNPJ_LEN,
        }
    }

    /// Infer the kind from a normalized digit count.
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            CPF_LEN => Some(Self::Cpf),
            CNPJ_LEN => Some(Self::Cnpj),
            _ => None,
        }
    }

    fn check_digit(self, prefix: &[u8]) -> u8 {
        match self {
            Self::Cpf => cpf_check_digit(prefix),
            Self::Cnpj => cnpj_check_digit(prefix),
        }
    }

    fn punctuate(self, d: &str) -> String {
        match self {
            Self::Cpf => format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11]),
            Self::Cnpj => format!(
                "{}.{}.{}/{}-{}",
                &d[0..2], &d[2..5], &d[5..8], &d[8..12], &d[12..14]
            ),
        }
    }

    /// Canonical punctuation, or the input untouched when the digit count is wrong.
    pub fn format(self, raw: &str) -> String {
        let digits = strip_non_digits(raw);
        if digits.len() == self.expected_len() {
            self.punctuate(&digits)
        } else {
            raw.to_string()
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpf => f.write_str("CPF"),
            Self::Cnpj => f.write_str("CNPJ"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpf" => Ok(Self::Cpf),
            "cnpj" => Ok(Self::Cnpj),
            other => Err(DocumentError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("{kind} must have {expected} digits, got {actual}")]
    WrongLength {
        kind: DocumentKind,
        expected: usize,
        actual: usize,
    },

    #[error("{actual} digits match neither CPF (11) nor CNPJ (14)")]
    UnknownLength { actual: usize },

    #[error("{kind} made of a single repeated digit")]
    RepeatedDigits { kind: DocumentKind },

    #[error("{kind} check digit {position} mismatch: expected {expected}, got {actual}")]
    CheckDigitMismatch {
        kind: DocumentKind,
        position: usize,
        expected: u8,
        actual: u8,
    },

    #[error("Unknown document kind: {0}")]
    UnknownKind(String),
}

/// A validated document number, stored as its raw digits.
///
/// Deserialization goes through `Document::parse`, so a `Document` always
/// holds a checked, normalized number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DocumentRepr")]
pub struct Document {
    kind: DocumentKind,
    digits: String,
}

#[derive(Deserialize)]
struct DocumentRepr {
    kind: DocumentKind,
    digits: String,
}

impl TryFrom<DocumentRepr> for Document {
    type Error = DocumentError;

    fn try_from(repr: DocumentRepr) -> Result<Self, Self::Error> {
        Self::parse(repr.kind, &repr.digits)
    }
}

impl Document {
    pub fn parse(kind: DocumentKind, input: &str) -> Result<Self, DocumentError> {
        let digits = strip_non_digits(input);
        let expected = kind.expected_len();
        if digits.len() != expected {
            return Err(DocumentError::WrongLength {
                kind,
                expected,
                actual: digits.len(),
            });
        }
        if is_repeated_digit(&digits) {
            return Err(DocumentError::RepeatedDigits { kind });
        }

        let numbers = values(&digits);
        let base = expected - 2;
        for offset in 0..2 {
            let want = kind.check_digit(&numbers[..base + offset]);
            let got = numbers[base + offset];
            if want != got {
                return Err(DocumentError::CheckDigitMismatch {
                    kind,
                    position: offset + 1,
                    expected: want,
                    actual: got,
                });
            }
        }

        Ok(Self { kind, digits })
    }

    /// Parse with the kind inferred from the digit count.
    pub fn detect(input: &str) -> Result<Self, DocumentError> {
        let len = strip_non_digits(input).len();
        let kind = DocumentKind::from_len(len)
            .ok_or(DocumentError::UnknownLength { actual: len })?;
        Self::parse(kind, input)
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind.punctuate(&self.digits))
    }
}

impl FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::detect(s)
    }
}

/// CPF check digit over 9 or 10 leading digits.
///
/// Weights run from `len + 1` down to 2; `(sum * 10) % 11`, with 10 folded to 0.
pub fn cpf_check_digit(prefix: &[u8]) -> u8 {
    let top = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, &d)| d as u32 * (top - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        r => r as u8,
    }
}

/// CNPJ check digit over 12 or 13 leading digits.
///
/// Weights cycle 2..=9 starting from the rightmost digit.
pub fn cnpj_check_digit(prefix: &[u8]) -> u8 {
    let sum: u32 = prefix
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d as u32 * (i as u32 % 8 + 2))
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => (11 - r) as u8,
    }
}

pub fn is_valid_cpf(input: &str) -> bool {
    Document::parse(DocumentKind::Cpf, input).is_ok()
}

pub fn is_valid_cnpj(input: &str) -> bool {
    Document::parse(DocumentKind::Cnpj, input).is_ok()
}

/// `XXX.XXX.XXX-XX`, or the input unchanged if it does not hold 11 digits.
pub fn format_cpf(raw: &str) -> String {
    DocumentKind::Cpf.format(raw)
}

/// `XX.XXX.XXX/XXXX-XX`, or the input unchanged if it does not hold 14 digits.
pub fn format_cnpj(raw: &str) -> String {
    DocumentKind::Cnpj.format(raw)
}

/// Display-layer formatting: empty stays empty, everything else goes
/// through the kind's formatter.
pub fn format_document(value: &str, kind: DocumentKind) -> String {
    if value.is_empty() {
        return String::new();
    }
    kind.format(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CPFS: [&str; 3] = ["52998224725", "11144477735", "12345678909"];
    const VALID_CNPJS: [&str; 2] = ["11444777000161", "11222333000181"];

    #[test]
    fn test_known_valid_cpfs() {
        for cpf in VALID_CPFS {
            assert!(is_valid_cpf(cpf), "{} should be valid", cpf);
        }
        assert!(is_valid_cpf("529.982.247-25"));
    }

    #[test]
    fn test_known_valid_cnpjs() {
        for cnpj in VALID_CNPJS {
            assert!(is_valid_cnpj(cnpj), "{} should be valid", cnpj);
        }
        assert!(is_valid_cnpj("11.444.777/0001-61"));
    }

    #[test]
    fn test_cpf_check_digits() {
        assert_eq!(cpf_check_digit(&[5, 2, 9, 9, 8, 2, 2, 4, 7]), 2);
        assert_eq!(cpf_check_digit(&[5, 2, 9, 9, 8, 2, 2, 4, 7, 2]), 5);
        // remainder 10 folds to 0
        assert_eq!(cpf_check_digit(&[1, 2, 3, 4, 5, 6, 7, 8, 9]), 0);
    }

    #[test]
    fn test_cnpj_check_digits() {
        let base = [1, 1, 4, 4, 4, 7, 7, 7, 0, 0, 0, 1];
        assert_eq!(cnpj_check_digit(&base), 6);
        let mut with_first = base.to_vec();
        with_first.push(6);
        assert_eq!(cnpj_check_digit(&with_first), 1);
    }

    #[test]
    fn test_cpf_wrong_length() {
        assert!(!is_valid_cpf(""));
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf("529982247250"));
        assert!(!is_valid_cpf("11444777000161"));
    }

    #[test]
    fn test_repeated_digits_rejected() {
        for d in 0..=9 {
            let cpf = d.to_string().repeat(11);
            let cnpj = d.to_string().repeat(14);
            assert!(!is_valid_cpf(&cpf), "{}", cpf);
            assert!(!is_valid_cnpj(&cnpj), "{}", cnpj);
        }
    }

    #[test]
    fn test_cpf_corrupted_digit() {
        assert!(!is_valid_cpf("62998224725"));
        assert!(!is_valid_cpf("52998224735"));
        assert!(!is_valid_cpf("52998224726"));
    }

    #[test]
    fn test_parse_reports_reason() {
        assert_eq!(
            Document::parse(DocumentKind::Cpf, "123"),
            Err(DocumentError::WrongLength {
                kind: DocumentKind::Cpf,
                expected: 11,
                actual: 3
            })
        );
        assert_eq!(
            Document::parse(DocumentKind::Cnpj, "00000000000000"),
            Err(DocumentError::RepeatedDigits { kind: DocumentKind::Cnpj })
        );
        assert_eq!(
            Document::parse(DocumentKind::Cnpj, "11444777000162"),
            Err(DocumentError::CheckDigitMismatch {
                kind: DocumentKind::Cnpj,
                position: 2,
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_detect() {
        let doc: Document = "11.444.777/0001-61".parse().unwrap();
        assert_eq!(doc.kind(), DocumentKind::Cnpj);
        assert_eq!(doc.digits(), "11444777000161");
        assert_eq!(doc.to_string(), "11.444.777/0001-61");

        let doc = Document::detect("52998224725").unwrap();
        assert_eq!(doc.kind(), DocumentKind::Cpf);
        assert_eq!(doc.to_string(), "529.982.247-25");

        assert_eq!(
            Document::detect("1234"),
            Err(DocumentError::UnknownLength { actual: 4 })
        );
    }

    #[test]
    fn test_format() {
        assert_eq!(format_cpf("12345678901"), "123.456.789-01");
        assert_eq!(format_cnpj("11444777000161"), "11.444.777/0001-61");
    }

    #[test]
    fn test_format_wrong_length_passthrough() {
        assert_eq!(format_cpf("1234-5"), "1234-5");
        assert_eq!(format_cnpj("52998224725"), "52998224725");
    }

    #[test]
    fn test_format_document() {
        assert_eq!(format_document("", DocumentKind::Cpf), "");
        assert_eq!(format_document("52998224725", DocumentKind::Cpf), "529.982.247-25");
        assert_eq!(format_document("52998224725", DocumentKind::Cnpj), "52998224725");
    }

    #[test]
    fn test_deserialize_rejects_unchecked_digits() {
        let short = serde_json::from_str::<Document>(r#"{"kind":"cpf","digits":"12"}"#);
        assert!(short.is_err());
        let bad_check = serde_json::from_str::<Document>(r#"{"kind":"cnpj","digits":"11444777000162"}"#);
        assert!(bad_check.is_err());
    }

    #[test]
    fn test_deserialize_normalizes() {
        let doc: Document =
            serde_json::from_str(r#"{"kind":"cpf","digits":"529.982.247-25"}"#).unwrap();
        assert_eq!(doc.digits(), "52998224725");
        assert_eq!(doc.to_string(), "529.982.247-25");
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"kind":"cpf","digits":"52998224725"}"#
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("CNPJ".parse::<DocumentKind>().unwrap(), DocumentKind::Cnpj);
        assert!("rg".parse::<DocumentKind>().is_err());
    }
}

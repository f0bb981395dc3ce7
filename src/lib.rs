//! docbr Core - Brazilian Document Validation Engine
//!
//! # Ground Rules
//! 1. Digits Are Truth: punctuation never affects validity
//! 2. Placeholders Are Invalid: one digit repeated is never a document
//! 3. Formatting Never Guesses: wrong-length input passes through untouched
//! 4. Submissions Are Validated: no record without a passing validation

pub mod digits;
pub mod document;
pub mod contact;
pub mod schemas;
pub mod validation;
pub mod pipeline;

pub use digits::{strip_non_digits, remove_formatting};
pub use document::{
    Document, DocumentError, DocumentKind,
    is_valid_cpf, is_valid_cnpj, format_cpf, format_cnpj, format_document,
};
pub use contact::{is_valid_phone, is_valid_cep, is_valid_email};
pub use schemas::{FormSchema, FieldSpec, FieldKind, SchemaRegistry, SchemaError};
pub use validation::{FormInput, ValidationResult, FieldRule, Validator, ValidationViolation, ViolationSeverity};
pub use pipeline::{FormPipeline, NormalizedField, NormalizedSubmission, SubmitRequest, PipelineError};

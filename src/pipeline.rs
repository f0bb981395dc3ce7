//! Form Pipeline - Single Entry Point
//!
//! CRITICAL: submit_form MUST call validate_form internally. No bypass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::digits::strip_non_digits;
use crate::schemas::{FieldKind, FormSchema, SchemaRegistry};
use crate::validation::{FormInput, ValidationResult, Validator};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub schema_id: String,
    pub input: FormInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedField {
    pub name: String,
    pub kind: FieldKind,
    /// Value exactly as submitted
    pub value: String,
    pub digits: String,
    /// Canonical punctuation for documents, trimmed input otherwise
    pub display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSubmission {
    pub id: String,
    pub schema_id: String,
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub validation: ValidationResult,
    pub fields: Vec<NormalizedField>,
}

/// The form pipeline - single entry point for validation and submission
pub struct FormPipeline {
    registry: SchemaRegistry,
    validator: Validator,
}

impl FormPipeline {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            validator: Validator::new(),
        }
    }

    pub fn list_schemas(&self) -> Vec<&FormSchema> {
        self.registry.list()
    }

    pub fn get_schema(&self, id: &str) -> Option<&FormSchema> {
        self.registry.get(id)
    }

    /// Validate form values against a schema
    ///
    /// This is the ONLY validation entry point.
    pub fn validate_form(
        &self,
        schema_id: &str,
        input: &FormInput,
    ) -> Result<ValidationResult, PipelineError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let schema = self.schema(schema_id)?;
        Ok(self.validator.validate(input, schema))
    }

    /// Validate, then normalize a submission.
    ///
    /// CRITICAL: This ALWAYS calls validate_form. Rejected input never
    /// produces a record.
    pub fn submit_form(&self, request: &SubmitRequest) -> Result<NormalizedSubmission, PipelineError> {
        let schema = self.schema(&request.schema_id)?;

        let validation = self.validate_form(&request.schema_id, &request.input)?;
        if !validation.valid {
            let messages: Vec<_> = validation.violations.iter()
                .map(|v| format!("{}.{}: {}", v.field, v.rule, v.message))
                .collect();
            debug!(schema = %schema.id, "submission rejected");
            return Err(PipelineError::ValidationFailed(messages.join("; ")));
        }

        let submission = NormalizedSubmission {
            id: Uuid::new_v4().to_string(),
            schema_id: schema.id.clone(),
            schema_version: schema.schema_version.clone(),
            created_at: Utc::now(),
            fields: normalize_fields(schema, &request.input),
            validation,
        };

        info!(
            schema = %submission.schema_id,
            id = %submission.id,
            fields = submission.fields.len(),
            "submission accepted"
        );
        Ok(submission)
    }

    fn schema(&self, id: &str) -> Result<&FormSchema, PipelineError> {
        self.registry.get(id)
            .ok_or_else(|| PipelineError::SchemaNotFound(id.to_string()))
    }
}

impl Default for FormPipeline {
    fn default() -> Self {
        Self::new(SchemaRegistry::default())
    }
}

/// One entry per declared field that carries a non-blank value, in schema order.
fn normalize_fields(schema: &FormSchema, input: &FormInput) -> Vec<NormalizedField> {
    schema.fields.iter()
        .filter_map(|spec| {
            let value = input.get(&spec.name)?;
            if value.trim().is_empty() {
                return None;
            }
            let display = match spec.kind.document_kind() {
                Some(kind) => kind.format(value),
                None => value.trim().to_string(),
            };
            Some(NormalizedField {
                name: spec.name.clone(),
                kind: spec.kind,
                value: value.to_string(),
                digits: strip_non_digits(value),
                display,
            })
        })
        .collect()
}

//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations per field.
//! Policy (the schema failure mode) maps violations to a verdict.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::contact::{is_valid_cep, is_valid_email, is_valid_phone};
use crate::document::{Document, DocumentKind};
use crate::schemas::{FailureMode, FieldKind, FormSchema};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub field: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
    pub schema_id: String,
    pub schema_version: String,
}

impl ValidationResult {
    pub fn success(schema: &FormSchema, violations: Vec<ValidationViolation>) -> Self {
        Self {
            valid: true,
            violations,
            schema_id: schema.id.clone(),
            schema_version: schema.schema_version.clone(),
        }
    }

    pub fn failure(schema: &FormSchema, violations: Vec<ValidationViolation>) -> Self {
        Self {
            valid: false,
            violations,
            schema_id: schema.id.clone(),
            schema_version: schema.schema_version.clone(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    /// Violations recorded against one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationViolation> {
        self.violations.iter().filter(move |v| v.field == field)
    }
}

/// Submitted form values keyed by field name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormInput {
    #[serde(deserialize_with = "lenient_values")]
    pub values: BTreeMap<String, String>,
}

/// Accept any JSON scalar as a field value: strings as-is, `null` as blank,
/// numbers and booleans by their JSON text (`52998224725` -> `"52998224725"`).
fn lenient_values<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(field, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (field, text)
        })
        .collect())
}

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.values.insert(field.to_string(), value.to_string());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Field rule trait - one rule per field kind.
///
/// Blank values never reach a rule; presence is the `required` policy's job.
pub trait FieldRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> FieldKind;
    fn check(&self, field: &str, value: &str) -> Option<ValidationViolation>;
}

fn rule_error(
    rule: &str,
    field: &str,
    message: String,
    expected: &str,
    value: &str,
    remediation: &str,
) -> ValidationViolation {
    ValidationViolation {
        rule: rule.to_string(),
        field: field.to_string(),
        severity: ViolationSeverity::Error,
        message,
        expected: Some(expected.to_string()),
        actual: Some(value.to_string()),
        remediation: vec![remediation.to_string()],
    }
}

fn document_violation(
    rule: &str,
    kind: DocumentKind,
    field: &str,
    value: &str,
) -> Option<ValidationViolation> {
    let expected = match kind {
        DocumentKind::Cpf => "000.000.000-00",
        DocumentKind::Cnpj => "00.000.000/0000-00",
    };
    Document::parse(kind, value).err().map(|e| {
        rule_error(
            rule,
            field,
            e.to_string(),
            expected,
            value,
            &format!("Check the {} digits as printed on the document", kind),
        )
    })
}

// --- Concrete Rules ---

pub struct CpfRule;

impl FieldRule for CpfRule {
    fn name(&self) -> &'static str { "cpf" }

    fn kind(&self) -> FieldKind { FieldKind::Cpf }

    fn check(&self, field: &str, value: &str) -> Option<ValidationViolation> {
        document_violation(self.name(), DocumentKind::Cpf, field, value)
    }
}

pub struct CnpjRule;

impl FieldRule for CnpjRule {
    fn name(&self) -> &'static str { "cnpj" }

    fn kind(&self) -> FieldKind { FieldKind::Cnpj }

    fn check(&self, field: &str, value: &str) -> Option<ValidationViolation> {
        document_violation(self.name(), DocumentKind::Cnpj, field, value)
    }
}

pub struct PhoneRule;

impl FieldRule for PhoneRule {
    fn name(&self) -> &'static str { "phone" }

    fn kind(&self) -> FieldKind { FieldKind::Phone }

    fn check(&self, field: &str, value: &str) -> Option<ValidationViolation> {
        if is_valid_phone(value) {
            return None;
        }
        Some(rule_error(
            self.name(),
            field,
            "Phone number must have 10 or 11 digits".to_string(),
            "(00) 0000-0000 or (00) 00000-0000",
            value,
            "Include the two-digit area code",
        ))
    }
}

pub struct CepRule;

impl FieldRule for CepRule {
    fn name(&self) -> &'static str { "cep" }

    fn kind(&self) -> FieldKind { FieldKind::Cep }

    fn check(&self, field: &str, value: &str) -> Option<ValidationViolation> {
        if is_valid_cep(value) {
            return None;
        }
        Some(rule_error(
            self.name(),
            field,
            "CEP must have 8 digits".to_string(),
            "00000-000",
            value,
            "Use the full eight-digit postal code",
        ))
    }
}

pub struct EmailRule;

impl FieldRule for EmailRule {
    fn name(&self) -> &'static str { "email" }

    fn kind(&self) -> FieldKind { FieldKind::Email }

    fn check(&self, field: &str, value: &str) -> Option<ValidationViolation> {
        if is_valid_email(value.trim()) {
            return None;
        }
        Some(rule_error(
            self.name(),
            field,
            "Email address is malformed".to_string(),
            "name@domain.tld",
            value,
            "Check for missing @ or domain",
        ))
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn FieldRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(CpfRule),
                Box::new(CnpjRule),
                Box::new(PhoneRule),
                Box::new(CepRule),
                Box::new(EmailRule),
            ],
        }
    }

    /// Run the rules for `kind` against one standalone value.
    pub fn check_value(&self, kind: FieldKind, field: &str, value: &str) -> Option<ValidationViolation> {
        self.rules
            .iter()
            .filter(|rule| rule.kind() == kind)
            .find_map(|rule| rule.check(field, value))
    }

    pub fn validate(&self, input: &FormInput, schema: &FormSchema) -> ValidationResult {
        let mut all_violations = vec![];

        for spec in &schema.fields {
            let value = input.get(&spec.name);
            if is_blank(value) {
                if spec.required {
                    all_violations.push(ValidationViolation {
                        rule: "required".to_string(),
                        field: spec.name.clone(),
                        severity: ViolationSeverity::Error,
                        message: format!("{} is required", spec.label.as_deref().unwrap_or(&spec.name)),
                        expected: Some(spec.kind.as_str().to_string()),
                        actual: None,
                        remediation: vec![format!("Provide a value for {}", spec.name)],
                    });
                }
                continue;
            }
            let value = value.unwrap_or_default();

            all_violations.extend(
                self.rules
                    .iter()
                    .filter(|rule| rule.kind() == spec.kind)
                    .filter_map(|rule| rule.check(&spec.name, value)),
            );
        }

        for field in input.values.keys() {
            if schema.field(field).is_none() {
                all_violations.push(ValidationViolation {
                    rule: "unknown_field".to_string(),
                    field: field.clone(),
                    severity: ViolationSeverity::Warning,
                    message: format!("Field not declared by schema {}", schema.id),
                    expected: None,
                    actual: None,
                    remediation: vec!["Remove the field or add it to the schema".to_string()],
                });
            }
        }

        let has_errors = all_violations.iter()
            .any(|v| v.severity == ViolationSeverity::Error);

        debug!(
            schema = %schema.id,
            violations = all_violations.len(),
            has_errors,
            "form validated"
        );

        match schema.validation.failure_mode {
            FailureMode::Block if has_errors => ValidationResult::failure(schema, all_violations),
            // Warnings alone never block; warn/log only record
            FailureMode::Block | FailureMode::Warn | FailureMode::Log => {
                ValidationResult::success(schema, all_violations)
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{FieldSpec, ValidationConfig};

    fn schema(mode: FailureMode) -> FormSchema {
        FormSchema {
            id: "supplier".to_string(),
            name: "Supplier".to_string(),
            description: String::new(),
            schema_version: "2.1.0".to_string(),
            deprecated: false,
            superseded_by: None,
            fields: vec![
                FieldSpec { name: "cnpj".into(), kind: FieldKind::Cnpj, required: true, label: Some("CNPJ".into()) },
                FieldSpec { name: "owner".into(), kind: FieldKind::Cpf, required: false, label: None },
                FieldSpec { name: "phone".into(), kind: FieldKind::Phone, required: false, label: None },
            ],
            validation: ValidationConfig { failure_mode: mode },
        }
    }

    #[test]
    fn test_rules_ignore_valid_values() {
        assert!(CpfRule.check("f", "529.982.247-25").is_none());
        assert!(CnpjRule.check("f", "11.444.777/0001-61").is_none());
        assert!(PhoneRule.check("f", "(11) 91234-5678").is_none());
        assert!(CepRule.check("f", "01310-100").is_none());
        assert!(EmailRule.check("f", " maria@example.com.br ").is_none());
    }

    #[test]
    fn test_rule_violation_carries_value() {
        let v = CpfRule.check("owner", "111.111.111-11").unwrap();
        assert_eq!(v.rule, "cpf");
        assert_eq!(v.field, "owner");
        assert_eq!(v.actual.as_deref(), Some("111.111.111-11"));
        assert!(v.message.contains("repeated"));
    }

    #[test]
    fn test_email_rule_rejects_malformed() {
        let v = EmailRule.check("contact", "maria@example").unwrap();
        assert_eq!(v.rule, "email");
        assert_eq!(v.severity, ViolationSeverity::Error);
    }

    #[test]
    fn test_check_value_uses_kind_rule() {
        let validator = Validator::new();
        assert!(validator.check_value(FieldKind::Cep, "zip", "01310-100").is_none());
        let v = validator.check_value(FieldKind::Phone, "value", "123").unwrap();
        assert_eq!(v.message, PhoneRule.check("value", "123").unwrap().message);
    }

    #[test]
    fn test_form_input_accepts_scalars() {
        let input: FormInput =
            serde_json::from_str(r#"{"cpf": 52998224725, "zip": null, "optin": true}"#).unwrap();
        assert_eq!(input.get("cpf"), Some("52998224725"));
        assert_eq!(input.get("zip"), Some(""));
        assert_eq!(input.get("optin"), Some("true"));
    }

    #[test]
    fn test_numeric_cpf_payload_validates() {
        let input: FormInput =
            serde_json::from_str(r#"{"cnpj": 11444777000161, "owner": 52998224725}"#).unwrap();
        let result = Validator::new().validate(&input, &schema(FailureMode::Block));
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_missing_required_field_blocks() {
        let result = Validator::new().validate(&FormInput::new(), &schema(FailureMode::Block));
        assert!(!result.valid);
        let v: Vec<_> = result.for_field("cnpj").collect();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].rule, "required");
        assert_eq!(v[0].message, "CNPJ is required");
    }

    #[test]
    fn test_blank_optional_field_skipped() {
        let input = FormInput::new()
            .with("cnpj", "11444777000161")
            .with("owner", "   ");
        let result = Validator::new().validate(&input, &schema(FailureMode::Block));
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_unknown_field_warns_without_blocking() {
        let input = FormInput::new()
            .with("cnpj", "11444777000161")
            .with("nickname", "acme");
        let result = Validator::new().validate(&input, &schema(FailureMode::Block));
        assert!(result.valid);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn test_warn_mode_never_blocks() {
        let input = FormInput::new()
            .with("cnpj", "11444777000162")
            .with("phone", "123");
        let result = Validator::new().validate(&input, &schema(FailureMode::Warn));
        assert!(result.valid);
        assert!(result.has_errors());
        assert_eq!(result.violations.len(), 2);
    }

    #[test]
    fn test_result_carries_schema_info() {
        let result = Validator::new().validate(&FormInput::new(), &schema(FailureMode::Log));
        assert_eq!(result.schema_id, "supplier");
        assert_eq!(result.schema_version, "2.1.0");
    }
}

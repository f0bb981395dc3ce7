//! Schema System - Form field contracts loaded from JSON

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::DocumentKind;

pub type SchemaId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: SchemaId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub schema_version: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Cpf,
    Cnpj,
    Phone,
    Cep,
    Email,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpf => "cpf",
            Self::Cnpj => "cnpj",
            Self::Phone => "phone",
            Self::Cep => "cep",
            Self::Email => "email",
        }
    }

    /// The document kind behind this field, if it holds a CPF/CNPJ.
    pub fn document_kind(self) -> Option<DocumentKind> {
        match self {
            Self::Cpf => Some(DocumentKind::Cpf),
            Self::Cnpj => Some(DocumentKind::Cnpj),
            Self::Phone | Self::Cep | Self::Email => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    #[serde(default)]
    pub failure_mode: FailureMode,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    #[default]
    Block,
    Warn,
    Log,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read schema directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Schema registry - loads and caches form schemas
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<SchemaId, FormSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir`, in path order. Files that fail to
    /// read or parse are skipped; a missing directory gives an empty registry.
    /// On a duplicate id the file sorting last wins.
    pub fn load_from_dir(dir: &Path) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        if !dir.exists() {
            debug!(dir = %dir.display(), "schema directory missing, registry empty");
            return Ok(registry);
        }

        let mut paths = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.retain(|p| p.extension().map_or(false, |e| e == "json"));
        paths.sort();

        for path in paths {
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<FormSchema>(&content).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(schema) => {
                    debug!(schema = %schema.id, path = %path.display(), "loaded schema");
                    registry.register(schema);
                }
                Err(error) => warn!(path = %path.display(), %error, "skipping schema file"),
            }
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&FormSchema> {
        self.schemas.get(id)
    }

    /// All schemas, ordered by id.
    pub fn list(&self) -> Vec<&FormSchema> {
        let mut all: Vec<_> = self.schemas.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Insert a schema, returning the one it replaced.
    pub fn register(&mut self, schema: FormSchema) -> Option<FormSchema> {
        let replaced = self.schemas.insert(schema.id.clone(), schema);
        if let Some(old) = &replaced {
            warn!(schema = %old.id, version = %old.schema_version, "duplicate schema id, replacing");
        }
        replaced
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

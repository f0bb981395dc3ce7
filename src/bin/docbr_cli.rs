//! docbr CLI - JSON bridge for form backends
//!
//! Commands: check, format, strip, schemas, validate, submit
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docbr_core::{
    strip_non_digits, DocumentKind, FieldKind, FormInput, FormPipeline, SchemaRegistry,
    SubmitRequest, Validator,
};

#[derive(Parser)]
#[command(name = "docbr-cli")]
#[command(about = "docbr CLI - Brazilian document validation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to form schemas directory
    #[arg(short, long, env = "DOCBR_SCHEMAS_DIR", default_value = "schemas", global = true)]
    schemas_dir: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum CheckKind {
    Cpf,
    Cnpj,
    Phone,
    Cep,
    Email,
}

impl From<CheckKind> for FieldKind {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Cpf => FieldKind::Cpf,
            CheckKind::Cnpj => FieldKind::Cnpj,
            CheckKind::Phone => FieldKind::Phone,
            CheckKind::Cep => FieldKind::Cep,
            CheckKind::Email => FieldKind::Email,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatKind {
    Cpf,
    Cnpj,
    /// Pick CPF or CNPJ from the digit count
    Auto,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a single value
    Check {
        #[arg(short, long, value_enum)]
        kind: CheckKind,

        value: String,
    },

    /// Format a CPF/CNPJ with canonical punctuation
    Format {
        #[arg(short, long, value_enum, default_value = "cpf")]
        kind: FormatKind,

        value: String,
    },

    /// Strip everything but digits
    Strip { value: String },

    /// List available schemas
    Schemas,

    /// Validate form values
    Validate {
        /// Schema ID
        #[arg(short = 'S', long)]
        schema: String,

        /// JSON payload (field name -> value)
        #[arg(short, long)]
        payload: String,
    },

    /// Validate and normalize a submission
    Submit {
        /// Schema ID
        #[arg(short = 'S', long)]
        schema: String,

        /// JSON payload (field name -> value)
        #[arg(short, long)]
        payload: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docbr_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { kind, value } => check(kind, &value),

        Commands::Format { kind, value } => {
            let kind = match kind {
                FormatKind::Cpf => Some(DocumentKind::Cpf),
                FormatKind::Cnpj => Some(DocumentKind::Cnpj),
                FormatKind::Auto => DocumentKind::from_len(strip_non_digits(&value).len()),
            };
            let formatted = kind.map_or_else(|| value.clone(), |k| k.format(&value));
            emit(&json!({ "kind": kind, "value": value, "formatted": formatted }));
            ExitCode::SUCCESS
        }

        Commands::Strip { value } => {
            emit(&json!({ "value": value, "digits": strip_non_digits(&value) }));
            ExitCode::SUCCESS
        }

        Commands::Schemas | Commands::Validate { .. } | Commands::Submit { .. } => {
            let registry = match SchemaRegistry::load_from_dir(&cli.schemas_dir) {
                Ok(r) => r,
                Err(e) => {
                    emit(&json!({ "error": format!("Failed to load schemas: {}", e) }));
                    return ExitCode::FAILURE;
                }
            };
            run_schema_command(FormPipeline::new(registry), cli.command)
        }
    }
}

fn check(kind: CheckKind, value: &str) -> ExitCode {
    let kind = FieldKind::from(kind);
    let reason = Validator::new()
        .check_value(kind, "value", value)
        .map(|violation| violation.message);

    let valid = reason.is_none();
    emit(&json!({ "kind": kind, "value": value, "valid": valid, "reason": reason }));
    if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn run_schema_command(pipeline: FormPipeline, command: Commands) -> ExitCode {
    match command {
        Commands::Schemas => {
            let schemas: Vec<_> = pipeline.list_schemas()
                .iter()
                .map(|s| json!({
                    "id": s.id,
                    "name": s.name,
                    "version": s.schema_version,
                    "fields": s.fields.len(),
                    "deprecated": s.deprecated,
                }))
                .collect();
            emit(&schemas);
            ExitCode::SUCCESS
        }

        Commands::Validate { schema, payload } => {
            let input = match parse_payload(&payload) {
                Ok(i) => i,
                Err(code) => return code,
            };
            match pipeline.validate_form(&schema, &input) {
                Ok(result) => {
                    emit(&result);
                    if result.valid {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => {
                    emit(&json!({ "valid": false, "error": e.to_string() }));
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Submit { schema, payload } => {
            let input = match parse_payload(&payload) {
                Ok(i) => i,
                Err(code) => return code,
            };
            let request = SubmitRequest { schema_id: schema, input };
            match pipeline.submit_form(&request) {
                Ok(submission) => {
                    emit(&json!({ "success": true, "submission": submission }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    emit(&json!({ "success": false, "error": e.to_string() }));
                    ExitCode::from(2)
                }
            }
        }

        Commands::Check { .. } | Commands::Format { .. } | Commands::Strip { .. } => {
            ExitCode::FAILURE
        }
    }
}

fn parse_payload(payload: &str) -> Result<FormInput, ExitCode> {
    serde_json::from_str(payload).map_err(|e| {
        emit(&json!({ "valid": false, "error": format!("Invalid payload: {}", e) }));
        ExitCode::FAILURE
    })
}

fn emit<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(out) => println!("{}", out),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

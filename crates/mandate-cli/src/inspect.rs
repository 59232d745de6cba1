//! # Inspection Subcommands
//!
//! Read-only commands: print the flow table or a schema, validate a
//! document against a schema, and verify a stored state history.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mandate_contract::{FlowTable, Role, Stage};
use mandate_dispatch::Dispatcher;
use mandate_schema::{SchemaValidationError, SchemaValidator};

use crate::config::CliConfig;
use crate::document::{emit, read_state};

/// Arguments for `mandate flow`.
#[derive(Args, Debug)]
pub struct FlowArgs {
    /// Print the table as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `mandate schema`.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema name, with or without the `.schema.json` suffix.
    /// Lists every schema when omitted.
    pub name: Option<String>,
}

/// Arguments for `mandate validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema name, with or without the `.schema.json` suffix.
    pub schema: String,

    /// Document to validate (JSON or YAML).
    pub file: PathBuf,
}

/// Arguments for `mandate verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// State files, genesis first.
    #[arg(required = true)]
    pub states: Vec<PathBuf>,
}

/// `register` and `register.schema.json` both name the register schema.
pub fn schema_file_name(name: &str) -> String {
    if name.ends_with(".schema.json") {
        name.to_string()
    } else {
        format!("{name}.schema.json")
    }
}

/// Execute `mandate flow`.
pub fn run_flow(args: &FlowArgs, config: &CliConfig) -> Result<u8> {
    if args.json {
        emit(&FlowTable, None, config.pretty)?;
        return Ok(0);
    }

    println!("  {:<12} {:<11} {:<17} outcomes", "stage", "role", "actions");
    for stage in Stage::ALL {
        for role in Role::ALL {
            let rule = FlowTable.get(stage, role);
            if rule.is_empty() {
                continue;
            }
            let actions: Vec<&str> = rule.actions.iter().map(|f| f.as_str()).collect();
            let outcomes: Vec<&str> = rule.outcomes.iter().map(|s| s.as_str()).collect();
            println!(
                "  {:<12} {:<11} {:<17} {}",
                stage.as_str(),
                role.as_str(),
                actions.join(", "),
                outcomes.join(", ")
            );
        }
    }
    Ok(0)
}

/// Execute `mandate schema`.
pub fn run_schema(args: &SchemaArgs, config: &CliConfig) -> Result<u8> {
    let schemas = SchemaValidator::builtin()?;
    match &args.name {
        None => {
            for name in schemas.schema_names() {
                println!("  {name}");
            }
        }
        Some(name) => {
            let file = schema_file_name(name);
            let schema = schemas
                .get_schema(&file)
                .with_context(|| format!("no schema named {file}"))?;
            emit(schema, None, config.pretty)?;
        }
    }
    Ok(0)
}

/// Execute `mandate validate`.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let schemas = SchemaValidator::builtin()?;
    let file = schema_file_name(&args.schema);
    match schemas.validate_file(&args.file, &file) {
        Ok(()) => {
            println!("  {}: valid against {file}", args.file.display());
            Ok(0)
        }
        Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
            println!(
                "  {}: {} violation(s) against {file}",
                args.file.display(),
                violations.len()
            );
            println!("{violations}");
            Ok(crate::EXIT_REFUSED)
        }
        Err(other) => Err(other.into()),
    }
}

/// Execute `mandate verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let states = args
        .states
        .iter()
        .map(|path| read_state(path))
        .collect::<Result<Vec<_>>>()?;

    let dispatcher = Dispatcher::new()?;
    match dispatcher.verify_chain(&states) {
        Ok(()) => {
            if let Some(head) = states.last() {
                println!("  contract:    {}", head.id);
                println!("  states:      {}", states.len());
                println!("  final stage: {}", head.stage());
                println!("  head hash:   {}", head.state_hash.as_deref().unwrap_or_default());
            }
            Ok(0)
        }
        Err(err) => {
            println!("  chain broken: {err}");
            Ok(crate::EXIT_REFUSED)
        }
    }
}

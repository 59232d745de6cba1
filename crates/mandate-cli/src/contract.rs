//! # Contract Subcommands
//!
//! `mandate init` creates a stamped genesis state from role and data
//! documents. `mandate call` applies one function to a stored state.
//! A refused request prints its `{"failed", "code"}` form and exits with
//! [`EXIT_REFUSED`](crate::EXIT_REFUSED).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mandate_core::{ContractId, PartyId};
use mandate_dispatch::{DispatchError, Dispatcher};

use crate::config::CliConfig;
use crate::document::{emit, read_inline_or_file, read_state, read_value};

/// Arguments for `mandate init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Party creating the contract.
    #[arg(long)]
    pub caller: String,

    /// Contract identifier. A random UUID when omitted.
    #[arg(long)]
    pub contract_id: Option<String>,

    /// Genesis roles document (JSON or YAML).
    #[arg(long)]
    pub roles: PathBuf,

    /// Genesis data document (JSON or YAML).
    #[arg(long)]
    pub data: PathBuf,

    /// Enabled functions, comma separated. All functions when omitted.
    #[arg(long, value_delimiter = ',')]
    pub functions: Option<Vec<String>>,

    /// Write the state here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `mandate call`.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Calling party.
    #[arg(long)]
    pub caller: String,

    /// Function name, e.g. `register` or `makePayment`.
    #[arg(long)]
    pub function: String,

    /// Current contract state (JSON or YAML).
    #[arg(long)]
    pub state: PathBuf,

    /// Function input: inline JSON object or a path to a JSON/YAML file.
    #[arg(long)]
    pub input: String,

    /// Write the new state here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute `mandate init`.
pub fn run_init(args: &InitArgs, config: &CliConfig) -> Result<u8> {
    let dispatcher = Dispatcher::new()?;
    let roles = read_value(&args.roles)?;
    let data = read_value(&args.data)?;
    let contract_id = args
        .contract_id
        .as_deref()
        .map(ContractId::new)
        .unwrap_or_else(ContractId::generate);

    let result = dispatcher.init(
        &PartyId::new(args.caller.as_str()),
        contract_id,
        &roles,
        &data,
        args.functions.clone(),
    );
    finish(result, args.out.as_deref(), config)
}

/// Execute `mandate call`.
pub fn run_call(args: &CallArgs, config: &CliConfig) -> Result<u8> {
    let dispatcher = Dispatcher::new()?;
    let state = read_state(&args.state)?;
    let input = read_inline_or_file(&args.input)?;

    let result = dispatcher.call_by_name(
        &PartyId::new(args.caller.as_str()),
        &args.function,
        &state,
        &input,
    );
    finish(result, args.out.as_deref(), config)
}

fn finish(
    result: Result<mandate_contract::ContractState, DispatchError>,
    out: Option<&std::path::Path>,
    config: &CliConfig,
) -> Result<u8> {
    match result {
        Ok(state) => {
            emit(&state, out, config.pretty)?;
            Ok(0)
        }
        Err(err) => {
            emit(&err.to_failed(), None, config.pretty)?;
            Ok(crate::EXIT_REFUSED)
        }
    }
}

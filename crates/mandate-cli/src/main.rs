//! # mandate CLI entry point
//!
//! Parses command-line arguments, loads the config file, installs the
//! tracing subscriber, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mandate_cli::config::CliConfig;
use mandate_cli::contract::{run_call, run_init, CallArgs, InitArgs};
use mandate_cli::inspect::{
    run_flow, run_schema, run_validate, run_verify, FlowArgs, SchemaArgs, ValidateArgs,
    VerifyArgs,
};
use mandate_cli::scenario::{run_scenario, RunArgs};

/// Payment Mandate contract tool.
///
/// Creates and advances Payment Mandate contracts, replays scenarios, and
/// verifies the hash chain linking a contract's states.
#[derive(Parser, Debug)]
#[command(name = "mandate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to configuration file. Defaults to ./mandate.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print compact JSON regardless of config.
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a contract and print its genesis state.
    Init(InitArgs),

    /// Apply one function to a stored state.
    Call(CallArgs),

    /// Replay a scenario file and verify the resulting chain.
    Run(RunArgs),

    /// Print the flow constraint table.
    Flow(FlowArgs),

    /// Print a built-in schema, or list them.
    Schema(SchemaArgs),

    /// Validate a JSON or YAML document against a built-in schema.
    Validate(ValidateArgs),

    /// Verify the hash chain of stored states.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = CliConfig::discover(cli.config.as_deref(), &cwd);

    init_tracing(
        cli.verbose,
        cli.log_json,
        config.as_ref().ok().and_then(|c| c.log_filter.as_deref()),
    );

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };
    if cli.compact {
        config.pretty = false;
    }
    tracing::debug!(?config, "configuration loaded");

    let result = match cli.command {
        Commands::Init(args) => run_init(&args, &config),
        Commands::Call(args) => run_call(&args, &config),
        Commands::Run(args) => run_scenario(&args, &config),
        Commands::Flow(args) => run_flow(&args, &config),
        Commands::Schema(args) => run_schema(&args, &config),
        Commands::Validate(args) => run_validate(&args),
        Commands::Verify(args) => run_verify(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins over the config's `log_filter`, which wins over `-v`.
fn init_tracing(verbose: u8, json: bool, config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| config_filter.and_then(|f| EnvFilter::try_new(f).ok()))
        .unwrap_or_else(|| match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_init() {
        let cli = Cli::try_parse_from([
            "mandate",
            "init",
            "--caller",
            "bank1",
            "--contract-id",
            "m1",
            "--roles",
            "roles.yaml",
            "--data",
            "data.yaml",
            "--functions",
            "register,makePayment",
        ])
        .unwrap();
        let Commands::Init(args) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(args.caller, "bank1");
        assert_eq!(args.contract_id.as_deref(), Some("m1"));
        assert_eq!(
            args.functions,
            Some(vec!["register".to_string(), "makePayment".to_string()])
        );
        assert!(args.out.is_none());
    }

    #[test]
    fn cli_parse_call() {
        let cli = Cli::try_parse_from([
            "mandate",
            "call",
            "--caller",
            "central",
            "--function",
            "makePayment",
            "--state",
            "s3.json",
            "--input",
            r#"{"paymentReference":"ref1","execution":"manual"}"#,
            "--out",
            "s4.json",
        ])
        .unwrap();
        let Commands::Call(args) = cli.command else {
            panic!("expected call");
        };
        assert_eq!(args.function, "makePayment");
        assert_eq!(args.out, Some(PathBuf::from("s4.json")));
    }

    #[test]
    fn cli_parse_run_with_global_flags() {
        let cli = Cli::try_parse_from([
            "mandate",
            "run",
            "scenario.yaml",
            "--out-dir",
            "out",
            "-vv",
            "--log-json",
            "--compact",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert!(cli.compact);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.scenario, PathBuf::from("scenario.yaml"));
        assert_eq!(args.out_dir, Some(PathBuf::from("out")));
        assert!(!args.no_verify);
    }

    #[test]
    fn cli_parse_inspection_commands() {
        assert!(matches!(
            Cli::try_parse_from(["mandate", "flow", "--json"]).unwrap().command,
            Commands::Flow(FlowArgs { json: true })
        ));
        assert!(matches!(
            Cli::try_parse_from(["mandate", "schema"]).unwrap().command,
            Commands::Schema(SchemaArgs { name: None })
        ));
        let cli = Cli::try_parse_from(["mandate", "validate", "genesis-data", "d.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate(_)));
        let cli = Cli::try_parse_from(["mandate", "verify", "a.json", "b.json"]).unwrap();
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.states.len(), 2);
    }

    #[test]
    fn cli_verify_requires_states() {
        assert!(Cli::try_parse_from(["mandate", "verify"]).is_err());
    }

    #[test]
    fn cli_config_flag() {
        let cli = Cli::try_parse_from(["mandate", "--config", "m.yaml", "flow"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("m.yaml")));
    }
}

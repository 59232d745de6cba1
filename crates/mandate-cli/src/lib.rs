//! # mandate-cli — Payment Mandate Command-Line Interface
//!
//! Drives the contract from files: create a contract, advance it one call
//! at a time, replay a scripted scenario, and verify stored histories.
//!
//! ## Subcommands
//!
//! - `init`, `call`: create and advance a contract ([`contract`])
//! - `run`: replay a scenario file ([`scenario`])
//! - `flow`, `schema`, `validate`, `verify`: inspection ([`inspect`])
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers; handlers delegate to
//!   `mandate-dispatch` and hold no contract logic.
//! - Handlers return `anyhow::Result<u8>`, the process exit code.

pub mod config;
pub mod contract;
pub mod document;
pub mod inspect;
pub mod scenario;

/// Exit code for a request the contract or a schema refused.
pub const EXIT_REFUSED: u8 = 2;

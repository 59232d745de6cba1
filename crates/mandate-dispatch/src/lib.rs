//! # mandate-dispatch — Contract Dispatcher
//!
//! The environment side of the Payment Mandate contract: it turns JSON
//! requests into typed transition calls and keeps every state it produces
//! stamped with a `stateHash`.
//!
//! - [`Dispatcher`] validates genesis documents and inputs against the
//!   schemas in `mandate-schema`, derives caller roles, refuses states whose
//!   `stateHash` does not match their content, and stamps successors.
//! - [`StateChain`] verifies a contract history: one genesis, one contract
//!   id, and every `priorHash` equal to its predecessor's `stateHash`.
//!
//! ## Crate Policy
//!
//! - The contract crate stays pure. All hashing and validation happens here.
//! - Contract refusals pass through unchanged as [`DispatchError::Contract`].

pub mod chain;
pub mod dispatcher;
pub mod error;

pub use chain::{ChainError, StateChain};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;

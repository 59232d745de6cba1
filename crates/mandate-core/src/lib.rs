//! # mandate-core — Foundational Types for the Payment Mandate Contract
//!
//! Leaf crate of the workspace. Defines the identifier newtypes and the
//! canonical serialization / digest pipeline that the contract engine and
//! the dispatcher build on.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `PartyId` and `ContractId` are
//!    distinct types; a contract id cannot be passed where a party is expected.
//!
//! 2. **`CanonicalBytes` newtype.** All digest computation flows through
//!    `CanonicalBytes::new()`, which sorts keys (RFC 8785) and rejects floats.
//!
//! 3. **`sha256_digest()` accepts only `&CanonicalBytes`.** Every state hash in
//!    a contract history is computed over canonical bytes.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mandate-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, MandateError};
pub use identity::{ContractId, PartyId};

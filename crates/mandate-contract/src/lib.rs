//! # mandate-contract — Payment Mandate State-Transition Engine
//!
//! An agreement for an instructor to trigger a single payment between a
//! payer and a receiver. The contract moves through
//!
//! ```text
//! initialized ──register──▶ agreed ──makePayment──▶ instructed ──confirmPayment──▶ complete
//!      │                                               │
//!      └──register(rejected)──▶ rejected               └──confirmActioned (action-level only)
//! ```
//!
//! ## Modules
//!
//! - [`model`] — `ContractState` and everything it contains.
//! - [`flow`] — the flow constraint table.
//! - [`transition`] — `init`, `register`, `make_payment`, `confirm_actioned`,
//!   `confirm_payment`.
//! - [`failure`] — the closed failure enum.
//! - [`hashing`] — the `StateHasher` seam and the SHA-256 default.
//!
//! ## Crate Policy
//!
//! - Transitions are pure: they borrow a state and return a new one. No I/O.
//! - Transitions never compute digests; they only chain `priorHash` from the
//!   predecessor's `stateHash`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod failure;
pub mod flow;
pub mod hashing;
pub mod model;
pub mod transition;

/// Registered name of the contract.
pub const CONTRACT_NAME: &str = "Payment Mandate";

/// One-line description of the contract.
pub const CONTRACT_DESCRIPTION: &str = "The Payment Mandate contract is an agreement for an instructor to trigger a single payment between a payer and a receiver";

pub use failure::{ContractFailure, Failed};
pub use flow::{constraint, is_legal_outcome, is_permitted, FlowConstraint, FlowTable, Function};
pub use hashing::{is_stamp_valid, stamp, Sha256StateHasher, StateHasher};
pub use model::{
    Action, ActionKind, ActionStatus, Confirmation, ConsensusEntry, ConsensusStatus,
    ContractData, ContractState, Events, Execution, Role, RoleBinding, RoleBindings,
    SettlementInstruction, SettlementOp, Stage,
};
pub use transition::{
    confirm_actioned, confirm_payment, init, is_eligible, make_payment, register,
    ConfirmActionedInput, ConfirmPaymentInput, Decision, MakePaymentInput, RegisterInput,
    ELIGIBLE_PARTIES,
};

//! Dispatcher error type.

use mandate_contract::{ContractFailure, Failed, Function};
use mandate_core::{CanonicalizationError, ContractId, PartyId};
use mandate_schema::SchemaValidationError;
use thiserror::Error;

use crate::chain::ChainError;

/// Why the dispatcher refused a request.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No contract is registered under this name.
    #[error("unknown contract {name:?}")]
    UnknownContract {
        /// The requested name.
        name: String,
    },

    /// No transition function has this name.
    #[error("unknown function {name:?}")]
    UnknownFunction {
        /// The requested name.
        name: String,
    },

    /// `init` creates contracts and cannot be called on a state.
    #[error("init cannot be called on an existing contract")]
    InitNotCallable,

    /// The function is not in the contract's enabled set.
    #[error("function {function} is not enabled for contract {contract_id}")]
    FunctionNotEnabled {
        /// Requested function.
        function: Function,
        /// Contract the call targeted.
        contract_id: ContractId,
    },

    /// Input failed schema validation.
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    /// Input passed its schema but did not deserialize.
    #[error("cannot read {what}: {source}")]
    Deserialize {
        /// What was being read.
        what: &'static str,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The caller holds no role in the contract.
    #[error("{caller} is not a party to contract {contract_id}")]
    NotAParty {
        /// The caller.
        caller: PartyId,
        /// The contract.
        contract_id: ContractId,
    },

    /// The incoming state's stored hash does not match its content.
    #[error("stateHash of contract {contract_id} does not match its content: recomputed {expected}, stored {actual}")]
    HashMismatch {
        /// The contract.
        contract_id: ContractId,
        /// Recomputed digest.
        expected: String,
        /// Stored digest, or `(absent)`.
        actual: String,
    },

    /// The contract refused the transition.
    #[error(transparent)]
    Contract(#[from] ContractFailure),

    /// A state could not be hashed.
    #[error("cannot hash state: {0}")]
    Hash(#[from] CanonicalizationError),

    /// A history failed chain verification.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl DispatchError {
    /// Stable machine-readable kind. Contract refusals keep their own code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownContract { .. } => "UnknownContract",
            Self::UnknownFunction { .. } => "UnknownFunction",
            Self::InitNotCallable => "InitNotCallable",
            Self::FunctionNotEnabled { .. } => "FunctionNotEnabled",
            Self::Schema(_) => "SchemaViolation",
            Self::Deserialize { .. } => "InvalidInput",
            Self::NotAParty { .. } => "NotAParty",
            Self::HashMismatch { .. } => "HashMismatch",
            Self::Contract(failure) => failure.code(),
            Self::Hash(_) => "HashFailure",
            Self::Chain(_) => "ChainBroken",
        }
    }

    /// The `{failed, code}` wire form.
    pub fn to_failed(&self) -> Failed {
        match self {
            Self::Contract(failure) => failure.to_failed(),
            other => Failed {
                failed: other.to_string(),
                code: other.code().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_failure_keeps_its_code() {
        let err = DispatchError::from(ContractFailure::ReferenceMismatch {
            reference: "r".to_string(),
        });
        assert_eq!(err.code(), "ReferenceMismatch");
        let failed = err.to_failed();
        assert_eq!(failed.code, "ReferenceMismatch");
        assert!(failed.failed.contains("\"r\""));
    }

    #[test]
    fn test_dispatch_error_wire_form() {
        let err = DispatchError::FunctionNotEnabled {
            function: Function::MakePayment,
            contract_id: ContractId::new("m1"),
        };
        let failed = err.to_failed();
        assert_eq!(failed.code, "FunctionNotEnabled");
        assert_eq!(failed.failed, "function makePayment is not enabled for contract m1");
    }
}

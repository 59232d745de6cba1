//! # Transition Failures
//!
//! Every transition returns `Result<ContractState, ContractFailure>`. A
//! failure leaves the caller's state untouched; the input is only borrowed.
//! On the wire a failure is `{"failed": "<reason>", "code": "<kind>"}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mandate_core::PartyId;

use crate::flow::Function;
use crate::model::Stage;

/// Why a transition was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractFailure {
    /// The caller may not perform this function.
    #[error("{caller} is not authorized to call {function}{}", stage_suffix(.stage))]
    Unauthorized {
        /// Refused caller.
        caller: PartyId,
        /// Function attempted.
        function: Function,
        /// Stage at the time of the call; `None` for `init`.
        stage: Option<Stage>,
    },

    /// `makePayment` reused a reference.
    #[error("payment reference {reference:?} is not unique")]
    DuplicateReference {
        /// The reused reference.
        reference: String,
    },

    /// No proposed action with this reference is submitted by the caller.
    #[error("payment reference {reference:?} not found for submitter {caller} or already actioned")]
    ReferenceNotFoundOrAlreadyActioned {
        /// The reference looked up.
        reference: String,
        /// The caller.
        caller: PartyId,
    },

    /// `confirmPayment` named a reference no action carries.
    #[error("payment reference {reference:?} does not match any action")]
    ReferenceMismatch {
        /// The reference looked up.
        reference: String,
    },

    /// Any other fault.
    #[error("internal failure: {reason}")]
    Internal {
        /// Description of the fault.
        reason: String,
    },
}

fn stage_suffix(stage: &Option<Stage>) -> String {
    match stage {
        Some(stage) => format!(" in stage {stage}"),
        None => String::new(),
    }
}

impl ContractFailure {
    pub(crate) fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "Unauthorized",
            Self::DuplicateReference { .. } => "DuplicateReference",
            Self::ReferenceNotFoundOrAlreadyActioned { .. } => "ReferenceNotFoundOrAlreadyActioned",
            Self::ReferenceMismatch { .. } => "ReferenceMismatch",
            Self::Internal { .. } => "InternalFailure",
        }
    }

    /// The wire form of this failure.
    pub fn to_failed(&self) -> Failed {
        Failed {
            failed: self.to_string(),
            code: self.code().to_string(),
        }
    }
}

/// Serializable failure value returned to the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failed {
    /// Human-readable reason.
    pub failed: String,
    /// Failure kind, see [`ContractFailure::code`].
    pub code: String,
}

//! # State Chain
//!
//! Append-only history of one contract. Each appended state must carry a
//! valid `stateHash`, and its `priorHash` must equal the `stateHash` of the
//! state before it. The first state is a genesis state (`priorHash == ""`).
//!
//! A forked or edited history fails at the first bad link.

use mandate_contract::{ContractState, StateHasher};
use mandate_core::{CanonicalizationError, ContractId};
use thiserror::Error;

/// Why a sequence of states is not a valid history.
#[derive(Error, Debug)]
pub enum ChainError {
    /// No states were supplied.
    #[error("cannot verify an empty state chain")]
    Empty,

    /// The first state does not start a chain.
    #[error("state #0 is not a genesis state: priorHash is {actual:?}")]
    NotGenesis {
        /// The non-empty priorHash found.
        actual: String,
    },

    /// A state belongs to a different contract.
    #[error("state #{index} belongs to contract {actual}, chain is for {expected}")]
    IdMismatch {
        /// Position in the chain.
        index: usize,
        /// Contract id of the chain.
        expected: ContractId,
        /// Contract id of the offending state.
        actual: ContractId,
    },

    /// A state carries no `stateHash`.
    #[error("state #{index} is not stamped with a stateHash")]
    Unstamped {
        /// Position in the chain.
        index: usize,
    },

    /// A state's stored `stateHash` differs from its recomputed digest.
    #[error("stateHash mismatch for state #{index}: recomputed {expected}, stored {actual}")]
    StateHashMismatch {
        /// Position in the chain.
        index: usize,
        /// Recomputed digest.
        expected: String,
        /// Stored digest.
        actual: String,
    },

    /// A state does not link to its predecessor.
    #[error("priorHash mismatch for state #{index}: expected {expected}, got {actual}")]
    PriorHashMismatch {
        /// Position in the chain.
        index: usize,
        /// The predecessor's stateHash.
        expected: String,
        /// The priorHash found.
        actual: String,
    },

    /// A digest could not be computed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Check that `state.stateHash` is present and matches `hasher`.
///
/// Returns the verified hex digest.
fn verified_stamp<H: StateHasher + ?Sized>(
    hasher: &H,
    state: &ContractState,
    index: usize,
) -> Result<String, ChainError> {
    let stored = state
        .state_hash
        .as_deref()
        .ok_or(ChainError::Unstamped { index })?;
    let recomputed = hasher.digest(state)?.to_hex();
    if recomputed != stored {
        return Err(ChainError::StateHashMismatch {
            index,
            expected: recomputed,
            actual: stored.to_string(),
        });
    }
    Ok(recomputed)
}

/// A verified contract history.
#[derive(Debug, Clone)]
pub struct StateChain {
    id: ContractId,
    states: Vec<ContractState>,
}

impl StateChain {
    /// Start a chain from a stamped genesis state.
    pub fn new<H: StateHasher + ?Sized>(
        hasher: &H,
        genesis: ContractState,
    ) -> Result<Self, ChainError> {
        if !genesis.is_genesis() {
            return Err(ChainError::NotGenesis {
                actual: genesis.prior_hash.clone(),
            });
        }
        verified_stamp(hasher, &genesis, 0)?;
        Ok(Self {
            id: genesis.id.clone(),
            states: vec![genesis],
        })
    }

    /// Verify every link of `states`, in order.
    pub fn from_states<H: StateHasher + ?Sized>(
        hasher: &H,
        states: &[ContractState],
    ) -> Result<Self, ChainError> {
        let (genesis, rest) = states.split_first().ok_or(ChainError::Empty)?;
        let mut chain = Self::new(hasher, genesis.clone())?;
        for state in rest {
            chain.append(hasher, state.clone())?;
        }
        Ok(chain)
    }

    /// Append a successor.
    ///
    /// Validates, in order: contract id, stamp, and `priorHash` linkage to
    /// the current head.
    pub fn append<H: StateHasher + ?Sized>(
        &mut self,
        hasher: &H,
        state: ContractState,
    ) -> Result<(), ChainError> {
        let index = self.states.len();
        if state.id != self.id {
            return Err(ChainError::IdMismatch {
                index,
                expected: self.id.clone(),
                actual: state.id.clone(),
            });
        }

        verified_stamp(hasher, &state, index)?;

        let expected = self.head_hash().to_string();
        if state.prior_hash != expected {
            return Err(ChainError::PriorHashMismatch {
                index,
                expected,
                actual: state.prior_hash.clone(),
            });
        }

        self.states.push(state);
        Ok(())
    }

    /// Contract id of the chain.
    pub fn id(&self) -> &ContractId {
        &self.id
    }

    /// Latest state.
    pub fn head(&self) -> &ContractState {
        // `new` seeds the chain with genesis and states are never removed.
        &self.states[self.states.len() - 1]
    }

    fn head_hash(&self) -> &str {
        self.head().state_hash.as_deref().unwrap_or_default()
    }

    /// Number of states, genesis included.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false: a chain holds at least its genesis.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All states, oldest first.
    pub fn states(&self) -> &[ContractState] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandate_contract::{
        init, register, stamp, ContractData, Decision, RegisterInput, RoleBinding, RoleBindings,
        Sha256StateHasher, Stage,
    };
    use mandate_core::PartyId;

    fn genesis(id: &str) -> ContractState {
        let state = init(
            &PartyId::new("bank1"),
            ContractId::new(id),
            RoleBindings {
                payer: RoleBinding::waiting("bank1"),
                receiver: RoleBinding::waiting("bank2"),
                instructor: RoleBinding::waiting("central"),
            },
            ContractData {
                status: Stage::Initialized,
                comment: String::new(),
                payer_domain: "DOMAIN".to_string(),
                payer_partition: "DEMOUS01XXX".to_string(),
                payer_address: "pa".to_string(),
                receiver_domain: "DOMAIN".to_string(),
                receiver_partition: "DEMOUS02XXX".to_string(),
                receiver_address: "ra".to_string(),
                asset_id: "USD".to_string(),
                amount: 10,
                events: None,
            },
            vec![],
        )
        .unwrap();
        stamp(&Sha256StateHasher, state).unwrap()
    }

    fn agree(state: &ContractState, who: &str) -> ContractState {
        let caller = PartyId::new(who);
        let next = register(
            &caller,
            &state.roles.roles_of(&caller),
            state,
            &RegisterInput {
                register: Decision::Agreed,
            },
        )
        .unwrap();
        stamp(&Sha256StateHasher, next).unwrap()
    }

    #[test]
    fn test_valid_history_verifies() {
        let s0 = genesis("c");
        let s1 = agree(&s0, "bank1");
        let s2 = agree(&s1, "bank2");
        let chain = StateChain::from_states(&Sha256StateHasher, &[s0, s1, s2.clone()]).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.head(), &s2);
        assert_eq!(chain.id().as_str(), "c");
        assert!(!chain.is_empty());
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(matches!(
            StateChain::from_states(&Sha256StateHasher, &[]),
            Err(ChainError::Empty)
        ));
    }

    #[test]
    fn test_successor_cannot_start_chain() {
        let s1 = agree(&genesis("c"), "bank1");
        assert!(matches!(
            StateChain::new(&Sha256StateHasher, s1),
            Err(ChainError::NotGenesis { .. })
        ));
    }

    #[test]
    fn test_edited_state_is_detected() {
        let s0 = genesis("c");
        let mut s1 = agree(&s0, "bank1");
        s1.data.amount = 1_000_000;
        let err = StateChain::from_states(&Sha256StateHasher, &[s0, s1]).unwrap_err();
        assert!(matches!(err, ChainError::StateHashMismatch { index: 1, .. }));
    }

    #[test]
    fn test_gap_is_detected() {
        let s0 = genesis("c");
        let s1 = agree(&s0, "bank1");
        let s2 = agree(&s1, "bank2");
        let err = StateChain::from_states(&Sha256StateHasher, &[s0, s2]).unwrap_err();
        assert!(matches!(err, ChainError::PriorHashMismatch { index: 1, .. }));
    }

    #[test]
    fn test_foreign_contract_is_detected() {
        let s0 = genesis("c");
        let other = agree(&genesis("d"), "bank1");
        let err = StateChain::from_states(&Sha256StateHasher, &[s0, other]).unwrap_err();
        assert!(matches!(err, ChainError::IdMismatch { index: 1, .. }));
    }

    #[test]
    fn test_unstamped_state_is_detected() {
        let s0 = genesis("c");
        let mut s1 = agree(&s0, "bank1");
        s1.state_hash = None;
        let mut chain = StateChain::new(&Sha256StateHasher, s0).unwrap();
        assert!(matches!(
            chain.append(&Sha256StateHasher, s1),
            Err(ChainError::Unstamped { index: 1 })
        ));
        assert_eq!(chain.len(), 1);
    }
}

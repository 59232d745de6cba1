//! # State Hashing
//!
//! Transitions never compute digests. They copy the predecessor's
//! `stateHash` into the successor's `priorHash`, and the environment stamps
//! each new state through a [`StateHasher`].

use mandate_core::{sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest};

use crate::model::ContractState;

/// Computes the digest of a contract state.
///
/// Implementations must be pure and must ignore the state's own
/// `stateHash` field, so that stamping a state does not change its digest.
pub trait StateHasher {
    /// Digest of `state`, excluding `stateHash`.
    fn digest(&self, state: &ContractState) -> Result<ContentDigest, CanonicalizationError>;
}

/// SHA-256 over the canonical JSON of the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256StateHasher;

impl StateHasher for Sha256StateHasher {
    fn digest(&self, state: &ContractState) -> Result<ContentDigest, CanonicalizationError> {
        if state.state_hash.is_none() {
            return Ok(sha256_digest(&CanonicalBytes::new(state)?));
        }
        let mut unstamped = state.clone();
        unstamped.state_hash = None;
        Ok(sha256_digest(&CanonicalBytes::new(&unstamped)?))
    }
}

/// Set `state.stateHash` to its digest under `hasher`.
pub fn stamp<H: StateHasher + ?Sized>(
    hasher: &H,
    mut state: ContractState,
) -> Result<ContractState, CanonicalizationError> {
    let digest = hasher.digest(&state)?;
    state.state_hash = Some(digest.to_hex());
    Ok(state)
}

/// Whether `state.stateHash` is present and equals its digest under `hasher`.
pub fn is_stamp_valid<H: StateHasher + ?Sized>(
    hasher: &H,
    state: &ContractState,
) -> Result<bool, CanonicalizationError> {
    match state.state_hash.as_deref() {
        Some(stored) => Ok(hasher.digest(state)?.to_hex() == stored),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContractData, RoleBinding, RoleBindings, Stage};
    use mandate_core::{ContractId, PartyId};

    fn state() -> ContractState {
        crate::init(
            &PartyId::new("bank2"),
            ContractId::new("mandate-hash"),
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
                amount: 5,
                events: None,
            },
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_digest_ignores_own_state_hash() {
        let raw = state();
        let stamped = stamp(&Sha256StateHasher, raw.clone()).unwrap();
        assert_eq!(
            Sha256StateHasher.digest(&raw).unwrap(),
            Sha256StateHasher.digest(&stamped).unwrap()
        );
        assert!(is_stamp_valid(&Sha256StateHasher, &stamped).unwrap());
    }

    #[test]
    fn test_unstamped_state_is_not_valid() {
        assert!(!is_stamp_valid(&Sha256StateHasher, &state()).unwrap());
    }

    #[test]
    fn test_tampered_state_fails_stamp_check() {
        let mut stamped = stamp(&Sha256StateHasher, state()).unwrap();
        stamped.data.amount = 5_000_000;
        assert!(!is_stamp_valid(&Sha256StateHasher, &stamped).unwrap());
    }

    #[test]
    fn test_stamp_is_hex_sha256() {
        let stamped = stamp(&Sha256StateHasher, state()).unwrap();
        let hash = stamped.state_hash.unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

//! # Identifier Newtypes
//!
//! `PartyId` names a participant (`bank1`, `central`, ...) and `ContractId`
//! names one contract instance. Both serialize as bare JSON strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MandateError;

/// Identity of a contract participant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

/// Opaque identifier of a contract instance, fixed at genesis.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl PartyId {
    /// Wrap a party name.
    pub fn new(party: impl Into<String>) -> Self {
        Self(party.into())
    }

    /// Wrap a party name, rejecting empty or whitespace-only input.
    pub fn parse(party: &str) -> Result<Self, MandateError> {
        if party.trim().is_empty() {
            return Err(MandateError::InvalidIdentifier {
                value: party.to_string(),
                reason: "party must not be empty".to_string(),
            });
        }
        Ok(Self(party.to_string()))
    }

    /// Access the party name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ContractId {
    /// Wrap an externally assigned contract identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random contract identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PartyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ContractId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for PartyId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PartyId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

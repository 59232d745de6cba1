//! # Contract State Model
//!
//! The value threaded through every transition. A `ContractState` is created
//! by [`crate::init`] and replaced, never mutated in place, by each later
//! transition.
//!
//! ## JSON shape
//!
//! ```text
//! {
//!   "id": "...",
//!   "roles": { "payer": {"party": "bank1", "confirmed": "waiting"}, "receiver": ..., "instructor": ... },
//!   "data": { "status": "initialized", "comment": ..., "payerAddress": ..., ..., "events": {"actions": [...]} },
//!   "functions": ["init", "register", ...],
//!   "priorHash": "",
//!   "stateHash": "..."            // present once the environment stamps the state
//! }
//! ```

use serde::{Deserialize, Serialize};

use mandate_core::{ContractId, PartyId};

// ─── Stage ───────────────────────────────────────────────────────────

/// The value of `data.status`: which stage of the mandate the contract is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Genesis stage; parties are registering.
    Initialized,
    /// Every role has agreed; waiting for the instructor.
    Agreed,
    /// A role rejected the mandate (terminal).
    Rejected,
    /// A payment action has been proposed.
    Instructed,
    /// Every action is confirmed (terminal).
    Complete,
}

impl Stage {
    /// All stages in declaration order.
    pub const ALL: [Stage; 5] = [
        Stage::Initialized,
        Stage::Agreed,
        Stage::Instructed,
        Stage::Complete,
        Stage::Rejected,
    ];

    /// Whether no transition can leave this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Complete)
    }

    /// The wire name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Agreed => "agreed",
            Self::Rejected => "rejected",
            Self::Instructed => "instructed",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Roles ───────────────────────────────────────────────────────────

/// A named party slot, bound to an identity at genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Party whose account is debited.
    Payer,
    /// Party whose account is credited and who confirms settlement.
    Receiver,
    /// Party who triggers the payment.
    Instructor,
}

impl Role {
    /// All roles in their fixed iteration order.
    pub const ALL: [Role; 3] = [Role::Payer, Role::Receiver, Role::Instructor];

    /// The wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payer => "payer",
            Self::Receiver => "receiver",
            Self::Instructor => "instructor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role holder's registration decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confirmation {
    /// Not yet registered.
    Waiting,
    /// Agreed to the mandate.
    Agreed,
    /// Rejected the mandate.
    Rejected,
}

/// Binding of one role to a party and its registration decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleBinding {
    /// The identity holding the role.
    pub party: PartyId,
    /// The holder's decision.
    pub confirmed: Confirmation,
}

impl RoleBinding {
    /// A binding that has not registered yet.
    pub fn waiting(party: impl Into<PartyId>) -> Self {
        Self {
            party: party.into(),
            confirmed: Confirmation::Waiting,
        }
    }
}

/// The fixed set of three role bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleBindings {
    /// Binding for [`Role::Payer`].
    pub payer: RoleBinding,
    /// Binding for [`Role::Receiver`].
    pub receiver: RoleBinding,
    /// Binding for [`Role::Instructor`].
    pub instructor: RoleBinding,
}

impl RoleBindings {
    /// Look up the binding of a role.
    pub fn get(&self, role: Role) -> &RoleBinding {
        match role {
            Role::Payer => &self.payer,
            Role::Receiver => &self.receiver,
            Role::Instructor => &self.instructor,
        }
    }

    /// Mutable lookup of the binding of a role.
    pub fn get_mut(&mut self, role: Role) -> &mut RoleBinding {
        match role {
            Role::Payer => &mut self.payer,
            Role::Receiver => &mut self.receiver,
            Role::Instructor => &mut self.instructor,
        }
    }

    /// The party bound to a role.
    pub fn party(&self, role: Role) -> &PartyId {
        &self.get(role).party
    }

    /// Bindings in fixed role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &RoleBinding)> + '_ {
        Role::ALL.into_iter().map(move |role| (role, self.get(role)))
    }

    /// Every role bound to `party`, in fixed role order.
    pub fn roles_of(&self, party: &PartyId) -> Vec<Role> {
        self.iter()
            .filter(|(_, binding)| &binding.party == party)
            .map(|(role, _)| role)
            .collect()
    }

    /// Whether no role is still waiting.
    pub fn all_responded(&self) -> bool {
        self.iter()
            .all(|(_, binding)| binding.confirmed != Confirmation::Waiting)
    }
}

// ─── Business data ───────────────────────────────────────────────────

/// Contract business fields plus the optional events record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContractData {
    /// Authoritative stage indicator.
    pub status: Stage,
    /// Free-text comment.
    pub comment: String,
    /// Settlement domain of the payer.
    pub payer_domain: String,
    /// Partition (participant) of the payer.
    pub payer_partition: String,
    /// Account address of the payer.
    pub payer_address: String,
    /// Settlement domain of the receiver.
    pub receiver_domain: String,
    /// Partition (participant) of the receiver.
    pub receiver_partition: String,
    /// Account address of the receiver.
    pub receiver_address: String,
    /// Asset being paid.
    pub asset_id: String,
    /// Amount in the asset's minor unit.
    pub amount: u64,
    /// Payment events, created by `makePayment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Events>,
}

/// Container for the tracked payment actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    /// Actions in creation order.
    pub actions: Vec<Action>,
}

// ─── Actions ─────────────────────────────────────────────────────────

/// Kind tag of a settlement action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Create a payment on the settlement layer.
    #[serde(rename = "RLNCREATE")]
    RlnCreate,
}

/// Lifecycle of an action: `proposed → actioned → confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Created by the instructor.
    Proposed,
    /// The submitter reports it executed the settlement.
    Actioned,
    /// Every consensus participant confirmed.
    Confirmed,
}

/// Whether an action is executed by hand or by automation. Informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    /// Submitted manually by the payer.
    Manual,
    /// Submitted by automation.
    Automatic,
}

/// Per-participant confirmation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusStatus {
    /// Participant has not confirmed.
    Unconfirmed,
    /// Participant confirmed settlement.
    Confirmed,
}

/// One confirmation requirement attached to an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusEntry {
    /// Who must confirm.
    pub participant: PartyId,
    /// Whether they have.
    pub status: ConsensusStatus,
}

impl ConsensusEntry {
    /// A requirement that has not been met yet.
    pub fn unconfirmed(participant: PartyId) -> Self {
        Self {
            participant,
            status: ConsensusStatus::Unconfirmed,
        }
    }
}

/// Operation requested of the settlement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementOp {
    /// Create a transfer.
    Create,
}

/// A settlement instruction forwarded to the settlement layer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementInstruction {
    /// Requested operation.
    pub action: SettlementOp,
    /// Debited account.
    pub from_account: String,
    /// Debited domain.
    pub from_domain: String,
    /// Debited participant.
    pub from_participant: String,
    /// Credited account.
    pub to_account: String,
    /// Credited domain.
    pub to_domain: String,
    /// Credited participant.
    pub to_participant: String,
    /// Amount in minor units.
    pub amount: u64,
    /// Asset transferred.
    pub asset_id: String,
}

/// A payment instruction tracked through proposal, actioning, and confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Action kind.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Caller-supplied reference, unique within the contract.
    pub reference: String,
    /// Party expected to call `confirmActioned`.
    pub submitter: PartyId,
    /// Lifecycle status.
    pub status: ActionStatus,
    /// Required confirmations.
    pub consensus: Vec<ConsensusEntry>,
    /// Settlement instructions executed atomically.
    pub atomic_group: Vec<SettlementInstruction>,
    /// Manual or automatic execution.
    pub execution: Execution,
}

impl Action {
    /// Whether every consensus entry is confirmed.
    pub fn is_fully_consented(&self) -> bool {
        self.consensus
            .iter()
            .all(|entry| entry.status == ConsensusStatus::Confirmed)
    }
}

// ─── Contract state ──────────────────────────────────────────────────

/// One snapshot in a contract's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractState {
    /// Contract identifier, fixed at genesis.
    pub id: ContractId,
    /// Role bindings, fixed membership.
    pub roles: RoleBindings,
    /// Business data and events.
    pub data: ContractData,
    /// Transition functions enabled for this instance.
    pub functions: Vec<String>,
    /// Digest of the predecessor; empty for genesis.
    pub prior_hash: String,
    /// Digest of this state, set by the environment after it is computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_hash: Option<String>,
}

impl ContractState {
    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.data.status
    }

    /// Whether this is a genesis state.
    pub fn is_genesis(&self) -> bool {
        self.prior_hash.is_empty()
    }

    /// Tracked actions, empty before `makePayment`.
    pub fn actions(&self) -> &[Action] {
        self.data
            .events
            .as_ref()
            .map(|events| events.actions.as_slice())
            .unwrap_or(&[])
    }

    /// Find an action by reference.
    pub fn find_action(&self, reference: &str) -> Option<&Action> {
        self.actions()
            .iter()
            .find(|action| action.reference == reference)
    }

    pub(crate) fn actions_mut(&mut self) -> &mut [Action] {
        self.data
            .events
            .as_mut()
            .map(|events| events.actions.as_mut_slice())
            .unwrap_or_default()
    }
}

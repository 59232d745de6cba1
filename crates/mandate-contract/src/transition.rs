//! # Transition Engine
//!
//! The five contract functions. Each borrows the current state and returns
//! either a new state or a [`ContractFailure`]; none of them panics or
//! touches anything outside its arguments.
//!
//! Every post-genesis transition runs the same checks in the same order:
//!
//! 1. the caller actually holds each role it claims (`Unauthorized`);
//! 2. the function-specific reference checks (`DuplicateReference`,
//!    `ReferenceNotFoundOrAlreadyActioned`, `ReferenceMismatch`);
//! 3. the flow constraint table for the current stage (`Unauthorized`);
//! 4. the predecessor carries a `stateHash` to chain from (`Internal`).
//!
//! After applying the change, the resulting stage is checked against the
//! table's outcomes.

use serde::{Deserialize, Serialize};

use mandate_core::{ContractId, PartyId};

use crate::failure::ContractFailure;
use crate::flow::{self, Function};
use crate::model::{
    Action, ActionKind, ActionStatus, Confirmation, ConsensusEntry, ConsensusStatus,
    ContractData, ContractState, Events, Execution, Role, RoleBindings, SettlementInstruction,
    SettlementOp, Stage,
};

/// Identities allowed to create a payment mandate.
pub const ELIGIBLE_PARTIES: [&str; 5] = ["bank1", "bank1branch", "bank2", "bank2branch", "central"];

/// Whether `party` may call [`init`].
pub fn is_eligible(party: &PartyId) -> bool {
    ELIGIBLE_PARTIES.contains(&party.as_str())
}

// ─── Inputs ──────────────────────────────────────────────────────────

/// Registration decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Agree to the mandate.
    Agreed,
    /// Veto the mandate.
    Rejected,
}

impl From<Decision> for Confirmation {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Agreed => Confirmation::Agreed,
            Decision::Rejected => Confirmation::Rejected,
        }
    }
}

/// Input of [`register`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterInput {
    /// The caller's decision for all its roles.
    pub register: Decision,
}

/// Input of [`make_payment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MakePaymentInput {
    /// Reference of the new action.
    pub payment_reference: String,
    /// Execution mode.
    pub execution: Execution,
}

/// Input of [`confirm_actioned`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmActionedInput {
    /// Reference of the action the payer executed.
    pub payment_reference: String,
}

/// Input of [`confirm_payment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmPaymentInput {
    /// Reference of the action being confirmed.
    pub payment_reference: String,
}

// ─── init ────────────────────────────────────────────────────────────

/// Create the genesis state.
///
/// Roles, data and functions are taken verbatim; their shape is checked by
/// schema validation before this is called.
pub fn init(
    caller: &PartyId,
    contract_id: ContractId,
    roles: RoleBindings,
    data: ContractData,
    functions: Vec<String>,
) -> Result<ContractState, ContractFailure> {
    if !is_eligible(caller) {
        tracing::warn!(caller = %caller, contract_id = %contract_id, "init refused: caller not eligible");
        return Err(ContractFailure::Unauthorized {
            caller: caller.clone(),
            function: Function::Init,
            stage: None,
        });
    }
    tracing::debug!(caller = %caller, contract_id = %contract_id, "contract initialized");
    Ok(ContractState {
        id: contract_id,
        roles,
        data,
        functions,
        prior_hash: String::new(),
        state_hash: None,
    })
}

// ─── register ────────────────────────────────────────────────────────

/// Record the caller's decision on each of its roles.
///
/// A rejection by any role holder moves the contract to `rejected`.
/// Otherwise the contract becomes `agreed` once no role is waiting.
pub fn register(
    caller: &PartyId,
    caller_roles: &[Role],
    state: &ContractState,
    input: &RegisterInput,
) -> Result<ContractState, ContractFailure> {
    let function = Function::Register;
    verify_roles(caller, caller_roles, state, function)?;
    verify_flow(caller, caller_roles, state, function)?;
    let mut next = successor(state)?;

    for role in caller_roles {
        next.roles.get_mut(*role).confirmed = input.register.into();
    }

    if input.register == Decision::Rejected {
        next.data.status = Stage::Rejected;
    } else if next.roles.all_responded() {
        next.data.status = Stage::Agreed;
    }

    finish(caller, caller_roles, state, next, function)
}

// ─── makePayment ─────────────────────────────────────────────────────

/// Propose the payment action and move the contract to `instructed`.
///
/// The new action replaces any earlier `events.actions`; a contract tracks
/// one active payment at a time.
pub fn make_payment(
    caller: &PartyId,
    caller_roles: &[Role],
    state: &ContractState,
    input: &MakePaymentInput,
) -> Result<ContractState, ContractFailure> {
    let function = Function::MakePayment;
    verify_roles(caller, caller_roles, state, function)?;
    if state.find_action(&input.payment_reference).is_some() {
        tracing::warn!(
            contract_id = %state.id,
            reference = %input.payment_reference,
            "makePayment refused: duplicate reference"
        );
        return Err(ContractFailure::DuplicateReference {
            reference: input.payment_reference.clone(),
        });
    }
    verify_flow(caller, caller_roles, state, function)?;
    let mut next = successor(state)?;

    let payer = next.roles.party(Role::Payer).clone();
    let receiver = next.roles.party(Role::Receiver).clone();
    let instruction = settlement_instruction(&next.data);

    next.data.events = Some(Events {
        actions: vec![Action {
            kind: ActionKind::RlnCreate,
            reference: input.payment_reference.clone(),
            submitter: payer,
            status: ActionStatus::Proposed,
            consensus: vec![ConsensusEntry::unconfirmed(receiver)],
            atomic_group: vec![instruction],
            execution: input.execution,
        }],
    });
    next.data.status = Stage::Instructed;

    finish(caller, caller_roles, state, next, function)
}

fn settlement_instruction(data: &ContractData) -> SettlementInstruction {
    SettlementInstruction {
        action: SettlementOp::Create,
        from_account: data.payer_address.clone(),
        from_domain: data.payer_domain.clone(),
        from_participant: data.payer_partition.clone(),
        to_account: data.receiver_address.clone(),
        to_domain: data.receiver_domain.clone(),
        to_participant: data.receiver_partition.clone(),
        amount: data.amount,
        asset_id: data.asset_id.clone(),
    }
}

// ─── confirmActioned ─────────────────────────────────────────────────

/// The submitter reports that it executed the payment.
///
/// Moves the first proposed action with this reference whose submitter is
/// the caller to `actioned`. The stage does not change.
pub fn confirm_actioned(
    caller: &PartyId,
    caller_roles: &[Role],
    state: &ContractState,
    input: &ConfirmActionedInput,
) -> Result<ContractState, ContractFailure> {
    let function = Function::ConfirmActioned;
    verify_roles(caller, caller_roles, state, function)?;
    let index = state
        .actions()
        .iter()
        .position(|action| {
            action.reference == input.payment_reference
                && &action.submitter == caller
                && action.status == ActionStatus::Proposed
        })
        .ok_or_else(|| {
            tracing::warn!(
                contract_id = %state.id,
                caller = %caller,
                reference = %input.payment_reference,
                "confirmActioned refused: no proposed action for submitter"
            );
            ContractFailure::ReferenceNotFoundOrAlreadyActioned {
                reference: input.payment_reference.clone(),
                caller: caller.clone(),
            }
        })?;
    verify_flow(caller, caller_roles, state, function)?;
    let mut next = successor(state)?;

    let action = next
        .actions_mut()
        .get_mut(index)
        .ok_or_else(|| ContractFailure::internal("action index out of range"))?;
    action.status = ActionStatus::Actioned;

    finish(caller, caller_roles, state, next, function)
}

// ─── confirmPayment ──────────────────────────────────────────────────

/// Record the caller's confirmation on every action it participates in.
///
/// Every action is swept, not only the referenced one. An action whose
/// consensus entries are all confirmed becomes `confirmed`, whether or not
/// the submitter has reported it actioned; the contract is `complete` once
/// every action is.
pub fn confirm_payment(
    caller: &PartyId,
    caller_roles: &[Role],
    state: &ContractState,
    input: &ConfirmPaymentInput,
) -> Result<ContractState, ContractFailure> {
    let function = Function::ConfirmPayment;
    verify_roles(caller, caller_roles, state, function)?;
    if state.find_action(&input.payment_reference).is_none() {
        tracing::warn!(
            contract_id = %state.id,
            reference = %input.payment_reference,
            "confirmPayment refused: reference does not match"
        );
        return Err(ContractFailure::ReferenceMismatch {
            reference: input.payment_reference.clone(),
        });
    }
    verify_flow(caller, caller_roles, state, function)?;
    let mut next = successor(state)?;

    let mut complete = true;
    for action in next.actions_mut() {
        for entry in action
            .consensus
            .iter_mut()
            .filter(|entry| &entry.participant == caller)
        {
            entry.status = ConsensusStatus::Confirmed;
        }
        if action.is_fully_consented() {
            action.status = ActionStatus::Confirmed;
        }
        if action.status != ActionStatus::Confirmed {
            complete = false;
        }
    }
    if complete {
        next.data.status = Stage::Complete;
    }

    finish(caller, caller_roles, state, next, function)
}

// ─── Shared checks ───────────────────────────────────────────────────

fn unauthorized(caller: &PartyId, state: &ContractState, function: Function) -> ContractFailure {
    ContractFailure::Unauthorized {
        caller: caller.clone(),
        function,
        stage: Some(state.stage()),
    }
}

fn verify_roles(
    caller: &PartyId,
    caller_roles: &[Role],
    state: &ContractState,
    function: Function,
) -> Result<(), ContractFailure> {
    let holds_all = caller_roles
        .iter()
        .all(|role| state.roles.party(*role) == caller);
    if caller_roles.is_empty() || !holds_all {
        tracing::warn!(
            contract_id = %state.id,
            caller = %caller,
            function = %function,
            ?caller_roles,
            "refused: caller does not hold the claimed roles"
        );
        return Err(unauthorized(caller, state, function));
    }
    Ok(())
}

fn verify_flow(
    caller: &PartyId,
    caller_roles: &[Role],
    state: &ContractState,
    function: Function,
) -> Result<(), ContractFailure> {
    if !flow::is_permitted(state.stage(), caller_roles, function) {
        tracing::warn!(
            contract_id = %state.id,
            caller = %caller,
            function = %function,
            stage = %state.stage(),
            "refused by flow constraints"
        );
        return Err(unauthorized(caller, state, function));
    }
    Ok(())
}

/// Copy of `state` chained to it: `priorHash` is the predecessor's digest and
/// `stateHash` is cleared until the environment stamps the new state.
fn successor(state: &ContractState) -> Result<ContractState, ContractFailure> {
    let prior = state.state_hash.clone().ok_or_else(|| {
        ContractFailure::internal(format!(
            "state of contract {} carries no stateHash to chain from",
            state.id
        ))
    })?;
    let mut next = state.clone();
    next.prior_hash = prior;
    next.state_hash = None;
    Ok(next)
}

fn finish(
    caller: &PartyId,
    caller_roles: &[Role],
    before: &ContractState,
    next: ContractState,
    function: Function,
) -> Result<ContractState, ContractFailure> {
    let (from, to) = (before.stage(), next.stage());
    if !flow::is_legal_outcome(from, caller_roles, function, to) {
        return Err(ContractFailure::internal(format!(
            "{function} may not move contract {} from {from} to {to}",
            before.id
        )));
    }
    tracing::debug!(
        contract_id = %next.id,
        caller = %caller,
        function = %function,
        from = %from,
        to = %to,
        "transition applied"
    );
    Ok(next)
}

//! # Mandate Lifecycle
//!
//! Walks one contract from genesis to completion through the public API,
//! stamping each state the way the dispatcher does, and checks the hash
//! chain and every intermediate stage.

use mandate_contract::{
    confirm_actioned, confirm_payment, init, make_payment, register, stamp, ActionStatus,
    ConfirmActionedInput, ConfirmPaymentInput, ConsensusStatus, ContractData, ContractFailure,
    ContractState, Decision, Execution, MakePaymentInput, RegisterInput, RoleBinding,
    RoleBindings, Sha256StateHasher, Stage,
};
use mandate_core::{ContractId, PartyId};

fn stamped(state: ContractState) -> ContractState {
    stamp(&Sha256StateHasher, state).expect("state should hash")
}

fn genesis_data() -> ContractData {
    serde_json::from_value(serde_json::json!({
        "comment": "this is a comment",
        "payerDomain": "DOMAIN",
        "payerPartition": "DEMOUS01XXX",
        "payerAddress": "pa",
        "receiverDomain": "DOMAIN",
        "receiverPartition": "DEMOUS02XXX",
        "receiverAddress": "ra",
        "assetId": "USD",
        "amount": 1000,
        "status": "initialized"
    }))
    .expect("genesis data should parse")
}

fn register_as(state: &ContractState, who: &str) -> ContractState {
    let caller = PartyId::new(who);
    let roles = state.roles.roles_of(&caller);
    stamped(
        register(
            &caller,
            &roles,
            state,
            &RegisterInput {
                register: Decision::Agreed,
            },
        )
        .expect("register should succeed"),
    )
}

#[test]
fn full_mandate_lifecycle() {
    let roles = RoleBindings {
        payer: RoleBinding::waiting("bank1"),
        receiver: RoleBinding::waiting("bank2"),
        instructor: RoleBinding::waiting("central"),
    };
    let s0 = stamped(
        init(
            &PartyId::new("bank1"),
            ContractId::new("mandate-e2e"),
            roles,
            genesis_data(),
            vec!["register".into(), "makePayment".into()],
        )
        .expect("init should succeed"),
    );
    assert_eq!(s0.stage(), Stage::Initialized);
    assert_eq!(s0.prior_hash, "");

    let s1 = register_as(&s0, "bank1");
    let s2 = register_as(&s1, "bank2");
    assert_eq!(s2.stage(), Stage::Initialized);
    let s3 = register_as(&s2, "central");
    assert_eq!(s3.stage(), Stage::Agreed);

    let central = PartyId::new("central");
    let s4 = stamped(
        make_payment(
            &central,
            &s3.roles.roles_of(&central),
            &s3,
            &MakePaymentInput {
                payment_reference: "ref1".to_string(),
                execution: Execution::Manual,
            },
        )
        .expect("makePayment should succeed"),
    );
    assert_eq!(s4.stage(), Stage::Instructed);
    assert_eq!(s4.actions().len(), 1);
    assert_eq!(s4.actions()[0].status, ActionStatus::Proposed);
    assert_eq!(s4.actions()[0].submitter, "bank1");

    let bank1 = PartyId::new("bank1");
    let s5 = stamped(
        confirm_actioned(
            &bank1,
            &s4.roles.roles_of(&bank1),
            &s4,
            &ConfirmActionedInput {
                payment_reference: "ref1".to_string(),
            },
        )
        .expect("confirmActioned should succeed"),
    );
    assert_eq!(s5.actions()[0].status, ActionStatus::Actioned);

    let bank2 = PartyId::new("bank2");
    let s6 = stamped(
        confirm_payment(
            &bank2,
            &s5.roles.roles_of(&bank2),
            &s5,
            &ConfirmPaymentInput {
                payment_reference: "ref1".to_string(),
            },
        )
        .expect("confirmPayment should succeed"),
    );
    assert_eq!(s6.stage(), Stage::Complete);
    let entry = &s6.actions()[0].consensus[0];
    assert_eq!(entry.participant, "bank2");
    assert_eq!(entry.status, ConsensusStatus::Confirmed);

    let history = [&s0, &s1, &s2, &s3, &s4, &s5, &s6];
    for pair in history.windows(2) {
        assert_eq!(Some(&pair[1].prior_hash), pair[0].state_hash.as_ref());
    }
    for state in &history {
        assert_eq!(state.id, s0.id);
        assert_eq!(state.functions, s0.functions);
    }
}

#[test]
fn completed_contract_accepts_nothing() {
    let roles = RoleBindings {
        payer: RoleBinding::waiting("bank1"),
        receiver: RoleBinding::waiting("bank2"),
        instructor: RoleBinding::waiting("central"),
    };
    let s0 = stamped(
        init(&PartyId::new("central"), ContractId::new("m"), roles, genesis_data(), vec![]).unwrap(),
    );
    let s = register_as(&register_as(&register_as(&s0, "bank1"), "bank2"), "central");
    let central = PartyId::new("central");
    let s = stamped(
        make_payment(
            &central,
            &s.roles.roles_of(&central),
            &s,
            &MakePaymentInput {
                payment_reference: "r".to_string(),
                execution: Execution::Automatic,
            },
        )
        .unwrap(),
    );
    let bank1 = PartyId::new("bank1");
    let s = stamped(
        confirm_actioned(&bank1, &s.roles.roles_of(&bank1), &s, &ConfirmActionedInput {
            payment_reference: "r".to_string(),
        })
        .unwrap(),
    );
    let bank2 = PartyId::new("bank2");
    let done = stamped(
        confirm_payment(&bank2, &s.roles.roles_of(&bank2), &s, &ConfirmPaymentInput {
            payment_reference: "r".to_string(),
        })
        .unwrap(),
    );
    assert_eq!(done.stage(), Stage::Complete);

    let again = confirm_payment(&bank2, &done.roles.roles_of(&bank2), &done, &ConfirmPaymentInput {
        payment_reference: "r".to_string(),
    });
    assert!(matches!(
        again,
        Err(ContractFailure::Unauthorized {
            stage: Some(Stage::Complete),
            ..
        })
    ));
}

//! Property tests for registration: order independence of unanimous
//! agreement and finality of a single rejection.

use mandate_contract::{
    init, make_payment, register, stamp, ContractData, ContractState, Decision, Execution,
    MakePaymentInput, RegisterInput, Role, RoleBinding, RoleBindings, Sha256StateHasher, Stage,
};
use mandate_core::{ContractId, PartyId};
use proptest::prelude::*;

const PARTIES: [&str; 3] = ["bank1", "bank2", "central"];

fn genesis() -> ContractState {
    let data: ContractData = serde_json::from_value(serde_json::json!({
        "comment": "",
        "payerDomain": "DOMAIN",
        "payerPartition": "DEMOUS01XXX",
        "payerAddress": "pa",
        "receiverDomain": "DOMAIN",
        "receiverPartition": "DEMOUS02XXX",
        "receiverAddress": "ra",
        "assetId": "USD",
        "amount": 1,
        "status": "initialized"
    }))
    .unwrap();
    let roles = RoleBindings {
        payer: RoleBinding::waiting("bank1"),
        receiver: RoleBinding::waiting("bank2"),
        instructor: RoleBinding::waiting("central"),
    };
    let state = init(&PartyId::new("bank1"), ContractId::new("prop"), roles, data, vec![]).unwrap();
    stamp(&Sha256StateHasher, state).unwrap()
}

fn call_register(state: &ContractState, who: &str, decision: Decision) -> Option<ContractState> {
    let caller = PartyId::new(who);
    let roles = state.roles.roles_of(&caller);
    register(&caller, &roles, state, &RegisterInput { register: decision })
        .ok()
        .map(|s| stamp(&Sha256StateHasher, s).unwrap())
}

fn decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Agreed), Just(Decision::Rejected)]
}

proptest! {
    #[test]
    fn unanimous_agreement_in_any_order(order in Just(vec![0usize, 1, 2]).prop_shuffle()) {
        let mut state = genesis();
        for (i, idx) in order.iter().enumerate() {
            state = call_register(&state, PARTIES[*idx], Decision::Agreed).unwrap();
            if i < 2 {
                prop_assert_eq!(state.stage(), Stage::Initialized);
            }
        }
        prop_assert_eq!(state.stage(), Stage::Agreed);
    }

    #[test]
    fn one_rejection_is_permanent(
        calls in prop::collection::vec((0usize..3, decision()), 1..8),
    ) {
        let mut state = genesis();
        let mut rejected = false;
        for (idx, d) in calls {
            match call_register(&state, PARTIES[idx], d) {
                Some(next) => state = next,
                None => prop_assert!(rejected || state.stage() == Stage::Agreed),
            }
            if d == Decision::Rejected && !rejected && state.stage() == Stage::Rejected {
                rejected = true;
            }
            if rejected {
                prop_assert_eq!(state.stage(), Stage::Rejected);
            }
        }
        if rejected {
            let central = PartyId::new("central");
            let paid = make_payment(
                &central,
                &[Role::Instructor],
                &state,
                &MakePaymentInput { payment_reference: "x".to_string(), execution: Execution::Manual },
            );
            prop_assert!(paid.is_err());
        }
    }
}

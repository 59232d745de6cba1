//! # Scenario Runner
//!
//! `mandate run <scenario.yaml>` creates a contract from the scenario's
//! `genesis` block, applies its `steps` in order, checks each step's
//! optional `expect` block, and verifies the resulting hash chain.
//!
//! ```yaml
//! contract_id: mandate-demo
//! genesis:
//!   caller: bank1
//!   roles: { payer: { party: bank1, confirmed: waiting }, ... }
//!   data: { ... }
//! steps:
//!   - caller: bank1
//!     function: register
//!     input: { register: agreed }
//!     expect: { status: initialized }
//!   - caller: central
//!     function: makePayment
//!     input: { paymentReference: ref1, execution: manual }
//!     expect: { failed: DuplicateReference }
//! ```
//!
//! A refused step leaves the contract where it was; later steps continue
//! from the last accepted state.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use mandate_contract::{ContractState, Stage};
use mandate_core::{ContractId, PartyId};
use mandate_dispatch::{DispatchError, Dispatcher};
use serde::Deserialize;
use serde_json::Value;

use crate::config::CliConfig;
use crate::document::emit;

/// Arguments for `mandate run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario file (YAML or JSON).
    pub scenario: PathBuf,

    /// Write every accepted state to this directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Skip hash chain verification after the run.
    #[arg(long)]
    pub no_verify: bool,
}

/// A scripted contract session.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Contract id. A random UUID when omitted.
    #[serde(default)]
    pub contract_id: Option<String>,
    /// Genesis request.
    pub genesis: Genesis,
    /// Calls applied in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// The `init` request of a scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Genesis {
    /// Creating party.
    pub caller: String,
    /// Genesis roles document.
    pub roles: Value,
    /// Genesis data document.
    pub data: Value,
    /// Enabled functions; all when omitted.
    #[serde(default)]
    pub functions: Option<Vec<String>>,
}

/// One call of a scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Calling party.
    pub caller: String,
    /// Function wire name.
    pub function: String,
    /// Function input.
    #[serde(default = "empty_object")]
    pub input: Value,
    /// Expected outcome.
    #[serde(default)]
    pub expect: Option<Expectation>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Expected outcome of a step. Both fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Stage after the step.
    #[serde(default)]
    pub status: Option<Stage>,
    /// Failure code the step must be refused with.
    #[serde(default)]
    pub failed: Option<String>,
}

/// What happened at one step.
#[derive(Debug)]
pub struct StepOutcome {
    /// 1-based step number.
    pub number: usize,
    /// Calling party.
    pub caller: String,
    /// Function wire name.
    pub function: String,
    /// Stage after the step, or the refusal.
    pub result: Result<Stage, DispatchError>,
    /// Why the outcome did not meet the step's expectation.
    pub mismatch: Option<String>,
}

/// Result of running a scenario.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Accepted states, genesis first.
    pub states: Vec<ContractState>,
    /// One entry per step.
    pub steps: Vec<StepOutcome>,
}

impl ScenarioReport {
    /// Steps whose outcome did not meet their expectation.
    pub fn mismatches(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.mismatch.is_some())
    }

    /// Latest accepted state.
    pub fn head(&self) -> Option<&ContractState> {
        self.states.last()
    }
}

/// Load a scenario document.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let value = crate::document::read_value(path)?;
    serde_json::from_value(value).with_context(|| format!("{} is not a scenario", path.display()))
}

/// Run `scenario`. Fails only if genesis is refused.
pub fn execute(dispatcher: &Dispatcher, scenario: &Scenario) -> Result<ScenarioReport> {
    let contract_id = scenario
        .contract_id
        .as_deref()
        .map(ContractId::new)
        .unwrap_or_else(ContractId::generate);

    let genesis = dispatcher
        .init(
            &PartyId::new(scenario.genesis.caller.as_str()),
            contract_id,
            &scenario.genesis.roles,
            &scenario.genesis.data,
            scenario.genesis.functions.clone(),
        )
        .context("genesis refused")?;

    let mut states = vec![genesis];
    let mut steps = Vec::with_capacity(scenario.steps.len());

    for (i, step) in scenario.steps.iter().enumerate() {
        let head = states.last().context("scenario history is empty")?;
        let result = dispatcher.call_by_name(
            &PartyId::new(step.caller.as_str()),
            &step.function,
            head,
            &step.input,
        );
        let result = match result {
            Ok(next) => {
                let stage = next.stage();
                states.push(next);
                Ok(stage)
            }
            Err(err) => Err(err),
        };
        let mismatch = step
            .expect
            .as_ref()
            .and_then(|expect| check(expect, &result));
        steps.push(StepOutcome {
            number: i + 1,
            caller: step.caller.clone(),
            function: step.function.clone(),
            result,
            mismatch,
        });
    }

    Ok(ScenarioReport { states, steps })
}

fn check(expect: &Expectation, result: &Result<Stage, DispatchError>) -> Option<String> {
    match (result, expect.failed.as_deref()) {
        (Ok(stage), Some(code)) => Some(format!("expected failure {code}, got stage {stage}")),
        (Err(err), None) => Some(format!("unexpected failure {}: {err}", err.code())),
        (Err(err), Some(code)) if err.code() != code => {
            Some(format!("expected failure {code}, got {}: {err}", err.code()))
        }
        (Ok(stage), None) => match expect.status {
            Some(want) if want != *stage => Some(format!("expected stage {want}, got {stage}")),
            _ => None,
        },
        (Err(_), Some(_)) => None,
    }
}

/// Execute `mandate run`.
pub fn run_scenario(args: &RunArgs, config: &CliConfig) -> Result<u8> {
    let scenario = load_scenario(&args.scenario)?;
    let dispatcher = Dispatcher::new()?;
    let report = execute(&dispatcher, &scenario)?;

    for step in &report.steps {
        let outcome = match &step.result {
            Ok(stage) => stage.to_string(),
            Err(err) => format!("refused ({})", err.code()),
        };
        let marker = if step.mismatch.is_some() { "FAIL" } else { "ok" };
        println!(
            "  [{:>2}] {:<4} {} {} -> {}",
            step.number, marker, step.caller, step.function, outcome
        );
        if let Some(why) = &step.mismatch {
            println!("            {why}");
        }
    }

    if let Some(dir) = &args.out_dir {
        for (i, state) in report.states.iter().enumerate() {
            let path = dir.join(format!("{i:03}-{}.json", state.stage()));
            emit(state, Some(&path), config.pretty)?;
        }
        println!("  wrote {} states to {}", report.states.len(), dir.display());
    }

    if config.verify_chain && !args.no_verify {
        dispatcher
            .verify_chain(&report.states)
            .context("hash chain verification failed")?;
        println!("  hash chain verified ({} states)", report.states.len());
    }

    let failed = report.mismatches().count();
    if failed > 0 {
        bail!("{failed} of {} steps did not meet expectations", report.steps.len());
    }

    if let Some(head) = report.head() {
        println!("  final stage: {}", head.stage());
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
contract_id: mandate-test
genesis:
  caller: bank1
  roles:
    payer: { party: bank1, confirmed: waiting }
    receiver: { party: bank2, confirmed: waiting }
    instructor: { party: central, confirmed: waiting }
  data:
    comment: ""
    payerDomain: DOMAIN
    payerPartition: DEMOUS01XXX
    payerAddress: pa
    receiverDomain: DOMAIN
    receiverPartition: DEMOUS02XXX
    receiverAddress: ra
    assetId: USD
    amount: 1000
    status: initialized
steps:
  - caller: bank1
    function: register
    input: { register: agreed }
    expect: { status: initialized }
  - caller: central
    function: makePayment
    input: { paymentReference: ref1, execution: manual }
    expect: { failed: Unauthorized }
  - caller: bank2
    function: register
    input: { register: agreed }
  - caller: central
    function: register
    input: { register: agreed }
    expect: { status: agreed }
"#;

    fn scenario(yaml: &str) -> Scenario {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        serde_json::from_value(mandate_schema::yaml_to_json_value(&value).unwrap()).unwrap()
    }

    #[test]
    fn expectations_are_checked_per_step() {
        let report = execute(&Dispatcher::new().unwrap(), &scenario(SCENARIO)).unwrap();
        assert_eq!(report.steps.len(), 4);
        assert_eq!(report.mismatches().count(), 0);
        // Genesis plus three accepted steps.
        assert_eq!(report.states.len(), 4);
        assert_eq!(report.head().unwrap().stage(), Stage::Agreed);
        assert_eq!(report.head().unwrap().id.as_str(), "mandate-test");
    }

    #[test]
    fn each_step_runs_against_latest_accepted_state() {
        let report = execute(&Dispatcher::new().unwrap(), &scenario(SCENARIO)).unwrap();
        for pair in report.states.windows(2) {
            assert_eq!(Some(&pair[1].prior_hash), pair[0].state_hash.as_ref());
        }
        // The refused makePayment left no state behind.
        assert!(report.states.iter().all(|s| s.actions().is_empty()));
    }

    #[test]
    fn wrong_expectation_is_reported() {
        let yaml = SCENARIO.replace("expect: { status: agreed }", "expect: { status: rejected }");
        let report = execute(&Dispatcher::new().unwrap(), &scenario(&yaml)).unwrap();
        let mismatches: Vec<_> = report.mismatches().collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].number, 4);
    }

    #[test]
    fn refused_genesis_is_an_error() {
        let yaml = SCENARIO.replacen("caller: bank1", "caller: mallory", 1);
        assert!(execute(&Dispatcher::new().unwrap(), &scenario(&yaml)).is_err());
    }

    #[test]
    fn check_covers_each_combination() {
        let refused: Result<Stage, DispatchError> = Err(DispatchError::InitNotCallable);
        let accepted: Result<Stage, DispatchError> = Ok(Stage::Agreed);
        let want_failure = Expectation {
            status: None,
            failed: Some("InitNotCallable".to_string()),
        };
        let want_agreed = Expectation {
            status: Some(Stage::Agreed),
            failed: None,
        };
        assert!(check(&want_failure, &refused).is_none());
        assert!(check(&want_failure, &accepted).is_some());
        assert!(check(&want_agreed, &accepted).is_none());
        assert!(check(&want_agreed, &refused).is_some());
        assert!(check(&Expectation::default(), &accepted).is_none());
    }
}

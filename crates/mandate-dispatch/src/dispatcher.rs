//! # Dispatcher
//!
//! Drives the Payment Mandate contract from untyped JSON. For every request
//! the dispatcher validates the input against its schema, derives the
//! caller's roles from the state, checks the incoming state's `stateHash`,
//! runs the transition, and stamps the successor.
//!
//! ## Call Pipeline
//!
//! ```text
//! function name ─▶ enabled? ─▶ input schema ─▶ caller roles ─▶ stateHash ─▶ transition ─▶ stamp
//! ```
//!
//! Each step fails with its own [`DispatchError`] variant. Flow table
//! checks belong to the transition itself, so contract refusals surface as
//! [`DispatchError::Contract`] with their original kind.

use mandate_contract::{
    confirm_actioned, confirm_payment, init, make_payment, register, stamp, ConfirmActionedInput,
    ConfirmPaymentInput, ContractData, ContractState, Function, MakePaymentInput, RegisterInput,
    RoleBindings, Sha256StateHasher, StateHasher, CONTRACT_DESCRIPTION, CONTRACT_NAME,
};
use mandate_core::{ContractId, PartyId};
use mandate_schema::{input_schema, SchemaValidator, GENESIS_DATA, GENESIS_ROLES};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::chain::StateChain;
use crate::error::DispatchError;

/// Executes Payment Mandate functions against JSON inputs.
#[derive(Debug, Clone)]
pub struct Dispatcher<H: StateHasher = Sha256StateHasher> {
    hasher: H,
    schemas: SchemaValidator,
}

impl Dispatcher {
    /// A dispatcher with SHA-256 hashing and the built-in schemas.
    pub fn new() -> Result<Self, DispatchError> {
        Self::with_hasher(Sha256StateHasher)
    }
}

impl<H: StateHasher> Dispatcher<H> {
    /// A dispatcher with a custom hasher and the built-in schemas.
    pub fn with_hasher(hasher: H) -> Result<Self, DispatchError> {
        Ok(Self::with_schemas(hasher, SchemaValidator::builtin()?))
    }

    /// A dispatcher with a custom hasher and schema set.
    pub fn with_schemas(hasher: H, schemas: SchemaValidator) -> Self {
        Self { hasher, schemas }
    }

    /// Registered name of the contract.
    pub fn contract_name(&self) -> &'static str {
        CONTRACT_NAME
    }

    /// One-line description of the contract.
    pub fn description(&self) -> &'static str {
        CONTRACT_DESCRIPTION
    }

    /// Look up a contract by registered name.
    pub fn resolve(&self, name: &str) -> Result<&Self, DispatchError> {
        if name == CONTRACT_NAME {
            Ok(self)
        } else {
            Err(DispatchError::UnknownContract {
                name: name.to_string(),
            })
        }
    }

    /// The hasher used to stamp and check states.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// The schemas inputs are validated against.
    pub fn schemas(&self) -> &SchemaValidator {
        &self.schemas
    }

    /// Create and stamp a genesis state.
    ///
    /// `functions` defaults to every function name.
    pub fn init(
        &self,
        caller: &PartyId,
        contract_id: ContractId,
        roles: &Value,
        data: &Value,
        functions: Option<Vec<String>>,
    ) -> Result<ContractState, DispatchError> {
        self.schemas.validate_document(roles, GENESIS_ROLES)?;
        self.schemas.validate_document(data, GENESIS_DATA)?;
        let roles: RoleBindings = read(roles, "genesis roles")?;
        let data: ContractData = read(data, "genesis data")?;
        let functions = functions.unwrap_or_else(|| {
            Function::ALL
                .iter()
                .map(|f| f.as_str().to_string())
                .collect()
        });

        let genesis = init(caller, contract_id, roles, data, functions)?;
        let genesis = stamp(&self.hasher, genesis)?;
        tracing::info!(
            contract_id = %genesis.id,
            caller = %caller,
            state_hash = genesis.state_hash.as_deref().unwrap_or_default(),
            "contract created"
        );
        Ok(genesis)
    }

    /// Call a function by wire name.
    pub fn call_by_name(
        &self,
        caller: &PartyId,
        function: &str,
        state: &ContractState,
        input: &Value,
    ) -> Result<ContractState, DispatchError> {
        let function = Function::from_name(function).ok_or_else(|| {
            DispatchError::UnknownFunction {
                name: function.to_string(),
            }
        })?;
        self.call(caller, function, state, input)
    }

    /// Apply `function` to `state` on behalf of `caller` and stamp the result.
    pub fn call(
        &self,
        caller: &PartyId,
        function: Function,
        state: &ContractState,
        input: &Value,
    ) -> Result<ContractState, DispatchError> {
        let result = self.dispatch(caller, function, state, input);
        match &result {
            Ok(next) => tracing::info!(
                contract_id = %next.id,
                caller = %caller,
                function = %function,
                stage = %next.stage(),
                "call applied"
            ),
            Err(err) => tracing::warn!(
                contract_id = %state.id,
                caller = %caller,
                function = %function,
                code = err.code(),
                error = %err,
                "call refused"
            ),
        }
        result
    }

    fn dispatch(
        &self,
        caller: &PartyId,
        function: Function,
        state: &ContractState,
        input: &Value,
    ) -> Result<ContractState, DispatchError> {
        let schema = input_schema(function.as_str()).ok_or(DispatchError::InitNotCallable)?;
        if !state.functions.iter().any(|f| f == function.as_str()) {
            return Err(DispatchError::FunctionNotEnabled {
                function,
                contract_id: state.id.clone(),
            });
        }

        self.schemas.validate_document(input, schema)?;

        let roles = state.roles.roles_of(caller);
        if roles.is_empty() {
            return Err(DispatchError::NotAParty {
                caller: caller.clone(),
                contract_id: state.id.clone(),
            });
        }

        self.check_stamp(state)?;

        let next = match function {
            Function::Init => return Err(DispatchError::InitNotCallable),
            Function::Register => {
                register(caller, &roles, state, &read::<RegisterInput>(input, "register input")?)?
            }
            Function::MakePayment => make_payment(
                caller,
                &roles,
                state,
                &read::<MakePaymentInput>(input, "makePayment input")?,
            )?,
            Function::ConfirmActioned => confirm_actioned(
                caller,
                &roles,
                state,
                &read::<ConfirmActionedInput>(input, "confirmActioned input")?,
            )?,
            Function::ConfirmPayment => confirm_payment(
                caller,
                &roles,
                state,
                &read::<ConfirmPaymentInput>(input, "confirmPayment input")?,
            )?,
        };

        Ok(stamp(&self.hasher, next)?)
    }

    fn check_stamp(&self, state: &ContractState) -> Result<(), DispatchError> {
        let expected = self.hasher.digest(state)?.to_hex();
        match state.state_hash.as_deref() {
            Some(stored) if stored == expected => Ok(()),
            stored => Err(DispatchError::HashMismatch {
                contract_id: state.id.clone(),
                expected,
                actual: stored.unwrap_or("(absent)").to_string(),
            }),
        }
    }

    /// Verify that `states` form one unbroken, untampered history.
    pub fn verify_chain(&self, states: &[ContractState]) -> Result<(), DispatchError> {
        match StateChain::from_states(&self.hasher, states) {
            Ok(chain) => {
                tracing::debug!(contract_id = %chain.id(), length = chain.len(), "chain verified");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "chain verification failed");
                Err(err.into())
            }
        }
    }
}

fn read<T: DeserializeOwned>(value: &Value, what: &'static str) -> Result<T, DispatchError> {
    serde_json::from_value(value.clone()).map_err(|source| DispatchError::Deserialize { what, source })
}

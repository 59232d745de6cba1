//! # Flow Constraint Table
//!
//! For every stage, which role may call which function and which stages the
//! call may lead to.
//!
//! ```text
//!               payer              receiver           instructor
//! initialized   register           register           register        -> agreed | rejected | initialized
//! agreed        -                  -                  makePayment     -> instructed
//! instructed    confirmActioned    confirmPayment     -               -> instructed | complete
//! complete      -                  -                  -
//! rejected      -                  -                  -
//! ```
//!
//! The dispatcher consults the table before calling a transition, and every
//! transition re-checks it, so a direct caller cannot skip it.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::model::{Role, Stage};

/// Name of a contract function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Function {
    /// Create the genesis state.
    Init,
    /// Agree to or reject the mandate.
    Register,
    /// Instruct the payment.
    MakePayment,
    /// Payer reports the payment executed.
    ConfirmActioned,
    /// Receiver confirms settlement.
    ConfirmPayment,
}

impl Function {
    /// All contract functions.
    pub const ALL: [Function; 5] = [
        Function::Init,
        Function::Register,
        Function::MakePayment,
        Function::ConfirmActioned,
        Function::ConfirmPayment,
    ];

    /// The wire name of the function.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Register => "register",
            Self::MakePayment => "makePayment",
            Self::ConfirmActioned => "confirmActioned",
            Self::ConfirmPayment => "confirmPayment",
        }
    }

    /// Look up a function by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Function {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown contract function {s:?}"))
    }
}

/// What one role may do in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowConstraint {
    /// Functions the role may call.
    pub actions: &'static [Function],
    /// Stages the call may lead to.
    pub outcomes: &'static [Stage],
}

const NOTHING: FlowConstraint = FlowConstraint {
    actions: &[],
    outcomes: &[],
};

const REGISTER: FlowConstraint = FlowConstraint {
    actions: &[Function::Register],
    outcomes: &[Stage::Agreed, Stage::Rejected, Stage::Initialized],
};

impl FlowConstraint {
    /// Whether the role may call `function`.
    pub fn permits(&self, function: Function) -> bool {
        self.actions.contains(&function)
    }

    /// Whether nothing is permitted.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// The constraint for `role` in `stage`.
pub fn constraint(stage: Stage, role: Role) -> FlowConstraint {
    match (stage, role) {
        (Stage::Initialized, _) => REGISTER,
        (Stage::Agreed, Role::Instructor) => FlowConstraint {
            actions: &[Function::MakePayment],
            outcomes: &[Stage::Instructed],
        },
        (Stage::Instructed, Role::Payer) => FlowConstraint {
            actions: &[Function::ConfirmActioned],
            outcomes: &[Stage::Instructed],
        },
        (Stage::Instructed, Role::Receiver) => FlowConstraint {
            actions: &[Function::ConfirmPayment],
            outcomes: &[Stage::Complete],
        },
        _ => NOTHING,
    }
}

/// Whether any of `roles` may call `function` in `stage`.
pub fn is_permitted(stage: Stage, roles: &[Role], function: Function) -> bool {
    roles
        .iter()
        .any(|role| constraint(stage, *role).permits(function))
}

/// Whether a call of `function` by `roles` may move `from` to `to`.
///
/// Leaving the stage unchanged is always within bounds; a stage change must
/// be listed by a role that permits the function.
pub fn is_legal_outcome(from: Stage, roles: &[Role], function: Function, to: Stage) -> bool {
    if from == to {
        return true;
    }
    roles.iter().any(|role| {
        let c = constraint(from, *role);
        c.permits(function) && c.outcomes.contains(&to)
    })
}

/// The whole table, serializable as
/// `{stage: {role: {actions: [...], outcomes: [...]}}}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowTable;

impl FlowTable {
    /// The constraint for `role` in `stage`.
    pub fn get(&self, stage: Stage, role: Role) -> FlowConstraint {
        constraint(stage, role)
    }
}

struct StageRow(Stage);

impl Serialize for StageRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Role::ALL.len()))?;
        for role in Role::ALL {
            map.serialize_entry(&role, &constraint(self.0, role))?;
        }
        map.end()
    }
}

impl Serialize for FlowTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Stage::ALL.len()))?;
        for stage in Stage::ALL {
            map.serialize_entry(&stage, &StageRow(stage))?;
        }
        map.end()
    }
}

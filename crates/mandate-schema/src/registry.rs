//! # Schema Registry
//!
//! The schemas compiled into this crate, the names callers use to address
//! them, and a strictness audit over their object definitions.
//!
//! Every object a caller can supply (genesis roles, genesis data, and the
//! four transition inputs) must be closed with `additionalProperties: false`,
//! so an unexpected field is rejected at the boundary instead of being
//! silently dropped by deserialization.

use serde_json::Value;

/// Genesis role bindings supplied to `init`.
pub const GENESIS_ROLES: &str = "genesis-roles.schema.json";
/// Genesis contract data supplied to `init`.
pub const GENESIS_DATA: &str = "genesis-data.schema.json";
/// Input of `register`.
pub const REGISTER: &str = "register.schema.json";
/// Input of `makePayment`.
pub const MAKE_PAYMENT: &str = "make-payment.schema.json";
/// Input of `confirmActioned`.
pub const CONFIRM_ACTIONED: &str = "confirm-actioned.schema.json";
/// Input of `confirmPayment`.
pub const CONFIRM_PAYMENT: &str = "confirm-payment.schema.json";
/// Eligible party identifiers.
pub const PARTY: &str = "party.schema.json";
/// Known account partitions.
pub const PARTITION: &str = "partition.schema.json";

/// `(filename, contents)` of every embedded schema.
pub const BUILTIN_SCHEMAS: &[(&str, &str)] = &[
    (PARTY, include_str!("../schemas/party.schema.json")),
    (PARTITION, include_str!("../schemas/partition.schema.json")),
    (GENESIS_ROLES, include_str!("../schemas/genesis-roles.schema.json")),
    (GENESIS_DATA, include_str!("../schemas/genesis-data.schema.json")),
    (REGISTER, include_str!("../schemas/register.schema.json")),
    (MAKE_PAYMENT, include_str!("../schemas/make-payment.schema.json")),
    (CONFIRM_ACTIONED, include_str!("../schemas/confirm-actioned.schema.json")),
    (CONFIRM_PAYMENT, include_str!("../schemas/confirm-payment.schema.json")),
];

/// Schemas describing caller-supplied objects. Each must be closed.
pub const CALLER_SUPPLIED_SCHEMAS: &[&str] = &[
    GENESIS_ROLES,
    GENESIS_DATA,
    REGISTER,
    MAKE_PAYMENT,
    CONFIRM_ACTIONED,
    CONFIRM_PAYMENT,
];

/// Schema for the input of the transition function with wire name `function`.
///
/// Returns `None` for `init`, whose input is validated as genesis roles and
/// data instead, and for unknown names.
pub fn input_schema(function: &str) -> Option<&'static str> {
    match function {
        "register" => Some(REGISTER),
        "makePayment" => Some(MAKE_PAYMENT),
        "confirmActioned" => Some(CONFIRM_ACTIONED),
        "confirmPayment" => Some(CONFIRM_PAYMENT),
        _ => None,
    }
}

/// An object definition that accepts properties it does not declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenObjectFinding {
    /// JSON Pointer to the offending object definition.
    pub json_path: String,
    /// Current `additionalProperties` value.
    pub current_value: String,
}

impl std::fmt::Display for OpenObjectFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "  {}: additionalProperties is {}",
            self.json_path, self.current_value
        )
    }
}

/// Find every object definition in `schema` that is not closed.
///
/// An object definition is any subschema with `"type": "object"` or a
/// `properties` map. `$defs` and nested `properties` are walked.
pub fn audit_closed_objects(schema: &Value) -> Vec<OpenObjectFinding> {
    let mut findings = Vec::new();
    walk(schema, "", &mut findings);
    findings
}

fn walk(schema: &Value, path: &str, findings: &mut Vec<OpenObjectFinding>) {
    let is_object = schema.get("type").and_then(Value::as_str) == Some("object")
        || schema.get("properties").is_some();

    if is_object {
        match schema.get("additionalProperties") {
            Some(Value::Bool(false)) => {}
            Some(other) => findings.push(OpenObjectFinding {
                json_path: format!("{path}/additionalProperties"),
                current_value: other.to_string(),
            }),
            None => findings.push(OpenObjectFinding {
                json_path: format!("{path}/additionalProperties"),
                current_value: "(absent, defaults to true)".to_string(),
            }),
        }
    }

    for container in ["properties", "$defs"] {
        if let Some(Value::Object(children)) = schema.get(container) {
            for (name, child) in children {
                walk(child, &format!("{path}/{container}/{name}"), findings);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(name: &str) -> Value {
        let (_, content) = BUILTIN_SCHEMAS
            .iter()
            .find(|(n, _)| *n == name)
            .expect("schema is embedded");
        serde_json::from_str(content).expect("schema is valid JSON")
    }

    #[test]
    fn test_every_caller_supplied_schema_is_closed() {
        for name in CALLER_SUPPLIED_SCHEMAS {
            let findings = audit_closed_objects(&parsed(name));
            assert!(
                findings.is_empty(),
                "{name} has open objects:\n{}",
                findings
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            );
        }
    }

    #[test]
    fn test_ids_match_filenames() {
        for (name, _) in BUILTIN_SCHEMAS {
            let id = parsed(name)["$id"].as_str().unwrap_or_default().to_string();
            assert_eq!(id, format!("{}{name}", crate::SCHEMA_URI_PREFIX));
        }
    }

    #[test]
    fn test_audit_flags_open_and_absent() {
        let schema = json!({
            "type": "object",
            "properties": {
                "inner": { "type": "object", "additionalProperties": true }
            }
        });
        let findings = audit_closed_objects(&schema);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].json_path, "/additionalProperties");
        assert_eq!(findings[1].json_path, "/properties/inner/additionalProperties");
        assert_eq!(findings[1].current_value, "true");
    }

    #[test]
    fn test_input_schema_mapping() {
        assert_eq!(input_schema("register"), Some(REGISTER));
        assert_eq!(input_schema("confirmPayment"), Some(CONFIRM_PAYMENT));
        assert_eq!(input_schema("init"), None);
        assert_eq!(input_schema("transfer"), None);
    }
}

//! # mandate-schema — Boundary Validation
//!
//! JSON Schemas (Draft 2020-12) for everything a caller hands to the
//! Payment Mandate contract, and a validator that reports every violation
//! with its instance path.
//!
//! ## Modules
//!
//! - [`registry`]: the embedded schemas, their names, the
//!   function-to-input-schema mapping, and the closed-object audit.
//! - [`validate`]: [`SchemaValidator`], loading schemas either from the
//!   embedded set or from a directory, and validating JSON or YAML
//!   documents against them.
//!
//! ## Crate Policy
//!
//! - No internal dependencies. Functions are addressed by wire name.
//! - Schema `$id` URIs are `SCHEMA_URI_PREFIX` + filename and must stay so;
//!   cross-schema `$ref`s resolve through them.

pub mod registry;
pub mod validate;

pub use registry::{
    audit_closed_objects, input_schema, OpenObjectFinding, BUILTIN_SCHEMAS,
    CALLER_SUPPLIED_SCHEMAS, CONFIRM_ACTIONED, CONFIRM_PAYMENT, GENESIS_DATA, GENESIS_ROLES,
    MAKE_PAYMENT, PARTITION, PARTY, REGISTER,
};
pub use validate::{
    load_document, yaml_to_json_value, SchemaValidationError, SchemaValidator,
    ValidationViolations, Violation, SCHEMA_URI_PREFIX,
};

//! # Schema Validation
//!
//! Validates genesis roles, genesis data and transition inputs against their
//! JSON Schemas (Draft 2020-12) before anything reaches the contract engine.
//!
//! ## Schema Resolution
//!
//! Every schema has an `$id` of the form
//! `https://schemas.payment-mandate.dev/mandate/<filename>`. Cross-schema
//! `$ref`s (e.g. to `party.schema.json`) are resolved from the loaded set by
//! a local retriever; nothing is fetched over the network.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::registry::BUILTIN_SCHEMAS;

/// URI prefix of every schema `$id`.
pub const SCHEMA_URI_PREFIX: &str = "https://schemas.payment-mandate.dev/mandate/";

/// Resolves `$ref` URIs to schemas already loaded in memory.
struct LocalSchemaRetriever {
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.schemas_by_uri.get(filename) {
            return Ok(value.clone());
        }

        Err(format!("unresolvable schema reference {uri_str}").into())
    }
}

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The schema could not be found or parsed.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema filename.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The document file could not be loaded or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError {
        /// Path to the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// The compiled validator could not be built.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema filename.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// IO error reading a schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single validation violation.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A validator over a set of named schemas.
///
/// `SchemaValidator` is `Send + Sync` and holds parsed schemas only;
/// compiled validators are built per call.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    /// Where the schemas came from, `None` for the built-in set.
    source_dir: Option<PathBuf>,
    /// Schema filename (e.g. `register.schema.json`) to parsed value.
    schemas: HashMap<String, Value>,
}

impl SchemaValidator {
    /// The schemas compiled into this crate.
    ///
    /// # Errors
    ///
    /// Returns `SchemaLoadError` if an embedded schema is not valid JSON.
    pub fn builtin() -> Result<Self, SchemaValidationError> {
        let mut schemas = HashMap::new();
        for (name, content) in BUILTIN_SCHEMAS {
            let value: Value = serde_json::from_str(content).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    schema_name: name.to_string(),
                    reason: format!("invalid JSON: {e}"),
                }
            })?;
            schemas.insert(name.to_string(), value);
        }
        Ok(Self {
            source_dir: None,
            schemas,
        })
    }

    /// Load every `*.schema.json` file in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaLoadError` if the directory cannot be read or a schema
    /// file is not valid JSON.
    pub fn from_dir(schema_dir: impl AsRef<Path>) -> Result<Self, SchemaValidationError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut schemas = HashMap::new();

        let entries = std::fs::read_dir(&schema_dir).map_err(|e| {
            SchemaValidationError::SchemaLoadError {
                schema_name: schema_dir.display().to_string(),
                reason: format!("cannot read schema directory: {e}"),
            }
        })?;

        for entry in entries {
            let path = entry?.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".schema.json") {
                    let content = std::fs::read_to_string(&path)?;
                    let value: Value = serde_json::from_str(&content).map_err(|e| {
                        SchemaValidationError::SchemaLoadError {
                            schema_name: name.to_string(),
                            reason: format!("invalid JSON: {e}"),
                        }
                    })?;
                    schemas.insert(name.to_string(), value);
                }
            }
        }

        tracing::debug!(dir = %schema_dir.display(), count = schemas.len(), "loaded schemas");
        Ok(Self {
            source_dir: Some(schema_dir),
            schemas,
        })
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Names of all loaded schemas, sorted.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Look up a loaded schema by filename.
    pub fn get_schema(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);

        let mut schemas_by_uri: HashMap<String, Value> = HashMap::new();
        for (filename, value) in &self.schemas {
            schemas_by_uri.insert(format!("{SCHEMA_URI_PREFIX}{filename}"), value.clone());
            if let Some(id_str) = value.get("$id").and_then(|v| v.as_str()) {
                schemas_by_uri.insert(id_str.to_string(), value.clone());
            }
            schemas_by_uri.insert(filename.clone(), value.clone());
        }

        opts.with_retriever(LocalSchemaRetriever { schemas_by_uri });
        opts
    }

    /// Compile the validator for one schema.
    ///
    /// # Errors
    ///
    /// `SchemaLoadError` if the schema is unknown, `ValidatorBuildError` if it
    /// does not compile.
    pub fn build_validator(&self, schema_name: &str) -> Result<Validator, SchemaValidationError> {
        let schema_value = self.schemas.get(schema_name).ok_or_else(|| {
            SchemaValidationError::SchemaLoadError {
                schema_name: schema_name.to_string(),
                reason: match &self.source_dir {
                    Some(dir) => format!("schema not found in {}", dir.display()),
                    None => "schema not among the built-in schemas".to_string(),
                },
            }
        })?;

        self.build_options().build(schema_value).map_err(|e| {
            SchemaValidationError::ValidatorBuildError {
                schema_name: schema_name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` with every violation if the document is invalid.
    pub fn validate_document(
        &self,
        instance: &Value,
        schema_name: &str,
    ) -> Result<(), SchemaValidationError> {
        let validator = self.build_validator(schema_name)?;

        let errors: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(schema = schema_name, violations = errors.len(), "document rejected");
            Err(SchemaValidationError::ValidationFailed {
                schema_name: schema_name.to_string(),
                violations: ValidationViolations { violations: errors },
            })
        }
    }

    /// Validate a YAML or JSON file against a named schema.
    ///
    /// The format is chosen by extension: `.yaml`/`.yml` are YAML, everything
    /// else is JSON.
    pub fn validate_file(
        &self,
        document_path: &Path,
        schema_name: &str,
    ) -> Result<(), SchemaValidationError> {
        let value = load_document(document_path)?;
        self.validate_document(&value, schema_name)
    }
}

/// Read a YAML or JSON document into a JSON value.
///
/// # Errors
///
/// `DocumentLoadError` if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> Result<Value, SchemaValidationError> {
    let load_error = |reason: String| SchemaValidationError::DocumentLoadError {
        path: path.display().to_string(),
        reason,
    };

    let content =
        std::fs::read_to_string(path).map_err(|e| load_error(format!("cannot read file: {e}")))?;

    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| load_error(format!("invalid YAML: {e}")))?;
            yaml_to_json_value(&yaml)
                .map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))
        }
        _ => serde_json::from_str(&content).map_err(|e| load_error(format!("invalid JSON: {e}"))),
    }
}

/// Convert a `serde_yaml::Value` into the equivalent `serde_json::Value`.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{GENESIS_DATA, GENESIS_ROLES, MAKE_PAYMENT, REGISTER};
    use serde_json::json;

    fn validator() -> SchemaValidator {
        SchemaValidator::builtin().unwrap()
    }

    fn genesis_data() -> Value {
        json!({
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
        })
    }

    #[test]
    fn test_builtin_schemas_all_compile() {
        let v = validator();
        assert_eq!(v.schema_count(), BUILTIN_SCHEMAS.len());
        let failures: Vec<String> = v
            .schema_names()
            .into_iter()
            .filter_map(|name| v.build_validator(name).err().map(|e| format!("{name}: {e}")))
            .collect();
        assert!(failures.is_empty(), "{}", failures.join("\n"));
    }

    #[test]
    fn test_valid_genesis_data() {
        validator().validate_document(&genesis_data(), GENESIS_DATA).unwrap();
    }

    #[test]
    fn test_genesis_data_unknown_partition_rejected() {
        let mut doc = genesis_data();
        doc["payerPartition"] = json!("DEMOUS01XXX - bank1");
        let err = validator().validate_document(&doc, GENESIS_DATA).unwrap_err();
        match err {
            SchemaValidationError::ValidationFailed { violations, .. } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations.violations()[0].instance_path, "/payerPartition");
            }
            other => panic!("Expected ValidationFailed, got: {other}"),
        }
    }

    #[test]
    fn test_genesis_data_extra_field_rejected() {
        let mut doc = genesis_data();
        doc["currency"] = json!("USD");
        assert!(validator().validate_document(&doc, GENESIS_DATA).is_err());
    }

    #[test]
    fn test_genesis_data_float_amount_rejected() {
        let mut doc = genesis_data();
        doc["amount"] = json!(10.5);
        assert!(validator().validate_document(&doc, GENESIS_DATA).is_err());
    }

    #[test]
    fn test_genesis_data_must_start_initialized() {
        let mut doc = genesis_data();
        doc["status"] = json!("agreed");
        assert!(validator().validate_document(&doc, GENESIS_DATA).is_err());
    }

    #[test]
    fn test_genesis_roles_cross_ref_party() {
        let v = validator();
        let ok = json!({
            "payer": {"party": "bank1", "confirmed": "waiting"},
            "receiver": {"party": "bank2", "confirmed": "waiting"},
            "instructor": {"party": "central", "confirmed": "waiting"}
        });
        v.validate_document(&ok, GENESIS_ROLES).unwrap();

        let mut bad = ok.clone();
        bad["receiver"]["party"] = json!("mallory");
        assert!(v.validate_document(&bad, GENESIS_ROLES).is_err());

        let mut pre_agreed = ok;
        pre_agreed["payer"]["confirmed"] = json!("agreed");
        assert!(v.validate_document(&pre_agreed, GENESIS_ROLES).is_err());
    }

    #[test]
    fn test_input_schemas() {
        let v = validator();
        v.validate_document(&json!({"register": "agreed"}), REGISTER).unwrap();
        assert!(v.validate_document(&json!({"register": "maybe"}), REGISTER).is_err());
        v.validate_document(
            &json!({"paymentReference": "ref1", "execution": "automatic"}),
            MAKE_PAYMENT,
        )
        .unwrap();
        assert!(v
            .validate_document(&json!({"paymentReference": "ref1"}), MAKE_PAYMENT)
            .is_err());
    }

    #[test]
    fn test_unknown_schema_is_load_error() {
        let err = validator()
            .validate_document(&json!({}), "nonexistent.schema.json")
            .unwrap_err();
        assert!(matches!(err, SchemaValidationError::SchemaLoadError { .. }));
    }

    #[test]
    fn test_yaml_to_json_conversion() {
        let yaml: serde_yaml::Value = serde_yaml::from_str(
            "register: agreed\namount: 42\nflag: true\nitems:\n  - one\n",
        )
        .unwrap();
        let value = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(value["register"], "agreed");
        assert_eq!(value["amount"], 42);
        assert_eq!(value["flag"], true);
        assert_eq!(value["items"][0], "one");
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/required".to_string(),
            message: r#""register" is a required property"#.to_string(),
        };
        assert!(v.to_string().contains("(root)"));
    }
}

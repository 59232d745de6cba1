//! Reading inputs and writing results.

use std::path::Path;

use anyhow::{Context, Result};
use mandate_contract::ContractState;
use serde::Serialize;
use serde_json::Value;

/// Read a JSON or YAML document.
pub fn read_value(path: &Path) -> Result<Value> {
    mandate_schema::load_document(path).with_context(|| format!("reading {}", path.display()))
}

/// Read a contract state.
pub fn read_state(path: &Path) -> Result<ContractState> {
    let value = read_value(path)?;
    serde_json::from_value(value)
        .with_context(|| format!("{} is not a contract state", path.display()))
}

/// Interpret `arg` as inline JSON if it parses as such, else as a file path.
pub fn read_inline_or_file(arg: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(arg) {
        Ok(value) if value.is_object() => Ok(value),
        _ => read_value(Path::new(arg)),
    }
}

/// Render `value` as JSON.
pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.context("serializing output")
}

/// Write `value` to `out`, or to stdout when `out` is `None`.
pub fn emit<T: Serialize>(value: &T, out: Option<&Path>, pretty: bool) -> Result<()> {
    let text = render(value, pretty)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {}", parent.display()))?;
            }
            std::fs::write(path, format!("{text}\n"))
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{text}"),
    }
    Ok(())
}

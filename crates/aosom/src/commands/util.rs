//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;

use aosom_api::Record;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON object file for `--from-file` flags.
pub fn read_json_record(path: &Path) -> Result<Record, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CliError::Validation {
            field: "from-file".into(),
            reason: format!("expected a JSON object, found {}", kind_of(&other)),
        }),
    }
}

/// A record field as display text; strings lose their quotes.
pub fn text_of(record: &Record, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_of_strips_string_quotes() {
        let record = json!({"name": "pool-a", "size": 4, "gone": null});
        let record = record.as_object().unwrap();
        assert_eq!(text_of(record, "name"), "pool-a");
        assert_eq!(text_of(record, "size"), "4");
        assert_eq!(text_of(record, "gone"), "");
        assert_eq!(text_of(record, "missing"), "");
    }

    #[test]
    fn from_file_must_be_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");

        std::fs::write(&path, "[1, 2]").unwrap();
        let err = read_json_record(&path).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }), "{err:?}");

        std::fs::write(&path, r#"{"display_name": "pool-a"}"#).unwrap();
        assert_eq!(read_json_record(&path).unwrap()["display_name"], "pool-a");
    }

    #[test]
    fn yes_flag_skips_prompt() {
        assert!(confirm("Delete?", "delete", true).unwrap());
    }
}

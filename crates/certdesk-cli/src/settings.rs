// Settings parsing for `config set`
//
// Parses key=value pairs into a partial institution config update.
// Keys accept camelCase, snake_case or kebab-case spellings:
// `primary-color=#aa0000` becomes { "primaryColor": "#aa0000" }

use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};

/// Config fields that can be set, in their wire spelling.
pub const SETTING_KEYS: [&str; 5] = [
    "institutionName",
    "logoUrl",
    "signatureUrl",
    "primaryColor",
    "secondaryColor",
];

/// Parses a list of key=value strings into a config update object.
///
/// # Examples
/// ```text
/// institution-name=Academia Norte  -> { "institutionName": "Academia Norte" }
/// logo_url=                        -> { "logoUrl": "" } (clears the logo)
/// ```
pub fn parse_settings(args: &[String]) -> Result<Value> {
    if args.is_empty() {
        return Err(anyhow!(
            "Nothing to set. Usage: certdesk config set KEY=VALUE... (keys: {})",
            SETTING_KEYS.join(", ")
        ));
    }

    let mut root = Map::new();
    for arg in args {
        let (key, value) = parse_key_value(arg)?;
        let key = canonical_key(&key)?;
        root.insert(key.to_string(), json!(value));
    }

    Ok(Value::Object(root))
}

/// Parses a single "key=value" string. The value may be empty.
fn parse_key_value(arg: &str) -> Result<(String, String)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid setting format: '{}'. Expected 'key=value'", arg))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Empty key in setting: '{}'", arg));
    }

    Ok((key.to_string(), value.trim().to_string()))
}

/// Maps any accepted spelling onto the wire key.
fn canonical_key(key: &str) -> Result<&'static str> {
    let folded: String = key
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    SETTING_KEYS
        .iter()
        .find(|k| k.to_ascii_lowercase() == folded)
        .copied()
        .ok_or_else(|| {
            anyhow!(
                "Unknown setting '{}'. Expected one of: {}",
                key,
                SETTING_KEYS.join(", ")
            )
        })
}

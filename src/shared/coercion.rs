//! Tolerant field coercion for device payloads
//!
//! Devices send numbers as JSON numbers or as strings, and name the same
//! field differently across firmware versions. These helpers never fail:
//! anything that cannot be read as a finite number or a non-empty string
//! comes back as `None`.

use serde_json::{Map, Value};

/// Coerce a raw JSON value into a finite number
///
/// Numbers are returned as-is when finite, strings are trimmed and parsed.
/// `null`, booleans, empty strings, arrays, objects and non-finite results
/// (`"NaN"`, `"inf"`, overflow) are treated as absent.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };

    number.is_finite().then_some(number)
}

/// Coerce a raw JSON value into trimmed, non-empty text
///
/// Numbers and booleans are rendered to their JSON text so that numeric
/// identifiers (`"idArchivo": 17`) survive.
pub fn coerce_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };

    (!text.is_empty()).then_some(text)
}

/// Like [`coerce_text`] but returns the original string untouched
///
/// Used for identifiers that must be echoed back to the device exactly as
/// they were sent. Only the empty string counts as absent; whitespace is
/// kept.
pub fn coerce_verbatim(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) => None,
        other => coerce_text(other),
    }
}

/// First alias, in order, that coerces to a finite number
pub fn first_number(record: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find_map(coerce_number)
}

/// First alias, in order, that coerces to non-empty text
pub fn first_text(record: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find_map(coerce_text)
}

/// First alias, in order, holding a non-empty value, returned verbatim
pub fn first_verbatim(record: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find_map(coerce_verbatim)
}

/// Text for the first matching alias, or `default` when none yields any
pub fn text_or(record: &Map<String, Value>, aliases: &[&str], default: &str) -> String {
    first_text(record, aliases).unwrap_or_else(|| default.to_string())
}

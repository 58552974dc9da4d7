//! Value types shared by the renderer and its extensions.
//!
//! Variables, globals, extension arguments and extension results are all
//! plain [`serde_json::Value`]s, so anything `Serialize` can reach a view.

pub use serde_json::Value;

/// Named variables passed to a view (`name => value`).
pub type Params = serde_json::Map<String, Value>;

/// Text form of a value as written into view output.
///
/// `null` writes nothing, strings are written verbatim, scalars use their
/// display form and containers fall back to compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Convert a serialized value into [`Params`].
///
/// `null` yields an empty map. Anything other than a map cannot supply named
/// variables and is handed back unchanged.
pub fn into_params(value: Value) -> Result<Params, Value> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Params::new()),
        other => Err(other),
    }
}

/// Short name of a value's JSON type, for error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

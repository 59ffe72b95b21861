//! RFC 3986 percent-encoding for OAuth.

use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::Params;

/// Everything but the unreserved characters `A-Z a-z 0-9 - . _ ~`.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a string.
pub fn encode(input: &str) -> String {
    percent_encode(input.as_bytes(), OAUTH_ENCODE_SET).to_string()
}

/// Percent-encode every item of a sequence, keeping its order.
pub fn encode_all<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items.into_iter().map(|s| encode(s.as_ref())).collect()
}

/// Percent-encode the values of a parameter set. Keys are left untouched.
pub fn encode_params(params: &Params) -> Params {
    params
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect()
}

/// Percent-encode a JSON value of any shape.
///
/// Strings are encoded, arrays are encoded element-wise and objects
/// value-wise (non-string members use their JSON text). Anything else
/// encodes to an empty string.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(encode(s)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| Value::String(encode(&scalar_text(item))))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Value::String(encode(&scalar_text(v)))))
                .collect(),
        ),
        _ => Value::String(String::new()),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Typed access to JSON argument maps.

use ledger_vectordb_core::{Embedding, InputError, InputResult};
use serde_json::{Map, Value};

/// View `args` as an object; events and queries always carry one.
pub(crate) fn as_object<'a>(
    args: &'a Value,
    name: &'static str,
) -> InputResult<&'a Map<String, Value>> {
    args.as_object().ok_or_else(|| InputError::invalid(name, "expected an object"))
}

pub(crate) fn optional_i64(args: &Map<String, Value>, name: &'static str) -> InputResult<Option<i64>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| InputError::invalid(name, "expected an integer")),
    }
}

pub(crate) fn required_i64(args: &Map<String, Value>, name: &'static str) -> InputResult<i64> {
    optional_i64(args, name)?.ok_or(InputError::MissingArgument(name))
}

pub(crate) fn required_str<'a>(
    args: &'a Map<String, Value>,
    name: &'static str,
) -> InputResult<&'a str> {
    match args.get(name) {
        None | Some(Value::Null) => Err(InputError::MissingArgument(name)),
        Some(value) => value.as_str().ok_or_else(|| InputError::invalid(name, "expected a string")),
    }
}

/// Vector literal argument checked against the configured dimensionality.
pub(crate) fn required_vector(
    args: &Map<String, Value>,
    name: &'static str,
    dimensions: usize,
) -> InputResult<Embedding> {
    Embedding::parse_with_dimensions(required_str(args, name)?, dimensions)
}

/// Finite decimal given as a string (`"0.25"`) or a JSON number.
pub(crate) fn required_decimal(args: &Map<String, Value>, name: &'static str) -> InputResult<f64> {
    let parsed = match args.get(name) {
        None | Some(Value::Null) => return Err(InputError::MissingArgument(name)),
        Some(Value::String(s)) => {
            s.parse::<f64>().map_err(|_| InputError::invalid(name, format!("not a decimal: {s}")))?
        },
        Some(Value::Number(n)) => {
            n.as_f64().ok_or_else(|| InputError::invalid(name, "not a decimal"))?
        },
        Some(_) => return Err(InputError::invalid(name, "expected a decimal string")),
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(InputError::invalid(name, "must be finite"))
    }
}

//! Arguments of `query_closest_objects`.

use ledger_vectordb_core::{
    ClosestQuery, DEFAULT_MAX_VECTORS, InputError, InputResult, QueryTemplate,
};
use serde_json::{Map, Value};

use crate::args::{as_object, optional_i64, required_decimal, required_i64, required_vector};

/// Reserved argument carrying the nearest-neighbor results into a chained query.
pub const CLOSEST_RESULTS_ARG: &str = "closest_results";

/// Parsed and validated `query_closest_objects` request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestObjectsQuery {
    pub query: ClosestQuery,
    pub template: Option<QueryTemplate>,
}

impl ClosestObjectsQuery {
    /// Accepts `context`, `q_vector`, `max_distance`, optional `max_vectors`
    /// (default 10) and an optional `query_template`.
    pub fn from_args(args: &Value, dimensions: usize) -> InputResult<Self> {
        let args = as_object(args, "query")?;
        let context = required_i64(args, "context")?;
        let embedding = required_vector(args, "q_vector", dimensions)?;
        let max_distance = required_decimal(args, "max_distance")?;
        let max_results = parse_max_vectors(optional_i64(args, "max_vectors")?)?;
        let template = match args.get("query_template") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(parse_template(raw)?),
        };
        Ok(Self {
            query: ClosestQuery { context, embedding, max_distance, max_results },
            template,
        })
    }
}

fn parse_max_vectors(raw: Option<i64>) -> InputResult<usize> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_VECTORS);
    };
    usize::try_from(raw).map_err(|_| InputError::invalid("max_vectors", "must not be negative"))
}

fn parse_template(raw: &Value) -> InputResult<QueryTemplate> {
    let template = as_object(raw, "query_template")?;
    let query_type = match template.get("type") {
        None | Some(Value::Null) => return Err(InputError::MissingArgument("query_template.type")),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(InputError::invalid("query_template.type", "expected a string")),
    };
    let args = match template.get("args") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(args)) => args.clone(),
        Some(_) => return Err(InputError::invalid("query_template.args", "expected an object")),
    };
    if args.contains_key(CLOSEST_RESULTS_ARG) {
        return Err(InputError::invalid(
            "query_template.args",
            format!("{CLOSEST_RESULTS_ARG} is reserved"),
        ));
    }
    Ok(QueryTemplate { query_type, args })
}

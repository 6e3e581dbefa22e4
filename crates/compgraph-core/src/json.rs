//! The external, human-facing JSON representation of rows.
//!
//! This is deliberately separate from the `Serialize`/`Derive` impls on
//! [`Row`] and [`Value`], which are exact and internally tagged and are used
//! only for the external sort's spill files. Plain JSON has no room for a
//! variant tag, so reading it back requires a heuristic: a two-element
//! array of numbers is read as [`Value::Coord`], everything else as
//! [`Value::List`]. `null` and nested objects aren't representable as a
//! field value and are rejected.

use std::rc::Rc;

use crate::error::ParseError;
use crate::row::Row;
use crate::value::Value;

/// One line of line-delimited JSON input can hold either a single row or a
/// whole array of rows (the four shipped pipelines' input files use the
/// latter).
pub enum ParsedLine {
    Row(Row),
    Rows(Vec<Row>),
}

/// A line parser, as accepted by [`crate::graph::Graph::from_file`].
///
/// Returns a plain `String` message on failure; the file source wraps it
/// into a [`ParseError`] carrying the file name and line number, so parsers
/// don't need to know where their input came from.
pub type LineParser = Rc<dyn Fn(&str) -> std::result::Result<ParsedLine, String>>;

/// The default parser used by the shipped pipelines: each line is a JSON
/// object (one row) or a JSON array of objects (many rows).
#[must_use]
pub fn json_line_parser() -> LineParser {
    Rc::new(|line: &str| {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| format!("invalid JSON: {e}"))?;
        match value {
            serde_json::Value::Array(items) => {
                let rows = items
                    .into_iter()
                    .map(row_from_json)
                    .collect::<std::result::Result<Vec<_>, String>>()?;
                Ok(ParsedLine::Rows(rows))
            }
            serde_json::Value::Object(_) => Ok(ParsedLine::Row(row_from_json(value)?)),
            other => Err(format!(
                "expected a JSON object or an array of objects, found {other}"
            )),
        }
    })
}

/// Turn a parser's plain error message into a positioned [`ParseError`].
pub fn annotate(source_name: &str, line: usize, message: String) -> ParseError {
    ParseError {
        source_name: source_name.to_string(),
        line,
        message,
    }
}

fn row_from_json(value: serde_json::Value) -> std::result::Result<Row, String> {
    match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| value_from_json(v).map(|v| (k, v)))
            .collect::<std::result::Result<Row, String>>(),
        other => Err(format!("expected a JSON object, found {other}")),
    }
}

fn value_from_json(value: serde_json::Value) -> std::result::Result<Value, String> {
    match value {
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(format!("unsupported numeric literal: {n}"))
            }
        }
        serde_json::Value::Array(items) => {
            if items.len() == 2 && items.iter().all(serde_json::Value::is_number) {
                let a = items[0].as_f64().expect("checked is_number above");
                let b = items[1].as_f64().expect("checked is_number above");
                Ok(Value::Coord(a, b))
            } else {
                let values = items
                    .into_iter()
                    .map(value_from_json)
                    .collect::<std::result::Result<Vec<_>, String>>()?;
                Ok(Value::List(values))
            }
        }
        serde_json::Value::Null => Err("null field values are not supported".to_string()),
        serde_json::Value::Object(_) => {
            Err("nested objects are not supported as field values".to_string())
        }
    }
}

/// Render a row back to plain JSON, the inverse of the default parser
/// (modulo the `Coord`/`List` ambiguity: a two-element `List` of numbers
/// round-trips as a `Coord`).
#[must_use]
pub fn row_to_json(row: &Row) -> serde_json::Value {
    serde_json::Value::Object(
        row.iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect(),
    )
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Int(n) => serde_json::Value::Number((*n).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Coord(a, b) => serde_json::Value::Array(vec![
            serde_json::Number::from_f64(*a).map_or(serde_json::Value::Null, serde_json::Value::Number),
            serde_json::Number::from_f64(*b).map_or(serde_json::Value::Null, serde_json::Value::Number),
        ]),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
    }
}

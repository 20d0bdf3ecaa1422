//! Typed tool arguments.
//!
//! The catalog validates raw JSON arguments into these values before any payload or R source
//! is produced, so translation never has to guess at a value's shape.

use crate::error::TranslationError;
use serde_json::{Map, Number, Value};

/// A single validated argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Number(Number),
    Numbers(Vec<Number>),
    Text(String),
    Flag(bool),
    Columns(Columns),
    /// Passed through to the backend untouched (e.g. `r_call` arguments).
    Json(Value),
}

impl ArgValue {
    /// JSON form used for pass-through payloads.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::Number(n.clone()),
            Self::Numbers(ns) => Value::Array(ns.iter().cloned().map(Value::Number).collect()),
            Self::Text(s) => Value::String(s.clone()),
            Self::Flag(b) => Value::Bool(*b),
            Self::Columns(cols) => cols.to_json(),
            Self::Json(v) => v.clone(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Numbers(_) => "number list",
            Self::Text(_) => "string",
            Self::Flag(_) => "boolean",
            Self::Columns(_) => "columns",
            Self::Json(_) => "json",
        }
    }
}

/// One homogeneous data-frame column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numbers(Vec<Number>),
    Text(Vec<String>),
    Flags(Vec<bool>),
}

impl Column {
    fn from_json(param: &str, column: &str, items: &[Value]) -> Result<Self, TranslationError> {
        let unsupported = |reason: String| TranslationError::Unsupported {
            param: param.to_string(),
            reason,
        };

        let parsed = match items.first() {
            None | Some(Value::Number(_)) => items
                .iter()
                .map(|v| v.as_number().cloned())
                .collect::<Option<Vec<_>>>()
                .map(Column::Numbers),
            Some(Value::String(_)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Column::Text),
            Some(Value::Bool(_)) => items
                .iter()
                .map(Value::as_bool)
                .collect::<Option<Vec<_>>>()
                .map(Column::Flags),
            Some(other) => {
                return Err(unsupported(format!(
                    "column '{column}' holds unsupported element type {}",
                    json_type_name(other)
                )));
            }
        };
        parsed.ok_or_else(|| unsupported(format!("column '{column}' mixes element types")))
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Numbers(ns) => Value::Array(ns.iter().cloned().map(Value::Number).collect()),
            Self::Text(ss) => Value::Array(ss.iter().cloned().map(Value::String).collect()),
            Self::Flags(bs) => Value::Array(bs.iter().copied().map(Value::Bool).collect()),
        }
    }
}

/// Named columns in caller order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Columns(Vec<(String, Column)>);

impl Columns {
    /// Read a `{name: [values...]}` object.
    ///
    /// # Errors
    ///
    /// Returns an error if any column is not an array or mixes element types.
    pub fn from_json(param: &str, map: &Map<String, Value>) -> Result<Self, TranslationError> {
        let mut out = Vec::with_capacity(map.len());
        for (name, value) in map {
            let Some(items) = value.as_array() else {
                return Err(TranslationError::Unsupported {
                    param: param.to_string(),
                    reason: format!(
                        "column '{name}' must be an array, got {}",
                        json_type_name(value)
                    ),
                });
            };
            out.push((name.clone(), Column::from_json(param, name, items)?));
        }
        Ok(Self(out))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.0.iter().map(|(name, col)| (name.as_str(), col))
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, col)| (name.clone(), col.to_json()))
                .collect(),
        )
    }
}

/// Validated arguments for one call, in descriptor order.
///
/// Absent optional parameters have no entry at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolArgs {
    values: Vec<(&'static str, ArgValue)>,
}

impl ToolArgs {
    pub(crate) fn push(&mut self, name: &'static str, value: ArgValue) {
        self.values.push((name, value));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ArgValue)> {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    /// JSON object of every present argument, in descriptor order.
    #[must_use]
    pub fn to_payload(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(n, v)| ((*n).to_string(), v.to_json()))
            .collect()
    }
}

pub(crate) fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! R source literals for typed argument values.
//!
//! Pure functions only. Which encoding applies to which parameter is fixed per tool in the
//! catalog; nothing here inspects parameter names.

use crate::args::{ArgValue, Column, Columns};
use crate::error::TranslationError;
use serde_json::Number;

/// How a parameter is rendered into generated R source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `"value"`; embedded quotes are not escaped.
    QuotedString,
    /// Inserted verbatim (formulas, method names, comparison keywords).
    BareKeyword,
    /// `c(1, 2, 3)`
    VectorLiteral,
    /// `TRUE` / `FALSE`
    BooleanLiteral,
    /// `a = c(..), b = c(..)`, suitable as `data.frame(...)` arguments.
    DataFrame,
}

impl Encoding {
    fn label(self) -> &'static str {
        match self {
            Self::QuotedString => "a quoted string",
            Self::BareKeyword => "a bare keyword",
            Self::VectorLiteral => "a vector literal",
            Self::BooleanLiteral => "a boolean literal",
            Self::DataFrame => "data frame columns",
        }
    }
}

/// Numeric vector literal, elements in input order. `c()` for an empty slice.
#[must_use]
pub fn vector(values: &[Number]) -> String {
    let items: Vec<String> = values.iter().map(Number::to_string).collect();
    format!("c({})", items.join(", "))
}

/// Character vector literal.
#[must_use]
pub fn text_vector(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|s| quote(s)).collect();
    format!("c({})", items.join(", "))
}

/// Logical vector literal.
#[must_use]
pub fn flag_vector(values: &[bool]) -> String {
    let items: Vec<&str> = values.iter().map(|b| bool_literal(*b)).collect();
    format!("c({})", items.join(", "))
}

#[must_use]
pub fn bool_literal(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

// TODO: escape embedded `"` and `\` once the backend's handling of escaped input is confirmed.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

#[must_use]
pub fn column(values: &Column) -> String {
    match values {
        Column::Numbers(ns) => vector(ns),
        Column::Text(ss) => text_vector(ss),
        Column::Flags(bs) => flag_vector(bs),
    }
}

/// `name = <vector>` fragments joined with `, `, in column order.
#[must_use]
pub fn data_frame_args(columns: &Columns) -> String {
    columns
        .iter()
        .map(|(name, values)| format!("{name} = {}", column(values)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render `value` with the given encoding.
///
/// # Errors
///
/// Returns [`TranslationError::Unsupported`] when the value's shape has no rendering under
/// `encoding` (for example a boolean asked to render as a vector).
pub fn encode(param: &str, value: &ArgValue, encoding: Encoding) -> Result<String, TranslationError> {
    match (encoding, value) {
        (Encoding::VectorLiteral, ArgValue::Numbers(ns)) => Ok(vector(ns)),
        (Encoding::BooleanLiteral, ArgValue::Flag(b)) => Ok(bool_literal(*b).to_string()),
        (Encoding::QuotedString, ArgValue::Text(s)) => Ok(quote(s)),
        (Encoding::BareKeyword, ArgValue::Text(s)) => Ok(s.clone()),
        (Encoding::DataFrame, ArgValue::Columns(cols)) => Ok(data_frame_args(cols)),
        (encoding, value) => Err(TranslationError::Unsupported {
            param: param.to_string(),
            reason: format!("cannot render {} as {}", value.kind(), encoding.label()),
        }),
    }
}

//! Conditional row filtering.
//!
//! Callers restrict the working table with an AND/OR clause tree over
//! (field, operator, literal) triples. Clauses compile into a boolean
//! expression evaluated per row via `evalexpr`; raw field names never reach
//! the expression parser — every clause binds a generated identifier, so a
//! column called `total-sales (USD)` or `true` cannot collide with the
//! parser's syntax.
//!
//! Missing or uncoercible cells compare as NaN / the empty string / `false`,
//! which makes every ordered comparison against them false while keeping
//! `!=` truthful.

use evalexpr::{
    ContextWithMutableVariables, HashMapContext, Value as EvalValue, eval_boolean_with_context,
};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use crate::{dataset::Dataset, error::SpecError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionalOperator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl ConditionalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionalOperator::Eq => "==",
            ConditionalOperator::NotEq => "!=",
            ConditionalOperator::Gt => ">",
            ConditionalOperator::Ge => ">=",
            ConditionalOperator::Lt => "<",
            ConditionalOperator::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionalValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub field: String,
    pub operator: ConditionalOperator,
    pub value: ConditionalValue,
}

/// AND/OR clause tree: every `and` clause must hold, and when any `or`
/// clauses exist at least one of them must hold as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditionals {
    #[serde(default)]
    pub and: Vec<Conditional>,
    #[serde(default)]
    pub or: Vec<Conditional>,
}

impl Conditionals {
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty()
    }

    /// Deterministic rendering used in spec-set replacement keys.
    pub fn canonical_string(&self) -> String {
        let render = |clauses: &[Conditional]| {
            clauses
                .iter()
                .map(|c| {
                    let value = match &c.value {
                        ConditionalValue::Flag(b) => b.to_string(),
                        ConditionalValue::Number(n) => format!("{n}"),
                        ConditionalValue::Text(t) => t.clone(),
                    };
                    format!("{}{}{}", c.field, c.operator.as_str(), value)
                })
                .collect::<Vec<_>>()
                .join(";")
        };
        format!("and:{}|or:{}", render(&self.and), render(&self.or))
    }
}

/// Parses a single clause such as `amount >= 100` or `status == shipped`,
/// destined for the `and` group. Two-character operators are tried first so
/// `>=` never splits as `>`.
pub fn parse_conditional(raw: &str) -> Result<Conditional, SpecError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SpecError::Conditional(
            "empty conditional expression".to_string(),
        ));
    }
    for (needle, operator) in [
        ("!=", ConditionalOperator::NotEq),
        (">=", ConditionalOperator::Ge),
        ("<=", ConditionalOperator::Le),
        ("==", ConditionalOperator::Eq),
        ("=", ConditionalOperator::Eq),
        (">", ConditionalOperator::Gt),
        ("<", ConditionalOperator::Lt),
    ] {
        if let Some(idx) = trimmed.find(needle) {
            let field = trimmed[..idx].trim();
            let literal = trimmed[idx + needle.len()..].trim();
            if field.is_empty() || literal.is_empty() {
                return Err(SpecError::Conditional(format!(
                    "conditional '{trimmed}' is missing a field or literal"
                )));
            }
            return Ok(Conditional {
                field: field.to_string(),
                operator,
                value: parse_literal(literal),
            });
        }
    }
    Err(SpecError::Conditional(format!(
        "could not parse conditional '{trimmed}'"
    )))
}

fn parse_literal(raw: &str) -> ConditionalValue {
    let unquoted = unquote(raw);
    if unquoted.len() != raw.len() {
        return ConditionalValue::Text(unquoted.to_string());
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => return ConditionalValue::Flag(true),
        "false" => return ConditionalValue::Flag(false),
        _ => {}
    }
    if let Ok(number) = raw.parse::<f64>() {
        return ConditionalValue::Number(number);
    }
    ConditionalValue::Text(raw.to_string())
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if value.len() >= 2
        && ((bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\''))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

struct BoundClause<'a> {
    clause: &'a Conditional,
    column: usize,
    ident: String,
}

fn bind_clauses<'a>(
    dataset: &Dataset,
    clauses: &'a [Conditional],
    prefix: &str,
) -> Result<Vec<BoundClause<'a>>, SpecError> {
    clauses
        .iter()
        .enumerate()
        .map(|(idx, clause)| {
            let column =
                dataset
                    .column_index(&clause.field)
                    .ok_or_else(|| SpecError::UnknownField {
                        field: clause.field.clone(),
                        context: "conditional filter",
                    })?;
            Ok(BoundClause {
                clause,
                column,
                ident: format!("{prefix}{idx}_{}", sanitize_identifier(&clause.field)),
            })
        })
        .collect()
}

/// Compiles the clause tree and evaluates it into a row mask. Referencing a
/// field the dataset lacks is a validation error, not a silent all-false
/// mask.
pub fn row_mask(dataset: &Dataset, conditionals: &Conditionals) -> Result<Vec<bool>, SpecError> {
    if conditionals.is_empty() {
        return Ok(vec![true; dataset.row_count()]);
    }

    let bound_and = bind_clauses(dataset, &conditionals.and, "a")?;
    let bound_or = bind_clauses(dataset, &conditionals.or, "o")?;

    let render = |bound: &[BoundClause<'_>], joiner: &str| {
        bound
            .iter()
            .map(|b| {
                format!(
                    "{} {} {}",
                    b.ident,
                    b.clause.operator.as_str(),
                    render_literal(&b.clause.value)
                )
            })
            .collect::<Vec<_>>()
            .join(joiner)
    };

    let expression = match (bound_and.is_empty(), bound_or.is_empty()) {
        (false, false) => format!(
            "({}) && ({})",
            render(&bound_and, " && "),
            render(&bound_or, " || ")
        ),
        (false, true) => render(&bound_and, " && "),
        (true, false) => render(&bound_or, " || "),
        (true, true) => unreachable!("is_empty() checked above"),
    };

    let mut mask = Vec::with_capacity(dataset.row_count());
    for row in 0..dataset.row_count() {
        let mut context = HashMapContext::new();
        for bound in bound_and.iter().chain(&bound_or) {
            let cell = dataset
                .column(bound.column)
                .and_then(|c| c.values.get(row))
                .and_then(|v| v.as_deref());
            context
                .set_value(bound.ident.clone(), cell_value(cell, &bound.clause.value))
                .map_err(|err| SpecError::Conditional(err.to_string()))?;
        }
        let keep = eval_boolean_with_context(&expression, &context)
            .map_err(|err| SpecError::Conditional(err.to_string()))?;
        mask.push(keep);
    }
    Ok(mask)
}

/// Coerces a cell to the literal's type so each comparison stays
/// same-typed.
fn cell_value(cell: Option<&str>, literal: &ConditionalValue) -> EvalValue {
    match literal {
        ConditionalValue::Number(_) => {
            let parsed = cell
                .and_then(|v| v.replace(',', "").parse::<f64>().ok())
                .unwrap_or(f64::NAN);
            EvalValue::Float(parsed)
        }
        ConditionalValue::Text(_) => EvalValue::String(cell.unwrap_or("").to_string()),
        ConditionalValue::Flag(_) => {
            let parsed = cell.map(|v| {
                matches!(
                    v.to_ascii_lowercase().as_str(),
                    "true" | "t" | "yes" | "y" | "1"
                )
            });
            EvalValue::Boolean(parsed.unwrap_or(false))
        }
    }
}

fn render_literal(value: &ConditionalValue) -> String {
    match value {
        ConditionalValue::Flag(b) => b.to_string(),
        ConditionalValue::Number(n) => format!("{n:?}"),
        ConditionalValue::Text(t) => {
            let escaped = t.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }
    }
}

/// Identifier-safe rendering of a field name; the positional prefix added
/// by the caller keeps distinct fields distinct even when this collapses
/// them.
fn sanitize_identifier(name: &str) -> String {
    let snake = name.to_snake_case();
    let cleaned: String = snake
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "field".to_string()
    } else {
        cleaned
    }
}

//! Caller-visible validation failures.
//!
//! Everything recoverable (an unparseable cell, a degenerate spec, a failing
//! statistical test) is handled locally and never reaches the caller; the
//! variants here are the cases where the caller supplied something the engine
//! cannot act on and must not guess around.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    /// A selection or conditional referenced a field the dataset lacks.
    #[error("unknown field '{field}' referenced by {context}")]
    UnknownField { field: String, context: &'static str },

    /// A spec requires a parameter (e.g. a dependent variable) the caller
    /// did not supply.
    #[error("missing {role} for '{procedure}' spec")]
    MissingParameter {
        role: &'static str,
        procedure: String,
    },

    /// A skeleton's arguments do not fit its generating procedure. This is
    /// an internal consistency failure, surfaced rather than silently
    /// producing wrong data.
    #[error("spec arguments do not match generating procedure '{procedure}'")]
    MalformedArgs { procedure: String },

    /// The conditional clause tree could not be compiled or evaluated.
    #[error("conditional filter error: {0}")]
    Conditional(String),
}

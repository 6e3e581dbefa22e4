//! Error taxonomy for the compgraph engine.
//!
//! Every fallible surface in this crate returns [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. `Error` is a thin dispatch enum over the
//! five concrete error families below; callers that care about a specific
//! family can match on it, everyone else just propagates with `?`.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type returned by graph construction and execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Errors in how a graph was wired together: missing bindings, unknown
/// fields referenced by an operator's configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no source bound for name {name:?}")]
    MissingSource { name: String },

    #[error("row has no field {field:?} (referenced by {op})")]
    UnknownField { field: String, op: &'static str },

    #[error("{op} was given an empty key list")]
    EmptyKeys { op: &'static str },
}

/// A line of input could not be turned into one or more rows.
#[derive(Debug, thiserror::Error)]
#[error("parse error in {source_name} at line {line}: {message}")]
pub struct ParseError {
    pub source_name: String,
    pub line: usize,
    pub message: String,
}

/// Failures reaching or reading/writing the filesystem: input files, and
/// the external sort's spill files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("could not access {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] std::io::Error),
}

/// A row's field held a value of the wrong variant for the operator that
/// touched it (e.g. arithmetic over a `Str`, a join key comparing a `List`
/// against a `Bool`).
#[derive(Debug, thiserror::Error)]
#[error("type error in {op}: {message}")]
pub struct TypeError {
    pub op: &'static str,
    pub message: String,
}

/// Invariant violations that indicate a bug in this crate rather than bad
/// input or bad graph configuration. Should never surface in practice.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {0}")]
pub struct InternalError(pub String);

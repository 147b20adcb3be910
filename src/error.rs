//! Error types for every fallible stage: loading a problem, persisting the variable map,
//! reading solver output, and calling the in-process solver.

use std::path::PathBuf;

use thiserror::Error;

use crate::builder::BuilderInvalidReason;
use crate::variable::VarKey;

/// A problem file could not be understood.
///
/// Line numbers are 1-based and count blank lines, so they match what an editor shows.
#[derive(Debug, Error)]
pub enum ProblemError {
    /// No non-blank line at all.
    #[error("problem file is empty")]
    Empty,
    /// The file stops before `what`.
    #[error("problem file ends before {what}")]
    MissingLine { what: String },
    /// `token` in `field` does not parse as an integer.
    #[error("line {line}: {field} is not an integer: {token:?}")]
    InvalidInteger { line: usize, field: String, token: String },
    /// A line has the wrong number of values.
    #[error("line {line}: {what} needs {expected} values, found {found}")]
    FieldCount { line: usize, what: String, expected: String, found: usize },
    /// The first line names no known scenario.
    #[error("line {line}: unknown scenario tag {tag}, expected 1 or 2")]
    UnknownScenario { line: usize, tag: i64 },
    /// A grid dimension is zero.
    #[error("line {line}: grid {axis} must be at least 1")]
    ZeroDimension { line: usize, axis: &'static str },
    /// A count or coordinate is negative.
    #[error("line {line}: {field} must not be negative, found {value}")]
    Negative { line: usize, field: String, value: i64 },
    /// More non-blank lines than the header declares.
    #[error("line {line}: expected {declared} metro lines, found trailing data")]
    TrailingData { line: usize, declared: usize },
    /// Well-formed, but rejected by the builder.
    #[error("invalid problem: {}", join_reasons(.0))]
    Invalid(Vec<BuilderInvalidReason>),
}

fn join_reasons(reasons: &[BuilderInvalidReason]) -> String {
    reasons.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// A persisted variable map is unreadable or inconsistent.
#[derive(Debug, Error)]
pub enum VarMapError {
    /// Not valid JSON for a list of records.
    #[error("malformed variable map: {0}")]
    Json(#[from] serde_json::Error),
    /// Ids do not run 1, 2, 3 and so on.
    #[error("variable ids are not dense: expected id {expected}, found {found}")]
    NonDense { expected: usize, found: usize },
    /// Two records share a key.
    #[error("variable key {key:?} appears more than once")]
    DuplicateKey { key: VarKey },
}

/// A solver output file could not be understood.
#[derive(Debug, Error)]
pub enum ResultParseError {
    /// Nothing but comments or whitespace.
    #[error("solver output is empty")]
    Empty,
    /// The first meaningful line is not a known status.
    #[error("line {line}: expected SAT or UNSAT, found {text:?}")]
    UnknownStatus { line: usize, text: String },
    /// Not an integer, or beyond the largest variable a solver can name.
    #[error("line {line}: invalid literal {token:?}")]
    InvalidLiteral { line: usize, token: String },
}

/// The in-process solver gave up.
#[derive(Debug, Error)]
pub enum SolveError {
    /// varisat reported an error.
    #[error("SAT backend failed: {0}")]
    Backend(String),
}

/// Anything that can go wrong while running a stage against files on disk.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing `path` failed.
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
    /// A problem file could not be parsed.
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// A variable map could not be loaded.
    #[error(transparent)]
    VarMap(#[from] VarMapError),
    /// Solver output could not be parsed.
    #[error(transparent)]
    SolverOutput(#[from] ResultParseError),
    /// The in-process solver failed.
    #[error(transparent)]
    Solve(#[from] SolveError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

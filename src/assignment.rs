//! Truth assignments and SAT solver results, with the two common result file dialects.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::str::FromStr;

use itertools::Itertools;
use varisat::{Lit, Var};

use crate::error::ResultParseError;

/// A (possibly partial) truth assignment, keyed by 0-based variable index.
///
/// Storage is proportional to the number of assigned variables, not to the largest index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Assignment {
    values: BTreeMap<usize, bool>,
}

impl Assignment {
    /// Later literals override earlier ones on the same variable.
    pub fn from_lits(lits: impl IntoIterator<Item = Lit>) -> Self {
        let mut assignment = Self::default();
        for lit in lits {
            assignment.set(lit);
        }
        assignment
    }

    /// Make `lit` hold, replacing any earlier value of its variable.
    pub fn set(&mut self, lit: Lit) {
        self.values.insert(lit.var().index(), lit.is_positive());
    }

    /// The value of `var`, or [`None`] if the assignment does not mention it.
    pub fn get(&self, var: Var) -> Option<bool> {
        self.values.get(&var.index()).copied()
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variable is assigned.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value of `var`; unassigned variables read as false.
    pub fn value(&self, var: Var) -> bool {
        self.get(var).unwrap_or(false)
    }

    /// Whether `lit` holds; literals over unassigned variables do not.
    pub fn holds(&self, lit: Lit) -> bool {
        self.get(lit.var()) == Some(lit.is_positive())
    }

    /// Whether every clause has a literal that holds.
    pub fn satisfies<C: AsRef<[Lit]>>(&self, clauses: &[C]) -> bool {
        clauses.iter().all(|clause| clause.as_ref().iter().any(|lit| self.holds(*lit)))
    }

    /// Every assigned variable as a literal, in variable order.
    pub fn lits(&self) -> impl Iterator<Item = Lit> + '_ {
        self.values.iter().map(|(index, value)| Var::from_index(*index).lit(*value))
    }
}

/// What a SAT solver concluded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SolverResult {
    /// No assignment satisfies the formula.
    Unsat,
    /// A satisfying assignment.
    Sat(Assignment),
}

impl SolverResult {
    /// Whether the solver found a model.
    pub fn is_sat(&self) -> bool {
        matches!(self, Self::Sat(_))
    }

    /// The model, if there is one.
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Sat(assignment) => Some(assignment),
            Self::Unsat => None,
        }
    }

    /// Write in the minisat result format: `SAT` and a single `0`-terminated line of literals, or `UNSAT`.
    pub fn write(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Self::Unsat => writeln!(writer, "UNSAT"),
            Self::Sat(assignment) => {
                writeln!(writer, "SAT")?;
                let lits = assignment.lits().map(|lit| lit.to_dimacs()).join(" ");
                match lits.is_empty() {
                    true => writeln!(writer, "0"),
                    false => writeln!(writer, "{lits} 0"),
                }
            }
        }
    }
}

enum Status {
    Sat,
    Unsat,
}

fn parse_status(text: &str) -> Option<Status> {
    match text {
        "SAT" | "SATISFIABLE" => Some(Status::Sat),
        "UNSAT" | "UNSATISFIABLE" => Some(Status::Unsat),
        _ => None,
    }
}

impl FromStr for SolverResult {
    type Err = ResultParseError;

    /// Parse solver output in either the minisat style
    ///
    /// ```text
    /// SAT
    /// 1 -2 3 0
    /// ```
    ///
    /// or the SAT competition style, with `c` comments, an `s` status line and `v` value lines.
    /// Values stop at the first `0`; a variable listed twice takes its last value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut status = None;
        let mut lits = Vec::new();

        'lines: for (index, raw) in s.lines().enumerate() {
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() || text == "c" || text.starts_with("c ") {
                continue;
            }

            if status.is_none() {
                let status_text = text.strip_prefix("s ").unwrap_or(text).trim();
                status = Some(parse_status(status_text).ok_or_else(|| ResultParseError::UnknownStatus {
                    line,
                    text: text.to_string(),
                })?);
                match status {
                    Some(Status::Unsat) => break,
                    _ => continue,
                }
            }

            let values = text.strip_prefix('v').unwrap_or(text);
            for token in values.split_whitespace() {
                let value: isize = token.parse().map_err(|_| ResultParseError::InvalidLiteral {
                    line,
                    token: token.to_string(),
                })?;
                if value == 0 {
                    break 'lines;
                }
                if value.unsigned_abs() > Var::max_var().to_dimacs().unsigned_abs() {
                    return Err(ResultParseError::InvalidLiteral { line, token: token.to_string() });
                }
                lits.push(Lit::from_dimacs(value));
            }
        }

        match status {
            None => Err(ResultParseError::Empty),
            Some(Status::Unsat) => Ok(Self::Unsat),
            Some(Status::Sat) => Ok(Self::Sat(Assignment::from_lits(lits))),
        }
    }
}

//! Solving encodings in process with `varisat`.

use varisat::{CnfFormula, Lit, Solver};

use crate::assignment::{Assignment, SolverResult};
use crate::encoder::Encoding;
use crate::error::SolveError;
use crate::logic::Clause;

/// Solve `encoding` in process.
pub fn solve(encoding: &Encoding) -> Result<SolverResult, SolveError> {
    solve_assuming(encoding, &[])
}

/// Solve `encoding` with every literal of `assumptions` additionally taken as true.
pub fn solve_assuming(encoding: &Encoding, assumptions: &[Lit]) -> Result<SolverResult, SolveError> {
    let result = solve_formula(encoding.clauses(), assumptions)?;
    match &result {
        SolverResult::Sat(_) => tracing::info!("satisfiable"),
        SolverResult::Unsat => tracing::info!("unsatisfiable"),
    }
    Ok(result)
}

/// Solve raw clauses. The model, if any, covers every variable the solver saw.
pub fn solve_formula(clauses: &[Clause], assumptions: &[Lit]) -> Result<SolverResult, SolveError> {
    let mut solver = Solver::new();
    solver.add_formula(&CnfFormula::from(clauses.iter().map(Vec::as_slice)));
    solver.assume(assumptions);

    match solver.solve() {
        Ok(true) => {
            let model = solver.model().ok_or_else(|| SolveError::Backend("no model after SAT".to_string()))?;
            Ok(SolverResult::Sat(Assignment::from_lits(model)))
        }
        Ok(false) => Ok(SolverResult::Unsat),
        Err(err) => Err(SolveError::Backend(err.to_string())),
    }
}

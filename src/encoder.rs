//! Reduction of a [`Problem`](crate::problem::Problem) to CNF.

use std::fmt::{Display, Formatter};

use itertools::Itertools;
use varisat::{Lit, Var};

use crate::dimacs::Dimacs;
use crate::domain::{overlapping_lines, BoundingBox, LineDomain, Pruning};
use crate::location::Location;
use crate::logic::{at_least_one, at_most_k, at_most_one, Clause};
use crate::problem::{LineId, Problem};
use crate::shape::Direction;
use crate::variable::{VarKey, VarMap};

/// The frozen result of encoding a [`Problem`]: every allocated variable, every clause, and the
/// domain each line was confined to.
#[derive(Clone, Debug)]
pub struct Encoding {
    pub(crate) vars: VarMap,
    pub(crate) clauses: Vec<Clause>,
    pub(crate) domains: Vec<LineDomain>,
}

impl Encoding {
    /// Every allocated variable and the key it stands for.
    pub fn vars(&self) -> &VarMap {
        &self.vars
    }

    /// Clauses in emission order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// One domain per line, indexed by [`LineId`].
    pub fn domains(&self) -> &[LineDomain] {
        &self.domains
    }

    /// Number of allocated variables.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Number of clauses, empty ones included.
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Literal asserting `key`, or [`None`] if `key` was never allocated in this encoding.
    pub fn lit(&self, key: VarKey) -> Option<Lit> {
        self.vars.get(&key).map(Var::positive)
    }

    /// Split into the variable map and the clauses, e.g. to persist the map and hand the clauses to a solver.
    pub fn into_parts(self) -> (VarMap, Vec<Clause>) {
        (self.vars, self.clauses)
    }

    /// The encoding in DIMACS CNF.
    pub fn to_dimacs(&self) -> String {
        Dimacs(self).to_string()
    }

    /// Counts of variables by kind and of clauses.
    pub fn stats(&self) -> EncodingStats {
        let mut stats = EncodingStats {
            variables: self.num_vars(),
            clauses: self.num_clauses(),
            empty_clauses: self.clauses.iter().filter(|clause| clause.is_empty()).count(),
            ..Default::default()
        };

        for (_, key) in self.vars.iter() {
            match key {
                VarKey::Cell { .. } => stats.cell_vars += 1,
                VarKey::Dir { .. } => stats.dir_vars += 1,
                VarKey::Turn { .. } => stats.turn_vars += 1,
                VarKey::SeqCount { .. } => stats.counter_vars += 1,
            }
        }

        stats
    }
}

/// Sizes of an [`Encoding`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EncodingStats {
    /// Allocated variables of every kind.
    pub variables: usize,
    /// Clauses, empty ones included.
    pub clauses: usize,
    /// Empty clauses, one per unreachable mandatory cell.
    pub empty_clauses: usize,
    /// `Cell` variables.
    pub cell_vars: usize,
    /// `Dir` variables.
    pub dir_vars: usize,
    /// `Turn` variables.
    pub turn_vars: usize,
    /// Auxiliary bits of the turn counters.
    pub counter_vars: usize,
}

impl Display for EncodingStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} variables ({} cell, {} direction, {} turn, {} counter), {} clauses",
            self.variables, self.cell_vars, self.dir_vars, self.turn_vars, self.counter_vars, self.clauses,
        )?;
        if self.empty_clauses > 0 {
            write!(f, ", {} empty", self.empty_clauses)?;
        }
        Ok(())
    }
}

/// A move into or out of a cell, as seen from that cell.
#[derive(Copy, Clone, Debug)]
struct Move {
    /// Direction of travel.
    direction: Direction,
    /// The cell on the other side of the move.
    neighbor: Location,
    lit: Lit,
}

/// Mutable encoding session; consumed by [`Encoder::finish`].
struct Encoder<'a> {
    problem: &'a Problem,
    vars: VarMap,
    clauses: Vec<Clause>,
}

impl Encoder<'_> {
    fn lit(&self, key: VarKey) -> Option<Lit> {
        self.vars.get(&key).map(Var::positive)
    }

    /// Allocate every `Cell`, `Dir` and `Turn` variable of one line.
    fn allocate(&mut self, domain: &LineDomain) {
        let line = domain.line();
        for cell in domain.bounds().cells() {
            self.vars.allocate(VarKey::cell(line, cell));
            for (direction, _) in domain.moves_from(cell) {
                self.vars.allocate(VarKey::dir(line, cell, direction));
            }
            self.vars.allocate(VarKey::turn(line, cell));
        }
    }

    fn outgoing(&self, domain: &LineDomain, cell: Location) -> Vec<Move> {
        domain.moves_from(cell)
            .into_iter()
            .filter_map(|(direction, neighbor)| self.lit(VarKey::dir(domain.line(), cell, direction))
                .map(|lit| Move { direction, neighbor, lit }))
            .collect_vec()
    }

    fn incoming(&self, domain: &LineDomain, cell: Location) -> Vec<Move> {
        domain.moves_from(cell)
            .into_iter()
            .filter_map(|(toward, neighbor)| {
                // the neighbour moves back toward this cell
                let direction = toward.invert();
                self.lit(VarKey::dir(domain.line(), neighbor, direction))
                    .map(|lit| Move { direction, neighbor, lit })
            })
            .collect_vec()
    }

    fn forbid(moves: &[Move]) -> impl Iterator<Item = Clause> + '_ {
        moves.iter().map(|m| vec![!m.lit])
    }

    fn encode_line(&mut self, domain: &LineDomain) {
        let line = domain.line();
        let Some(spec) = self.problem.line(line).copied() else {
            return;
        };
        let mut clauses = Vec::new();

        // both endpoints are on the line
        for endpoint in [spec.start, spec.end] {
            if let Some(cell) = self.lit(VarKey::cell(line, endpoint)) {
                clauses.push(vec![cell]);
            }
        }

        let mut turns = Vec::new();
        let mut turn_clauses = Vec::new();

        for location in domain.bounds().cells() {
            let Some(cell) = self.lit(VarKey::cell(line, location)) else {
                continue;
            };
            let outgoing = self.outgoing(domain, location);
            let incoming = self.incoming(domain, location);
            let outgoing_lits = outgoing.iter().map(|m| m.lit).collect_vec();
            let incoming_lits = incoming.iter().map(|m| m.lit).collect_vec();
            let is_start = location == spec.start;
            let is_end = location == spec.end;

            // flow conservation
            match (is_start, is_end) {
                // a line of one cell makes no moves at all
                (true, true) => {
                    clauses.extend(Self::forbid(&outgoing));
                    clauses.extend(Self::forbid(&incoming));
                }
                (true, false) => {
                    clauses.push(at_least_one(cell, &outgoing_lits));
                    clauses.extend(at_most_one(&outgoing_lits));
                    clauses.extend(Self::forbid(&incoming));
                }
                (false, true) => {
                    clauses.push(at_least_one(cell, &incoming_lits));
                    clauses.extend(at_most_one(&incoming_lits));
                    clauses.extend(Self::forbid(&outgoing));
                }
                (false, false) => {
                    clauses.push(at_least_one(cell, &incoming_lits));
                    clauses.extend(at_most_one(&incoming_lits));
                    clauses.push(at_least_one(cell, &outgoing_lits));
                    clauses.extend(at_most_one(&outgoing_lits));
                }
            }

            // any move touching this cell occupies it
            clauses.extend(outgoing.iter().chain(&incoming).map(|m| vec![!m.lit, cell]));

            // a move occupies its destination
            for m in &outgoing {
                if let Some(next) = self.lit(VarKey::cell(line, m.neighbor)) {
                    clauses.push(vec![!m.lit, next]);
                }
            }

            // turns
            let Some(turn) = self.lit(VarKey::turn(line, location)) else {
                continue;
            };
            if is_start || is_end {
                turn_clauses.push(vec![!turn]);
                continue;
            }
            turn_clauses.push(vec![!turn, cell]);
            for (into, out_of) in incoming.iter().cartesian_product(&outgoing) {
                // (in * out) => turn when they differ, (in * out) => !turn otherwise
                turn_clauses.push(vec![!into.lit, !out_of.lit, turn.var().lit(into.direction != out_of.direction)]);
            }
            turns.push(turn);
        }

        // no immediate reversal across any edge
        for (from, to, forward) in domain.edges() {
            let there = self.lit(VarKey::dir(line, from, forward));
            let back = self.lit(VarKey::dir(line, to, forward.invert()));
            if let (Some(there), Some(back)) = (there, back) {
                clauses.push(vec![!there, !back]);
            }
        }

        self.clauses.extend(clauses);
        self.clauses.extend(turn_clauses);

        let budget = isize::try_from(self.problem.max_turns()).unwrap_or(isize::MAX);
        let counter = at_most_k(&mut self.vars, &turns, budget, line);
        self.clauses.extend(counter);

        tracing::debug!(
            "line {} from {} to {}: {} cells, {} turn indicators, {} clauses so far",
            line, spec.start, spec.end, domain.bounds().area(), turns.len(), self.clauses.len(),
        );
    }

    /// At most one line per cell, wherever boxes overlap.
    fn encode_exclusivity(&mut self) {
        let lines = 0..self.problem.num_lines();
        let mut clauses = Vec::new();

        for (y, x) in (0..self.problem.height()).cartesian_product(0..self.problem.width()) {
            let occupants = lines.clone()
                .filter_map(|line| self.lit(VarKey::cell(line, Location(x, y))))
                .collect_vec();
            clauses.extend(at_most_one(&occupants));
        }

        tracing::debug!("{} exclusivity clauses", clauses.len());
        self.clauses.extend(clauses);
    }

    /// Some line passes through every mandatory cell.
    fn encode_coverage(&mut self) {
        if !self.problem.requires_coverage() {
            return;
        }

        let mut clauses = Vec::with_capacity(self.problem.mandatory_cells().len());
        for location in self.problem.mandatory_cells() {
            let candidates = (0..self.problem.num_lines())
                .filter_map(|line: LineId| self.lit(VarKey::cell(line, *location)))
                .collect_vec();
            if candidates.is_empty() {
                tracing::warn!("mandatory cell {} lies outside every line's domain; the encoding is unsatisfiable", location);
            }
            clauses.push(candidates);
        }

        self.clauses.extend(clauses);
    }

    fn finish(self, domains: Vec<LineDomain>) -> Encoding {
        Encoding { vars: self.vars, clauses: self.clauses, domains }
    }
}

/// Encode `problem` as CNF, confining each line to the domain chosen by `pruning`.
///
/// Encoding is deterministic: the same problem and strategy always give the same variable numbering
/// and the same clauses in the same order.
///
/// # Logical setup
/// For each line, `Cell` says the line occupies a cell, `Dir` that it leaves a cell in some direction
/// and `Turn` that it changes direction there.
///
/// ## Flow
/// Both endpoints are occupied. The start has exactly one outgoing move and no incoming one; the end is
/// the mirror image. Every other occupied cell has exactly one incoming and exactly one outgoing move.
/// Moves imply that the cells they join are occupied, and a line never immediately reverses across an
/// edge.
///
/// ## Turns
/// At a non-endpoint cell, an incoming and an outgoing move of different directions force the turn
/// indicator; equal directions forbid it. A sequential counter bounds the indicators of each line.
///
/// ## Sharing the grid
/// No cell is occupied by two lines and, with mandatory cells, each of them is occupied by some line.
/// A mandatory cell outside every line's domain yields the empty clause.
pub fn encode<P: Pruning + ?Sized>(problem: &Problem, pruning: &P) -> Encoding {
    let mut boxes = pruning.bounding_boxes(problem);
    if boxes.len() != problem.num_lines() {
        tracing::warn!(
            "pruning gave {} boxes for {} lines, unmatched lines use the whole grid",
            boxes.len(), problem.num_lines(),
        );
        boxes.resize(problem.num_lines(), BoundingBox::full(problem.dims()));
    }
    let domains = problem.lines()
        .iter()
        .zip(boxes)
        .enumerate()
        .map(|(line, (spec, bounds))| LineDomain::new(line, spec, bounds, problem.dims()))
        .collect_vec();

    let bounds = domains.iter().map(LineDomain::bounds).collect_vec();
    tracing::info!(
        "encoding {} lines on a {}x{} grid (J = {}), {} of {} cells in line domains, {} overlapping pairs",
        problem.num_lines(), problem.width(), problem.height(), problem.max_turns(),
        bounds.iter().map(|b| b.area()).sum::<usize>(), problem.num_lines() * problem.cell_count(),
        overlapping_lines(&bounds).len(),
    );

    let mut encoder = Encoder {
        problem,
        vars: VarMap::new(),
        clauses: Vec::new(),
    };

    for domain in &domains {
        encoder.allocate(domain);
    }
    for domain in &domains {
        encoder.encode_line(domain);
    }
    encoder.encode_exclusivity();
    encoder.encode_coverage();

    let encoding = encoder.finish(domains);
    tracing::info!("encoded {}", encoding.stats());
    encoding
}

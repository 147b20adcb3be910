//! Turning a model back into routes.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::io::{self, Write};

use itertools::Itertools;
use strum::VariantArray;

use crate::assignment::{Assignment, SolverResult};
use crate::location::Location;
use crate::problem::{LineId, LineSpec, Problem};
use crate::shape::Direction;
use crate::variable::{VarKey, VarMap};

/// The moves a decoded line makes from its start.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Route {
    /// The line this route belongs to.
    pub line: LineId,
    /// Moves in order, starting at the line's start.
    pub directions: Vec<Direction>,
    /// Whether the walk arrived at the line's end. A route that did not is degenerate.
    pub reached_end: bool,
}

impl Route {
    /// Every cell visited, starting at `start`.
    pub fn cells(&self, start: Location) -> Vec<Location> {
        let mut cells = Vec::with_capacity(self.directions.len() + 1);
        cells.push(start);
        let mut current = start;
        for direction in &self.directions {
            current = direction.attempt_from(current);
            cells.push(current);
        }
        cells
    }

    /// Number of direction changes along the route.
    pub fn turns(&self) -> usize {
        self.directions.iter().tuple_windows().filter(|(a, b)| a != b).count()
    }
}

/// Space-separated symbols terminated by `0`, e.g. `R R D 0`; a route with no moves is `0`.
impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for direction in &self.directions {
            write!(f, "{direction} ")?;
        }
        write!(f, "0")
    }
}

/// Follow the true direction variables of one line from its start.
///
/// At each cell the first direction, in [`Direction`] order, whose variable is true and whose destination
/// is on the grid and has not been visited is taken. The walk stops at the end, when no such direction exists, or once it has
/// visited more cells than the grid holds.
fn walk(problem: &Problem, vars: &VarMap, assignment: &Assignment, line: LineId, spec: &LineSpec) -> Route {
    let mut directions = Vec::new();
    let mut current = spec.start;
    let mut visited = HashSet::from([current]);

    while current != spec.end {
        let next = Direction::VARIANTS.iter()
            .filter(|direction| vars.get(&VarKey::dir(line, current, **direction))
                .is_some_and(|var| assignment.value(var)))
            .filter_map(|direction| direction.step(current, problem.dims()).map(|next| (*direction, next)))
            .find(|(_, next)| !visited.contains(next));

        let Some((direction, next)) = next else {
            break;
        };
        directions.push(direction);
        visited.insert(next);
        current = next;

        if visited.len() > problem.cell_count() {
            break;
        }
    }

    let reached_end = current == spec.end;
    if !reached_end {
        tracing::warn!("line {} stops at {} after {} moves, short of {}", line, current, directions.len(), spec.end);
    }

    Route { line, directions, reached_end }
}

/// Turn a solver result back into one [`Route`] per line, or [`None`] if the problem is unsatisfiable.
///
/// Variables the map does not know, and ids missing from the assignment, read as false. Routes are not
/// checked against each other; see [`MetroMap`](crate::metro_map::MetroMap) for that.
pub fn decode(problem: &Problem, vars: &VarMap, result: &SolverResult) -> Option<Vec<Route>> {
    let assignment = result.assignment()?;
    let routes = problem.lines()
        .iter()
        .enumerate()
        .map(|(line, spec)| walk(problem, vars, assignment, line, spec))
        .collect_vec();

    tracing::debug!("decoded {} routes, {} complete", routes.len(), routes.iter().filter(|route| route.reached_end).count());
    Some(routes)
}

/// Write one line per metro line. Without routes, every line is `0`.
pub fn write_routes(writer: &mut impl Write, problem: &Problem, routes: Option<&[Route]>) -> io::Result<()> {
    match routes {
        Some(routes) => {
            for route in routes {
                writeln!(writer, "{route}")?;
            }
        }
        None => {
            for _ in 0..problem.num_lines() {
                writeln!(writer, "0")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use varisat::Lit;

    use crate::assignment::{Assignment, SolverResult};
    use crate::builder::ProblemBuilder;
    use crate::decoder::{decode, write_routes, Route};
    use crate::domain::FullGrid;
    use crate::encoder::encode;
    use crate::location::Location;
    use crate::problem::Problem;
    use crate::shape::Direction;
    use crate::variable::{VarKey, VarMap};

    fn corridor() -> Problem {
        ProblemBuilder::with_dims((NonZero::new(3).unwrap(), NonZero::new(2).unwrap()))
            .add_line((Location(0, 0), Location(2, 0)))
            .build()
            .unwrap()
    }

    fn with_true_moves(vars: &VarMap, moves: &[(Location, Direction)]) -> SolverResult {
        let lits = moves.iter()
            .map(|(location, direction)| vars.get(&VarKey::dir(0, *location, *direction)).unwrap().positive())
            .collect::<Vec<Lit>>();
        SolverResult::Sat(Assignment::from_lits(lits))
    }

    #[test]
    fn route_display() {
        let route = Route { line: 0, directions: vec![Direction::Right, Direction::Down, Direction::Down], reached_end: true };
        assert_eq!(route.to_string(), "R D D 0");
        assert_eq!(route.turns(), 1);
        assert_eq!(route.cells(Location(0, 0)), vec![Location(0, 0), Location(1, 0), Location(1, 1), Location(1, 2)]);
        assert_eq!(Route { line: 0, directions: vec![], reached_end: true }.to_string(), "0");
    }

    #[test]
    fn unsat_writes_zero_per_line() {
        let problem = ProblemBuilder::default()
            .add_line((Location(0, 0), Location(1, 0)))
            .add_line((Location(0, 1), Location(1, 1)))
            .build()
            .unwrap();
        let vars = encode(&problem, &FullGrid).into_parts().0;
        assert_eq!(decode(&problem, &vars, &SolverResult::Unsat), None);

        let mut buf = Vec::new();
        write_routes(&mut buf, &problem, None).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0\n0\n");
    }

    #[test]
    fn first_direction_in_priority_order_wins() {
        let problem = corridor();
        let vars = encode(&problem, &FullGrid).into_parts().0;
        // spurious Down at the start alongside the real Right
        let result = with_true_moves(&vars, &[
            (Location(0, 0), Direction::Down),
            (Location(0, 0), Direction::Right),
            (Location(1, 0), Direction::Right),
        ]);
        let routes = decode(&problem, &vars, &result).unwrap();
        assert_eq!(routes[0].directions, vec![Direction::Right, Direction::Right]);
        assert!(routes[0].reached_end);
    }

    #[test]
    fn visited_cells_are_skipped() {
        let problem = corridor();
        let vars = encode(&problem, &FullGrid).into_parts().0;
        // going Left from (1, 0) would revisit the start
        let result = with_true_moves(&vars, &[
            (Location(0, 0), Direction::Right),
            (Location(1, 0), Direction::Left),
            (Location(1, 0), Direction::Down),
            (Location(1, 1), Direction::Right),
            (Location(2, 1), Direction::Up),
        ]);
        let routes = decode(&problem, &vars, &result).unwrap();
        assert_eq!(routes[0].to_string(), "R D R U 0");
        assert!(routes[0].reached_end);
    }

    #[test]
    fn moves_off_the_grid_are_ignored() {
        let problem = corridor();
        // a map from elsewhere may name moves the grid has no room for
        let mut vars = VarMap::new();
        vars.allocate(VarKey::dir(0, Location(0, 0), Direction::Left));
        vars.allocate(VarKey::dir(0, Location(0, 0), Direction::Right));
        vars.allocate(VarKey::dir(0, Location(1, 0), Direction::Right));
        let result = with_true_moves(&vars, &[
            (Location(0, 0), Direction::Left),
            (Location(0, 0), Direction::Right),
            (Location(1, 0), Direction::Right),
        ]);
        let routes = decode(&problem, &vars, &result).unwrap();
        assert_eq!(routes[0].to_string(), "R R 0");
        assert!(routes[0].reached_end);
    }

    #[test]
    fn dead_end_keeps_partial_route() {
        let problem = corridor();
        let vars = encode(&problem, &FullGrid).into_parts().0;
        let result = with_true_moves(&vars, &[(Location(0, 0), Direction::Down)]);
        let routes = decode(&problem, &vars, &result).unwrap();
        assert_eq!(routes[0].directions, vec![Direction::Down]);
        assert!(!routes[0].reached_end);
    }

    #[test]
    fn empty_model_gives_bare_zero() {
        let problem = corridor();
        let vars = encode(&problem, &FullGrid).into_parts().0;
        let routes = decode(&problem, &vars, &SolverResult::Sat(Assignment::default())).unwrap();
        let mut buf = Vec::new();
        write_routes(&mut buf, &problem, Some(&routes)).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0\n");
    }
}

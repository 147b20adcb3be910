//! Checking and drawing decoded routes.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use ndarray::Array2;
use unordered_pair::UnorderedPair;

use crate::decoder::Route;
use crate::location::{Dimension, Location};
use crate::problem::{LineId, Problem};

/// What occupies one cell of a [`MetroMap`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MapCell {
    /// An endpoint of `line`.
    Terminus { line: LineId },
    /// A cell `line` passes through.
    Path { line: LineId },
    /// No line passes through.
    #[default]
    Empty,
}

impl MapCell {
    /// The line occupying the cell, if any.
    pub fn line(&self) -> Option<LineId> {
        match self {
            Self::Terminus { line } | Self::Path { line } => Some(*line),
            Self::Empty => None,
        }
    }
}

/// A way decoded routes fail to form a valid metro map.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Violation {
    /// The route stops before reaching the line's end.
    Incomplete { line: LineId },
    /// The route steps off the grid after reaching `from`.
    LeavesGrid { line: LineId, from: Location },
    /// The route visits `at` twice.
    SelfIntersection { line: LineId, at: Location },
    /// Two lines occupy `at`.
    Collision { lines: UnorderedPair<LineId>, at: Location },
    /// The route turns more often than allowed.
    TooManyTurns { line: LineId, turns: usize, allowed: usize },
    /// No line passes through mandatory cell `at`.
    Uncovered { at: Location },
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incomplete { line } => write!(f, "line {line} does not reach its end"),
            Self::LeavesGrid { line, from } => write!(f, "line {line} leaves the grid at {from}"),
            Self::SelfIntersection { line, at } => write!(f, "line {line} visits {at} twice"),
            Self::Collision { lines, at } => write!(f, "lines {} and {} both occupy {at}", lines.0, lines.1),
            Self::TooManyTurns { line, turns, allowed } => write!(f, "line {line} turns {turns} times, at most {allowed} allowed"),
            Self::Uncovered { at } => write!(f, "mandatory cell {at} is not covered"),
        }
    }
}

/// Decoded routes laid out on the grid, with everything wrong with them.
///
/// [`Display`] draws one row per grid row: termini as the line's uppercase letter, path cells in lowercase,
/// uncovered mandatory cells as `*` and empty cells as `.`.
#[derive(Clone, Debug)]
pub struct MetroMap {
    pub(crate) dims: (Dimension, Dimension),
    // indexed (y, x)
    pub(crate) cells: Array2<MapCell>,
    pub(crate) mandatory: Vec<Location>,
    pub(crate) violations: Vec<Violation>,
}

impl MetroMap {
    /// Lay `routes` out over `problem`'s grid and check them against its rules.
    pub fn new(problem: &Problem, routes: &[Route]) -> Self {
        let dims = problem.dims();
        let mut cells = Array2::from_elem((dims.1.get(), dims.0.get()), MapCell::Empty);
        let mut violations = Vec::new();

        for route in routes {
            let Some(spec) = problem.line(route.line) else {
                continue;
            };
            let line = route.line;

            if !route.reached_end {
                violations.push(Violation::Incomplete { line });
            }
            if route.turns() > problem.max_turns() {
                violations.push(Violation::TooManyTurns { line, turns: route.turns(), allowed: problem.max_turns() });
            }

            let mut seen = HashSet::with_capacity(route.directions.len() + 1);
            let mut previous = spec.start;
            for location in route.cells(spec.start) {
                if !problem.contains(location) {
                    violations.push(Violation::LeavesGrid { line, from: previous });
                    break;
                }
                previous = location;

                if !seen.insert(location) {
                    violations.push(Violation::SelfIntersection { line, at: location });
                    continue;
                }

                let cell = &mut cells[location.as_index()];
                if let Some(other) = cell.line() {
                    violations.push(Violation::Collision { lines: UnorderedPair(other, line), at: location });
                    continue;
                }
                *cell = match location == spec.start || location == spec.end {
                    true => MapCell::Terminus { line },
                    false => MapCell::Path { line },
                };
            }
        }

        let mandatory = match problem.requires_coverage() {
            true => problem.mandatory_cells().to_vec(),
            false => vec![],
        };
        for at in &mandatory {
            if cells[at.as_index()] == MapCell::Empty {
                violations.push(Violation::Uncovered { at: *at });
            }
        }

        Self { dims, cells, mandatory, violations }
    }

    /// Every problem found, in the order it was found.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether no violation was found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// What occupies `location`, or [`None`] if it is off the grid.
    pub fn get(&self, location: Location) -> Option<MapCell> {
        match location.within(self.dims) {
            true => Some(self.cells[location.as_index()]),
            false => None,
        }
    }

    /// Cells `line` occupies, in row-major order.
    pub fn cells_of(&self, line: LineId) -> Vec<Location> {
        self.cells.indexed_iter()
            .filter(|(_, cell)| cell.line() == Some(line))
            .map(|(index, _)| Location::from(index))
            .collect()
    }

    fn symbol(line: LineId) -> char {
        (b'a' + (line % 26) as u8) as char
    }
}

impl Display for MetroMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut symbols = self.cells.map(|cell| match cell {
            MapCell::Terminus { line } => Self::symbol(*line).to_ascii_uppercase(),
            MapCell::Path { line } => Self::symbol(*line),
            MapCell::Empty => '.',
        });
        for at in &self.mandatory {
            if self.cells[at.as_index()] == MapCell::Empty {
                symbols[at.as_index()] = '*';
            }
        }

        for row in symbols.rows() {
            for symbol in row {
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use unordered_pair::UnorderedPair;

    use crate::builder::ProblemBuilder;
    use crate::decoder::Route;
    use crate::location::Location;
    use crate::metro_map::{MapCell, MetroMap, Violation};
    use crate::problem::Problem;
    use crate::shape::Direction::{Down, Left, Right, Up};

    fn problem() -> Problem {
        ProblemBuilder::with_dims((NonZero::new(4).unwrap(), NonZero::new(3).unwrap()))
            .max_turns(1)
            .add_line((Location(0, 0), Location(3, 0)))
            .add_line((Location(0, 2), Location(1, 1)))
            .add_mandatory(Location(3, 2))
            .build()
            .unwrap()
    }

    #[test]
    fn draw_valid_map() {
        let mut builder = ProblemBuilder::with_dims((NonZero::new(4).unwrap(), NonZero::new(3).unwrap()));
        builder.max_turns(1)
            .add_line((Location(0, 0), Location(3, 0)))
            .add_line((Location(0, 2), Location(1, 1)));
        let routes = vec![
            Route { line: 0, directions: vec![Right, Right, Right], reached_end: true },
            Route { line: 1, directions: vec![Right, Up], reached_end: true },
        ];
        let map = MetroMap::new(&builder.build().unwrap(), &routes);
        assert!(map.is_valid(), "{:?}", map.violations());
        assert_eq!(map.get(Location(1, 0)), Some(MapCell::Path { line: 0 }));
        assert_eq!(map.get(Location(4, 0)), None);
        assert_eq!(map.cells_of(1), vec![Location(1, 1), Location(0, 2), Location(1, 2)]);
        assert_eq!(format!("{}", map), "AaaA
.B..
Bb..
");
    }

    #[test]
    fn uncovered_mandatory_cell() {
        let routes = vec![
            Route { line: 0, directions: vec![Right, Right, Right], reached_end: true },
            Route { line: 1, directions: vec![Right, Up], reached_end: true },
        ];
        let map = MetroMap::new(&problem(), &routes);
        assert_eq!(map.violations(), &[Violation::Uncovered { at: Location(3, 2) }]);
        assert_eq!(format!("{}", map), "AaaA
.B..
Bb.*
");
    }

    #[test]
    fn report_each_kind_of_violation() {
        let routes = vec![
            Route { line: 0, directions: vec![Right, Down, Left, Up, Right], reached_end: false },
            Route { line: 1, directions: vec![Up, Up, Up], reached_end: false },
        ];
        let map = MetroMap::new(&problem(), &routes);
        let violations = map.violations();
        assert!(violations.contains(&Violation::Incomplete { line: 0 }));
        assert!(violations.contains(&Violation::TooManyTurns { line: 0, turns: 4, allowed: 1 }));
        assert!(violations.contains(&Violation::SelfIntersection { line: 0, at: Location(0, 0) }));
        assert!(violations.contains(&Violation::Collision { lines: UnorderedPair(0, 1), at: Location(0, 0) }));
        assert!(violations.contains(&Violation::LeavesGrid { line: 1, from: Location(0, 0) }));
        assert_eq!(
            Violation::Collision { lines: UnorderedPair(0, 1), at: Location(0, 0) }.to_string(),
            "lines 0 and 1 both occupy (0, 0)",
        );
    }
}

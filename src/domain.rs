//! Per-line variable domains.
//!
//! Allocating every variable for every line over the whole grid costs `O(K * N * M * 4)` variables.
//! A [`Pruning`] strategy instead confines each line to a [`BoundingBox`]; the encoder only creates
//! variables and clauses for a line inside its box. Pruning is a heuristic: a box that is too small
//! can exclude the only feasible route, and the resulting UNSAT is indistinguishable from a genuinely
//! infeasible problem.

use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};
use unordered_pair::UnorderedPair;

use crate::location::{Coord, Dimension, Location};
use crate::problem::{LineId, LineSpec, Problem};
use crate::shape::Direction;

/// An axis-aligned, inclusive rectangle `[min.0, max.0] x [min.1, max.1]`.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct BoundingBox {
    /// Top-left corner, inclusive.
    pub min: Location,
    /// Bottom-right corner, inclusive.
    pub max: Location,
}

impl BoundingBox {
    /// The smallest box containing both `a` and `b`.
    pub fn spanning(a: Location, b: Location) -> Self {
        Self {
            min: Location(a.0.min(b.0), a.1.min(b.1)),
            max: Location(a.0.max(b.0), a.1.max(b.1)),
        }
    }

    /// Every cell of a grid of size `dims`.
    pub fn full(dims: (Dimension, Dimension)) -> Self {
        Self { min: Location(0, 0), max: Location(dims.0.get() - 1, dims.1.get() - 1) }
    }

    /// Grow by `buffer` cells on every side, clamped to a grid of size `dims`.
    pub fn grown(self, buffer: Coord, dims: (Dimension, Dimension)) -> Self {
        Self {
            min: Location(self.min.0.saturating_sub(buffer), self.min.1.saturating_sub(buffer)),
            max: Location(
                self.max.0.saturating_add(buffer).min(dims.0.get() - 1),
                self.max.1.saturating_add(buffer).min(dims.1.get() - 1),
            ),
        }
    }

    /// Shrink to the part lying on a grid of size `dims`.
    pub fn clamped(self, dims: (Dimension, Dimension)) -> Self {
        let limit = BoundingBox::full(dims).max;
        Self {
            min: Location(self.min.0.min(limit.0), self.min.1.min(limit.1)),
            max: Location(self.max.0.min(limit.0), self.max.1.min(limit.1)),
        }
    }

    /// The smallest box containing `self` and `location`.
    pub fn including(self, location: Location) -> Self {
        Self {
            min: Location(self.min.0.min(location.0), self.min.1.min(location.1)),
            max: Location(self.max.0.max(location.0), self.max.1.max(location.1)),
        }
    }

    /// Whether `location` lies inside the box.
    pub fn contains(&self, location: Location) -> bool {
        (self.min.0..=self.max.0).contains(&location.0) && (self.min.1..=self.max.1).contains(&location.1)
    }

    /// Whether the two boxes share at least one cell.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.0 <= other.max.0 && other.min.0 <= self.max.0
            && self.min.1 <= other.max.1 && other.min.1 <= self.max.1
    }

    /// Number of columns.
    pub fn width(&self) -> Coord {
        self.max.0 - self.min.0 + 1
    }

    /// Number of rows.
    pub fn height(&self) -> Coord {
        self.max.1 - self.min.1 + 1
    }

    /// Number of cells in the box.
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Every location in the box, column by column (x-major, then y).
    pub fn cells(&self) -> impl Iterator<Item = Location> {
        (self.min.0..=self.max.0)
            .cartesian_product(self.min.1..=self.max.1)
            .map(|(x, y)| Location(x, y))
    }

    /// How many cells `location` lies outside the box, measured along the worse axis; 0 if inside.
    pub fn gap_to(&self, location: Location) -> Coord {
        let dx = self.min.0.saturating_sub(location.0).max(location.0.saturating_sub(self.max.0));
        let dy = self.min.1.saturating_sub(location.1).max(location.1.saturating_sub(self.max.1));
        dx.max(dy)
    }
}

/// A strategy choosing where each line's variables may live.
///
/// Implementations return one box per line, in line order. The encoder still widens every box to
/// contain its line's endpoints and clamps it to the grid, so a strategy cannot break that invariant.
/// Lines left without a box get the whole grid, and surplus boxes are ignored.
pub trait Pruning {
    /// The box each line of `problem` is confined to.
    fn bounding_boxes(&self, problem: &Problem) -> Vec<BoundingBox>;
}

impl<P: Pruning + ?Sized> Pruning for &P {
    fn bounding_boxes(&self, problem: &Problem) -> Vec<BoundingBox> {
        (**self).bounding_boxes(problem)
    }
}

impl<P: Pruning + ?Sized> Pruning for Box<P> {
    fn bounding_boxes(&self, problem: &Problem) -> Vec<BoundingBox> {
        (**self).bounding_boxes(problem)
    }
}

/// No pruning: every line may use the whole grid.
#[derive(Copy, Clone, Debug, Default)]
pub struct FullGrid;

impl Pruning for FullGrid {
    fn bounding_boxes(&self, problem: &Problem) -> Vec<BoundingBox> {
        vec![BoundingBox::full(problem.dims()); problem.num_lines()]
    }
}

/// Tuning for [`Buffered`] pruning. Missing fields take their defaults when deserialized.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Slack every line gets.
    pub base: Coord,
    /// Extra slack per allowed turn.
    pub per_turn: Coord,
    /// Scale of the slack given to long lines, relative to the grid size.
    pub distance_factor: f64,
    /// How many of the nearest lines must be able to reach each mandatory cell.
    pub coverage_candidates: usize,
    /// Upper bound on every contribution above.
    pub max_buffer: Coord,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            base: 1,
            per_turn: 1,
            distance_factor: 0.5,
            coverage_candidates: 2,
            max_buffer: 8,
        }
    }
}

/// Grow each line's endpoint rectangle by a buffer sized from the turn budget, the line's length and,
/// for coverage problems, the distance to nearby mandatory cells.
#[derive(Copy, Clone, Debug, Default)]
pub struct Buffered {
    /// How far boxes grow beyond their endpoints.
    pub config: BufferConfig,
}

impl Buffered {
    /// Buffered pruning with the given settings.
    pub fn new(config: BufferConfig) -> Self {
        Self { config }
    }

    /// Buffer for a line, given how far it must stretch to reach the mandatory cells assigned to it.
    pub fn buffer(&self, problem: &Problem, spec: &LineSpec, coverage_gap: Coord) -> Coord {
        let cap = self.config.max_buffer;
        let (width, height) = (problem.width(), problem.height());

        let turn = self.config.per_turn.saturating_mul(problem.max_turns());
        // a line spanning the whole grid gets about `distance_factor * max(N, M) / 2`
        let span = spec.start.manhattan(spec.end) as f64;
        let distance = (self.config.distance_factor * span * width.max(height) as f64 / (width + height) as f64).ceil() as Coord;

        self.config.base
            .saturating_add(turn)
            .saturating_add(distance)
            .min(cap)
            .max(coverage_gap.min(cap))
    }

    /// For every mandatory cell, the `coverage_candidates` lines whose endpoint rectangles lie nearest
    /// (ties broken by line index) must stretch to reach it. Returns the required gap per line.
    fn coverage_gaps(&self, problem: &Problem, endpoint_boxes: &[BoundingBox]) -> Vec<Coord> {
        let mut gaps = vec![0; endpoint_boxes.len()];
        if !problem.requires_coverage() {
            return gaps;
        }

        for cell in problem.mandatory_cells() {
            endpoint_boxes.iter()
                .map(|bounds| bounds.gap_to(*cell))
                .enumerate()
                .sorted_by_key(|(line, gap)| (*gap, *line))
                .take(self.config.coverage_candidates)
                .for_each(|(line, gap)| gaps[line] = gaps[line].max(gap));
        }

        gaps
    }
}

impl Pruning for Buffered {
    fn bounding_boxes(&self, problem: &Problem) -> Vec<BoundingBox> {
        let endpoint_boxes = problem.lines().iter()
            .map(|spec| BoundingBox::spanning(spec.start, spec.end))
            .collect_vec();
        let gaps = self.coverage_gaps(problem, &endpoint_boxes);

        endpoint_boxes.into_iter()
            .zip(problem.lines())
            .zip(gaps)
            .map(|((bounds, spec), gap)| bounds.grown(self.buffer(problem, spec, gap), problem.dims()))
            .collect_vec()
    }
}

/// Line pairs whose boxes share at least one cell; only these need mutual exclusion.
pub fn overlapping_lines(boxes: &[BoundingBox]) -> Vec<UnorderedPair<LineId>> {
    boxes.iter()
        .enumerate()
        .tuple_combinations()
        .filter(|((_, a), (_, b))| a.overlaps(b))
        .map(|((a, _), (b, _))| UnorderedPair(a, b))
        .collect_vec()
}

/// The cells and moves available to one line.
///
/// Cells of the box are nodes; every pair of in-box neighbours is joined by an edge weighted with the
/// forward ([`Direction::Right`] or [`Direction::Down`]) direction from its lower endpoint.
#[derive(Clone, Debug)]
pub struct LineDomain {
    pub(crate) line: LineId,
    pub(crate) bounds: BoundingBox,
    pub(crate) graph: UnGraphMap<Location, Direction>,
}

impl LineDomain {
    /// Build the domain for `line`, widening `bounds` to contain both endpoints and clamping it to the grid.
    pub fn new(line: LineId, spec: &LineSpec, bounds: BoundingBox, dims: (Dimension, Dimension)) -> Self {
        let bounds = bounds.clamped(dims).including(spec.start).including(spec.end);

        let mut graph = UnGraphMap::with_capacity(
            bounds.area(),
            // "horizontal" edges
            (bounds.width() - 1) * bounds.height()
                // "vertical" edges
                + (bounds.height() - 1) * bounds.width(),
        );
        for location in bounds.cells() {
            graph.add_node(location);
        }
        for location in bounds.cells() {
            for direction in Direction::FORWARD_VARIANTS {
                let neighbor = direction.attempt_from(location);
                if bounds.contains(neighbor) {
                    graph.add_edge(location, neighbor, *direction);
                }
            }
        }

        Self { line, bounds, graph }
    }

    /// The line this domain belongs to.
    pub fn line(&self) -> LineId {
        self.line
    }

    /// The box after widening to the endpoints and clamping to the grid.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Whether the line may occupy `location`.
    pub fn contains(&self, location: Location) -> bool {
        self.graph.contains_node(location)
    }

    /// Moves from `location` to in-box neighbours, in [`Direction`] order.
    pub fn moves_from(&self, location: Location) -> Vec<(Direction, Location)> {
        self.graph.neighbors(location)
            .filter_map(|neighbor| Direction::direction_to(location, neighbor).map(|direction| (direction, neighbor)))
            .sorted_by_key(|(direction, _)| *direction)
            .collect_vec()
    }

    /// Every adjacent pair once, as `(from, to, forward direction from -> to)`.
    pub fn edges(&self) -> impl Iterator<Item = (Location, Location, Direction)> + '_ {
        self.graph.all_edges().map(|(a, b, forward)| match forward.attempt_from(a) == b {
            true => (a, b, *forward),
            false => (b, a, *forward),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use unordered_pair::UnorderedPair;

    use crate::builder::ProblemBuilder;
    use crate::domain::{overlapping_lines, BoundingBox, BufferConfig, Buffered, FullGrid, LineDomain, Pruning};
    use crate::location::Location;
    use crate::problem::LineSpec;
    use crate::shape::Direction;

    fn dims(width: usize, height: usize) -> (NonZero<usize>, NonZero<usize>) {
        (NonZero::new(width).unwrap(), NonZero::new(height).unwrap())
    }

    #[test]
    fn box_geometry() {
        let bounds = BoundingBox::spanning(Location(3, 1), Location(1, 2));
        assert_eq!(bounds, BoundingBox { min: Location(1, 1), max: Location(3, 2) });
        assert_eq!(bounds.area(), 6);
        assert_eq!(bounds.cells().take(3).collect::<Vec<_>>(), vec![Location(1, 1), Location(1, 2), Location(2, 1)]);
        assert_eq!(bounds.gap_to(Location(2, 2)), 0);
        assert_eq!(bounds.gap_to(Location(0, 5)), 3);
        assert_eq!(bounds.grown(2, dims(5, 4)), BoundingBox { min: Location(0, 0), max: Location(4, 3) });
        assert!(bounds.overlaps(&BoundingBox::spanning(Location(3, 2), Location(4, 4))));
        assert!(!bounds.overlaps(&BoundingBox::spanning(Location(4, 0), Location(4, 4))));
    }

    #[test]
    fn full_grid_covers_everything() {
        let problem = ProblemBuilder::with_dims(dims(4, 3))
            .add_line((Location(0, 0), Location(1, 0)))
            .add_line((Location(3, 2), Location(3, 1)))
            .build()
            .unwrap();
        let boxes = FullGrid.bounding_boxes(&problem);
        assert_eq!(boxes, vec![BoundingBox { min: Location(0, 0), max: Location(3, 2) }; 2]);
    }

    #[test]
    fn buffer_grows_with_turn_budget() {
        let mut builder = ProblemBuilder::with_dims(dims(20, 20));
        builder.add_line((Location(10, 10), Location(10, 10)));
        let pruning = Buffered::new(BufferConfig { distance_factor: 0.0, ..Default::default() });

        let tight = pruning.bounding_boxes(&builder.max_turns(0).build().unwrap());
        let loose = pruning.bounding_boxes(&builder.max_turns(3).build().unwrap());
        assert_eq!(tight[0], BoundingBox { min: Location(9, 9), max: Location(11, 11) });
        assert_eq!(loose[0], BoundingBox { min: Location(6, 6), max: Location(14, 14) });
    }

    #[test]
    fn buffer_is_capped() {
        let problem = ProblemBuilder::with_dims(dims(40, 40))
            .max_turns(30)
            .add_line((Location(20, 20), Location(21, 20)))
            .build()
            .unwrap();
        let pruning = Buffered::new(BufferConfig { max_buffer: 4, ..Default::default() });
        assert_eq!(pruning.bounding_boxes(&problem)[0], BoundingBox { min: Location(16, 16), max: Location(25, 24) });
    }

    #[test]
    fn long_lines_get_more_room() {
        let problem = ProblemBuilder::with_dims(dims(10, 10))
            .add_line((Location(0, 5), Location(9, 5)))
            .add_line((Location(5, 0), Location(5, 1)))
            .build()
            .unwrap();
        let pruning = Buffered::new(BufferConfig { base: 0, per_turn: 0, ..Default::default() });
        let spec = problem.lines()[0];
        // ceil(0.5 * 9 * 10 / 20)
        assert_eq!(pruning.buffer(&problem, &spec, 0), 3);
        // ceil(0.5 * 1 * 10 / 20)
        assert_eq!(pruning.buffer(&problem, &problem.lines()[1], 0), 1);
    }

    #[test]
    fn nearest_lines_stretch_to_mandatory_cells() {
        let problem = ProblemBuilder::with_dims(dims(12, 12))
            .add_line((Location(0, 0), Location(0, 1)))
            .add_line((Location(11, 11), Location(10, 11)))
            .add_line((Location(4, 10), Location(5, 10)))
            .add_mandatory(Location(5, 5))
            .build()
            .unwrap();
        let pruning = Buffered::new(BufferConfig {
            base: 0,
            per_turn: 0,
            distance_factor: 0.0,
            coverage_candidates: 2,
            max_buffer: 10,
        });
        let boxes = pruning.bounding_boxes(&problem);
        // gaps: line 0 -> 5, line 1 -> 6, line 2 -> 5; lines 0 and 2 are nearest
        assert!(boxes[0].contains(Location(5, 5)));
        assert!(boxes[2].contains(Location(5, 5)));
        assert!(!boxes[1].contains(Location(5, 5)));
    }

    #[test]
    fn cap_can_leave_mandatory_cell_unreachable() {
        let problem = ProblemBuilder::with_dims(dims(12, 12))
            .add_line((Location(0, 0), Location(0, 1)))
            .add_mandatory(Location(9, 9))
            .build()
            .unwrap();
        let pruning = Buffered::new(BufferConfig { max_buffer: 2, ..Default::default() });
        assert!(!pruning.bounding_boxes(&problem)[0].contains(Location(9, 9)));
    }

    #[test]
    fn overlap_pairs() {
        let boxes = vec![
            BoundingBox::spanning(Location(0, 0), Location(2, 2)),
            BoundingBox::spanning(Location(2, 2), Location(4, 4)),
            BoundingBox::spanning(Location(5, 0), Location(5, 5)),
        ];
        assert_eq!(overlapping_lines(&boxes), vec![UnorderedPair(0, 1)]);
    }

    #[test]
    fn domain_always_holds_endpoints() {
        let spec = LineSpec { start: Location(0, 0), end: Location(3, 1) };
        let domain = LineDomain::new(0, &spec, BoundingBox::spanning(Location(1, 1), Location(1, 1)), dims(4, 2));
        assert_eq!(domain.bounds(), BoundingBox { min: Location(0, 0), max: Location(3, 1) });
        assert!(domain.contains(spec.start) && domain.contains(spec.end));
    }

    #[test]
    fn moves_stay_in_box() {
        let spec = LineSpec { start: Location(1, 1), end: Location(2, 1) };
        let domain = LineDomain::new(0, &spec, BoundingBox::spanning(Location(1, 0), Location(2, 1)), dims(5, 5));
        assert_eq!(domain.moves_from(Location(1, 1)), vec![(Direction::Right, Location(2, 1)), (Direction::Up, Location(1, 0))]);
        assert_eq!(domain.edges().count(), 4);
        assert!(domain.edges().all(|(from, to, forward)| Direction::FORWARD_VARIANTS.contains(&forward) && forward.attempt_from(from) == to));
    }
}

//! Grid coordinates.

use std::fmt::{Display, Formatter};
use std::num::NonZero;

use ndarray::Ix;

/// A grid coordinate, counted from the top-left cell.
pub type Coord = usize;
/// A grid extent; grids are never empty.
pub type Dimension = NonZero<Coord>;

#[derive(Clone, Eq, Hash, Copy, PartialEq, Ord, PartialOrd, Debug)]
/// A location `(x, y)` on the grid. The top left corner is `Location(0, 0)`.
///
/// `x` counts columns to the right and `y` counts rows downward.
pub struct Location(pub Coord, pub Coord);

impl Location {
    /// Row-major index into an [`ndarray::Array2`] shaped `(height, width)`.
    pub(crate) fn as_index(&self) -> (Coord, Coord) {
        (self.1, self.0)
    }

    pub(crate) fn offset_by(self, rhs: (isize, isize)) -> Self {
        Self(self.0.wrapping_add_signed(rhs.0), self.1.wrapping_add_signed(rhs.1))
    }

    /// Taxicab distance between `self` and `other`.
    pub fn manhattan(self, other: Location) -> Coord {
        self.0.abs_diff(other.0) + self.1.abs_diff(other.1)
    }

    /// Whether this location lies on a grid of the given `(width, height)`.
    pub fn within(self, dims: (Dimension, Dimension)) -> bool {
        self.0 < dims.0.get() && self.1 < dims.1.get()
    }
}

impl From<(Ix, Ix)> for Location {
    fn from(value: (Ix, Ix)) -> Self {
        Self(value.1, value.0)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

//! Moves on the square grid.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantArray};

use crate::location::{Dimension, Location};

/// A unit move on the square grid.
///
/// Variant order matters: it is the order in which direction variables are allocated and the
/// priority in which the decoder scans for the next move.
/// [`Display`](std::fmt::Display) and [`FromStr`](std::str::FromStr) use the single-letter symbols
/// of the path output format.
#[derive(Copy, Clone, Debug, Display, EnumString, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize, VariantArray)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increasing x.
    #[strum(serialize = "R")]
    Right,
    /// Decreasing x.
    #[strum(serialize = "L")]
    Left,
    /// Increasing y.
    #[strum(serialize = "D")]
    Down,
    /// Decreasing y.
    #[strum(serialize = "U")]
    Up,
}

impl Direction {
    /// Directions which, stepping from one location to another, land on a location ordered after the origin.
    pub const FORWARD_VARIANTS: &'static [Self] = &[Self::Right, Self::Down];

    /// Attempt the step from `location`; the result may be off the grid (coordinates wrap below zero).
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Right => location.offset_by((1, 0)),
            Self::Left => location.offset_by((-1, 0)),
            Self::Down => location.offset_by((0, 1)),
            Self::Up => location.offset_by((0, -1)),
        }
    }

    /// Step from `location`, returning [`None`] if that would leave a grid of size `dims`.
    pub fn step(&self, location: Location, dims: (Dimension, Dimension)) -> Option<Location> {
        Some(self.attempt_from(location)).filter(|next| next.within(dims))
    }

    /// The opposite direction.
    pub fn invert(&self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
            Self::Down => Self::Up,
            Self::Up => Self::Down,
        }
    }

    /// The direction leading from `a` to the adjacent `b`, or [`None`] if they are not adjacent.
    pub fn direction_to(a: Location, b: Location) -> Option<Self> {
        Self::VARIANTS.iter().find(|dir| dir.attempt_from(a) == b).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use crate::location::Location;
    use crate::shape::Direction;

    #[test]
    fn steps_stay_on_grid() {
        let dims = (NonZero::new(3).unwrap(), NonZero::new(2).unwrap());
        assert_eq!(Direction::Right.step(Location(1, 1), dims), Some(Location(2, 1)));
        assert_eq!(Direction::Right.step(Location(2, 1), dims), None);
        assert_eq!(Direction::Up.step(Location(0, 0), dims), None);
        assert_eq!(Direction::Down.step(Location(0, 0), dims), Some(Location(0, 1)));
    }

    #[test]
    fn directions_between_neighbours() {
        assert_eq!(Direction::direction_to(Location(1, 1), Location(1, 0)), Some(Direction::Up));
        assert_eq!(Direction::direction_to(Location(1, 1), Location(2, 2)), None);
        assert_eq!(Direction::Left.invert(), Direction::Right);
    }

    #[test]
    fn symbols() {
        assert_eq!(Direction::Down.to_string(), "D");
        assert_eq!("L".parse::<Direction>().unwrap(), Direction::Left);
        assert!("X".parse::<Direction>().is_err());
    }
}

#![warn(missing_docs)]

//! # `metrosat`
//!
//! Route metro lines across a rectangular city grid by reduction to Boolean satisfiability.
//! Each line joins two given stations, lines never share a cell, each line changes direction at most `J` times
//! and, in the coverage scenario, every mandatory cell lies on some line.
//!
//! Describe a city with a [`ProblemBuilder`](builder::ProblemBuilder) or parse one from text, [`encode`] it
//! under a [`Pruning`](domain::Pruning) strategy, hand the clauses to any SAT solver (or [`solve`] in process
//! with `varisat`), then [`decode`] the model back into [`Route`]s and check them with a [`MetroMap`].
//!
//! # Internals
//! Every line gets its own family of variables over the cells of its bounding box:
//! 1. `Cell(k, x, y)`: line k occupies the cell.
//! 2. `Dir(k, x, y, d)`: line k leaves the cell moving in direction d. Only moves staying inside the box exist.
//! 3. `Turn(k, x, y)`: line k changes direction in the cell.
//!
//! Flow rules make the start emit one move, the end absorb one, and every other occupied cell pass exactly one
//! move through. Turn indicators are tied to pairs of incoming and outgoing moves and bounded by a sequential
//! counter, whose auxiliary bits are a fourth family of variables. The variable map is persisted alongside the
//! DIMACS output so that a model produced elsewhere can be decoded later.
//!
//! Note that nothing forbids a line from also forming a loop detached from its route; the decoder only follows
//! the route from the start, and [`MetroMap`] reports any damage such a loop does to coverage.

pub use assignment::{Assignment, SolverResult};
pub use builder::ProblemBuilder;
pub use decoder::{decode, Route};
pub use encoder::{encode, Encoding};
pub use error::Error;
pub use location::Location;
pub use metro_map::MetroMap;
pub use problem::Problem;
pub use solve::solve;

pub mod assignment;
pub mod builder;
pub mod decoder;
pub mod dimacs;
pub mod domain;
pub mod encoder;
pub mod error;
pub mod io;
pub mod location;
pub mod logic;
pub mod metro_map;
pub mod problem;
pub mod shape;
pub mod solve;
pub mod variable;

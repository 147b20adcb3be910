//! Incremental, validating construction of [`Problem`]s.

use std::fmt::{Display, Formatter};
use std::num::NonZero;

use crate::location::{Dimension, Location};
use crate::problem::{LineSpec, Problem, Scenario};

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A line endpoint or mandatory cell was placed outside the bounds specified by `dims` on the builder.
    FeatureOutOfBounds { location: Location },
}

impl Display for BuilderInvalidReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FeatureOutOfBounds { location } => write!(f, "{location} lies outside the grid"),
        }
    }
}

/// A builder for [`Problem`]s.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
/// Once a feature is rejected the builder is invalid and ignores every further call except [`Self::build`],
/// which reports why.
#[derive(Clone, Debug)]
pub struct ProblemBuilder {
    // width, height
    dims: (Dimension, Dimension),
    scenario: Option<Scenario>,
    max_turns: usize,
    lines: Vec<LineSpec>,
    mandatory: Vec<Location>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl Default for ProblemBuilder {
    fn default() -> Self {
        Self::with_dims((NonZero::new(5).unwrap(), NonZero::new(5).unwrap()))
    }
}

impl ProblemBuilder {
    /// Construct a new [`Self`] with the specified dimensions, specified in `(x, y)` order.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            scenario: None,
            max_turns: 0,
            lines: Default::default(),
            mandatory: Default::default(),
            invalid_reasons: Default::default(),
        }
    }

    /// Force the scenario.
    ///
    /// Left unset, the scenario is [`Scenario::Coverage`] if any mandatory cell was added and [`Scenario::Basic`] otherwise.
    pub fn scenario(&mut self, scenario: Scenario) -> &mut Self {
        self.scenario = Some(scenario);
        self
    }

    /// Set the maximum number of direction changes each line may make.
    pub fn max_turns(&mut self, max_turns: usize) -> &mut Self {
        self.max_turns = max_turns;
        self
    }

    /// Add a metro line running from `endpoints.0` to `endpoints.1`. Lines are numbered in the order they are added.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if either location is out of bounds.
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn add_line(&mut self, endpoints: (Location, Location)) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        for location in [endpoints.0, endpoints.1] {
            if !location.within(self.dims) {
                self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds { location });
                return self;
            }
        }

        self.lines.push(LineSpec { start: endpoints.0, end: endpoints.1 });
        self
    }

    /// Remove the most recently added line.
    ///
    /// If the builder is in an invalid state or no lines are present, this function does nothing.
    pub fn pop_line(&mut self) -> &mut Self {
        if self.invalid_reasons.is_empty() {
            self.lines.pop();
        }

        self
    }

    /// Require that some line passes through `location`.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if `location` is out of bounds.
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn add_mandatory(&mut self, location: Location) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !location.within(self.dims) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds { location });
            return self;
        }

        self.mandatory.push(location);
        self
    }

    /// Check the validity of this builder.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into a [`Problem`].
    /// If the builder is invalid for any reason, a reference to a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    pub fn build(&self) -> Result<Problem, &Vec<BuilderInvalidReason>> {
        if !self.invalid_reasons.is_empty() {
            return Err(&self.invalid_reasons);
        }

        let scenario = self.scenario.unwrap_or(if self.mandatory.is_empty() {
            Scenario::Basic
        } else {
            Scenario::Coverage
        });

        Ok(Problem {
            scenario,
            dims: self.dims,
            max_turns: self.max_turns,
            lines: self.lines.clone(),
            mandatory: self.mandatory.clone(),
        })
    }
}

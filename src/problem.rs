//! Routing problems and their text format.

use std::fmt::{Display, Formatter};
use std::num::NonZero;
use std::str::FromStr;

use itertools::Itertools;

use crate::builder::ProblemBuilder;
use crate::error::ProblemError;
use crate::location::{Coord, Dimension, Location};

/// Index of a metro line, in the order lines appear in the problem.
pub type LineId = usize;

/// Which family of constraints a problem asks for.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Scenario {
    /// Disjoint, turn-limited lines.
    Basic,
    /// As [`Scenario::Basic`], and every mandatory cell is covered by some line.
    Coverage,
}

impl Scenario {
    /// The tag used on the first line of a problem file.
    pub fn tag(self) -> u8 {
        match self {
            Self::Basic => 1,
            Self::Coverage => 2,
        }
    }

    /// The scenario for a problem file tag.
    pub fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            1 => Some(Self::Basic),
            2 => Some(Self::Coverage),
            _ => None,
        }
    }
}

/// The two endpoints of one metro line.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct LineSpec {
    /// The line's first station.
    pub start: Location,
    /// The line's last station.
    pub end: Location,
}

/// An immutable routing problem: grid size, lines, turn budget and mandatory cells.
///
/// Build one with a [`ProblemBuilder`](crate::builder::ProblemBuilder) or parse the textual format with [`str::parse`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Problem {
    pub(crate) scenario: Scenario,
    pub(crate) dims: (Dimension, Dimension),
    pub(crate) max_turns: usize,
    pub(crate) lines: Vec<LineSpec>,
    pub(crate) mandatory: Vec<Location>,
}

impl Problem {
    /// Which constraint families apply.
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// `(width, height)`
    pub fn dims(&self) -> (Dimension, Dimension) {
        self.dims
    }

    /// `N`, the number of columns.
    pub fn width(&self) -> Coord {
        self.dims.0.get()
    }

    /// `M`, the number of rows.
    pub fn height(&self) -> Coord {
        self.dims.1.get()
    }

    /// Number of cells on the grid.
    pub fn cell_count(&self) -> usize {
        self.width() * self.height()
    }

    /// `K`, the number of metro lines.
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// The turn budget `J` shared by every line.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Line endpoints, indexed by [`LineId`].
    pub fn lines(&self) -> &[LineSpec] {
        &self.lines
    }

    /// Endpoints of `line`, if it exists.
    pub fn line(&self, line: LineId) -> Option<&LineSpec> {
        self.lines.get(line)
    }

    /// Cells listed as mandatory, whether or not the scenario asks for coverage.
    pub fn mandatory_cells(&self) -> &[Location] {
        &self.mandatory
    }

    /// Whether mandatory-cell coverage is part of the encoding.
    pub fn requires_coverage(&self) -> bool {
        self.scenario == Scenario::Coverage && !self.mandatory.is_empty()
    }

    /// Whether `location` lies on the grid.
    pub fn contains(&self, location: Location) -> bool {
        location.within(self.dims)
    }
}

/// The problem file format read by [`Problem::from_str`]. The mandatory count is only written when there are
/// mandatory cells.
impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.scenario.tag())?;
        write!(f, "{} {} {} {}", self.width(), self.height(), self.num_lines(), self.max_turns)?;
        match self.mandatory.is_empty() {
            true => writeln!(f)?,
            false => writeln!(f, " {}", self.mandatory.len())?,
        }
        for LineSpec { start, end } in &self.lines {
            writeln!(f, "{} {} {} {}", start.0, start.1, end.0, end.1)?;
        }
        if !self.mandatory.is_empty() {
            writeln!(f, "{}", self.mandatory.iter().map(|cell| format!("{} {}", cell.0, cell.1)).join(" "))?;
        }
        Ok(())
    }
}

/// One non-blank line of a problem file, split into tokens.
struct Record<'a> {
    line: usize,
    tokens: Vec<&'a str>,
}

impl<'a> Record<'a> {
    fn expect_len(&self, what: &str, expected: impl Fn(usize) -> bool, described: &str) -> Result<(), ProblemError> {
        match expected(self.tokens.len()) {
            true => Ok(()),
            false => Err(ProblemError::FieldCount {
                line: self.line,
                what: what.to_string(),
                expected: described.to_string(),
                found: self.tokens.len(),
            }),
        }
    }

    fn int(&self, index: usize, field: &str) -> Result<i64, ProblemError> {
        let token = self.tokens[index];
        token.parse().map_err(|_| ProblemError::InvalidInteger {
            line: self.line,
            field: field.to_string(),
            token: token.to_string(),
        })
    }

    fn count(&self, index: usize, field: &str) -> Result<usize, ProblemError> {
        let value = self.int(index, field)?;
        usize::try_from(value).map_err(|_| ProblemError::Negative { line: self.line, field: field.to_string(), value })
    }

    fn location(&self, index: usize, what: &str) -> Result<Location, ProblemError> {
        Ok(Location(
            self.count(index, &format!("x of {what}"))?,
            self.count(index + 1, &format!("y of {what}"))?,
        ))
    }
}

impl FromStr for Problem {
    type Err = ProblemError;

    /// Parse the problem file format:
    ///
    /// ```text
    /// <scenario tag>
    /// N M K J [P]
    /// startX startY endX endY     (K times)
    /// x1 y1 x2 y2 ... xP yP       (only if P > 0)
    /// ```
    ///
    /// Blank lines are ignored. Coordinates must lie on the grid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut records = s.lines()
            .enumerate()
            .map(|(index, text)| Record { line: index + 1, tokens: text.split_whitespace().collect_vec() })
            .filter(|record| !record.tokens.is_empty());

        let tag_record = records.next().ok_or(ProblemError::Empty)?;
        tag_record.expect_len("scenario tag", |n| n == 1, "1")?;
        let tag = tag_record.int(0, "scenario tag")?;
        let scenario = Scenario::from_tag(tag).ok_or(ProblemError::UnknownScenario { line: tag_record.line, tag })?;

        let header = records.next().ok_or_else(|| ProblemError::MissingLine { what: "the grid header".to_string() })?;
        header.expect_len("grid header", |n| n == 4 || n == 5, "4 or 5")?;
        let width = NonZero::new(header.count(0, "N")?).ok_or(ProblemError::ZeroDimension { line: header.line, axis: "width N" })?;
        let height = NonZero::new(header.count(1, "M")?).ok_or(ProblemError::ZeroDimension { line: header.line, axis: "height M" })?;
        let num_lines = header.count(2, "K")?;
        let max_turns = header.count(3, "J")?;
        let num_mandatory = match header.tokens.len() {
            5 => header.count(4, "P")?,
            _ => 0,
        };

        let mut builder = ProblemBuilder::with_dims((width, height));
        builder.scenario(scenario).max_turns(max_turns);

        for line in 0..num_lines {
            let what = format!("metro line {line}");
            let record = records.next().ok_or_else(|| ProblemError::MissingLine { what: what.clone() })?;
            record.expect_len(&what, |n| n == 4, "4")?;
            builder.add_line((
                record.location(0, &format!("start of {what}"))?,
                record.location(2, &format!("end of {what}"))?,
            ));
        }

        if num_mandatory > 0 {
            let record = records.next().ok_or_else(|| ProblemError::MissingLine { what: "the mandatory cells".to_string() })?;
            record.expect_len("mandatory cells", |n| n == 2 * num_mandatory, &(2 * num_mandatory).to_string())?;
            for cell in 0..num_mandatory {
                builder.add_mandatory(record.location(2 * cell, &format!("mandatory cell {cell}"))?);
            }
        }

        if let Some(extra) = records.next() {
            return Err(ProblemError::TrailingData { line: extra.line, declared: num_lines });
        }

        builder.build().map_err(|reasons| ProblemError::Invalid(reasons.clone()))
    }
}

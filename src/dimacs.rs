//! DIMACS CNF output.

use std::fmt::{self, Display, Formatter};
use std::io::{self, BufWriter, Write};

use itertools::Itertools;

use crate::encoder::Encoding;

/// DIMACS CNF rendering of an [`Encoding`]: a `p cnf <variables> <clauses>` header, then one clause per
/// line as signed 1-based variable numbers terminated by `0`. The empty clause is the line `0`.
///
/// The variable count is the number of allocated variables, including any that no clause mentions.
#[derive(Clone, Copy, Debug)]
pub struct Dimacs<'a>(pub &'a Encoding);

impl Display for Dimacs<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let encoding = self.0;
        writeln!(f, "p cnf {} {}", encoding.num_vars(), encoding.num_clauses())?;
        for clause in encoding.clauses() {
            match clause.is_empty() {
                true => writeln!(f, "0")?,
                false => writeln!(f, "{} 0", clause.iter().map(|lit| lit.to_dimacs()).join(" "))?,
            }
        }
        Ok(())
    }
}

/// Write `encoding` in DIMACS CNF, see [`Dimacs`].
pub fn write_dimacs(writer: &mut impl Write, encoding: &Encoding) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    write!(writer, "{}", Dimacs(encoding))?;
    writer.flush()
}

//! The files of one encode/solve/decode run, all named after a common base path.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::assignment::SolverResult;
use crate::decoder::{write_routes, Route};
use crate::dimacs::write_dimacs;
use crate::encoder::Encoding;
use crate::error::Error;
use crate::problem::Problem;
use crate::variable::VarMap;

/// Paths derived from a base name `B`: `B.city`, `B.satinput`, `B.varmap`, `B.satoutput` and `B.metromap`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifacts {
    base: PathBuf,
}

impl Artifacts {
    /// Files named after `base`, e.g. `maps/city` gives `maps/city.city`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn with_extension(&self, extension: &str) -> PathBuf {
        let mut path = self.base.clone().into_os_string();
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }

    /// The problem.
    pub fn problem(&self) -> PathBuf {
        self.with_extension("city")
    }

    /// The CNF, in DIMACS.
    pub fn cnf(&self) -> PathBuf {
        self.with_extension("satinput")
    }

    /// `<base>.varmap`
    pub fn var_map(&self) -> PathBuf {
        self.with_extension("varmap")
    }

    /// What the SAT solver said.
    pub fn solver_output(&self) -> PathBuf {
        self.with_extension("satoutput")
    }

    /// The decoded routes.
    pub fn routes(&self) -> PathBuf {
        self.with_extension("metromap")
    }
}

/// Read and parse a problem file.
pub fn read_problem(path: &Path) -> Result<Problem, Error> {
    let text = fs::read_to_string(path).map_err(Error::io(path))?;
    Ok(text.parse()?)
}

/// Read a persisted variable map, validating it.
pub fn read_var_map(path: &Path) -> Result<VarMap, Error> {
    let file = File::open(path).map_err(Error::io(path))?;
    Ok(VarMap::read_json(&mut BufReader::new(file))?)
}

/// Read a solver result in either supported format.
pub fn read_solver_output(path: &Path) -> Result<SolverResult, Error> {
    let text = fs::read_to_string(path).map_err(Error::io(path))?;
    Ok(text.parse()?)
}

/// Write to `path` through a buffer, replacing any existing file.
fn write_with<F>(path: &Path, write: F) -> Result<(), Error>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), Error>,
{
    let file = File::create(path).map_err(Error::io(path))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(Error::io(path))
}

/// Write the encoding as DIMACS CNF.
pub fn write_cnf(path: &Path, encoding: &Encoding) -> Result<(), Error> {
    write_with(path, |writer| write_dimacs(writer, encoding).map_err(Error::io(path)))
}

/// Persist the variable map as JSON.
pub fn write_var_map(path: &Path, vars: &VarMap) -> Result<(), Error> {
    write_with(path, |writer| Ok(vars.write_json(writer)?))
}

/// Write a solver result in the minisat format.
pub fn write_solver_output(path: &Path, result: &SolverResult) -> Result<(), Error> {
    write_with(path, |writer| result.write(writer).map_err(Error::io(path)))
}

/// Write the path file, one line per metro line.
pub fn write_route_file(path: &Path, problem: &Problem, routes: Option<&[Route]>) -> Result<(), Error> {
    write_with(path, |writer| write_routes(writer, problem, routes).map_err(Error::io(path)))
}

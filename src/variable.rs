//! SAT variables, what they mean, and how the mapping is persisted.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use varisat::Var;

use crate::error::VarMapError;
use crate::location::{Coord, Location};
use crate::problem::LineId;
use crate::shape::Direction;

/// The meaning of a SAT variable.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VarKey {
    /// `line` occupies `(x, y)`.
    Cell { line: LineId, x: Coord, y: Coord },
    /// `line` leaves `(x, y)` moving in `direction`.
    Dir { line: LineId, x: Coord, y: Coord, direction: Direction },
    /// `line` changes direction while passing through `(x, y)`.
    Turn { line: LineId, x: Coord, y: Coord },
    /// Sequential counter bit: among the first `i` indicators of counter `group`, at least `j` are true.
    SeqCount { group: usize, i: usize, j: usize },
}

impl VarKey {
    /// Key of `Cell(line, location)`.
    pub fn cell(line: LineId, location: Location) -> Self {
        Self::Cell { line, x: location.0, y: location.1 }
    }

    /// Key of `Dir(line, location, direction)`.
    pub fn dir(line: LineId, location: Location, direction: Direction) -> Self {
        Self::Dir { line, x: location.0, y: location.1, direction }
    }

    /// Key of `Turn(line, location)`.
    pub fn turn(line: LineId, location: Location) -> Self {
        Self::Turn { line, x: location.0, y: location.1 }
    }

    /// Key of a counter bit.
    pub fn seq_count(group: usize, i: usize, j: usize) -> Self {
        Self::SeqCount { group, i, j }
    }
}

/// One persisted `key -> id` entry; `id` is the DIMACS variable number.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VarRecord {
    /// 1-based variable number.
    pub id: usize,
    /// What the variable stands for.
    pub key: VarKey,
}

/// Bijection between [`VarKey`]s and dense SAT variables, numbered in first-use order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VarMap {
    ids: HashMap<VarKey, Var>,
    // indexed by Var::index
    keys: Vec<VarKey>,
}

impl VarMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the variable for `key`, creating the next unused one if `key` is new.
    pub fn allocate(&mut self, key: VarKey) -> Var {
        if let Some(var) = self.ids.get(&key) {
            return *var;
        }

        let var = Var::from_index(self.keys.len());
        self.ids.insert(key, var);
        self.keys.push(key);
        var
    }

    /// Look `key` up without allocating. [`None`] means the key does not exist in this encoding,
    /// e.g. a move leaving a line's bounding box.
    pub fn get(&self, key: &VarKey) -> Option<Var> {
        self.ids.get(key).copied()
    }

    /// The key `var` stands for.
    pub fn key_of(&self, var: Var) -> Option<&VarKey> {
        self.keys.get(var.index())
    }

    /// Number of allocated variables.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All variables in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Var, &VarKey)> {
        self.keys.iter().enumerate().map(|(index, key)| (Var::from_index(index), key))
    }

    /// Every entry in id order.
    pub fn records(&self) -> Vec<VarRecord> {
        self.iter()
            .map(|(var, key)| VarRecord { id: var.to_dimacs() as usize, key: *key })
            .collect()
    }

    /// Rebuild a map from records in any order; ids must be exactly `1..=records.len()` and keys unique.
    pub fn from_records(mut records: Vec<VarRecord>) -> Result<Self, VarMapError> {
        records.sort_by_key(|record| record.id);

        let mut seen = HashSet::with_capacity(records.len());
        let mut map = Self::new();
        for (index, record) in records.into_iter().enumerate() {
            if record.id != index + 1 {
                return Err(VarMapError::NonDense { expected: index + 1, found: record.id });
            }
            if !seen.insert(record.key) {
                return Err(VarMapError::DuplicateKey { key: record.key });
            }
            map.allocate(record.key);
        }

        Ok(map)
    }

    /// Write the map as a JSON array of records.
    pub fn write_json(&self, writer: &mut impl Write) -> Result<(), VarMapError> {
        serde_json::to_writer(writer, &self.records())?;
        Ok(())
    }

    /// Read a map written by [`VarMap::write_json`], rejecting gaps and duplicate keys.
    pub fn read_json(reader: &mut impl Read) -> Result<Self, VarMapError> {
        Self::from_records(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::VarMapError;
    use crate::location::Location;
    use crate::shape::Direction;
    use crate::variable::{VarKey, VarMap, VarRecord};

    #[test]
    fn allocate_is_idempotent_and_dense() {
        let mut vars = VarMap::new();
        let a = vars.allocate(VarKey::cell(0, Location(1, 2)));
        let b = vars.allocate(VarKey::dir(0, Location(1, 2), Direction::Up));
        assert_eq!(vars.allocate(VarKey::cell(0, Location(1, 2))), a);
        assert_eq!((a.to_dimacs(), b.to_dimacs()), (1, 2));
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.key_of(b), Some(&VarKey::dir(0, Location(1, 2), Direction::Up)));
        assert_eq!(vars.get(&VarKey::turn(0, Location(1, 2))), None);
    }

    #[test]
    fn json_round_trip() {
        let mut vars = VarMap::new();
        vars.allocate(VarKey::cell(1, Location(0, 3)));
        vars.allocate(VarKey::dir(1, Location(0, 3), Direction::Right));
        vars.allocate(VarKey::turn(1, Location(0, 3)));
        vars.allocate(VarKey::seq_count(1, 2, 1));

        let mut buf = Vec::new();
        vars.write_json(&mut buf).unwrap();
        let json = String::from_utf8(buf.clone()).unwrap();
        assert!(json.starts_with(r#"[{"id":1,"key":{"kind":"cell","line":1,"x":0,"y":3}},{"id":2,"key":{"kind":"dir","line":1,"x":0,"y":3,"direction":"right"}}"#));

        let restored = VarMap::read_json(&mut buf.as_slice()).unwrap();
        assert_eq!(restored, vars);
    }

    #[test]
    fn records_may_arrive_out_of_order() {
        let records = vec![
            VarRecord { id: 2, key: VarKey::turn(0, Location(0, 0)) },
            VarRecord { id: 1, key: VarKey::cell(0, Location(0, 0)) },
        ];
        let vars = VarMap::from_records(records).unwrap();
        assert_eq!(vars.iter().map(|(_, key)| *key).collect::<Vec<_>>(), vec![
            VarKey::cell(0, Location(0, 0)),
            VarKey::turn(0, Location(0, 0)),
        ]);
    }

    #[test]
    fn reject_gap_in_ids() {
        let records = vec![
            VarRecord { id: 1, key: VarKey::cell(0, Location(0, 0)) },
            VarRecord { id: 3, key: VarKey::turn(0, Location(0, 0)) },
        ];
        assert!(matches!(VarMap::from_records(records), Err(VarMapError::NonDense { expected: 2, found: 3 })));
    }

    #[test]
    fn reject_duplicate_key() {
        let records = vec![
            VarRecord { id: 1, key: VarKey::cell(0, Location(0, 0)) },
            VarRecord { id: 2, key: VarKey::cell(0, Location(0, 0)) },
        ];
        assert!(matches!(VarMap::from_records(records), Err(VarMapError::DuplicateKey { .. })));
    }

    #[test]
    fn reject_malformed_json() {
        let mut input = br#"[{"id":1,"key":{"kind":"bogus"}}]"#.as_slice();
        assert!(matches!(VarMap::read_json(&mut input), Err(VarMapError::Json(_))));
    }
}

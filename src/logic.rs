//! Cardinality constraints as clauses.

use itertools::Itertools;
use varisat::Lit;

use crate::variable::{VarKey, VarMap};

/// A disjunction of literals. The empty clause is unsatisfiable.
pub type Clause = Vec<Lit>;

/// No two of `lits` are true; (!A + !B) * (!A + !C) * ...
pub fn at_most_one(lits: &[Lit]) -> Vec<Clause> {
    lits.iter()
        .tuple_combinations()
        .map(|(a, b)| vec![!*a, !*b])
        .collect_vec()
}

/// `gate` implies at least one of `lits`; !G + A + B + ...
///
/// With no `lits` this is the unit clause !G.
pub fn at_least_one(gate: Lit, lits: &[Lit]) -> Clause {
    let mut clause = Vec::with_capacity(lits.len() + 1);
    clause.push(!gate);
    clause.extend_from_slice(lits);
    clause
}

/// At most `k` of `lits` are true, by sequential counter.
///
/// Counter bit `s(i, j)` is forced true whenever at least `j` of the first `i` literals are; asserting
/// `!s(n, k + 1)` then forbids a `k + 1`-th true literal. Bits are allocated in `vars` under
/// [`VarKey::SeqCount`] with the given `group`, so distinct counters must use distinct groups.
///
/// `k <= 0` forces every literal false, and `k >= lits.len()` yields no clauses and no new variables.
pub fn at_most_k(vars: &mut VarMap, lits: &[Lit], k: isize, group: usize) -> Vec<Clause> {
    let n = lits.len();
    if k <= 0 {
        return lits.iter().map(|lit| vec![!*lit]).collect_vec();
    }
    let k = k.unsigned_abs();
    if k >= n {
        return vec![];
    }

    let mut clauses = Vec::with_capacity(3 * n * (k + 1) + 1);
    let mut previous: Option<Vec<Lit>> = None;

    for (i, indicator) in (1..).zip(lits.iter().copied()) {
        // s(i, 1..=k+1); column k+1 only ever detects an overflow
        let row = (1..=k + 1)
            .map(|j| vars.allocate(VarKey::seq_count(group, i, j)).positive())
            .collect_vec();

        for (j, s) in (1..).zip(row.iter().copied()) {
            match &previous {
                Some(prev) => {
                    // carry: s(i-1, j) => s(i, j)
                    clauses.push(vec![!prev[j - 1], s]);
                    // increment: s(i-1, j-1) * v(i) => s(i, j), where s(i-1, 0) is true
                    match j {
                        1 => clauses.push(vec![!indicator, s]),
                        _ => clauses.push(vec![!prev[j - 2], !indicator, s]),
                    }
                }
                // s(0, j-1) is false for j > 1, so only the first column can be incremented
                None if j == 1 => clauses.push(vec![!indicator, s]),
                None => {}
            }
        }

        previous = Some(row);
    }

    if let Some(last) = previous {
        clauses.push(vec![!last[k]]);
    }

    clauses
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use varisat::Lit;

    use crate::location::Location;
    use crate::logic::{at_least_one, at_most_k, at_most_one};
    use crate::variable::{VarKey, VarMap};

    fn indicators(vars: &mut VarMap, n: usize) -> Vec<Lit> {
        (0..n).map(|x| vars.allocate(VarKey::turn(0, Location(x, 0))).positive()).collect_vec()
    }

    #[test]
    fn pairwise_exclusion() {
        let mut vars = VarMap::new();
        let lits = indicators(&mut vars, 3);
        assert_eq!(at_most_one(&lits), vec![
            vec![!lits[0], !lits[1]],
            vec![!lits[0], !lits[2]],
            vec![!lits[1], !lits[2]],
        ]);
        assert!(at_most_one(&lits[..1]).is_empty());
    }

    #[test]
    fn gated_disjunction() {
        let mut vars = VarMap::new();
        let lits = indicators(&mut vars, 3);
        assert_eq!(at_least_one(lits[0], &lits[1..]), vec![!lits[0], lits[1], lits[2]]);
        assert_eq!(at_least_one(lits[0], &[]), vec![!lits[0]]);
    }

    #[test]
    fn non_positive_bound_forces_false() {
        let mut vars = VarMap::new();
        let lits = indicators(&mut vars, 2);
        let expected = vec![vec![!lits[0]], vec![!lits[1]]];
        assert_eq!(at_most_k(&mut vars, &lits, 0, 0), expected);
        assert_eq!(at_most_k(&mut vars, &lits, -3, 0), expected);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn loose_bound_is_free() {
        let mut vars = VarMap::new();
        let lits = indicators(&mut vars, 3);
        assert!(at_most_k(&mut vars, &lits, 3, 0).is_empty());
        assert!(at_most_k(&mut vars, &lits, 7, 0).is_empty());
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn counter_shape() {
        let mut vars = VarMap::new();
        let lits = indicators(&mut vars, 4);
        let clauses = at_most_k(&mut vars, &lits, 2, 5);
        // n * (k + 1) counter bits
        assert_eq!(vars.len(), 4 + 4 * 3);
        assert!(vars.get(&VarKey::seq_count(5, 4, 3)).is_some());
        let overflow = vars.get(&VarKey::seq_count(5, 4, 3)).unwrap().negative();
        assert_eq!(clauses.last(), Some(&vec![overflow]));
        // first row: only v1 => s(1,1); later rows: carry and increment for every column
        assert_eq!(clauses.len(), 1 + 3 * 2 * 3 + 1);
    }
}

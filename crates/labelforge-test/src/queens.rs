//! N-Queens: one variable per column holding the queen's row.

use labelforge_core::{AllDifferent, Store, SumEquals, VarId};

/// Number of solutions for small board sizes.
pub const KNOWN_SOLUTIONS: [(usize, u64); 5] = [(1, 1), (4, 2), (5, 10), (6, 4), (7, 40)];

/// A queens model. Only `queens` are decision variables; the diagonal
/// helpers are fixed by propagation once the queens are placed.
#[derive(Debug)]
pub struct QueensModel {
    pub store: Store,
    pub queens: Vec<VarId>,
}

impl QueensModel {
    /// Known solution count for `n`, if tabulated.
    pub fn known_solutions(n: usize) -> Option<u64> {
        KNOWN_SOLUTIONS
            .iter()
            .find(|(size, _)| *size == n)
            .map(|(_, count)| *count)
    }
}

/// Builds the `n`-queens model with rows `1..=n`.
pub fn queens(n: usize) -> QueensModel {
    let mut store = Store::new();
    let size = n as i64;
    let queens: Vec<VarId> = (1..=size)
        .map(|i| store.new_int(format!("q{}", i), 1, size).expect("valid domain"))
        .collect();

    let mut up = Vec::with_capacity(n);
    let mut down = Vec::with_capacity(n);
    for (i, &q) in queens.iter().enumerate() {
        let offset = i as i64 + 1;
        let c = store
            .new_int(format!("c{}", offset), offset, offset)
            .expect("valid domain");
        // up = q + i
        let u = store
            .new_int(format!("up{}", offset), 1 + offset, size + offset)
            .expect("valid domain");
        store.impose(SumEquals::new(vec![q, c], u)).expect("known vars");
        // q = down + i
        let d = store
            .new_int(format!("down{}", offset), 1 - offset, size - offset)
            .expect("valid domain");
        store.impose(SumEquals::new(vec![d, c], q)).expect("known vars");
        up.push(u);
        down.push(d);
    }

    store.impose(AllDifferent::new(queens.clone())).expect("known vars");
    store.impose(AllDifferent::new(up)).expect("known vars");
    store.impose(AllDifferent::new(down)).expect("known vars");

    QueensModel { store, queens }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_attack_fails() {
        let mut model = queens(4);
        let store = &mut model.store;

        store.push_level();
        store.assign(model.queens[0], 1).unwrap();
        assert!(store.consistency());
        assert!(!store.int_domain(model.queens[1]).unwrap().contains(1));
        let attacked = store.assign(model.queens[1], 2).is_ok() && store.consistency();
        assert!(!attacked);
        store.pop_level();

        store.push_level();
        for (&q, row) in model.queens.iter().zip([2, 4, 1, 3]) {
            store.assign(q, row).unwrap();
        }
        assert!(store.consistency());
        store.pop_level();
    }

    #[test]
    fn test_known_solutions() {
        assert_eq!(QueensModel::known_solutions(6), Some(4));
        assert_eq!(QueensModel::known_solutions(3), None);
    }
}

//! Small models used across the search tests.

use labelforge_core::{AllDifferent, Store, SumEquals, VarId};

/// `x, y ∈ 1..2`, unconstrained.
#[derive(Debug)]
pub struct Pair {
    pub store: Store,
    pub x: VarId,
    pub y: VarId,
}

pub fn pair() -> Pair {
    let mut store = Store::new();
    let x = store.new_int("x", 1, 2).expect("valid domain");
    let y = store.new_int("y", 1, 2).expect("valid domain");
    Pair { store, x, y }
}

/// `a, b ∈ 0..3`, `total = a + b`, `total ∈ 2..6`.
#[derive(Debug)]
pub struct SumModel {
    pub store: Store,
    pub a: VarId,
    pub b: VarId,
    pub total: VarId,
}

pub fn sum_model() -> SumModel {
    let mut store = Store::new();
    let a = store.new_int("a", 0, 3).expect("valid domain");
    let b = store.new_int("b", 0, 3).expect("valid domain");
    let total = store.new_int("total", 2, 6).expect("valid domain");
    store
        .impose(SumEquals::new(vec![a, b], total))
        .expect("known vars");
    SumModel { store, a, b, total }
}

/// One variable of every kind: `x ∈ 1..3`, a bool `b`, `s ⊆ {1, 2}`, plus a
/// second int `w ∈ 0..1`.
#[derive(Debug)]
pub struct MixedKinds {
    pub store: Store,
    pub x: VarId,
    pub b: VarId,
    pub s: VarId,
    pub w: VarId,
}

pub fn mixed_kinds() -> MixedKinds {
    let mut store = Store::new();
    let x = store.new_int("x", 1, 3).expect("valid domain");
    let b = store.new_bool("b");
    let s = store.new_set("s", [], [1, 2]).expect("valid domain");
    let w = store.new_int("w", 0, 1).expect("valid domain");
    MixedKinds { store, x, b, s, w }
}

/// Three pairwise different variables over two values.
pub fn unsat_triangle() -> (Store, Vec<VarId>) {
    let mut store = Store::new();
    let vars: Vec<VarId> = ["u", "v", "w"]
        .iter()
        .map(|name| store.new_int(*name, 1, 2).expect("valid domain"))
        .collect();
    store
        .impose(AllDifferent::new(vars.clone()))
        .expect("known vars");
    (store, vars)
}

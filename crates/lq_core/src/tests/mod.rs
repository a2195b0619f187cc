//! End-to-end tests for the sequence engine, grouped by concern.

mod ordering_tests;
mod pipeline_tests;
mod terminal_tests;

use lq_value::Value;

use crate::{Enumerable, Pair};

fn seq_of(items: &[i64]) -> Enumerable {
    Enumerable::from_values(items.iter().copied().map(Value::Int))
}

fn ints(seq: &Enumerable) -> Vec<i64> {
    seq.to_list()
        .unwrap()
        .iter()
        .map(|v| v.as_int().unwrap())
        .collect()
}

fn pairs(seq: &Enumerable) -> Vec<Pair> {
    seq.iter().collect::<Result<_, _>>().unwrap()
}

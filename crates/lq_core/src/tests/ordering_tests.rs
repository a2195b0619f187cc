//! Ordering: stability, multi-level keys, custom comparers.

use lq_value::Value;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::{ints, seq_of};
use crate::{Comparer, Enumerable, Invocable};

/// People as `[name, age]` lists.
fn people() -> Enumerable {
    let row = |name: &str, age: i64| Value::list([Value::string(name), Value::Int(age)]);
    Enumerable::from_values([
        row("ann", 30),
        row("bob", 25),
        row("cid", 30),
        row("dee", 25),
        row("eve", 40),
    ])
}

fn names(seq: &Enumerable) -> Vec<String> {
    seq.select("$p => $p[0]")
        .unwrap()
        .to_list()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn order_by_is_stable() {
    let sorted = people().order_by("$p => $p[1]", None).unwrap();
    assert_eq!(names(&sorted), vec!["bob", "dee", "ann", "cid", "eve"]);
}

#[test]
fn order_by_descending_is_stable() {
    let sorted = people().order_by_descending("$p => $p[1]", None).unwrap();
    assert_eq!(names(&sorted), vec!["eve", "ann", "cid", "bob", "dee"]);
}

#[test]
fn then_by_breaks_ties() {
    let sorted = people()
        .order_by("$p => $p[1]", None)
        .unwrap()
        .then_by_descending("$p => $p[0]", None)
        .unwrap();
    assert_eq!(names(&sorted), vec!["dee", "bob", "cid", "ann", "eve"]);
}

#[test]
fn order_preserves_original_keys() {
    let sorted = seq_of(&[30, 10, 20]).order(None);
    let keys = sorted.keys().to_list().unwrap();
    assert_eq!(keys, vec![Value::Int(1), Value::Int(2), Value::Int(0)]);
}

#[test]
fn custom_comparer_reverses_order() {
    let reverse = Comparer::from_fn(|a, b| b.compare(a));
    let sorted = seq_of(&[2, 3, 1]).order(Some(reverse));
    assert_eq!(ints(&sorted), vec![3, 2, 1]);
}

#[test]
fn lambda_comparer() {
    let by_distance = Comparer::custom("($a, $b) => abs($a - 5) - abs($b - 5)").unwrap();
    let sorted = seq_of(&[1, 9, 5, 4]).order(Some(by_distance));
    assert_eq!(ints(&sorted), vec![5, 4, 1, 9]);
}

#[test]
fn non_numeric_comparer_result_is_an_error() {
    let bad = Comparer::custom("($a, $b) => 'x'").unwrap();
    let sorted = seq_of(&[2, 1]).order(Some(bad));
    assert!(sorted.to_list().is_err());
}

#[test]
fn ordered_sequence_supports_every_operator() {
    let top_two = seq_of(&[5, 1, 4, 2]).order_descending(None).take(2);
    assert_eq!(ints(&top_two), vec![5, 4]);
}

#[test]
fn every_traversal_sorts_again() {
    let calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let counter = std::rc::Rc::clone(&calls);
    let selector = Invocable::unary(move |v| {
        counter.set(counter.get() + 1);
        Ok(v.clone())
    });
    let sorted = seq_of(&[3, 1, 2]).order_by(selector, None).unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(ints(&sorted), vec![1, 2, 3]);
    assert_eq!(calls.get(), 3);
    assert_eq!(ints(&sorted), vec![1, 2, 3]);
    assert_eq!(calls.get(), 6);

    let mut cursor = sorted.cursor().unwrap();
    assert_eq!(calls.get(), 9);
    cursor.reset().unwrap();
    assert_eq!(cursor.current_value(), Some(&Value::Int(1)));
    assert_eq!(calls.get(), 12);
}

#[test]
fn mixed_types_sort_deterministically() {
    let mixed = Enumerable::from_values([Value::string("b"), Value::Int(2), Value::Null]);
    let once = mixed.order(None).to_list().unwrap();
    let twice = mixed.order(None).to_list().unwrap();
    assert_eq!(once, twice);
}

proptest! {
    #[test]
    fn order_by_matches_std_stable_sort(
        items in prop::collection::vec((0i64..5, 0i64..1000), 0..60),
    ) {
        let seq = Enumerable::from_values(
            items.iter().map(|(k, tag)| Value::list([Value::Int(*k), Value::Int(*tag)])),
        );
        let sorted = seq.order_by("$r => $r[0]", None).unwrap().to_list().unwrap();

        let mut expected = items;
        expected.sort_by_key(|(k, _)| *k);
        let expected: Vec<Value> = expected
            .iter()
            .map(|(k, tag)| Value::list([Value::Int(*k), Value::Int(*tag)]))
            .collect();
        prop_assert_eq!(sorted, expected);
    }

    #[test]
    fn descending_matches_reversed_keys_stably(
        items in prop::collection::vec(0i64..8, 0..40),
    ) {
        let seq = Enumerable::from_values(items.iter().copied().map(Value::Int));
        let keys = seq
            .order_descending(None)
            .keys()
            .to_list()
            .unwrap();

        let mut indexed: Vec<(usize, i64)> = items.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.cmp(&a.1));
        let expected: Vec<Value> = indexed.iter().map(|(i, _)| Value::index(*i)).collect();
        prop_assert_eq!(keys, expected);
    }
}

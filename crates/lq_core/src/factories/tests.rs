use super::*;
use pretty_assertions::assert_eq;

fn ints(seq: &Enumerable) -> Vec<i64> {
    seq.to_list()
        .unwrap()
        .iter()
        .map(|v| v.as_int().unwrap())
        .collect()
}

#[test]
fn empty_has_no_elements() {
    assert_eq!(Enumerable::empty().count().unwrap(), 0);
}

#[test]
fn range_counts_up_from_start() {
    assert_eq!(ints(&Enumerable::range(3, 4).unwrap()), vec![3, 4, 5, 6]);
    assert_eq!(Enumerable::range(3, 0).unwrap().count().unwrap(), 0);
}

#[test]
fn range_rejects_negative_count() {
    let err = Enumerable::range(0, -1).unwrap_err();
    assert!(err.is_out_of_range());
}

#[test]
fn range_stops_before_overflow() {
    let seq = Enumerable::range(i64::MAX - 1, 5).unwrap();
    assert_eq!(ints(&seq), vec![i64::MAX - 1, i64::MAX]);
}

#[test]
fn range_to_excludes_end() {
    assert_eq!(ints(&Enumerable::range_to(0, 10, 3).unwrap()), vec![0, 3, 6, 9]);
    assert_eq!(ints(&Enumerable::range_to(10, 0, -4).unwrap()), vec![10, 6, 2]);
    assert_eq!(ints(&Enumerable::range_to(0, 4, 2).unwrap()), vec![0, 2]);
}

#[test]
fn range_to_step_away_from_end_is_empty() {
    assert_eq!(Enumerable::range_to(0, 5, -1).unwrap().count().unwrap(), 0);
}

#[test]
fn range_to_rejects_zero_step() {
    assert!(Enumerable::range_to(0, 5, 0).unwrap_err().is_out_of_range());
}

#[test]
fn repeat_finite_and_unbounded() {
    let three = Enumerable::repeat(Value::string("x"), Some(3));
    assert_eq!(three.to_list().unwrap(), vec![Value::string("x"); 3]);
    let forever = Enumerable::repeat(Value::Int(7), None);
    assert_eq!(ints(&forever.take(4)), vec![7, 7, 7, 7]);
}

#[test]
fn seeded_random_is_reproducible() {
    let a = Enumerable::random(Some(20), 1, 6, Some(42)).unwrap();
    let b = Enumerable::random(Some(20), 1, 6, Some(42)).unwrap();
    let first = ints(&a);
    assert_eq!(first, ints(&b));
    assert_eq!(first, ints(&a), "each traversal reseeds");
    assert!(first.iter().all(|n| (1..=6).contains(n)));
}

#[test]
fn random_rejects_inverted_bounds() {
    assert!(Enumerable::random(Some(1), 5, 1, None)
        .unwrap_err()
        .is_out_of_range());
}

#[test]
fn random_float_is_in_unit_interval() {
    let values = Enumerable::random_float(Some(50), Some(7)).to_list().unwrap();
    assert_eq!(values.len(), 50);
    assert!(values
        .iter()
        .all(|v| v.as_float().is_some_and(|f| (0.0..1.0).contains(&f))));
}

#[test]
fn from_json_array_and_object() {
    assert_eq!(ints(&Enumerable::from_json("[1, 2, 3]").unwrap()), vec![1, 2, 3]);
    let obj = Enumerable::from_json(r#"{"a": 1, "b": 2}"#).unwrap();
    assert_eq!(
        obj.keys().to_list().unwrap(),
        vec![Value::string("a"), Value::string("b")]
    );
}

#[test]
fn from_json_scalar_is_single_element() {
    let seq = Enumerable::from_json("5").unwrap();
    let pairs: Vec<Pair> = seq.iter().collect::<LinqResult<_>>().unwrap();
    assert_eq!(pairs, vec![(Value::Int(0), Value::Int(5))]);
}

#[test]
fn from_json_rejects_malformed_text() {
    assert!(Enumerable::from_json("[1,").is_err());
}

#[test]
fn generate_stops_when_next_cancels() {
    let seq = Enumerable::generate(
        Value::Int(0),
        "$v => { $ctx->cancel = $v >= 3; return $v + 1; }",
    )
    .unwrap();
    assert_eq!(ints(&seq), vec![0, 1, 2, 3]);
}

#[test]
fn generate_is_unbounded_without_cancel() {
    let seq = Enumerable::generate(Value::Int(1), "$v => $v * 2").unwrap();
    assert_eq!(ints(&seq.take(5)), vec![1, 2, 4, 8, 16]);
}

#[test]
fn from_iter_is_one_shot() {
    let seq = Enumerable::from_iter((1..=3).map(Value::Int));
    assert!(!seq.is_restartable());
    assert_eq!(ints(&seq), vec![1, 2, 3]);
    assert_eq!(seq.count().unwrap(), 0);
}

#[test]
fn generate_with_restarts() {
    let seq = Enumerable::generate_with(|| (0..3).map(Value::Int));
    assert!(seq.is_restartable());
    assert_eq!(ints(&seq), ints(&seq));
    assert_eq!(seq.count().unwrap(), 3);
}

#[test]
fn from_pairs_keeps_duplicate_keys() {
    let seq = Enumerable::from_pairs([
        (Value::string("k"), Value::Int(1)),
        (Value::string("k"), Value::Int(2)),
    ]);
    assert_eq!(seq.count().unwrap(), 2);
}

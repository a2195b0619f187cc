//! Terminal operations: conversion, aggregation, element access.

use lq_value::{ArrayValue, LinqErrorKind, Value};
use proptest::prelude::*;

use super::{ints, seq_of};
use crate::{Comparer, Enumerable, EqualityComparer, Invocable};

fn keyed() -> Enumerable {
    Enumerable::from_pairs([
        (Value::string("a"), Value::Int(1)),
        (Value::string("b"), Value::Int(2)),
        (Value::string("c"), Value::Int(3)),
    ])
}

mod empty_sequences {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sum_of_nothing_is_zero() {
        assert_eq!(Enumerable::empty().sum(None).unwrap(), Value::Int(0));
    }

    #[test]
    fn extremes_and_average_have_no_elements() {
        let empty = Enumerable::empty();
        assert!(empty.min(None).unwrap_err().is_no_elements());
        assert!(empty.max(None).unwrap_err().is_no_elements());
        assert!(empty.average(None).unwrap_err().is_no_elements());
        assert!(empty.first(None).unwrap_err().is_no_elements());
        assert!(empty.last(None).unwrap_err().is_no_elements());
        assert!(empty.single(None).unwrap_err().is_no_elements());
    }

    #[test]
    fn aggregate_returns_the_seed() {
        let empty = Enumerable::empty();
        assert_eq!(empty.aggregate("($a, $v) => $a + $v", None).unwrap(), Value::Null);
        assert_eq!(
            empty
                .aggregate("($a, $v) => $a + $v", Some(Value::Int(5)))
                .unwrap(),
            Value::Int(5)
        );
    }

    #[test]
    fn aggregate_never_calls_the_fold_on_empty_input() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = std::rc::Rc::clone(&calls);
        let fold = Invocable::binary(move |acc, _| {
            counter.set(counter.get() + 1);
            Ok(acc.clone())
        });
        let result = Enumerable::empty().aggregate(fold, Some(Value::Int(10))).unwrap();
        assert_eq!(result, Value::Int(10));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn predicates_over_nothing() {
        let empty = Enumerable::empty();
        assert!(empty.all("$v => false").unwrap());
        assert!(!empty.any().unwrap());
        assert_eq!(empty.count().unwrap(), 0);
        assert_eq!(
            empty.first_or_default(Value::string("none"), None).unwrap(),
            Value::string("none")
        );
    }
}

mod aggregation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sum_promotes_to_float() {
        let seq = Enumerable::from_values([Value::Int(1), Value::Float(0.5)]);
        assert_eq!(seq.sum(None).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn sum_rejects_overflow() {
        let seq = seq_of(&[i64::MAX, 1]);
        assert!(matches!(
            seq.sum(None).unwrap_err().kind(),
            LinqErrorKind::IntegerOverflow { .. }
        ));
    }

    #[test]
    fn average_is_a_float() {
        assert_eq!(seq_of(&[1, 2]).average(None).unwrap(), Value::Float(1.5));
        assert_eq!(seq_of(&[2, 4]).average(None).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn min_max_with_selector() {
        let seq = keyed();
        assert_eq!(seq.min(None).unwrap(), Value::Int(1));
        let neg = Invocable::lambda("$v => -$v").unwrap();
        assert_eq!(seq.max(Some(neg)).unwrap(), Value::Int(-1));
    }

    #[test]
    fn min_by_prefers_the_first_tie() {
        let by_len = Comparer::custom("($a, $b) => strlen($a) - strlen($b)").unwrap();
        let seq = Enumerable::from_values(["bb", "a", "c", "ddd"].into_iter().map(Value::string));
        assert_eq!(seq.min_by(by_len.clone()).unwrap(), Value::string("a"));
        assert_eq!(seq.max_by(by_len).unwrap(), Value::string("ddd"));
    }

    #[test]
    fn aggregate_folds_left() {
        let joined = seq_of(&[1, 2, 3])
            .aggregate(
                "($acc, $v, $k) => $acc . '[' . $k . ':' . $v . ']'",
                Some(Value::string("")),
            )
            .unwrap();
        assert_eq!(joined, Value::string("[0:1][1:2][2:3]"));
    }

    #[test]
    fn count_where_and_contains() {
        let seq = seq_of(&[1, 2, 3, 4]);
        assert_eq!(seq.count_where("$v => $v % 2 == 0").unwrap(), 2);
        assert!(seq.contains(&Value::Int(3), None).unwrap());
        assert!(!seq.contains(&Value::string("3"), None).unwrap());
        let loose = EqualityComparer::from_fn(Value::loose_equals);
        assert!(seq.contains(&Value::string("3"), Some(loose)).unwrap());
    }

    #[test]
    fn sequence_equal_ignores_keys() {
        assert!(keyed().sequence_equal(seq_of(&[1, 2, 3]), None).unwrap());
        assert!(!keyed().sequence_equal(seq_of(&[1, 2]), None).unwrap());
    }
}

mod element_access {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_fails_on_a_second_match() {
        let err = seq_of(&[1, 2, 3]).single(None).unwrap_err();
        assert!(err.is_more_than_one());
        let one = seq_of(&[1, 2, 3])
            .single(Some(Invocable::lambda("$v => $v == 2").unwrap()))
            .unwrap();
        assert_eq!(one, Value::Int(2));
    }

    #[test]
    fn single_stops_pulling_at_the_second_match() {
        let seq = Enumerable::range_to(0, i64::MAX, 1).unwrap();
        assert!(seq.single(None).unwrap_err().is_more_than_one());
    }

    #[test]
    fn first_and_last_with_predicates() {
        let seq = seq_of(&[1, 2, 3, 4]);
        let even = Invocable::lambda("$v => $v % 2 == 0").unwrap();
        assert_eq!(seq.first(Some(even.clone())).unwrap(), Value::Int(2));
        assert_eq!(seq.last(Some(even)).unwrap(), Value::Int(4));
        let none = Invocable::lambda("$v => $v > 10").unwrap();
        assert_eq!(
            seq.last_or_default(Value::Int(-1), Some(none)).unwrap(),
            Value::Int(-1)
        );
    }

    #[test]
    fn element_at_looks_up_by_key() {
        let seq = keyed();
        assert_eq!(seq.element_at(&Value::string("b")).unwrap(), Value::Int(2));
        assert!(matches!(
            seq.element_at(&Value::string("z")).unwrap_err().kind(),
            LinqErrorKind::KeyNotFound { .. }
        ));
        assert_eq!(
            seq.element_at_or_default(&Value::string("z"), Value::Null).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn index_of_and_find_index_return_keys() {
        let seq = keyed();
        assert_eq!(seq.index_of(&Value::Int(3)).unwrap(), Some(Value::string("c")));
        assert_eq!(seq.index_of(&Value::Int(9)).unwrap(), None);
        assert_eq!(
            seq.find_index("$v => $v > 1").unwrap(),
            Some(Value::string("b"))
        );
    }
}

mod conversion {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn to_array_overwrites_repeated_keys_in_place() {
        let seq = Enumerable::from_pairs([
            (Value::Int(0), Value::string("x")),
            (Value::Int(1), Value::string("y")),
            (Value::Int(0), Value::string("z")),
        ]);
        let array = seq.to_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.get(&Value::Int(0)), Some(&Value::string("z")));
    }

    #[test]
    fn to_dictionary_rejects_duplicate_keys() {
        let err = seq_of(&[1, 2, 3]).to_dictionary("$v => $v % 2", None).unwrap_err();
        assert!(matches!(err.kind(), LinqErrorKind::DuplicateKey { .. }));
        let dict = seq_of(&[1, 2])
            .to_dictionary("$v => 'k' . $v", Some(Invocable::lambda("$v => $v * $v").unwrap()))
            .unwrap();
        assert_eq!(dict.get(&Value::string("k2")), Some(&Value::Int(4)));
    }

    #[test]
    fn to_set_and_to_list() {
        assert_eq!(
            seq_of(&[2, 1, 2]).to_set(None).unwrap(),
            vec![Value::Int(2), Value::Int(1)]
        );
        assert_eq!(keyed().to_list().unwrap().len(), 3);
    }

    #[test]
    fn implode_joins_text_forms() {
        let seq = Enumerable::from_values([Value::Int(1), Value::string("b"), Value::Bool(true)]);
        assert_eq!(seq.implode(", ", None).unwrap(), "1, b, 1");
        let nested = Enumerable::from_values([Value::list([])]);
        assert!(nested.implode(",", None).is_err());
    }

    #[test]
    fn build_rekeys_through_the_context() {
        let built = seq_of(&[1, 2])
            .build("$v => { $ctx->key = 'n' . $v; return $v * 2; }")
            .unwrap();
        let expected: ArrayValue = [
            (Value::string("n1"), Value::Int(2)),
            (Value::string("n2"), Value::Int(4)),
        ]
        .into_iter()
        .collect();
        assert_eq!(built, expected);
    }

    #[test]
    fn json_shapes() {
        assert_eq!(seq_of(&[1, 2]).to_json().unwrap(), "[1,2]");
        assert_eq!(keyed().to_json().unwrap(), r#"{"a":1,"b":2,"c":3}"#);
    }

    #[test]
    fn nested_sequences_serialize() {
        let groups = seq_of(&[1, 2, 3]).group_by("$v => $v % 2").unwrap();
        assert_eq!(groups.to_json().unwrap(), r#"{"1":[1,3],"0":[2]}"#);
    }

    #[test]
    fn each_stops_after_cancelling_on_the_third_element() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = std::rc::Rc::clone(&calls);
        seq_of(&[1, 2, 3, 4, 5])
            .each(Invocable::native(move |_, ctx| {
                counter.set(counter.get() + 1);
                ctx.cancel = ctx.index == 2;
                Ok(Value::Null)
            }))
            .unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn each_visits_every_element() {
        let total = std::rc::Rc::new(std::cell::Cell::new(0));
        let sink = std::rc::Rc::clone(&total);
        seq_of(&[1, 2, 3])
            .each(Invocable::unary(move |v| {
                sink.set(sink.get() + v.as_int().unwrap_or(0));
                Ok(Value::Null)
            }))
            .unwrap();
        assert_eq!(total.get(), 6);
    }
}

proptest! {
    #[test]
    fn array_round_trip(items in prop::collection::vec((0i64..20, -50i64..50), 0..30)) {
        let array: ArrayValue = items
            .iter()
            .map(|(k, v)| (Value::Int(*k), Value::Int(*v)))
            .collect();
        let back = Enumerable::from_array(array.clone()).to_array().unwrap();
        prop_assert_eq!(back, array);
    }

    #[test]
    fn count_matches_to_list(items in prop::collection::vec(-50i64..50, 0..40)) {
        let seq = seq_of(&items);
        prop_assert_eq!(seq.count().unwrap(), items.len());
        prop_assert_eq!(ints(&seq), items);
    }
}

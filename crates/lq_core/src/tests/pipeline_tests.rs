//! Laziness, pull order, cancellation, context plumbing and the cursor
//! protocol across operator chains.

use std::cell::RefCell;
use std::rc::Rc;

use lq_value::Value;

use super::{ints, pairs, seq_of};
use crate::{Enumerable, Invocable};

/// A native callback that records every value it sees under `label`.
fn spy(log: &Rc<RefCell<Vec<String>>>, label: &'static str, result: bool) -> Invocable {
    let log = Rc::clone(log);
    Invocable::unary(move |v| {
        log.borrow_mut().push(format!("{label}{v}"));
        Ok(Value::Bool(result))
    })
}

mod laziness {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn building_a_chain_runs_no_callbacks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let _chain = seq_of(&[1, 2, 3])
            .where_(spy(&log, "w", true))
            .unwrap()
            .select(spy(&log, "s", true))
            .unwrap()
            .take(1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn elements_flow_one_at_a_time() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let chain = seq_of(&[1, 2])
            .where_(spy(&log, "w", true))
            .unwrap()
            .call(spy(&log, "c", true))
            .unwrap();
        chain.count().unwrap();
        assert_eq!(*log.borrow(), vec!["w1", "c1", "w2", "c2"]);
    }

    #[test]
    fn take_pulls_no_further_than_needed() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let chain = seq_of(&[1, 2, 3, 4])
            .call(spy(&log, "", true))
            .unwrap()
            .take(2);
        assert_eq!(ints(&chain), vec![1, 2]);
        assert_eq!(*log.borrow(), vec!["1", "2"]);
    }

    #[test]
    fn infinite_sources_work_with_short_circuiting_terminals() {
        let evens = Enumerable::range_to(0, i64::MAX, 2).unwrap();
        assert_eq!(evens.first(None).unwrap(), Value::Int(0));
        assert!(evens.any().unwrap());
        assert_eq!(ints(&evens.skip(3).take(2)), vec![6, 8]);
    }

    #[test]
    fn each_traversal_reruns_the_pipeline() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let chain = seq_of(&[1, 2]).call(spy(&log, "", true)).unwrap();
        chain.count().unwrap();
        chain.count().unwrap();
        assert_eq!(log.borrow().len(), 4);
    }
}

mod cancellation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn where_stops_after_cancelling_element() {
        let seq = seq_of(&[1, 2, 3, 4, 5])
            .where_("$v => { $ctx->cancel = $ctx->index == 2; return true; }")
            .unwrap();
        assert_eq!(ints(&seq), vec![1, 2, 3]);
    }

    #[test]
    fn cancelling_element_is_dropped_if_it_fails_the_predicate() {
        let seq = seq_of(&[1, 2, 3, 4])
            .where_("$v => { $ctx->cancel = $v == 3; return $v != 3; }")
            .unwrap();
        assert_eq!(ints(&seq), vec![1, 2]);
    }

    #[test]
    fn select_emits_the_cancelling_element() {
        let seq = seq_of(&[1, 2, 3, 4])
            .select("$v => { $ctx->cancel = $v >= 3; return $v * 10; }")
            .unwrap();
        assert_eq!(ints(&seq), vec![10, 20, 30]);
    }

    #[test]
    fn terminal_counts_up_to_cancel() {
        let n = seq_of(&[1, 2, 3, 4, 5])
            .count_where("$v => { $ctx->cancel = $ctx->index == 2; return true; }")
            .unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn cancel_is_per_traversal() {
        let seq = seq_of(&[1, 2, 3])
            .where_("$v => { $ctx->cancel = $v == 2; return true; }")
            .unwrap();
        assert_eq!(ints(&seq), vec![1, 2]);
        assert_eq!(ints(&seq), vec![1, 2]);
    }
}

mod context_plumbing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prev_val_chains_through_select() {
        let running = seq_of(&[1, 2, 3, 4])
            .select("$v => { $ctx->nextVal = ($ctx->prevVal ?? 0) + $v; return $ctx->nextVal; }")
            .unwrap();
        assert_eq!(ints(&running), vec![1, 3, 6, 10]);
    }

    #[test]
    fn tag_accumulates_over_one_traversal_only() {
        let seq = seq_of(&[5, 6, 7])
            .select("$v => { $ctx->tag = ($ctx->tag ?? 0) + 1; return $ctx->tag; }")
            .unwrap();
        assert_eq!(ints(&seq), vec![1, 2, 3]);
        assert_eq!(ints(&seq), vec![1, 2, 3]);
    }

    #[test]
    fn is_last_peeks_without_losing_elements() {
        let marked = seq_of(&[1, 2, 3])
            .select("$v => $ctx->isLast ? -$v : $v")
            .unwrap();
        assert_eq!(ints(&marked), vec![1, 2, -3]);
    }

    #[test]
    fn is_last_on_a_one_shot_source() {
        let once = Enumerable::from_iter([1, 2, 3].into_iter().map(Value::Int));
        let marked = once.select("$v => $ctx->isLast ? 0 : $v").unwrap();
        assert_eq!(ints(&marked), vec![1, 2, 0]);
        assert_eq!(ints(&marked), Vec::<i64>::new());
    }

    fn flags(seq: &Enumerable) -> Vec<Value> {
        seq.to_list().unwrap()
    }

    fn expect_flags(expected: &[bool]) -> Vec<Value> {
        expected.iter().copied().map(Value::Bool).collect()
    }

    #[test]
    fn is_last_in_join_results() {
        let joined = seq_of(&[1, 2, 3])
            .join(seq_of(&[1, 2, 3]), "$x => $x", "$y => $y", "($o, $i) => $ctx->isLast", None)
            .unwrap();
        assert_eq!(flags(&joined), expect_flags(&[false, false, true]));
    }

    #[test]
    fn is_last_in_join_looks_past_unmatched_outer_elements() {
        let joined = seq_of(&[1, 5, 2, 7])
            .join(seq_of(&[1, 1, 2]), "$x => $x", "$y => $y", "($o, $i) => $ctx->isLast", None)
            .unwrap();
        assert_eq!(flags(&joined), expect_flags(&[false, false, true]));
    }

    #[test]
    fn is_last_in_group_results() {
        let groups = seq_of(&[1, 2, 3, 4])
            .group_by_with(
                "$x => $x % 2",
                None,
                Some(Invocable::lambda("($g, $k) => $ctx->isLast").unwrap()),
                None,
            )
            .unwrap();
        assert_eq!(flags(&groups), expect_flags(&[false, true]));
    }

    #[test]
    fn is_last_is_false_while_generating() {
        let seq = Enumerable::generate(
            Value::Int(0),
            "$v => { $ctx->cancel = $v >= 2; return $ctx->isLast ? -1 : $v + 1; }",
        )
        .unwrap();
        assert_eq!(ints(&seq.take(5)), vec![0, 1, 2]);
    }

    #[test]
    fn is_last_in_zip_follows_the_shorter_side() {
        let zipped = seq_of(&[1, 2, 3])
            .zip(seq_of(&[10, 20]), "($a, $b) => $ctx->isLast")
            .unwrap();
        assert_eq!(flags(&zipped), expect_flags(&[false, true]));
    }

    #[test]
    fn is_last_in_select_many_spans_collections() {
        let nested = Enumerable::from_values([
            Value::list([Value::Int(1), Value::Int(2)]),
            Value::list([]),
            Value::list([Value::Int(3)]),
            Value::list([]),
        ]);
        let flat = nested
            .select_many_with("$c => $c", "($i, $o) => $ctx->isLast", None)
            .unwrap();
        assert_eq!(flags(&flat), expect_flags(&[false, false, true]));
    }

    #[test]
    fn is_first_and_index() {
        let seq = seq_of(&[7, 8, 9])
            .select("$v => $ctx->isFirst ? 100 : $ctx->index")
            .unwrap();
        assert_eq!(ints(&seq), vec![100, 1, 2]);
    }

    #[test]
    fn keys_reach_callbacks_as_second_argument() {
        let seq = Enumerable::from_pairs([
            (Value::string("a"), Value::Int(1)),
            (Value::string("b"), Value::Int(2)),
        ]);
        let tagged = seq.select("($v, $k) => $k . $v").unwrap();
        assert_eq!(
            tagged.to_list().unwrap(),
            vec![Value::string("a1"), Value::string("b2")]
        );
    }
}

mod errors {
    use super::*;

    #[test]
    fn malformed_lambda_fails_at_the_operator_call() {
        let err = seq_of(&[1]).where_("$x => $x >").unwrap_err();
        assert!(err.lambda_offset().is_some());
    }

    #[test]
    fn callback_errors_surface_on_pull() {
        let seq = seq_of(&[1, 0, 2]).select("$v => 10 / $v").unwrap();
        let mut it = seq.iter();
        assert!(matches!(it.next(), Some(Ok(_))));
        assert!(matches!(it.next(), Some(Err(_))));
        assert!(it.next().is_none());
    }

    #[test]
    fn non_sequence_input_is_rejected() {
        assert!(Enumerable::from_value(&Value::Int(3)).is_err());
    }
}

mod deep_chains {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn a_thousand_operators_run_without_overflow() {
        let mut seq = seq_of(&[1, 2, 3]);
        for _ in 0..1_500 {
            seq = seq.select(Invocable::unary(|v| Ok(v.clone()))).unwrap();
        }
        assert_eq!(ints(&seq), vec![1, 2, 3]);
    }

    #[test]
    fn deep_where_chain() {
        let mut seq = Enumerable::range(0, 50).unwrap();
        for _ in 0..1_000 {
            seq = seq.where_(Invocable::unary(|_| Ok(Value::Bool(true)))).unwrap();
        }
        assert_eq!(seq.count().unwrap(), 50);
    }
}

mod cursor_protocol {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cursor_walks_and_resets() {
        let seq = Enumerable::from_pairs([
            (Value::string("x"), Value::Int(1)),
            (Value::string("y"), Value::Int(2)),
        ]);
        let mut cursor = seq.cursor().unwrap();
        assert!(cursor.is_valid());
        assert_eq!(cursor.current_key(), Some(&Value::string("x")));
        cursor.advance().unwrap();
        assert_eq!(cursor.current_value(), Some(&Value::Int(2)));
        cursor.advance().unwrap();
        assert!(!cursor.is_valid());
        cursor.advance().unwrap();
        assert!(!cursor.is_valid());
        cursor.reset().unwrap();
        assert_eq!(cursor.current_value(), Some(&Value::Int(1)));
    }

    #[test]
    fn independent_cursors_do_not_interfere() {
        let seq = seq_of(&[1, 2, 3]);
        let mut a = seq.cursor().unwrap();
        let b = seq.cursor().unwrap();
        a.advance().unwrap();
        assert_eq!(a.current_value(), Some(&Value::Int(2)));
        assert_eq!(b.current_value(), Some(&Value::Int(1)));
    }

    #[test]
    fn empty_cursor_is_invalid() {
        let cursor = Enumerable::empty().cursor().unwrap();
        assert!(!cursor.is_valid());
        assert_eq!(cursor.current_key(), None);
    }

    #[test]
    fn for_loop_over_a_sequence() {
        let mut total = 0;
        for item in &seq_of(&[1, 2, 3]) {
            let (_, v) = item.unwrap();
            total += v.as_int().unwrap();
        }
        assert_eq!(total, 6);
    }
}

mod projection {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn select_keeps_keys_and_select_key_replaces_them() {
        let seq = seq_of(&[1, 2]);
        let doubled = seq.select("$v => $v * 2").unwrap();
        assert_eq!(
            pairs(&doubled),
            vec![(Value::Int(0), Value::Int(2)), (Value::Int(1), Value::Int(4))]
        );
        let rekeyed = seq.select_key("$v => 'k' . $v").unwrap();
        assert_eq!(
            pairs(&rekeyed),
            vec![
                (Value::string("k1"), Value::Int(1)),
                (Value::string("k2"), Value::Int(2)),
            ]
        );
    }

    #[test]
    fn select_many_flattens_with_sequential_keys() {
        let nested = Enumerable::from_values([
            Value::list([Value::Int(1), Value::Int(2)]),
            Value::list([]),
            Value::list([Value::Int(3)]),
        ]);
        let flat = nested.select_many("$v => $v").unwrap();
        assert_eq!(
            pairs(&flat),
            vec![
                (Value::Int(0), Value::Int(1)),
                (Value::Int(1), Value::Int(2)),
                (Value::Int(2), Value::Int(3)),
            ]
        );
    }

    #[test]
    fn select_many_with_result_selector_sees_both_levels() {
        let seq = seq_of(&[1, 2]);
        let flat = seq
            .select_many_with("$v => [$v, $v]", "($i, $o) => $i * 10 + $o", None)
            .unwrap();
        assert_eq!(ints(&flat), vec![11, 11, 22, 22]);
    }

    #[test]
    fn select_many_accepts_nested_sequences() {
        let seq = seq_of(&[2, 3]);
        let flat = seq
            .select_many(Invocable::unary(|v| {
                let n = v.as_int().unwrap_or(0);
                Ok(Value::object(Enumerable::range(0, n)?))
            }))
            .unwrap();
        assert_eq!(ints(&flat), vec![0, 1, 0, 1, 2]);
    }

    #[test]
    fn keys_and_values_renumber() {
        let seq = Enumerable::from_pairs([
            (Value::string("a"), Value::Int(1)),
            (Value::string("b"), Value::Int(2)),
        ]);
        assert_eq!(
            pairs(&seq.keys()),
            vec![
                (Value::Int(0), Value::string("a")),
                (Value::Int(1), Value::string("b")),
            ]
        );
        assert_eq!(ints(&seq.values()), vec![1, 2]);
    }

    #[test]
    fn of_type_and_cast() {
        let mixed = Enumerable::from_values([
            Value::Int(1),
            Value::string("2"),
            Value::Float(3.5),
            Value::Null,
        ]);
        assert_eq!(ints(&mixed.of_type("int").unwrap()), vec![1]);
        assert_eq!(mixed.of_type("number").unwrap().count().unwrap(), 2);
        assert_eq!(ints(&mixed.of_type("string").unwrap().cast("int").unwrap()), vec![2]);
        assert!(mixed.cast("number").is_err());
        assert!(mixed.of_type("").is_err());
    }
}

mod combining {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn concat_append_prepend() {
        let seq = seq_of(&[2, 3])
            .concat(seq_of(&[4]))
            .unwrap()
            .append(Value::Int(5), None)
            .prepend(Value::Int(1), None);
        assert_eq!(ints(&seq), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn zip_stops_at_the_shorter_side() {
        let zipped = seq_of(&[1, 2, 3])
            .zip(seq_of(&[10, 20]), "($a, $b) => $a + $b")
            .unwrap();
        assert_eq!(ints(&zipped), vec![11, 22]);
    }

    #[test]
    fn default_if_empty_only_fills_empty_sequences() {
        assert_eq!(ints(&Enumerable::empty().default_if_empty(Value::Int(9))), vec![9]);
        assert_eq!(ints(&seq_of(&[1]).default_if_empty(Value::Int(9))), vec![1]);
    }

    #[test]
    fn reverse_keeps_keys() {
        let reversed = seq_of(&[1, 2, 3]).reverse();
        assert_eq!(
            pairs(&reversed).first(),
            Some(&(Value::Int(2), Value::Int(3)))
        );
    }

    #[test]
    fn take_while_and_skip_while() {
        let seq = seq_of(&[1, 2, 5, 1]);
        assert_eq!(ints(&seq.take_while("$v => $v < 3").unwrap()), vec![1, 2]);
        assert_eq!(ints(&seq.skip_while("$v => $v < 3").unwrap()), vec![5, 1]);
    }
}

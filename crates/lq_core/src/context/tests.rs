use super::*;
use pretty_assertions::assert_eq;

/// Lookahead with a fixed number of elements still to come.
struct Remaining(usize);

impl Lookahead for Remaining {
    fn has_more(&mut self) -> LinqResult<bool> {
        Ok(self.0 > 0)
    }
}

fn site(
    f: impl Fn(&[Value], &mut IterationContext<'_>) -> LinqResult<Value> + 'static,
) -> CallSite {
    CallSite::new(Invocable::native(f))
}

#[test]
fn next_val_becomes_prev_val_of_the_following_call() {
    let mut site = site(|args, ctx| {
        ctx.next_val = args[0].clone();
        Ok(ctx.prev_val.clone())
    });
    let mut seen = Vec::new();
    for (i, v) in [10, 20, 30].into_iter().enumerate() {
        let key = Value::index(i);
        let out = site
            .invoke_element(&key, &Value::Int(v), &mut Remaining(2 - i))
            .unwrap();
        seen.push(out.value);
    }
    assert_eq!(seen, vec![Value::Null, Value::Int(10), Value::Int(20)]);
}

#[test]
fn next_val_is_reset_before_every_call() {
    let mut site = site(|_, ctx| {
        let before = ctx.next_val.clone();
        ctx.next_val = Value::Int(1);
        Ok(before)
    });
    for _ in 0..2 {
        let out = site
            .invoke_element(&Value::Null, &Value::Null, &mut Remaining(1))
            .unwrap();
        assert_eq!(out.value, Value::Null);
    }
}

#[test]
fn tag_persists_across_calls() {
    let mut site = site(|_, ctx| {
        let count = ctx.tag.as_int().unwrap_or(0) + 1;
        ctx.tag = Value::Int(count);
        Ok(Value::Int(count))
    });
    let last = (0..3)
        .map(|_| {
            site.invoke_element(&Value::Null, &Value::Null, &mut Remaining(1))
                .unwrap()
                .value
        })
        .last();
    assert_eq!(last, Some(Value::Int(3)));
}

#[test]
fn tag_survives_a_failing_call() {
    let mut site = site(|args, ctx| {
        if args[0].is_null() {
            ctx.tag = Value::string("kept");
            Err(lq_value::custom_error("boom"))
        } else {
            Ok(ctx.tag.clone())
        }
    });
    assert!(site
        .invoke_element(&Value::Null, &Value::Null, &mut Remaining(1))
        .is_err());
    let out = site
        .invoke(&[Value::Int(1)], &Value::Null, &Value::Int(1), &mut Remaining(0))
        .unwrap();
    assert_eq!(out.value, Value::string("kept"));
}

#[test]
fn index_and_is_first_track_the_ordinal() {
    let mut site = site(|_, ctx| {
        Ok(Value::list([
            Value::index(ctx.index),
            Value::Bool(ctx.is_first),
        ]))
    });
    let first = site
        .invoke_element(&Value::Null, &Value::Null, &mut Remaining(1))
        .unwrap();
    let second = site
        .invoke_element(&Value::Null, &Value::Null, &mut Remaining(0))
        .unwrap();
    assert_eq!(first.value, Value::list([Value::Int(0), Value::Bool(true)]));
    assert_eq!(second.value, Value::list([Value::Int(1), Value::Bool(false)]));
}

#[test]
fn is_last_consults_the_lookahead() {
    let mut site = site(|_, ctx| Ok(Value::Bool(ctx.is_last()?)));
    let not_last = site
        .invoke_element(&Value::Null, &Value::Null, &mut Remaining(1))
        .unwrap();
    let last = site
        .invoke_element(&Value::Null, &Value::Null, &mut Remaining(0))
        .unwrap();
    assert_eq!(not_last.value, Value::Bool(false));
    assert_eq!(last.value, Value::Bool(true));
}

#[test]
fn detached_context_is_last() {
    let mut ctx = IterationContext::detached();
    assert!(ctx.is_last().unwrap());
    assert!(ctx.is_first);
}

#[test]
fn cancel_and_key_rewrite_surface_in_the_outcome() {
    let mut site = site(|_, ctx| {
        ctx.cancel = true;
        ctx.key = Value::string("renamed");
        Ok(Value::Null)
    });
    let out = site
        .invoke_element(&Value::Int(0), &Value::Null, &mut Remaining(3))
        .unwrap();
    assert!(out.cancel);
    assert_eq!(out.key, Value::string("renamed"));
}

#[test]
fn lambda_reads_and_writes_fields() {
    let mut site = CallSite::new(
        Invocable::lambda("($v, $k) => { $ctx->cancel = $ctx->index >= 1; return $v . $k; }")
            .unwrap(),
    );
    let first = site
        .invoke_element(&Value::Int(0), &Value::string("a"), &mut Remaining(1))
        .unwrap();
    let second = site
        .invoke_element(&Value::Int(1), &Value::string("b"), &mut Remaining(0))
        .unwrap();
    assert_eq!(first.value, Value::string("a0"));
    assert!(!first.cancel);
    assert!(second.cancel);
}

#[test]
fn read_only_fields_reject_writes() {
    let mut ctx = IterationContext::detached();
    for field in ["index", "value", "isFirst", "isLast", "prevVal"] {
        assert!(ctx.write_field(field, Value::Int(1)).is_err(), "{field}");
    }
    assert!(ctx.write_field("nextVal", Value::Int(1)).is_ok());
    assert_eq!(ctx.read_field("nextVal").unwrap(), Value::Int(1));
}

#[test]
fn unknown_fields_are_errors() {
    let mut ctx = IterationContext::detached();
    assert!(ctx.read_field("nope").is_err());
    assert!(ctx.write_field("nope", Value::Null).is_err());
}

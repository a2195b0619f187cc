use pretty_assertions::assert_eq;
use proptest::prelude::*;

use lq_value::{ArrayValue, LinqErrorKind, Value};

use crate::{LambdaContext, LambdaExpression};

fn run(source: &str, args: &[Value]) -> Value {
    LambdaExpression::parse(source).unwrap().invoke(args).unwrap()
}

fn run_err(source: &str, args: &[Value]) -> LinqErrorKind {
    LambdaExpression::parse(source)
        .unwrap()
        .invoke(args)
        .unwrap_err()
        .kind()
        .clone()
}

fn int(n: i64) -> Value {
    Value::Int(n)
}

#[test]
fn arithmetic() {
    assert_eq!(run("$x => $x * 2 + 1", &[int(4)]), int(9));
    assert_eq!(run("$x => $x % 3", &[int(7)]), int(1));
    assert_eq!(run("$x => -$x", &[int(7)]), int(-7));
    assert_eq!(run("$x => $x + 0.5", &[int(1)]), Value::Float(1.5));
}

#[test]
fn exact_division_stays_integral() {
    assert_eq!(run("$x => $x / 2", &[int(8)]), int(4));
    assert_eq!(run("$x => $x / 2", &[int(7)]), Value::Float(3.5));
}

#[test]
fn arithmetic_errors() {
    assert_eq!(run_err("$x => $x / 0", &[int(1)]), LinqErrorKind::DivisionByZero);
    assert_eq!(run_err("$x => $x % 0", &[int(1)]), LinqErrorKind::DivisionByZero);
    assert!(matches!(
        run_err("$x => $x + 1", &[int(i64::MAX)]),
        LinqErrorKind::IntegerOverflow { .. }
    ));
    assert!(matches!(
        run_err("$x => $x - 'a'", &[int(1)]),
        LinqErrorKind::InvalidOperands { op: "-", .. }
    ));
}

#[test]
fn loose_and_strict_equality() {
    assert_eq!(run("$x => $x == 1.0", &[int(1)]), Value::Bool(true));
    assert_eq!(run("$x => $x === 1.0", &[int(1)]), Value::Bool(false));
    assert_eq!(run("$x => $x !== 1", &[int(1)]), Value::Bool(false));
    assert_eq!(run("$x => $x != 2", &[int(1)]), Value::Bool(true));
}

#[test]
fn string_concatenation() {
    assert_eq!(
        run("($v, $k) => $k . ':' . $v", &[int(5), Value::string("a")]),
        Value::string("a:5")
    );
}

#[test]
fn missing_arguments_bind_null_and_extras_are_ignored() {
    assert_eq!(run("($a, $b) => $b", &[int(1)]), Value::Null);
    assert_eq!(run("$a => $a", &[int(1), int(2), int(3)]), int(1));
}

#[test]
fn block_statements_and_return() {
    let src = "$x => {\n  $y = $x * 10;\n  $y = $y + 1;\n  return $y;\n}";
    assert_eq!(run(src, &[int(2)]), int(21));
    assert_eq!(run("$x => { $x + 1; }", &[int(2)]), Value::Null);
    assert_eq!(run("$x => { return 1; return 2; }", &[int(0)]), int(1));
}

#[test]
fn logical_short_circuit() {
    // The right side would divide by zero.
    assert_eq!(run("$x => $x > 0 && 1 / 0", &[int(0)]), Value::Bool(false));
    assert_eq!(run("$x => $x == 0 || 1 / 0", &[int(0)]), Value::Bool(true));
}

#[test]
fn coalesce_and_ternary() {
    assert_eq!(run("$x => $x ?? 'dflt'", &[Value::Null]), Value::string("dflt"));
    assert_eq!(run("$x => $nope ?? 3", &[int(0)]), int(3));
    assert_eq!(run("$x => $x > 2 ? 'big' : 'small'", &[int(3)]), Value::string("big"));
    assert_eq!(run("$x => $x ?: 'empty'", &[Value::string("")]), Value::string("empty"));
}

#[test]
fn arrays_index_and_member() {
    let mut row = ArrayValue::new();
    row.insert(Value::string("name"), Value::string("ann"));
    row.insert(Value::string("age"), int(31));
    let row = Value::array(row);
    assert_eq!(run("$r => $r['age']", &[row.clone()]), int(31));
    assert_eq!(run("$r => $r->name", &[row.clone()]), Value::string("ann"));
    assert_eq!(run("$r => $r['missing']", &[row]), Value::Null);
    assert_eq!(
        run("$x => [$x, 'k' => $x + 1]", &[int(1)]),
        Value::array(
            [(int(0), int(1)), (Value::string("k"), int(2))]
                .into_iter()
                .collect()
        )
    );
    assert_eq!(run("$s => $s[-1]", &[Value::string("abc")]), Value::string("c"));
}

#[test]
fn not_indexable() {
    assert!(matches!(
        run_err("$x => $x[0]", &[int(5)]),
        LinqErrorKind::NotIndexable { type_name: "int" }
    ));
}

#[test]
fn undefined_variable_and_function() {
    assert_eq!(
        run_err("$x => $y", &[int(1)]),
        LinqErrorKind::UndefinedVariable { name: "y".into() }
    );
    assert_eq!(
        run_err("$x => nope($x)", &[int(1)]),
        LinqErrorKind::UndefinedFunction {
            name: "nope".into()
        }
    );
}

#[test]
fn builtins() {
    assert_eq!(run("$s => strlen($s)", &[Value::string("héllo")]), int(5));
    assert_eq!(run("$s => upper(trim($s))", &[Value::string(" ab ")]), Value::string("AB"));
    assert_eq!(run("$s => substr($s, 1, 2)", &[Value::string("abcd")]), Value::string("bc"));
    assert_eq!(run("$s => substr($s, -2)", &[Value::string("abcd")]), Value::string("cd"));
    assert_eq!(run("$x => max($x, 3, 2)", &[int(1)]), int(3));
    assert_eq!(run("$x => min([4, $x, 9])", &[int(1)]), int(1));
    assert_eq!(run("$x => abs($x)", &[int(-4)]), int(4));
    assert_eq!(run("$x => round($x, 1)", &[Value::Float(2.46)]), Value::Float(2.5));
    assert_eq!(run("$x => floor($x)", &[Value::Float(2.7)]), Value::Float(2.0));
    assert_eq!(run("$x => int($x)", &[Value::string("42")]), int(42));
    assert_eq!(run("$x => str($x) . '!'", &[int(7)]), Value::string("7!"));
    assert_eq!(run("$x => is_null($x)", &[Value::Null]), Value::Bool(true));
    assert_eq!(run("$x => count([1, 2, $x])", &[int(3)]), int(3));
    assert_eq!(
        run("$x => implode(',', [1, $x])", &[int(2)]),
        Value::string("1,2")
    );
    assert_eq!(
        run("$x => starts_with($x, 'ab') && ends_with($x, 'yz')", &[Value::string("abxyz")]),
        Value::Bool(true)
    );
    assert_eq!(run("$x => contains([1, 2], $x)", &[int(2)]), Value::Bool(true));
}

#[test]
fn builtin_arity_is_checked() {
    assert!(matches!(
        run_err("$x => strlen()", &[int(1)]),
        LinqErrorKind::ArityMismatch { got: 0, .. }
    ));
}

#[test]
fn ctx_is_undefined_without_context() {
    assert_eq!(
        run_err("$x => $ctx->index", &[int(1)]),
        LinqErrorKind::UndefinedVariable { name: "ctx".into() }
    );
}

#[derive(Default)]
struct Slots {
    index: i64,
    cancel: bool,
    next: Value,
}

impl LambdaContext for Slots {
    fn read_field(&mut self, field: &str) -> lq_value::LinqResult<Value> {
        match field {
            "index" => Ok(Value::Int(self.index)),
            "cancel" => Ok(Value::Bool(self.cancel)),
            _ => Err(lq_value::no_such_property(field, "IterationContext")),
        }
    }

    fn write_field(&mut self, field: &str, value: Value) -> lq_value::LinqResult<()> {
        match field {
            "cancel" => self.cancel = value.is_truthy(),
            "nextVal" => self.next = value,
            _ => return Err(lq_value::no_such_property(field, "IterationContext")),
        }
        Ok(())
    }
}

#[test]
fn ctx_reads_and_writes_go_through_context() {
    let source = "$x => { $ctx->cancel = $ctx->index >= 2; $ctx->nextVal = $x; return $x; }";
    let lambda = LambdaExpression::parse(source).unwrap();
    assert!(lambda.uses_context());
    let mut slots = Slots {
        index: 2,
        ..Slots::default()
    };
    assert_eq!(lambda.call(&[int(9)], &mut slots).unwrap(), int(9));
    assert!(slots.cancel);
    assert_eq!(slots.next, int(9));
}

#[test]
fn deep_expression_evaluates() {
    let source = format!("$x => {}$x{}", "(1 + ".repeat(3_000), ")".repeat(3_000));
    assert_eq!(run(&source, &[int(0)]), int(3_000));
}

proptest! {
    #[test]
    fn integer_arithmetic_matches_i64(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        let lambda = LambdaExpression::parse("($a, $b) => [$a + $b, $a - $b, $a * $b]").unwrap();
        let expected = Value::list([int(a + b), int(a - b), int(a * b)]);
        prop_assert_eq!(lambda.invoke(&[int(a), int(b)]).unwrap(), expected);
    }

    #[test]
    fn remainder_keeps_the_dividend_sign(a in -1_000i64..1_000, b in 1i64..50) {
        prop_assert_eq!(run("($a, $b) => $a % $b", &[int(a), int(b)]), int(a % b));
    }
}

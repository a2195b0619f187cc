//! Binary and unary operators.
//!
//! `&&`, `||` and `??` short-circuit and are handled by the evaluator;
//! everything else is dispatched here on the operand kinds. Integer
//! arithmetic is checked: overflow is an error, never a wrap.

use std::cmp::Ordering;

use lq_value::{
    division_by_zero, integer_overflow, invalid_operands, type_mismatch, ArrayValue, LinqResult,
    Value,
};

use crate::ast::{BinaryOp, UnaryOp};

#[inline]
fn checked_int(result: Option<i64>, op_name: &'static str) -> LinqResult<Value> {
    result.map(Value::Int).ok_or_else(|| integer_overflow(op_name))
}

/// Evaluate a non-short-circuit binary operator.
pub(crate) fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> LinqResult<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left.loose_equals(right))),
        BinaryOp::NotEq => Ok(Value::Bool(!left.loose_equals(right))),
        BinaryOp::Identical => Ok(Value::Bool(left == right)),
        BinaryOp::NotIdentical => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => Ok(Value::Bool(compare(left, right, op)? == Ordering::Less)),
        BinaryOp::LtEq => Ok(Value::Bool(compare(left, right, op)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare(left, right, op)? == Ordering::Greater)),
        BinaryOp::GtEq => Ok(Value::Bool(compare(left, right, op)? != Ordering::Less)),
        BinaryOp::Concat => concat(left, right),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(left, right, op)
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => {
            Err(invalid_operands(op.as_symbol(), left.type_name(), right.type_name()))
        }
    }
}

/// Ordering for `< <= > >=`. Numbers compare numerically, strings by
/// bytes, and other same-kind pairs by the value order. NaN makes every
/// comparison false by reporting `Greater` for `<` and `Less` for `>`.
fn compare(left: &Value, right: &Value, op: BinaryOp) -> LinqResult<Ordering> {
    match (left, right) {
        (Value::Float(a), b) | (b, Value::Float(a)) if a.is_nan() && b.as_float().is_some() => {
            Ok(match op {
                BinaryOp::Lt | BinaryOp::LtEq => Ordering::Greater,
                _ => Ordering::Less,
            })
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(left.compare(right))
        }
        _ if left.kind() == right.kind() => Ok(left.compare(right)),
        (Value::Null, _) | (_, Value::Null) => Ok(left.compare(right)),
        _ => Err(invalid_operands(op.as_symbol(), left.type_name(), right.type_name())),
    }
}

fn concat(left: &Value, right: &Value) -> LinqResult<Value> {
    match (left.to_text(), right.to_text()) {
        (Some(a), Some(b)) => Ok(Value::string(a + &b)),
        _ => Err(invalid_operands(".", left.type_name(), right.type_name())),
    }
}

fn arithmetic(left: &Value, right: &Value, op: BinaryOp) -> LinqResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(*a, *b, op),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
                return Err(invalid_operands(
                    op.as_symbol(),
                    left.type_name(),
                    right.type_name(),
                ));
            };
            float_arithmetic(a, b, op)
        }
        (Value::Array(a), Value::Array(b)) if op == BinaryOp::Add => Ok(Value::array(union(a, b))),
        _ => Err(invalid_operands(
            op.as_symbol(),
            left.type_name(),
            right.type_name(),
        )),
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "inexact integer division produces a float"
)]
fn int_arithmetic(a: i64, b: i64, op: BinaryOp) -> LinqResult<Value> {
    match op {
        BinaryOp::Add => checked_int(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked_int(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked_int(a.checked_mul(b), "multiplication"),
        BinaryOp::Div => {
            if b == 0 {
                return Err(division_by_zero());
            }
            match a.checked_rem(b) {
                Some(0) => checked_int(a.checked_div(b), "division"),
                Some(_) => Ok(Value::Float(a as f64 / b as f64)),
                None => Err(integer_overflow("division")),
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(division_by_zero());
            }
            checked_int(a.checked_rem(b), "remainder")
        }
        _ => Err(invalid_operands(op.as_symbol(), "int", "int")),
    }
}

fn float_arithmetic(a: f64, b: f64, op: BinaryOp) -> LinqResult<Value> {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => Err(division_by_zero()),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::Mod => Ok(Value::Float(a % b)),
        _ => Err(invalid_operands(op.as_symbol(), "float", "float")),
    }
}

/// `a + b` on arrays keeps every key of `a` and adds the missing keys of `b`.
fn union(a: &ArrayValue, b: &ArrayValue) -> ArrayValue {
    let mut out = a.clone();
    for (key, value) in b.iter() {
        if !out.contains_key(key) {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

pub(crate) fn evaluate_unary(operand: &Value, op: UnaryOp) -> LinqResult<Value> {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => checked_int(n.checked_neg(), "negation"),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, other) => Err(type_mismatch("number", other.type_name())),
    }
}

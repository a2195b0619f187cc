//! Tree-walking evaluator.
//!
//! One [`Evaluator`] runs one invocation: parameters and assigned locals
//! live in a flat scope keyed by name, `$ctx` goes through the supplied
//! [`LambdaContext`]. Every sub-expression evaluation is stack-guarded.

mod builtins;
mod operators;

use lq_stack::ensure_sufficient_stack;
use lq_value::{
    no_such_method, no_such_property, not_indexable, type_mismatch, undefined_variable, ArrayValue,
    LinqErrorKind, LinqResult, Value,
};
use rustc_hash::FxHashMap;

pub use builtins::BUILTIN_NAMES;

use crate::ast::{AssignTarget, BinaryOp, Body, ExprArena, ExprId, ExprKind, Stmt};
use crate::context::LambdaContext;

pub(crate) struct Evaluator<'a, 'c> {
    arena: &'a ExprArena,
    locals: FxHashMap<&'a str, Value>,
    ctx: &'a mut (dyn LambdaContext + 'c),
}

impl<'a, 'c> Evaluator<'a, 'c> {
    pub(crate) fn new(arena: &'a ExprArena, ctx: &'a mut (dyn LambdaContext + 'c)) -> Self {
        Evaluator {
            arena,
            locals: FxHashMap::default(),
            ctx,
        }
    }

    pub(crate) fn bind(&mut self, name: &'a str, value: Value) {
        self.locals.insert(name, value);
    }

    /// Run a body. A block without `return` yields `Null`.
    #[tracing::instrument(level = "trace", skip_all)]
    pub(crate) fn eval_body(&mut self, body: &'a Body) -> LinqResult<Value> {
        match body {
            Body::Expr(id) => self.eval(*id),
            Body::Block(stmts) => {
                for stmt in stmts {
                    match stmt {
                        Stmt::Expr(id) => {
                            self.eval(*id)?;
                        }
                        Stmt::Return(id) => return self.eval(*id),
                    }
                }
                Ok(Value::Null)
            }
        }
    }

    fn eval(&mut self, id: ExprId) -> LinqResult<Value> {
        ensure_sufficient_stack(|| self.eval_inner(id))
    }

    fn eval_inner(&mut self, id: ExprId) -> LinqResult<Value> {
        let arena = self.arena;
        match &arena.get(id).kind {
            ExprKind::Literal(v) => Ok(v.clone()),
            ExprKind::Var(name) => self
                .locals
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| undefined_variable(name)),
            ExprKind::CtxField(field) => self.ctx.read_field(field),
            ExprKind::Array(entries) => {
                let mut array = ArrayValue::with_capacity(entries.len());
                for (key, value) in entries {
                    let value_v = self.eval(*value)?;
                    match key {
                        Some(key) => {
                            let key_v = self.eval(*key)?;
                            array.insert(key_v, value_v);
                        }
                        None => array.push(value_v),
                    }
                }
                Ok(Value::array(array))
            }
            ExprKind::Unary { op, operand } => {
                let v = self.eval(*operand)?;
                operators::evaluate_unary(&v, *op)
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, *left, *right),
            ExprKind::Ternary {
                cond,
                then,
                otherwise,
            } => {
                let c = self.eval(*cond)?;
                if c.is_truthy() {
                    match then {
                        Some(then) => self.eval(*then),
                        None => Ok(c),
                    }
                } else {
                    self.eval(*otherwise)
                }
            }
            ExprKind::Index { target, index } => {
                let target = self.eval(*target)?;
                let index = self.eval(*index)?;
                index_value(&target, &index)
            }
            ExprKind::Member { target, name } => {
                let target = self.eval(*target)?;
                member_value(&target, name)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(*receiver)?;
                let args = self.eval_args(args)?;
                match &receiver {
                    Value::Object(o) => o.call_method(method, &args),
                    other => Err(no_such_method(method, other.type_name())),
                }
            }
            ExprKind::Call { name, args } => {
                let args = self.eval_args(args)?;
                builtins::call_builtin(name, &args)
            }
            ExprKind::Assign { target, value } => {
                let v = self.eval(*value)?;
                match target {
                    AssignTarget::Var(name) => {
                        self.locals.insert(name.as_str(), v.clone());
                    }
                    AssignTarget::Ctx(field) => self.ctx.write_field(field, v.clone())?,
                }
                Ok(v)
            }
        }
    }

    fn eval_args(&mut self, args: &[ExprId]) -> LinqResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(*arg)).collect()
    }

    fn eval_binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> LinqResult<Value> {
        match op {
            BinaryOp::And => {
                let l = self.eval(left)?;
                if !l.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval(right)?.is_truthy()))
            }
            BinaryOp::Or => {
                let l = self.eval(left)?;
                if l.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval(right)?.is_truthy()))
            }
            // An undefined variable on the left counts as null.
            BinaryOp::Coalesce => match self.eval(left) {
                Ok(Value::Null) => self.eval(right),
                Err(e) if matches!(e.kind(), LinqErrorKind::UndefinedVariable { .. }) => {
                    self.eval(right)
                }
                other => other,
            },
            _ => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                operators::evaluate_binary(&l, &r, op)
            }
        }
    }
}

/// `target[index]`. Missing array keys and out-of-range string positions
/// yield `Null`; objects receive a `get` call.
fn index_value(target: &Value, index: &Value) -> LinqResult<Value> {
    match target {
        Value::Array(a) => Ok(a.get(index).cloned().unwrap_or_default()),
        Value::Str(s) => {
            let Some(i) = index.as_int() else {
                return Err(type_mismatch("int", index.type_name()));
            };
            let count = i64::try_from(s.chars().count()).unwrap_or(i64::MAX);
            let pos = if i < 0 { count + i } else { i };
            Ok(usize::try_from(pos)
                .ok()
                .and_then(|p| s.chars().nth(p))
                .map_or(Value::Null, |c| Value::string(c.to_string())))
        }
        Value::Object(o) => o.call_method("get", std::slice::from_ref(index)),
        Value::Null => Ok(Value::Null),
        other => Err(not_indexable(other.type_name())),
    }
}

/// `target->name`. Arrays expose their string keys as members.
fn member_value(target: &Value, name: &str) -> LinqResult<Value> {
    match target {
        Value::Object(o) => o.property(name),
        Value::Array(a) => Ok(a.get(&Value::string(name)).cloned().unwrap_or_default()),
        Value::Null => Ok(Value::Null),
        other => Err(no_such_property(name, other.type_name())),
    }
}

#[cfg(test)]
mod tests;

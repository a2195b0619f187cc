//! Micro-lambda compiler for the lq sequence engine.
//!
//! Turns text such as `"$x => $x * 2"` or
//! `"($v, $k) => { $ctx->cancel = $k >= 3; return $v; }"` into a
//! [`LambdaExpression`] that can be invoked like a native callback.
//!
//! # Pipeline
//!
//! ```text
//! text ── lq_lambda_core::RawScanner ──> (tag, len)
//!      ── lexer::lex ──> Token
//!      ── parser::parse ──> ExprArena + Body
//!      ── eval::Evaluator ──> Value
//! ```
//!
//! Parsing happens once, at construction. Malformed text is rejected with
//! a `LambdaParse` error carrying the byte offset; it never falls back to
//! a literal.
//!
//! # Binding
//!
//! Arguments bind positionally to the parameter list. Missing trailing
//! arguments bind `Null`; extra arguments are ignored.

pub mod ast;
mod context;
mod eval;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use lq_value::{LinqError, LinqResult, Value};
use smallvec::SmallVec;

pub use context::{LambdaContext, NoContext};
pub use eval::BUILTIN_NAMES;

use ast::{AssignTarget, Body, ExprArena, ExprKind};
use eval::Evaluator;

/// A parsed micro-lambda.
#[derive(Clone)]
pub struct LambdaExpression {
    source: String,
    params: SmallVec<[String; 2]>,
    arena: ExprArena,
    body: Body,
    uses_context: bool,
}

impl LambdaExpression {
    /// Parse lambda text.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(source: &str) -> LinqResult<Self> {
        let parsed = parser::parse(source)?;
        let uses_context = parsed.arena.iter().any(|expr| {
            matches!(
                expr.kind,
                ExprKind::CtxField(_)
                    | ExprKind::Assign {
                        target: AssignTarget::Ctx(_),
                        ..
                    }
            )
        });
        tracing::trace!(
            params = parsed.params.len(),
            nodes = parsed.arena.len(),
            uses_context,
            "compiled lambda"
        );
        Ok(LambdaExpression {
            source: source.to_string(),
            params: parsed.params,
            arena: parsed.arena,
            body: parsed.body,
            uses_context,
        })
    }

    /// Parameter names without the `$`.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True if the body reads or writes `$ctx`.
    pub fn uses_context(&self) -> bool {
        self.uses_context
    }

    /// Invoke with an iteration context.
    pub fn call(&self, args: &[Value], ctx: &mut dyn LambdaContext) -> LinqResult<Value> {
        let mut evaluator = Evaluator::new(&self.arena, ctx);
        for (i, name) in self.params.iter().enumerate() {
            evaluator.bind(name, args.get(i).cloned().unwrap_or_default());
        }
        evaluator.eval_body(&self.body)
    }

    /// Invoke without a context; `$ctx` is undefined.
    pub fn invoke(&self, args: &[Value]) -> LinqResult<Value> {
        self.call(args, &mut NoContext)
    }
}

impl FromStr for LambdaExpression {
    type Err = LinqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LambdaExpression::parse(s)
    }
}

impl fmt::Debug for LambdaExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LambdaExpression").field(&self.source).finish()
    }
}

impl fmt::Display for LambdaExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

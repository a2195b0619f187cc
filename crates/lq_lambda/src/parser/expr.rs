//! Expression parsing.
//!
//! Precedence, lowest first:
//!
//! | level | operators |
//! |---|---|
//! | assignment | `=` (right) |
//! | ternary | `?:` (right) |
//! | coalesce | `??` (right) |
//! | or | `\|\|` |
//! | and | `&&` |
//! | equality | `== != === !==` |
//! | comparison | `< <= > >=` |
//! | additive | `+ - .` |
//! | multiplicative | `* / %` |
//! | unary | `! -` |
//! | postfix | `[i]`, `->name`, `->name(args)` |

use lq_stack::ensure_sufficient_stack;
use lq_value::{LinqResult, Value};

use super::{Parser, CTX_VAR};
use crate::ast::{AssignTarget, BinaryOp, ExprId, ExprKind, ExprList, Span, UnaryOp};
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parse an expression, growing the stack for deeply nested input.
    pub(crate) fn parse_expr(&mut self) -> LinqResult<ExprId> {
        ensure_sufficient_stack(|| self.parse_assign())
    }

    fn parse_assign(&mut self) -> LinqResult<ExprId> {
        let left = self.parse_ternary()?;
        if !self.check(&TokenKind::Eq) {
            return Ok(left);
        }
        let eq_span = self.advance().span;
        let left_expr = self.arena.get(left);
        let target = match &left_expr.kind {
            ExprKind::Var(name) if name != CTX_VAR => AssignTarget::Var(name.clone()),
            ExprKind::CtxField(field) => AssignTarget::Ctx(field.clone()),
            _ => return Err(self.error_at("invalid assignment target", eq_span)),
        };
        let start = left_expr.span;
        let value = self.parse_expr()?;
        let span = start.merge(self.arena.span(value));
        Ok(self.arena.alloc(ExprKind::Assign { target, value }, span))
    }

    fn parse_ternary(&mut self) -> LinqResult<ExprId> {
        let cond = self.parse_coalesce()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(cond);
        }
        let then = if self.eat(&TokenKind::Colon) {
            None
        } else {
            let then = self.parse_expr()?;
            self.expect(&TokenKind::Colon, "`:` in conditional expression")?;
            Some(then)
        };
        let otherwise = ensure_sufficient_stack(|| self.parse_ternary())?;
        let span = self.arena.span(cond).merge(self.arena.span(otherwise));
        Ok(self.arena.alloc(
            ExprKind::Ternary {
                cond,
                then,
                otherwise,
            },
            span,
        ))
    }

    fn parse_coalesce(&mut self) -> LinqResult<ExprId> {
        let left = self.parse_or()?;
        if !self.eat(&TokenKind::QuestionQuestion) {
            return Ok(left);
        }
        let right = ensure_sufficient_stack(|| self.parse_coalesce())?;
        Ok(self.binary(BinaryOp::Coalesce, left, right))
    }

    fn parse_or(&mut self) -> LinqResult<ExprId> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = self.binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> LinqResult<ExprId> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            left = self.binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> LinqResult<ExprId> {
        let mut left = self.parse_comparison()?;
        while let Some(op) = self.match_equality_op() {
            self.advance();
            let right = self.parse_comparison()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> LinqResult<ExprId> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.match_comparison_op() {
            self.advance();
            let right = self.parse_additive()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> LinqResult<ExprId> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) = self.match_additive_op() {
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> LinqResult<ExprId> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.match_multiplicative_op() {
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> LinqResult<ExprId> {
        let op = match self.current_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        let span = start.merge(self.arena.span(operand));
        Ok(self.arena.alloc(ExprKind::Unary { op, operand }, span))
    }

    fn parse_postfix(&mut self) -> LinqResult<ExprId> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.expect(&TokenKind::RBracket, "`]` after index")?;
                    let span = self.arena.span(expr).merge(end);
                    expr = self.arena.alloc(ExprKind::Index { target: expr, index }, span);
                }
                TokenKind::Arrow => {
                    self.advance();
                    let (name, name_span) = self.parse_member_name()?;
                    if self.check(&TokenKind::LParen) {
                        let (args, end) = self.parse_args()?;
                        let span = self.arena.span(expr).merge(end);
                        expr = self.arena.alloc(
                            ExprKind::MethodCall {
                                receiver: expr,
                                method: name,
                                args,
                            },
                            span,
                        );
                    } else {
                        let span = self.arena.span(expr).merge(name_span);
                        expr = self.arena.alloc(ExprKind::Member { target: expr, name }, span);
                    }
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_member_name(&mut self) -> LinqResult<(String, Span)> {
        let span = self.current_span();
        let name = match self.current_kind() {
            TokenKind::Ident(name) => name.clone(),
            // `$g->return` is not valid, but keyword-named members are.
            TokenKind::True => "true".to_string(),
            TokenKind::False => "false".to_string(),
            TokenKind::Null => "null".to_string(),
            _ => return Err(self.error_expected("a member name after `->`")),
        };
        self.advance();
        Ok((name, span))
    }

    /// `( [expr ("," expr)* [","]] )`; returns the span of `)`.
    fn parse_args(&mut self) -> LinqResult<(ExprList, Span)> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut args = ExprList::new();
        loop {
            if let TokenKind::RParen = self.current_kind() {
                return Ok((args, self.advance().span));
            }
            args.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) && !self.check(&TokenKind::RParen) {
                return Err(self.error_expected("`,` or `)` in argument list"));
            }
        }
    }

    fn parse_primary(&mut self) -> LinqResult<ExprId> {
        let tok = self.current();
        let span = tok.span;
        let literal = match &tok.kind {
            TokenKind::Int(n) => Value::Int(*n),
            TokenKind::Float(f) => Value::Float(*f),
            TokenKind::Str(s) => Value::string(s.as_str()),
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Null => Value::Null,
            TokenKind::Var(name) if name == CTX_VAR => return self.parse_ctx_field(),
            TokenKind::Var(name) => {
                self.advance();
                return Ok(self.arena.alloc(ExprKind::Var(name.clone()), span));
            }
            TokenKind::Ident(name) => {
                self.advance();
                if !self.check(&TokenKind::LParen) {
                    return Err(self.error_at(
                        format!("unexpected identifier `{name}`, variables start with `$`"),
                        span,
                    ));
                }
                let (args, end) = self.parse_args()?;
                return Ok(self.arena.alloc(
                    ExprKind::Call {
                        name: name.clone(),
                        args,
                    },
                    span.merge(end),
                ));
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                return Ok(inner);
            }
            TokenKind::LBracket => return self.parse_array(),
            _ => return Err(self.error_expected("an expression")),
        };
        self.advance();
        Ok(self.arena.alloc(ExprKind::Literal(literal), span))
    }

    /// `$ctx->field`; the context has fields but no methods.
    fn parse_ctx_field(&mut self) -> LinqResult<ExprId> {
        let start = self.advance().span;
        if !self.eat(&TokenKind::Arrow) {
            return Err(self.error_expected("`->` after `$ctx`"));
        }
        let (field, field_span) = self.parse_member_name()?;
        if self.check(&TokenKind::LParen) {
            return Err(self.error_at("`$ctx` has fields, not methods", field_span));
        }
        Ok(self
            .arena
            .alloc(ExprKind::CtxField(field), start.merge(field_span)))
    }

    fn parse_array(&mut self) -> LinqResult<ExprId> {
        let start = self.advance().span;
        let mut entries = Vec::new();
        loop {
            if let TokenKind::RBracket = self.current_kind() {
                let end = self.advance().span;
                return Ok(self.arena.alloc(ExprKind::Array(entries), start.merge(end)));
            }
            let first = self.parse_expr()?;
            if self.eat(&TokenKind::FatArrow) {
                let value = self.parse_expr()?;
                entries.push((Some(first), value));
            } else {
                entries.push((None, first));
            }
            if !self.eat(&TokenKind::Comma) && !self.check(&TokenKind::RBracket) {
                return Err(self.error_expected("`,` or `]` in array literal"));
            }
        }
    }

    // Operator matching

    fn match_equality_op(&self) -> Option<BinaryOp> {
        match self.current_kind() {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::BangEq => Some(BinaryOp::NotEq),
            TokenKind::EqEqEq => Some(BinaryOp::Identical),
            TokenKind::BangEqEq => Some(BinaryOp::NotIdentical),
            _ => None,
        }
    }

    fn match_comparison_op(&self) -> Option<BinaryOp> {
        match self.current_kind() {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        }
    }

    fn match_additive_op(&self) -> Option<BinaryOp> {
        match self.current_kind() {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Dot => Some(BinaryOp::Concat),
            _ => None,
        }
    }

    fn match_multiplicative_op(&self) -> Option<BinaryOp> {
        match self.current_kind() {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        }
    }

    fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        let span = self.arena.span(left).merge(self.arena.span(right));
        self.arena.alloc(ExprKind::Binary { op, left, right }, span)
    }
}

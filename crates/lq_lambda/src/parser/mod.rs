//! Recursive-descent parser for micro-lambdas.
//!
//! ```text
//! lambda  := params "=>" body
//! params  := VAR | "(" [VAR ("," VAR)*] ")"
//! body    := "{" stmt* "}" | ["return"] expr [";"]
//! stmt    := "return" expr [";"] | expr [";"] | ";"
//! ```
//!
//! Expression precedence is in [`expr`]. All errors are `LambdaParse`
//! with the byte offset of the offending token.

mod expr;

use lq_value::{lambda_parse_error, LinqError, LinqResult};
use smallvec::SmallVec;

use crate::ast::{Body, ExprArena, Span, Stmt};
use crate::lexer::{lex, Token, TokenKind};

/// Name reserved for the iteration context.
pub(crate) const CTX_VAR: &str = "ctx";

/// Output of a successful parse.
#[derive(Clone, Debug)]
pub struct ParsedLambda {
    pub params: SmallVec<[String; 2]>,
    pub arena: ExprArena,
    pub body: Body,
}

/// Parse lambda text.
pub fn parse(source: &str) -> LinqResult<ParsedLambda> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(&tokens);
    let params = parser.parse_params()?;
    parser.expect(&TokenKind::FatArrow, "`=>` after the parameter list")?;
    let body = parser.parse_body()?;
    Ok(ParsedLambda {
        params,
        arena: parser.arena,
        body,
    })
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    pub(crate) arena: ExprArena,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Parser {
            tokens,
            pos: 0,
            arena: ExprArena::new(),
        }
    }

    // Cursor helpers

    #[inline]
    pub(crate) fn current(&self) -> &'t Token {
        // `lex` always ends the stream with `Eof`, and `advance` never
        // moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    pub(crate) fn current_kind(&self) -> &'t TokenKind {
        &self.current().kind
    }

    #[inline]
    pub(crate) fn current_span(&self) -> Span {
        self.current().span
    }

    #[inline]
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub(crate) fn advance(&mut self) -> &'t Token {
        let tok = self.current();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    /// Consume `kind` if present.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) -> LinqResult<Span> {
        if self.check(kind) {
            Ok(self.advance().span)
        } else {
            Err(self.error_expected(what))
        }
    }

    #[cold]
    pub(crate) fn error_expected(&self, what: &str) -> LinqError {
        let found = self.current();
        lambda_parse_error(
            format!("expected {what}, found {}", found.kind.describe()),
            found.span.start,
        )
    }

    #[cold]
    pub(crate) fn error_at(&self, message: impl Into<String>, span: Span) -> LinqError {
        lambda_parse_error(message, span.start)
    }

    // Header

    fn parse_params(&mut self) -> LinqResult<SmallVec<[String; 2]>> {
        let mut params = SmallVec::new();
        if self.eat(&TokenKind::LParen) {
            if self.eat(&TokenKind::RParen) {
                return Ok(params);
            }
            loop {
                self.parse_param(&mut params)?;
                if self.eat(&TokenKind::RParen) {
                    break;
                }
                self.expect(&TokenKind::Comma, "`,` or `)` in the parameter list")?;
            }
        } else {
            self.parse_param(&mut params)?;
        }
        Ok(params)
    }

    fn parse_param(&mut self, params: &mut SmallVec<[String; 2]>) -> LinqResult<()> {
        let span = self.current_span();
        let TokenKind::Var(name) = self.current_kind() else {
            return Err(self.error_expected("a parameter like `$x`"));
        };
        if name == CTX_VAR {
            return Err(self.error_at("`$ctx` is reserved and cannot be a parameter", span));
        }
        if params.iter().any(|p| p == name) {
            return Err(self.error_at(format!("duplicate parameter `${name}`"), span));
        }
        params.push(name.clone());
        self.advance();
        Ok(())
    }

    // Body

    fn parse_body(&mut self) -> LinqResult<Body> {
        let body = if self.eat(&TokenKind::LBrace) {
            let mut stmts = Vec::new();
            while !self.eat(&TokenKind::RBrace) {
                if self.check(&TokenKind::Eof) {
                    return Err(self.error_expected("`}` to close the lambda body"));
                }
                if let Some(stmt) = self.parse_stmt()? {
                    stmts.push(stmt);
                }
            }
            Body::Block(stmts)
        } else {
            self.eat(&TokenKind::Return);
            let expr = self.parse_expr()?;
            self.eat(&TokenKind::Semicolon);
            Body::Expr(expr)
        };
        if !self.check(&TokenKind::Eof) {
            return Err(self.error_expected("end of lambda"));
        }
        Ok(body)
    }

    fn parse_stmt(&mut self) -> LinqResult<Option<Stmt>> {
        if self.eat(&TokenKind::Semicolon) {
            return Ok(None);
        }
        let stmt = if self.eat(&TokenKind::Return) {
            Stmt::Return(self.parse_expr()?)
        } else {
            Stmt::Expr(self.parse_expr()?)
        };
        if !self.eat(&TokenKind::Semicolon) && !self.check(&TokenKind::RBrace) {
            return Err(self.error_expected("`;` after statement"));
        }
        Ok(Some(stmt))
    }
}

#[cfg(test)]
mod tests;

//! Token cooking.
//!
//! Runs the raw scanner from `lq_lambda_core`, drops trivia, resolves
//! keywords, decodes string escapes and numeric literals, and turns
//! scanner error tags into `LambdaParse` errors at the offending offset.

use lq_lambda_core::{RawScanner, RawTag, SourceBuffer};
use lq_value::{lambda_parse_error, LinqResult};

use crate::ast::Span;

/// Cooked token kind.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    /// `$name`, stored without the `$`.
    Var(String),
    Ident(String),

    // Keywords
    True,
    False,
    Null,
    Return,

    // Punctuation, one per raw operator/delimiter tag
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    Bang,
    BangEq,
    BangEqEq,
    Eq,
    EqEq,
    EqEqEq,
    FatArrow,
    Arrow,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpAmp,
    PipePipe,
    Question,
    QuestionQuestion,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,

    Eof,
}

impl TokenKind {
    /// Short description for "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Int(n) => format!("integer `{n}`"),
            TokenKind::Float(f) => format!("float `{f}`"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Var(name) => format!("`${name}`"),
            TokenKind::Ident(name) => format!("`{name}`"),
            TokenKind::True => "`true`".to_string(),
            TokenKind::False => "`false`".to_string(),
            TokenKind::Null => "`null`".to_string(),
            TokenKind::Return => "`return`".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("`{}`", other.punct()),
        }
    }

    fn punct(&self) -> &'static str {
        match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Dot => ".",
            TokenKind::Bang => "!",
            TokenKind::BangEq => "!=",
            TokenKind::BangEqEq => "!==",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::EqEqEq => "===",
            TokenKind::FatArrow => "=>",
            TokenKind::Arrow => "->",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Question => "?",
            TokenKind::QuestionQuestion => "??",
            TokenKind::Colon => ":",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            _ => "?",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Cook `source` into tokens. The last token is always `Eof`.
pub fn lex(source: &str) -> LinqResult<Vec<Token>> {
    let buf = SourceBuffer::new(source);
    let mut scanner = RawScanner::new(buf.cursor());
    let mut tokens = Vec::new();
    loop {
        let start = scanner.pos();
        let raw = scanner.next_token();
        let span = Span::new(start, start + raw.len);
        if raw.tag.is_trivia() {
            continue;
        }
        let text = source
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default();
        let kind = cook(raw.tag, text, span)?;
        let done = kind == TokenKind::Eof;
        tokens.push(Token { kind, span });
        if done {
            return Ok(tokens);
        }
    }
}

fn cook(tag: RawTag, text: &str, span: Span) -> LinqResult<TokenKind> {
    let kind = match tag {
        RawTag::Ident => keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string())),
        RawTag::Variable => TokenKind::Var(text.get(1..).unwrap_or_default().to_string()),
        RawTag::Int => TokenKind::Int(parse_int(text, 10, span)?),
        RawTag::HexInt => TokenKind::Int(parse_int(text.get(2..).unwrap_or_default(), 16, span)?),
        RawTag::Float => TokenKind::Float(parse_float(text, span)?),
        RawTag::String => {
            let body = text.get(1..text.len().saturating_sub(1)).unwrap_or_default();
            TokenKind::Str(unescape(body))
        }
        RawTag::Plus => TokenKind::Plus,
        RawTag::Minus => TokenKind::Minus,
        RawTag::Star => TokenKind::Star,
        RawTag::Slash => TokenKind::Slash,
        RawTag::Percent => TokenKind::Percent,
        RawTag::Dot => TokenKind::Dot,
        RawTag::Bang => TokenKind::Bang,
        RawTag::BangEqual => TokenKind::BangEq,
        RawTag::BangEqualEqual => TokenKind::BangEqEq,
        RawTag::Equal => TokenKind::Eq,
        RawTag::EqualEqual => TokenKind::EqEq,
        RawTag::EqualEqualEqual => TokenKind::EqEqEq,
        RawTag::FatArrow => TokenKind::FatArrow,
        RawTag::Arrow => TokenKind::Arrow,
        RawTag::Less => TokenKind::Lt,
        RawTag::LessEqual => TokenKind::LtEq,
        RawTag::Greater => TokenKind::Gt,
        RawTag::GreaterEqual => TokenKind::GtEq,
        RawTag::AmpersandAmpersand => TokenKind::AmpAmp,
        RawTag::PipePipe => TokenKind::PipePipe,
        RawTag::Question => TokenKind::Question,
        RawTag::QuestionQuestion => TokenKind::QuestionQuestion,
        RawTag::Colon => TokenKind::Colon,
        RawTag::LeftParen => TokenKind::LParen,
        RawTag::RightParen => TokenKind::RParen,
        RawTag::LeftBracket => TokenKind::LBracket,
        RawTag::RightBracket => TokenKind::RBracket,
        RawTag::LeftBrace => TokenKind::LBrace,
        RawTag::RightBrace => TokenKind::RBrace,
        RawTag::Comma => TokenKind::Comma,
        RawTag::Semicolon => TokenKind::Semicolon,
        RawTag::Eof => TokenKind::Eof,
        RawTag::Whitespace | RawTag::Newline => {
            return Err(lambda_parse_error("unexpected trivia", span.start))
        }
        RawTag::UnterminatedString => {
            return Err(lambda_parse_error("unterminated string literal", span.start))
        }
        RawTag::LoneDollar => {
            return Err(lambda_parse_error(
                "expected a variable name after `$`",
                span.start,
            ))
        }
        RawTag::LoneAmpersand => {
            return Err(lambda_parse_error("unexpected `&`, did you mean `&&`?", span.start))
        }
        RawTag::LonePipe => {
            return Err(lambda_parse_error("unexpected `|`, did you mean `||`?", span.start))
        }
        RawTag::InteriorNull => {
            return Err(lambda_parse_error("null byte in lambda text", span.start))
        }
        RawTag::InvalidByte => {
            return Err(lambda_parse_error(
                format!("unexpected character `{text}`"),
                span.start,
            ))
        }
    };
    Ok(kind)
}

fn keyword(text: &str) -> Option<TokenKind> {
    if text.eq_ignore_ascii_case("true") {
        Some(TokenKind::True)
    } else if text.eq_ignore_ascii_case("false") {
        Some(TokenKind::False)
    } else if text.eq_ignore_ascii_case("null") {
        Some(TokenKind::Null)
    } else if text == "return" {
        Some(TokenKind::Return)
    } else {
        None
    }
}

fn parse_int(digits: &str, radix: u32, span: Span) -> LinqResult<i64> {
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    i64::from_str_radix(&cleaned, radix)
        .map_err(|_| lambda_parse_error("integer literal out of range", span.start))
}

fn parse_float(text: &str, span: Span) -> LinqResult<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| lambda_parse_error("malformed float literal", span.start))
}

/// Decode `\n \t \r \\ \' \" \0 \$`. Unknown escapes keep the backslash.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"' | '$')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

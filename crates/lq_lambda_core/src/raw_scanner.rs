//! Hand-written scanner producing `(RawTag, len)` pairs.
//!
//! Dispatch covers all 256 byte values. Errors are tags, not `Err`: the
//! cooking layer decides how to report them. The sentinel dispatches to
//! `eof()`, and subsequent calls keep returning `Eof`.

use crate::cursor::Cursor;
use crate::tag::{RawTag, RawToken};

/// Allocation-free scanner over a [`Cursor`].
pub struct RawScanner<'a> {
    cursor: Cursor<'a>,
}

impl<'a> RawScanner<'a> {
    pub fn new(cursor: Cursor<'a>) -> Self {
        RawScanner { cursor }
    }

    /// Byte offset of the next token.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.cursor.pos()
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> RawToken {
        let start = self.cursor.pos();
        let tag = match self.cursor.current() {
            0 => return self.eof(start),
            b' ' | b'\t' | b'\r' => {
                self.cursor.eat_whitespace();
                RawTag::Whitespace
            }
            b'\n' => self.single(RawTag::Newline),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.cursor.advance();
                self.cursor.eat_while(is_ident_continue);
                RawTag::Ident
            }
            b'$' => self.variable(),
            b'0'..=b'9' => self.number(),
            quote @ (b'\'' | b'"') => self.string(quote),
            b'+' => self.single(RawTag::Plus),
            b'*' => self.single(RawTag::Star),
            b'/' => self.single(RawTag::Slash),
            b'%' => self.single(RawTag::Percent),
            b'.' => self.single(RawTag::Dot),
            b':' => self.single(RawTag::Colon),
            b'-' => self.pair(b'>', RawTag::Arrow, RawTag::Minus),
            b'=' => self.equal(),
            b'!' => self.bang(),
            b'<' => self.pair(b'=', RawTag::LessEqual, RawTag::Less),
            b'>' => self.pair(b'=', RawTag::GreaterEqual, RawTag::Greater),
            b'&' => self.pair(b'&', RawTag::AmpersandAmpersand, RawTag::LoneAmpersand),
            b'|' => self.pair(b'|', RawTag::PipePipe, RawTag::LonePipe),
            b'?' => self.pair(b'?', RawTag::QuestionQuestion, RawTag::Question),
            b'(' => self.single(RawTag::LeftParen),
            b')' => self.single(RawTag::RightParen),
            b'[' => self.single(RawTag::LeftBracket),
            b']' => self.single(RawTag::RightBracket),
            b'{' => self.single(RawTag::LeftBrace),
            b'}' => self.single(RawTag::RightBrace),
            b',' => self.single(RawTag::Comma),
            b';' => self.single(RawTag::Semicolon),
            // Control bytes, other punctuation, and non-ASCII outside strings
            _ => {
                self.cursor.advance_char();
                RawTag::InvalidByte
            }
        };
        RawToken {
            tag,
            len: self.cursor.pos() - start,
        }
    }

    fn eof(&mut self, start: u32) -> RawToken {
        if self.cursor.is_eof() {
            return RawToken {
                tag: RawTag::Eof,
                len: 0,
            };
        }
        self.cursor.advance();
        RawToken {
            tag: RawTag::InteriorNull,
            len: self.cursor.pos() - start,
        }
    }

    #[inline]
    fn single(&mut self, tag: RawTag) -> RawTag {
        self.cursor.advance();
        tag
    }

    /// Two-byte operator if the next byte is `second`, else the one-byte form.
    #[inline]
    fn pair(&mut self, second: u8, long: RawTag, short: RawTag) -> RawTag {
        if self.cursor.peek() == second {
            self.cursor.advance_n(2);
            long
        } else {
            self.cursor.advance();
            short
        }
    }

    fn equal(&mut self) -> RawTag {
        match (self.cursor.peek(), self.cursor.peek2()) {
            (b'=', b'=') => {
                self.cursor.advance_n(3);
                RawTag::EqualEqualEqual
            }
            (b'=', _) => {
                self.cursor.advance_n(2);
                RawTag::EqualEqual
            }
            (b'>', _) => {
                self.cursor.advance_n(2);
                RawTag::FatArrow
            }
            _ => self.single(RawTag::Equal),
        }
    }

    fn bang(&mut self) -> RawTag {
        match (self.cursor.peek(), self.cursor.peek2()) {
            (b'=', b'=') => {
                self.cursor.advance_n(3);
                RawTag::BangEqualEqual
            }
            (b'=', _) => {
                self.cursor.advance_n(2);
                RawTag::BangEqual
            }
            _ => self.single(RawTag::Bang),
        }
    }

    fn variable(&mut self) -> RawTag {
        self.cursor.advance(); // '$'
        if matches!(self.cursor.current(), b'a'..=b'z' | b'A'..=b'Z' | b'_') {
            self.cursor.eat_while(is_ident_continue);
            RawTag::Variable
        } else {
            RawTag::LoneDollar
        }
    }

    fn number(&mut self) -> RawTag {
        let first = self.cursor.current();
        self.cursor.advance();

        if first == b'0'
            && matches!(self.cursor.current(), b'x' | b'X')
            && self.cursor.peek().is_ascii_hexdigit()
        {
            self.cursor.advance();
            self.cursor.eat_while(|b| b.is_ascii_hexdigit() || b == b'_');
            return RawTag::HexInt;
        }

        self.eat_decimal_digits();
        let mut is_float = false;

        // `1.5` is a float; `1 . 5` and `1.x` are concatenations.
        if self.cursor.current() == b'.' && self.cursor.peek().is_ascii_digit() {
            self.cursor.advance();
            self.eat_decimal_digits();
            is_float = true;
        }

        if matches!(self.cursor.current(), b'e' | b'E') {
            let digit_at = match self.cursor.peek() {
                b'+' | b'-' => self.cursor.peek2(),
                b => b,
            };
            if digit_at.is_ascii_digit() {
                self.cursor.advance();
                if matches!(self.cursor.current(), b'+' | b'-') {
                    self.cursor.advance();
                }
                self.eat_decimal_digits();
                is_float = true;
            }
        }

        if is_float {
            RawTag::Float
        } else {
            RawTag::Int
        }
    }

    fn eat_decimal_digits(&mut self) {
        self.cursor.eat_while(|b| b.is_ascii_digit() || b == b'_');
    }

    fn string(&mut self, quote: u8) -> RawTag {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.skip_to_string_delim(quote) {
                b'\\' => {
                    self.cursor.advance();
                    if !self.cursor.is_eof() {
                        self.cursor.advance_char();
                    }
                }
                0 => return RawTag::UnterminatedString,
                _ => {
                    self.cursor.advance(); // closing quote
                    return RawTag::String;
                }
            }
        }
    }
}

impl Iterator for RawScanner<'_> {
    type Item = RawToken;

    fn next(&mut self) -> Option<RawToken> {
        let tok = self.next_token();
        (tok.tag != RawTag::Eof).then_some(tok)
    }
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan `source` and collect every token before `Eof`.
pub fn tokenize(source: &str) -> Vec<RawToken> {
    let buf = crate::SourceBuffer::new(source);
    RawScanner::new(buf.cursor()).collect()
}

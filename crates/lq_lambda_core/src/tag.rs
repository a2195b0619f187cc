//! Raw token tags.

/// Token kind produced by the scanner.
///
/// Discriminants are grouped by category: literals `0..16`, operators
/// `32..64`, delimiters `80..96`, trivia `112..`, errors `240..`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RawTag {
    // Identifiers & literals
    /// Bare identifier (`count`, `true`, `return`).
    Ident = 0,
    /// `$name`, including the `$`.
    Variable = 1,
    Int = 2,
    HexInt = 3,
    Float = 4,
    /// Quoted string, either `'...'` or `"..."`, quotes included.
    String = 5,

    // Operators
    Plus = 32,
    Minus = 33,
    Star = 34,
    Slash = 35,
    Percent = 36,
    /// `.`, string concatenation.
    Dot = 37,
    Bang = 38,
    BangEqual = 39,
    BangEqualEqual = 40,
    Equal = 41,
    EqualEqual = 42,
    EqualEqualEqual = 43,
    /// `=>`.
    FatArrow = 44,
    /// `->`.
    Arrow = 45,
    Less = 46,
    LessEqual = 47,
    Greater = 48,
    GreaterEqual = 49,
    AmpersandAmpersand = 50,
    PipePipe = 51,
    Question = 52,
    QuestionQuestion = 53,
    Colon = 54,

    // Delimiters
    LeftParen = 80,
    RightParen = 81,
    LeftBracket = 82,
    RightBracket = 83,
    LeftBrace = 84,
    RightBrace = 85,
    Comma = 86,
    Semicolon = 87,

    // Trivia
    Whitespace = 112,
    Newline = 113,

    // Errors
    InvalidByte = 240,
    UnterminatedString = 241,
    /// `$` not followed by an identifier.
    LoneDollar = 242,
    /// Single `&` or `|`; bitwise operators are not part of the language.
    LoneAmpersand = 243,
    LonePipe = 244,
    InteriorNull = 245,

    Eof = 255,
}

impl RawTag {
    /// Whitespace or newline.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, RawTag::Whitespace | RawTag::Newline)
    }

    #[inline]
    pub fn is_error(self) -> bool {
        (self as u8) >= RawTag::InvalidByte as u8 && self != RawTag::Eof
    }

    /// Display text for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            RawTag::Ident => "identifier",
            RawTag::Variable => "variable",
            RawTag::Int | RawTag::HexInt => "integer",
            RawTag::Float => "float",
            RawTag::String => "string",
            RawTag::Plus => "`+`",
            RawTag::Minus => "`-`",
            RawTag::Star => "`*`",
            RawTag::Slash => "`/`",
            RawTag::Percent => "`%`",
            RawTag::Dot => "`.`",
            RawTag::Bang => "`!`",
            RawTag::BangEqual => "`!=`",
            RawTag::BangEqualEqual => "`!==`",
            RawTag::Equal => "`=`",
            RawTag::EqualEqual => "`==`",
            RawTag::EqualEqualEqual => "`===`",
            RawTag::FatArrow => "`=>`",
            RawTag::Arrow => "`->`",
            RawTag::Less => "`<`",
            RawTag::LessEqual => "`<=`",
            RawTag::Greater => "`>`",
            RawTag::GreaterEqual => "`>=`",
            RawTag::AmpersandAmpersand => "`&&`",
            RawTag::PipePipe => "`||`",
            RawTag::Question => "`?`",
            RawTag::QuestionQuestion => "`??`",
            RawTag::Colon => "`:`",
            RawTag::LeftParen => "`(`",
            RawTag::RightParen => "`)`",
            RawTag::LeftBracket => "`[`",
            RawTag::RightBracket => "`]`",
            RawTag::LeftBrace => "`{`",
            RawTag::RightBrace => "`}`",
            RawTag::Comma => "`,`",
            RawTag::Semicolon => "`;`",
            RawTag::Whitespace => "whitespace",
            RawTag::Newline => "newline",
            RawTag::InvalidByte => "invalid character",
            RawTag::UnterminatedString => "unterminated string",
            RawTag::LoneDollar => "`$` without a name",
            RawTag::LoneAmpersand => "`&`",
            RawTag::LonePipe => "`|`",
            RawTag::InteriorNull => "null byte",
            RawTag::Eof => "end of input",
        }
    }
}

/// A tag plus its byte length.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawToken {
    pub tag: RawTag,
    pub len: u32,
}

const _: () = assert!(std::mem::size_of::<RawToken>() == 8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_range() {
        assert!(RawTag::InvalidByte.is_error());
        assert!(RawTag::InteriorNull.is_error());
        assert!(!RawTag::Eof.is_error());
        assert!(!RawTag::QuestionQuestion.is_error());
    }

    #[test]
    fn trivia() {
        assert!(RawTag::Whitespace.is_trivia());
        assert!(RawTag::Newline.is_trivia());
        assert!(!RawTag::Semicolon.is_trivia());
    }
}

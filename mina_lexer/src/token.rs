//! Token definitions for Mina.

use mina_common::Spanned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token kinds, matching the original implementation's `TokenType` set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    Number(i64),
    StringLiteral(String),
    BoolLiteral(bool),

    // Identifiers
    Identifier(String),

    // Keywords
    KeywordIf,
    KeywordThen,
    KeywordElse,
    KeywordEnd,
    KeywordRepeat,
    KeywordUntil,
    KeywordLoop,
    KeywordExit,
    KeywordVar,
    KeywordFunc,
    KeywordProc,
    KeywordInteger,
    KeywordBoolean,
    KeywordGet,
    KeywordPut,
    KeywordSkip,
    KeywordReturn,

    // Operators and punctuation
    ColonEqual, // :=
    Equal,      // =
    BangEqual,  // !=
    Less,       // <
    LessEqual,  // <=
    Greater,    // >
    GreaterEqual, // >=
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Ampersand,  // &
    Pipe,       // |
    Tilde,      // ~
    Hash,       // #
    Colon,      // :
    Semicolon,  // ;
    Comma,      // ,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftSquare,
    RightSquare,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::StringLiteral(s) => write!(f, "\"{s}\""),
            TokenKind::BoolLiteral(b) => write!(f, "{b}"),
            TokenKind::Identifier(name) => write!(f, "{name}"),
            TokenKind::KeywordIf => write!(f, "if"),
            TokenKind::KeywordThen => write!(f, "then"),
            TokenKind::KeywordElse => write!(f, "else"),
            TokenKind::KeywordEnd => write!(f, "end"),
            TokenKind::KeywordRepeat => write!(f, "repeat"),
            TokenKind::KeywordUntil => write!(f, "until"),
            TokenKind::KeywordLoop => write!(f, "loop"),
            TokenKind::KeywordExit => write!(f, "exit"),
            TokenKind::KeywordVar => write!(f, "var"),
            TokenKind::KeywordFunc => write!(f, "func"),
            TokenKind::KeywordProc => write!(f, "proc"),
            TokenKind::KeywordInteger => write!(f, "integer"),
            TokenKind::KeywordBoolean => write!(f, "boolean"),
            TokenKind::KeywordGet => write!(f, "get"),
            TokenKind::KeywordPut => write!(f, "put"),
            TokenKind::KeywordSkip => write!(f, "skip"),
            TokenKind::KeywordReturn => write!(f, "return"),
            TokenKind::ColonEqual => write!(f, ":="),
            TokenKind::Equal => write!(f, "="),
            TokenKind::BangEqual => write!(f, "!="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Ampersand => write!(f, "&"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Tilde => write!(f, "~"),
            TokenKind::Hash => write!(f, "#"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::LeftSquare => write!(f, "["),
            TokenKind::RightSquare => write!(f, "]"),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}

/// Maps a scanned identifier to its keyword token, if it is one.
pub fn keyword_for(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "if" => TokenKind::KeywordIf,
        "then" => TokenKind::KeywordThen,
        "else" => TokenKind::KeywordElse,
        "end" => TokenKind::KeywordEnd,
        "repeat" => TokenKind::KeywordRepeat,
        "until" => TokenKind::KeywordUntil,
        "loop" => TokenKind::KeywordLoop,
        "exit" => TokenKind::KeywordExit,
        "var" => TokenKind::KeywordVar,
        "func" => TokenKind::KeywordFunc,
        "proc" => TokenKind::KeywordProc,
        "integer" => TokenKind::KeywordInteger,
        "boolean" => TokenKind::KeywordBoolean,
        "get" => TokenKind::KeywordGet,
        "put" => TokenKind::KeywordPut,
        "skip" => TokenKind::KeywordSkip,
        "return" => TokenKind::KeywordReturn,
        "true" => TokenKind::BoolLiteral(true),
        "false" => TokenKind::BoolLiteral(false),
        _ => return None,
    })
}

/// A token with its source span.
pub type Token = Spanned<TokenKind>;

pub trait TokenExt {
    fn is_eof(&self) -> bool;
}

impl TokenExt for Token {
    fn is_eof(&self) -> bool {
        matches!(self.value, TokenKind::Eof)
    }
}

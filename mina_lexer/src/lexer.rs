//! Lexer implementation for Mina.

use crate::{keyword_for, CharStream, Token, TokenKind};
use mina_common::{MinaError, MinaResult, Span};

/// Scans Mina source text into a flat token stream.
pub struct Lexer<'a> {
    stream: CharStream<'a>,
    file_id: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, file_id: u32) -> Self {
        Self { stream: CharStream::new(input), file_id }
    }

    /// Tokenizes the entire input, appending a trailing `Eof` token.
    pub fn tokenize(&mut self) -> MinaResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.value == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn span_from(&self, start: mina_common::Position) -> Span {
        Span::new(start, self.stream.position(), self.file_id)
    }

    fn next_token(&mut self) -> MinaResult<Token> {
        self.skip_whitespace_and_comments();

        let start = self.stream.position();
        let Some(ch) = self.stream.current() else {
            return Ok(Token::new(TokenKind::Eof, self.span_from(start)));
        };

        let kind = match ch {
            '(' => { self.stream.advance(); TokenKind::LeftParen }
            ')' => { self.stream.advance(); TokenKind::RightParen }
            '{' => { self.stream.advance(); TokenKind::LeftBrace }
            '}' => { self.stream.advance(); TokenKind::RightBrace }
            '[' => { self.stream.advance(); TokenKind::LeftSquare }
            ']' => { self.stream.advance(); TokenKind::RightSquare }
            ';' => { self.stream.advance(); TokenKind::Semicolon }
            ',' => { self.stream.advance(); TokenKind::Comma }
            '+' => { self.stream.advance(); TokenKind::Plus }
            '-' => { self.stream.advance(); TokenKind::Minus }
            '*' => { self.stream.advance(); TokenKind::Star }
            '/' => { self.stream.advance(); TokenKind::Slash }
            '&' => { self.stream.advance(); TokenKind::Ampersand }
            '|' => { self.stream.advance(); TokenKind::Pipe }
            '~' => { self.stream.advance(); TokenKind::Tilde }
            '#' => { self.stream.advance(); TokenKind::Hash }
            ':' => {
                self.stream.advance();
                if self.stream.current() == Some('=') {
                    self.stream.advance();
                    TokenKind::ColonEqual
                } else {
                    TokenKind::Colon
                }
            }
            '=' => { self.stream.advance(); TokenKind::Equal }
            '!' => {
                self.stream.advance();
                if self.stream.current() == Some('=') {
                    self.stream.advance();
                    TokenKind::BangEqual
                } else {
                    return Err(MinaError::lex(
                        "expected '=' after '!'",
                        self.span_from(start),
                    ));
                }
            }
            '<' => {
                self.stream.advance();
                if self.stream.current() == Some('=') {
                    self.stream.advance();
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                self.stream.advance();
                if self.stream.current() == Some('=') {
                    self.stream.advance();
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '"' => self.scan_string(start)?,
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),
            c => {
                return Err(MinaError::lex(
                    format!("unexpected character '{c}'"),
                    self.span_from(start),
                ))
            }
        };

        Ok(Token::new(kind, self.span_from(start)))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.stream.skip_whitespace();
            if self.stream.current() == Some('/') && self.stream.peek_next() == Some('/') {
                while let Some(c) = self.stream.current() {
                    if c == '\n' {
                        break;
                    }
                    self.stream.advance();
                }
            } else {
                break;
            }
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.stream.current() {
            if c.is_ascii_digit() {
                text.push(c);
                self.stream.advance();
            } else {
                break;
            }
        }
        // Parsing cannot fail: the loop above only ever collects ASCII digits.
        TokenKind::Number(text.parse().expect("digit-only scan produces a valid i64"))
    }

    fn scan_identifier_or_keyword(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.stream.current() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.stream.advance();
            } else {
                break;
            }
        }
        keyword_for(&text).unwrap_or(TokenKind::Identifier(text))
    }

    fn scan_string(&mut self, start: mina_common::Position) -> MinaResult<TokenKind> {
        self.stream.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.stream.current() {
                None => {
                    return Err(MinaError::lex("unterminated string literal", self.span_from(start)))
                }
                Some('"') => {
                    self.stream.advance();
                    break;
                }
                Some('\\') => {
                    self.stream.advance();
                    match self.stream.current() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some('"') => text.push('"'),
                        Some('\\') => text.push('\\'),
                        Some(other) => text.push(other),
                        None => {
                            return Err(MinaError::lex(
                                "unterminated string literal",
                                self.span_from(start),
                            ))
                        }
                    }
                    self.stream.advance();
                }
                Some(c) => {
                    text.push(c);
                    self.stream.advance();
                }
            }
        }
        Ok(TokenKind::StringLiteral(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, 0)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn scans_scenario_one() {
        let got = kinds("{ var x : integer; get(x); put(x, skip) }");
        assert_eq!(got[0], TokenKind::LeftBrace);
        assert_eq!(got[1], TokenKind::KeywordVar);
        assert_eq!(got[2], TokenKind::Identifier("x".into()));
        assert_eq!(got[3], TokenKind::Colon);
        assert_eq!(got[4], TokenKind::KeywordInteger);
        assert!(got.contains(&TokenKind::KeywordGet));
        assert!(got.contains(&TokenKind::KeywordSkip));
        assert_eq!(*got.last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn distinguishes_assign_from_colon() {
        assert_eq!(kinds(":=")[0], TokenKind::ColonEqual);
        assert_eq!(kinds(":")[0], TokenKind::Colon);
    }

    #[test]
    fn distinguishes_relational_operators() {
        assert_eq!(kinds("<=")[0], TokenKind::LessEqual);
        assert_eq!(kinds("<")[0], TokenKind::Less);
        assert_eq!(kinds(">=")[0], TokenKind::GreaterEqual);
        assert_eq!(kinds("!=")[0], TokenKind::BangEqual);
    }

    #[test]
    fn scans_negative_number_as_minus_then_literal() {
        // Mina has no unary-minus literal form; `-4` lexes as Minus, Number(4).
        let got = kinds("-4");
        assert_eq!(got[0], TokenKind::Minus);
        assert_eq!(got[1], TokenKind::Number(4));
    }

    #[test]
    fn skips_line_comments() {
        let got = kinds("x // trailing comment\ny");
        assert_eq!(got[0], TokenKind::Identifier("x".into()));
        assert_eq!(got[1], TokenKind::Identifier("y".into()));
    }

    #[test]
    fn rejects_unterminated_string() {
        let mut lexer = Lexer::new("\"abc", 0);
        assert!(lexer.tokenize().is_err());
    }
}

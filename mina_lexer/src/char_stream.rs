//! Character stream abstraction for lexing with one character of lookahead.

use mina_common::Position;

/// A cursor over the source text that tracks line/column as it advances.
pub struct CharStream<'a> {
    input: &'a str,
    chars: Vec<char>,
    idx: usize,
    position: Position,
}

impl<'a> CharStream<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            idx: 0,
            position: Position::start(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.input
    }

    pub fn is_finished(&self) -> bool {
        self.idx >= self.chars.len()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Current character without consuming it.
    pub fn current(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    /// Lookahead one character past current, without consuming.
    pub fn peek_next(&self) -> Option<char> {
        self.chars.get(self.idx + 1).copied()
    }

    /// Consumes and returns the current character, advancing line/column
    /// bookkeeping.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.idx).copied()?;
        self.idx += 1;
        if ch == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        self.position.offset += ch.len_utf8() as u32;
        Some(ch)
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_line_and_column() {
        let mut s = CharStream::new("ab\ncd");
        assert_eq!(s.position(), Position::new(1, 1, 0));
        s.advance();
        s.advance();
        assert_eq!(s.position(), Position::new(1, 3, 2));
        s.advance(); // consumes '\n'
        assert_eq!(s.position(), Position::new(2, 1, 3));
    }

    #[test]
    fn is_finished_at_end() {
        let mut s = CharStream::new("x");
        assert!(!s.is_finished());
        s.advance();
        assert!(s.is_finished());
    }
}

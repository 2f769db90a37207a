//! Recursive-descent parser for Mina.
//!
//! Panic-mode error handling: the first syntax error aborts parsing with a
//! single `MinaError::Parse`, carrying the offending token and line, the way
//! the original implementation's `exitParse` does — but as a returned
//! `Result` rather than a process-level `exit(1)`, since a library aborting
//! its host process is not how this crate's other error paths behave.

use crate::ast::*;
use mina_common::{MinaError, MinaResult, Span};
use mina_lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse_program(&mut self) -> MinaResult<Program> {
        let body = self.parse_block()?;
        self.expect_eof()?;
        Ok(Program { body })
    }

    // --- token plumbing -----------------------------------------------

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.current].value
    }

    fn current_span(&self) -> Span {
        self.tokens[self.current].span
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.current].clone();
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> MinaResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected '{kind}'")))
        }
    }

    fn expect_eof(&mut self) -> MinaResult<()> {
        if matches!(self.peek(), TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.error("expected end of input"))
        }
    }

    /// Panic-mode abort: `"Error on line N: <msg>, got <token>"`, the same
    /// shape the original compiler prints before exiting.
    fn error(&self, msg: impl Into<String>) -> MinaError {
        let span = self.current_span();
        MinaError::parse(
            format!("{}, got '{}'", msg.into(), self.peek()),
            span,
        )
    }

    fn expect_ident(&mut self) -> MinaResult<Ident> {
        let span = self.current_span();
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Ident { name, span })
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    fn parse_type(&mut self) -> MinaResult<Type> {
        if self.eat(&TokenKind::KeywordInteger) {
            Ok(Type::Integer)
        } else if self.eat(&TokenKind::KeywordBoolean) {
            Ok(Type::Boolean)
        } else {
            Err(self.error("expected a type ('integer' or 'boolean')"))
        }
    }

    // --- blocks, declarations -------------------------------------------

    fn parse_block(&mut self) -> MinaResult<Block> {
        let start = self.current_span();
        self.expect(TokenKind::LeftBrace)?;

        let mut decls = Vec::new();
        while self.check(&TokenKind::KeywordVar)
            || self.check(&TokenKind::KeywordProc)
            || self.check(&TokenKind::KeywordFunc)
            || ((self.check(&TokenKind::KeywordInteger) || self.check(&TokenKind::KeywordBoolean))
                && self.peek_is_func_after_type())
        {
            decls.push(self.parse_decl()?);
            self.eat(&TokenKind::Semicolon);
        }

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            stmts.push(self.parse_stmt()?);
            self.eat(&TokenKind::Semicolon);
        }
        self.expect(TokenKind::RightBrace)?;

        let span = start.combine(self.current_span());
        Ok(Block { decls, stmts, span })
    }

    /// Lookahead used to distinguish `integer func sq(...) = ...` (a function
    /// declaration with an explicit return type) from a `var x : integer`
    /// declaration, both of which start with a type keyword in different
    /// positions.
    fn peek_is_func_after_type(&self) -> bool {
        matches!(self.tokens.get(self.current + 1).map(|t| &t.value), Some(TokenKind::KeywordFunc))
    }

    fn parse_decl(&mut self) -> MinaResult<Decl> {
        if self.check(&TokenKind::KeywordInteger) || self.check(&TokenKind::KeywordBoolean) {
            let return_type = self.parse_type()?;
            return Ok(Decl::Func(self.parse_callable(Some(return_type))?));
        }
        if self.eat(&TokenKind::KeywordVar) {
            let name = self.expect_ident()?;
            if self.eat(&TokenKind::LeftSquare) {
                let size_span = self.current_span();
                let size = match self.peek().clone() {
                    TokenKind::Number(n) if n >= 0 => {
                        self.advance();
                        n as u32
                    }
                    _ => return Err(self.error("expected a non-negative array size")),
                };
                let _ = size_span;
                self.expect(TokenKind::RightSquare)?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                Ok(Decl::Array { name, size, ty })
            } else {
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                Ok(Decl::Var { name, ty })
            }
        } else if self.check(&TokenKind::KeywordProc) {
            Ok(Decl::Proc(self.parse_callable(None)?))
        } else if self.check(&TokenKind::KeywordFunc) {
            Err(self.error("function declarations need a return type, e.g. 'integer func f(...)'"))
        } else {
            Err(self.error("expected a declaration"))
        }
    }

    /// `<return type> func sq(x: integer) = <block>` or
    /// `proc p(x: integer) = <block>`. The return type, when present, has
    /// already been consumed by the caller.
    fn parse_callable(&mut self, return_type: Option<Type>) -> MinaResult<Callable> {
        let start = self.current_span();
        if return_type.is_some() {
            self.expect(TokenKind::KeywordFunc)?;
        } else {
            self.expect(TokenKind::KeywordProc)?;
        }
        let name = self.expect_ident()?;
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                let pname = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param { name: pname, ty });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        if params.len() > 4 {
            return Err(MinaError::lowering(format!(
                "'{}' declares {} parameters; Mina supports at most 4",
                name.name,
                params.len()
            )));
        }
        self.expect(TokenKind::Equal)?;
        let body = self.parse_callable_body()?;
        let span = start.combine(self.current_span());
        Ok(Callable { name, params, return_type, body, span })
    }

    /// A callable's body after `=` is either a full `{ ... }` block or a bare
    /// expression, which desugars to `{ return expr }` — the shorthand
    /// function-as-expression form (`integer func sq(x:integer) = x * x`).
    fn parse_callable_body(&mut self) -> MinaResult<Block> {
        if self.check(&TokenKind::LeftBrace) {
            return self.parse_block();
        }
        let expr = self.parse_expr()?;
        let span = expr.span();
        Ok(Block { decls: Vec::new(), stmts: vec![Stmt::Return { value: Some(expr), span }], span })
    }

    // --- statements ------------------------------------------------------

    fn parse_stmt(&mut self) -> MinaResult<Stmt> {
        let start = self.current_span();
        match self.peek().clone() {
            TokenKind::KeywordIf => self.parse_if(),
            TokenKind::KeywordRepeat => self.parse_repeat_until(),
            TokenKind::KeywordLoop => self.parse_loop(),
            TokenKind::KeywordExit => {
                self.advance();
                Ok(Stmt::Exit { span: start })
            }
            TokenKind::KeywordPut => self.parse_put(),
            TokenKind::KeywordGet => self.parse_get(),
            TokenKind::KeywordReturn => self.parse_return(),
            TokenKind::Identifier(_) => self.parse_assign_or_call(),
            _ => Err(self.error("expected a statement")),
        }
    }

    fn parse_if(&mut self) -> MinaResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::KeywordIf)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::KeywordThen)?;
        let then_block = self.parse_stmt_sequence_until(&[TokenKind::KeywordElse, TokenKind::KeywordEnd])?;
        let else_block = if self.eat(&TokenKind::KeywordElse) {
            self.parse_stmt_sequence_until(&[TokenKind::KeywordEnd])?
        } else {
            Block { decls: Vec::new(), stmts: Vec::new(), span: self.current_span() }
        };
        self.expect(TokenKind::KeywordEnd)?;
        self.expect(TokenKind::KeywordIf)?;
        let span = start.combine(self.current_span());
        Ok(Stmt::If { cond, then_block, else_block, span })
    }

    fn parse_repeat_until(&mut self) -> MinaResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::KeywordRepeat)?;
        let body = self.parse_stmt_sequence_until(&[TokenKind::KeywordUntil])?;
        self.expect(TokenKind::KeywordUntil)?;
        let cond = self.parse_expr()?;
        let span = start.combine(self.current_span());
        Ok(Stmt::RepeatUntil { body, cond, span })
    }

    fn parse_loop(&mut self) -> MinaResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::KeywordLoop)?;
        let body = self.parse_stmt_sequence_until(&[TokenKind::KeywordEnd])?;
        self.expect(TokenKind::KeywordEnd)?;
        self.expect(TokenKind::KeywordLoop)?;
        let span = start.combine(self.current_span());
        Ok(Stmt::Loop { body, span })
    }

    /// A bare statement sequence (no declarations, no enclosing braces) used
    /// by `if`/`repeat`/`loop` arms, terminated by one of `terminators`.
    fn parse_stmt_sequence_until(&mut self, terminators: &[TokenKind]) -> MinaResult<Block> {
        let start = self.current_span();
        let mut stmts = Vec::new();
        while !terminators.iter().any(|t| self.check(t)) {
            stmts.push(self.parse_stmt()?);
            self.eat(&TokenKind::Semicolon);
        }
        let span = start.combine(self.current_span());
        Ok(Block { decls: Vec::new(), stmts, span })
    }

    fn parse_put(&mut self) -> MinaResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::KeywordPut)?;
        self.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                if self.eat(&TokenKind::KeywordSkip) {
                    args.push(PutArg::Skip);
                } else {
                    args.push(PutArg::Expr(self.parse_expr()?));
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        let span = start.combine(self.current_span());
        Ok(Stmt::Put { args, span })
    }

    fn parse_get(&mut self) -> MinaResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::KeywordGet)?;
        self.expect(TokenKind::LeftParen)?;
        let target = self.expect_ident()?;
        self.expect(TokenKind::RightParen)?;
        let span = start.combine(self.current_span());
        Ok(Stmt::Get { target, span })
    }

    fn parse_return(&mut self) -> MinaResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::KeywordReturn)?;
        let value = if self.check(&TokenKind::Semicolon) || self.check(&TokenKind::RightBrace) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let span = start.combine(self.current_span());
        Ok(Stmt::Return { value, span })
    }

    fn parse_assign_or_call(&mut self) -> MinaResult<Stmt> {
        let start = self.current_span();
        let name = self.expect_ident()?;
        if self.eat(&TokenKind::LeftSquare) {
            let index = self.parse_expr()?;
            self.expect(TokenKind::RightSquare)?;
            self.expect(TokenKind::ColonEqual)?;
            let value = self.parse_expr()?;
            let span = start.combine(self.current_span());
            return Ok(Stmt::ArrayAssign { target: name, index, value, span });
        }
        if self.eat(&TokenKind::ColonEqual) {
            let value = self.parse_expr()?;
            let span = start.combine(self.current_span());
            return Ok(Stmt::Assign { target: name, value, span });
        }
        if self.check(&TokenKind::LeftParen) {
            let call = self.parse_call_args(name)?;
            let span = start.combine(self.current_span());
            return Ok(Stmt::Call { call, span });
        }
        Err(self.error("expected ':=', '[' or '(' after identifier"))
    }

    fn parse_call_args(&mut self, callee: Ident) -> MinaResult<Call> {
        let start = callee.span;
        self.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        if args.len() > 4 {
            return Err(MinaError::lowering(format!(
                "call to '{}' passes {} arguments; Mina supports at most 4",
                callee.name,
                args.len()
            )));
        }
        let span = start.combine(self.current_span());
        Ok(Call { callee, args, span })
    }

    // --- expressions: standard precedence climb -------------------------
    // or  <  and  <  equality  <  relational  <  additive  <  multiplicative  <  unary  <  primary

    fn parse_expr(&mut self) -> MinaResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> MinaResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&TokenKind::Pipe) {
            let rhs = self.parse_and()?;
            let span = lhs.span().combine(rhs.span());
            lhs = Expr::Binary { op: BinOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> MinaResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&TokenKind::Ampersand) {
            let rhs = self.parse_equality()?;
            let span = lhs.span().combine(rhs.span());
            lhs = Expr::Binary { op: BinOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> MinaResult<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = if self.eat(&TokenKind::Equal) {
                BinOp::Eq
            } else if self.eat(&TokenKind::BangEqual) {
                BinOp::Ne
            } else {
                break;
            };
            let rhs = self.parse_relational()?;
            let span = lhs.span().combine(rhs.span());
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> MinaResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = if self.eat(&TokenKind::Less) {
                BinOp::Lt
            } else if self.eat(&TokenKind::LessEqual) {
                BinOp::Lte
            } else if self.eat(&TokenKind::Greater) {
                BinOp::Gt
            } else if self.eat(&TokenKind::GreaterEqual) {
                BinOp::Gte
            } else {
                break;
            };
            let rhs = self.parse_additive()?;
            let span = lhs.span().combine(rhs.span());
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> MinaResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = if self.eat(&TokenKind::Plus) {
                BinOp::Add
            } else if self.eat(&TokenKind::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_multiplicative()?;
            let span = lhs.span().combine(rhs.span());
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> MinaResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.eat(&TokenKind::Star) {
                BinOp::Mul
            } else if self.eat(&TokenKind::Slash) {
                BinOp::Div
            } else {
                break;
            };
            let rhs = self.parse_unary()?;
            let span = lhs.span().combine(rhs.span());
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> MinaResult<Expr> {
        let start = self.current_span();
        if self.eat(&TokenKind::Minus) {
            let operand = self.parse_unary()?;
            let span = start.combine(operand.span());
            return Ok(Expr::Unary { op: UnOp::Neg, operand: Box::new(operand), span });
        }
        if self.eat(&TokenKind::Tilde) {
            let operand = self.parse_unary()?;
            let span = start.combine(operand.span());
            return Ok(Expr::Unary { op: UnOp::Not, operand: Box::new(operand), span });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> MinaResult<Expr> {
        let start = self.current_span();
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n, start))
            }
            TokenKind::BoolLiteral(b) => {
                self.advance();
                Ok(Expr::Bool(b, start))
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(Expr::Str(s, start))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                let ident = Ident { name: name.clone(), span: start };
                if self.eat(&TokenKind::LeftSquare) {
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RightSquare)?;
                    let span = start.combine(self.current_span());
                    Ok(Expr::ArrayAccess { array: ident, index: Box::new(index), span })
                } else if self.check(&TokenKind::LeftParen) {
                    let call = self.parse_call_args(ident)?;
                    Ok(Expr::Call(call))
                } else {
                    Ok(Expr::Var(ident))
                }
            }
            _ => Err(self.error("expected an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mina_lexer::Lexer;

    fn parse(src: &str) -> MinaResult<Program> {
        let tokens = Lexer::new(src, 0).tokenize().unwrap();
        Parser::new(tokens).parse_program()
    }

    #[test]
    fn parses_all_six_end_to_end_scenarios() {
        let sources = [
            "{ var x : integer; get(x); put(x, skip) }",
            "{ var a : integer; a := 2 * (3 + 4); put(a, skip) }",
            "{ var n : integer; get(n); if n > 0 then put(\"pos\", skip) else put(\"neg\", skip) end if }",
            "{ var i : integer; i := 0; repeat i := i + 1; put(i, skip) until i >= 3 }",
            "{ var a[3] : integer; a[0] := 10; a[1] := 20; a[2] := 30; put(a[0] + a[1] + a[2], skip) }",
            "{ integer func sq(x:integer) = x * x; put(sq(6), skip) }",
        ];
        for src in sources {
            parse(src).unwrap_or_else(|e| panic!("failed to parse {src:?}: {e}"));
        }
    }

    #[test]
    fn rejects_too_many_parameters() {
        let err = parse("{ integer func f(a:integer,b:integer,c:integer,d:integer,e:integer) = a }")
            .unwrap_err();
        assert!(matches!(err, MinaError::Lowering { .. }));
    }

    #[test]
    fn parses_nested_if_and_loop() {
        parse(
            "{ var i : integer; i := 0; loop if i >= 3 then exit end if; i := i + 1 end loop }",
        )
        .unwrap();
    }

    #[test]
    fn panic_mode_reports_line_and_offending_token() {
        let err = parse("{ var x integer; }").unwrap_err();
        match err {
            MinaError::Parse { message, .. } => assert!(message.contains("got")),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}

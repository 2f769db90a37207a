//! Minimal semantic checking, run after parsing and before AST-to-IR
//! translation. Implements exactly the checks the error handling design
//! calls fatal semantic errors: redeclaration, use before declaration, type
//! mismatch, arity mismatch, and scalar-vs-array confusion. Grounded in the
//! original implementation's `Symbol`/`Semantic` pairing — a scope-stack
//! symbol table consulted before code generation, rather than folded into
//! the IR translator itself.

use crate::ast::*;
use mina_common::{MinaError, MinaResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolKind {
    Scalar(Type),
    Array(Type),
    Proc,
    Func(Type),
}

struct Scope {
    symbols: HashMap<String, SymbolKind>,
}

/// Walks the AST validating declarations and uses without producing output;
/// a clean pass means `mina_ir`'s translator can assume the program is
/// well-formed.
pub struct SemanticChecker {
    scopes: Vec<Scope>,
    /// Arity/return-type of every declared callable, visible for forward
    /// calls anywhere in the enclosing block (Mina has no forward-declare
    /// keyword; declarations in a block's header are visible to the whole
    /// block, mirroring how the translator registers callables up front).
    callables: HashMap<String, (usize, Option<Type>)>,
    in_function: Vec<bool>,
}

impl SemanticChecker {
    pub fn new() -> Self {
        Self { scopes: vec![Scope { symbols: HashMap::new() }], callables: HashMap::new(), in_function: vec![false] }
    }

    pub fn check_program(program: &Program) -> MinaResult<()> {
        let mut checker = SemanticChecker::new();
        checker.check_block(&program.body)
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope { symbols: HashMap::new() });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Ident, kind: SymbolKind) -> MinaResult<()> {
        let scope = self.scopes.last_mut().expect("at least one scope is always active");
        if scope.symbols.contains_key(&name.name) {
            return Err(MinaError::semantic(
                format!("'{}' is already declared in this scope", name.name),
                name.span,
            ));
        }
        scope.symbols.insert(name.name.clone(), kind);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<SymbolKind> {
        self.scopes.iter().rev().find_map(|s| s.symbols.get(name).copied())
    }

    fn check_block(&mut self, block: &Block) -> MinaResult<()> {
        self.push_scope();

        // Callables are registered before their bodies are checked so that
        // mutually-referencing declarations and forward calls resolve.
        for decl in &block.decls {
            match decl {
                Decl::Proc(c) => {
                    self.declare(&c.name, SymbolKind::Proc)?;
                    self.callables.insert(c.name.name.clone(), (c.params.len(), None));
                }
                Decl::Func(c) => {
                    let ret = c.return_type.expect("parser always assigns a function a return type");
                    self.declare(&c.name, SymbolKind::Func(ret))?;
                    self.callables.insert(c.name.name.clone(), (c.params.len(), Some(ret)));
                }
                _ => {}
            }
        }

        for decl in &block.decls {
            match decl {
                Decl::Var { name, ty } => self.declare(name, SymbolKind::Scalar(*ty))?,
                Decl::Array { name, ty, .. } => self.declare(name, SymbolKind::Array(*ty))?,
                Decl::Proc(c) | Decl::Func(c) => self.check_callable(c)?,
            }
        }

        for stmt in &block.stmts {
            self.check_stmt(stmt)?;
        }

        self.pop_scope();
        Ok(())
    }

    fn check_callable(&mut self, c: &Callable) -> MinaResult<()> {
        if c.params.len() > 4 {
            return Err(MinaError::lowering(format!(
                "'{}' declares {} parameters; Mina supports at most 4",
                c.name.name,
                c.params.len()
            )));
        }
        self.push_scope();
        for p in &c.params {
            self.declare(&p.name, SymbolKind::Scalar(p.ty))?;
        }
        self.in_function.push(c.return_type.is_some());
        // check_block pushes its own scope for the body; parameters live in
        // the scope just above it so the body can see them.
        let result = self.check_block(&c.body);
        self.in_function.pop();
        self.pop_scope();
        result
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> MinaResult<()> {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                let ty = self.expect_scalar(target)?;
                let vty = self.check_expr(value)?;
                self.expect_type(ty, vty, value.span())?;
                Ok(())
            }
            Stmt::ArrayAssign { target, index, value, .. } => {
                let ty = self.expect_array(target)?;
                let ity = self.check_expr(index)?;
                self.expect_type(Type::Integer, ity, index.span())?;
                let vty = self.check_expr(value)?;
                self.expect_type(ty, vty, value.span())
            }
            Stmt::If { cond, then_block, else_block, .. } => {
                let cty = self.check_expr(cond)?;
                self.expect_type(Type::Boolean, cty, cond.span())?;
                self.check_block(then_block)?;
                self.check_block(else_block)
            }
            Stmt::RepeatUntil { body, cond, .. } => {
                self.check_block(body)?;
                let cty = self.check_expr(cond)?;
                self.expect_type(Type::Boolean, cty, cond.span())
            }
            Stmt::Loop { body, .. } => self.check_block(body),
            Stmt::Exit { .. } => Ok(()),
            Stmt::Put { args, .. } => {
                for arg in args {
                    if let PutArg::Expr(e) = arg {
                        self.check_expr(e)?;
                    }
                }
                Ok(())
            }
            Stmt::Get { target, .. } => {
                self.expect_scalar(target)?;
                Ok(())
            }
            Stmt::Return { value, span } => {
                let wants_value = *self.in_function.last().expect("scope stack is never empty");
                match (wants_value, value) {
                    (true, Some(e)) => {
                        self.check_expr(e)?;
                        Ok(())
                    }
                    (true, None) => Err(MinaError::lowering("function must return a value")),
                    (false, None) => Ok(()),
                    (false, Some(_)) => Err(MinaError::semantic(
                        "'return' with a value is only valid inside a function",
                        *span,
                    )),
                }
            }
            Stmt::Call { call, .. } => {
                self.check_call(call)?;
                Ok(())
            }
        }
    }

    fn check_call(&mut self, call: &Call) -> MinaResult<Option<Type>> {
        for arg in &call.args {
            self.check_expr(arg)?;
        }
        match self.callables.get(&call.callee.name) {
            Some((arity, ret)) => {
                if *arity != call.args.len() {
                    return Err(MinaError::lowering(format!(
                        "'{}' expects {} argument(s), got {}",
                        call.callee.name,
                        arity,
                        call.args.len()
                    )));
                }
                Ok(*ret)
            }
            None => Err(MinaError::semantic(
                format!("use of undeclared procedure/function '{}'", call.callee.name),
                call.callee.span,
            )),
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> MinaResult<Type> {
        match expr {
            Expr::Number(_, _) => Ok(Type::Integer),
            Expr::Bool(_, _) => Ok(Type::Boolean),
            Expr::Str(_, _) => Ok(Type::Integer), // strings only ever appear as `put` arguments
            Expr::Var(ident) => self.expect_scalar(ident),
            Expr::ArrayAccess { array, index, .. } => {
                let ty = self.expect_array(array)?;
                let ity = self.check_expr(index)?;
                self.expect_type(Type::Integer, ity, index.span())?;
                Ok(ty)
            }
            Expr::Call(call) => match self.check_call(call)? {
                Some(ty) => Ok(ty),
                None => Err(MinaError::semantic(
                    format!("'{}' is a procedure and cannot be used as an expression", call.callee.name),
                    call.span,
                )),
            },
            Expr::Unary { op, operand, span } => {
                let ty = self.check_expr(operand)?;
                match op {
                    UnOp::Neg => self.expect_type(Type::Integer, ty, *span),
                    UnOp::Not => self.expect_type(Type::Boolean, ty, *span),
                }?;
                Ok(ty)
            }
            Expr::Binary { op, lhs, rhs, span } => {
                let lt = self.check_expr(lhs)?;
                let rt = self.check_expr(rhs)?;
                match op {
                    BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                        self.expect_type(Type::Integer, lt, lhs.span())?;
                        self.expect_type(Type::Integer, rt, rhs.span())?;
                        Ok(Type::Integer)
                    }
                    BinOp::And | BinOp::Or => {
                        self.expect_type(Type::Boolean, lt, lhs.span())?;
                        self.expect_type(Type::Boolean, rt, rhs.span())?;
                        Ok(Type::Boolean)
                    }
                    BinOp::Lt | BinOp::Lte | BinOp::Gt | BinOp::Gte => {
                        self.expect_type(Type::Integer, lt, lhs.span())?;
                        self.expect_type(Type::Integer, rt, rhs.span())?;
                        Ok(Type::Boolean)
                    }
                    BinOp::Eq | BinOp::Ne => {
                        self.expect_type(lt, rt, *span)?;
                        Ok(Type::Boolean)
                    }
                }
            }
        }
    }

    fn expect_scalar(&self, ident: &Ident) -> MinaResult<Type> {
        match self.lookup(&ident.name) {
            Some(SymbolKind::Scalar(ty)) => Ok(ty),
            Some(_) => Err(MinaError::semantic(
                format!("'{}' is not a scalar variable", ident.name),
                ident.span,
            )),
            None => Err(MinaError::semantic(
                format!("use of undeclared variable '{}'", ident.name),
                ident.span,
            )),
        }
    }

    fn expect_array(&self, ident: &Ident) -> MinaResult<Type> {
        match self.lookup(&ident.name) {
            Some(SymbolKind::Array(ty)) => Ok(ty),
            Some(_) => Err(MinaError::semantic(
                format!("'{}' is not an array variable", ident.name),
                ident.span,
            )),
            None => Err(MinaError::semantic(
                format!("use of undeclared array '{}'", ident.name),
                ident.span,
            )),
        }
    }

    fn expect_type(&self, expected: Type, actual: Type, span: mina_common::Span) -> MinaResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(MinaError::semantic(
                format!("type mismatch: expected {expected:?}, found {actual:?}"),
                span,
            ))
        }
    }
}

impl Default for SemanticChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mina_lexer::Lexer;
    use crate::parser::Parser;

    fn check(src: &str) -> MinaResult<()> {
        let tokens = Lexer::new(src, 0).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        SemanticChecker::check_program(&program)
    }

    #[test]
    fn accepts_scenario_one() {
        assert!(check("{ var x : integer; get(x); put(x, skip) }").is_ok());
    }

    #[test]
    fn rejects_redeclaration() {
        let err = check("{ var x : integer; var x : boolean; put(skip) }").unwrap_err();
        assert!(matches!(err, MinaError::Semantic { .. }));
    }

    #[test]
    fn rejects_use_before_declaration() {
        let err = check("{ x := 1 }").unwrap_err();
        assert!(matches!(err, MinaError::Semantic { .. }));
    }

    #[test]
    fn rejects_type_mismatch() {
        let err = check("{ var x : integer; x := true }").unwrap_err();
        assert!(matches!(err, MinaError::Semantic { .. }));
    }

    #[test]
    fn rejects_scalar_indexed_like_array() {
        let err = check("{ var x : integer; x[0] := 1 }").unwrap_err();
        assert!(matches!(err, MinaError::Semantic { .. }));
    }

    #[test]
    fn rejects_wrong_arity_call() {
        let err = check("{ integer func sq(x: integer) = x * x; var y : integer; y := sq(1, 2) }")
            .unwrap_err();
        assert!(matches!(err, MinaError::Lowering { .. }));
    }

    #[test]
    fn accepts_scenario_six() {
        assert!(check("{ integer func sq(x:integer) = x * x; put(sq(6), skip) }").is_ok());
    }
}

//! Abstract syntax tree for Mina.
//!
//! Covers exactly the node inventory in the external AST boundary: program,
//! scope, declarations (variable, array, function, procedure), statements
//! (assignment, if, repeat/until, loop, exit, put, get, return, call), and
//! expressions (number, bool, string, identifier, array access, call, unary,
//! binary).

use mina_common::Span;
use serde::{Deserialize, Serialize};

/// `Integer` or `Boolean` — the only two scalar types Mina has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Integer,
    Boolean,
}

/// A name carrying its declaration span, for semantic-error reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub body: Block,
}

/// A `{ ... }` lexical scope: declarations followed by statements, matching
/// the original grammar's block shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decl {
    Var { name: Ident, ty: Type },
    Array { name: Ident, size: u32, ty: Type },
    Proc(Callable),
    Func(Callable),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
}

/// A `proc`/`func` declaration. Procedures have `return_type: None`;
/// functions always have one. Up to 4 parameters, per the external boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Callable {
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Assign { target: Ident, value: Expr, span: Span },
    ArrayAssign { target: Ident, index: Expr, value: Expr, span: Span },
    If { cond: Expr, then_block: Block, else_block: Block, span: Span },
    RepeatUntil { body: Block, cond: Expr, span: Span },
    Loop { body: Block, span: Span },
    Exit { span: Span },
    Put { args: Vec<PutArg>, span: Span },
    Get { target: Ident, span: Span },
    Return { value: Option<Expr>, span: Span },
    Call { call: Call, span: Span },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PutArg {
    Expr(Expr),
    /// Bare `skip` inside a `put(...)` argument list — lowers to a newline.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub callee: Ident,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Number(i64, Span),
    Bool(bool, Span),
    Str(String, Span),
    Var(Ident),
    ArrayAccess { array: Ident, index: Box<Expr>, span: Span },
    Call(Call),
    Unary { op: UnOp, operand: Box<Expr>, span: Span },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, s) | Expr::Str(_, s) | Expr::Bool(_, s) => *s,
            Expr::Var(ident) => ident.span,
            Expr::ArrayAccess { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. } => *span,
            Expr::Call(call) => call.span,
        }
    }
}

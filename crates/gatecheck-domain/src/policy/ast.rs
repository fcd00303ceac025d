use super::builtins::Builtin;
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub col: u32,
}

/// A compiled policy: violation rules plus helper predicates.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub rules: Vec<Rule>,
    pub funcs: Vec<Func>,
}

/// `violation { ... }`
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `func name(a, b) { ... }`: true when any branch of the body holds.
#[derive(Clone, Debug, PartialEq)]
pub struct Func {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// `some v in xs` / `some k, v in xs`
    Some {
        key: Option<String>,
        value: String,
        source: Expr,
        span: Span,
    },
    /// `name := expr`
    Assign { name: String, value: Expr, span: Span },
    /// `not expr`
    Not(Expr),
    /// `expr`
    Test(Expr),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CallTarget {
    /// As written; resolved by the checker.
    Named(String),
    Builtin(Builtin),
    /// Index into `Program::funcs`.
    Helper(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    Input,
    Parameters,
    Var(String, Span),
    Array(Vec<Expr>),
    Object(Vec<(Expr, Expr)>),
    Field(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call {
        target: CallTarget,
        args: Vec<Expr>,
        span: Span,
    },
}

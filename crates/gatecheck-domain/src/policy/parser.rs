use super::ast::{BinOp, CallTarget, Expr, Func, Program, Rule, Span, Stmt, UnaryOp};
use super::lexer::{Tok, Token, tokenize};
use crate::error::CompileError;
use serde_json::Value;

/// Parse policy source into an unchecked program.
pub fn parse(src: &str) -> Result<Program, CompileError> {
    let tokens = tokenize(src)?;
    Parser {
        tokens,
        pos: 0,
        depth: 0,
    }
    .program()
}

/// Deepest expression nesting accepted. Parsing, checking and evaluation all
/// recurse over the tree, so the bound keeps them within a thread's stack.
pub(crate) const MAX_NESTING: u32 = 32;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: u32,
}

type PResult<T> = Result<T, CompileError>;

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].tok
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].tok
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&self, message: impl Into<String>) -> CompileError {
        let span = self.span();
        CompileError::Policy {
            line: span.line,
            col: span.col,
            message: message.into(),
        }
    }

    fn expect(&mut self, tok: Tok) -> PResult<Span> {
        if *self.peek() == tok {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(format!(
                "expected {}, found {}",
                tok.describe(),
                self.peek().describe()
            )))
        }
    }

    fn ident(&mut self, what: &str) -> PResult<(String, Span)> {
        match self.peek().clone() {
            Tok::Ident(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            other => Err(self.error_here(format!("expected {what}, found {}", other.describe()))),
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Tok::Newline | Tok::Semi) {
            self.advance();
        }
    }

    fn program(mut self) -> PResult<Program> {
        let mut rules = Vec::new();
        let mut funcs = Vec::new();

        self.skip_newlines();
        if self.eat(&Tok::Package) {
            self.ident("package name")?;
            while self.eat(&Tok::Dot) {
                self.ident("package name")?;
            }
            self.end_of_item()?;
        }

        loop {
            self.skip_newlines();
            match self.peek() {
                Tok::Eof => break,
                Tok::Violation => {
                    let span = self.advance().span;
                    let body = self.body()?;
                    rules.push(Rule { body, span });
                }
                Tok::Func => {
                    let span = self.advance().span;
                    let (name, _) = self.ident("function name")?;
                    self.expect(Tok::LParen)?;
                    let mut params = Vec::new();
                    if !self.eat(&Tok::RParen) {
                        loop {
                            params.push(self.ident("parameter name")?.0);
                            if self.eat(&Tok::RParen) {
                                break;
                            }
                            self.expect(Tok::Comma)?;
                        }
                    }
                    let body = self.body()?;
                    funcs.push(Func {
                        name,
                        params,
                        body,
                        span,
                    });
                }
                other => {
                    return Err(self.error_here(format!(
                        "expected 'violation' or 'func', found {}",
                        other.describe()
                    )));
                }
            }
            self.end_of_item()?;
        }

        Ok(Program { rules, funcs })
    }

    fn end_of_item(&mut self) -> PResult<()> {
        match self.peek() {
            Tok::Newline | Tok::Semi | Tok::Eof => Ok(()),
            other => Err(self.error_here(format!(
                "expected end of line, found {}",
                other.describe()
            ))),
        }
    }

    fn body(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(Tok::LBrace)?;
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&Tok::RBrace) {
                break;
            }
            stmts.push(self.stmt()?);
            match self.peek() {
                Tok::Newline | Tok::Semi => {}
                Tok::RBrace => {}
                other => {
                    return Err(self.error_here(format!(
                        "expected end of statement, found {}",
                        other.describe()
                    )));
                }
            }
        }
        if stmts.is_empty() {
            return Err(self.error_here("rule body must not be empty"));
        }
        Ok(stmts)
    }

    fn stmt(&mut self) -> PResult<Stmt> {
        match self.peek().clone() {
            Tok::Some => {
                let span = self.advance().span;
                let (first, _) = self.ident("variable name")?;
                let (key, value) = if self.eat(&Tok::Comma) {
                    let (second, _) = self.ident("variable name")?;
                    (Some(first), second)
                } else {
                    (None, first)
                };
                self.expect(Tok::In)?;
                let source = self.expr()?;
                Ok(Stmt::Some {
                    key,
                    value,
                    source,
                    span,
                })
            }
            Tok::Not => {
                self.advance();
                Ok(Stmt::Not(self.expr()?))
            }
            Tok::Ident(name) if *self.peek_at(1) == Tok::Assign => {
                let span = self.advance().span;
                self.advance();
                let value = self.expr()?;
                Ok(Stmt::Assign { name, value, span })
            }
            _ => Ok(Stmt::Test(self.expr()?)),
        }
    }

    fn expr(&mut self) -> PResult<Expr> {
        self.nested(Self::comparison)
    }

    fn nested(&mut self, parse: fn(&mut Self) -> PResult<Expr>) -> PResult<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(format!(
                "expression nested too deeply (limit {MAX_NESTING})"
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Tok::Eq => BinOp::Eq,
            Tok::Ne => BinOp::Ne,
            Tok::Lt => BinOp::Lt,
            Tok::Le => BinOp::Le,
            Tok::Gt => BinOp::Gt,
            Tok::Ge => BinOp::Ge,
            Tok::In => BinOp::In,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.additive()?;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn additive(&mut self) -> PResult<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn multiplicative(&mut self) -> PResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::Percent => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.eat(&Tok::Minus) {
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Tok::Dot => {
                    self.advance();
                    let (field, _) = self.ident("field name")?;
                    expr = Expr::Field(Box::new(expr), field);
                }
                Tok::LBracket => {
                    self.advance();
                    let index = self.expr()?;
                    self.expect(Tok::RBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> PResult<Expr> {
        let span = self.span();
        match self.peek().clone() {
            Tok::Num(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Number(n)))
            }
            Tok::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            Tok::True => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(true)))
            }
            Tok::False => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(false)))
            }
            Tok::Null => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            Tok::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            Tok::LBracket => {
                self.advance();
                let items = self.list(Tok::RBracket)?;
                Ok(Expr::Array(items))
            }
            Tok::LBrace => {
                self.advance();
                self.object()
            }
            Tok::Ident(name) => {
                self.advance();
                if *self.peek() == Tok::LParen {
                    self.advance();
                    let args = self.list(Tok::RParen)?;
                    return Ok(Expr::Call {
                        target: CallTarget::Named(name),
                        args,
                        span,
                    });
                }
                Ok(match name.as_str() {
                    "input" => Expr::Input,
                    "parameters" => Expr::Parameters,
                    _ => Expr::Var(name, span),
                })
            }
            other => Err(self.error_here(format!(
                "expected an expression, found {}",
                other.describe()
            ))),
        }
    }

    /// Comma separated expressions up to `close` (trailing comma allowed).
    fn list(&mut self, close: Tok) -> PResult<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&close) {
                return Ok(items);
            }
            items.push(self.expr()?);
            self.skip_newlines();
            if self.eat(&close) {
                return Ok(items);
            }
            self.expect(Tok::Comma)?;
        }
    }

    fn object(&mut self) -> PResult<Expr> {
        let mut entries = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&Tok::RBrace) {
                return Ok(Expr::Object(entries));
            }
            let key = self.expr()?;
            self.expect(Tok::Colon)?;
            self.skip_newlines();
            let value = self.expr()?;
            entries.push((key, value));
            self.skip_newlines();
            if self.eat(&Tok::RBrace) {
                return Ok(Expr::Object(entries));
            }
            self.expect(Tok::Comma)?;
        }
    }
}

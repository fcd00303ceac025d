//! Static checks run once at compile time: call resolution, arity, variable
//! scoping, the `msg` requirement and helper recursion.

use super::ast::{CallTarget, Expr, Program, Span, Stmt};
use super::builtins::Builtin;
use crate::error::CompileError;
use std::collections::{BTreeMap, HashSet};

const RESERVED: &[&str] = &["input", "parameters"];

fn error(span: Span, message: impl Into<String>) -> CompileError {
    CompileError::Policy {
        line: span.line,
        col: span.col,
        message: message.into(),
    }
}

/// Validate `program` and resolve every call to a builtin or helper.
pub fn check(program: &mut Program) -> Result<(), CompileError> {
    if program.rules.is_empty() {
        return Err(error(
            Span { line: 1, col: 1 },
            "policy defines no violation rule",
        ));
    }

    let mut helpers: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for (idx, func) in program.funcs.iter().enumerate() {
        if Builtin::from_name(&func.name).is_some() {
            return Err(error(
                func.span,
                format!("helper '{}' shadows a builtin", func.name),
            ));
        }
        if RESERVED.contains(&func.name.as_str()) {
            return Err(error(
                func.span,
                format!("'{}' cannot be used as a helper name", func.name),
            ));
        }
        if helpers
            .insert(func.name.clone(), (idx, func.params.len()))
            .is_some()
        {
            return Err(error(
                func.span,
                format!("helper '{}' is defined more than once", func.name),
            ));
        }
    }

    let mut calls: Vec<Vec<usize>> = vec![Vec::new(); program.funcs.len()];
    for (idx, func) in program.funcs.iter_mut().enumerate() {
        let mut scope = Scope::default();
        for param in &func.params {
            scope.bind(param, func.span)?;
        }
        let mut resolver = Resolver {
            helpers: &helpers,
            called: &mut calls[idx],
        };
        resolver.body(&mut func.body, &mut scope)?;
    }

    for rule in &mut program.rules {
        let mut scope = Scope::default();
        let mut ignored = Vec::new();
        let mut resolver = Resolver {
            helpers: &helpers,
            called: &mut ignored,
        };
        resolver.body(&mut rule.body, &mut scope)?;
        if !scope.is_bound("msg") {
            return Err(error(rule.span, "violation rule must bind 'msg'"));
        }
    }

    if let Some(idx) = find_cycle(&calls) {
        let func = &program.funcs[idx];
        return Err(error(
            func.span,
            format!("helper '{}' is recursive", func.name),
        ));
    }

    Ok(())
}

#[derive(Default)]
struct Scope {
    bound: HashSet<String>,
}

impl Scope {
    fn is_bound(&self, name: &str) -> bool {
        self.bound.contains(name)
    }

    fn bind(&mut self, name: &str, span: Span) -> Result<(), CompileError> {
        if name == "_" {
            return Ok(());
        }
        if RESERVED.contains(&name) {
            return Err(error(span, format!("cannot assign to '{name}'")));
        }
        if !self.bound.insert(name.to_string()) {
            return Err(error(span, format!("variable '{name}' is already bound")));
        }
        Ok(())
    }
}

struct Resolver<'h> {
    helpers: &'h BTreeMap<String, (usize, usize)>,
    called: &'h mut Vec<usize>,
}

impl Resolver<'_> {
    fn body(&mut self, stmts: &mut [Stmt], scope: &mut Scope) -> Result<(), CompileError> {
        for stmt in stmts {
            match stmt {
                Stmt::Some {
                    key,
                    value,
                    source,
                    span,
                } => {
                    self.expr(source, scope)?;
                    if let Some(key) = key {
                        scope.bind(key, *span)?;
                    }
                    scope.bind(value, *span)?;
                }
                Stmt::Assign { name, value, span } => {
                    self.expr(value, scope)?;
                    scope.bind(name, *span)?;
                }
                Stmt::Not(expr) | Stmt::Test(expr) => self.expr(expr, scope)?,
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &mut Expr, scope: &Scope) -> Result<(), CompileError> {
        match expr {
            Expr::Literal(_) | Expr::Input | Expr::Parameters => Ok(()),
            Expr::Var(name, span) => {
                if scope.is_bound(name) {
                    Ok(())
                } else {
                    Err(error(*span, format!("unbound variable '{name}'")))
                }
            }
            Expr::Array(items) => {
                for item in items {
                    self.expr(item, scope)?;
                }
                Ok(())
            }
            Expr::Object(entries) => {
                for (k, v) in entries {
                    self.expr(k, scope)?;
                    self.expr(v, scope)?;
                }
                Ok(())
            }
            Expr::Field(base, _) | Expr::Unary(_, base) => self.expr(base, scope),
            Expr::Index(base, index) | Expr::Binary(_, base, index) => {
                self.expr(base, scope)?;
                self.expr(index, scope)
            }
            Expr::Call { target, args, span } => {
                for arg in args.iter_mut() {
                    self.expr(arg, scope)?;
                }
                let CallTarget::Named(name) = target else {
                    return Ok(());
                };
                let resolved = if let Some(builtin) = Builtin::from_name(name) {
                    let (min, max) = builtin.arity();
                    if args.len() < min || args.len() > max {
                        let expected = if min == max {
                            min.to_string()
                        } else {
                            format!("{min} to {max}")
                        };
                        return Err(error(
                            *span,
                            format!(
                                "{name}() takes {expected} argument(s), {} given",
                                args.len()
                            ),
                        ));
                    }
                    CallTarget::Builtin(builtin)
                } else if let Some(&(idx, arity)) = self.helpers.get(name.as_str()) {
                    if args.len() != arity {
                        return Err(error(
                            *span,
                            format!(
                                "{name}() takes {arity} argument(s), {} given",
                                args.len()
                            ),
                        ));
                    }
                    self.called.push(idx);
                    CallTarget::Helper(idx)
                } else {
                    return Err(error(*span, format!("unknown function '{name}'")));
                };
                *target = resolved;
                Ok(())
            }
        }
    }
}

/// Index of a helper that sits on a call cycle, if any.
fn find_cycle(calls: &[Vec<usize>]) -> Option<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    fn visit(node: usize, calls: &[Vec<usize>], marks: &mut [Mark]) -> Option<usize> {
        marks[node] = Mark::Active;
        for &next in &calls[node] {
            match marks[next] {
                Mark::Active => return Some(next),
                Mark::New => {
                    if let Some(found) = visit(next, calls, marks) {
                        return Some(found);
                    }
                }
                Mark::Done => {}
            }
        }
        marks[node] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::New; calls.len()];
    (0..calls.len()).find_map(|node| {
        if marks[node] == Mark::New {
            visit(node, calls, &mut marks)
        } else {
            None
        }
    })
}

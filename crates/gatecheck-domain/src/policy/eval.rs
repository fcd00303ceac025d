use super::ast::{BinOp, CallTarget, Expr, Program, Stmt, UnaryOp};
use super::builtins::{RegexCache, display, number, values_equal};
use crate::error::EvalError;
use crate::model::Violation;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Default number of evaluation steps allowed per evaluation.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Fuel: one step per statement and per expression node visited.
    pub max_steps: u64,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

type Env<'a> = Vec<(&'a str, Cow<'a, Value>)>;

pub(super) fn run(
    program: &Program,
    input: &Value,
    parameters: &Value,
    options: &EvalOptions,
) -> Result<Vec<Violation>, EvalError> {
    let mut machine = Machine {
        program,
        input,
        parameters,
        steps: 0,
        limit: options.max_steps,
        regexes: RegexCache::default(),
    };

    let mut out: Vec<Violation> = Vec::new();
    for rule in &program.rules {
        let mut env = Env::new();
        machine.run_body(&rule.body, &mut env, &mut |env: &Env<'_>| {
            let violation = violation_from(env);
            if !out.contains(&violation) {
                out.push(violation);
            }
            true
        })?;
    }
    Ok(out)
}

fn lookup<'e, 'a>(env: &'e Env<'a>, name: &str) -> Option<&'e Value> {
    env.iter()
        .rev()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.as_ref())
}

fn violation_from(env: &Env<'_>) -> Violation {
    let message = lookup(env, "msg").map(display).unwrap_or_default();
    let path = match lookup(env, "path") {
        Some(Value::String(p)) => Some(p.clone()),
        Some(Value::Array(segments)) => Some(
            segments
                .iter()
                .map(display)
                .collect::<Vec<_>>()
                .join("."),
        ),
        _ => None,
    };
    let details = lookup(env, "details").cloned().unwrap_or(Value::Null);
    Violation {
        message,
        path,
        details,
    }
}

struct Machine<'a> {
    program: &'a Program,
    input: &'a Value,
    parameters: &'a Value,
    steps: u64,
    limit: u64,
    regexes: RegexCache,
}

impl<'a> Machine<'a> {
    fn tick(&mut self) -> Result<(), EvalError> {
        self.steps += 1;
        if self.steps > self.limit {
            return Err(EvalError::BudgetExceeded { limit: self.limit });
        }
        Ok(())
    }

    /// Backtracking evaluation of a conjunctive body. `sink` is called once
    /// per satisfying assignment and returns `false` to stop the search.
    /// Returns `false` if the search was stopped.
    fn run_body(
        &mut self,
        stmts: &'a [Stmt],
        env: &mut Env<'a>,
        sink: &mut dyn FnMut(&Env<'a>) -> bool,
    ) -> Result<bool, EvalError> {
        let Some((stmt, rest)) = stmts.split_first() else {
            return Ok(sink(env));
        };
        self.tick()?;

        match stmt {
            Stmt::Some {
                key, value, source, ..
            } => {
                let Some(collection) = self.eval(source, env)? else {
                    return Ok(true);
                };
                for (k, v) in entries(collection) {
                    let pushed = bind(env, key.as_deref(), Cow::Owned(k))
                        + bind(env, Some(value.as_str()), v);
                    let keep_going = self.run_body(rest, env, sink)?;
                    env.truncate(env.len() - pushed);
                    if !keep_going {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Stmt::Assign { name, value, .. } => {
                let Some(v) = self.eval(value, env)? else {
                    return Ok(true);
                };
                let pushed = bind(env, Some(name.as_str()), v);
                let keep_going = self.run_body(rest, env, sink)?;
                env.truncate(env.len() - pushed);
                Ok(keep_going)
            }
            Stmt::Test(expr) => {
                if holds(self.eval(expr, env)?.as_deref()) {
                    self.run_body(rest, env, sink)
                } else {
                    Ok(true)
                }
            }
            Stmt::Not(expr) => {
                if holds(self.eval(expr, env)?.as_deref()) {
                    Ok(true)
                } else {
                    self.run_body(rest, env, sink)
                }
            }
        }
    }

    fn eval(&mut self, expr: &'a Expr, env: &Env<'a>) -> Result<Option<Cow<'a, Value>>, EvalError> {
        self.tick()?;
        let value = match expr {
            Expr::Literal(v) => Some(Cow::Borrowed(v)),
            Expr::Input => Some(Cow::Borrowed(self.input)),
            Expr::Parameters => Some(Cow::Borrowed(self.parameters)),
            Expr::Var(name, _) => env
                .iter()
                .rev()
                .find(|(n, _)| *n == name.as_str())
                .map(|(_, v)| match v {
                    Cow::Borrowed(b) => Cow::Borrowed(*b),
                    Cow::Owned(o) => Cow::Owned(o.clone()),
                }),
            Expr::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let Some(v) = self.eval(item, env)? else {
                        return Ok(None);
                    };
                    out.push(v.into_owned());
                }
                Some(Cow::Owned(Value::Array(out)))
            }
            Expr::Object(pairs) => {
                let mut out = Map::new();
                for (k, v) in pairs {
                    let Some(key) = self.eval(k, env)? else {
                        return Ok(None);
                    };
                    let Value::String(key) = key.into_owned() else {
                        return Ok(None);
                    };
                    let Some(v) = self.eval(v, env)? else {
                        return Ok(None);
                    };
                    out.insert(key, v.into_owned());
                }
                Some(Cow::Owned(Value::Object(out)))
            }
            Expr::Field(base, name) => match self.eval(base, env)? {
                Some(base) => field(base, name),
                None => None,
            },
            Expr::Index(base, index) => {
                let Some(base) = self.eval(base, env)? else {
                    return Ok(None);
                };
                let Some(index) = self.eval(index, env)? else {
                    return Ok(None);
                };
                match &*index {
                    Value::String(key) => field(base, key),
                    Value::Number(n) => n
                        .as_u64()
                        .and_then(|i| usize::try_from(i).ok())
                        .and_then(|i| element(base, i)),
                    _ => None,
                }
            }
            Expr::Unary(UnaryOp::Neg, operand) => self
                .eval(operand, env)?
                .and_then(|v| v.as_f64())
                .and_then(|n| number(-n))
                .map(Cow::Owned),
            Expr::Binary(op, lhs, rhs) => {
                let Some(l) = self.eval(lhs, env)? else {
                    return Ok(None);
                };
                let Some(r) = self.eval(rhs, env)? else {
                    return Ok(None);
                };
                binary(*op, &l, &r).map(Cow::Owned)
            }
            Expr::Call { target, args, .. } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    let Some(v) = self.eval(arg, env)? else {
                        return Ok(None);
                    };
                    values.push(v);
                }
                match target {
                    CallTarget::Builtin(builtin) => {
                        let owned: Vec<Value> = values.into_iter().map(Cow::into_owned).collect();
                        builtin.call(&owned, &mut self.regexes).map(Cow::Owned)
                    }
                    CallTarget::Helper(idx) => self.call_helper(*idx, values)?,
                    // The checker resolves every call before evaluation.
                    CallTarget::Named(_) => None,
                }
            }
        };
        Ok(value)
    }

    fn call_helper(
        &mut self,
        idx: usize,
        args: Vec<Cow<'a, Value>>,
    ) -> Result<Option<Cow<'a, Value>>, EvalError> {
        let program = self.program;
        let Some(func) = program.funcs.get(idx) else {
            return Ok(None);
        };
        let mut env: Env<'a> = func.params.iter().map(String::as_str).zip(args).collect();
        let mut held = false;
        self.run_body(&func.body, &mut env, &mut |_: &Env<'a>| {
            held = true;
            false
        })?;
        Ok(held.then_some(Cow::Owned(Value::Bool(true))))
    }
}

/// Push a binding unless the name is absent or the `_` throwaway.
fn bind<'a>(env: &mut Env<'a>, name: Option<&'a str>, value: Cow<'a, Value>) -> usize {
    match name {
        Some(name) if name != "_" => {
            env.push((name, value));
            1
        }
        _ => 0,
    }
}

fn holds(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Bool(false)))
}

/// `(key, value)` pairs of a collection: arrays by index, objects by key.
fn entries(collection: Cow<'_, Value>) -> Vec<(Value, Cow<'_, Value>)> {
    match collection {
        Cow::Borrowed(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::from(i), Cow::Borrowed(v)))
            .collect(),
        Cow::Borrowed(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (Value::String(k.clone()), Cow::Borrowed(v)))
            .collect(),
        Cow::Owned(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Value::from(i), Cow::Owned(v)))
            .collect(),
        Cow::Owned(Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| (Value::String(k), Cow::Owned(v)))
            .collect(),
        _ => Vec::new(),
    }
}

fn field<'a>(base: Cow<'a, Value>, name: &str) -> Option<Cow<'a, Value>> {
    match base {
        Cow::Borrowed(v) => v.get(name).map(Cow::Borrowed),
        Cow::Owned(Value::Object(mut map)) => map.remove(name).map(Cow::Owned),
        Cow::Owned(_) => None,
    }
}

fn element(base: Cow<'_, Value>, index: usize) -> Option<Cow<'_, Value>> {
    match base {
        Cow::Borrowed(Value::Array(items)) => items.get(index).map(Cow::Borrowed),
        Cow::Owned(Value::Array(mut items)) if index < items.len() => {
            Some(Cow::Owned(items.swap_remove(index)))
        }
        _ => None,
    }
}

fn binary(op: BinOp, l: &Value, r: &Value) -> Option<Value> {
    let ordering = || match (l, r) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    let nums = || Some((l.as_f64()?, r.as_f64()?));

    match op {
        BinOp::Eq => Some(Value::Bool(values_equal(l, r))),
        BinOp::Ne => Some(Value::Bool(!values_equal(l, r))),
        BinOp::Lt => Some(Value::Bool(ordering()? == Ordering::Less)),
        BinOp::Le => Some(Value::Bool(ordering()? != Ordering::Greater)),
        BinOp::Gt => Some(Value::Bool(ordering()? == Ordering::Greater)),
        BinOp::Ge => Some(Value::Bool(ordering()? != Ordering::Less)),
        BinOp::In => match r {
            Value::Array(items) => Some(Value::Bool(items.iter().any(|i| values_equal(l, i)))),
            Value::Object(map) => Some(Value::Bool(map.values().any(|v| values_equal(l, v)))),
            _ => None,
        },
        BinOp::Add => nums().and_then(|(a, b)| number(a + b)),
        BinOp::Sub => nums().and_then(|(a, b)| number(a - b)),
        BinOp::Mul => nums().and_then(|(a, b)| number(a * b)),
        BinOp::Div => nums()
            .filter(|(_, b)| *b != 0.0)
            .and_then(|(a, b)| number(a / b)),
        BinOp::Rem => nums()
            .filter(|(_, b)| *b != 0.0)
            .and_then(|(a, b)| number(a % b)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::compile;
    use super::*;
    use serde_json::json;

    fn eval_src(src: &str, object: Value, parameters: Value) -> Vec<Violation> {
        let policy = compile(src).expect("compiles");
        let input = json!({ "review": { "object": object }, "parameters": parameters });
        policy
            .evaluate(&input, &parameters, &EvalOptions::default())
            .expect("evaluates")
    }

    fn messages(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.message.as_str()).collect()
    }

    const REQUIRED_LABELS: &str = r#"
violation {
  some label in parameters.labels
  not input.review.object.metadata.labels[label]
  msg := sprintf("missing required label: %v", [label])
}
"#;

    #[test]
    fn every_branch_emits_a_violation() {
        let out = eval_src(
            REQUIRED_LABELS,
            json!({ "metadata": { "labels": { "app": "web" } } }),
            json!({ "labels": ["owner", "app", "team"] }),
        );
        assert_eq!(
            messages(&out),
            vec!["missing required label: owner", "missing required label: team"]
        );
    }

    #[test]
    fn missing_fields_are_undefined_not_errors() {
        let out = eval_src(
            REQUIRED_LABELS,
            json!({ "kind": "Pod" }),
            json!({ "labels": ["owner"] }),
        );
        assert_eq!(messages(&out), vec!["missing required label: owner"]);

        let out = eval_src(
            "violation { input.review.object.spec.replicas > 3; msg := \"too many\" }",
            json!({ "spec": "not-an-object" }),
            json!({}),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn duplicate_violations_collapse() {
        let out = eval_src(
            "violation { some _ in [1, 2, 3]; msg := \"same\" }",
            json!({}),
            json!({}),
        );
        assert_eq!(messages(&out), vec!["same"]);
    }

    #[test]
    fn key_value_iteration_paths_and_details() {
        let out = eval_src(
            r#"
violation {
  some i, c in input.review.object.spec.containers
  not c.resources.limits.memory
  path := ["spec", "containers", i, "resources"]
  details := {"container": c.name}
  msg := sprintf("container %v has no memory limit", [c.name])
}
"#,
            json!({ "spec": { "containers": [
                { "name": "a", "resources": { "limits": { "memory": "1Gi" } } },
                { "name": "b" }
            ] } }),
            json!({}),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "container b has no memory limit");
        assert_eq!(out[0].path.as_deref(), Some("spec.containers.1.resources"));
        assert_eq!(out[0].details, json!({ "container": "b" }));
    }

    #[test]
    fn helpers_are_predicates() {
        let src = r#"
violation {
  some c in input.review.object.containers
  not allowed(c.image, parameters.repos)
  msg := sprintf("image %v not allowed", [c.image])
}

func allowed(image, repos) {
  some repo in repos
  startswith(image, repo)
}
"#;
        let out = eval_src(
            src,
            json!({ "containers": [{ "image": "gcr.io/x" }, { "image": "docker.io/y" }] }),
            json!({ "repos": ["gcr.io/"] }),
        );
        assert_eq!(messages(&out), vec!["image docker.io/y not allowed"]);
    }

    #[test]
    fn arithmetic_and_comparison() {
        let out = eval_src(
            r#"
violation {
  n := input.review.object.replicas
  n * 2 + 1 >= 7
  n % 2 == 1
  -n < 0
  not n / 0
  "b" > "a"
  "x" in {"k": "x"}
  msg := sprintf("%d", [n])
}
"#,
            json!({ "replicas": 3 }),
            json!({}),
        );
        assert_eq!(messages(&out), vec!["3"]);
    }

    #[test]
    fn budget_is_enforced() {
        let policy = compile(
            "violation { some a in input.xs; some b in input.xs; some c in input.xs; a + b + c < 0; msg := \"m\" }",
        )
        .expect("compiles");
        let xs: Vec<i64> = (0..100).collect();
        let input = json!({ "xs": xs });
        let err = policy
            .evaluate(&input, &json!({}), &EvalOptions { max_steps: 10_000 })
            .unwrap_err();
        assert_eq!(err, EvalError::BudgetExceeded { limit: 10_000 });
    }
}

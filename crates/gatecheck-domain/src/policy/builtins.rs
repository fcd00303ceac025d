use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Built-in functions available to policies.
///
/// Builtins are total: bad argument types produce `None` (undefined)
/// instead of an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Count,
    Sprintf,
    Concat,
    Contains,
    StartsWith,
    EndsWith,
    Lower,
    Upper,
    Trim,
    Split,
    Replace,
    ReMatch,
    ObjectGet,
    Keys,
    Union,
    Intersection,
    Difference,
    ToNumber,
    IsString,
    IsNumber,
    IsBoolean,
    IsArray,
    IsObject,
    IsNull,
    Any,
    All,
}

const ALL: &[(&str, Builtin)] = &[
    ("count", Builtin::Count),
    ("sprintf", Builtin::Sprintf),
    ("concat", Builtin::Concat),
    ("contains", Builtin::Contains),
    ("startswith", Builtin::StartsWith),
    ("endswith", Builtin::EndsWith),
    ("lower", Builtin::Lower),
    ("upper", Builtin::Upper),
    ("trim", Builtin::Trim),
    ("split", Builtin::Split),
    ("replace", Builtin::Replace),
    ("re_match", Builtin::ReMatch),
    ("object_get", Builtin::ObjectGet),
    ("keys", Builtin::Keys),
    ("union", Builtin::Union),
    ("intersection", Builtin::Intersection),
    ("difference", Builtin::Difference),
    ("to_number", Builtin::ToNumber),
    ("is_string", Builtin::IsString),
    ("is_number", Builtin::IsNumber),
    ("is_boolean", Builtin::IsBoolean),
    ("is_array", Builtin::IsArray),
    ("is_object", Builtin::IsObject),
    ("is_null", Builtin::IsNull),
    ("any", Builtin::Any),
    ("all", Builtin::All),
];

pub(super) fn names() -> impl Iterator<Item = &'static str> {
    ALL.iter().map(|(name, _)| *name)
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().find(|(n, _)| *n == name).map(|(_, b)| *b)
    }

    pub fn name(self) -> &'static str {
        ALL.iter()
            .find(|(_, b)| *b == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }

    /// Accepted argument counts as `(min, max)`.
    pub fn arity(self) -> (usize, usize) {
        use Builtin::*;
        match self {
            Count | Lower | Upper | Keys | ToNumber | IsString | IsNumber | IsBoolean
            | IsArray | IsObject | IsNull | Any | All => (1, 1),
            Sprintf | Concat | Contains | StartsWith | EndsWith | Split | ReMatch | Union
            | Intersection | Difference => (2, 2),
            Trim => (1, 2),
            Replace | ObjectGet => (3, 3),
        }
    }

    pub fn call(self, args: &[Value], regexes: &mut RegexCache) -> Option<Value> {
        use Builtin::*;
        let s = |i: usize| args.get(i).and_then(Value::as_str);
        let arr = |i: usize| args.get(i).and_then(Value::as_array);

        match self {
            Count => match &args[0] {
                Value::Array(items) => Some(Value::from(items.len())),
                Value::Object(map) => Some(Value::from(map.len())),
                Value::String(text) => Some(Value::from(text.chars().count())),
                _ => None,
            },
            Sprintf => sprintf(s(0)?, arr(1)?).map(Value::String),
            Concat => {
                let parts = arr(1)?
                    .iter()
                    .map(Value::as_str)
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::String(parts.join(s(0)?)))
            }
            Contains => Some(Value::Bool(s(0)?.contains(s(1)?))),
            StartsWith => Some(Value::Bool(s(0)?.starts_with(s(1)?))),
            EndsWith => Some(Value::Bool(s(0)?.ends_with(s(1)?))),
            Lower => Some(Value::String(s(0)?.to_lowercase())),
            Upper => Some(Value::String(s(0)?.to_uppercase())),
            Trim => {
                let text = s(0)?;
                let trimmed = match args.get(1) {
                    None => text.trim(),
                    Some(cutset) => {
                        let cutset = cutset.as_str()?;
                        text.trim_matches(|c| cutset.contains(c))
                    }
                };
                Some(Value::String(trimmed.to_string()))
            }
            Split => Some(Value::Array(
                s(0)?
                    .split(s(1)?)
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            Replace => Some(Value::String(s(0)?.replace(s(1)?, s(2)?))),
            ReMatch => {
                let re = regexes.get(s(0)?)?;
                Some(Value::Bool(re.is_match(s(1)?)))
            }
            ObjectGet => object_get(&args[0], &args[1], &args[2]),
            Keys => {
                let mut keys: Vec<&String> = args[0].as_object()?.keys().collect();
                keys.sort();
                Some(Value::Array(
                    keys.into_iter().map(|k| Value::String(k.clone())).collect(),
                ))
            }
            Union => {
                let mut out = dedup(arr(0)?);
                for item in arr(1)? {
                    if !out.iter().any(|seen| values_equal(seen, item)) {
                        out.push(item.clone());
                    }
                }
                Some(Value::Array(out))
            }
            Intersection => {
                let other = arr(1)?;
                let out = dedup(arr(0)?)
                    .into_iter()
                    .filter(|item| other.iter().any(|o| values_equal(o, item)))
                    .collect();
                Some(Value::Array(out))
            }
            Difference => {
                let other = arr(1)?;
                let out = dedup(arr(0)?)
                    .into_iter()
                    .filter(|item| !other.iter().any(|o| values_equal(o, item)))
                    .collect();
                Some(Value::Array(out))
            }
            ToNumber => match &args[0] {
                Value::Number(_) => Some(args[0].clone()),
                Value::String(text) => text.trim().parse::<f64>().ok().and_then(number),
                _ => None,
            },
            IsString => Some(Value::Bool(args[0].is_string())),
            IsNumber => Some(Value::Bool(args[0].is_number())),
            IsBoolean => Some(Value::Bool(args[0].is_boolean())),
            IsArray => Some(Value::Bool(args[0].is_array())),
            IsObject => Some(Value::Bool(args[0].is_object())),
            IsNull => Some(Value::Bool(args[0].is_null())),
            Any => Some(Value::Bool(
                arr(0)?.iter().any(|v| *v == Value::Bool(true)),
            )),
            All => Some(Value::Bool(
                arr(0)?.iter().all(|v| *v == Value::Bool(true)),
            )),
        }
    }
}

/// Compiled patterns for `re_match`, keyed by source. Invalid patterns are
/// cached as `None` so they are only compiled once.
#[derive(Debug, Default)]
pub struct RegexCache {
    compiled: HashMap<String, Option<Regex>>,
}

impl RegexCache {
    fn get(&mut self, pattern: &str) -> Option<&Regex> {
        if !self.compiled.contains_key(pattern) {
            self.compiled
                .insert(pattern.to_string(), Regex::new(pattern).ok());
        }
        self.compiled.get(pattern).and_then(Option::as_ref)
    }
}

/// Wrap an `f64`, preferring an integer representation when exact.
pub(crate) fn number(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        return Some(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n).map(Value::Number)
}

/// Structural equality with numbers compared by value (`1 == 1.0`).
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn dedup(items: &[Value]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !out.iter().any(|seen| values_equal(seen, item)) {
            out.push(item.clone());
        }
    }
    out
}

fn object_get(object: &Value, key: &Value, default: &Value) -> Option<Value> {
    let map: &Map<String, Value> = object.as_object()?;
    let found = match key {
        Value::String(k) => map.get(k),
        Value::Array(path) => {
            let mut cur = object;
            for segment in path {
                cur = match (cur, segment) {
                    (Value::Object(m), Value::String(k)) => match m.get(k) {
                        Some(next) => next,
                        None => return Some(default.clone()),
                    },
                    _ => return Some(default.clone()),
                };
            }
            Some(cur)
        }
        _ => return None,
    };
    Some(found.cloned().unwrap_or_else(|| default.clone()))
}

/// Render a value the way `%v` shows it: strings bare, everything else as JSON.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `%v`, `%s`, `%d` and `%%`. Too few arguments or an unknown verb is undefined.
fn sprintf(format: &str, args: &[Value]) -> Option<String> {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '%' => out.push('%'),
            'v' | 's' => out.push_str(&display(args.next()?)),
            'd' => {
                let n = args.next()?.as_f64()?;
                out.push_str(&format!("{}", n.trunc() as i64));
            }
            _ => return None,
        }
    }
    Some(out)
}

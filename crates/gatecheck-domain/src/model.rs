use serde_json::{Map, Value, json};

/// An object under test. Read-only input to matching and evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
    pub api_group: String,
    pub version: String,
    pub kind: String,
    /// `None` for cluster-scoped objects.
    pub namespace: Option<String>,
    pub name: Option<String>,
    /// The complete object body.
    pub object: Value,
}

impl Resource {
    /// Build a resource from a plain object.
    ///
    /// - group: `apiGroup`, else the part of `apiVersion` before `/` (`v1` is the core group `""`)
    /// - namespace: `namespace`, else `metadata.namespace`; empty means cluster-scoped
    pub fn from_object(object: Value) -> Self {
        let str_at = |ptr: &str| object.pointer(ptr).and_then(Value::as_str);

        let api_version = str_at("/apiVersion").unwrap_or("");
        let (group_from_version, version) = match api_version.split_once('/') {
            Some((g, v)) => (g, v),
            None => ("", api_version),
        };
        let api_group = str_at("/apiGroup").unwrap_or(group_from_version).to_string();

        let namespace = str_at("/namespace")
            .or_else(|| str_at("/metadata/namespace"))
            .filter(|ns| !ns.is_empty())
            .map(str::to_string);

        Self {
            api_group,
            version: version.to_string(),
            kind: str_at("/kind").unwrap_or("").to_string(),
            namespace,
            name: str_at("/metadata/name").map(str::to_string),
            object,
        }
    }

    /// The admission review envelope the policy sees under `input.review`.
    pub fn review(&self) -> Value {
        json!({
            "kind": {
                "group": self.api_group,
                "version": self.version,
                "kind": self.kind,
            },
            "name": self.name.clone().map(Value::String).unwrap_or(Value::Null),
            "namespace": self.namespace.clone().map(Value::String).unwrap_or(Value::Null),
            "operation": "CREATE",
            "object": self.object,
        })
    }
}

/// One `{apiGroup, kind}` entry in a constraint's match list. `*` matches anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindSelector {
    pub api_group: String,
    pub kind: String,
}

impl KindSelector {
    pub fn new(api_group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_group: api_group.into(),
            kind: kind.into(),
        }
    }
}

/// Scope filter of a constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchRule {
    /// Empty means every kind.
    pub kinds: Vec<KindSelector>,
    /// Empty means every namespace.
    pub namespaces: Vec<String>,
    pub excluded_namespaces: Vec<String>,
}

/// A single policy failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
    pub path: Option<String>,
    pub details: Value,
}

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            details: Value::Null,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// Zero violations.
    No,
    /// At least one violation.
    Yes,
    /// Exactly this many.
    Exactly(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assertion {
    pub expect: Expectation,
    /// Restrict the count to violations whose message contains this text.
    pub message: Option<String>,
}

impl Assertion {
    pub fn new(expect: Expectation) -> Self {
        Self {
            expect,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub name: String,
    pub resource: Resource,
    pub assertions: Vec<Assertion>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Test {
    pub name: String,
    pub template_kind: String,
    pub constraint_name: String,
    pub cases: Vec<Case>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Suite {
    pub name: String,
    /// Where the suite was loaded from, if anywhere.
    pub path: Option<String>,
    pub tests: Vec<Test>,
}

/// Empty parameter object, used when a constraint declares none.
pub fn empty_parameters() -> Value {
    Value::Object(Map::new())
}

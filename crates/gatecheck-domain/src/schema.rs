//! Template parameter schemas and constraint parameter validation.

use crate::error::{CompileError, EngineError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    String,
    StringArray,
    Int,
    Bool,
    Object,
}

impl ParamType {
    /// Parse a schema type name. Accepts a few common spellings.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "string" => Some(ParamType::String),
            "string-array" | "array<string>" | "[]string" => Some(ParamType::StringArray),
            "int" | "integer" => Some(ParamType::Int),
            "bool" | "boolean" => Some(ParamType::Bool),
            "object" => Some(ParamType::Object),
            _ => None,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            ParamType::Int => value.is_i64() || value.is_u64(),
            ParamType::Bool => value.is_boolean(),
            ParamType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::StringArray => "string-array",
            ParamType::Int => "int",
            ParamType::Bool => "bool",
            ParamType::Object => "object",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub ty: ParamType,
    pub required: bool,
}

/// Untyped schema entry as it appears in a template document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawParamSpec {
    pub ty: String,
    pub required: bool,
}

impl RawParamSpec {
    pub fn required(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            required: true,
        }
    }

    pub fn optional(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            required: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    fields: BTreeMap<String, ParamSpec>,
}

impl ParameterSchema {
    pub fn compile(raw: &BTreeMap<String, RawParamSpec>) -> Result<Self, CompileError> {
        let mut fields = BTreeMap::new();
        for (name, spec) in raw {
            let ty = ParamType::parse(&spec.ty).ok_or_else(|| CompileError::Schema {
                field: name.clone(),
                message: format!(
                    "unknown type '{}' (expected string|string-array|int|bool|object)",
                    spec.ty
                ),
            })?;
            fields.insert(
                name.clone(),
                ParamSpec {
                    ty,
                    required: spec.required,
                },
            );
        }
        Ok(Self { fields })
    }

    pub fn field(&self, name: &str) -> Option<&ParamSpec> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ParamSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check a constraint's parameter bindings.
    ///
    /// Fails on the first problem found, in this order: non-object parameters,
    /// undeclared fields, missing required fields, wrongly typed fields.
    /// `null` counts as absent.
    pub fn validate(&self, constraint: &str, parameters: &Value) -> Result<(), EngineError> {
        let mismatch = |field: &str, reason: String| EngineError::SchemaMismatch {
            constraint: constraint.to_string(),
            field: field.to_string(),
            reason,
        };

        let empty = serde_json::Map::new();
        let bindings = match parameters {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => {
                return Err(mismatch(
                    "<root>",
                    "parameters must be an object".to_string(),
                ));
            }
        };

        if let Some(unknown) = bindings.keys().find(|k| !self.fields.contains_key(*k)) {
            return Err(mismatch(
                unknown.as_str(),
                "is not declared by the template".to_string(),
            ));
        }

        for (name, spec) in &self.fields {
            match bindings.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(mismatch(
                            name.as_str(),
                            format!("is required ({})", spec.ty),
                        ));
                    }
                }
                Some(value) if !spec.ty.accepts(value) => {
                    return Err(mismatch(
                        name.as_str(),
                        format!("expected {}, found {}", spec.ty, type_name(value)),
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! YAML document shapes and their conversion to domain sources.

use anyhow::Context;
use gatecheck_domain::model::{Assertion, Expectation, KindSelector, MatchRule};
use gatecheck_domain::schema::RawParamSpec;
use gatecheck_domain::{ConstraintSource, TemplateSource};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TemplateDoc {
    pub kind: String,
    #[serde(default)]
    pub parameter_schema: BTreeMap<String, SchemaEntry>,
    pub policy_body: String,
}

/// `field: string` (required) or `field: {type: string, required: false}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SchemaEntry {
    Short(String),
    Long {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default = "default_true")]
        required: bool,
    },
}

fn default_true() -> bool {
    true
}

impl TemplateDoc {
    pub fn into_source(self) -> TemplateSource {
        let parameter_schema = self
            .parameter_schema
            .into_iter()
            .map(|(field, entry)| {
                let spec = match entry {
                    SchemaEntry::Short(ty) => RawParamSpec::required(ty),
                    SchemaEntry::Long { ty, required } => RawParamSpec { ty, required },
                };
                (field, spec)
            })
            .collect();
        TemplateSource {
            kind: self.kind,
            parameter_schema,
            policy_body: self.policy_body,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConstraintDoc {
    pub name: String,
    pub template_kind: String,
    #[serde(default, rename = "match")]
    pub match_rule: MatchDoc,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchDoc {
    #[serde(default)]
    pub kinds: Vec<KindDoc>,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub excluded_namespaces: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KindDoc {
    #[serde(default)]
    pub api_group: String,
    pub kind: String,
}

impl ConstraintDoc {
    pub fn into_source(self) -> ConstraintSource {
        ConstraintSource {
            name: self.name,
            template_kind: self.template_kind,
            match_rule: MatchRule {
                kinds: self
                    .match_rule
                    .kinds
                    .into_iter()
                    .map(|k| KindSelector::new(k.api_group, k.kind))
                    .collect(),
                namespaces: self.match_rule.namespaces,
                excluded_namespaces: self.match_rule.excluded_namespaces,
            },
            parameters: self.parameters,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteDoc {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tests: Vec<TestDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestDoc {
    pub name: String,
    #[serde(alias = "template")]
    pub template_ref: String,
    #[serde(alias = "constraint")]
    pub constraint_ref: String,
    #[serde(default)]
    pub cases: Vec<CaseDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaseDoc {
    pub name: String,
    #[serde(alias = "object")]
    pub object_ref: ObjectSource,
    #[serde(default)]
    pub assertions: Vec<AssertionDoc>,
}

/// A path to an object file, or the object itself inline.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ObjectSource {
    Path(String),
    Inline(Value),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertionDoc {
    pub violations: ViolationsDoc,
    #[serde(default)]
    pub message: Option<String>,
}

/// `violations: yes | no | <count>`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ViolationsDoc {
    Count(u64),
    Flag(bool),
    Word(String),
}

impl AssertionDoc {
    pub fn into_assertion(self) -> anyhow::Result<Assertion> {
        let expect = match self.violations {
            ViolationsDoc::Count(n) => {
                Expectation::Exactly(usize::try_from(n).context("violation count too large")?)
            }
            ViolationsDoc::Flag(true) => Expectation::Yes,
            ViolationsDoc::Flag(false) => Expectation::No,
            ViolationsDoc::Word(word) => match word.as_str() {
                "yes" => Expectation::Yes,
                "no" => Expectation::No,
                other => anyhow::bail!(
                    "invalid violations expectation: {other:?} (expected yes, no or a count)"
                ),
            },
        };
        Ok(Assertion {
            expect,
            message: self.message,
        })
    }
}

pub fn parse_template(text: &str) -> anyhow::Result<TemplateDoc> {
    serde_yaml::from_str(text).context("parse template document")
}

pub fn parse_constraint(text: &str) -> anyhow::Result<ConstraintDoc> {
    let doc: ConstraintDoc = serde_yaml::from_str(text).context("parse constraint document")?;
    if doc.name.trim().is_empty() {
        anyhow::bail!("constraint name must not be empty");
    }
    if doc.template_kind.trim().is_empty() {
        anyhow::bail!("constraint '{}': templateKind must not be empty", doc.name);
    }
    if let Some(i) = doc.match_rule.kinds.iter().position(|k| k.kind.trim().is_empty()) {
        anyhow::bail!("constraint '{}': match.kinds[{i}].kind must not be empty", doc.name);
    }
    Ok(doc)
}

pub fn parse_suite(text: &str) -> anyhow::Result<SuiteDoc> {
    serde_yaml::from_str(text).context("parse suite document")
}

pub fn parse_object(text: &str) -> anyhow::Result<Value> {
    let value: Value = serde_yaml::from_str(text).context("parse object document")?;
    if !value.is_object() {
        anyhow::bail!("object document must be a mapping");
    }
    Ok(value)
}

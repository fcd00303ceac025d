use crate::parse::{self, ObjectSource, TestDoc};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use gatecheck_domain::model::{Case, Resource, Suite, Test};
use gatecheck_domain::{ConstraintStore, EngineError, Template, TemplateRegistry};
use std::collections::BTreeMap;

const LOG_TARGET: &str = "gatecheck::repo";

/// A suite together with the templates and constraints it references.
///
/// Each suite gets its own registry and store, so kinds and constraint
/// names only need to be unique within one suite.
#[derive(Debug)]
pub struct LoadedSuite {
    pub suite: Suite,
    pub registry: TemplateRegistry,
    pub store: ConstraintStore,
}

/// Load a suite file and everything it references.
///
/// References are resolved relative to the suite's directory. A file
/// referenced by several tests is loaded once; two different files that
/// declare the same template kind or constraint name are a conflict.
pub fn load_suite(path: &Utf8Path) -> anyhow::Result<LoadedSuite> {
    log::debug!(target: LOG_TARGET, "loading suite {path}");
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    let doc = parse::parse_suite(&text).with_context(|| format!("load suite {path}"))?;

    let base = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    let name = doc
        .name
        .clone()
        .or_else(|| path.file_stem().map(str::to_string))
        .unwrap_or_else(|| path.to_string());

    let mut loader = Loader {
        base,
        registry: TemplateRegistry::new(),
        store: ConstraintStore::new(),
        templates: BTreeMap::new(),
        constraints: BTreeMap::new(),
    };

    let mut tests = Vec::with_capacity(doc.tests.len());
    for test in doc.tests {
        let test_name = test.name.clone();
        let test = loader
            .test(test)
            .with_context(|| format!("suite {path}: test '{test_name}'"))?;
        tests.push(test);
    }

    log::debug!(
        target: LOG_TARGET,
        "loaded suite {name}: {} test(s), {} template(s), {} constraint(s)",
        tests.len(),
        loader.registry.len(),
        loader.store.len()
    );

    Ok(LoadedSuite {
        suite: Suite {
            name,
            path: Some(path.to_string()),
            tests,
        },
        registry: loader.registry,
        store: loader.store,
    })
}

struct Loader {
    base: Utf8PathBuf,
    registry: TemplateRegistry,
    store: ConstraintStore,
    /// Canonical path -> template kind.
    templates: BTreeMap<Utf8PathBuf, String>,
    /// Canonical path -> constraint name.
    constraints: BTreeMap<Utf8PathBuf, String>,
}

impl Loader {
    fn test(&mut self, doc: TestDoc) -> anyhow::Result<Test> {
        let template_kind = self.template(&doc.template_ref)?;
        let constraint_name = self.constraint(&doc.constraint_ref)?;

        let mut cases = Vec::with_capacity(doc.cases.len());
        for case in doc.cases {
            let object = match case.object_ref {
                ObjectSource::Path(reference) => {
                    let path = self.resolve(&reference)?;
                    let text = read(&path)?;
                    parse::parse_object(&text).with_context(|| format!("load object {path}"))?
                }
                ObjectSource::Inline(value) => {
                    if !value.is_object() {
                        anyhow::bail!("case '{}': inline object must be a mapping", case.name);
                    }
                    value
                }
            };
            let assertions = case
                .assertions
                .into_iter()
                .map(parse::AssertionDoc::into_assertion)
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("case '{}'", case.name))?;
            cases.push(Case {
                name: case.name,
                resource: Resource::from_object(object),
                assertions,
            });
        }

        Ok(Test {
            name: doc.name,
            template_kind,
            constraint_name,
            cases,
        })
    }

    fn template(&mut self, reference: &str) -> anyhow::Result<String> {
        let path = self.resolve(reference)?;
        if let Some(kind) = self.templates.get(&path) {
            return Ok(kind.clone());
        }
        let text = read(&path)?;
        let src = parse::parse_template(&text)
            .with_context(|| format!("load template {path}"))?
            .into_source();
        let template = Template::compile(src).with_context(|| format!("load template {path}"))?;
        let kind = template.kind.clone();
        self.registry
            .register(template)
            .with_context(|| format!("load template {path}"))?;
        self.templates.insert(path, kind.clone());
        Ok(kind)
    }

    fn constraint(&mut self, reference: &str) -> anyhow::Result<String> {
        let path = self.resolve(reference)?;
        if let Some(name) = self.constraints.get(&path) {
            return Ok(name.clone());
        }
        let text = read(&path)?;
        let src = parse::parse_constraint(&text)
            .with_context(|| format!("load constraint {path}"))?
            .into_source();
        let constraint = self
            .store
            .add(&self.registry, src)
            .with_context(|| format!("load constraint {path}"))?;
        self.constraints.insert(path, constraint.name.clone());
        Ok(constraint.name.clone())
    }

    /// Canonical path of a reference, relative to the suite directory.
    fn resolve(&self, reference: &str) -> Result<Utf8PathBuf, EngineError> {
        let joined = self.base.join(reference);
        joined
            .canonicalize_utf8()
            .map_err(|err| EngineError::PathResolution {
                reference: reference.to_string(),
                base: self.base.to_string(),
                reason: err.to_string(),
            })
    }
}

fn read(path: &Utf8Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {path}"))
}

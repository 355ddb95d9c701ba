//! Parameter resolution.
//!
//! Turns a manifest plus caller overrides into the immutable
//! [`ParameterSet`] one generation run consumes.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::manifest::Manifest;
use crate::prompt::Prompter;
use crate::renderer::TokenSubstitutor;

/// Resolved parameter values for one generation run, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ParameterSet {
    /// Build a set directly from name/value pairs. Later pairs replace earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = ParameterSet::default();
        for (k, v) in pairs {
            set.insert(k.into(), v.into());
        }
        set
    }

    fn insert(&mut self, name: String, value: String) {
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    /// Value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate `(name, value)` pairs in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves manifest parameters: override, else prompt (interactive), else default.
pub struct ParameterResolver<'a> {
    manifest: &'a Manifest,
    path_bound: BTreeSet<String>,
    substitutor: TokenSubstitutor,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            path_bound: BTreeSet::new(),
            substitutor: TokenSubstitutor::new(),
        }
    }

    /// Mark parameters that end up in file or directory names.
    ///
    /// Their values must be usable as a single path component.
    pub fn with_path_parameters(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.path_bound.extend(names);
        self
    }

    /// Resolve every parameter.
    ///
    /// With `prompter` set, parameters without an override are asked for
    /// interactively; otherwise the (rendered) default is used. The first
    /// invalid value aborts resolution.
    pub fn resolve(
        &self,
        overrides: &HashMap<String, String>,
        mut prompter: Option<&mut dyn Prompter>,
    ) -> TemplateResult<ParameterSet> {
        let mut unknown: Vec<&String> = overrides
            .keys()
            .filter(|k| self.manifest.parameter(k).is_none())
            .collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(TemplateError::validation(
                name.as_str(),
                overrides[name.as_str()].as_str(),
                format!("template '{}' declares no such parameter", self.manifest.id),
            ));
        }

        let origin = Path::new("template.yaml");
        let mut resolved = ParameterSet::default();

        for spec in &self.manifest.parameters {
            let value = match overrides.get(&spec.name) {
                Some(value) => value.clone(),
                None => {
                    let default = self.substitutor.substitute(&spec.default, &resolved, origin)?;
                    match prompter.as_deref_mut() {
                        Some(p) => {
                            let answer = p.prompt(&spec.prompt, Some(&default))?;
                            if answer.trim().is_empty() {
                                default
                            } else {
                                answer.trim().to_string()
                            }
                        }
                        None => default,
                    }
                }
            };

            spec.rule
                .check(&value)
                .map_err(|reason| TemplateError::validation(&spec.name, &value, reason))?;
            if self.path_bound.contains(&spec.name) {
                check_path_component(&spec.name, &value)?;
            }

            debug!("Resolved parameter {} = {:?}", spec.name, value);
            resolved.insert(spec.name.clone(), value);
        }

        Ok(resolved)
    }
}

fn check_path_component(name: &str, value: &str) -> TemplateResult<()> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(TemplateError::validation(
            name,
            value,
            "value is used in a file name and must not be empty, '.', '..' or contain path separators",
        ));
    }
    Ok(())
}

//! Generic source-to-target translator
//!
//! Walks the serialized form of a source config and builds the target
//! document key by key. Keys are renamed from snake_case to lowerCamelCase
//! unless the rename table says otherwise, source-only keys are skipped, and
//! any location can be handed to an override that produces its own subtree.
//! A translation is recorded for every node written to the target; nulls and
//! empty values are never written.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::path::{Path, PathPattern, Schema};
use crate::report::Report;
use crate::translation::set::{is_empty_value, TranslationSet};
use crate::translation::Translated;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Produces the target subtree for one source location
///
/// Receives the translator (so the override can fall back to the default walk
/// for parts of its subtree), the source value and the source and target
/// paths of the location.
pub type Override<'a> = Box<dyn Fn(&GenericTranslator<'a>, &Value, &Path, &Path) -> Translated<Option<Value>> + 'a>;

/// Translator configured with skips, renames and overrides
pub struct GenericTranslator<'a> {
    skips: Vec<PathPattern>,
    renames: HashMap<&'static str, &'static str>,
    overrides: Vec<(PathPattern, Override<'a>)>,
}

impl<'a> Default for GenericTranslator<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> GenericTranslator<'a> {
    pub fn new() -> Self {
        Self {
            skips: Vec::new(),
            renames: HashMap::new(),
            overrides: Vec::new(),
        }
    }

    /// Never copy the source location matching `pattern`
    pub fn skip(mut self, pattern: &str) -> Self {
        self.skips.push(PathPattern::new(pattern));
        self
    }

    /// Use `to` as the target name of every source key named `from`
    pub fn rename(mut self, from: &'static str, to: &'static str) -> Self {
        self.renames.insert(from, to);
        self
    }

    /// Hand source locations matching `pattern` to `handler`
    pub fn with_override<F>(mut self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&GenericTranslator<'a>, &Value, &Path, &Path) -> Translated<Option<Value>> + 'a,
    {
        self.overrides.push((PathPattern::new(pattern), Box::new(handler)));
        self
    }

    /// Translate a whole document
    pub fn translate(&self, source: &Value) -> Translated<Option<Value>> {
        self.translate_at(
            source,
            &Path::root(Schema::Source),
            &Path::root(Schema::Target),
        )
    }

    /// Translate the subtree at `from`, writing it at `to`
    pub fn translate_at(&self, value: &Value, from: &Path, to: &Path) -> Translated<Option<Value>> {
        if let Some((_, handler)) = self.overrides.iter().find(|(p, _)| p.matches(from)) {
            return handler(self, value, from, to);
        }
        self.walk_default(value, from, to)
    }

    /// Translate the subtree at `from` ignoring any override for `from`
    /// itself; overrides deeper in the subtree still apply
    pub fn walk_default(&self, value: &Value, from: &Path, to: &Path) -> Translated<Option<Value>> {
        let mut result = Translated::new(None);
        result.value = self.walk(value, from, to, &mut result.translations, &mut result.report);
        result
    }

    fn walk(
        &self,
        value: &Value,
        from: &Path,
        to: &Path,
        translations: &mut TranslationSet,
        report: &mut Report,
    ) -> Option<Value> {
        let written = match value {
            Value::Object(source) => {
                let mut target = Map::new();
                for (key, child) in source {
                    let child_from = from.append(key.as_str());
                    if self.skips.iter().any(|p| p.matches(&child_from)) {
                        continue;
                    }
                    let child_to = to.append(self.target_key(key));
                    let translated = self.translate_at(child, &child_from, &child_to);
                    translations.merge(translated.translations);
                    report.merge(translated.report);
                    if let Some(v) = translated.value {
                        if !is_empty_value(&v) {
                            target.insert(self.target_key(key), v);
                        }
                    }
                }
                Value::Object(target)
            }
            Value::Array(source) => {
                let mut target = Vec::with_capacity(source.len());
                for (i, child) in source.iter().enumerate() {
                    let translated = self.translate_at(child, &from.append(i), &to.append(i));
                    translations.merge(translated.translations);
                    report.merge(translated.report);
                    // keep indices aligned with the source
                    target.push(translated.value.unwrap_or_else(|| match child {
                        Value::Object(_) => Value::Object(Map::new()),
                        other => other.clone(),
                    }));
                }
                Value::Array(target)
            }
            other => other.clone(),
        };
        if is_empty_value(&written) {
            return None;
        }
        if !to.is_empty() {
            translations.add(from.clone(), to.clone());
        }
        Some(written)
    }

    fn target_key(&self, key: &str) -> String {
        match self.renames.get(key) {
            Some(renamed) => renamed.to_string(),
            None => snake_to_camel(key),
        }
    }
}

/// `ssh_authorized_keys` becomes `sshAuthorizedKeys`
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

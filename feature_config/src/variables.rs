// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The variable model: a typed value universe plus a name-indexed,
//! chain-extendable scope.
//!
//! Scopes are built per action-expansion request and discarded (see
//! `SPEC_FULL.md` §A.1); they hold no locks and are never shared across
//! threads, so interior mutability here uses `once_cell::unsync::OnceCell`
//! rather than the `sync` variant.

use std::collections::BTreeMap;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::error::{FeatureConfigError, Result};

/// A caller-supplied callback that materializes a lazy tree-artifact
/// sequence on demand. Kept as a trait object so callers can close over
/// whatever action-graph state they need without this crate knowing about
/// it (it is the one seam this core shares with the scheduler collaborator).
pub trait ArtifactExpander {
    fn expand(&self, artifact_name: &str) -> Result<Vec<VariableValue>>;
}

/// A sequence whose elements are produced lazily by an [`ArtifactExpander`],
/// materialized at most once regardless of how many times it is iterated
/// within one expansion pass.
pub struct LazyArtifactSequence {
    artifact_name: String,
    cache: OnceCell<Vec<VariableValue>>,
}

impl LazyArtifactSequence {
    pub fn new(artifact_name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            artifact_name: artifact_name.into(),
            cache: OnceCell::new(),
        })
    }

    fn materialize(&self, expander: Option<&dyn ArtifactExpander>) -> Result<&[VariableValue]> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }
        let expander = expander.ok_or_else(|| {
            FeatureConfigError::ExpansionFailed(format!(
                "variable {:?} requires an artifact expander to iterate",
                self.artifact_name
            ))
        })?;
        let children = expander.expand(&self.artifact_name)?;
        // `set` only fails if another call already won the race; within a
        // single-threaded scope that cannot happen, so either outcome is
        // the same children we just computed.
        let _ = self.cache.set(children);
        Ok(self.cache.get().expect("just initialized"))
    }
}

impl std::fmt::Debug for LazyArtifactSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyArtifactSequence")
            .field("artifact_name", &self.artifact_name)
            .field("materialized", &self.cache.get().is_some())
            .finish()
    }
}

/// The value universe described in §3: scalars, a structured record,
/// a sequence, and a lazily-expanded tree-artifact sequence.
#[derive(Debug, Clone)]
pub enum VariableValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Structure(BTreeMap<String, VariableValue>),
    Sequence(Vec<VariableValue>),
    LazyArtifactSequence(Rc<LazyArtifactSequence>),
}

impl VariableValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn sequence(values: impl IntoIterator<Item = VariableValue>) -> Self {
        Self::Sequence(values.into_iter().collect())
    }

    /// Walks a dotted accessor into a structure. An empty accessor returns
    /// the value itself.
    fn resolve_accessor<'a>(&'a self, accessor: &[String]) -> Result<&'a VariableValue> {
        let mut current = self;
        for field in accessor {
            match current {
                VariableValue::Structure(fields) => {
                    current = fields.get(field).ok_or_else(|| {
                        FeatureConfigError::ExpansionFailed(format!(
                            "structure has no field {field:?}"
                        ))
                    })?;
                }
                other => {
                    return Err(FeatureConfigError::ExpansionFailed(format!(
                        "cannot access field {field:?} on non-structure value {other:?}"
                    )));
                }
            }
        }
        Ok(current)
    }
}

/// A name-indexed value environment, chained to a parent via `derive`.
///
/// Internally backed by a persistent hash map (the way `alchemist`'s
/// dependency-graph traversal threads a `rpds::HashTrieSetSync` path down
/// recursive calls): deriving a scope shares structure with its parent
/// instead of copying it, which matters because iteration over a long
/// sequence derives one scope per element.
#[derive(Clone)]
pub struct Scope {
    bindings: rpds::HashTrieMap<String, VariableValue>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            bindings: rpds::HashTrieMap::new(),
        }
    }

    pub fn from_bindings(bindings: impl IntoIterator<Item = (String, VariableValue)>) -> Self {
        let mut scope = Self::new();
        for (name, value) in bindings {
            scope.bindings = scope.bindings.insert(name, value);
        }
        scope
    }

    /// Returns a new scope identical to `self` except that `name` now
    /// resolves to `value`; lookups check the new binding first.
    pub fn derive(&self, name: impl Into<String>, value: VariableValue) -> Scope {
        Scope {
            bindings: self.bindings.insert(name.into(), value),
        }
    }

    fn split_accessor(name: &str) -> (&str, Vec<String>) {
        let mut parts = name.split('.');
        let head = parts.next().unwrap_or(name);
        let rest: Vec<String> = parts.map(|s| s.to_owned()).collect();
        (head, rest)
    }

    /// True iff `name` resolves in this scope. Never forces materialization
    /// of a lazy artifact sequence; it only confirms the binding exists.
    pub fn is_available(&self, name: &str) -> bool {
        let (head, _accessor) = Self::split_accessor(name);
        self.bindings.get(head).is_some()
    }

    /// Resolves `name` (with optional dotted accessor), failing with
    /// `ExpansionFailed` if it is unbound.
    pub fn get_variable(&self, name: &str) -> Result<VariableValue> {
        let (head, accessor) = Self::split_accessor(name);
        let root = self.bindings.get(head).ok_or_else(|| {
            FeatureConfigError::ExpansionFailed(format!("variable {head:?} is not bound"))
        })?;
        Ok(root.resolve_accessor(&accessor)?.clone())
    }

    /// Returns the elements of a sequence-typed variable, materializing a
    /// lazy artifact sequence via `expander` exactly once.
    pub fn get_sequence(
        &self,
        name: &str,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<Vec<VariableValue>> {
        match self.get_variable(name)? {
            VariableValue::Sequence(values) => Ok(values),
            VariableValue::LazyArtifactSequence(lazy) => {
                Ok(lazy.materialize(expander)?.to_vec())
            }
            other => Err(FeatureConfigError::ExpansionFailed(format!(
                "variable {name:?} is not a sequence (got {other:?})"
            ))),
        }
    }

    /// Resolves `name` to a string, coercing integers to their decimal form.
    pub fn get_string(&self, name: &str) -> Result<String> {
        match self.get_variable(name)? {
            VariableValue::String(s) => Ok(s),
            VariableValue::Integer(i) => Ok(i.to_string()),
            other => Err(FeatureConfigError::ExpansionFailed(format!(
                "variable {name:?} cannot be expanded to a string (got {other:?})"
            ))),
        }
    }

    /// True iff `name` is available and truthy. Booleans use their value;
    /// integers are truthy iff non-zero; strings truthy iff non-empty;
    /// sequences truthy iff non-empty; structures are always truthy.
    ///
    /// A lazy artifact sequence is treated as truthy without being
    /// materialized (an open question not addressed by the source: see
    /// `DESIGN.md`).
    pub fn is_truthy(&self, name: &str) -> Result<bool> {
        Ok(match self.get_variable(name)? {
            VariableValue::Boolean(b) => b,
            VariableValue::Integer(i) => i != 0,
            VariableValue::String(s) => !s.is_empty(),
            VariableValue::Sequence(values) => !values.is_empty(),
            VariableValue::Structure(_) => true,
            VariableValue::LazyArtifactSequence(_) => true,
        })
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

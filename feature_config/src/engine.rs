// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The selection and expansion engine: resolves a requested selectable set
//! into a cached `FeatureConfiguration`, then expands that configuration
//! against a caller-supplied scope into command lines, environments, and
//! tool resolutions.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use once_cell::sync::OnceCell;

use crate::config::ToolchainConfig;
use crate::environment::Environment;
use crate::error::{FeatureConfigError, Result};
use crate::graph::{SelectableGraph, SelectableKind};
use crate::template::Template;
use crate::variables::{ArtifactExpander, Scope, VariableValue};

const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// A resolved tool: the path chosen by [`FeatureConfiguration::get_tool_for_action`]
/// plus the execution requirements that travel with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    pub path: String,
    pub execution_requirements: BTreeSet<String>,
}

/// The outcome of selection: an ordered enabled-feature list, the set of
/// every enabled selectable's name (features and action configs alike, the
/// universe `isEnabled` and with-feature predicates check against), and the
/// action-name → action-config index restricted to enabled action configs.
///
/// Built once per distinct requested set by [`Engine::get_feature_configuration`]
/// and shared thereafter; holds no interior mutability, so it is `Send + Sync`
/// for free.
#[derive(Debug)]
pub struct FeatureConfiguration {
    graph: Arc<SelectableGraph>,
    enabled_feature_indices: Vec<usize>,
    enabled_names: BTreeSet<String>,
    action_index: HashMap<String, usize>,
}

impl FeatureConfiguration {
    fn empty_inner() -> Self {
        Self {
            graph: Arc::new(SelectableGraph::empty()),
            enabled_feature_indices: Vec::new(),
            enabled_names: BTreeSet::new(),
            action_index: HashMap::new(),
        }
    }

    /// A process-wide singleton usable when engine construction fails, so a
    /// caller that reported an `InvalidConfiguration` error can continue
    /// analysis against a harmless empty configuration instead of bailing
    /// out entirely.
    pub fn empty() -> Arc<FeatureConfiguration> {
        static EMPTY: OnceLock<Arc<FeatureConfiguration>> = OnceLock::new();
        EMPTY.get_or_init(|| Arc::new(FeatureConfiguration::empty_inner())).clone()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled_names.contains(name)
    }

    #[tracing::instrument(skip(self, scope, expander), fields(action = %action))]
    pub fn get_command_line(
        &self,
        action: &str,
        scope: &Scope,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if let Some(&idx) = self.action_index.get(action) {
            if let SelectableKind::ActionConfig(action_config) = &self.graph.selectable(idx).kind {
                for flag_set in &action_config.flag_sets {
                    flag_set.expand_for_action_config(scope, &self.enabled_names, expander, &mut out)?;
                }
            }
        }
        for &idx in &self.enabled_feature_indices {
            if let SelectableKind::Feature(feature) = &self.graph.selectable(idx).kind {
                for flag_set in &feature.flag_sets {
                    flag_set.expand(action, scope, &self.enabled_names, expander, &mut out)?;
                }
            }
        }
        Ok(out)
    }

    /// Same expansion as [`Self::get_command_line`], but broken down per
    /// contributing selectable so callers can attribute (or attribute the
    /// absence of) arguments to a specific feature or action config. Empty
    /// contributions are retained rather than filtered out.
    pub fn get_per_feature_expansions(
        &self,
        action: &str,
        scope: &Scope,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<Vec<(String, Vec<String>)>> {
        let mut contributions = Vec::new();
        if let Some(&idx) = self.action_index.get(action) {
            let selectable = self.graph.selectable(idx);
            if let SelectableKind::ActionConfig(action_config) = &selectable.kind {
                let mut out = Vec::new();
                for flag_set in &action_config.flag_sets {
                    flag_set.expand_for_action_config(scope, &self.enabled_names, expander, &mut out)?;
                }
                contributions.push((selectable.name.clone(), out));
            }
        }
        for &idx in &self.enabled_feature_indices {
            let selectable = self.graph.selectable(idx);
            let mut out = Vec::new();
            if let SelectableKind::Feature(feature) = &selectable.kind {
                for flag_set in &feature.flag_sets {
                    flag_set.expand(action, scope, &self.enabled_names, expander, &mut out)?;
                }
            }
            contributions.push((selectable.name.clone(), out));
        }
        Ok(contributions)
    }

    #[tracing::instrument(skip(self, scope), fields(action = %action))]
    pub fn get_environment(&self, action: &str, scope: &Scope) -> Result<Environment> {
        let mut env = Environment::new();
        for &idx in &self.enabled_feature_indices {
            if let SelectableKind::Feature(feature) = &self.graph.selectable(idx).kind {
                for env_set in &feature.env_sets {
                    env_set.expand(action, scope, &self.enabled_names, None, &mut env)?;
                }
            }
        }
        Ok(env)
    }

    pub fn get_tool_for_action(&self, action: &str) -> Result<ResolvedTool> {
        let idx = self.action_index.get(action).ok_or_else(|| {
            FeatureConfigError::NoMatchingTool {
                action: action.to_string(),
            }
        })?;
        match &self.graph.selectable(*idx).kind {
            SelectableKind::ActionConfig(action_config) => action_config
                .tools
                .iter()
                .find(|tool| {
                    crate::expand::with_feature::any_satisfied(&tool.with_features, &self.enabled_names)
                })
                .map(|tool| ResolvedTool {
                    path: tool.path.clone(),
                    execution_requirements: tool.execution_requirements.clone(),
                })
                .ok_or_else(|| FeatureConfigError::NoMatchingTool {
                    action: action.to_string(),
                }),
            SelectableKind::Feature(_) => unreachable!("action_index only ever points at action configs"),
        }
    }
}

type CacheSlot = Arc<OnceCell<std::result::Result<Arc<FeatureConfiguration>, FeatureConfigError>>>;

/// Owns the compiled selectable graph and the bounded selection cache.
/// Built once from a configuration record; thereafter immutable except for
/// the cache's interior bookkeeping, which is itself safe for concurrent
/// `get-or-compute` (see `SPEC_FULL.md` §A concurrency notes).
pub struct Engine {
    graph: Arc<SelectableGraph>,
    defaults: Vec<String>,
    artifact_name_patterns: HashMap<String, Template>,
    cache: Mutex<lru::LruCache<BTreeSet<String>, CacheSlot>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("selectables", &self.graph.len())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl Engine {
    /// Compiles a configuration record into a graph plus artifact-name
    /// patterns. Parsing the on-disk toolchain description, and resolving
    /// it against any filesystem layout, is a caller concern — `config` is
    /// taken to already be in memory.
    #[tracing::instrument(skip(config))]
    pub fn build(config: &ToolchainConfig) -> Result<Self> {
        let graph = SelectableGraph::build(config)?;

        let defaults = graph
            .selectables()
            .filter(|(_, selectable)| selectable.default_enabled)
            .map(|(_, selectable)| selectable.name.clone())
            .collect();

        let mut artifact_name_patterns = HashMap::new();
        for pattern in &config.artifact_name_patterns {
            if artifact_name_patterns.contains_key(&pattern.category) {
                return Err(FeatureConfigError::InvalidConfiguration(format!(
                    "duplicate artifact name pattern for category {:?}",
                    pattern.category
                )));
            }
            artifact_name_patterns.insert(pattern.category.clone(), Template::compile(&pattern.pattern)?);
        }

        Ok(Self {
            graph: Arc::new(graph),
            defaults,
            artifact_name_patterns,
            cache: Mutex::new(lru::LruCache::new(
                NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).expect("capacity is nonzero"),
            )),
        })
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    pub fn has_pattern(&self, category: &str) -> bool {
        self.artifact_name_patterns.contains_key(category)
    }

    /// Resolves a requested selectable-name set into a `FeatureConfiguration`,
    /// consulting (and populating) the bounded cache keyed by the
    /// canonicalized request. Concurrent calls for the same key block on a
    /// single shared computation rather than racing; concurrent calls for
    /// distinct keys proceed independently.
    #[tracing::instrument(skip(self, requested))]
    pub fn get_feature_configuration(
        &self,
        requested: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Arc<FeatureConfiguration>> {
        let key: BTreeSet<String> = requested.into_iter().map(Into::into).collect();

        let slot = {
            let mut cache = self.cache.lock().expect("selection cache mutex poisoned");
            if let Some(existing) = cache.get(&key) {
                existing.clone()
            } else {
                tracing::debug!(requested = ?key, "feature configuration cache miss");
                let slot: CacheSlot = Arc::new(OnceCell::new());
                cache.put(key.clone(), slot.clone());
                slot
            }
        };

        slot.get_or_init(|| self.compute_feature_configuration(&key)).clone()
    }

    fn compute_feature_configuration(&self, requested: &BTreeSet<String>) -> Result<Arc<FeatureConfiguration>> {
        let n = self.graph.len();
        let mut enabled = vec![false; n];

        for name in requested.iter().chain(self.defaults.iter()) {
            if let Some(idx) = self.graph.index_of(name) {
                enabled[idx] = true;
            }
        }

        loop {
            let mut changed = false;

            loop {
                let mut round_changed = false;
                for idx in 0..n {
                    if !enabled[idx] {
                        continue;
                    }
                    for &implied in self.graph.implies(idx) {
                        if !enabled[implied] {
                            enabled[implied] = true;
                            round_changed = true;
                        }
                    }
                }
                if !round_changed {
                    break;
                }
                changed = true;
            }

            loop {
                let mut round_changed = false;
                for idx in 0..n {
                    if !enabled[idx] {
                        continue;
                    }
                    let clauses = self.graph.requires(idx);
                    if clauses.is_empty() {
                        continue;
                    }
                    let satisfied = clauses.iter().any(|clause| clause.iter().all(|&member| enabled[member]));
                    if !satisfied {
                        enabled[idx] = false;
                        round_changed = true;
                        tracing::debug!(
                            selectable = %self.graph.selectable(idx).name,
                            "selectable dropped by requirement pruning"
                        );
                    }
                }
                if !round_changed {
                    break;
                }
                changed = true;
            }

            if !changed {
                break;
            }
        }

        for symbol in self.graph.provided_symbols() {
            let providers: Vec<usize> = self
                .graph
                .provided_by(symbol)
                .iter()
                .copied()
                .filter(|&idx| enabled[idx])
                .collect();
            if providers.len() > 1 {
                let mut names: Vec<String> = providers
                    .iter()
                    .map(|&idx| self.graph.selectable(idx).name.clone())
                    .collect();
                names.sort();
                tracing::warn!(symbol, providers = ?names, "collision detected on provided symbol");
                return Err(FeatureConfigError::CollidingProvides {
                    symbol: symbol.to_string(),
                    providers: names,
                });
            }
        }

        let mut enabled_feature_indices = Vec::new();
        let mut enabled_names = BTreeSet::new();
        let mut action_index = HashMap::new();
        for (idx, selectable) in self.graph.selectables() {
            if !enabled[idx] {
                continue;
            }
            enabled_names.insert(selectable.name.clone());
            match &selectable.kind {
                SelectableKind::Feature(_) => enabled_feature_indices.push(idx),
                SelectableKind::ActionConfig(action_config) => {
                    action_index.insert(action_config.action_name.clone(), idx);
                }
            }
        }

        Ok(Arc::new(FeatureConfiguration {
            graph: Arc::clone(&self.graph),
            enabled_feature_indices,
            enabled_names,
            action_index,
        }))
    }

    /// Expands the pattern configured for `category` against a scope binding
    /// `output_name`, `base_name` (the basename of `output_name`), and
    /// `output_directory` (its parent path). A leading `/` in the result is
    /// stripped bit-exact, a compatibility quirk with no documented
    /// rationale that is nonetheless preserved (see `DESIGN.md`).
    pub fn get_artifact_name(&self, category: &str, output_name: &str) -> Result<String> {
        let template = self.artifact_name_patterns.get(category).ok_or_else(|| {
            FeatureConfigError::MissingArtifactPattern {
                category: category.to_string(),
            }
        })?;

        let path = Path::new(output_name);
        let base_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_directory = path
            .parent()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let scope = Scope::from_bindings([
            ("output_name".to_string(), VariableValue::string(output_name)),
            ("base_name".to_string(), VariableValue::string(base_name)),
            ("output_directory".to_string(), VariableValue::string(output_directory)),
        ]);

        let expanded = template.expand(&scope, None)?;
        Ok(expanded.strip_prefix('/').map(str::to_string).unwrap_or(expanded))
    }
}

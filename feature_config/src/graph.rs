// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The selectable graph: features and action configs, plus the four
//! relations (`implies`, `requires`, `provides`, and their reverses) over
//! them.
//!
//! Per the REDESIGN FLAGS in `spec.md` §9, selectables reference each other
//! by integer index rather than by object reference, so the graph is a
//! flat, `Send + Sync`, lock-free structure once built — the four relations
//! are adjacency lists keyed by index.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::{FlagGroupRecord, FlagSetRecord, ToolRecord, ToolchainConfig, WithFeatureSetRecord};
use crate::error::{FeatureConfigError, Result};
use crate::expand::{
    EnvEntry, EnvSet, Flag, FlagGroup, FlagGroupChildren, FlagGroupGuards, FlagSet,
    WithFeatureSet,
};
use crate::template::Template;

/// A single tool available to an action config: a path, execution
/// requirements, and the with-feature predicates that select it.
#[derive(Debug, Clone)]
pub struct Tool {
    pub path: String,
    pub execution_requirements: BTreeSet<String>,
    pub with_features: Vec<WithFeatureSet>,
}

#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub flag_sets: Vec<FlagSet>,
    pub env_sets: Vec<EnvSet>,
}

#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub action_name: String,
    pub tools: Vec<Tool>,
    pub flag_sets: Vec<FlagSet>,
}

#[derive(Debug, Clone)]
pub enum SelectableKind {
    Feature(Feature),
    ActionConfig(ActionConfig),
}

#[derive(Debug, Clone)]
pub struct Selectable {
    pub name: String,
    pub default_enabled: bool,
    pub provides: BTreeSet<String>,
    pub kind: SelectableKind,
}

impl Selectable {
    pub fn is_feature(&self) -> bool {
        matches!(self.kind, SelectableKind::Feature(_))
    }

    pub fn is_action_config(&self) -> bool {
        matches!(self.kind, SelectableKind::ActionConfig(_))
    }
}

/// A requirement is a disjunction of conjunctions: at least one clause
/// (an inner `Vec<usize>`, all of whose members must be enabled) must be
/// satisfied.
pub type RequirementClauses = Vec<Vec<usize>>;

#[derive(Debug)]
pub struct SelectableGraph {
    selectables: Vec<Selectable>,
    name_index: HashMap<String, usize>,
    action_index: HashMap<String, usize>,
    implies: Vec<Vec<usize>>,
    implied_by: Vec<Vec<usize>>,
    requires: Vec<RequirementClauses>,
    required_by: Vec<Vec<usize>>,
    provided_by: HashMap<String, Vec<usize>>,
}

impl SelectableGraph {
    pub fn empty() -> Self {
        Self {
            selectables: Vec::new(),
            name_index: HashMap::new(),
            action_index: HashMap::new(),
            implies: Vec::new(),
            implied_by: Vec::new(),
            requires: Vec::new(),
            required_by: Vec::new(),
            provided_by: HashMap::new(),
        }
    }

    pub fn build(config: &ToolchainConfig) -> Result<Self> {
        let mut selectables = Vec::with_capacity(config.features.len() + config.action_configs.len());
        let mut name_index = HashMap::new();
        let mut action_index = HashMap::new();

        for feature in &config.features {
            if name_index.contains_key(&feature.name) {
                return Err(FeatureConfigError::InvalidConfiguration(format!(
                    "duplicate selectable name {:?}",
                    feature.name
                )));
            }
            let idx = selectables.len();
            name_index.insert(feature.name.clone(), idx);
            selectables.push(Selectable {
                name: feature.name.clone(),
                default_enabled: feature.default_enabled,
                provides: feature.provides.iter().cloned().collect(),
                kind: SelectableKind::Feature(Feature {
                    flag_sets: feature
                        .flag_sets
                        .iter()
                        .map(compile_flag_set)
                        .collect::<Result<Vec<_>>>()?,
                    env_sets: feature
                        .env_sets
                        .iter()
                        .map(compile_env_set)
                        .collect::<Result<Vec<_>>>()?,
                }),
            });
        }

        for action_config in &config.action_configs {
            if name_index.contains_key(&action_config.config_name) {
                return Err(FeatureConfigError::InvalidConfiguration(format!(
                    "duplicate selectable name {:?}",
                    action_config.config_name
                )));
            }
            if action_index.contains_key(&action_config.action_name) {
                return Err(FeatureConfigError::InvalidConfiguration(format!(
                    "two action configs both target action {:?}",
                    action_config.action_name
                )));
            }
            for flag_set in &action_config.flag_sets {
                if !flag_set.actions.is_empty() {
                    return Err(FeatureConfigError::InvalidConfiguration(format!(
                        "action config {:?}'s flag set must not list actions explicitly; \
                         the action is implicit",
                        action_config.config_name
                    )));
                }
            }

            let idx = selectables.len();
            name_index.insert(action_config.config_name.clone(), idx);
            action_index.insert(action_config.action_name.clone(), idx);
            selectables.push(Selectable {
                name: action_config.config_name.clone(),
                default_enabled: action_config.default_enabled,
                provides: BTreeSet::new(),
                kind: SelectableKind::ActionConfig(ActionConfig {
                    action_name: action_config.action_name.clone(),
                    tools: action_config
                        .tools
                        .iter()
                        .map(compile_tool)
                        .collect::<Result<Vec<_>>>()?,
                    flag_sets: action_config
                        .flag_sets
                        .iter()
                        .map(compile_flag_set)
                        .collect::<Result<Vec<_>>>()?,
                }),
            });
        }

        let n = selectables.len();
        let mut implies: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut implied_by: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut requires: Vec<RequirementClauses> = vec![Vec::new(); n];
        let mut required_by: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut provided_by: HashMap<String, Vec<usize>> = HashMap::new();

        let resolve = |name: &str| -> Result<usize> {
            name_index.get(name).copied().ok_or_else(|| {
                FeatureConfigError::InvalidConfiguration(format!(
                    "reference to unknown selectable {name:?}"
                ))
            })
        };

        for feature in &config.features {
            let idx = name_index[&feature.name];
            for implied_name in &feature.implies {
                let target = resolve(implied_name)?;
                implies[idx].push(target);
                implied_by[target].push(idx);
            }
            let mut clauses = Vec::with_capacity(feature.requires.len());
            for clause in &feature.requires {
                let mut members = Vec::with_capacity(clause.len());
                for name in clause {
                    let target = resolve(name)?;
                    members.push(target);
                    required_by[target].push(idx);
                }
                clauses.push(members);
            }
            requires[idx] = clauses;
        }

        for action_config in &config.action_configs {
            let idx = name_index[&action_config.config_name];
            for implied_name in &action_config.implies {
                let target = resolve(implied_name)?;
                implies[idx].push(target);
                implied_by[target].push(idx);
            }
        }

        for (idx, selectable) in selectables.iter().enumerate() {
            for symbol in &selectable.provides {
                provided_by.entry(symbol.clone()).or_default().push(idx);
            }
            if let SelectableKind::ActionConfig(action_config) = &selectable.kind {
                for tool in &action_config.tools {
                    for predicate in &tool.with_features {
                        for name in predicate.features.iter().chain(predicate.not_features.iter()) {
                            resolve(name)?;
                        }
                    }
                }
            }
        }

        // Also validate with-feature references inside flag sets / env sets,
        // which reference selectable names the same way tools do.
        let mut referenced_feature_names: HashSet<&str> = HashSet::new();
        for selectable in &selectables {
            let flag_sets: &[FlagSet] = match &selectable.kind {
                SelectableKind::Feature(f) => &f.flag_sets,
                SelectableKind::ActionConfig(a) => &a.flag_sets,
            };
            for flag_set in flag_sets {
                for predicate in &flag_set.with_features {
                    referenced_feature_names.extend(predicate.features.iter().map(String::as_str));
                    referenced_feature_names
                        .extend(predicate.not_features.iter().map(String::as_str));
                }
            }
            if let SelectableKind::Feature(f) = &selectable.kind {
                for env_set in &f.env_sets {
                    for predicate in &env_set.with_features {
                        referenced_feature_names
                            .extend(predicate.features.iter().map(String::as_str));
                        referenced_feature_names
                            .extend(predicate.not_features.iter().map(String::as_str));
                    }
                }
            }
        }
        for name in referenced_feature_names {
            resolve(name)?;
        }

        Ok(Self {
            selectables,
            name_index,
            action_index,
            implies,
            implied_by,
            requires,
            required_by,
            provided_by,
        })
    }

    pub fn len(&self) -> usize {
        self.selectables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectables.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    pub fn selectable(&self, idx: usize) -> &Selectable {
        &self.selectables[idx]
    }

    pub fn selectables(&self) -> impl Iterator<Item = (usize, &Selectable)> {
        self.selectables.iter().enumerate()
    }

    pub fn action_config_index(&self, action_name: &str) -> Option<usize> {
        self.action_index.get(action_name).copied()
    }

    pub fn implies(&self, idx: usize) -> &[usize] {
        &self.implies[idx]
    }

    pub fn implied_by(&self, idx: usize) -> &[usize] {
        &self.implied_by[idx]
    }

    pub fn requires(&self, idx: usize) -> &[Vec<usize>] {
        &self.requires[idx]
    }

    pub fn required_by(&self, idx: usize) -> &[usize] {
        &self.required_by[idx]
    }

    pub fn provided_by(&self, symbol: &str) -> &[usize] {
        self.provided_by.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn provided_symbols(&self) -> impl Iterator<Item = &str> {
        self.provided_by.keys().map(String::as_str)
    }
}

fn compile_with_feature(record: &WithFeatureSetRecord) -> WithFeatureSet {
    WithFeatureSet::new(
        record.features.iter().cloned(),
        record.not_features.iter().cloned(),
    )
}

fn compile_flag_group(record: &FlagGroupRecord) -> Result<FlagGroup> {
    if !record.flags.is_empty() && !record.flag_groups.is_empty() {
        return Err(FeatureConfigError::InvalidConfiguration(
            "a flag group must contain flags or nested flag groups, not both".to_string(),
        ));
    }
    let guards = FlagGroupGuards {
        iterate_over: record.iterate_over.clone(),
        expand_if_all_available: record.expand_if_all_available.iter().cloned().collect(),
        expand_if_none_available: record.expand_if_none_available.iter().cloned().collect(),
        expand_if_true: record.expand_if_true.clone(),
        expand_if_false: record.expand_if_false.clone(),
        expand_if_equal: record.expand_if_equal.clone(),
    };

    if !record.flag_groups.is_empty() {
        let children = record
            .flag_groups
            .iter()
            .map(compile_flag_group)
            .collect::<Result<Vec<_>>>()?;
        FlagGroup::new(FlagGroupChildren::Groups(children), guards)
    } else {
        let flags = record
            .flags
            .iter()
            .map(|pattern| Flag::compile(pattern))
            .collect::<Result<Vec<_>>>()?;
        FlagGroup::new(FlagGroupChildren::Flags(flags), guards)
    }
}

fn compile_flag_set(record: &FlagSetRecord) -> Result<FlagSet> {
    Ok(FlagSet {
        actions: record.actions.iter().cloned().collect(),
        expand_if_all_available: record.expand_if_all_available.iter().cloned().collect(),
        with_features: record.with_features.iter().map(compile_with_feature).collect(),
        flag_groups: record
            .flag_groups
            .iter()
            .map(compile_flag_group)
            .collect::<Result<Vec<_>>>()?,
    })
}

fn compile_env_set(record: &crate::config::EnvSetRecord) -> Result<EnvSet> {
    Ok(EnvSet {
        actions: record.actions.iter().cloned().collect(),
        env_entries: record
            .env_entries
            .iter()
            .map(|entry| {
                Ok(EnvEntry {
                    key: entry.key.clone(),
                    value: Template::compile(&entry.value)?,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        with_features: record.with_features.iter().map(compile_with_feature).collect(),
    })
}

fn compile_tool(record: &ToolRecord) -> Result<Tool> {
    Ok(Tool {
        path: record.path.clone(),
        execution_requirements: record.execution_requirements.iter().cloned().collect(),
        with_features: record.with_features.iter().map(compile_with_feature).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionConfigRecord, EnvSetRecord, FlagGroupRecord, FlagSetRecord};
    use crate::testutils::feature;

    #[test]
    fn rejects_duplicate_names() {
        let config = ToolchainConfig {
            features: vec![feature("gcc"), feature("gcc")],
            ..Default::default()
        };
        assert!(matches!(
            SelectableGraph::build(&config),
            Err(FeatureConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_dangling_implies_reference() {
        let mut f = feature("a");
        f.implies.push("missing".to_string());
        let config = ToolchainConfig {
            features: vec![f],
            ..Default::default()
        };
        assert!(SelectableGraph::build(&config).is_err());
    }

    #[test]
    fn rejects_mixed_flag_group_children() {
        let mut f = feature("a");
        f.flag_sets.push(FlagSetRecord {
            actions: vec!["c++-compile".to_string()],
            flag_groups: vec![FlagGroupRecord {
                flags: vec!["-c".to_string()],
                flag_groups: vec![FlagGroupRecord::default()],
                ..Default::default()
            }],
            ..Default::default()
        });
        let config = ToolchainConfig {
            features: vec![f],
            ..Default::default()
        };
        assert!(SelectableGraph::build(&config).is_err());
    }

    #[test]
    fn rejects_action_config_flag_set_naming_actions() {
        let config = ToolchainConfig {
            action_configs: vec![ActionConfigRecord {
                config_name: "link".to_string(),
                action_name: "c++-link".to_string(),
                default_enabled: true,
                tools: vec![ToolRecord {
                    path: "/usr/bin/ld".to_string(),
                    execution_requirements: vec![],
                    with_features: vec![],
                }],
                flag_sets: vec![FlagSetRecord {
                    actions: vec!["c++-link".to_string()],
                    ..Default::default()
                }],
                implies: vec![],
            }],
            ..Default::default()
        };
        assert!(SelectableGraph::build(&config).is_err());
    }

    #[test]
    fn builds_relations_by_index() {
        let mut a = feature("a");
        a.implies.push("b".to_string());
        let b = feature("b");
        let mut c = feature("c");
        c.requires.push(vec!["b".to_string()]);

        let config = ToolchainConfig {
            features: vec![a, b, c],
            ..Default::default()
        };
        let graph = SelectableGraph::build(&config).unwrap();

        let a_idx = graph.index_of("a").unwrap();
        let b_idx = graph.index_of("b").unwrap();
        let c_idx = graph.index_of("c").unwrap();

        assert_eq!(graph.implies(a_idx), &[b_idx]);
        assert_eq!(graph.implied_by(b_idx), &[a_idx]);
        assert_eq!(graph.requires(c_idx), &[vec![b_idx]]);
        assert_eq!(graph.required_by(b_idx), &[c_idx]);
    }

    #[test]
    fn compiles_feature_env_sets() {
        let mut f = feature("sysroot");
        f.env_sets.push(EnvSetRecord {
            actions: vec!["c++-link".to_string()],
            with_features: vec![],
            env_entries: vec![],
        });

        let config = ToolchainConfig {
            features: vec![f],
            ..Default::default()
        };
        let graph = SelectableGraph::build(&config).unwrap();
        let idx = graph.index_of("sysroot").unwrap();
        match &graph.selectable(idx).kind {
            SelectableKind::Feature(feature) => assert_eq!(feature.env_sets.len(), 1),
            SelectableKind::ActionConfig(_) => panic!("expected a feature"),
        }
    }
}

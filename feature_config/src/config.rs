// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The in-memory configuration record: the already-deserialized shape of a
//! toolchain description. Parsing the on-disk format is an explicit
//! Non-goal (`spec.md` §1); these types exist so a caller (or a test) can
//! hand the engine a `ToolchainConfig` built however it likes, including
//! via `serde_json::from_str`, the way `alchemist`'s `config::profile`
//! records are modeled with `#[derive(Deserialize)]` even though the
//! surrounding bash-config parsing is bespoke.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolchainConfig {
    #[serde(default)]
    pub features: Vec<FeatureRecord>,
    #[serde(default)]
    pub action_configs: Vec<ActionConfigRecord>,
    #[serde(default)]
    pub artifact_name_patterns: Vec<ArtifactNamePatternRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureRecord {
    pub name: String,
    #[serde(default)]
    pub default_enabled: bool,
    #[serde(default)]
    pub flag_sets: Vec<FlagSetRecord>,
    #[serde(default)]
    pub env_sets: Vec<EnvSetRecord>,
    /// Names of selectables this one implies when enabled.
    #[serde(default)]
    pub implies: Vec<String>,
    /// Disjunction of conjunctions: each inner list of names must be fully
    /// enabled for one clause to be satisfied.
    #[serde(default)]
    pub requires: Vec<Vec<String>>,
    /// Symbols this selectable claims; at most one enabled selectable may
    /// claim a given symbol.
    #[serde(default)]
    pub provides: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionConfigRecord {
    pub config_name: String,
    pub action_name: String,
    #[serde(default)]
    pub default_enabled: bool,
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
    /// Flag sets implicitly scoped to `action_name`; their own `actions`
    /// field must be empty (validated at graph construction).
    #[serde(default)]
    pub flag_sets: Vec<FlagSetRecord>,
    #[serde(default)]
    pub implies: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolRecord {
    pub path: String,
    #[serde(default)]
    pub execution_requirements: Vec<String>,
    #[serde(default)]
    pub with_features: Vec<WithFeatureSetRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WithFeatureSetRecord {
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub not_features: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FlagSetRecord {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub expand_if_all_available: Vec<String>,
    #[serde(default)]
    pub with_features: Vec<WithFeatureSetRecord>,
    #[serde(default)]
    pub flag_groups: Vec<FlagGroupRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FlagGroupRecord {
    /// Flag templates. Mutually exclusive with `flag_groups`.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Nested groups. Mutually exclusive with `flags`.
    #[serde(default)]
    pub flag_groups: Vec<FlagGroupRecord>,
    #[serde(default)]
    pub iterate_over: Option<String>,
    #[serde(default)]
    pub expand_if_all_available: Vec<String>,
    #[serde(default)]
    pub expand_if_none_available: Vec<String>,
    #[serde(default)]
    pub expand_if_true: Option<String>,
    #[serde(default)]
    pub expand_if_false: Option<String>,
    #[serde(default)]
    pub expand_if_equal: Option<(String, String)>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnvSetRecord {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub with_features: Vec<WithFeatureSetRecord>,
    #[serde(default)]
    pub env_entries: Vec<EnvEntryRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvEntryRecord {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactNamePatternRecord {
    pub category: String,
    pub pattern: String,
}

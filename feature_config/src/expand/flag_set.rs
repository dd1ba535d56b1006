// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Flag sets: flag groups filtered by action name and feature context.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::expand::flag_group::FlagGroup;
use crate::expand::with_feature::{any_satisfied, WithFeatureSet};
use crate::variables::{ArtifactExpander, Scope};

#[derive(Debug, Clone)]
pub struct FlagSet {
    pub actions: BTreeSet<String>,
    pub expand_if_all_available: BTreeSet<String>,
    pub with_features: Vec<WithFeatureSet>,
    pub flag_groups: Vec<FlagGroup>,
}

impl FlagSet {
    fn guard_satisfied(&self, scope: &Scope, enabled_features: &BTreeSet<String>) -> bool {
        self.expand_if_all_available
            .iter()
            .all(|name| scope.is_available(name))
            && any_satisfied(&self.with_features, enabled_features)
    }

    fn expand_groups(
        &self,
        scope: &Scope,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        for group in &self.flag_groups {
            group.expand(scope, expander, out)?;
        }
        Ok(())
    }

    /// Expands for a feature's flag set: in addition to the availability
    /// and with-feature guards, the flag set must explicitly list `action`.
    pub fn expand(
        &self,
        action: &str,
        scope: &Scope,
        enabled_features: &BTreeSet<String>,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        if !self.actions.contains(action) {
            return Ok(());
        }
        if !self.guard_satisfied(scope, enabled_features) {
            return Ok(());
        }
        self.expand_groups(scope, expander, out)
    }

    /// Expands an action config's own flag set, which is implicitly scoped
    /// to its action (its `actions` field is validated empty at
    /// construction, so the explicit membership check from `expand` does
    /// not apply here).
    pub fn expand_for_action_config(
        &self,
        scope: &Scope,
        enabled_features: &BTreeSet<String>,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        if !self.guard_satisfied(scope, enabled_features) {
            return Ok(());
        }
        self.expand_groups(scope, expander, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::flag::Flag;
    use crate::expand::flag_group::FlagGroupGuards;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unmatched_action_yields_no_output() {
        let flag_set = FlagSet {
            actions: set(&["c++-compile"]),
            expand_if_all_available: BTreeSet::new(),
            with_features: vec![],
            flag_groups: vec![FlagGroup::flags(
                vec![Flag::compile("-c").unwrap()],
                FlagGroupGuards::default(),
            )],
        };

        let mut out = Vec::new();
        flag_set
            .expand("c++-link", &Scope::new(), &set(&[]), None, &mut out)
            .unwrap();
        assert!(out.is_empty());

        let mut out = Vec::new();
        flag_set
            .expand("c++-compile", &Scope::new(), &set(&[]), None, &mut out)
            .unwrap();
        assert_eq!(out, vec!["-c".to_string()]);
    }

    #[test]
    fn action_config_scoping_skips_action_membership() {
        let flag_set = FlagSet {
            actions: BTreeSet::new(),
            expand_if_all_available: BTreeSet::new(),
            with_features: vec![],
            flag_groups: vec![FlagGroup::flags(
                vec![Flag::compile("-o").unwrap()],
                FlagGroupGuards::default(),
            )],
        };

        let mut out = Vec::new();
        flag_set
            .expand_for_action_config(&Scope::new(), &set(&[]), None, &mut out)
            .unwrap();
        assert_eq!(out, vec!["-o".to_string()]);
    }
}

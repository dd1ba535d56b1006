// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! With-feature predicates: the positive/negative feature-name matcher used
//! to gate flag sets, env sets, and tools.

use std::collections::BTreeSet;

/// A single predicate: satisfied when every name in `features` is enabled
/// and no name in `not_features` is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithFeatureSet {
    pub features: BTreeSet<String>,
    pub not_features: BTreeSet<String>,
}

impl WithFeatureSet {
    pub fn new(
        features: impl IntoIterator<Item = String>,
        not_features: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            features: features.into_iter().collect(),
            not_features: not_features.into_iter().collect(),
        }
    }

    pub fn is_satisfied(&self, enabled_features: &BTreeSet<String>) -> bool {
        self.features.iter().all(|f| enabled_features.contains(f))
            && self.not_features.iter().all(|f| !enabled_features.contains(f))
    }
}

/// A list of predicates is satisfied if at least one predicate is
/// satisfied, or if the list itself is empty.
pub fn any_satisfied(predicates: &[WithFeatureSet], enabled_features: &BTreeSet<String>) -> bool {
    predicates.is_empty() || predicates.iter().any(|p| p.is_satisfied(enabled_features))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_predicate_list_is_satisfied() {
        assert!(any_satisfied(&[], &set(&[])));
    }

    #[test]
    fn positive_and_negative_sets() {
        let predicate = WithFeatureSet::new(["a".to_string()], ["b".to_string()]);
        assert!(predicate.is_satisfied(&set(&["a"])));
        assert!(!predicate.is_satisfied(&set(&["a", "b"])));
        assert!(!predicate.is_satisfied(&set(&["b"])));
    }

    #[test]
    fn list_is_disjunction() {
        let predicates = vec![
            WithFeatureSet::new(["a".to_string()], []),
            WithFeatureSet::new(["b".to_string()], []),
        ];
        assert!(any_satisfied(&predicates, &set(&["b"])));
        assert!(!any_satisfied(&predicates, &set(&["c"])));
    }
}

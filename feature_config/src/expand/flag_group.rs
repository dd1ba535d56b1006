// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Flag groups: ordered children plus conditional and iteration guards.

use std::collections::BTreeSet;

use crate::error::{FeatureConfigError, Result};
use crate::expand::flag::Flag;
use crate::variables::{ArtifactExpander, Scope};

/// A flag group's children are homogeneous: either all flags or all nested
/// groups, never a mix (enforced by `FlagGroup::new`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagGroupChildren {
    Flags(Vec<Flag>),
    Groups(Vec<FlagGroup>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagGroupGuards {
    pub iterate_over: Option<String>,
    pub expand_if_all_available: BTreeSet<String>,
    pub expand_if_none_available: BTreeSet<String>,
    pub expand_if_true: Option<String>,
    pub expand_if_false: Option<String>,
    pub expand_if_equal: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagGroup {
    children: FlagGroupChildren,
    guards: FlagGroupGuards,
}

impl FlagGroup {
    /// `FlagGroupChildren` already rules out mixing flags and nested groups
    /// at the type level; the record-level variant of that check (a raw
    /// configuration record has separate `flags` and `flag_groups` fields
    /// that could both be populated) happens earlier, while compiling the
    /// record into a `FlagGroupChildren`. Returns `Result` for symmetry with
    /// the rest of the compile path rather than because this step can fail.
    pub fn new(children: FlagGroupChildren, guards: FlagGroupGuards) -> Result<Self> {
        Ok(Self { children, guards })
    }

    pub fn flags(children: Vec<Flag>, guards: FlagGroupGuards) -> Self {
        Self {
            children: FlagGroupChildren::Flags(children),
            guards,
        }
    }

    pub fn groups(children: Vec<FlagGroup>, guards: FlagGroupGuards) -> Self {
        Self {
            children: FlagGroupChildren::Groups(children),
            guards,
        }
    }

    /// Evaluates the five guards in declaration order, stopping at the
    /// first that rejects. Unlike unguarded template references, an
    /// unavailable guard variable is not an error: it simply means the
    /// group contributes nothing.
    fn guards_satisfied(&self, scope: &Scope) -> Result<bool> {
        if !self
            .guards
            .expand_if_all_available
            .iter()
            .all(|name| scope.is_available(name))
        {
            return Ok(false);
        }
        if !self
            .guards
            .expand_if_none_available
            .iter()
            .all(|name| !scope.is_available(name))
        {
            return Ok(false);
        }
        if let Some(name) = &self.guards.expand_if_true {
            if !(scope.is_available(name) && scope.is_truthy(name)?) {
                return Ok(false);
            }
        }
        if let Some(name) = &self.guards.expand_if_false {
            if !(scope.is_available(name) && !scope.is_truthy(name)?) {
                return Ok(false);
            }
        }
        if let Some((name, literal)) = &self.guards.expand_if_equal {
            if !(scope.is_available(name) && scope.get_string(name)? == *literal) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn expand_children(
        &self,
        scope: &Scope,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        match &self.children {
            FlagGroupChildren::Flags(flags) => {
                for flag in flags {
                    flag.expand(scope, expander, out)?;
                }
            }
            FlagGroupChildren::Groups(groups) => {
                for group in groups {
                    group.expand(scope, expander, out)?;
                }
            }
        }
        Ok(())
    }

    /// Appends this group's contribution to `out`, preserving declaration
    /// order (and, under `iterateOver`, one full pass of children per
    /// element before advancing to the next).
    pub fn expand(
        &self,
        scope: &Scope,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        if !self.guards_satisfied(scope)? {
            return Ok(());
        }

        match &self.guards.iterate_over {
            None => self.expand_children(scope, expander, out),
            Some(name) => {
                if !scope.is_available(name) {
                    return Err(FeatureConfigError::ExpansionFailed(format!(
                        "iterateOver variable {name:?} is not bound"
                    )));
                }
                for element in scope.get_sequence(name, expander)? {
                    let derived = scope.derive(name.clone(), element);
                    self.expand_children(&derived, expander, out)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableValue;

    fn flag(pattern: &str) -> Flag {
        Flag::compile(pattern).unwrap()
    }

    #[test]
    fn iteration_emits_one_argument_per_element() {
        let group = FlagGroup::flags(
            vec![flag("-I%{include_paths}")],
            FlagGroupGuards {
                iterate_over: Some("include_paths".to_string()),
                ..Default::default()
            },
        );
        let scope = Scope::from_bindings([(
            "include_paths".to_string(),
            VariableValue::sequence([
                VariableValue::string("a"),
                VariableValue::string("b/c"),
            ]),
        )]);

        let mut out = Vec::new();
        group.expand(&scope, None, &mut out).unwrap();
        assert_eq!(out, vec!["-Ia".to_string(), "-Ib/c".to_string()]);
    }

    #[test]
    fn missing_iterate_over_variable_fails() {
        let group = FlagGroup::flags(
            vec![flag("-I%{include_paths}")],
            FlagGroupGuards {
                iterate_over: Some("include_paths".to_string()),
                ..Default::default()
            },
        );
        assert!(group.expand(&Scope::new(), None, &mut Vec::new()).is_err());
    }

    #[test]
    fn expand_if_all_available_guard() {
        let group = FlagGroup::flags(
            vec![flag("-DOPT")],
            FlagGroupGuards {
                expand_if_all_available: BTreeSet::from(["opt".to_string()]),
                ..Default::default()
            },
        );

        let mut out = Vec::new();
        group.expand(&Scope::new(), None, &mut out).unwrap();
        assert!(out.is_empty());

        let scope = Scope::from_bindings([("opt".to_string(), VariableValue::string("yes"))]);
        let mut out = Vec::new();
        group.expand(&scope, None, &mut out).unwrap();
        assert_eq!(out, vec!["-DOPT".to_string()]);
    }

    #[test]
    fn expand_if_true_guard_checks_truthiness() {
        let group = FlagGroup::flags(
            vec![flag("-g")],
            FlagGroupGuards {
                expand_if_true: Some("debug".to_string()),
                ..Default::default()
            },
        );

        let off = Scope::from_bindings([("debug".to_string(), VariableValue::string(""))]);
        let mut out = Vec::new();
        group.expand(&off, None, &mut out).unwrap();
        assert!(out.is_empty());

        let on = Scope::from_bindings([("debug".to_string(), VariableValue::string("1"))]);
        let mut out = Vec::new();
        group.expand(&on, None, &mut out).unwrap();
        assert_eq!(out, vec!["-g".to_string()]);
    }

    #[test]
    fn expand_if_none_available_guard() {
        let group = FlagGroup::flags(
            vec![flag("-DNOOPT")],
            FlagGroupGuards {
                expand_if_none_available: BTreeSet::from(["opt".to_string()]),
                ..Default::default()
            },
        );

        let scope = Scope::from_bindings([("opt".to_string(), VariableValue::string("yes"))]);
        let mut out = Vec::new();
        group.expand(&scope, None, &mut out).unwrap();
        assert!(out.is_empty());

        let mut out = Vec::new();
        group.expand(&Scope::new(), None, &mut out).unwrap();
        assert_eq!(out, vec!["-DNOOPT".to_string()]);
    }

    #[test]
    fn expand_if_false_guard_checks_truthiness() {
        let group = FlagGroup::flags(
            vec![flag("-O0")],
            FlagGroupGuards {
                expand_if_false: Some("debug".to_string()),
                ..Default::default()
            },
        );

        let on = Scope::from_bindings([("debug".to_string(), VariableValue::string("1"))]);
        let mut out = Vec::new();
        group.expand(&on, None, &mut out).unwrap();
        assert!(out.is_empty());

        let off = Scope::from_bindings([("debug".to_string(), VariableValue::string(""))]);
        let mut out = Vec::new();
        group.expand(&off, None, &mut out).unwrap();
        assert_eq!(out, vec!["-O0".to_string()]);

        // Unavailable also fails the guard: `expandIfFalse` requires the
        // variable to be both available and falsy.
        let mut out = Vec::new();
        group.expand(&Scope::new(), None, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn expand_if_equal_guard() {
        let group = FlagGroup::flags(
            vec![flag("-std=c++17")],
            FlagGroupGuards {
                expand_if_equal: Some(("std".to_string(), "c++17".to_string())),
                ..Default::default()
            },
        );

        let matching = Scope::from_bindings([("std".to_string(), VariableValue::string("c++17"))]);
        let mut out = Vec::new();
        group.expand(&matching, None, &mut out).unwrap();
        assert_eq!(out, vec!["-std=c++17".to_string()]);

        let mismatched = Scope::from_bindings([("std".to_string(), VariableValue::string("c++20"))]);
        let mut out = Vec::new();
        group.expand(&mismatched, None, &mut out).unwrap();
        assert!(out.is_empty());

        let mut out = Vec::new();
        group.expand(&Scope::new(), None, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn nested_groups_preserve_order() {
        let inner_a = FlagGroup::flags(vec![flag("a")], FlagGroupGuards::default());
        let inner_b = FlagGroup::flags(vec![flag("b")], FlagGroupGuards::default());
        let outer = FlagGroup::groups(vec![inner_a, inner_b], FlagGroupGuards::default());

        let mut out = Vec::new();
        outer.expand(&Scope::new(), None, &mut out).unwrap();
        assert_eq!(out, vec!["a".to_string(), "b".to_string()]);
    }
}

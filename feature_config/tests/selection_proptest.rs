// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Property-based coverage of the selection fixed point: adding a
//! selectable's own defaults to a request must never change the result
//! (idempotence), and every selectable actually enabled must have its
//! requirement satisfied by the final set (requirement soundness).

use std::collections::BTreeSet;

use feature_config::config::{FeatureRecord, ToolchainConfig};
use feature_config::Engine;
use proptest::prelude::*;

/// A feature with just a name, disabled by default; chain field assignment
/// on the result to fill in `implies`/`requires`.
fn feature(name: &str) -> FeatureRecord {
    FeatureRecord {
        name: name.to_string(),
        default_enabled: false,
        flag_sets: vec![],
        env_sets: vec![],
        implies: vec![],
        requires: vec![],
        provides: vec![],
    }
}

/// Builds a small chain-shaped graph: `feature_0 implies feature_1 implies
/// ... implies feature_{n-1}`, plus one feature, `gated`, that requires
/// `feature_0`. `n` is kept small so the implication chain and the
/// fixed-point loop both stay cheap per proptest case.
fn chain_config(n: usize) -> ToolchainConfig {
    let mut features = Vec::new();
    for i in 0..n {
        let mut f = feature(&format!("feature_{i}"));
        if i + 1 < n {
            f.implies.push(format!("feature_{}", i + 1));
        }
        features.push(f);
    }
    let mut gated = feature("gated");
    gated.requires.push(vec!["feature_0".to_string()]);
    features.push(gated);

    ToolchainConfig {
        features,
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn selection_is_idempotent_under_defaults(n in 1usize..8, requested_first in 0usize..8) {
        let config = chain_config(n);
        let engine = Engine::build(&config).unwrap();

        let requested_name = format!("feature_{}", requested_first % n);
        let requested: BTreeSet<String> = [requested_name.clone()].into_iter().collect();

        let base = engine.get_feature_configuration(requested.clone()).unwrap();

        let mut with_defaults = requested;
        with_defaults.extend(engine.defaults().iter().cloned());
        let widened = engine.get_feature_configuration(with_defaults).unwrap();

        for i in 0..n {
            let name = format!("feature_{i}");
            prop_assert_eq!(base.is_enabled(&name), widened.is_enabled(&name));
        }
    }

    #[test]
    fn requirement_soundness_holds(n in 1usize..8, request_gated in any::<bool>(), request_chain_head in any::<bool>()) {
        let config = chain_config(n);
        let engine = Engine::build(&config).unwrap();

        let mut requested = Vec::new();
        if request_gated {
            requested.push("gated".to_string());
        }
        if request_chain_head {
            requested.push("feature_0".to_string());
        }

        let fc = engine.get_feature_configuration(requested).unwrap();

        if fc.is_enabled("gated") {
            prop_assert!(fc.is_enabled("feature_0"));
        }
    }

    #[test]
    fn implication_monotonicity_holds(n in 1usize..8) {
        let config = chain_config(n);
        let engine = Engine::build(&config).unwrap();
        let fc = engine.get_feature_configuration(["feature_0".to_string()]).unwrap();

        for i in 0..n {
            if fc.is_enabled(&format!("feature_{i}")) {
                for j in i..n {
                    prop_assert!(fc.is_enabled(&format!("feature_{j}")));
                }
            }
        }
    }
}

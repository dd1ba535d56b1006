// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Terse fixture builders for `ToolchainConfig`, so tests can stand up a
//! small graph in a few lines instead of spelling out every `Default`
//! field.

use crate::config::FeatureRecord;

/// A feature with just a name, disabled by default. Chain field assignment
/// on the result to fill in flag sets, `implies`, etc.
pub fn feature(name: &str) -> FeatureRecord {
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

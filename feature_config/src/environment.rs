// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! An ordered, insert-once environment-variable map.
//!
//! §9's open question ("the source's builder throws on duplicate keys;
//! this may be intentional or a latent bug") is resolved by preserving the
//! throw: a second feature writing a key already set by an earlier one
//! fails expansion rather than silently overwriting it. Order of iteration
//! matches declaration/enablement order, matching the determinism
//! guarantee in §5.

use crate::error::{FeatureConfigError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    entries: Vec<(String, String)>,
}

impl Environment {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn insert(&mut self, key: String, value: String) -> Result<()> {
        if self.entries.iter().any(|(k, _)| *k == key) {
            return Err(FeatureConfigError::ExpansionFailed(format!(
                "duplicate environment variable key {key:?}"
            )));
        }
        self.entries.push((key, value));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.entries
    }
}

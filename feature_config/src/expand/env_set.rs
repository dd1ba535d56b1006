// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Env sets: key/value templates filtered the same way flag sets are.

use std::collections::BTreeSet;

use crate::environment::Environment;
use crate::error::Result;
use crate::expand::with_feature::{any_satisfied, WithFeatureSet};
use crate::template::Template;
use crate::variables::{ArtifactExpander, Scope};

#[derive(Debug, Clone)]
pub struct EnvEntry {
    pub key: String,
    pub value: Template,
}

#[derive(Debug, Clone)]
pub struct EnvSet {
    pub actions: BTreeSet<String>,
    pub env_entries: Vec<EnvEntry>,
    pub with_features: Vec<WithFeatureSet>,
}

impl EnvSet {
    pub fn expand(
        &self,
        action: &str,
        scope: &Scope,
        enabled_features: &BTreeSet<String>,
        expander: Option<&dyn ArtifactExpander>,
        env: &mut Environment,
    ) -> Result<()> {
        if !self.actions.contains(action) {
            return Ok(());
        }
        if !any_satisfied(&self.with_features, enabled_features) {
            return Ok(());
        }
        for entry in &self.env_entries {
            let value = entry.value.expand(scope, expander)?;
            env.insert(entry.key.clone(), value)?;
        }
        Ok(())
    }
}

// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Typed errors for the feature configuration engine.
//!
//! Library code returns [`FeatureConfigError`] (built with `thiserror`, the
//! way `resolver.rs`'s `FindBestPackageError` does it); callers that only
//! need to propagate failures up the stack use `anyhow`.

use thiserror::Error;

/// The five error kinds the engine can surface. See the top-level design
/// notes for the propagation policy: `InvalidConfiguration` fails
/// construction, `CollidingProvides` is selection-time, the rest are
/// runtime expansion errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureConfigError {
    /// A static problem in the configuration record: an unknown reference,
    /// a duplicate name, a flag group mixing flags and sub-groups, an
    /// action-config flag set naming actions, or an artifact pattern
    /// referencing an unknown category.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two or more currently-enabled selectables provide the same symbol.
    #[error("selectables {providers:?} collide on provided symbol {symbol:?}")]
    CollidingProvides {
        symbol: String,
        providers: Vec<String>,
    },

    /// A template referenced an unavailable variable, or a guarded
    /// iteration named a variable of the wrong shape, or the environment
    /// builder saw the same key twice.
    #[error("expansion failed: {0}")]
    ExpansionFailed(String),

    /// An enabled action config has no tool whose with-feature set matches
    /// the current enabled features.
    #[error("no tool matches the enabled features for action {action:?}")]
    NoMatchingTool { action: String },

    /// No artifact-name pattern is configured for the requested category.
    #[error("no artifact name pattern configured for category {category:?}")]
    MissingArtifactPattern { category: String },
}

pub type Result<T> = std::result::Result<T, FeatureConfigError>;

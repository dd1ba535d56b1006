// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! A feature selection and command-line/environment expansion engine for a
//! build toolchain description: given a declarative set of named features
//! and action configs with implication, requirement, and provision
//! constraints, resolves which subset is enabled for a request and expands
//! the result into command lines, environments, and tool resolutions for a
//! given build action.
//!
//! This crate assumes its input — a [`config::ToolchainConfig`] — is
//! already deserialized; it does not parse any on-disk configuration
//! format, execute the command lines it produces, or interact with a
//! filesystem or dependency-tracking framework. Those concerns belong to
//! the caller wiring this engine into a larger build-action scheduler.

pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod expand;
pub mod graph;
pub mod template;
pub mod variables;

pub(crate) mod testutils;

pub use engine::{Engine, FeatureConfiguration, ResolvedTool};
pub use error::{FeatureConfigError, Result};
pub use graph::SelectableGraph;
pub use variables::{ArtifactExpander, Scope, VariableValue};

// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The expandable tree: flags, flag groups, flag sets, env sets, and the
//! with-feature predicate they share. Each type implements the same
//! `expand(scope, expander, out)` contract described in `spec.md` §4.3.

pub mod env_set;
pub mod flag;
pub mod flag_group;
pub mod flag_set;
pub mod with_feature;

pub use env_set::{EnvEntry, EnvSet};
pub use flag::Flag;
pub use flag_group::{FlagGroup, FlagGroupChildren, FlagGroupGuards};
pub use flag_set::FlagSet;
pub use with_feature::WithFeatureSet;

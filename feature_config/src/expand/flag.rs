// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The smallest expandable unit: one template producing one argument.

use crate::error::Result;
use crate::template::Template;
use crate::variables::{ArtifactExpander, Scope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    template: Template,
}

impl Flag {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    pub fn compile(pattern: &str) -> Result<Self> {
        Ok(Self::new(Template::compile(pattern)?))
    }

    /// Appends exactly one argument, the concatenation of the template's
    /// chunk expansions, to `out`.
    pub fn expand(
        &self,
        scope: &Scope,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        out.push(self.template.expand(scope, expander)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableValue;

    #[test]
    fn expands_to_single_argument() {
        let flag = Flag::compile("-I%{path}").unwrap();
        let scope = Scope::from_bindings([("path".to_string(), VariableValue::string("a/b"))]);
        let mut out = Vec::new();
        flag.expand(&scope, None, &mut out).unwrap();
        assert_eq!(out, vec!["-Ia/b".to_string()]);
    }
}

// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! String templates: a pattern compiled once into literal/reference chunks,
//! expanded many times against different scopes.
//!
//! Reference syntax mirrors the toolchain description's flag-template
//! convention: `%{name}` or `%{name.field.subfield}`; a literal `%` is
//! written as `%%`. Compiled with `nom`, the way the teacher's other
//! small-fixed-grammar parsers are (`dependency/requse/parser.rs`,
//! `bash/vars.rs`) rather than by hand-rolling a scanner.

use crate::error::{FeatureConfigError, Result};
use crate::variables::{ArtifactExpander, Scope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Literal(String),
    VariableRef(String),
}

/// An ordered list of chunks. Two templates are value-equal iff their
/// chunk lists are equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    chunks: Vec<Chunk>,
}

impl Template {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Compiles a pattern string into a template. Malformed references
    /// (unterminated `%{`, a bare trailing `%`) surface as
    /// `InvalidConfiguration`.
    pub fn compile(pattern: &str) -> Result<Template> {
        let (remaining, chunks) = parser::template(pattern).map_err(|err| {
            FeatureConfigError::InvalidConfiguration(format!(
                "malformed variable reference in pattern {pattern:?}: {err:?}"
            ))
        })?;
        if !remaining.is_empty() {
            return Err(FeatureConfigError::InvalidConfiguration(format!(
                "dangling '%' in pattern {pattern:?}"
            )));
        }
        Ok(Template { chunks })
    }

    /// True iff this template is a single variable reference with no
    /// surrounding literal text. Purely a performance hint for callers
    /// (e.g. to skip an intermediate `String` allocation); it carries no
    /// separate representation.
    pub fn is_single_chunk(&self) -> bool {
        self.chunks.len() == 1
    }

    /// Concatenates the expansion of every chunk. A reference to an
    /// unavailable variable fails with `ExpansionFailed`.
    pub fn expand(&self, scope: &Scope, expander: Option<&dyn ArtifactExpander>) -> Result<String> {
        let mut out = String::new();
        for chunk in &self.chunks {
            match chunk {
                Chunk::Literal(s) => out.push_str(s),
                Chunk::VariableRef(name) => {
                    let _ = expander; // accessor resolution needs no artifacts
                    out.push_str(&scope.get_string(name)?);
                }
            }
        }
        Ok(out)
    }
}

mod parser {
    use nom::{
        branch::alt,
        bytes::complete::{tag, take_while1},
        combinator::map,
        multi::{many0, many1},
        sequence::delimited,
        IResult,
    };

    use super::Chunk;

    fn is_literal_char(c: char) -> bool {
        c != '%'
    }

    fn escaped_percent(input: &str) -> IResult<&str, String> {
        map(tag("%%"), |_| "%".to_string())(input)
    }

    fn plain_run(input: &str) -> IResult<&str, String> {
        map(take_while1(is_literal_char), |s: &str| s.to_string())(input)
    }

    fn literal_chunk(input: &str) -> IResult<&str, Chunk> {
        map(many1(alt((escaped_percent, plain_run))), |parts| {
            Chunk::Literal(parts.concat())
        })(input)
    }

    fn variable_name(input: &str) -> IResult<&str, &str> {
        take_while1(|c: char| c != '}')(input)
    }

    fn variable_ref(input: &str) -> IResult<&str, Chunk> {
        map(
            delimited(tag("%{"), variable_name, tag("}")),
            |name: &str| Chunk::VariableRef(name.to_string()),
        )(input)
    }

    fn chunk(input: &str) -> IResult<&str, Chunk> {
        alt((variable_ref, literal_chunk))(input)
    }

    /// Parses a whole pattern into its chunk list. Leftover input (an
    /// unterminated `%{` or a bare trailing `%`) is returned to the caller
    /// rather than failing here, so `Template::compile` can report it with
    /// the full pattern for context.
    pub(super) fn template(input: &str) -> IResult<&str, Vec<Chunk>> {
        many0(chunk)(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableValue;

    #[test]
    fn compiles_literal_and_reference_chunks() {
        let template = Template::compile("-I%{include_paths}").unwrap();
        assert_eq!(
            template.chunks(),
            &[
                Chunk::Literal("-I".to_string()),
                Chunk::VariableRef("include_paths".to_string()),
            ]
        );
    }

    #[test]
    fn expands_dotted_accessor() {
        let template = Template::compile("%{file.path}").unwrap();
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("path".to_string(), VariableValue::string("out/libfoo.a"));
        let scope = Scope::from_bindings([("file".to_string(), VariableValue::Structure(fields))]);
        assert_eq!(template.expand(&scope, None).unwrap(), "out/libfoo.a");
    }

    #[test]
    fn escaped_percent_is_literal() {
        let template = Template::compile("100%%").unwrap();
        assert_eq!(template.expand(&Scope::new(), None).unwrap(), "100%");
    }

    #[test]
    fn unavailable_reference_fails_expansion() {
        let template = Template::compile("%{missing}").unwrap();
        assert!(template.expand(&Scope::new(), None).is_err());
    }

    #[test]
    fn unterminated_reference_is_invalid_configuration() {
        assert!(matches!(
            Template::compile("%{oops"),
            Err(FeatureConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn dangling_percent_is_invalid_configuration() {
        assert!(matches!(
            Template::compile("100% done"),
            Err(FeatureConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn empty_reference_is_invalid_configuration() {
        assert!(matches!(
            Template::compile("%{}"),
            Err(FeatureConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn single_chunk_detection() {
        assert!(Template::compile("%{x}").unwrap().is_single_chunk());
        assert!(!Template::compile("-I%{x}").unwrap().is_single_chunk());
    }
}

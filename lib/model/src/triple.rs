use crate::{PrefixTable, TokenKind};
use std::fmt::Write;

/// A triple of tokens used by write operations.
///
/// Each position holds a token as accepted by [`PrefixTable::normalize`]: IRIs, prefixed names,
/// literals (see [`literal`]), blank nodes or variables. Variables (and blank nodes) turn a triple
/// into a pattern, which is only meaningful for deletions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    /// Creates a new [`Triple`].
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Returns whether any position of this triple is a variable or a blank node.
    pub fn is_pattern(&self, prefixes: &PrefixTable) -> bool {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .any(|token| TokenKind::classify(token.trim(), prefixes).is_pattern())
    }

    /// Writes the triple as `s p o` with every operand normalized.
    ///
    /// Returns [`None`] if one of the operands is empty.
    pub fn to_sparql(&self, prefixes: &PrefixTable) -> Option<String> {
        Some(format!(
            "{} {} {}",
            prefixes.normalize(&self.subject)?,
            prefixes.normalize(&self.predicate)?,
            prefixes.normalize(&self.object)?
        ))
    }
}

impl<S, P, O> From<(S, P, O)> for Triple
where
    S: Into<String>,
    P: Into<String>,
    O: Into<String>,
{
    fn from((subject, predicate, object): (S, P, O)) -> Self {
        Triple::new(subject, predicate, object)
    }
}

/// Creates a single-quoted literal token for `value`.
///
/// Quotes, backslashes and line breaks are escaped so that user input can be embedded into a query
/// without changing its structure.
pub fn literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Creates a literal token for `value` typed with `datatype` (an IRI or a prefixed name).
pub fn typed_literal(value: &str, datatype: &str, prefixes: &PrefixTable) -> String {
    let mut out = literal(value);
    if let Some(datatype) = prefixes.normalize(datatype) {
        let _ = write!(out, "^^{datatype}");
    }
    out
}

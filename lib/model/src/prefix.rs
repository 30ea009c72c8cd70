use crate::token::{is_valid_local_name, is_valid_prefix_name, TokenKind};
use crate::vocab::{owl, rdf, rdfs, sh, xsd};
use crate::PrefixError;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The short name of the prefix that is bound to the base URI of a data bundle.
pub const BASE_PREFIX: &str = "base";

/// Prefixes that are registered in every [`PrefixTable`].
pub const STANDARD_PREFIXES: [(&str, &str); 5] = [
    ("rdf", rdf::NAMESPACE),
    ("rdfs", rdfs::NAMESPACE),
    ("xsd", xsd::NAMESPACE),
    ("owl", owl::NAMESPACE),
    ("sh", sh::NAMESPACE),
];

/// A binding of a short name to a namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prefix {
    /// The short name, without the trailing colon.
    pub short: String,
    /// The namespace the short name expands to.
    pub long: String,
}

impl Prefix {
    /// Creates a new [`Prefix`].
    pub fn new(short: impl Into<String>, long: impl Into<String>) -> Self {
        Self {
            short: short.into(),
            long: long.into(),
        }
    }
}

/// A bidirectional registry of prefixes.
///
/// Short names are unique within a table. Registering a short name twice replaces its namespace.
/// The table keeps the registration order, which is also the order of the generated `PREFIX`
/// declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefixTable {
    prefixes: Vec<Prefix>,
}

impl PrefixTable {
    /// Creates a table with the [`BASE_PREFIX`] bound to `base_uri` and the
    /// [`STANDARD_PREFIXES`].
    pub fn new(base_uri: impl Into<String>) -> Self {
        let mut prefixes = vec![Prefix::new(BASE_PREFIX, base_uri)];
        prefixes.extend(
            STANDARD_PREFIXES
                .iter()
                .map(|(short, long)| Prefix::new(*short, *long)),
        );
        Self { prefixes }
    }

    /// Creates a table without any prefix.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers `short` as an abbreviation of `long`, replacing an existing binding.
    pub fn add(&mut self, short: &str, long: &str) -> Result<(), PrefixError> {
        if !is_valid_prefix_name(short) {
            return Err(PrefixError::InvalidShortName(short.to_owned()));
        }
        if long.trim().is_empty() {
            return Err(PrefixError::EmptyNamespace(short.to_owned()));
        }

        let long = long.trim().trim_start_matches('<').trim_end_matches('>');
        match self.prefixes.iter_mut().find(|p| p.short == short) {
            Some(existing) => long.clone_into(&mut existing.long),
            None => self.prefixes.push(Prefix::new(short, long)),
        }
        Ok(())
    }

    /// Returns the namespace bound to `short`.
    pub fn get(&self, short: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|p| p.short == short)
            .map(|p| p.long.as_str())
    }

    /// Returns the namespace bound to the [`BASE_PREFIX`].
    pub fn base(&self) -> Option<&str> {
        self.get(BASE_PREFIX)
    }

    /// Returns the registered short names.
    pub fn shorts(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(|p| p.short.as_str())
    }

    /// Returns the registered prefixes in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Prefix> {
        self.prefixes.iter()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Splits a prefixed name into its prefix and its local part.
    ///
    /// Returns [`None`] if `token` does not start with a registered short name followed by `:`.
    pub fn split_prefixed<'token>(&self, token: &'token str) -> Option<(&Prefix, &'token str)> {
        let (short, local) = token.split_once(':')?;
        self.prefixes
            .iter()
            .find(|p| p.short == short)
            .map(|p| (p, local))
    }

    /// Returns whether `token` is a prefixed name of a registered prefix.
    pub fn is_prefixed(&self, token: &str) -> bool {
        self.split_prefixed(token.trim()).is_some()
    }

    /// Abbreviates an IRI (with or without angle brackets) using the prefix with the longest
    /// matching namespace.
    ///
    /// Tokens that are not covered by any namespace are returned unchanged, which also makes the
    /// operation idempotent.
    pub fn shorten(&self, token: &str) -> String {
        let trimmed = token.trim();
        let iri = strip_angle_brackets(trimmed);
        match self.longest_namespace_of(iri) {
            Some(prefix) => format!("{}:{}", prefix.short, &iri[prefix.long.len()..]),
            None => trimmed.to_owned(),
        }
    }

    /// Expands a prefixed name into an IRI. IRIs in angle brackets lose their brackets. Other
    /// tokens are returned unchanged.
    pub fn lengthen(&self, token: &str) -> String {
        let trimmed = token.trim();
        if trimmed.starts_with('<') {
            return strip_angle_brackets(trimmed).to_owned();
        }
        match self.split_prefixed(trimmed) {
            Some((prefix, local)) => format!("{}{local}", prefix.long),
            None => trimmed.to_owned(),
        }
    }

    /// Formats `token` so that it can be written into a SPARQL query or a Turtle document.
    ///
    /// The rules are applied in order:
    /// 1. Empty tokens yield [`None`].
    /// 2. Prefixed names of registered prefixes are kept.
    /// 3. Quoted and numeric literals are kept.
    /// 4. The keyword `a` and variables are kept.
    /// 5. Blank nodes are kept.
    /// 6. Everything else is an IRI. Whitespace is removed and the IRI is abbreviated if a
    ///    registered namespace covers it, otherwise it is wrapped in angle brackets.
    ///
    /// IRIs that cannot be written in SPARQL (see [`is_valid_iri`]) yield [`None`].
    ///
    /// Prefixed names whose local part cannot be written unescaped are expanded (and vice versa),
    /// so two tokens that denote the same IRI are always normalized to the same text.
    pub fn normalize(&self, token: &str) -> Option<String> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        let normalized = match TokenKind::classify(token, self) {
            TokenKind::PrefixedName => match self.split_prefixed(token) {
                Some((prefix, local)) if !is_valid_local_name(local) => {
                    let iri = format!("{}{local}", prefix.long);
                    if !is_valid_iri(&iri) {
                        return None;
                    }
                    format!("<{iri}>")
                }
                _ => token.to_owned(),
            },
            TokenKind::Literal
            | TokenKind::Keyword
            | TokenKind::Variable
            | TokenKind::BlankNode => token.to_owned(),
            TokenKind::Iri => {
                let iri = strip_angle_brackets(token)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>();
                if !is_valid_iri(&iri) {
                    return None;
                }
                match self.longest_namespace_of(&iri) {
                    Some(prefix) if is_valid_local_name(&iri[prefix.long.len()..]) => {
                        format!("{}:{}", prefix.short, &iri[prefix.long.len()..])
                    }
                    _ => format!("<{iri}>"),
                }
            }
        };
        Some(normalized)
    }

    /// Renders the table as SPARQL `PREFIX` declarations.
    pub fn to_sparql(&self) -> String {
        self.prefixes.iter().fold(String::new(), |mut out, p| {
            let _ = writeln!(out, "PREFIX {}: <{}>", p.short, p.long);
            out
        })
    }

    /// Renders the table as Turtle `@prefix` directives.
    pub fn to_turtle(&self) -> String {
        self.prefixes.iter().fold(String::new(), |mut out, p| {
            let _ = writeln!(out, "@prefix {}: <{}> .", p.short, p.long);
            out
        })
    }

    fn longest_namespace_of(&self, iri: &str) -> Option<&Prefix> {
        self.prefixes
            .iter()
            .filter(|p| !p.long.is_empty() && iri.starts_with(p.long.as_str()))
            .max_by_key(|p| p.long.len())
    }
}

impl<'table> IntoIterator for &'table PrefixTable {
    type Item = &'table Prefix;
    type IntoIter = std::slice::Iter<'table, Prefix>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Prefix> for PrefixTable {
    fn from_iter<T: IntoIterator<Item = Prefix>>(iter: T) -> Self {
        let mut table = PrefixTable::empty();
        for prefix in iter {
            match table.prefixes.iter_mut().find(|p| p.short == prefix.short) {
                Some(existing) => existing.long = prefix.long,
                None => table.prefixes.push(prefix),
            }
        }
        table
    }
}

/// Returns whether `iri` can be written between angle brackets in SPARQL and Turtle.
pub fn is_valid_iri(iri: &str) -> bool {
    !iri.is_empty()
        && !iri.chars().any(|c| {
            c.is_whitespace()
                || c.is_control()
                || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
        })
}

fn strip_angle_brackets(token: &str) -> &str {
    token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PrefixTable {
        let mut table = PrefixTable::new("http://ex.org/");
        table.add("crm", "http://www.cidoc-crm.org/cidoc-crm/").unwrap();
        table
    }

    #[test]
    fn test_normalize_examples() {
        let prefixes = table();
        assert_eq!(prefixes.normalize("rdfs:label").as_deref(), Some("rdfs:label"));
        assert_eq!(
            prefixes.normalize("http://ex.org/p/42").as_deref(),
            Some("<http://ex.org/p/42>")
        );
        assert_eq!(prefixes.normalize("'hi'").as_deref(), Some("'hi'"));
        assert_eq!(prefixes.normalize("?x").as_deref(), Some("?x"));
        assert_eq!(prefixes.normalize("a").as_deref(), Some("a"));
        assert_eq!(prefixes.normalize("123").as_deref(), Some("123"));
        assert_eq!(prefixes.normalize("_:b1").as_deref(), Some("_:b1"));
        assert_eq!(prefixes.normalize("  "), None);
    }

    #[test]
    fn test_normalize_rejects_invalid_iris() {
        let prefixes = table();
        assert_eq!(prefixes.normalize("base:c - http://ex.org/b"), None);
        assert_eq!(prefixes.normalize("http://ex.org/a{b}"), None);
        assert_eq!(prefixes.normalize("<http://ex.org/\"x\">"), None);
        assert_eq!(
            prefixes.normalize("<http://ex.org/ e1>").as_deref(),
            Some("base:e1")
        );
        assert!(!is_valid_iri("http://ex.org/a|b"));
        assert!(is_valid_iri("http://ex.org/caf%C3%A9"));
    }

    #[test]
    fn test_normalize_wraps_and_strips_whitespace() {
        let prefixes = table();
        assert_eq!(
            prefixes.normalize(" http://other.org/a b ").as_deref(),
            Some("<http://other.org/ab>")
        );
        assert_eq!(
            prefixes.normalize("<http://ex.org/e1>").as_deref(),
            Some("base:e1")
        );
        assert_eq!(
            prefixes.normalize("base:p/42").as_deref(),
            Some("<http://ex.org/p/42>")
        );
    }

    #[test]
    fn test_shorten_prefers_longest_namespace() {
        let mut prefixes = table();
        prefixes.add("people", "http://ex.org/people/").unwrap();
        assert_eq!(prefixes.shorten("<http://ex.org/people/alice>"), "people:alice");
        assert_eq!(prefixes.shorten("http://ex.org/thing"), "base:thing");
        assert_eq!(prefixes.shorten("people:alice"), "people:alice");
        assert_eq!(prefixes.shorten("'http://ex.org/x'"), "'http://ex.org/x'");
    }

    #[test]
    fn test_lengthen() {
        let prefixes = table();
        assert_eq!(
            prefixes.lengthen("rdfs:label"),
            "http://www.w3.org/2000/01/rdf-schema#label"
        );
        assert_eq!(prefixes.lengthen("<http://a.org/b>"), "http://a.org/b");
        assert_eq!(prefixes.lengthen("unknown:b"), "unknown:b");
    }

    #[test]
    fn test_round_trip_through_shorten_and_lengthen() {
        let prefixes = table();
        for token in [
            "rdfs:label",
            "http://ex.org/p/42",
            "<http://ex.org/e1>",
            "crm:E21_Person",
            "http://unknown.org/x",
            "'hi'",
            "?x",
            "a",
            "_:b0",
            "12",
        ] {
            let round_tripped = prefixes.lengthen(&prefixes.shorten(token));
            assert_eq!(
                prefixes.normalize(&round_tripped),
                prefixes.normalize(token),
                "round trip of {token}"
            );
        }
    }

    #[test]
    fn test_add_replaces_existing_binding() {
        let mut prefixes = table();
        prefixes.add("base", "http://new.org/").unwrap();
        assert_eq!(prefixes.base(), Some("http://new.org/"));
        assert_eq!(prefixes.shorts().filter(|s| *s == "base").count(), 1);
    }

    #[test]
    fn test_add_rejects_invalid_prefixes() {
        let mut prefixes = table();
        assert_eq!(
            prefixes.add("1x", "http://a.org/"),
            Err(PrefixError::InvalidShortName("1x".to_owned()))
        );
        assert_eq!(
            prefixes.add("x", " "),
            Err(PrefixError::EmptyNamespace("x".to_owned()))
        );
    }

    #[test]
    fn test_to_sparql_and_turtle() {
        let mut prefixes = PrefixTable::empty();
        prefixes.add("base", "http://ex.org/").unwrap();
        prefixes.add("rdfs", rdfs::NAMESPACE).unwrap();
        insta::assert_snapshot!(prefixes.to_sparql(), @r"
        PREFIX base: <http://ex.org/>
        PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
        ");
        insta::assert_snapshot!(prefixes.to_turtle(), @r"
        @prefix base: <http://ex.org/> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        ");
    }
}

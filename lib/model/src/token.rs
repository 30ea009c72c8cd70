use crate::PrefixTable;

/// The syntactic category of a user-supplied token.
///
/// Tokens are the operands of every query composed by Logre. They are classified before they are
/// written into a query so that each category can be formatted accordingly (see
/// [`PrefixTable::normalize`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A prefixed name (`short:local`) whose prefix is registered in the table.
    PrefixedName,
    /// A quoted literal (`'…'`, `"…"`) or a numeric literal.
    Literal,
    /// A SPARQL variable (`?x`).
    Variable,
    /// The keyword `a`.
    Keyword,
    /// A blank node (`_:b`).
    BlankNode,
    /// Anything else. Will be written as an absolute IRI.
    Iri,
}

impl TokenKind {
    /// Classifies a trimmed, non-empty `token` against `prefixes`.
    pub fn classify(token: &str, prefixes: &PrefixTable) -> Self {
        if prefixes.split_prefixed(token).is_some() {
            TokenKind::PrefixedName
        } else if is_quoted_literal(token) || is_numeric_literal(token) {
            TokenKind::Literal
        } else if token == "a" {
            TokenKind::Keyword
        } else if token.starts_with('?') || token.starts_with('$') {
            TokenKind::Variable
        } else if token.starts_with("_:") {
            TokenKind::BlankNode
        } else {
            TokenKind::Iri
        }
    }

    /// Returns whether tokens of this kind act as pattern variables in a `DELETE WHERE`.
    pub fn is_pattern(self) -> bool {
        matches!(self, TokenKind::Variable | TokenKind::BlankNode)
    }
}

fn is_quoted_literal(token: &str) -> bool {
    token.starts_with('\'') || token.starts_with('"')
}

/// Returns whether `token` is an integer or a decimal/double written in SPARQL syntax.
///
/// `f64::from_str` also accepts `inf` or `NaN`, which are not literals in SPARQL.
pub fn is_numeric_literal(token: &str) -> bool {
    if token.parse::<i64>().is_ok() {
        return true;
    }
    token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && token.parse::<f64>().is_ok()
}

/// Returns whether `local` can be written after `short:` without escaping.
///
/// This is a conservative subset of the `PN_LOCAL` production shared by SPARQL and Turtle. Local
/// names outside of this subset are written as full IRIs instead.
pub fn is_valid_local_name(local: &str) -> bool {
    let Some(first) = local.chars().next() else {
        return true;
    };
    if !(first.is_ascii_alphanumeric() || first == '_') || local.ends_with('.') {
        return false;
    }
    local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Returns whether `short` can be used as a prefix name (`PN_PREFIX`).
pub fn is_valid_prefix_name(short: &str) -> bool {
    let Some(first) = short.chars().next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && !short.ends_with('.')
        && short
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PrefixTable {
        PrefixTable::new("http://ex.org/")
    }

    #[test]
    fn test_classify() {
        let prefixes = table();
        assert_eq!(TokenKind::classify("rdfs:label", &prefixes), TokenKind::PrefixedName);
        assert_eq!(TokenKind::classify("'hi'", &prefixes), TokenKind::Literal);
        assert_eq!(TokenKind::classify("\"hi\"@en", &prefixes), TokenKind::Literal);
        assert_eq!(TokenKind::classify("123", &prefixes), TokenKind::Literal);
        assert_eq!(TokenKind::classify("-1.5e3", &prefixes), TokenKind::Literal);
        assert_eq!(TokenKind::classify("a", &prefixes), TokenKind::Keyword);
        assert_eq!(TokenKind::classify("?x", &prefixes), TokenKind::Variable);
        assert_eq!(TokenKind::classify("_:b0", &prefixes), TokenKind::BlankNode);
        assert_eq!(TokenKind::classify("http://ex.org/e1", &prefixes), TokenKind::Iri);
        assert_eq!(TokenKind::classify("crm:E21", &prefixes), TokenKind::Iri);
    }

    #[test]
    fn test_numeric_literal_rejects_float_keywords() {
        assert!(!is_numeric_literal("inf"));
        assert!(!is_numeric_literal("NaN"));
        assert!(!is_numeric_literal("e"));
        assert!(is_numeric_literal("42"));
        assert!(is_numeric_literal("4.2"));
    }

    #[test]
    fn test_local_names() {
        assert!(is_valid_local_name("label"));
        assert!(is_valid_local_name("E21_Person"));
        assert!(is_valid_local_name("42"));
        assert!(is_valid_local_name(""));
        assert!(!is_valid_local_name("p/42"));
        assert!(!is_valid_local_name("a#b"));
        assert!(!is_valid_local_name("end."));
        assert!(!is_valid_local_name("-start"));
    }
}

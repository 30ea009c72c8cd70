#![cfg(test)]

use anyhow::Result;
use logre_model::PrefixTable;

fn table() -> Result<PrefixTable> {
    let mut prefixes = PrefixTable::empty();
    prefixes.add("rdfs", "http://www.w3.org/2000/01/rdf-schema#")?;
    prefixes.add("base", "http://ex.org/")?;
    Ok(prefixes)
}

#[test]
fn normalize_tokens() -> Result<()> {
    let prefixes = table()?;
    let cases = [
        ("rdfs:label", "rdfs:label"),
        ("http://ex.org/p/42", "<http://ex.org/p/42>"),
        ("'hi'", "'hi'"),
        ("?x", "?x"),
        ("a", "a"),
        ("123", "123"),
    ];
    for (token, expected) in cases {
        assert_eq!(
            prefixes.normalize(token).as_deref(),
            Some(expected),
            "normalizing {token}"
        );
    }
    assert_eq!(prefixes.shorten("http://ex.org/p/42"), "base:p/42");
    assert_eq!(prefixes.normalize(""), None);
    Ok(())
}

#[test]
fn shorten_lengthen_round_trip() -> Result<()> {
    let prefixes = table()?;
    let tokens = [
        "rdfs:label",
        "http://www.w3.org/2000/01/rdf-schema#comment",
        "<http://www.w3.org/2000/01/rdf-schema#comment>",
        "http://ex.org/e1",
        "base:e1",
        "http://ex.org/p/42",
        "<http://ex.org/p/42>",
        "http://other.org/x",
        "base:p/42",
        "'hi'",
        "?x",
        "_:b0",
        "a",
        "123",
    ];
    for token in tokens {
        let round_trip = prefixes.lengthen(&prefixes.shorten(token));
        assert_eq!(
            prefixes.normalize(&round_trip),
            prefixes.normalize(token),
            "round trip of {token}"
        );
    }
    Ok(())
}

#[test]
fn prefixed_iris_re_lengthen() -> Result<()> {
    let prefixes = table()?;
    for prefix in prefixes.iter() {
        let iri = format!("{}local", prefix.long);
        let short = prefixes.shorten(&format!("<{iri}>"));
        assert_eq!(short, format!("{}:local", prefix.short));
        assert_eq!(prefixes.lengthen(&short), iri);
    }
    Ok(())
}

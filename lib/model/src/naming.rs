use std::borrow::Cow;

/// Converts a human-readable name into `snake_case`.
///
/// Every run of characters that are not ASCII alphanumeric becomes a single underscore. Leading and
/// trailing underscores are removed. Used for bundle keys and data table column names.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut previous_lower = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && previous_lower && !out.ends_with('_') {
                out.push('_');
            }
            previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c.to_ascii_lowercase());
        } else {
            previous_lower = false;
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Returns the part of an IRI or prefixed name after the last `#`, `/` or `:`.
pub fn local_name(uri: &str) -> &str {
    let uri = uri.trim_end_matches('>');
    uri.rsplit(['#', '/', ':']).next().unwrap_or(uri)
}

/// Makes sure that a label can never be mistaken for an integer by consumers that treat integer
/// node identifiers specially.
///
/// Labels that parse as integers get a trailing no-break space.
pub fn defuse_numeric_label(label: &str) -> Cow<'_, str> {
    if label.trim().parse::<i64>().is_ok() {
        Cow::Owned(format!("{label}\u{a0}"))
    } else {
        Cow::Borrowed(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("My Data Bundle"), "my_data_bundle");
        assert_eq!(snake_case("Name (xsd:string)"), "name_xsd_string");
        assert_eq!(snake_case("hasParent"), "has_parent");
        assert_eq!(snake_case("  --weird--  "), "weird");
        assert_eq!(snake_case("E21 Person"), "e21_person");
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("http://ex.org/a#b"), "b");
        assert_eq!(local_name("crm:E21"), "E21");
        assert_eq!(local_name("<http://ex.org/p/42>"), "42");
    }

    #[test]
    fn test_defuse_numeric_label() {
        assert_eq!(defuse_numeric_label("42"), "42\u{a0}");
        assert_eq!(defuse_numeric_label("Alice"), "Alice");
        assert!(defuse_numeric_label("-7").parse::<i64>().is_err());
    }
}

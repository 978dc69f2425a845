//! Quoting for identifiers and literals spliced into catalog queries.
//!
//! AGE only accepts the graph name and node labels as literal query text, so
//! they cannot be bound as parameters.

/// Quote a string as a SQL literal: `it's` becomes `'it''s'`.
pub fn sql_literal(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    for c in s.chars() {
        if c == '\'' {
            result.push('\'');
        }
        result.push(c);
    }
    result.push('\'');
    result
}

/// Quote a Cypher label or property name with backticks.
pub fn cypher_identifier(s: &str) -> String {
    format!("`{}`", s.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("users", "'users'")]
    #[case("o'brien", "'o''brien'")]
    #[case("", "''")]
    fn test_sql_literal(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sql_literal(input), expected);
    }

    #[rstest]
    fn test_cypher_identifier_basic() {
        assert_eq!(cypher_identifier("Person"), "`Person`");
    }

    #[rstest]
    fn test_cypher_identifier_with_backtick() {
        assert_eq!(cypher_identifier("we`ird"), "`we``ird`");
    }
}

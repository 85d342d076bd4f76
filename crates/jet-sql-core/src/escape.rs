//! Identifier quoting and `LIKE` pattern escaping.

use crate::dialect::{DialectRules, IdentifierQuote};

/// Characters with wildcard meaning inside a Jet `LIKE` pattern.
pub const JET_WILDCARDS: &[char] = &['%', '_', '[', ']', '^'];

impl DialectRules {
    /// Quotes an identifier.
    ///
    /// The closing quote character is doubled inside the name. Length is not
    /// checked; the engine reports names that are too long.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        match self.identifier_quote {
            IdentifierQuote::Brackets => format!("[{}]", name.replace(']', "]]")),
            IdentifierQuote::Backticks => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// Quotes each part of a multi-part name and joins them with `.`.
    #[must_use]
    pub fn quote_qualified(&self, parts: &[&str]) -> String {
        parts
            .iter()
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Escapes every wildcard character of `pattern` so it matches literally.
    ///
    /// Returns the escaped pattern and the escape character that has to be
    /// named in the `ESCAPE` clause. The escape character itself is escaped
    /// too.
    #[must_use]
    pub fn escape_like_pattern(&self, pattern: &str, wildcards: &[char]) -> (String, char) {
        let escape = self.like_escape;
        let mut escaped = String::with_capacity(pattern.len());
        for c in pattern.chars() {
            if c == escape || wildcards.contains(&c) {
                escaped.push(escape);
            }
            escaped.push(c);
        }
        (escaped, escape)
    }

    /// Builds a `LIKE` right-hand side for a literal search string.
    ///
    /// `leading` and `trailing` add the `%` anchors. The `ESCAPE` clause is
    /// only appended when something was escaped.
    #[must_use]
    pub fn like_pattern_literal(&self, search: &str, leading: bool, trailing: bool) -> String {
        let (escaped, escape) = self.escape_like_pattern(search, JET_WILDCARDS);
        let needs_escape = escaped.len() != search.len();
        let mut pattern = String::with_capacity(escaped.len() + 2);
        if leading {
            pattern.push('%');
        }
        pattern.push_str(&escaped);
        if trailing {
            pattern.push('%');
        }
        let mut sql = format!("'{}'", pattern.replace('\'', "''"));
        if needs_escape {
            sql.push_str(&format!(" ESCAPE '{}'", escape.to_string().replace('\'', "''")));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_brackets() {
        let rules = DialectRules::jet();
        assert_eq!(rules.quote_identifier("Customers"), "[Customers]");
        assert_eq!(rules.quote_identifier("Order Details"), "[Order Details]");
        assert_eq!(rules.quote_identifier("odd]name"), "[odd]]name]");
    }

    #[test]
    fn test_quote_identifier_backticks() {
        let rules = DialectRules {
            identifier_quote: IdentifierQuote::Backticks,
            ..DialectRules::jet()
        };
        assert_eq!(rules.quote_identifier("Customers"), "`Customers`");
        assert_eq!(rules.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_quote_qualified() {
        let rules = DialectRules::jet();
        assert_eq!(rules.quote_qualified(&["o", "Order Date"]), "[o].[Order Date]");
        assert_eq!(rules.quote_qualified(&["Customers"]), "[Customers]");
    }

    #[test]
    fn test_escape_like_pattern() {
        let rules = DialectRules::jet();
        let (escaped, escape) = rules.escape_like_pattern("50%_off[^]", JET_WILDCARDS);
        assert_eq!(escaped, r"50\%\_off\[\^\]");
        assert_eq!(escape, '\\');

        let (escaped, _) = rules.escape_like_pattern(r"C:\temp", JET_WILDCARDS);
        assert_eq!(escaped, r"C:\\temp");
    }

    #[test]
    fn test_like_pattern_literal() {
        let rules = DialectRules::jet();
        assert_eq!(rules.like_pattern_literal("Lon", false, true), "'Lon%'");
        assert_eq!(
            rules.like_pattern_literal("%B", true, true),
            r"'%\%B%' ESCAPE '\'"
        );
        assert_eq!(rules.like_pattern_literal("O'Br", true, false), "'%O''Br'");
    }
}

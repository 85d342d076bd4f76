//! Dialect rules.
//!
//! Jet is reached through several drivers (ACE OLE DB, the Access ODBC
//! driver) which disagree on a handful of spellings. [`DialectRules`]
//! captures those choices once, at provider construction, and is passed
//! explicitly into every translation. Several rule sets can coexist in one
//! process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How identifiers are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierQuote {
    /// `[name]`
    #[default]
    Brackets,
    /// `` `name` ``
    Backticks,
}

/// How row limits and offsets are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingStyle {
    /// `TOP n` for take-only queries, `SKIP m FETCH NEXT n ROWS ONLY` once
    /// an offset is present.
    #[default]
    Top,
    /// Always `SKIP m FETCH NEXT n ROWS ONLY`, with `SKIP 0` for take-only.
    SkipFetch,
}

/// How boolean literals are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanLiterals {
    /// `True` / `False`
    #[default]
    Keywords,
    /// `1` / `0`
    Numeric,
}

/// The string concatenation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcatOperator {
    /// `&`, which treats NULL operands as empty strings.
    #[default]
    Ampersand,
    /// `+`, which propagates NULL.
    Plus,
}

/// How bound parameters appear in the statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterStyle {
    /// `@p0` (OLE DB).
    #[default]
    Named,
    /// `?` (ODBC). Every occurrence binds separately.
    Positional,
}

/// How offset-aware timestamps become Jet's offset-naive `datetime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetPolicy {
    /// Convert to UTC, then drop the offset.
    #[default]
    Utc,
    /// Keep the wall-clock reading, drop the offset.
    WallClock,
}

/// What happens to sub-second components, which Jet literals cannot carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubSecondPolicy {
    /// Drop the fraction.
    #[default]
    Truncate,
    /// Round half-up to the nearest whole second.
    Round,
}

/// Read-only dialect configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectRules {
    /// Identifier quoting.
    pub identifier_quote: IdentifierQuote,
    /// Escape character used in `LIKE ... ESCAPE`.
    pub like_escape: char,
    /// Paging syntax.
    pub paging: PagingStyle,
    /// Boolean literal spelling.
    pub boolean_literals: BooleanLiterals,
    /// String concatenation operator.
    pub concat_operator: ConcatOperator,
    /// Parameter placeholder style.
    pub parameter_style: ParameterStyle,
    /// Normalization of offset-aware timestamps.
    pub offset_policy: OffsetPolicy,
    /// Handling of sub-second timestamp components.
    pub sub_second: SubSecondPolicy,
    /// Collation aliases, mapped to the names the engine understands.
    pub collations: BTreeMap<String, String>,
}

impl DialectRules {
    /// The rules used by the ACE OLE DB provider.
    #[must_use]
    pub fn jet() -> Self {
        Self {
            identifier_quote: IdentifierQuote::Brackets,
            like_escape: '\\',
            paging: PagingStyle::Top,
            boolean_literals: BooleanLiterals::Keywords,
            concat_operator: ConcatOperator::Ampersand,
            parameter_style: ParameterStyle::Named,
            offset_policy: OffsetPolicy::Utc,
            sub_second: SubSecondPolicy::Truncate,
            collations: BTreeMap::new(),
        }
    }

    /// The rules used through the Access ODBC driver.
    #[must_use]
    pub fn odbc() -> Self {
        Self {
            parameter_style: ParameterStyle::Positional,
            ..Self::jet()
        }
    }

    /// Returns the literal for `true`.
    #[must_use]
    pub const fn true_literal(&self) -> &'static str {
        match self.boolean_literals {
            BooleanLiterals::Keywords => "True",
            BooleanLiterals::Numeric => "1",
        }
    }

    /// Returns the literal for `false`.
    #[must_use]
    pub const fn false_literal(&self) -> &'static str {
        match self.boolean_literals {
            BooleanLiterals::Keywords => "False",
            BooleanLiterals::Numeric => "0",
        }
    }

    /// Returns the literal for a boolean.
    #[must_use]
    pub const fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            self.true_literal()
        } else {
            self.false_literal()
        }
    }

    /// Returns a predicate that always holds (`True = True`).
    #[must_use]
    pub fn tautology(&self) -> String {
        format!("{} = {}", self.true_literal(), self.true_literal())
    }

    /// Returns a predicate that never holds (`True = False`).
    #[must_use]
    pub fn contradiction(&self) -> String {
        format!("{} = {}", self.true_literal(), self.false_literal())
    }

    /// Returns the concatenation operator token.
    #[must_use]
    pub const fn concat_token(&self) -> &'static str {
        match self.concat_operator {
            ConcatOperator::Ampersand => "&",
            ConcatOperator::Plus => "+",
        }
    }

    /// Returns the placeholder text for a parameter.
    #[must_use]
    pub fn placeholder(&self, name: &str) -> String {
        match self.parameter_style {
            ParameterStyle::Named => format!("@{name}"),
            ParameterStyle::Positional => String::from("?"),
        }
    }

    /// Resolves a collation alias.
    #[must_use]
    pub fn collation<'a>(&'a self, name: &'a str) -> &'a str {
        self.collations.get(name).map_or(name, String::as_str)
    }
}

impl Default for DialectRules {
    fn default() -> Self {
        Self::jet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jet_rules() {
        let rules = DialectRules::jet();
        assert_eq!(rules.true_literal(), "True");
        assert_eq!(rules.contradiction(), "True = False");
        assert_eq!(rules.concat_token(), "&");
        assert_eq!(rules.placeholder("p0"), "@p0");
        assert_eq!(rules.like_escape, '\\');
    }

    #[test]
    fn test_odbc_rules() {
        let rules = DialectRules::odbc();
        assert_eq!(rules.placeholder("p0"), "?");
        assert_eq!(rules.paging, PagingStyle::Top);
    }

    #[test]
    fn test_numeric_booleans() {
        let rules = DialectRules {
            boolean_literals: BooleanLiterals::Numeric,
            ..DialectRules::jet()
        };
        assert_eq!(rules.bool_literal(true), "1");
        assert_eq!(rules.tautology(), "1 = 1");
    }

    #[test]
    fn test_rules_from_partial_json() {
        let rules: DialectRules =
            serde_json::from_str(r#"{"paging": "skip_fetch", "sub_second": "round"}"#).unwrap();
        assert_eq!(rules.paging, PagingStyle::SkipFetch);
        assert_eq!(rules.sub_second, SubSecondPolicy::Round);
        assert_eq!(rules.identifier_quote, IdentifierQuote::Brackets);
    }

    #[test]
    fn test_collation_alias() {
        let mut rules = DialectRules::jet();
        rules
            .collations
            .insert(String::from("nocase"), String::from("General"));
        assert_eq!(rules.collation("nocase"), "General");
        assert_eq!(rules.collation("Binary"), "Binary");
    }
}

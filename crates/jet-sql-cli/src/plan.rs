//! JSON plan files and dialect configuration.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use jet_sql_core::{
    Command, DialectRules, FilterContext, Model, QueryFilters, ResolvedFilters, Statement,
    Translator,
};

/// A command together with everything needed to translate it.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    /// Entity types referenced by entity sources.
    #[serde(default)]
    pub model: Model,
    /// Registered query filters.
    #[serde(default)]
    pub filters: QueryFilters,
    /// Context whose filters apply. Without one no filter applies.
    #[serde(default)]
    pub context: Option<FilterContext>,
    /// The command to translate.
    pub command: Command,
}

impl Plan {
    /// Reads a plan from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read plan {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid plan {}", path.display()))
    }

    /// Parses a plan from JSON text.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Translates the plan's command.
    pub fn render(&self, rules: &DialectRules) -> anyhow::Result<Vec<Statement>> {
        let filters = match &self.context {
            Some(context) => self.filters.for_context(context)?,
            None => ResolvedFilters::empty(),
        };
        debug!(
            entities = self.model.entities.len(),
            filtered = !filters.is_empty(),
            "translating plan"
        );
        let statements = Translator::new(rules)
            .with_model(&self.model)
            .with_filters(&filters)
            .translate_command(&self.command)?;
        Ok(statements)
    }
}

/// Resolves `--dialect`: a built-in preset name or a JSON rules file.
///
/// Fields missing from the file keep their Jet defaults.
pub fn load_rules(dialect: &str) -> anyhow::Result<DialectRules> {
    match dialect {
        "jet" => Ok(DialectRules::jet()),
        "odbc" => Ok(DialectRules::odbc()),
        path => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read dialect rules {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("invalid dialect rules {path}"))
        }
    }
}

/// Formats statements as SQL followed by their parameter declarations.
pub fn format_statements(
    statements: &[Statement],
    rules: &DialectRules,
) -> anyhow::Result<String> {
    let mut blocks = Vec::with_capacity(statements.len());
    for statement in statements {
        let mut text = format!("{};", statement.sql);
        for declaration in statement.declarations(rules)? {
            text.push_str("\n-- ");
            text.push_str(&declaration);
        }
        blocks.push(text);
    }
    Ok(blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jet_sql_core::dialect::{PagingStyle, ParameterStyle};
    use pretty_assertions::assert_eq;

    const CITY_PLAN: &str = r#"{
        "command": {"select": {
            "sources": [{"kind": {"table": "Customers"}, "alias": "c"}],
            "predicate": {"binary": {
                "left": {"column": {"table": "c", "name": "City"}},
                "op": "eq",
                "right": {"parameter": {"value": {"text": "London"}}}
            }}
        }}
    }"#;

    #[test]
    fn test_parse_and_render_select() {
        let plan = Plan::parse(CITY_PLAN).unwrap();
        let rules = DialectRules::jet();
        let statements = plan.render(&rules).unwrap();
        assert_eq!(
            format_statements(&statements, &rules).unwrap(),
            "SELECT *\nFROM [Customers] AS [c]\nWHERE [c].[City] = @p0;\n\
             -- @p0='London' (Size = 255)"
        );
    }

    #[test]
    fn test_unknown_plan_field_is_rejected() {
        assert!(Plan::parse(r#"{"command": {"select": {}}, "dialect": "jet"}"#).is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(load_rules("jet").unwrap(), DialectRules::jet());
        assert_eq!(
            load_rules("odbc").unwrap().parameter_style,
            ParameterStyle::Positional
        );
    }

    #[test]
    fn test_rules_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, r#"{"paging": "skip_fetch"}"#).unwrap();
        let rules = load_rules(path.to_str().unwrap()).unwrap();
        assert_eq!(rules.paging, PagingStyle::SkipFetch);
        assert_eq!(rules.parameter_style, ParameterStyle::Named);
    }

    #[test]
    fn test_missing_rules_file() {
        let err = load_rules("/nonexistent/rules.json").unwrap_err();
        assert!(err.to_string().contains("failed to read dialect rules"));
    }
}

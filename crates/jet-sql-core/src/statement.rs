//! Translated statements.

use std::fmt;

use serde::Serialize;

use crate::dialect::DialectRules;
use crate::error::Result;
use crate::types::StoreType;
use crate::value::SqlValue;

/// A bound parameter of an emitted statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Name, unique within the statement.
    pub name: String,
    /// Bound value, already normalized for the dialect.
    pub value: SqlValue,
    /// Declared store type.
    pub store_type: StoreType,
    /// Whether the parameter may be NULL.
    pub nullable: bool,
    /// Size in bytes or characters, `-1` for long types.
    pub size: Option<i32>,
}

impl Parameter {
    /// Renders the parameter the way it appears in command logs, e.g.
    /// `@p0='London' (Size = 255)`.
    ///
    /// Fails if the value has no Jet literal form.
    pub fn declaration(&self, rules: &DialectRules) -> Result<String> {
        let value = rules.format_typed_literal(&self.value, self.store_type)?;
        let mut facets = Vec::new();
        if let Some(size) = self.size {
            facets.push(format!("Size = {size}"));
        }
        if self.nullable {
            facets.push(String::from("Nullable = true"));
        }
        if facets.is_empty() {
            Ok(format!("@{}={value}", self.name))
        } else {
            Ok(format!("@{}={value} ({})", self.name, facets.join(", ")))
        }
    }
}

/// A column of a statement's result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultColumn {
    /// Output name.
    pub name: String,
    /// Store type, when it can be determined statically.
    pub store_type: Option<StoreType>,
}

/// A fully translated statement.
///
/// `parameters` lists one entry per placeholder occurrence, in text order,
/// so positional drivers can bind it verbatim. A parameter that appears
/// twice in the text appears twice here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    /// Statement text.
    pub sql: String,
    /// Parameters in placeholder order.
    pub parameters: Vec<Parameter>,
    /// Result columns, empty for commands and `SELECT *`.
    pub columns: Vec<ResultColumn>,
}

impl Statement {
    /// Returns each distinct parameter once, in order of first occurrence.
    #[must_use]
    pub fn distinct_parameters(&self) -> Vec<&Parameter> {
        let mut seen: Vec<&Parameter> = Vec::new();
        for param in &self.parameters {
            if !seen.iter().any(|p| p.name == param.name) {
                seen.push(param);
            }
        }
        seen
    }

    /// Returns the log declarations of the distinct parameters.
    pub fn declarations(&self, rules: &DialectRules) -> Result<Vec<String>> {
        self.distinct_parameters()
            .into_iter()
            .map(|p| p.declaration(rules))
            .collect()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

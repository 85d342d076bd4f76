//! Plan to Jet SQL translation.
//!
//! A [`Translator`] borrows the dialect rules, the entity model and the
//! resolved query filters, and turns plans into [`Statement`]s. Every call
//! starts from fresh state: parameter numbering and generated aliases depend
//! only on the plan, so identical plans give byte-identical statements.
//!
//! # Example
//!
//! ```rust
//! use jet_sql_core::builder::{col, param, Query};
//! use jet_sql_core::{DialectRules, Translator};
//!
//! let rules = DialectRules::jet();
//! let query = Query::table("Customers", "c")
//!     .filter(col("c", "City").eq(param("London")))
//!     .select(col("c", "CustomerID"))
//!     .take(5)
//!     .order_by(col("c", "CustomerID"))
//!     .build();
//!
//! let statement = Translator::new(&rules).translate_query(&query).unwrap();
//! assert_eq!(
//!     statement.sql,
//!     "SELECT TOP 5 [c].[CustomerID]\nFROM [Customers] AS [c]\nWHERE [c].[City] = @p0\nORDER BY [c].[CustomerID]"
//! );
//! ```

mod alias;
mod dml;
mod expr;
mod fragment;
mod functions;
mod inheritance;
mod params;
mod select;
mod strings;

use tracing::debug;

use crate::ast::{Command, Expr, Model, ParameterSpec, QueryShape, Tag};
use crate::dialect::DialectRules;
use crate::error::Result;
use crate::filter::ResolvedFilters;
use crate::raw::{RawSegment, RawSql};
use crate::statement::{Parameter, ResultColumn, Statement};

use alias::{AliasGenerator, Scopes};
use fragment::SqlFragment;
use params::ParameterRegistry;

static EMPTY_MODEL: Model = Model::new();
static NO_FILTERS: ResolvedFilters = ResolvedFilters::empty();

/// Translates plans into Jet SQL statements.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    rules: &'a DialectRules,
    model: &'a Model,
    filters: &'a ResolvedFilters,
}

impl<'a> Translator<'a> {
    /// Creates a translator without an entity model or filters.
    #[must_use]
    pub fn new(rules: &'a DialectRules) -> Self {
        Self {
            rules,
            model: &EMPTY_MODEL,
            filters: &NO_FILTERS,
        }
    }

    /// Sets the entity model entity sources are resolved against.
    #[must_use]
    pub const fn with_model(mut self, model: &'a Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the query filters applied to entity sources.
    #[must_use]
    pub const fn with_filters(mut self, filters: &'a ResolvedFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Returns the dialect rules.
    #[must_use]
    pub const fn rules(&self) -> &'a DialectRules {
        self.rules
    }

    /// Translates a SELECT query.
    pub fn translate_query(&self, shape: &QueryShape) -> Result<Statement> {
        let mut builder = self.builder(AliasGenerator::for_shape(shape));
        let rendered = builder.select(shape)?;
        let mut sql = tag_block(&shape.tags);
        sql.push_str(&rendered.fragment.sql);
        Ok(finish(sql, rendered.fragment.params, rendered.columns))
    }

    /// Translates any command. INSERT with identity retrieval yields a
    /// second `SELECT @@IDENTITY` statement, since Jet runs one statement
    /// per command.
    pub fn translate_command(&self, command: &Command) -> Result<Vec<Statement>> {
        match command {
            Command::Select(shape) => Ok(vec![self.translate_query(shape)?]),
            Command::Insert(insert) => {
                let exprs = insert.values.iter().map(|a| &a.value);
                let fragment = self.builder(AliasGenerator::for_exprs(exprs)).insert(insert)?;
                let mut statements = vec![finish(fragment.sql, fragment.params, vec![])];
                if insert.select_identity {
                    statements.push(finish(String::from("SELECT @@IDENTITY"), vec![], vec![]));
                }
                Ok(statements)
            }
            Command::Update(update) => {
                let exprs = update
                    .assignments
                    .iter()
                    .map(|a| &a.value)
                    .chain(update.predicate.iter());
                let fragment = self.builder(AliasGenerator::for_exprs(exprs)).update(update)?;
                Ok(vec![finish(fragment.sql, fragment.params, vec![])])
            }
            Command::Delete(delete) => {
                let exprs = delete.predicate.iter();
                let fragment = self.builder(AliasGenerator::for_exprs(exprs)).delete(delete)?;
                Ok(vec![finish(fragment.sql, fragment.params, vec![])])
            }
        }
    }

    /// Translates a raw statement, binding its `{n}` arguments.
    ///
    /// Unlike raw sources, a raw statement is not checked for
    /// composability.
    pub fn translate_raw(&self, raw: &RawSql) -> Result<Statement> {
        let mut builder = self.builder(AliasGenerator::default());
        let fragment = builder.raw_text(raw, &raw.sql)?;
        Ok(finish(fragment.sql, fragment.params, vec![]))
    }

    /// Translates a predicate on its own. Qualified columns may refer to
    /// the given aliases.
    pub fn translate_predicate(
        &self,
        expr: &Expr,
        aliases: &[&str],
    ) -> Result<(String, Vec<Parameter>)> {
        let mut builder = self.builder(AliasGenerator::for_exprs([expr]));
        builder.open_scope(aliases)?;
        let fragment = builder.predicate(expr)?;
        Ok((fragment.sql, fragment.params))
    }

    /// Translates a value expression on its own. Qualified columns may
    /// refer to the given aliases.
    pub fn translate_value(
        &self,
        expr: &Expr,
        aliases: &[&str],
    ) -> Result<(String, Vec<Parameter>)> {
        let mut builder = self.builder(AliasGenerator::for_exprs([expr]));
        builder.open_scope(aliases)?;
        let fragment = builder.value(expr)?;
        Ok((fragment.sql, fragment.params))
    }

    fn builder(&self, aliases: AliasGenerator) -> StatementBuilder<'a> {
        StatementBuilder {
            rules: self.rules,
            model: self.model,
            filters: self.filters,
            params: ParameterRegistry::new(),
            aliases,
            scopes: Scopes::default(),
            depth: 0,
        }
    }
}

/// Per-statement translation state.
pub(crate) struct StatementBuilder<'a> {
    rules: &'a DialectRules,
    model: &'a Model,
    filters: &'a ResolvedFilters,
    params: ParameterRegistry,
    aliases: AliasGenerator,
    scopes: Scopes,
    /// Nesting level; clauses of nested queries stay on one line.
    depth: usize,
}

impl StatementBuilder<'_> {
    fn open_scope(&mut self, aliases: &[&str]) -> Result<()> {
        self.scopes.push();
        for alias in aliases {
            self.scopes.declare(alias)?;
        }
        Ok(())
    }

    fn quote(&self, name: &str) -> String {
        self.rules.quote_identifier(name)
    }

    const fn clause_break(&self) -> &'static str {
        if self.depth == 0 {
            "\n"
        } else {
            " "
        }
    }

    /// Renders raw SQL text, binding each `{n}` reference. Repeated
    /// references to one argument share a parameter.
    fn raw_text(&mut self, raw: &RawSql, text: &str) -> Result<SqlFragment> {
        let mut bound: Vec<Option<SqlFragment>> = vec![None; raw.parameters.len()];
        let mut fragment = SqlFragment::raw("");
        for segment in raw.segments(text)? {
            match segment {
                RawSegment::Text(text) => fragment.push_str(text),
                RawSegment::Argument(index) => {
                    let placeholder = match bound.get(index).cloned().flatten() {
                        Some(existing) => existing,
                        None => {
                            let spec = ParameterSpec {
                                name: None,
                                value: raw.parameters[index].clone(),
                                store_type: None,
                                nullable: false,
                            };
                            let placeholder = self.params.bind(self.rules, &spec)?;
                            bound[index] = Some(placeholder.clone());
                            placeholder
                        }
                    };
                    fragment.push(placeholder);
                }
            }
        }
        Ok(fragment)
    }
}

fn tag_block(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let mut block = String::new();
    for tag in tags {
        match tag {
            Tag::Text(text) => {
                for line in text.lines() {
                    block.push_str("-- ");
                    block.push_str(line);
                    block.push('\n');
                }
            }
            Tag::CallSite { file, line } => {
                block.push_str(&format!("-- file: {file}:{line}\n"));
            }
        }
    }
    block.push('\n');
    block
}

fn finish(
    sql: String,
    parameters: Vec<Parameter>,
    columns: Vec<ResultColumn>,
) -> Statement {
    debug!(sql = %sql, parameters = parameters.len(), "translated statement");
    Statement {
        sql,
        parameters,
        columns,
    }
}

//! SELECT statements.

use tracing::warn;

use crate::ast::{
    Expr, JoinKind, Paging, QueryShape, SetOperation, SetOperationKind, SourceKind, TableSource,
};
use crate::dialect::PagingStyle;
use crate::error::{Result, TranslateError};
use crate::statement::ResultColumn;

use super::expr::store_type;
use super::fragment::SqlFragment;
use super::StatementBuilder;

/// A translated query and its result columns.
pub(crate) struct Rendered {
    pub fragment: SqlFragment,
    pub columns: Vec<ResultColumn>,
}

/// A source with the name it is referred to by in its scope.
struct ScopedSource<'s> {
    source: &'s TableSource,
    alias: Option<String>,
}

impl ScopedSource<'_> {
    fn scope_name(&self) -> &str {
        match (&self.alias, &self.source.kind) {
            (Some(alias), _) => alias,
            (None, SourceKind::Table(table)) => table,
            (None, _) => "",
        }
    }
}

impl StatementBuilder<'_> {
    pub(crate) fn select(&mut self, shape: &QueryShape) -> Result<Rendered> {
        if let Some(set) = &shape.set_operation {
            if !shape.sources.is_empty() {
                return Err(TranslateError::untranslatable(
                    "a query built from a set operation cannot have its own sources",
                ));
            }
            if !wraps_set_operation(shape) {
                return self.set_operation(set);
            }
            let inner = QueryShape {
                set_operation: Some(set.clone()),
                ..QueryShape::default()
            };
            let outer = QueryShape {
                sources: vec![TableSource {
                    kind: SourceKind::Derived(Box::new(inner)),
                    alias: Some(self.aliases.fresh()),
                    join: JoinKind::Inner,
                    on: None,
                }],
                set_operation: None,
                tags: vec![],
                ..shape.clone()
            };
            return self.select(&outer);
        }

        self.scopes.push();
        let rendered = self.plain_select(shape);
        self.scopes.pop();
        rendered
    }

    fn plain_select(&mut self, shape: &QueryShape) -> Result<Rendered> {
        let sources = self.declare_sources(&shape.sources)?;
        check_join_mix(&shape.sources)?;
        let brk = self.clause_break();
        let (top, suffix) = self.paging(shape.paging, !shape.order_by.is_empty());

        let mut sql = SqlFragment::raw("SELECT ");
        if shape.distinct {
            sql.push_str("DISTINCT ");
        }
        if let Some(top) = top {
            sql.push_str(&format!("{top} "));
        }
        let (projections, columns) = self.projections(shape, &sources)?;
        sql.push(projections);

        let mut implied = Vec::new();
        if !sources.is_empty() {
            sql.push_str(brk);
            sql.push_str("FROM ");
            let from = self.from_clause(&sources, &mut implied)?;
            sql.push(from);
        }

        if let Some(predicate) = Expr::conjoin(implied.into_iter().chain(shape.predicate.clone())) {
            sql.push_str(brk);
            sql.push_str("WHERE ");
            sql.push(self.predicate(&predicate)?);
        }
        if !shape.group_by.is_empty() {
            let keys = shape
                .group_by
                .iter()
                .map(|key| self.value(key))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(brk);
            sql.push_str("GROUP BY ");
            sql.push(SqlFragment::join(keys, ", "));
        }
        if let Some(having) = &shape.having {
            sql.push_str(brk);
            sql.push_str("HAVING ");
            sql.push(self.predicate(having)?);
        }
        if !shape.order_by.is_empty() {
            let mut items = Vec::with_capacity(shape.order_by.len());
            for ordering in &shape.order_by {
                let mut item = self.value(&ordering.expr)?;
                if ordering.descending {
                    item.push_str(" DESC");
                }
                items.push(item);
            }
            sql.push_str(brk);
            sql.push_str("ORDER BY ");
            sql.push(SqlFragment::join(items, ", "));
        }
        if let Some(suffix) = suffix {
            sql.push_str(if shape.order_by.is_empty() { brk } else { " " });
            sql.push_str(&suffix);
        }
        Ok(Rendered {
            fragment: sql,
            columns,
        })
    }

    fn declare_sources<'s>(
        &mut self,
        sources: &'s [TableSource],
    ) -> Result<Vec<ScopedSource<'s>>> {
        let mut scoped = Vec::with_capacity(sources.len());
        for source in sources {
            let alias = match (&source.alias, &source.kind) {
                (Some(alias), _) => Some(alias.clone()),
                (None, SourceKind::Table(_)) => None,
                (None, _) => Some(self.aliases.fresh()),
            };
            let source = ScopedSource { source, alias };
            self.scopes.declare(source.scope_name())?;
            scoped.push(source);
        }
        Ok(scoped)
    }

    /// Jet joins tables left to right with nested parentheses:
    /// `FROM (a INNER JOIN b ON ...) LEFT JOIN c ON ...`. Predicates implied
    /// by FROM and comma-joined sources go to `implied`; those of joined
    /// sources go into their ON condition.
    fn from_clause(
        &mut self,
        sources: &[ScopedSource<'_>],
        implied: &mut Vec<Expr>,
    ) -> Result<SqlFragment> {
        let mut from = SqlFragment::raw("");
        let mut joins = 0;
        for (index, scoped) in sources.iter().enumerate() {
            let (table, restriction) = self.source(scoped)?;
            if index == 0 || scoped.source.join == JoinKind::Cross {
                if index > 0 {
                    from.push_str(", ");
                }
                from.push(table);
                implied.extend(restriction);
                continue;
            }
            let keyword = if scoped.source.join == JoinKind::Left {
                "LEFT JOIN"
            } else {
                "INNER JOIN"
            };
            let Some(on) = &scoped.source.on else {
                return Err(TranslateError::untranslatable(format!(
                    "{keyword} {} has no ON condition",
                    scoped.scope_name()
                )));
            };
            if joins > 0 {
                from = from.paren();
            }
            joins += 1;
            from.push_str(&format!(" {keyword} "));
            from.push(table);
            from.push_str(" ON ");
            let condition = Expr::conjoin(std::iter::once(on.clone()).chain(restriction))
                .unwrap_or_else(|| on.clone());
            from.push(self.predicate(&condition)?);
        }
        Ok(from)
    }

    /// Renders one source, returning the predicate its entity mapping and
    /// query filters imply.
    fn source(&mut self, scoped: &ScopedSource<'_>) -> Result<(SqlFragment, Option<Expr>)> {
        let alias = scoped.alias.as_deref();
        let as_alias = |builder: &Self| {
            alias.map_or_else(String::new, |a| format!(" AS {}", builder.quote(a)))
        };
        match &scoped.source.kind {
            SourceKind::Table(table) => {
                let sql = format!("{}{}", self.quote(table), as_alias(self));
                Ok((SqlFragment::raw(sql), None))
            }
            SourceKind::Entity(entity) => self.entity_source(entity, scoped.scope_name()),
            SourceKind::Derived(query) => {
                self.depth += 1;
                let rendered = self.select(query);
                self.depth -= 1;
                let mut sql = rendered?.fragment.paren();
                sql.push_str(&as_alias(self));
                Ok((sql, None))
            }
            SourceKind::Raw(raw) => {
                let text = raw.composable_text()?;
                let mut sql = self.raw_text(raw, text)?.paren();
                sql.push_str(&as_alias(self));
                Ok((sql, None))
            }
        }
    }

    fn projections(
        &mut self,
        shape: &QueryShape,
        sources: &[ScopedSource<'_>],
    ) -> Result<(SqlFragment, Vec<ResultColumn>)> {
        if shape.projections.is_empty() {
            return self.star_projection(sources);
        }
        let mut parts = Vec::with_capacity(shape.projections.len());
        let mut columns = Vec::with_capacity(shape.projections.len());
        let mut unnamed = 1000;
        for projection in &shape.projections {
            let mut part = self.value(&projection.expr)?;
            let source_name = match &projection.expr {
                Expr::Column(column) => Some(column.name.as_str()),
                _ => None,
            };
            let name = match (&projection.alias, source_name) {
                (Some(alias), _) => {
                    if source_name != Some(alias.as_str()) {
                        part.push_str(&format!(" AS {}", self.quote(alias)));
                    }
                    alias.clone()
                }
                (None, Some(column)) => String::from(column),
                (None, None) => {
                    let name = format!("Expr{unnamed}");
                    unnamed += 1;
                    name
                }
            };
            columns.push(ResultColumn {
                name,
                store_type: store_type(&projection.expr),
            });
            parts.push(part);
        }
        Ok((SqlFragment::join(parts, ", "), columns))
    }

    /// Entity sources expand to their mapped columns; anything else reads
    /// `*`.
    fn star_projection(
        &self,
        sources: &[ScopedSource<'_>],
    ) -> Result<(SqlFragment, Vec<ResultColumn>)> {
        let all_entities = !sources.is_empty()
            && sources
                .iter()
                .all(|s| matches!(s.source.kind, SourceKind::Entity(_)));
        if !all_entities {
            return Ok((SqlFragment::raw("*"), vec![]));
        }
        let mut parts = Vec::new();
        let mut columns = Vec::new();
        for scoped in sources {
            let SourceKind::Entity(entity) = &scoped.source.kind else {
                continue;
            };
            let qualifier = scoped.scope_name();
            for column in self.entity_columns(entity)? {
                parts.push(self.rules.quote_qualified(&[qualifier, column.name.as_str()]));
                columns.push(column);
            }
        }
        Ok((SqlFragment::raw(parts.join(", ")), columns))
    }

    /// Returns the TOP clause and the trailing SKIP/FETCH clause.
    fn paging(&self, paging: Option<Paging>, ordered: bool) -> (Option<String>, Option<String>) {
        let Some(Paging { skip, take }) = paging else {
            return (None, None);
        };
        if (skip.is_some() || take.is_some()) && !ordered {
            warn!(
                skip = ?skip,
                take = ?take,
                "paging without ORDER BY, row order is undefined"
            );
        }
        match (skip, take, self.rules.paging) {
            (None, None, _) => (None, None),
            (None, Some(take), PagingStyle::Top) => (Some(format!("TOP {take}")), None),
            (None, Some(take), PagingStyle::SkipFetch) => {
                (None, Some(format!("SKIP 0 FETCH NEXT {take} ROWS ONLY")))
            }
            (Some(skip), Some(take), _) => {
                (None, Some(format!("SKIP {skip} FETCH NEXT {take} ROWS ONLY")))
            }
            (Some(skip), None, _) => (None, Some(format!("SKIP {skip}"))),
        }
    }

    fn set_operation(&mut self, set: &SetOperation) -> Result<Rendered> {
        let keyword = match set.kind {
            SetOperationKind::Union => "UNION",
            SetOperationKind::UnionAll => "UNION ALL",
            SetOperationKind::Intersect | SetOperationKind::Except => {
                return Err(TranslateError::untranslatable(format!(
                    "Jet does not support {:?}",
                    set.kind
                )));
            }
        };
        let left = self.branch(&set.left, false)?;
        let right = self.branch(&set.right, true)?;
        if !left.columns.is_empty()
            && !right.columns.is_empty()
            && left.columns.len() != right.columns.len()
        {
            return Err(TranslateError::SetOperationArity {
                left: left.columns.len(),
                right: right.columns.len(),
            });
        }
        let brk = self.clause_break();
        let mut fragment = left.fragment;
        fragment.push_str(&format!("{brk}{keyword}{brk}"));
        fragment.push(right.fragment);
        Ok(Rendered {
            fragment,
            columns: left.columns,
        })
    }

    /// A right branch that is itself a set operation is read through a
    /// derived table; Jet evaluates chained set operations left to right.
    fn branch(&mut self, shape: &QueryShape, right: bool) -> Result<Rendered> {
        if right && shape.set_operation.is_some() && !wraps_set_operation(shape) {
            let wrapped = QueryShape {
                sources: vec![TableSource {
                    kind: SourceKind::Derived(Box::new(shape.clone())),
                    alias: Some(self.aliases.fresh()),
                    join: JoinKind::Inner,
                    on: None,
                }],
                ..QueryShape::default()
            };
            return self.select(&wrapped);
        }
        self.select(shape)
    }
}

/// A set operation needs a derived table once anything is applied on top
/// of it.
fn wraps_set_operation(shape: &QueryShape) -> bool {
    shape.distinct
        || !shape.projections.is_empty()
        || shape.predicate.is_some()
        || !shape.group_by.is_empty()
        || shape.having.is_some()
        || !shape.order_by.is_empty()
        || shape.paging.is_some()
}

/// Jet cannot mix comma joins with explicit joins in one FROM clause.
fn check_join_mix(sources: &[TableSource]) -> Result<()> {
    let rest = sources.iter().skip(1);
    let cross = rest.clone().any(|s| s.join == JoinKind::Cross);
    let explicit = rest.clone().any(|s| s.join != JoinKind::Cross);
    if cross && explicit {
        return Err(TranslateError::untranslatable(
            "cross joins cannot be combined with explicit joins in Jet",
        ));
    }
    if let Some(source) = sources
        .iter()
        .skip(1)
        .find(|s| s.join == JoinKind::Cross && s.on.is_some())
    {
        return Err(TranslateError::untranslatable(format!(
            "cross join {:?} cannot have an ON condition",
            source.alias
        )));
    }
    Ok(())
}

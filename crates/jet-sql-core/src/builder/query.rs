//! Query shape builder.

use std::panic::Location;

use crate::ast::{
    Expr, JoinKind, Ordering, Paging, Projection, QueryShape, SetOperation, SetOperationKind,
    SourceKind, TableSource, Tag,
};
use crate::raw::RawSql;

/// Builds a [`QueryShape`] source by source and clause by clause.
///
/// Every method appends; calling `filter` twice ANDs the predicates.
#[derive(Debug, Clone, Default)]
pub struct Query {
    shape: QueryShape,
}

fn source(kind: SourceKind, alias: &str, join: JoinKind, on: Option<Expr>) -> TableSource {
    TableSource {
        kind,
        alias: Some(String::from(alias)),
        join,
        on,
    }
}

impl Query {
    /// Starts a query over any source.
    #[must_use]
    pub fn from_source(source: TableSource) -> Self {
        Self {
            shape: QueryShape {
                sources: vec![source],
                ..QueryShape::default()
            },
        }
    }

    /// Starts a query over a table.
    #[must_use]
    pub fn table(table: &str, alias: &str) -> Self {
        Self::from_source(source(
            SourceKind::Table(String::from(table)),
            alias,
            JoinKind::Inner,
            None,
        ))
    }

    /// Starts a query over an entity type of the model.
    #[must_use]
    pub fn entity(entity: &str, alias: &str) -> Self {
        Self::from_source(source(
            SourceKind::Entity(String::from(entity)),
            alias,
            JoinKind::Inner,
            None,
        ))
    }

    /// Starts a query over a raw SQL fragment.
    #[must_use]
    pub fn raw(raw: RawSql, alias: &str) -> Self {
        Self::from_source(source(SourceKind::Raw(raw), alias, JoinKind::Inner, None))
    }

    /// Starts a query over a derived table.
    #[must_use]
    pub fn derived(query: QueryShape, alias: &str) -> Self {
        Self::from_source(source(
            SourceKind::Derived(Box::new(query)),
            alias,
            JoinKind::Inner,
            None,
        ))
    }

    /// Adds a source.
    #[must_use]
    pub fn join_source(mut self, source: TableSource) -> Self {
        self.shape.sources.push(source);
        self
    }

    /// INNER JOIN a table.
    #[must_use]
    pub fn join(self, table: &str, alias: &str, on: impl Into<Expr>) -> Self {
        let kind = SourceKind::Table(String::from(table));
        self.join_source(source(kind, alias, JoinKind::Inner, Some(on.into())))
    }

    /// LEFT JOIN a table.
    #[must_use]
    pub fn left_join(self, table: &str, alias: &str, on: impl Into<Expr>) -> Self {
        let kind = SourceKind::Table(String::from(table));
        self.join_source(source(kind, alias, JoinKind::Left, Some(on.into())))
    }

    /// INNER JOIN an entity type.
    #[must_use]
    pub fn join_entity(self, entity: &str, alias: &str, on: impl Into<Expr>) -> Self {
        let kind = SourceKind::Entity(String::from(entity));
        self.join_source(source(kind, alias, JoinKind::Inner, Some(on.into())))
    }

    /// LEFT JOIN an entity type.
    #[must_use]
    pub fn left_join_entity(self, entity: &str, alias: &str, on: impl Into<Expr>) -> Self {
        let kind = SourceKind::Entity(String::from(entity));
        self.join_source(source(kind, alias, JoinKind::Left, Some(on.into())))
    }

    /// LEFT JOIN a derived table.
    #[must_use]
    pub fn left_join_derived(self, query: QueryShape, alias: &str, on: impl Into<Expr>) -> Self {
        let kind = SourceKind::Derived(Box::new(query));
        self.join_source(source(kind, alias, JoinKind::Left, Some(on.into())))
    }

    /// Cross join a table.
    #[must_use]
    pub fn cross_join(self, table: &str, alias: &str) -> Self {
        let kind = SourceKind::Table(String::from(table));
        self.join_source(source(kind, alias, JoinKind::Cross, None))
    }

    /// Adds a projection.
    #[must_use]
    pub fn select(mut self, expr: impl Into<Expr>) -> Self {
        self.shape.projections.push(Projection {
            expr: expr.into(),
            alias: None,
        });
        self
    }

    /// Adds a projection with an output name.
    #[must_use]
    pub fn select_as(mut self, expr: impl Into<Expr>, alias: &str) -> Self {
        self.shape.projections.push(Projection {
            expr: expr.into(),
            alias: Some(String::from(alias)),
        });
        self
    }

    /// Selects distinct rows.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.shape.distinct = true;
        self
    }

    /// Adds a WHERE predicate, ANDed with any previous one.
    #[must_use]
    pub fn filter(mut self, predicate: impl Into<Expr>) -> Self {
        let predicate = predicate.into();
        self.shape.predicate = Some(match self.shape.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Adds a GROUP BY key.
    #[must_use]
    pub fn group_by(mut self, key: impl Into<Expr>) -> Self {
        self.shape.group_by.push(key.into());
        self
    }

    /// Adds a HAVING predicate, ANDed with any previous one.
    #[must_use]
    pub fn having(mut self, predicate: impl Into<Expr>) -> Self {
        let predicate = predicate.into();
        self.shape.having = Some(match self.shape.having.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Adds an ascending sort key.
    #[must_use]
    pub fn order_by(mut self, key: impl Into<Expr>) -> Self {
        self.shape.order_by.push(Ordering {
            expr: key.into(),
            descending: false,
        });
        self
    }

    /// Adds a descending sort key.
    #[must_use]
    pub fn order_by_desc(mut self, key: impl Into<Expr>) -> Self {
        self.shape.order_by.push(Ordering {
            expr: key.into(),
            descending: true,
        });
        self
    }

    /// Skips rows.
    #[must_use]
    pub fn skip(mut self, rows: u64) -> Self {
        self.shape.paging.get_or_insert_with(Paging::default).skip = Some(rows);
        self
    }

    /// Limits the number of rows.
    #[must_use]
    pub fn take(mut self, rows: u64) -> Self {
        self.shape.paging.get_or_insert_with(Paging::default).take = Some(rows);
        self
    }

    /// Adds a comment tag.
    #[must_use]
    pub fn tag(mut self, text: &str) -> Self {
        self.shape.tags.push(Tag::Text(String::from(text)));
        self
    }

    /// Adds a tag naming the caller's source location.
    #[must_use]
    #[track_caller]
    pub fn tag_call_site(mut self) -> Self {
        let location = Location::caller();
        self.shape.tags.push(Tag::CallSite {
            file: String::from(location.file()),
            line: location.line(),
        });
        self
    }

    /// `self UNION other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.set_operation(SetOperationKind::Union, other)
    }

    /// `self UNION ALL other`.
    #[must_use]
    pub fn union_all(self, other: Self) -> Self {
        self.set_operation(SetOperationKind::UnionAll, other)
    }

    fn set_operation(mut self, kind: SetOperationKind, other: Self) -> Self {
        let tags = std::mem::take(&mut self.shape.tags);
        Self {
            shape: QueryShape {
                set_operation: Some(Box::new(SetOperation {
                    kind,
                    left: self.shape,
                    right: other.shape,
                })),
                tags,
                ..QueryShape::default()
            },
        }
    }

    /// Returns the query shape.
    #[must_use]
    pub fn build(self) -> QueryShape {
        self.shape
    }
}

impl From<Query> for QueryShape {
    fn from(query: Query) -> Self {
        query.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{col, lit};

    #[test]
    fn test_filter_conjoins() {
        let shape = Query::table("Customers", "c")
            .filter(col("c", "City").eq(lit("London")))
            .filter(col("c", "Country").eq(lit("UK")))
            .build();
        assert!(matches!(
            shape.predicate,
            Some(Expr::Binary {
                op: crate::ast::BinaryOp::And,
                ..
            })
        ));
    }

    #[test]
    fn test_paging_accumulates() {
        let shape = Query::table("Orders", "o").skip(6).take(2).build();
        assert_eq!(
            shape.paging,
            Some(Paging {
                skip: Some(6),
                take: Some(2)
            })
        );
    }

    #[test]
    fn test_union_keeps_tags_outside() {
        let shape = Query::table("Customers", "c")
            .tag("customers and suppliers")
            .union(Query::table("Suppliers", "s"))
            .build();
        assert_eq!(shape.tags.len(), 1);
        let set = shape.set_operation.unwrap();
        assert!(set.left.tags.is_empty());
        assert_eq!(set.kind, SetOperationKind::Union);
    }

    #[test]
    fn test_tag_call_site() {
        let shape = Query::table("Orders", "o").tag_call_site().build();
        assert!(matches!(
            &shape.tags[0],
            Tag::CallSite { file, .. } if file.ends_with("query.rs")
        ));
    }
}

//! Entity sources and inheritance mapping.
//!
//! An entity source renders as a FROM item plus the predicate it implies:
//!
//! - no strategy: the entity's table;
//! - single table: the root table, restricted by a discriminator `=` or
//!   `IN` predicate unless every row qualifies;
//! - table per type: a derived table joining the root to the tables of
//!   ancestors (INNER) and descendants (LEFT), with the discriminator
//!   synthesized from which descendant rows are present;
//! - table per concrete type: a derived table made of one branch per
//!   concrete type, padded with typed `NULL`s to the same column list.
//!
//! Query filters registered for the entity or any of its ancestors are
//! added to the implied predicate.

use crate::ast::{
    BinaryOp, ColumnDef, ColumnRef, EntityType, Expr, InheritanceStrategy, DISCRIMINATOR_ALIAS,
};
use crate::error::{Result, TranslateError};
use crate::statement::ResultColumn;
use crate::types::StoreType;
use crate::value::SqlValue;

use super::expr::iif;
use super::fragment::SqlFragment;
use super::StatementBuilder;

impl StatementBuilder<'_> {
    /// Returns the FROM item of an entity source and the predicate it
    /// implies.
    pub(crate) fn entity_source(
        &self,
        name: &str,
        alias: &str,
    ) -> Result<(SqlFragment, Option<Expr>)> {
        let entity = self.model.get(name)?;
        let filter = self.entity_filter(name, alias)?;
        let quoted_alias = self.quote(alias);
        match self.model.strategy(name)? {
            None => {
                let sql = format!("{} AS {quoted_alias}", self.quote(&entity.table));
                Ok((SqlFragment::raw(sql), filter))
            }
            Some(InheritanceStrategy::SingleTable {
                discriminator,
                discriminator_type,
                complete,
            }) => {
                let root = self.model.root(name)?;
                let sql = format!("{} AS {quoted_alias}", self.quote(&root.table));
                let column = Expr::Column(ColumnRef {
                    table: Some(String::from(alias)),
                    name: discriminator.clone(),
                    store_type: Some(*discriminator_type),
                });
                let restriction = if *complete && root.name == entity.name {
                    None
                } else {
                    Some(self.discriminator_predicate(name, column)?)
                };
                Ok((SqlFragment::raw(sql), Expr::conjoin(restriction.into_iter().chain(filter))))
            }
            Some(InheritanceStrategy::TablePerType) => {
                let mut sql = self.table_per_type(entity)?.paren();
                sql.push_str(&format!(" AS {quoted_alias}"));
                Ok((sql, filter))
            }
            Some(InheritanceStrategy::TablePerConcreteType { distinct }) => {
                let mut sql = self.table_per_concrete_type(entity, *distinct)?.paren();
                sql.push_str(&format!(" AS {quoted_alias}"));
                Ok((sql, filter))
            }
        }
    }

    /// Returns the columns a `SELECT *` over the entity yields, discriminator
    /// included.
    pub(crate) fn entity_columns(&self, name: &str) -> Result<Vec<ResultColumn>> {
        let strategy = self.model.strategy(name)?;
        let mapped = if strategy.is_some() {
            self.model.hierarchy_columns(name)?
        } else {
            self.model.inherited_columns(name)?
        };
        let mut columns: Vec<ResultColumn> = mapped
            .into_iter()
            .map(|c| ResultColumn {
                name: c.name.clone(),
                store_type: Some(c.store_type),
            })
            .collect();
        let discriminator = match strategy {
            None => None,
            Some(InheritanceStrategy::SingleTable {
                discriminator,
                discriminator_type,
                ..
            }) => Some(ResultColumn {
                name: discriminator.clone(),
                store_type: Some(*discriminator_type),
            }),
            Some(_) => Some(ResultColumn {
                name: String::from(DISCRIMINATOR_ALIAS),
                store_type: StoreType::infer(&self.model.get(name)?.discriminator_value()).ok(),
            }),
        };
        if let Some(discriminator) = discriminator {
            if !columns.iter().any(|c| c.name == discriminator.name) {
                columns.push(discriminator);
            }
        }
        Ok(columns)
    }

    fn entity_filter(&self, name: &str, alias: &str) -> Result<Option<Expr>> {
        let filters = self
            .model
            .ancestry(name)?
            .into_iter()
            .filter_map(|e| self.filters.get(&e.name))
            .map(|f| f.qualified_by(alias))
            .collect::<Vec<_>>();
        Ok(Expr::conjoin(filters))
    }

    fn discriminator_predicate(&self, name: &str, column: Expr) -> Result<Expr> {
        let mut values: Vec<Expr> = self
            .model
            .concrete_types(name)?
            .into_iter()
            .map(|e| Expr::Constant(e.discriminator_value()))
            .collect();
        let predicate = match values.len() {
            0 => Expr::Constant(SqlValue::Bool(false)),
            1 => Expr::binary(column, BinaryOp::Eq, values.remove(0)),
            _ => Expr::InList {
                expr: Box::new(column),
                list: values,
                negated: false,
            },
        };
        Ok(predicate)
    }

    /// `SELECT <columns>, <discriminator> AS [Discriminator] FROM <root>
    /// INNER JOIN <ancestors and self> LEFT JOIN <descendants>`.
    fn table_per_type(&self, entity: &EntityType) -> Result<SqlFragment> {
        let key = self.model.key(&entity.name)?;
        if key.is_empty() {
            return Err(TranslateError::untranslatable(format!(
                "table-per-type entity '{}' has no key",
                entity.name
            )));
        }
        let ancestry = self.model.ancestry(&entity.name)?;
        let descendants = self.model.descendants(&entity.name)?;
        let tables: Vec<&EntityType> = ancestry.iter().chain(&descendants).copied().collect();

        let mut items = Vec::new();
        for column in self.model.hierarchy_columns(&entity.name)? {
            let owner = tables
                .iter()
                .find(|t| declares(t, column))
                .unwrap_or(&tables[0]);
            items.push(format!(
                "{}.{}",
                self.quote(&owner.table),
                self.quote(&column.name)
            ));
        }
        let discriminator = self.synthesized_discriminator(entity, &descendants, &key[0])?;
        items.push(format!(
            "{} AS {}",
            discriminator.sql,
            self.quote(DISCRIMINATOR_ALIAS)
        ));

        let root = self.quote(&tables[0].table);
        let mut from = root.clone();
        for (index, table) in tables.iter().enumerate().skip(1) {
            let keyword = if index < ancestry.len() {
                "INNER JOIN"
            } else {
                "LEFT JOIN"
            };
            if index > 1 {
                from = format!("({from})");
            }
            let quoted = self.quote(&table.table);
            let on = key
                .iter()
                .map(|k| {
                    let k = self.quote(k);
                    format!("{root}.{k} = {quoted}.{k}")
                })
                .collect::<Vec<_>>()
                .join(" AND ");
            from = format!("{from} {keyword} {quoted} ON {on}");
        }
        Ok(SqlFragment::raw(format!(
            "SELECT {} FROM {from}",
            items.join(", ")
        )))
    }

    /// Nested `IIF` over the presence of each concrete descendant's row,
    /// deepest types first, falling back to the entity's own value.
    fn synthesized_discriminator(
        &self,
        entity: &EntityType,
        descendants: &[&EntityType],
        key: &str,
    ) -> Result<SqlFragment> {
        let mut result = if entity.is_abstract {
            SqlFragment::raw("NULL")
        } else {
            SqlFragment::raw(self.rules.format_literal(&entity.discriminator_value())?)
        };
        let mut concrete: Vec<(usize, &EntityType)> = Vec::new();
        for descendant in descendants.iter().filter(|d| !d.is_abstract) {
            concrete.push((self.model.ancestry(&descendant.name)?.len(), descendant));
        }
        concrete.sort_by_key(|(depth, _)| std::cmp::Reverse(*depth));
        for (_, descendant) in concrete.into_iter().rev() {
            let test = SqlFragment::raw(format!(
                "{}.{} IS NOT NULL",
                self.quote(&descendant.table),
                self.quote(key)
            ))
            .with_prec(3);
            let value =
                SqlFragment::raw(self.rules.format_literal(&descendant.discriminator_value())?);
            result = iif(test, value, result);
        }
        Ok(result)
    }

    /// One branch per concrete type, each projecting the full hierarchy
    /// column list in the same order.
    fn table_per_concrete_type(&self, entity: &EntityType, distinct: bool) -> Result<SqlFragment> {
        let concrete = self.model.concrete_types(&entity.name)?;
        if concrete.is_empty() {
            return Err(TranslateError::untranslatable(format!(
                "entity '{}' has no concrete types to read",
                entity.name
            )));
        }
        let columns = self.model.hierarchy_columns(&entity.name)?;
        let mut branches = Vec::with_capacity(concrete.len());
        for branch_type in concrete {
            let carried = self.model.inherited_columns(&branch_type.name)?;
            let mut items = Vec::with_capacity(columns.len() + 1);
            for column in &columns {
                let quoted = self.quote(&column.name);
                if carried.iter().any(|c| c.name == column.name) {
                    items.push(quoted);
                } else {
                    let null = self.rules.typed_null(column.store_type)?;
                    items.push(format!("{null} AS {quoted}"));
                }
            }
            items.push(format!(
                "{} AS {}",
                self.rules.format_literal(&branch_type.discriminator_value())?,
                self.quote(DISCRIMINATOR_ALIAS)
            ));
            branches.push(format!(
                "SELECT {} FROM {}",
                items.join(", "),
                self.quote(&branch_type.table)
            ));
        }
        let separator = if distinct { " UNION " } else { " UNION ALL " };
        Ok(SqlFragment::raw(branches.join(separator)))
    }
}

fn declares(entity: &EntityType, column: &ColumnDef) -> bool {
    entity.columns.iter().any(|c| c.name == column.name)
}

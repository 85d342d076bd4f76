//! Entity model: tables, columns and inheritance mapping.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslateError};
use crate::types::StoreType;
use crate::value::SqlValue;

/// Output name of the synthesized discriminator column.
pub const DISCRIMINATOR_ALIAS: &str = "Discriminator";

/// A mapped column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Store type.
    pub store_type: StoreType,
    /// Whether the column admits NULL.
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnDef {
    /// Creates a non-nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, store_type: StoreType) -> Self {
        Self {
            name: name.into(),
            store_type,
            nullable: false,
        }
    }

    /// Marks the column nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// How a hierarchy is laid out in tables. Declared on the root type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceStrategy {
    /// One table for the whole hierarchy, rows told apart by a
    /// discriminator column.
    SingleTable {
        /// Discriminator column name.
        discriminator: String,
        /// Discriminator store type.
        discriminator_type: StoreType,
        /// Every row's discriminator maps to a type of the model, so
        /// reading the root needs no discriminator predicate.
        #[serde(default)]
        complete: bool,
    },
    /// One table per type holding only the columns the type declares,
    /// joined on the key.
    TablePerType,
    /// One table per concrete type holding every inherited column.
    TablePerConcreteType {
        /// Combine branches with UNION instead of UNION ALL.
        #[serde(default)]
        distinct: bool,
    },
}

/// A mapped entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    /// Type name.
    pub name: String,
    /// Table the type's own columns live in.
    pub table: String,
    /// Base type, if any.
    #[serde(default)]
    pub base: Option<String>,
    /// Columns declared by this type, excluding inherited ones.
    pub columns: Vec<ColumnDef>,
    /// Key column names. Declared on the root; inherited otherwise.
    #[serde(default)]
    pub key: Vec<String>,
    /// Discriminator value. Defaults to the type name.
    #[serde(default)]
    pub discriminator: Option<SqlValue>,
    /// Abstract types have no rows of their own.
    #[serde(default)]
    pub is_abstract: bool,
    /// Inheritance strategy. Only read on root types.
    #[serde(default)]
    pub strategy: Option<InheritanceStrategy>,
}

impl EntityType {
    /// Creates a root entity type mapped to `table`.
    #[must_use]
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            base: None,
            columns: vec![],
            key: vec![],
            discriminator: None,
            is_abstract: false,
            strategy: None,
        }
    }

    /// Sets the base type.
    #[must_use]
    pub fn derives(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the key columns.
    #[must_use]
    pub fn key(mut self, columns: &[&str]) -> Self {
        self.key = columns.iter().map(|s| String::from(*s)).collect();
        self
    }

    /// Sets the discriminator value.
    #[must_use]
    pub fn discriminator(mut self, value: SqlValue) -> Self {
        self.discriminator = Some(value);
        self
    }

    /// Marks the type abstract.
    #[must_use]
    pub const fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Sets the inheritance strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: InheritanceStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Returns the discriminator value, defaulting to the type name.
    #[must_use]
    pub fn discriminator_value(&self) -> SqlValue {
        self.discriminator
            .clone()
            .unwrap_or_else(|| SqlValue::Text(self.name.clone()))
    }
}

/// The set of mapped entity types.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    /// Entity types in declaration order.
    #[serde(default)]
    pub entities: Vec<EntityType>,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities: Vec::new(),
        }
    }

    /// Adds an entity type.
    #[must_use]
    pub fn entity(mut self, entity: EntityType) -> Self {
        self.entities.push(entity);
        self
    }

    /// Looks up an entity type by name.
    pub fn get(&self, name: &str) -> Result<&EntityType> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| TranslateError::UnknownEntity(String::from(name)))
    }

    /// Returns the chain from the root down to `name`, inclusive.
    pub fn ancestry(&self, name: &str) -> Result<Vec<&EntityType>> {
        let mut current = self.get(name)?;
        let mut chain = vec![current];
        while let Some(base) = current.base.as_deref() {
            if chain.iter().any(|e| e.name == base) {
                return Err(TranslateError::untranslatable(format!(
                    "entity type '{name}' has a cyclic base chain"
                )));
            }
            current = self.get(base)?;
            chain.push(current);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Returns the root type of `name`'s hierarchy.
    pub fn root(&self, name: &str) -> Result<&EntityType> {
        self.ancestry(name)?
            .first()
            .copied()
            .ok_or_else(|| TranslateError::UnknownEntity(String::from(name)))
    }

    /// Returns every type deriving from `name`, directly or not, in
    /// declaration order.
    pub fn descendants(&self, name: &str) -> Result<Vec<&EntityType>> {
        self.get(name)?;
        let mut found: Vec<&EntityType> = Vec::new();
        let mut frontier = vec![name];
        while let Some(parent) = frontier.pop() {
            for entity in &self.entities {
                if entity.base.as_deref() == Some(parent) && !found.contains(&entity) {
                    found.push(entity);
                    frontier.push(&entity.name);
                }
            }
        }
        found.sort_by_key(|e| self.position(&e.name));
        Ok(found)
    }

    /// Returns the strategy of `name`'s hierarchy.
    pub fn strategy(&self, name: &str) -> Result<Option<&InheritanceStrategy>> {
        Ok(self.root(name)?.strategy.as_ref())
    }

    /// Returns the key columns of `name`, inherited from the root.
    pub fn key(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.root(name)?.key.clone())
    }

    /// Returns the columns a row of `name` carries: inherited and own
    /// columns, in root-to-leaf order.
    pub fn inherited_columns(&self, name: &str) -> Result<Vec<&ColumnDef>> {
        let mut columns: Vec<&ColumnDef> = Vec::new();
        for entity in self.ancestry(name)? {
            push_unique(&mut columns, &entity.columns);
        }
        Ok(columns)
    }

    /// Returns the columns needed to materialize any row of `name` or its
    /// descendants.
    pub fn hierarchy_columns(&self, name: &str) -> Result<Vec<&ColumnDef>> {
        let mut columns = self.inherited_columns(name)?;
        for entity in self.descendants(name)? {
            push_unique(&mut columns, &entity.columns);
        }
        Ok(columns)
    }

    /// Returns `name` and its descendants that can have rows.
    pub fn concrete_types(&self, name: &str) -> Result<Vec<&EntityType>> {
        let mut types = vec![self.get(name)?];
        types.extend(self.descendants(name)?);
        types.retain(|e| !e.is_abstract);
        Ok(types)
    }

    fn position(&self, name: &str) -> usize {
        self.entities
            .iter()
            .position(|e| e.name == name)
            .unwrap_or(usize::MAX)
    }
}

fn push_unique<'a>(columns: &mut Vec<&'a ColumnDef>, new: &'a [ColumnDef]) {
    for column in new {
        if !columns.iter().any(|c| c.name == column.name) {
            columns.push(column);
        }
    }
}

//! Query shapes and DML commands.

use serde::{Deserialize, Serialize};

use crate::raw::RawSql;

use super::Expr;

/// A projected expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// The expression.
    pub expr: Expr,
    /// Output alias.
    #[serde(default)]
    pub alias: Option<String>,
}

/// An ORDER BY item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    /// The sort key.
    pub expr: Expr,
    /// Sort descending.
    #[serde(default)]
    pub descending: bool,
}

/// Row limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paging {
    /// Rows to skip. Any value, including 0, selects the SKIP/FETCH form.
    #[serde(default)]
    pub skip: Option<u64>,
    /// Rows to return.
    #[serde(default)]
    pub take: Option<u64>,
}

/// Set operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOperationKind {
    Union,
    UnionAll,
    Intersect,
    Except,
}

/// A set operation between two queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    /// The operator.
    pub kind: SetOperationKind,
    /// Left branch.
    pub left: QueryShape,
    /// Right branch.
    pub right: QueryShape,
}

/// How a source is joined to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Cross,
}

/// What a source reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A table, by name.
    Table(String),
    /// An entity type of the model. Inheritance mapping and query filters
    /// apply.
    Entity(String),
    /// A derived table.
    Derived(Box<QueryShape>),
    /// A composable raw SQL fragment.
    Raw(RawSql),
}

/// A row source of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSource {
    /// What to read.
    pub kind: SourceKind,
    /// Alias. Derived and raw sources without one get a generated alias.
    #[serde(default)]
    pub alias: Option<String>,
    /// Join kind. Ignored for the first source.
    #[serde(default)]
    pub join: JoinKind,
    /// Join condition for inner and left joins.
    #[serde(default)]
    pub on: Option<Expr>,
}

/// A caller-supplied annotation emitted as a leading SQL comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// Free text, one comment line per text line.
    Text(String),
    /// The call site that issued the query.
    CallSite {
        /// Source file path.
        file: String,
        /// Line number.
        line: u32,
    },
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryShape {
    /// SELECT DISTINCT.
    pub distinct: bool,
    /// Projections. Empty selects every column.
    pub projections: Vec<Projection>,
    /// Sources in declaration order.
    pub sources: Vec<TableSource>,
    /// WHERE predicate.
    pub predicate: Option<Expr>,
    /// GROUP BY keys.
    pub group_by: Vec<Expr>,
    /// HAVING predicate.
    pub having: Option<Expr>,
    /// ORDER BY items.
    pub order_by: Vec<Ordering>,
    /// Row limiting.
    pub paging: Option<Paging>,
    /// Set operation this query is made of, instead of sources.
    pub set_operation: Option<Box<SetOperation>>,
    /// Leading comment tags. Only honoured on the outermost query.
    pub tags: Vec<Tag>,
}

/// A column assignment of an INSERT or UPDATE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Target column.
    pub column: String,
    /// New value.
    pub value: Expr,
}

/// INSERT INTO ... VALUES.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertCommand {
    /// Target table.
    pub table: String,
    /// Column values in order.
    pub values: Vec<Assignment>,
    /// Follow up with `SELECT @@IDENTITY`.
    #[serde(default)]
    pub select_identity: bool,
}

/// UPDATE ... SET ... WHERE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCommand {
    /// Target table.
    pub table: String,
    /// Assignments in order.
    pub assignments: Vec<Assignment>,
    /// Row predicate.
    #[serde(default)]
    pub predicate: Option<Expr>,
}

/// DELETE FROM ... WHERE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteCommand {
    /// Target table.
    pub table: String,
    /// Row predicate.
    #[serde(default)]
    pub predicate: Option<Expr>,
}

/// Anything the translator accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Select(QueryShape),
    Insert(InsertCommand),
    Update(UpdateCommand),
    Delete(DeleteCommand),
}

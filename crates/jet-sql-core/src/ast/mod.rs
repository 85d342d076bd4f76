//! Provider-neutral plans: expressions, query shapes, commands and the
//! entity model they refer to.

mod expr;
mod model;
mod query;

pub use expr::{BinaryOp, ClosureRef, ColumnRef, DateUnit, Expr, Function, ParameterSpec, UnaryOp};
pub use model::{ColumnDef, EntityType, InheritanceStrategy, Model, DISCRIMINATOR_ALIAS};
pub use query::{
    Assignment, Command, DeleteCommand, InsertCommand, JoinKind, Ordering, Paging, Projection,
    QueryShape, SetOperation, SetOperationKind, SourceKind, TableSource, Tag, UpdateCommand,
};

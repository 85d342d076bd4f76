//! Fluent plan builders.
//!
//! Plans can be written as plain [`crate::ast`] values or built with these
//! helpers. DML builders use the typestate pattern, so an incomplete
//! command does not compile.
//!
//! # Example
//!
//! ```rust
//! use jet_sql_core::builder::{col, param, Query, Update};
//!
//! let query = Query::table("Orders", "o")
//!     .filter(col("o", "ShipCountry").eq(param("France")))
//!     .select(col("o", "OrderID"))
//!     .build();
//! assert_eq!(query.projections.len(), 1);
//!
//! let update = Update::table("Orders")
//!     .set("Freight", param(10.5))
//!     .where_clause(col("Orders", "OrderID").eq(param(10248)))
//!     .build();
//! # let _ = update;
//! ```

mod dml;
mod expr;
mod query;

pub use dml::{Delete, HasSet, HasValues, HasWhere, Insert, NoSet, NoValues, NoWhere, Update};
pub use expr::{
    call, case_when, closure, col, column, count_all, exists, lit, named_param, param, subquery,
    ExprBuilder,
};
pub use query::Query;

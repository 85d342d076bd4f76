//! # jet-sql-core
//!
//! Translates provider-neutral query and DML plans into SQL for the
//! Jet/Access database engine.
//!
//! This crate provides:
//! - Jet dialect rules: bracket quoting, `True`/`False`, `#date#` literals,
//!   `LIKE` escaping, `TOP` and `SKIP ... FETCH` paging
//! - Expression translation with the operator and function mappings Jet
//!   needs (`IIF`, `MOD`, `\`, `BAND`, `INSTR`, `DATEDIFF`, ...)
//! - Statement shapes for joins, derived tables, set operations and the
//!   three inheritance mapping strategies
//! - Query filters with per-context parameter resolution
//! - Raw SQL composition
//!
//! ## Translating a query
//!
//! ```rust
//! use jet_sql_core::builder::{col, param, Query};
//! use jet_sql_core::{DialectRules, Translator};
//!
//! let rules = DialectRules::jet();
//! let query = Query::table("Customers", "c")
//!     .filter(col("c", "ContactName").starts_with(param("M")))
//!     .select(col("c", "CustomerID"))
//!     .build();
//!
//! let statement = Translator::new(&rules).translate_query(&query).unwrap();
//! assert_eq!(
//!     statement.sql,
//!     "SELECT [c].[CustomerID]\nFROM [Customers] AS [c]\n\
//!      WHERE (@p0 = '' OR LEFT([c].[ContactName], LEN(@p0)) = @p0)"
//! );
//! assert_eq!(statement.distinct_parameters().len(), 1);
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values passed with [`builder::param`] are always bound, never inlined:
//!
//! ```rust
//! use jet_sql_core::builder::{col, param, Query};
//! use jet_sql_core::{DialectRules, SqlValue, Translator};
//!
//! let rules = DialectRules::jet();
//! let user_input = "'; DROP TABLE Customers; --";
//! let query = Query::table("Customers", "c")
//!     .filter(col("c", "City").eq(param(user_input)))
//!     .build();
//!
//! let statement = Translator::new(&rules).translate_query(&query).unwrap();
//! assert!(statement.sql.ends_with("WHERE [c].[City] = @p0"));
//! assert_eq!(statement.parameters[0].value, SqlValue::Text(user_input.into()));
//! ```

pub mod ast;
pub mod builder;
pub mod dialect;
pub mod error;
pub mod escape;
pub mod filter;
pub mod format;
pub mod raw;
pub mod statement;
pub mod translate;
pub mod types;
pub mod value;

pub use ast::{
    BinaryOp, ColumnDef, Command, EntityType, Expr, Function, InheritanceStrategy, Model,
    QueryShape, UnaryOp,
};
pub use dialect::{DialectRules, PagingStyle};
pub use error::{Result, TranslateError};
pub use filter::{FilterContext, QueryFilters, ResolvedFilters};
pub use raw::RawSql;
pub use statement::{Parameter, ResultColumn, Statement};
pub use translate::Translator;
pub use types::StoreType;
pub use value::{SqlValue, ToSqlValue};

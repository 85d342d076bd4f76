//! Tests for raw SQL composition and INSERT/UPDATE/DELETE commands.

mod common;
use common::*;

use pretty_assertions::assert_eq;

use jet_sql_core::builder::{col, lit, param, Delete, Insert, Query, Update};
use jet_sql_core::{RawSql, SqlValue, TranslateError, Translator};

fn london() -> RawSql {
    RawSql::new("SELECT * FROM [Customers] WHERE [City] = {0};")
        .with_parameters(vec![SqlValue::Text(String::from("London"))])
}

#[test]
fn raw_select_composes_as_derived_table() {
    let query = Query::raw(london(), "c")
        .filter(col("c", "ContactName").starts_with(lit("M")))
        .order_by(col("c", "CustomerID"))
        .build();
    let statement = translate(&query);
    assert_eq!(
        statement.sql,
        "SELECT *\n\
         FROM (SELECT * FROM [Customers] WHERE [City] = @p0) AS [c]\n\
         WHERE [c].[ContactName] LIKE 'M%'\n\
         ORDER BY [c].[CustomerID]"
    );
    assert_eq!(parameter_names(&statement), ["p0"]);
}

#[test]
fn raw_arguments_share_numbering_with_query_parameters() {
    let query = Query::raw(london(), "c")
        .filter(col("c", "Country").eq(param("UK")))
        .build();
    let statement = translate(&query);
    assert!(statement.sql.ends_with("WHERE [c].[Country] = @p1"), "{}", statement.sql);
    assert_eq!(parameter_names(&statement), ["p0", "p1"]);
}

#[test]
fn repeated_raw_argument_binds_once() {
    let raw = RawSql::new("SELECT * FROM [Orders] WHERE [ShipCity] = {0} OR [City] = {0}")
        .with_parameters(vec![SqlValue::Text(String::from("Lyon"))]);
    let rules = DialectRules::jet();
    let statement = Translator::new(&rules).translate_raw(&raw).unwrap();
    assert_eq!(
        statement.sql,
        "SELECT * FROM [Orders] WHERE [ShipCity] = @p0 OR [City] = @p0"
    );
    assert_eq!(statement.distinct_parameters().len(), 1);
}

#[test]
fn raw_cte_cannot_be_composed() {
    let raw = RawSql::new("WITH t AS (SELECT 1 AS x) SELECT * FROM t");
    let query = Query::raw(raw, "r").build();
    assert!(matches!(
        translate_err(&query),
        TranslateError::NonComposableRawSql { .. }
    ));
}

#[test]
fn raw_statement_is_not_checked_for_composability() {
    let raw = RawSql::new("EXEC [Ten Most Expensive Products]");
    let rules = DialectRules::jet();
    let statement = Translator::new(&rules).translate_raw(&raw).unwrap();
    assert_eq!(statement.sql, "EXEC [Ten Most Expensive Products]");
}

#[test]
fn raw_argument_out_of_range_is_an_error() {
    let raw = RawSql::new("SELECT * FROM [Orders] WHERE [OrderID] = {1}")
        .with_parameters(vec![SqlValue::Int(10248)]);
    let rules = DialectRules::jet();
    assert!(Translator::new(&rules).translate_raw(&raw).is_err());
}

#[test]
fn insert_with_identity_yields_two_statements() {
    let command = Insert::into_table("Categories")
        .value("CategoryName", param("Seafood"))
        .value("Description", param("Seaweed and fish"))
        .select_identity()
        .build();
    let rules = DialectRules::jet();
    let statements = Translator::new(&rules).translate_command(&command).unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0].sql,
        "INSERT INTO [Categories] ([CategoryName], [Description])\nVALUES (@p0, @p1)"
    );
    assert_eq!(
        statements[0].declarations(&rules).unwrap(),
        [
            "@p0='Seafood' (Size = 255)",
            "@p1='Seaweed and fish' (Size = 255)"
        ]
    );
    assert_eq!(statements[1].sql, "SELECT @@IDENTITY");
}

#[test]
fn update_with_boolean_assignment() {
    let command = Update::table("Products")
        .set("Discontinued", lit(true))
        .set("UnitsInStock", param(0))
        .where_clause(col("Products", "ProductID").eq(param(17)))
        .build();
    let rules = DialectRules::jet();
    let statements = Translator::new(&rules).translate_command(&command).unwrap();
    assert_eq!(
        statements[0].sql,
        "UPDATE [Products] SET [Discontinued] = True, [UnitsInStock] = @p0\n\
         WHERE [Products].[ProductID] = @p1"
    );
}

#[test]
fn delete_without_predicate() {
    let command = Delete::from_table("Order Details").all_rows().build();
    let rules = DialectRules::jet();
    let statements = Translator::new(&rules).translate_command(&command).unwrap();
    assert_eq!(statements[0].sql, "DELETE FROM [Order Details]");
}

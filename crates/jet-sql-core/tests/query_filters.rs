//! Tests for query filters: closure promotion, placement in nested and
//! joined queries, and isolation between contexts.

mod common;
use common::*;

use pretty_assertions::assert_eq;

use jet_sql_core::builder::{closure, col, column, exists, lit, param, Query};
use jet_sql_core::filter::FILTER_PARAMETER_PREFIX;
use jet_sql_core::{FilterContext, QueryFilters, SqlValue};

const TENANT_FILTER: &str = "(@ef_filter__TenantPrefix_0 = '' OR \
     LEFT([c].[CompanyName], LEN(@ef_filter__TenantPrefix_0)) = @ef_filter__TenantPrefix_0)";

#[test]
fn filter_precedes_query_predicate() {
    let model = northwind();
    let filters = tenant_filters().for_context(&northwind_context("B")).unwrap();
    let query = Query::entity("Customer", "c")
        .filter(col("c", "City").eq(param("London")))
        .build();
    let statement = translate_with(&model, &filters, &query);
    assert_eq!(
        statement.sql,
        format!(
            "SELECT [c].[CustomerID], [c].[CompanyName], [c].[ContactName], [c].[City]\n\
             FROM [Customers] AS [c]\n\
             WHERE {TENANT_FILTER} AND [c].[City] = @p0"
        )
    );
    let distinct: Vec<&str> = statement
        .distinct_parameters()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(distinct, ["ef_filter__TenantPrefix_0", "p0"]);
    assert_eq!(
        statement.parameters[0].value,
        SqlValue::Text(String::from("B"))
    );
}

#[test]
fn filter_applies_inside_subquery() {
    let model = northwind();
    let filters = tenant_filters().for_context(&northwind_context("B")).unwrap();
    let customers = Query::entity("Customer", "c")
        .filter(col("c", "CustomerID").eq(col("o", "CustomerID")))
        .select(lit(1))
        .build();
    let query = Query::table("Orders", "o").filter(exists(customers)).build();
    let statement = translate_with(&model, &filters, &query);
    assert_eq!(
        statement.sql,
        format!(
            "SELECT *\nFROM [Orders] AS [o]\n\
             WHERE EXISTS (SELECT 1 FROM [Customers] AS [c] \
             WHERE {TENANT_FILTER} AND [c].[CustomerID] = [o].[CustomerID])"
        )
    );
}

#[test]
fn filter_of_joined_entity_goes_into_on() {
    let model = northwind();
    let filters = tenant_filters().for_context(&northwind_context("B")).unwrap();
    let query = Query::table("Orders", "o")
        .join_entity(
            "Customer",
            "c",
            col("c", "CustomerID").eq(col("o", "CustomerID")),
        )
        .select(col("o", "OrderID"))
        .build();
    let statement = translate_with(&model, &filters, &query);
    assert_eq!(
        statement.sql,
        format!(
            "SELECT [o].[OrderID]\n\
             FROM [Orders] AS [o] INNER JOIN [Customers] AS [c] \
             ON [c].[CustomerID] = [o].[CustomerID] AND {TENANT_FILTER}"
        )
    );
}

#[test]
fn contexts_resolve_independently() {
    let model = northwind();
    let filters = tenant_filters();
    let query = Query::entity("Customer", "c").build();

    let first = filters.for_context(&northwind_context("A")).unwrap();
    let second = filters.for_context(&northwind_context("Z")).unwrap();
    let a = translate_with(&model, &first, &query);
    let z = translate_with(&model, &second, &query);

    assert_eq!(a.sql, z.sql);
    assert_eq!(a.parameters[0].value, SqlValue::Text(String::from("A")));
    assert_eq!(z.parameters[0].value, SqlValue::Text(String::from("Z")));

    let other = filters.for_context(&FilterContext::new("Reporting")).unwrap();
    assert!(other.is_empty());
    let unfiltered = translate_with(&model, &other, &query);
    assert!(unfiltered.parameters.is_empty());
}

#[test]
fn foreign_closure_uses_captured_value() {
    let model = northwind();
    let filters = QueryFilters::new()
        .with_filter(
            NORTHWIND,
            "Customer",
            column("City")
                .eq(closure("Defaults", "HomeCity").captured("Berlin"))
                .build(),
        )
        .for_context(&northwind_context("B"))
        .unwrap();
    let statement = translate_with(&model, &filters, &Query::entity("Customer", "c").build());
    assert!(
        statement.sql.ends_with("WHERE [c].[City] = 'Berlin'"),
        "{}",
        statement.sql
    );
}

#[test]
fn missing_member_is_an_error() {
    let context = FilterContext::new(NORTHWIND);
    assert!(tenant_filters().for_context(&context).is_err());
}

#[test]
fn empty_list_closure_never_matches() {
    let model = northwind();
    let context =
        FilterContext::new(NORTHWIND).with_value("Allowed", SqlValue::List(vec![]));
    let filters = QueryFilters::new()
        .with_filter(
            NORTHWIND,
            "Customer",
            column("CustomerID")
                .in_list(vec![closure(NORTHWIND, "Allowed")])
                .build(),
        )
        .for_context(&context)
        .unwrap();
    let statement = translate_with(&model, &filters, &Query::entity("Customer", "c").build());
    assert!(
        statement.sql.ends_with("WHERE True = False"),
        "{}",
        statement.sql
    );
}

#[test]
fn list_closure_is_spread_into_constants() {
    let model = northwind();
    let context = FilterContext::new(NORTHWIND).with_value(
        "Allowed",
        SqlValue::List(vec![
            SqlValue::Text(String::from("ALFKI")),
            SqlValue::Text(String::from("ANATR")),
        ]),
    );
    let filters = QueryFilters::new()
        .with_filter(
            NORTHWIND,
            "Customer",
            column("CustomerID")
                .in_list(vec![closure(NORTHWIND, "Allowed")])
                .build(),
        )
        .for_context(&context)
        .unwrap();
    let statement = translate_with(&model, &filters, &Query::entity("Customer", "c").build());
    assert!(
        statement
            .sql
            .ends_with("WHERE [c].[CustomerID] IN ('ALFKI', 'ANATR')"),
        "{}",
        statement.sql
    );
}

#[test]
fn filter_parameters_use_reserved_prefix() {
    let model = northwind();
    let filters = tenant_filters().for_context(&northwind_context("B")).unwrap();
    let statement = translate_with(&model, &filters, &Query::entity("Customer", "c").build());
    assert!(statement
        .parameters
        .iter()
        .all(|p| p.name.starts_with(FILTER_PARAMETER_PREFIX)));
}

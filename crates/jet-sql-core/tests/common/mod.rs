#![allow(dead_code)]

use jet_sql_core::builder::{closure, column};
use jet_sql_core::{
    ColumnDef, EntityType, FilterContext, InheritanceStrategy, Model, QueryFilters, QueryShape,
    ResolvedFilters, SqlValue, Statement, StoreType, TranslateError, Translator,
};

pub use jet_sql_core::DialectRules;

pub const NORTHWIND: &str = "Northwind";

/// Customers and orders, without inheritance.
pub fn northwind() -> Model {
    Model::new()
        .entity(
            EntityType::new("Customer", "Customers")
                .key(&["CustomerID"])
                .column(ColumnDef::new("CustomerID", StoreType::VarChar(5)))
                .column(ColumnDef::new("CompanyName", StoreType::VarChar(40)))
                .column(ColumnDef::new("ContactName", StoreType::VarChar(30)).nullable())
                .column(ColumnDef::new("City", StoreType::VarChar(15)).nullable()),
        )
        .entity(
            EntityType::new("Order", "Orders")
                .key(&["OrderID"])
                .column(ColumnDef::new("OrderID", StoreType::Integer))
                .column(ColumnDef::new("CustomerID", StoreType::VarChar(5)).nullable())
                .column(ColumnDef::new("OrderDate", StoreType::DateTime).nullable()),
        )
}

/// Customers whose company name starts with the context's tenant prefix.
pub fn tenant_filters() -> QueryFilters {
    QueryFilters::new().with_filter(
        NORTHWIND,
        "Customer",
        column("CompanyName")
            .starts_with(closure(NORTHWIND, "TenantPrefix"))
            .build(),
    )
}

pub fn northwind_context(prefix: &str) -> FilterContext {
    FilterContext::new(NORTHWIND).with_value("TenantPrefix", SqlValue::Text(String::from(prefix)))
}

/// Animal (abstract) <- Bird (abstract) <- Kiwi, Eagle.
pub fn animals(strategy: InheritanceStrategy) -> Model {
    Model::new()
        .entity(
            EntityType::new("Animal", "Animals")
                .abstract_type()
                .key(&["Id"])
                .column(ColumnDef::new("Id", StoreType::Integer))
                .column(ColumnDef::new("Name", StoreType::VarChar(255)))
                .strategy(strategy),
        )
        .entity(
            EntityType::new("Bird", "Birds")
                .derives("Animal")
                .abstract_type()
                .column(ColumnDef::new("Id", StoreType::Integer))
                .column(ColumnDef::new("CanFly", StoreType::Bit)),
        )
        .entity(
            EntityType::new("Kiwi", "Kiwis")
                .derives("Bird")
                .column(ColumnDef::new("Id", StoreType::Integer))
                .column(ColumnDef::new("FoundOn", StoreType::Byte)),
        )
        .entity(
            EntityType::new("Eagle", "Eagles")
                .derives("Bird")
                .column(ColumnDef::new("Id", StoreType::Integer))
                .column(ColumnDef::new("Group", StoreType::Integer)),
        )
}

pub fn single_table() -> InheritanceStrategy {
    InheritanceStrategy::SingleTable {
        discriminator: String::from("Discriminator"),
        discriminator_type: StoreType::VarChar(255),
        complete: true,
    }
}

pub fn translate(query: &QueryShape) -> Statement {
    let rules = DialectRules::jet();
    Translator::new(&rules)
        .translate_query(query)
        .unwrap_or_else(|e| panic!("Failed to translate: {query:?}\nError: {e}"))
}

pub fn translate_with(model: &Model, filters: &ResolvedFilters, query: &QueryShape) -> Statement {
    let rules = DialectRules::jet();
    Translator::new(&rules)
        .with_model(model)
        .with_filters(filters)
        .translate_query(query)
        .unwrap_or_else(|e| panic!("Failed to translate: {query:?}\nError: {e}"))
}

pub fn translate_err(query: &QueryShape) -> TranslateError {
    let rules = DialectRules::jet();
    Translator::new(&rules)
        .translate_query(query)
        .expect_err(&format!("Expected translation error for: {query:?}"))
}

/// Parameter names in placeholder order.
pub fn parameter_names(statement: &Statement) -> Vec<&str> {
    statement
        .parameters
        .iter()
        .map(|p| p.name.as_str())
        .collect()
}

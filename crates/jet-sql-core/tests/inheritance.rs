//! Tests for the three inheritance mapping strategies.

mod common;
use common::*;

use pretty_assertions::assert_eq;

use jet_sql_core::builder::{col, column, lit, Query};
use jet_sql_core::{InheritanceStrategy, QueryFilters, ResolvedFilters, StoreType, TranslateError};

fn read(model: &jet_sql_core::Model, entity: &str) -> jet_sql_core::Statement {
    translate_with(model, &ResolvedFilters::empty(), &Query::entity(entity, "a").build())
}

#[test]
fn single_table_complete_root_has_no_discriminator_predicate() {
    let model = animals(single_table());
    assert_eq!(
        read(&model, "Animal").sql,
        "SELECT [a].[Id], [a].[Name], [a].[CanFly], [a].[FoundOn], [a].[Group], [a].[Discriminator]\n\
         FROM [Animals] AS [a]"
    );
}

#[test]
fn single_table_abstract_type_uses_in() {
    let model = animals(single_table());
    assert_eq!(
        read(&model, "Bird").sql,
        "SELECT [a].[Id], [a].[Name], [a].[CanFly], [a].[FoundOn], [a].[Group], [a].[Discriminator]\n\
         FROM [Animals] AS [a]\n\
         WHERE [a].[Discriminator] IN ('Kiwi', 'Eagle')"
    );
}

#[test]
fn single_table_discriminator_precedes_filter() {
    let model = animals(single_table());
    let filters = QueryFilters::new()
        .with_filter(
            NORTHWIND,
            "Animal",
            column("Name").not_eq(lit("Unknown")).build(),
        )
        .for_context(&jet_sql_core::FilterContext::new(NORTHWIND))
        .unwrap();
    let query = Query::entity("Kiwi", "k")
        .select(col("k", "Name"))
        .filter(col("k", "FoundOn").eq(lit(1)))
        .build();
    assert_eq!(
        translate_with(&model, &filters, &query).sql,
        "SELECT [k].[Name]\n\
         FROM [Animals] AS [k]\n\
         WHERE [k].[Discriminator] = 'Kiwi' AND [k].[Name] <> 'Unknown' AND [k].[FoundOn] = 1"
    );
}

#[test]
fn single_table_result_columns_carry_types() {
    let model = animals(single_table());
    let statement = read(&model, "Kiwi");
    let last = statement.columns.last().unwrap();
    assert_eq!(last.name, "Discriminator");
    assert_eq!(last.store_type, Some(StoreType::VarChar(255)));
    assert_eq!(statement.columns.len(), 5);
}

#[test]
fn table_per_type_leaf_joins_ancestors() {
    let model = animals(InheritanceStrategy::TablePerType);
    assert_eq!(
        read(&model, "Kiwi").sql,
        "SELECT [a].[Id], [a].[Name], [a].[CanFly], [a].[FoundOn], [a].[Discriminator]\n\
         FROM (SELECT [Animals].[Id], [Animals].[Name], [Birds].[CanFly], [Kiwis].[FoundOn], \
         'Kiwi' AS [Discriminator] \
         FROM ([Animals] INNER JOIN [Birds] ON [Animals].[Id] = [Birds].[Id]) \
         INNER JOIN [Kiwis] ON [Animals].[Id] = [Kiwis].[Id]) AS [a]"
    );
}

#[test]
fn table_per_type_abstract_type_joins_descendants() {
    let model = animals(InheritanceStrategy::TablePerType);
    assert_eq!(
        read(&model, "Bird").sql,
        "SELECT [a].[Id], [a].[Name], [a].[CanFly], [a].[FoundOn], [a].[Group], [a].[Discriminator]\n\
         FROM (SELECT [Animals].[Id], [Animals].[Name], [Birds].[CanFly], [Kiwis].[FoundOn], [Eagles].[Group], \
         IIF([Kiwis].[Id] IS NOT NULL, 'Kiwi', IIF([Eagles].[Id] IS NOT NULL, 'Eagle', NULL)) AS [Discriminator] \
         FROM (([Animals] INNER JOIN [Birds] ON [Animals].[Id] = [Birds].[Id]) \
         LEFT JOIN [Kiwis] ON [Animals].[Id] = [Kiwis].[Id]) \
         LEFT JOIN [Eagles] ON [Animals].[Id] = [Eagles].[Id]) AS [a]"
    );
}

#[test]
fn table_per_concrete_type_branches_align() {
    let model = animals(InheritanceStrategy::TablePerConcreteType { distinct: false });
    let statement = read(&model, "Animal");
    assert_eq!(
        statement.sql,
        "SELECT [a].[Id], [a].[Name], [a].[CanFly], [a].[FoundOn], [a].[Group], [a].[Discriminator]\n\
         FROM (SELECT [Id], [Name], [CanFly], [FoundOn], IIF(False, CLNG(0), NULL) AS [Group], \
         'Kiwi' AS [Discriminator] FROM [Kiwis] \
         UNION ALL \
         SELECT [Id], [Name], [CanFly], IIF(False, CBYTE(0), NULL) AS [FoundOn], [Group], \
         'Eagle' AS [Discriminator] FROM [Eagles]) AS [a]"
    );

    let start = statement.sql.find("(SELECT").unwrap() + 1;
    let end = statement.sql.rfind(") AS [a]").unwrap();
    let arities: Vec<usize> = statement.sql[start..end]
        .split(" UNION ALL ")
        .map(top_level_columns)
        .collect();
    assert_eq!(arities.len(), 2);
    assert_eq!(arities[0], arities[1]);
}

fn top_level_columns(branch: &str) -> usize {
    let mut depth = 0;
    let mut columns = 1;
    for c in branch.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => columns += 1,
            _ => {}
        }
    }
    columns
}

#[test]
fn table_per_concrete_type_distinct_uses_union() {
    let model = animals(InheritanceStrategy::TablePerConcreteType { distinct: true });
    let sql = read(&model, "Bird").sql;
    assert!(sql.contains(" FROM [Kiwis] UNION SELECT "), "{sql}");
}

#[test]
fn table_per_concrete_type_leaf_has_one_branch() {
    let model = animals(InheritanceStrategy::TablePerConcreteType { distinct: false });
    assert_eq!(
        read(&model, "Eagle").sql,
        "SELECT [a].[Id], [a].[Name], [a].[CanFly], [a].[Group], [a].[Discriminator]\n\
         FROM (SELECT [Id], [Name], [CanFly], [Group], 'Eagle' AS [Discriminator] FROM [Eagles]) AS [a]"
    );
}

#[test]
fn unknown_entity_is_an_error() {
    let model = animals(single_table());
    let rules = DialectRules::jet();
    let err = jet_sql_core::Translator::new(&rules)
        .with_model(&model)
        .translate_query(&Query::entity("Fish", "f").build())
        .unwrap_err();
    assert_eq!(err, TranslateError::UnknownEntity(String::from("Fish")));
}

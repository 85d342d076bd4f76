//! Query filters and closure parameterization.
//!
//! A query filter is a predicate registered for an entity type by a
//! context, such as a tenant restriction. Filters refer to per-context
//! values through [`ClosureRef`]s. Before translation the filters of the
//! current context are resolved: each closure, and each constant
//! sub-expression built only from closures and constants, is evaluated once
//! and promoted to a parameter named `ef_filter__<member>_<index>`.
//!
//! Closures owned by another context are never turned into parameters of
//! this statement. They are inlined from the value captured when the filter
//! was defined, or rejected when nothing was captured.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ast::{BinaryOp, ClosureRef, Expr, ParameterSpec, QueryShape, SourceKind, UnaryOp};
use crate::error::{Result, TranslateError};
use crate::value::SqlValue;

/// Prefix of parameters created from filter closures.
pub const FILTER_PARAMETER_PREFIX: &str = "ef_filter__";

/// A filter registered by a context for an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFilter {
    /// Owning context.
    pub context: String,
    /// Filtered entity type.
    pub entity: String,
    /// Predicate over the entity's unqualified columns.
    pub predicate: Expr,
}

/// The values a context exposes to its filters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterContext {
    /// Context name.
    pub name: String,
    /// Member values by name.
    #[serde(default)]
    pub values: BTreeMap<String, SqlValue>,
}

impl FilterContext {
    /// Creates a context without values.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Sets a member value.
    #[must_use]
    pub fn with_value(mut self, member: impl Into<String>, value: SqlValue) -> Self {
        self.values.insert(member.into(), value);
        self
    }
}

/// Registry of query filters across contexts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryFilters {
    filters: Vec<EntityFilter>,
}

impl QueryFilters {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Registers a filter.
    #[must_use]
    pub fn with_filter(
        mut self,
        context: impl Into<String>,
        entity: impl Into<String>,
        predicate: Expr,
    ) -> Self {
        self.add(EntityFilter {
            context: context.into(),
            entity: entity.into(),
            predicate,
        });
        self
    }

    /// Registers a filter.
    pub fn add(&mut self, filter: EntityFilter) {
        self.filters.push(filter);
    }

    /// Returns every registered filter.
    #[must_use]
    pub fn filters(&self) -> &[EntityFilter] {
        &self.filters
    }

    /// Resolves the filters registered by `context`.
    ///
    /// Several filters for the same entity are conjoined in registration
    /// order. Parameter names are shared across the whole resolution, so a
    /// member referenced by two filters yields one parameter.
    pub fn for_context(&self, context: &FilterContext) -> Result<ResolvedFilters> {
        let mut funcletizer = Funcletizer::new(context);
        let mut by_entity: BTreeMap<String, Expr> = BTreeMap::new();
        for filter in self.filters.iter().filter(|f| f.context == context.name) {
            let resolved = funcletizer.visit(&filter.predicate)?;
            let combined = match by_entity.remove(&filter.entity) {
                Some(existing) => existing.and(resolved),
                None => resolved,
            };
            by_entity.insert(filter.entity.clone(), combined);
        }
        Ok(ResolvedFilters { by_entity })
    }
}

/// Filters of one context with closures replaced by parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedFilters {
    by_entity: BTreeMap<String, Expr>,
}

impl ResolvedFilters {
    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            by_entity: BTreeMap::new(),
        }
    }

    /// Returns the filter of an entity type.
    #[must_use]
    pub fn get(&self, entity: &str) -> Option<&Expr> {
        self.by_entity.get(entity)
    }

    /// Returns true if no entity is filtered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

/// Resolves one filter expression against a context.
pub fn resolve_filter(filter: &Expr, context: &FilterContext) -> Result<Expr> {
    Funcletizer::new(context).visit(filter)
}

struct Funcletizer<'a> {
    context: &'a FilterContext,
    names: BTreeMap<String, String>,
    next_index: usize,
}

impl<'a> Funcletizer<'a> {
    const fn new(context: &'a FilterContext) -> Self {
        Self {
            context,
            names: BTreeMap::new(),
            next_index: 0,
        }
    }

    fn visit(&mut self, expr: &Expr) -> Result<Expr> {
        if let Expr::Closure(closure) = expr {
            return self.closure(closure);
        }
        if contains_closure(expr) && is_evaluable(expr) {
            let own = self.context.name.as_str();
            if all_closures(expr, &|c| c.context == own) {
                if let Some(value) = self.evaluate(expr)? {
                    let member = first_member(expr).unwrap_or("value");
                    let name = self.fresh_name(member);
                    trace!(parameter = %name, "folded filter sub-expression");
                    return Ok(parameter(name, value));
                }
            } else if all_closures(expr, &|c| c.context != own) {
                if let Some(value) = self.evaluate(expr)? {
                    return Ok(Expr::Constant(value));
                }
            }
        }
        let b = |e: Expr| Box::new(e);
        let resolved = match expr {
            Expr::Unary { op, operand } => Expr::Unary {
                op: *op,
                operand: b(self.visit(operand)?),
            },
            Expr::Binary { left, op, right } => Expr::Binary {
                left: b(self.visit(left)?),
                op: *op,
                right: b(self.visit(right)?),
            },
            Expr::Function { func, args } => Expr::Function {
                func: func.clone(),
                args: self.visit_all(args)?,
            },
            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => Expr::Case {
                operand: operand.as_deref().map(|e| self.visit(e)).transpose()?.map(b),
                when_clauses: when_clauses
                    .iter()
                    .map(|(w, t)| Ok((self.visit(w)?, self.visit(t)?)))
                    .collect::<Result<_>>()?,
                else_clause: else_clause
                    .as_deref()
                    .map(|e| self.visit(e))
                    .transpose()?
                    .map(b),
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => Expr::InList {
                expr: b(self.visit(expr)?),
                list: self.visit_in_list(list)?,
                negated: *negated,
            },
            Expr::InSubquery {
                expr,
                query,
                negated,
            } => Expr::InSubquery {
                expr: b(self.visit(expr)?),
                query: Box::new(self.visit_shape(query)?),
                negated: *negated,
            },
            Expr::Exists(query) => Expr::Exists(Box::new(self.visit_shape(query)?)),
            Expr::Subquery(query) => Expr::Subquery(Box::new(self.visit_shape(query)?)),
            Expr::IsNull { expr, negated } => Expr::IsNull {
                expr: b(self.visit(expr)?),
                negated: *negated,
            },
            Expr::Like {
                expr,
                pattern,
                negated,
            } => Expr::Like {
                expr: b(self.visit(expr)?),
                pattern: b(self.visit(pattern)?),
                negated: *negated,
            },
            Expr::Cast { expr, to } => Expr::Cast {
                expr: b(self.visit(expr)?),
                to: *to,
            },
            Expr::Collate { expr, collation } => Expr::Collate {
                expr: b(self.visit(expr)?),
                collation: collation.clone(),
            },
            Expr::Column(_) | Expr::Constant(_) | Expr::Parameter(_) | Expr::Closure(_) => {
                expr.clone()
            }
        };
        Ok(resolved)
    }

    fn visit_all(&mut self, exprs: &[Expr]) -> Result<Vec<Expr>> {
        exprs.iter().map(|e| self.visit(e)).collect()
    }

    /// List-valued closures inside IN are spread into constants; a list
    /// cannot be bound as one parameter.
    fn visit_in_list(&mut self, list: &[Expr]) -> Result<Vec<Expr>> {
        let mut items = Vec::with_capacity(list.len());
        for item in list {
            if let Expr::Closure(closure) = item {
                if let SqlValue::List(values) = self.closure_value(closure)? {
                    items.extend(values.into_iter().map(Expr::Constant));
                    continue;
                }
            }
            items.push(self.visit(item)?);
        }
        Ok(items)
    }

    fn visit_shape(&mut self, shape: &QueryShape) -> Result<QueryShape> {
        let mut shape = shape.clone();
        for projection in &mut shape.projections {
            projection.expr = self.visit(&projection.expr)?;
        }
        for source in &mut shape.sources {
            if let Some(on) = &source.on {
                source.on = Some(self.visit(on)?);
            }
            if let SourceKind::Derived(inner) = &source.kind {
                source.kind = SourceKind::Derived(Box::new(self.visit_shape(inner)?));
            }
        }
        if let Some(predicate) = &shape.predicate {
            shape.predicate = Some(self.visit(predicate)?);
        }
        if let Some(having) = &shape.having {
            shape.having = Some(self.visit(having)?);
        }
        shape.group_by = self.visit_all(&shape.group_by)?;
        for ordering in &mut shape.order_by {
            ordering.expr = self.visit(&ordering.expr)?;
        }
        Ok(shape)
    }

    fn closure(&mut self, closure: &ClosureRef) -> Result<Expr> {
        let value = self.closure_value(closure)?;
        if closure.context != self.context.name || matches!(value, SqlValue::List(_)) {
            return Ok(Expr::Constant(value));
        }
        let name = match self.names.get(&closure.member) {
            Some(name) => name.clone(),
            None => {
                let name = self.fresh_name(&closure.member);
                self.names.insert(closure.member.clone(), name.clone());
                name
            }
        };
        trace!(parameter = %name, member = %closure.member, "promoted filter closure");
        Ok(parameter(name, value))
    }

    fn closure_value(&self, closure: &ClosureRef) -> Result<SqlValue> {
        if closure.context == self.context.name {
            return self
                .context
                .values
                .get(&closure.member)
                .cloned()
                .ok_or_else(|| {
                    TranslateError::untranslatable(format!(
                        "context '{}' has no value for filter member '{}'",
                        self.context.name, closure.member
                    ))
                });
        }
        closure.captured.clone().ok_or_else(|| {
            TranslateError::untranslatable(format!(
                "filter member '{}' belongs to context '{}' and has no captured value",
                closure.member, closure.context
            ))
        })
    }

    fn evaluate(&self, expr: &Expr) -> Result<Option<SqlValue>> {
        let value = match expr {
            Expr::Closure(closure) => Some(self.closure_value(closure)?),
            Expr::Constant(value) => Some(value.clone()),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => match self.evaluate(operand)? {
                Some(SqlValue::Int(n)) => n.checked_neg().map(SqlValue::Int),
                Some(SqlValue::Float(f)) => Some(SqlValue::Float(-f)),
                _ => None,
            },
            Expr::Binary { left, op, right } => {
                match (self.evaluate(left)?, self.evaluate(right)?) {
                    (Some(l), Some(r)) => fold_binary(&l, *op, &r),
                    _ => None,
                }
            }
            _ => None,
        };
        Ok(value)
    }

    fn fresh_name(&mut self, member: &str) -> String {
        let name = format!("{FILTER_PARAMETER_PREFIX}{member}_{}", self.next_index);
        self.next_index += 1;
        name
    }
}

fn parameter(name: String, value: SqlValue) -> Expr {
    Expr::Parameter(ParameterSpec {
        name: Some(name),
        nullable: value.is_null(),
        value,
        store_type: None,
    })
}

#[allow(clippy::cast_precision_loss)]
fn fold_binary(left: &SqlValue, op: BinaryOp, right: &SqlValue) -> Option<SqlValue> {
    use SqlValue::{Float, Int, Text};
    match (left, op, right) {
        (Int(a), BinaryOp::Add, Int(b)) => a.checked_add(*b).map(Int),
        (Int(a), BinaryOp::Sub, Int(b)) => a.checked_sub(*b).map(Int),
        (Int(a), BinaryOp::Mul, Int(b)) => a.checked_mul(*b).map(Int),
        (Float(a), BinaryOp::Add, Float(b)) => Some(Float(a + b)),
        (Float(a), BinaryOp::Sub, Float(b)) => Some(Float(a - b)),
        (Float(a), BinaryOp::Mul, Float(b)) => Some(Float(a * b)),
        (Int(a), _, Float(_)) => fold_binary(&Float(*a as f64), op, right),
        (Float(_), _, Int(b)) => fold_binary(left, op, &Float(*b as f64)),
        (Text(a), BinaryOp::Concat, Text(b)) => Some(Text(format!("{a}{b}"))),
        _ => None,
    }
}

fn contains_closure(expr: &Expr) -> bool {
    match expr {
        Expr::Closure(_) => true,
        Expr::Unary { operand, .. } => contains_closure(operand),
        Expr::Binary { left, right, .. } => contains_closure(left) || contains_closure(right),
        _ => false,
    }
}

fn all_closures(expr: &Expr, test: &dyn Fn(&ClosureRef) -> bool) -> bool {
    match expr {
        Expr::Closure(closure) => test(closure),
        Expr::Unary { operand, .. } => all_closures(operand, test),
        Expr::Binary { left, right, .. } => all_closures(left, test) && all_closures(right, test),
        _ => true,
    }
}

fn is_evaluable(expr: &Expr) -> bool {
    match expr {
        Expr::Closure(_) | Expr::Constant(_) => true,
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => is_evaluable(operand),
        Expr::Binary { left, op, right } => {
            matches!(
                op,
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Concat
            ) && is_evaluable(left)
                && is_evaluable(right)
        }
        _ => false,
    }
}

fn first_member(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Closure(closure) => Some(&closure.member),
        Expr::Unary { operand, .. } => first_member(operand),
        Expr::Binary { left, right, .. } => first_member(left).or_else(|| first_member(right)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closure(context: &str, member: &str) -> Expr {
        Expr::Closure(ClosureRef {
            context: String::from(context),
            member: String::from(member),
            captured: None,
        })
    }

    fn param_name(expr: &Expr) -> &str {
        match expr {
            Expr::Parameter(ParameterSpec { name: Some(n), .. }) => n,
            other => panic!("expected parameter, got {other:?}"),
        }
    }

    #[test]
    fn test_closure_becomes_parameter() {
        let ctx = FilterContext::new("Northwind")
            .with_value("TenantPrefix", SqlValue::Text(String::from("B")));
        let resolved = resolve_filter(&closure("Northwind", "TenantPrefix"), &ctx).unwrap();
        assert_eq!(param_name(&resolved), "ef_filter__TenantPrefix_0");
    }

    #[test]
    fn test_same_member_reuses_name() {
        let ctx = FilterContext::new("c").with_value("Flag", SqlValue::Bool(true));
        let expr = Expr::binary(
            Expr::binary(Expr::column("A"), BinaryOp::Eq, closure("c", "Flag")),
            BinaryOp::Or,
            Expr::binary(Expr::column("B"), BinaryOp::Eq, closure("c", "Flag")),
        );
        let Expr::Binary { left, right, .. } = resolve_filter(&expr, &ctx).unwrap() else {
            panic!("expected binary");
        };
        let (Expr::Binary { right: l, .. }, Expr::Binary { right: r, .. }) = (*left, *right) else {
            panic!("expected comparisons");
        };
        assert_eq!(param_name(&l), param_name(&r));
    }

    #[test]
    fn test_constant_sub_expression_is_folded() {
        let ctx = FilterContext::new("c").with_value("Quantity", SqlValue::Int(10));
        let expr = Expr::binary(
            closure("c", "Quantity"),
            BinaryOp::Mul,
            Expr::Constant(SqlValue::Int(2)),
        );
        let resolved = resolve_filter(&expr, &ctx).unwrap();
        let Expr::Parameter(spec) = resolved else {
            panic!("expected a folded parameter");
        };
        assert_eq!(spec.value, SqlValue::Int(20));
        assert_eq!(spec.name.as_deref(), Some("ef_filter__Quantity_0"));
    }

    #[test]
    fn test_foreign_context_is_inlined_from_capture() {
        let ctx = FilterContext::new("Orders");
        let foreign = Expr::Closure(ClosureRef {
            context: String::from("Customers"),
            member: String::from("Region"),
            captured: Some(SqlValue::Text(String::from("WA"))),
        });
        assert_eq!(
            resolve_filter(&foreign, &ctx).unwrap(),
            Expr::Constant(SqlValue::Text(String::from("WA")))
        );

        let uncaptured = closure("Customers", "Region");
        assert!(resolve_filter(&uncaptured, &ctx).is_err());
    }

    #[test]
    fn test_folded_foreign_closure_stays_constant() {
        let ctx = FilterContext::new("Orders").with_value("Suffix", SqlValue::Text(String::new()));
        let region = || {
            Expr::Closure(ClosureRef {
                context: String::from("Customers"),
                member: String::from("Region"),
                captured: Some(SqlValue::Text(String::from("WA"))),
            })
        };
        let foreign = Expr::binary(
            region(),
            BinaryOp::Concat,
            Expr::Constant(SqlValue::Text(String::new())),
        );
        assert_eq!(
            resolve_filter(&foreign, &ctx).unwrap(),
            Expr::Constant(SqlValue::Text(String::from("WA")))
        );

        let mixed = Expr::binary(region(), BinaryOp::Concat, closure("Orders", "Suffix"));
        let Expr::Binary { left, right, .. } = resolve_filter(&mixed, &ctx).unwrap() else {
            panic!("expected binary");
        };
        assert_eq!(*left, Expr::Constant(SqlValue::Text(String::from("WA"))));
        assert_eq!(param_name(&right), "ef_filter__Suffix_0");
    }

    #[test]
    fn test_missing_member_is_an_error() {
        let ctx = FilterContext::new("c");
        let err = resolve_filter(&closure("c", "TenantId"), &ctx).unwrap_err();
        assert!(matches!(err, TranslateError::UntranslatableExpression(_)));
    }

    #[test]
    fn test_list_closure_spreads_into_in() {
        let ctx = FilterContext::new("c").with_value(
            "Ids",
            SqlValue::List(vec![SqlValue::Int(1), SqlValue::Int(2)]),
        );
        let expr = Expr::InList {
            expr: Box::new(Expr::column("Id")),
            list: vec![closure("c", "Ids")],
            negated: false,
        };
        let Expr::InList { list, .. } = resolve_filter(&expr, &ctx).unwrap() else {
            panic!("expected IN");
        };
        assert_eq!(
            list,
            vec![
                Expr::Constant(SqlValue::Int(1)),
                Expr::Constant(SqlValue::Int(2))
            ]
        );
    }

    #[test]
    fn test_for_context_only_resolves_own_filters() {
        let filters = QueryFilters::new()
            .with_filter(
                "A",
                "Customer",
                Expr::binary(Expr::column("Tenant"), BinaryOp::Eq, closure("A", "Tenant")),
            )
            .with_filter(
                "B",
                "Order",
                Expr::binary(Expr::column("Tenant"), BinaryOp::Eq, closure("B", "Tenant")),
            );
        let ctx = FilterContext::new("A").with_value("Tenant", SqlValue::Int(3));
        let resolved = filters.for_context(&ctx).unwrap();
        assert!(resolved.get("Customer").is_some());
        assert!(resolved.get("Order").is_none());
    }
}

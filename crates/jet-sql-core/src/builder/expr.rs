//! Expression builder.

use crate::ast::{
    BinaryOp, ClosureRef, ColumnRef, DateUnit, Expr, Function, ParameterSpec, QueryShape, UnaryOp,
};
use crate::types::StoreType;
use crate::value::{SqlValue, ToSqlValue};

/// Creates a column reference qualified by a source alias.
#[must_use]
pub fn col(alias: &str, name: &str) -> ExprBuilder {
    ExprBuilder(Expr::Column(ColumnRef {
        table: Some(String::from(alias)),
        name: String::from(name),
        store_type: None,
    }))
}

/// Creates an unqualified column reference.
#[must_use]
pub fn column(name: &str) -> ExprBuilder {
    ExprBuilder(Expr::column(name))
}

/// Creates an inline constant.
#[must_use]
pub fn lit<T: ToSqlValue>(value: T) -> ExprBuilder {
    ExprBuilder(Expr::Constant(value.to_sql_value()))
}

/// Creates an unnamed parameter.
#[must_use]
pub fn param<T: ToSqlValue>(value: T) -> ExprBuilder {
    ExprBuilder(Expr::Parameter(ParameterSpec {
        name: None,
        value: value.to_sql_value(),
        store_type: None,
        nullable: false,
    }))
}

/// Creates a parameter with a preferred name.
#[must_use]
pub fn named_param<T: ToSqlValue>(name: &str, value: T) -> ExprBuilder {
    ExprBuilder(Expr::Parameter(ParameterSpec {
        name: Some(String::from(name)),
        value: value.to_sql_value(),
        store_type: None,
        nullable: false,
    }))
}

/// Creates a reference to a member captured by a query filter.
#[must_use]
pub fn closure(context: &str, member: &str) -> ExprBuilder {
    ExprBuilder(Expr::Closure(ClosureRef {
        context: String::from(context),
        member: String::from(member),
        captured: None,
    }))
}

/// Creates a function call.
#[must_use]
pub fn call(func: Function, args: Vec<ExprBuilder>) -> ExprBuilder {
    ExprBuilder(Expr::call(func, args.into_iter().map(Expr::from).collect()))
}

/// Creates `EXISTS (query)`.
#[must_use]
pub fn exists(query: QueryShape) -> ExprBuilder {
    ExprBuilder(Expr::Exists(Box::new(query)))
}

/// Creates a scalar subquery.
#[must_use]
pub fn subquery(query: QueryShape) -> ExprBuilder {
    ExprBuilder(Expr::Subquery(Box::new(query)))
}

/// `COUNT(*)`.
#[must_use]
pub fn count_all() -> ExprBuilder {
    call(Function::CountAll, vec![])
}

/// `CASE WHEN ... THEN ... ELSE ... END`.
#[must_use]
pub fn case_when(
    clauses: Vec<(ExprBuilder, ExprBuilder)>,
    otherwise: Option<ExprBuilder>,
) -> ExprBuilder {
    ExprBuilder(Expr::Case {
        operand: None,
        when_clauses: clauses
            .into_iter()
            .map(|(w, t)| (w.into(), t.into()))
            .collect(),
        else_clause: otherwise.map(|e| Box::new(e.into())),
    })
}

/// A fluent wrapper around [`Expr`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExprBuilder(Expr);

impl ExprBuilder {
    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Self {
        Self(Expr::binary(self.0, op, right.into()))
    }

    fn call(self, func: Function, rest: Vec<Expr>) -> Self {
        let mut args = vec![self.0];
        args.extend(rest);
        Self(Expr::call(func, args))
    }

    /// Sets the static type of a column or the declared type of a
    /// parameter. Other expressions are returned unchanged.
    #[must_use]
    pub fn typed(self, store_type: StoreType) -> Self {
        match self.0 {
            Expr::Column(column) => Self(Expr::Column(ColumnRef {
                store_type: Some(store_type),
                ..column
            })),
            Expr::Parameter(spec) => Self(Expr::Parameter(ParameterSpec {
                store_type: Some(store_type),
                ..spec
            })),
            other => Self(other),
        }
    }

    /// Marks a parameter as nullable.
    #[must_use]
    pub fn nullable(self) -> Self {
        match self.0 {
            Expr::Parameter(spec) => Self(Expr::Parameter(ParameterSpec {
                nullable: true,
                ..spec
            })),
            other => Self(other),
        }
    }

    /// Sets the value a closure falls back to outside its own context.
    #[must_use]
    pub fn captured<T: ToSqlValue>(self, value: T) -> Self {
        match self.0 {
            Expr::Closure(closure) => Self(Expr::Closure(ClosureRef {
                captured: Some(value.to_sql_value()),
                ..closure
            })),
            other => Self(other),
        }
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// Creates an inequality expression.
    #[must_use]
    pub fn not_eq(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::NotEq, other)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::LtEq, other)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::GtEq, other)
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, other)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, other)
    }

    /// Negates the expression with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self(Expr::unary(UnaryOp::Not, self.0))
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self(Expr::IsNull {
            expr: Box::new(self.0),
            negated: false,
        })
    }

    /// Creates an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self(Expr::IsNull {
            expr: Box::new(self.0),
            negated: true,
        })
    }

    /// Creates an IN expression.
    #[must_use]
    pub fn in_list(self, values: Vec<ExprBuilder>) -> Self {
        Self(Expr::InList {
            expr: Box::new(self.0),
            list: values.into_iter().map(Expr::from).collect(),
            negated: false,
        })
    }

    /// Creates a NOT IN expression.
    #[must_use]
    pub fn not_in_list(self, values: Vec<ExprBuilder>) -> Self {
        Self(Expr::InList {
            expr: Box::new(self.0),
            list: values.into_iter().map(Expr::from).collect(),
            negated: true,
        })
    }

    /// Creates `expr IN (query)`.
    #[must_use]
    pub fn in_query(self, query: QueryShape) -> Self {
        Self(Expr::InSubquery {
            expr: Box::new(self.0),
            query: Box::new(query),
            negated: false,
        })
    }

    /// Creates a LIKE expression with a caller-written pattern.
    #[must_use]
    pub fn like(self, pattern: impl Into<Expr>) -> Self {
        Self(Expr::Like {
            expr: Box::new(self.0),
            pattern: Box::new(pattern.into()),
            negated: false,
        })
    }

    /// Substring match.
    #[must_use]
    pub fn contains(self, search: impl Into<Expr>) -> Self {
        self.call(Function::Contains, vec![search.into()])
    }

    /// Prefix match.
    #[must_use]
    pub fn starts_with(self, search: impl Into<Expr>) -> Self {
        self.call(Function::StartsWith, vec![search.into()])
    }

    /// Suffix match.
    #[must_use]
    pub fn ends_with(self, search: impl Into<Expr>) -> Self {
        self.call(Function::EndsWith, vec![search.into()])
    }

    /// Creates an addition.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Add, other)
    }

    /// Creates a subtraction.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Sub, other)
    }

    /// Creates a multiplication.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Mul, other)
    }

    /// Creates a division.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Div, other)
    }

    /// Creates a modulo.
    #[must_use]
    pub fn modulo(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Mod, other)
    }

    /// Creates a string concatenation.
    #[must_use]
    pub fn concat(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Concat, other)
    }

    /// Creates a bitwise AND.
    #[must_use]
    pub fn bit_and(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::BitAnd, other)
    }

    /// Creates a bitwise OR.
    #[must_use]
    pub fn bit_or(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::BitOr, other)
    }

    /// Creates a bitwise XOR.
    #[must_use]
    pub fn bit_xor(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::BitXor, other)
    }

    /// Creates a bitwise NOT.
    #[must_use]
    pub fn bit_not(self) -> Self {
        Self(Expr::unary(UnaryOp::BitNot, self.0))
    }

    /// Creates an arithmetic negation.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        Self(Expr::unary(UnaryOp::Neg, self.0))
    }

    /// Creates a type conversion.
    #[must_use]
    pub fn cast(self, to: StoreType) -> Self {
        Self(Expr::Cast {
            expr: Box::new(self.0),
            to,
        })
    }

    /// Overrides the collation.
    #[must_use]
    pub fn collate(self, collation: &str) -> Self {
        Self(Expr::Collate {
            expr: Box::new(self.0),
            collation: String::from(collation),
        })
    }

    /// Upper-cases a string.
    #[must_use]
    pub fn to_upper(self) -> Self {
        self.call(Function::ToUpper, vec![])
    }

    /// Lower-cases a string.
    #[must_use]
    pub fn to_lower(self) -> Self {
        self.call(Function::ToLower, vec![])
    }

    /// String length.
    #[must_use]
    pub fn length(self) -> Self {
        self.call(Function::Length, vec![])
    }

    /// Zero-based substring.
    #[must_use]
    pub fn substring(self, start: impl Into<Expr>, length: impl Into<Expr>) -> Self {
        self.call(Function::Substring, vec![start.into(), length.into()])
    }

    /// Replaces `from` with `to`.
    #[must_use]
    pub fn replace(self, from: impl Into<Expr>, to: impl Into<Expr>) -> Self {
        self.call(Function::Replace, vec![from.into(), to.into()])
    }

    /// The first non-NULL of `self` and `fallback`.
    #[must_use]
    pub fn coalesce(self, fallback: impl Into<Expr>) -> Self {
        self.call(Function::Coalesce, vec![fallback.into()])
    }

    /// A part of a date.
    #[must_use]
    pub fn date_part(self, unit: DateUnit) -> Self {
        self.call(Function::DatePart(unit), vec![])
    }

    /// Whole `unit`s elapsed from `self` to `to`.
    #[must_use]
    pub fn date_diff(self, unit: DateUnit, to: impl Into<Expr>) -> Self {
        self.call(Function::DateDiff(unit), vec![to.into()])
    }

    /// Aggregate sum.
    #[must_use]
    pub fn sum(self) -> Self {
        self.call(Function::Sum, vec![])
    }

    /// Aggregate count of non-NULL values.
    #[must_use]
    pub fn count(self) -> Self {
        self.call(Function::Count, vec![])
    }

    /// Returns the expression.
    #[must_use]
    pub fn build(self) -> Expr {
        self.0
    }
}

impl From<ExprBuilder> for Expr {
    fn from(builder: ExprBuilder) -> Self {
        builder.0
    }
}

impl From<Expr> for ExprBuilder {
    fn from(expr: Expr) -> Self {
        Self(expr)
    }
}

impl From<SqlValue> for ExprBuilder {
    fn from(value: SqlValue) -> Self {
        Self(Expr::Constant(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_eq_param() {
        let expr = col("c", "City").eq(param("London")).build();
        let Expr::Binary { left, op, right } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Eq);
        assert!(matches!(*left, Expr::Column(ColumnRef { ref name, .. }) if name == "City"));
        assert!(matches!(
            *right,
            Expr::Parameter(ParameterSpec { value: SqlValue::Text(ref s), .. }) if s == "London"
        ));
    }

    #[test]
    fn test_typed_sets_store_type() {
        let expr = col("o", "Freight").typed(StoreType::Currency).build();
        assert!(matches!(
            expr,
            Expr::Column(ColumnRef {
                store_type: Some(StoreType::Currency),
                ..
            })
        ));
    }

    #[test]
    fn test_string_match_arguments() {
        let expr = col("c", "ContactName").starts_with(lit("M")).build();
        let Expr::Function { func, args } = expr else {
            panic!("expected function");
        };
        assert_eq!(func, Function::StartsWith);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_sql_injection_stays_a_value() {
        let malicious = "'; DROP TABLE Customers; --";
        let expr = col("c", "City").eq(param(malicious)).build();
        let Expr::Binary { right, .. } = expr else {
            panic!("expected a comparison");
        };
        let Expr::Parameter(spec) = *right else {
            panic!("expected a parameter");
        };
        assert_eq!(spec.value, SqlValue::Text(String::from(malicious)));
    }
}

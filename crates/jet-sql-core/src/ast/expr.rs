//! Logical expression tree.

use serde::{Deserialize, Serialize};

use crate::types::StoreType;
use crate::value::SqlValue;

use super::QueryShape;

/// A column reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Source alias the column belongs to. Unqualified columns are rendered
    /// without a qualifier.
    #[serde(default)]
    pub table: Option<String>,
    /// Column name.
    pub name: String,
    /// Static type, when known.
    #[serde(default)]
    pub store_type: Option<StoreType>,
}

/// A parameter as the caller supplies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Preferred name. Unnamed parameters get `p0`, `p1`, ... in text order.
    #[serde(default)]
    pub name: Option<String>,
    /// Bound value.
    pub value: SqlValue,
    /// Declared type. Inferred from the value when absent.
    #[serde(default)]
    pub store_type: Option<StoreType>,
    /// Whether the parameter may be NULL.
    #[serde(default)]
    pub nullable: bool,
}

/// A value captured by a query filter closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureRef {
    /// Name of the context that owns the captured member.
    pub context: String,
    /// Captured member name, e.g. `TenantPrefix`.
    pub member: String,
    /// Value captured when the filter was defined. Used when the filter is
    /// evaluated for a different context.
    #[serde(default)]
    pub captured: Option<SqlValue>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // String
    Concat,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// Returns the precedence of the operator (higher = binds tighter).
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 3,
            Self::BitOr | Self::BitXor => 4,
            Self::BitAnd => 5,
            Self::LeftShift | Self::RightShift | Self::Concat => 6,
            Self::Add | Self::Sub => 7,
            Self::Mod => 8,
            Self::Mul | Self::Div => 9,
        }
    }

    /// Returns true for `=`, `<>`, `<`, `<=`, `>`, `>=`.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    /// Returns true for `AND` and `OR`.
    #[must_use]
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns true if `a op (b op c)` differs from `(a op b) op c`.
    #[must_use]
    pub const fn is_left_associative_only(&self) -> bool {
        matches!(self, Self::Sub | Self::Div | Self::Mod | Self::Concat)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical NOT.
    Not,
    /// Bitwise NOT.
    BitNot,
}

/// Units accepted by the date functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateUnit {
    Year,
    Quarter,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// Provider-neutral functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    // String search
    Contains,
    StartsWith,
    EndsWith,

    // String
    ToUpper,
    ToLower,
    Trim,
    TrimStart,
    TrimEnd,
    Length,
    Substring,
    IndexOf,
    Replace,

    // Math
    Abs,
    Round,
    Floor,
    Ceiling,
    Sqrt,
    Sign,
    Exp,
    Log,
    Power,

    // Date
    Now,
    Today,
    DatePart(DateUnit),
    DateAdd(DateUnit),
    DateDiff(DateUnit),

    // Null handling
    Coalesce,

    // Aggregates
    CountAll,
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,

    /// A function the caller could not map; never translatable.
    Other(String),
}

impl Function {
    /// Returns true for aggregate functions.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Self::CountAll
                | Self::Count
                | Self::CountDistinct
                | Self::Sum
                | Self::Avg
                | Self::Min
                | Self::Max
        )
    }
}

/// A logical expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A column of a source in scope.
    Column(ColumnRef),

    /// An inline constant.
    Constant(SqlValue),

    /// A bound parameter.
    Parameter(ParameterSpec),

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A function call.
    Function {
        /// The function.
        func: Function,
        /// The arguments.
        args: Vec<Expr>,
    },

    /// CASE expression.
    Case {
        /// The operand of a simple CASE.
        #[serde(default)]
        operand: Option<Box<Expr>>,
        /// WHEN/THEN clauses.
        when_clauses: Vec<(Expr, Expr)>,
        /// ELSE clause.
        #[serde(default)]
        else_clause: Option<Box<Expr>>,
    },

    /// EXISTS (subquery).
    Exists(Box<QueryShape>),

    /// A scalar subquery.
    Subquery(Box<QueryShape>),

    /// IN (list).
    InList {
        /// The expression to check.
        expr: Box<Expr>,
        /// The candidate values.
        list: Vec<Expr>,
        /// Whether this is NOT IN.
        #[serde(default)]
        negated: bool,
    },

    /// IN (subquery).
    InSubquery {
        /// The expression to check.
        expr: Box<Expr>,
        /// The subquery.
        query: Box<QueryShape>,
        /// Whether this is NOT IN.
        #[serde(default)]
        negated: bool,
    },

    /// IS NULL expression.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        #[serde(default)]
        negated: bool,
    },

    /// A caller-written LIKE pattern, passed through unescaped.
    Like {
        /// The expression to match.
        expr: Box<Expr>,
        /// The pattern.
        pattern: Box<Expr>,
        /// Whether this is NOT LIKE.
        #[serde(default)]
        negated: bool,
    },

    /// Type conversion.
    Cast {
        /// Expression to convert.
        expr: Box<Expr>,
        /// Target type.
        to: StoreType,
    },

    /// A value captured by a query filter, resolved before translation.
    Closure(ClosureRef),

    /// Collation override.
    Collate {
        /// The expression.
        expr: Box<Expr>,
        /// Collation name or alias.
        collation: String,
    },
}

impl Expr {
    /// Creates an unqualified column reference.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(ColumnRef {
            table: None,
            name: name.into(),
            store_type: None,
        })
    }

    /// Creates a constant.
    #[must_use]
    pub const fn constant(value: SqlValue) -> Self {
        Self::Constant(value)
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Creates a unary expression.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Creates a function call.
    #[must_use]
    pub const fn call(func: Function, args: Vec<Self>) -> Self {
        Self::Function { func, args }
    }

    /// Joins two predicates with AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    /// Joins two predicates with OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Conjoins any number of predicates, left to right.
    #[must_use]
    pub fn conjoin(predicates: impl IntoIterator<Item = Self>) -> Option<Self> {
        predicates.into_iter().reduce(Self::and)
    }

    /// Returns the same expression with every unqualified column qualified
    /// by `alias`. Subqueries are left untouched; they have their own scope.
    #[must_use]
    pub fn qualified_by(&self, alias: &str) -> Self {
        let q = |e: &Self| Box::new(e.qualified_by(alias));
        match self {
            Self::Column(c) if c.table.is_none() => Self::Column(ColumnRef {
                table: Some(String::from(alias)),
                ..c.clone()
            }),
            Self::Unary { op, operand } => Self::Unary {
                op: *op,
                operand: q(operand),
            },
            Self::Binary { left, op, right } => Self::Binary {
                left: q(left),
                op: *op,
                right: q(right),
            },
            Self::Function { func, args } => Self::Function {
                func: func.clone(),
                args: args.iter().map(|a| a.qualified_by(alias)).collect(),
            },
            Self::Case {
                operand,
                when_clauses,
                else_clause,
            } => Self::Case {
                operand: operand.as_deref().map(q),
                when_clauses: when_clauses
                    .iter()
                    .map(|(w, t)| (w.qualified_by(alias), t.qualified_by(alias)))
                    .collect(),
                else_clause: else_clause.as_deref().map(q),
            },
            Self::InList {
                expr,
                list,
                negated,
            } => Self::InList {
                expr: q(expr),
                list: list.iter().map(|e| e.qualified_by(alias)).collect(),
                negated: *negated,
            },
            Self::InSubquery {
                expr,
                query,
                negated,
            } => Self::InSubquery {
                expr: q(expr),
                query: query.clone(),
                negated: *negated,
            },
            Self::IsNull { expr, negated } => Self::IsNull {
                expr: q(expr),
                negated: *negated,
            },
            Self::Like {
                expr,
                pattern,
                negated,
            } => Self::Like {
                expr: q(expr),
                pattern: q(pattern),
                negated: *negated,
            },
            Self::Cast { expr, to } => Self::Cast {
                expr: q(expr),
                to: *to,
            },
            Self::Collate { expr, collation } => Self::Collate {
                expr: q(expr),
                collation: collation.clone(),
            },
            Self::Column(_)
            | Self::Constant(_)
            | Self::Parameter(_)
            | Self::Exists(_)
            | Self::Subquery(_)
            | Self::Closure(_) => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
        assert!(BinaryOp::Eq.precedence() > BinaryOp::And.precedence());
    }

    #[test]
    fn test_conjoin() {
        assert_eq!(Expr::conjoin(Vec::new()), None);
        let both = Expr::conjoin([Expr::column("a"), Expr::column("b")]).unwrap();
        assert!(matches!(both, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_qualified_by_leaves_qualified_columns() {
        let expr = Expr::binary(
            Expr::column("TenantId"),
            BinaryOp::Eq,
            Expr::Column(ColumnRef {
                table: Some(String::from("o")),
                name: String::from("TenantId"),
                store_type: None,
            }),
        );
        let Expr::Binary { left, right, .. } = expr.qualified_by("c") else {
            panic!("expected binary");
        };
        assert!(matches!(*left, Expr::Column(ColumnRef { table: Some(ref t), .. }) if t == "c"));
        assert!(matches!(*right, Expr::Column(ColumnRef { table: Some(ref t), .. }) if t == "o"));
    }
}

//! Expression translation.
//!
//! Jet has no boolean values, only predicates, so every expression is
//! translated either in predicate position (WHERE, ON, HAVING, IIF
//! conditions) or in value position (projections, operands, arguments).
//! A value in predicate position is compared against `True`; a predicate in
//! value position is wrapped as `IIF(pred, True, False)`.

use crate::ast::{BinaryOp, ColumnRef, Expr, Function, UnaryOp};
use crate::error::{Result, TranslateError};
use crate::types::{StoreType, TypeCategory};
use crate::value::SqlValue;

use super::fragment::{SqlFragment, ATOM, NOT, PREFIX};
use super::StatementBuilder;

const COMPARISON: u8 = 3;

impl StatementBuilder<'_> {
    /// Translates an expression in value position.
    pub(crate) fn value(&mut self, expr: &Expr) -> Result<SqlFragment> {
        match expr {
            Expr::Column(column) => self.column(column),
            Expr::Constant(value) => Ok(SqlFragment::raw(self.rules.format_literal(value)?)),
            Expr::Parameter(spec) => self.params.bind(self.rules, spec),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => Ok(SqlFragment::prefix("-", self.value(operand)?, PREFIX)),
                UnaryOp::BitNot => Ok(SqlFragment::prefix("BNOT ", self.value(operand)?, PREFIX)),
                UnaryOp::Not => self.predicate_as_value(expr),
            },
            Expr::Binary { left, op, right } => {
                if op.is_comparison() || op.is_logical() {
                    self.predicate_as_value(expr)
                } else {
                    self.operator(left, *op, right)
                }
            }
            Expr::Function { func, args } => match func {
                Function::Contains | Function::StartsWith | Function::EndsWith => {
                    self.predicate_as_value(expr)
                }
                _ => self.function(func, args),
            },
            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => self.case(operand.as_deref(), when_clauses, else_clause.as_deref()),
            Expr::Subquery(query) => self.subquery(query),
            Expr::Cast { expr: inner, to } => self.cast(expr, inner, *to),
            Expr::Collate { expr, collation } => {
                let collation = String::from(self.rules.collation(collation));
                let value = self.value(expr)?.paren_below(PREFIX);
                Ok(value.postfix(&format!("COLLATE {collation}"), PREFIX))
            }
            Expr::Exists(_)
            | Expr::InList { .. }
            | Expr::InSubquery { .. }
            | Expr::IsNull { .. }
            | Expr::Like { .. } => self.predicate_as_value(expr),
            Expr::Closure(closure) => Err(unresolved_closure(&closure.member)),
        }
    }

    /// Translates an expression in predicate position.
    pub(crate) fn predicate(&mut self, expr: &Expr) -> Result<SqlFragment> {
        match expr {
            Expr::Constant(SqlValue::Bool(b)) => {
                let sql = if *b {
                    self.rules.tautology()
                } else {
                    self.rules.contradiction()
                };
                Ok(SqlFragment::raw(sql).with_prec(COMPARISON))
            }
            Expr::Binary { left, op, right } if op.is_logical() => {
                let keyword = if *op == BinaryOp::And { "AND" } else { "OR" };
                let prec = op.precedence();
                let left = logical_operand(self.predicate(left)?, prec);
                let right = logical_operand(self.predicate(right)?, prec);
                Ok(SqlFragment::infix(left, keyword, right, prec))
            }
            Expr::Binary { left, op, right } if op.is_comparison() => {
                self.comparison(left, *op, right)
            }
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => Ok(SqlFragment::prefix("NOT ", self.predicate(operand)?, NOT)),
            Expr::IsNull { expr, negated } => self.is_null(expr, *negated),
            Expr::InList {
                expr,
                list,
                negated,
            } => self.in_list(expr, list, *negated),
            Expr::InSubquery {
                expr,
                query,
                negated,
            } => {
                let value = self.value(expr)?.paren_below(COMPARISON + 1);
                let query = self.subquery(query)?;
                let keyword = if *negated { "NOT IN" } else { "IN" };
                Ok(SqlFragment::infix(value, keyword, query, COMPARISON))
            }
            Expr::Exists(query) => {
                let query = self.subquery(query)?;
                Ok(SqlFragment::prefix("EXISTS ", query, ATOM))
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                let value = self.value(expr)?.paren_below(COMPARISON + 1);
                let pattern = self.value(pattern)?.paren_below(COMPARISON + 1);
                let keyword = if *negated { "NOT LIKE" } else { "LIKE" };
                Ok(SqlFragment::infix(value, keyword, pattern, COMPARISON))
            }
            Expr::Function {
                func: func @ (Function::Contains | Function::StartsWith | Function::EndsWith),
                args,
            } => self.string_match(func, args),
            Expr::Cast {
                expr: inner,
                to: StoreType::Bit,
            } => {
                if category(inner) == Some(TypeCategory::Boolean) {
                    self.predicate(inner)
                } else {
                    let value = self.value(inner)?.paren_below(COMPARISON + 1);
                    Ok(SqlFragment::infix(value, "<>", SqlFragment::raw("0"), COMPARISON))
                }
            }
            _ => {
                let value = self.value(expr)?.paren_below(COMPARISON + 1);
                let truth = SqlFragment::raw(self.rules.true_literal());
                Ok(SqlFragment::infix(value, "=", truth, COMPARISON))
            }
        }
    }

    /// Renders `IIF(pred, True, False)`.
    pub(crate) fn predicate_as_value(&mut self, expr: &Expr) -> Result<SqlFragment> {
        let condition = self.predicate(expr)?;
        Ok(iif(
            condition,
            SqlFragment::raw(self.rules.true_literal()),
            SqlFragment::raw(self.rules.false_literal()),
        ))
    }

    /// Renders a scalar subquery in parentheses.
    pub(crate) fn subquery(&mut self, query: &crate::ast::QueryShape) -> Result<SqlFragment> {
        self.depth += 1;
        let rendered = self.select(query);
        self.depth -= 1;
        Ok(rendered?.fragment.paren())
    }

    fn column(&self, column: &ColumnRef) -> Result<SqlFragment> {
        match &column.table {
            Some(alias) => {
                self.scopes.resolve(alias, &column.name)?;
                let sql = self.rules.quote_qualified(&[alias.as_str(), column.name.as_str()]);
                Ok(SqlFragment::raw(sql))
            }
            None => Ok(SqlFragment::raw(self.quote(&column.name))),
        }
    }

    fn comparison(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<SqlFragment> {
        if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
            let negated = op == BinaryOp::NotEq;
            if matches!(right, Expr::Constant(SqlValue::Null)) {
                return self.is_null(left, negated);
            }
            if matches!(left, Expr::Constant(SqlValue::Null)) {
                return self.is_null(right, negated);
            }
        }
        let token = match op {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            _ => ">=",
        };
        let left = self.value(left)?.paren_below(COMPARISON + 1);
        let right = self.value(right)?.paren_below(COMPARISON + 1);
        Ok(SqlFragment::infix(left, token, right, COMPARISON))
    }

    fn is_null(&mut self, expr: &Expr, negated: bool) -> Result<SqlFragment> {
        let value = self.value(expr)?.paren_below(COMPARISON + 1);
        let keyword = if negated { "IS NOT NULL" } else { "IS NULL" };
        Ok(value.postfix(keyword, COMPARISON))
    }

    fn in_list(&mut self, expr: &Expr, list: &[Expr], negated: bool) -> Result<SqlFragment> {
        let is_empty = |item: &Expr| {
            matches!(item, Expr::Constant(SqlValue::List(values)) if values.is_empty())
        };
        if list.iter().all(is_empty) {
            let sql = if negated {
                self.rules.tautology()
            } else {
                self.rules.contradiction()
            };
            return Ok(SqlFragment::raw(sql).with_prec(COMPARISON));
        }
        let value = self.value(expr)?.paren_below(COMPARISON + 1);
        let mut items = Vec::with_capacity(list.len());
        for item in list {
            match item {
                Expr::Constant(SqlValue::List(values)) => {
                    for literal in values {
                        items.push(SqlFragment::raw(self.rules.format_literal(literal)?));
                    }
                }
                other => items.push(self.value(other)?),
            }
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        let list = SqlFragment::join(items, ", ").paren();
        Ok(SqlFragment::infix(value, keyword, list, COMPARISON))
    }

    fn operator(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<SqlFragment> {
        let token = match op {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div if is_integral(left) && is_integral(right) => {
                return self.integer_division(left, right);
            }
            BinaryOp::Div => "/",
            BinaryOp::Mod => "MOD",
            BinaryOp::Concat => self.rules.concat_token(),
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                return self.bitwise(left, op, right);
            }
            BinaryOp::LeftShift | BinaryOp::RightShift => {
                return Err(TranslateError::untranslatable(
                    "bit shifts have no Jet operator",
                ));
            }
            _ => {
                return Err(TranslateError::untranslatable(format!(
                    "{op:?} is not a value operator"
                )));
            }
        };
        let prec = op.precedence();
        let left = self.value(left)?.paren_below(prec);
        let right = self.value(right)?;
        let right = if right.prec < prec || (right.prec == prec && op.is_left_associative_only()) {
            right.paren()
        } else {
            right
        };
        Ok(SqlFragment::infix(left, token, right, prec))
    }

    /// `\` binds looser than `*` and `/` but tighter than `MOD`.
    fn integer_division(&mut self, left: &Expr, right: &Expr) -> Result<SqlFragment> {
        let operand = BinaryOp::Div.precedence();
        let left = self.value(left)?.paren_below(operand);
        let right = self.value(right)?.paren_below(operand);
        Ok(SqlFragment::infix(left, "\\", right, BinaryOp::Mod.precedence()))
    }

    fn bitwise(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<SqlFragment> {
        let keyword = match op {
            BinaryOp::BitAnd => "BAND",
            BinaryOp::BitOr => "BOR",
            _ => "BXOR",
        };
        let left = self.value(left)?.paren_unless_atom();
        let right = self.value(right)?.paren_unless_atom();
        Ok(SqlFragment::infix(left, keyword, right, ATOM).paren())
    }

    fn case(
        &mut self,
        operand: Option<&Expr>,
        when_clauses: &[(Expr, Expr)],
        else_clause: Option<&Expr>,
    ) -> Result<SqlFragment> {
        let operand = operand
            .map(|o| self.value(o).map(|v| v.paren_below(COMPARISON + 1)))
            .transpose()?;
        let mut branches = Vec::with_capacity(when_clauses.len());
        for (when, then) in when_clauses {
            let condition = match &operand {
                Some(operand) => {
                    let when = self.value(when)?.paren_below(COMPARISON + 1);
                    SqlFragment::infix(operand.clone(), "=", when, COMPARISON)
                }
                None => self.predicate(when)?,
            };
            branches.push((condition, self.value(then)?));
        }
        let mut result = match else_clause {
            Some(otherwise) => self.value(otherwise)?,
            None => SqlFragment::raw("NULL"),
        };
        for (condition, then) in branches.into_iter().rev() {
            result = iif(condition, then, result);
        }
        Ok(result)
    }

    fn cast(&mut self, whole: &Expr, inner: &Expr, to: StoreType) -> Result<SqlFragment> {
        let from = category(inner);
        if from == Some(TypeCategory::Boolean) {
            if to.category() == TypeCategory::Boolean {
                return self.predicate_as_value(inner);
            }
            if to.category().is_numeric() {
                let condition = self.predicate(inner)?;
                return Ok(iif(condition, SqlFragment::raw("1"), SqlFragment::raw("0")));
            }
        }
        let function = match to {
            StoreType::Bit => return self.predicate_as_value(whole),
            StoreType::Byte => "CBYTE",
            StoreType::SmallInt => "CINT",
            StoreType::Integer => "CLNG",
            StoreType::Decimal { .. } => "CDEC",
            StoreType::Single => "CSNG",
            StoreType::Double => "CDBL",
            StoreType::Currency => "CCUR",
            StoreType::VarChar(_) | StoreType::LongChar => "CSTR",
            StoreType::DateTime => "CDATE",
            StoreType::VarBinary(_) | StoreType::LongBinary | StoreType::Guid => {
                return Err(TranslateError::untranslatable(format!(
                    "Jet has no conversion to {}",
                    to.name()
                )));
            }
        };
        let value = self.value(inner)?;
        Ok(SqlFragment::call(function, vec![value]))
    }
}

/// Renders `IIF(condition, then, otherwise)`.
pub(crate) fn iif(
    condition: SqlFragment,
    then: SqlFragment,
    otherwise: SqlFragment,
) -> SqlFragment {
    SqlFragment::call("IIF", vec![condition, then, otherwise])
}

/// Operands of AND/OR are parenthesized when they bind looser, or when
/// they are the other logical operator.
fn logical_operand(fragment: SqlFragment, prec: u8) -> SqlFragment {
    let logical = [BinaryOp::And.precedence(), BinaryOp::Or.precedence()];
    let other_logical = fragment.prec != prec && logical.contains(&fragment.prec);
    if fragment.prec < prec || other_logical {
        fragment.paren()
    } else {
        fragment
    }
}

fn unresolved_closure(member: &str) -> TranslateError {
    TranslateError::untranslatable(format!(
        "filter member '{member}' must be resolved before translation"
    ))
}

fn is_integral(expr: &Expr) -> bool {
    category(expr) == Some(TypeCategory::Integral)
}

/// Static type category of an expression, when it can be told.
pub(crate) fn category(expr: &Expr) -> Option<TypeCategory> {
    match expr {
        Expr::Column(column) => column.store_type.map(|t| t.category()),
        Expr::Constant(value) => TypeCategory::of_value(value),
        Expr::Parameter(spec) => spec
            .store_type
            .map(|t| t.category())
            .or_else(|| TypeCategory::of_value(&spec.value)),
        Expr::Unary { op, operand } => match op {
            UnaryOp::Not => Some(TypeCategory::Boolean),
            UnaryOp::Neg => category(operand),
            UnaryOp::BitNot => Some(TypeCategory::Integral),
        },
        Expr::Binary { left, op, right } => {
            if op.is_comparison() || op.is_logical() {
                return Some(TypeCategory::Boolean);
            }
            match op {
                BinaryOp::Concat => Some(TypeCategory::Text),
                BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                    Some(TypeCategory::Integral)
                }
                _ => numeric_result(category(left), category(right)),
            }
        }
        Expr::Function { func, args } => function_category(func, args),
        Expr::Case {
            when_clauses,
            else_clause,
            ..
        } => when_clauses
            .iter()
            .map(|(_, then)| then)
            .chain(else_clause.as_deref())
            .find_map(category),
        Expr::Subquery(query) => query.projections.first().and_then(|p| category(&p.expr)),
        Expr::Cast { to, .. } => Some(to.category()),
        Expr::Collate { expr, .. } => category(expr),
        Expr::Exists(_)
        | Expr::InList { .. }
        | Expr::InSubquery { .. }
        | Expr::IsNull { .. }
        | Expr::Like { .. } => Some(TypeCategory::Boolean),
        Expr::Closure(closure) => closure.captured.as_ref().and_then(TypeCategory::of_value),
    }
}

fn numeric_result(left: Option<TypeCategory>, right: Option<TypeCategory>) -> Option<TypeCategory> {
    match (left, right) {
        (Some(TypeCategory::Integral), Some(TypeCategory::Integral)) => {
            Some(TypeCategory::Integral)
        }
        (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => Some(TypeCategory::Real),
        _ => None,
    }
}

fn function_category(func: &Function, args: &[Expr]) -> Option<TypeCategory> {
    let first = || args.first().and_then(category);
    match func {
        Function::Contains | Function::StartsWith | Function::EndsWith => {
            Some(TypeCategory::Boolean)
        }
        Function::ToUpper
        | Function::ToLower
        | Function::Trim
        | Function::TrimStart
        | Function::TrimEnd
        | Function::Substring
        | Function::Replace => Some(TypeCategory::Text),
        Function::Length
        | Function::IndexOf
        | Function::CountAll
        | Function::Count
        | Function::CountDistinct
        | Function::DatePart(_)
        | Function::DateDiff(_)
        | Function::Sign => Some(TypeCategory::Integral),
        Function::Sqrt | Function::Exp | Function::Log | Function::Power | Function::Avg => {
            Some(TypeCategory::Real)
        }
        Function::Abs
        | Function::Round
        | Function::Floor
        | Function::Ceiling
        | Function::Sum
        | Function::Min
        | Function::Max => first(),
        Function::Now | Function::Today | Function::DateAdd(_) => Some(TypeCategory::Temporal),
        Function::Coalesce => args.iter().find_map(category),
        Function::Other(_) => None,
    }
}

/// Static store type of a projected expression, when it can be told.
pub(crate) fn store_type(expr: &Expr) -> Option<StoreType> {
    match expr {
        Expr::Column(column) => column.store_type,
        Expr::Constant(value) => StoreType::infer(value).ok(),
        Expr::Parameter(spec) => spec.store_type.or_else(|| StoreType::infer(&spec.value).ok()),
        Expr::Cast { to, .. } => Some(*to),
        Expr::Collate { expr, .. } => store_type(expr),
        _ => match category(expr)? {
            TypeCategory::Boolean => Some(StoreType::Bit),
            TypeCategory::Integral => Some(StoreType::Integer),
            TypeCategory::Real => Some(StoreType::Double),
            TypeCategory::Temporal => Some(StoreType::DateTime),
            TypeCategory::Text | TypeCategory::Binary | TypeCategory::Guid => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{ColumnRef, Expr, Function, ParameterSpec, UnaryOp};
    use crate::types::StoreType;
    use crate::value::SqlValue;
    use crate::{BinaryOp, DialectRules, Translator};

    fn col(alias: &str, name: &str, ty: Option<StoreType>) -> Expr {
        Expr::Column(ColumnRef {
            table: Some(String::from(alias)),
            name: String::from(name),
            store_type: ty,
        })
    }

    fn int(n: i64) -> Expr {
        Expr::Constant(SqlValue::Int(n))
    }

    fn pred(expr: &Expr) -> String {
        let rules = DialectRules::jet();
        Translator::new(&rules)
            .translate_predicate(expr, &["c", "o"])
            .unwrap()
            .0
    }

    fn value(expr: &Expr) -> String {
        let rules = DialectRules::jet();
        Translator::new(&rules)
            .translate_value(expr, &["c", "o"])
            .unwrap()
            .0
    }

    #[test]
    fn test_boolean_column_in_predicate_position() {
        let active = col("c", "IsActive", Some(StoreType::Bit));
        assert_eq!(pred(&active), "[c].[IsActive] = True");
        assert_eq!(
            pred(&Expr::unary(UnaryOp::Not, active)),
            "NOT ([c].[IsActive] = True)"
        );
    }

    #[test]
    fn test_comparison_in_value_position() {
        let cmp = Expr::binary(col("o", "Quantity", None), BinaryOp::Gt, int(5));
        assert_eq!(value(&cmp), "IIF([o].[Quantity] > 5, True, False)");
    }

    #[test]
    fn test_double_negation_is_literal() {
        let x = col("o", "Quantity", Some(StoreType::Integer));
        let neg = Expr::unary(UnaryOp::Neg, Expr::unary(UnaryOp::Neg, x));
        assert_eq!(value(&neg), "-(-[o].[Quantity])");

        let flag = col("c", "IsActive", Some(StoreType::Bit));
        let not = Expr::unary(UnaryOp::Not, Expr::unary(UnaryOp::Not, flag));
        assert_eq!(pred(&not), "NOT (NOT ([c].[IsActive] = True))");
    }

    #[test]
    fn test_negated_negative_literal() {
        assert_eq!(value(&Expr::unary(UnaryOp::Neg, int(-5))), "-(-5)");
        let qty = col("o", "Quantity", Some(StoreType::Integer));
        assert_eq!(
            value(&Expr::binary(qty, BinaryOp::Sub, int(-5))),
            "[o].[Quantity] - -5"
        );
    }

    #[test]
    fn test_integer_and_real_division() {
        let qty = col("o", "Quantity", Some(StoreType::SmallInt));
        let price = col("o", "UnitPrice", Some(StoreType::Currency));
        assert_eq!(
            value(&Expr::binary(qty.clone(), BinaryOp::Div, int(2))),
            "[o].[Quantity] \\ 2"
        );
        assert_eq!(
            value(&Expr::binary(price, BinaryOp::Div, int(2))),
            "[o].[UnitPrice] / 2"
        );
        let untyped = col("o", "Discount", None);
        assert_eq!(
            value(&Expr::binary(untyped, BinaryOp::Div, int(2))),
            "[o].[Discount] / 2"
        );
        assert_eq!(
            value(&Expr::binary(qty, BinaryOp::Mod, int(3))),
            "[o].[Quantity] MOD 3"
        );
    }

    #[test]
    fn test_arithmetic_parentheses() {
        let a = col("o", "A", None);
        let b = col("o", "B", None);
        let sum = Expr::binary(a.clone(), BinaryOp::Add, b.clone());
        assert_eq!(
            value(&Expr::binary(sum.clone(), BinaryOp::Mul, int(2))),
            "([o].[A] + [o].[B]) * 2"
        );
        assert_eq!(
            value(&Expr::binary(a, BinaryOp::Sub, sum)),
            "[o].[A] - ([o].[A] + [o].[B])"
        );
    }

    #[test]
    fn test_bitwise_operators() {
        let flags = col("c", "Flags", Some(StoreType::Integer));
        let masked = Expr::binary(flags.clone(), BinaryOp::BitAnd, int(4));
        assert_eq!(
            pred(&Expr::binary(masked, BinaryOp::Eq, int(4))),
            "([c].[Flags] BAND 4) = 4"
        );
        assert_eq!(
            value(&Expr::binary(flags.clone(), BinaryOp::BitOr, int(1))),
            "([c].[Flags] BOR 1)"
        );
        assert_eq!(
            value(&Expr::binary(flags.clone(), BinaryOp::BitXor, int(1))),
            "([c].[Flags] BXOR 1)"
        );
        assert_eq!(value(&Expr::unary(UnaryOp::BitNot, flags)), "BNOT [c].[Flags]");
    }

    #[test]
    fn test_shifts_are_untranslatable() {
        let rules = DialectRules::jet();
        let shift = Expr::binary(col("c", "Flags", None), BinaryOp::LeftShift, int(1));
        assert!(Translator::new(&rules)
            .translate_value(&shift, &["c"])
            .is_err());
    }

    #[test]
    fn test_logical_grouping() {
        let a = Expr::binary(col("c", "A", None), BinaryOp::Eq, int(1));
        let b = Expr::binary(col("c", "B", None), BinaryOp::Eq, int(2));
        let c = Expr::binary(col("c", "C", None), BinaryOp::Eq, int(3));
        let expr = a.and(b.or(c));
        assert_eq!(
            pred(&expr),
            "[c].[A] = 1 AND ([c].[B] = 2 OR [c].[C] = 3)"
        );
    }

    #[test]
    fn test_null_comparison_becomes_is_null() {
        let region = col("c", "Region", None);
        assert_eq!(
            pred(&Expr::binary(region.clone(), BinaryOp::Eq, Expr::Constant(SqlValue::Null))),
            "[c].[Region] IS NULL"
        );
        assert_eq!(
            pred(&Expr::binary(region, BinaryOp::NotEq, Expr::Constant(SqlValue::Null))),
            "[c].[Region] IS NOT NULL"
        );
    }

    #[test]
    fn test_empty_in_lists() {
        let id = col("c", "Id", None);
        let empty = Expr::InList {
            expr: Box::new(id.clone()),
            list: vec![],
            negated: false,
        };
        assert_eq!(pred(&empty), "True = False");
        let not_in = Expr::InList {
            expr: Box::new(id.clone()),
            list: vec![],
            negated: true,
        };
        assert_eq!(pred(&not_in), "True = True");
        let spread = Expr::InList {
            expr: Box::new(id),
            list: vec![Expr::Constant(SqlValue::List(vec![
                SqlValue::Int(1),
                SqlValue::Int(2),
            ]))],
            negated: false,
        };
        assert_eq!(pred(&spread), "[c].[Id] IN (1, 2)");
    }

    #[test]
    fn test_in_list_parameters_follow_text_order() {
        let param = |text: &str| {
            Expr::Parameter(ParameterSpec {
                name: None,
                value: SqlValue::Text(String::from(text)),
                store_type: None,
                nullable: false,
            })
        };
        let expr = Expr::InList {
            expr: Box::new(param("London")),
            list: vec![param("Paris"), param("Madrid")],
            negated: false,
        };
        let rules = DialectRules::jet();
        let (sql, params) = Translator::new(&rules)
            .translate_predicate(&expr, &["c"])
            .unwrap();
        assert_eq!(sql, "@p0 IN (@p1, @p2)");
        assert_eq!(params[0].value, SqlValue::Text(String::from("London")));
        assert_eq!(params[2].value, SqlValue::Text(String::from("Madrid")));
    }

    #[test]
    fn test_case_and_coalesce_become_iif() {
        let region = col("c", "Region", None);
        let case = Expr::Case {
            operand: None,
            when_clauses: vec![(
                Expr::IsNull {
                    expr: Box::new(region.clone()),
                    negated: false,
                },
                Expr::Constant(SqlValue::Text(String::from("n/a"))),
            )],
            else_clause: Some(Box::new(region.clone())),
        };
        assert_eq!(
            value(&case),
            "IIF([c].[Region] IS NULL, 'n/a', [c].[Region])"
        );
        let coalesce = Expr::call(
            Function::Coalesce,
            vec![region, Expr::Constant(SqlValue::Text(String::from("-")))],
        );
        assert_eq!(
            value(&coalesce),
            "IIF([c].[Region] IS NULL, '-', [c].[Region])"
        );
    }

    #[test]
    fn test_boolean_casts() {
        let flag = col("c", "IsActive", Some(StoreType::Bit));
        let to_int = Expr::Cast {
            expr: Box::new(flag),
            to: StoreType::Integer,
        };
        assert_eq!(value(&to_int), "IIF([c].[IsActive] = True, 1, 0)");

        let qty = col("o", "Quantity", Some(StoreType::Integer));
        let to_bool = Expr::Cast {
            expr: Box::new(qty.clone()),
            to: StoreType::Bit,
        };
        assert_eq!(pred(&to_bool), "[o].[Quantity] <> 0");

        let to_text = Expr::Cast {
            expr: Box::new(qty),
            to: StoreType::VarChar(255),
        };
        assert_eq!(value(&to_text), "CSTR([o].[Quantity])");
    }

    #[test]
    fn test_parameter_reuse_redeclares() {
        let rules = DialectRules::jet();
        let p = Expr::Parameter(ParameterSpec {
            name: Some(String::from("city")),
            value: SqlValue::Text(String::from("London")),
            store_type: None,
            nullable: false,
        });
        let expr = Expr::binary(col("c", "City", None), BinaryOp::Eq, p.clone())
            .or(Expr::binary(col("c", "ShipCity", None), BinaryOp::Eq, p));
        let (sql, params) = Translator::new(&rules)
            .translate_predicate(&expr, &["c"])
            .unwrap();
        assert_eq!(sql, "[c].[City] = @city OR [c].[ShipCity] = @city");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, params[1].name);
    }

    #[test]
    fn test_unknown_alias_is_rejected() {
        let rules = DialectRules::jet();
        let err = Translator::new(&rules)
            .translate_value(&col("x", "Id", None), &["c"])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::TranslateError::UnresolvedColumn { ref alias, .. } if alias == "x"
        ));
    }
}

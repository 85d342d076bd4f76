//! Function mappings.

use crate::ast::{DateUnit, Expr, Function};
use crate::error::{Result, TranslateError};
use crate::value::SqlValue;

use super::expr::iif;
use super::fragment::{SqlFragment, PREFIX};
use super::StatementBuilder;

/// Returns the Jet interval code of a date unit.
pub(crate) fn interval_code(unit: DateUnit) -> Result<&'static str> {
    let code = match unit {
        DateUnit::Year => "yyyy",
        DateUnit::Quarter => "q",
        DateUnit::Month => "m",
        DateUnit::Day => "d",
        DateUnit::Hour => "h",
        DateUnit::Minute => "n",
        DateUnit::Second => "s",
        DateUnit::Millisecond => {
            return Err(TranslateError::untranslatable(
                "Jet date functions have no millisecond interval",
            ));
        }
    };
    Ok(code)
}

impl StatementBuilder<'_> {
    pub(crate) fn function(&mut self, func: &Function, args: &[Expr]) -> Result<SqlFragment> {
        match func {
            Function::ToUpper => self.call("UCASE", func, args, 1),
            Function::ToLower => self.call("LCASE", func, args, 1),
            Function::Trim => self.call("TRIM", func, args, 1),
            Function::TrimStart => self.call("LTRIM", func, args, 1),
            Function::TrimEnd => self.call("RTRIM", func, args, 1),
            Function::Length => self.call("LEN", func, args, 1),
            Function::Replace => self.call("REPLACE", func, args, 3),
            Function::Substring => self.substring(args),
            Function::IndexOf => {
                arity(func, args, 2)?;
                let subject = self.value(&args[0])?;
                let search = self.value(&args[1])?;
                let position = SqlFragment::call(
                    "INSTR",
                    vec![SqlFragment::raw("1"), subject, search, SqlFragment::raw("1")],
                );
                Ok(SqlFragment::infix(position, "-", SqlFragment::raw("1"), 7).paren())
            }

            Function::Abs => self.call("ABS", func, args, 1),
            Function::Round if args.len() == 2 => self.call("ROUND", func, args, 2),
            Function::Round => self.call("ROUND", func, args, 1),
            Function::Floor => self.call("INT", func, args, 1),
            Function::Ceiling => {
                arity(func, args, 1)?;
                let negated = SqlFragment::prefix("-", self.value(&args[0])?, PREFIX);
                let floor = SqlFragment::call("INT", vec![negated]);
                Ok(SqlFragment::prefix("-", floor, PREFIX))
            }
            Function::Sqrt => self.call("SQR", func, args, 1),
            Function::Sign => self.call("SGN", func, args, 1),
            Function::Exp => self.call("EXP", func, args, 1),
            Function::Log => self.call("LOG", func, args, 1),
            Function::Power => {
                arity(func, args, 2)?;
                let base = self.value(&args[0])?.paren_unless_atom();
                let exponent = self.value(&args[1])?.paren_unless_atom();
                Ok(SqlFragment::infix(base, "^", exponent, PREFIX).paren())
            }

            Function::Now => self.call("NOW", func, args, 0),
            Function::Today => self.call("DATE", func, args, 0),
            Function::DatePart(unit) => self.date_call("DATEPART", *unit, func, args, 1),
            Function::DateAdd(unit) => self.date_call("DATEADD", *unit, func, args, 2),
            Function::DateDiff(unit) => self.date_call("DATEDIFF", *unit, func, args, 2),

            Function::Coalesce => self.coalesce(args),

            Function::CountAll => {
                arity(func, args, 0)?;
                Ok(SqlFragment::raw("COUNT(*)"))
            }
            Function::Count => self.call("COUNT", func, args, 1),
            Function::CountDistinct => Err(TranslateError::untranslatable(
                "Jet does not support COUNT(DISTINCT ...)",
            )),
            Function::Sum => self.call("SUM", func, args, 1),
            Function::Avg => self.call("AVG", func, args, 1),
            Function::Min => self.call("MIN", func, args, 1),
            Function::Max => self.call("MAX", func, args, 1),

            Function::Contains | Function::StartsWith | Function::EndsWith => {
                let expr = Expr::call(func.clone(), args.to_vec());
                self.predicate_as_value(&expr)
            }
            Function::Other(name) => Err(TranslateError::untranslatable(format!(
                "function '{name}' has no Jet mapping"
            ))),
        }
    }

    fn call(
        &mut self,
        name: &str,
        func: &Function,
        args: &[Expr],
        expected: usize,
    ) -> Result<SqlFragment> {
        arity(func, args, expected)?;
        let args = args
            .iter()
            .map(|arg| self.value(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(SqlFragment::call(name, args))
    }

    /// The interval is always inlined; Jet does not accept it as a
    /// parameter.
    fn date_call(
        &mut self,
        name: &str,
        unit: DateUnit,
        func: &Function,
        args: &[Expr],
        expected: usize,
    ) -> Result<SqlFragment> {
        arity(func, args, expected)?;
        let mut parts = vec![SqlFragment::raw(format!("'{}'", interval_code(unit)?))];
        for arg in args {
            parts.push(self.value(arg)?);
        }
        Ok(SqlFragment::call(name, parts))
    }

    /// Zero-based `Substring(s, start[, length])` becomes one-based
    /// `MID(s, start + 1[, length])`.
    fn substring(&mut self, args: &[Expr]) -> Result<SqlFragment> {
        if !(2..=3).contains(&args.len()) {
            return Err(TranslateError::untranslatable(format!(
                "Substring takes 2 or 3 arguments, got {}",
                args.len()
            )));
        }
        let subject = self.value(&args[0])?;
        let start = match &args[1] {
            Expr::Constant(SqlValue::Int(n)) => SqlFragment::raw(n.saturating_add(1).to_string()),
            other => {
                let start = self.value(other)?.paren_below(7);
                SqlFragment::infix(start, "+", SqlFragment::raw("1"), 7)
            }
        };
        let mut parts = vec![subject, start];
        if let Some(length) = args.get(2) {
            parts.push(self.value(length)?);
        }
        Ok(SqlFragment::call("MID", parts))
    }

    /// `Coalesce(a, b, c)` becomes `IIF(a IS NULL, IIF(b IS NULL, c, b), a)`.
    fn coalesce(&mut self, args: &[Expr]) -> Result<SqlFragment> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.value(arg)?);
        }
        let Some(mut result) = values.pop() else {
            return Err(TranslateError::untranslatable(
                "Coalesce needs at least one argument",
            ));
        };
        for value in values.into_iter().rev() {
            let test = value.clone().paren_below(4).postfix("IS NULL", 3);
            result = iif(test, result, value);
        }
        Ok(result)
    }
}

fn arity(func: &Function, args: &[Expr], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(TranslateError::untranslatable(format!(
            "{func:?} takes {expected} argument(s), got {}",
            args.len()
        )))
    }
}

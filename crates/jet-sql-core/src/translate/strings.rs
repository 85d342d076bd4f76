//! Substring, prefix and suffix matching.
//!
//! A literal search string is escaped and matched with `LIKE`. A dynamic
//! one (parameter, column, expression) cannot be escaped in the statement
//! text, so it is matched structurally with `INSTR`, `LEFT` or `RIGHT`
//! instead, guarded so that an empty search string always matches.

use crate::ast::{Expr, Function};
use crate::error::{Result, TranslateError};
use crate::value::SqlValue;

use super::fragment::SqlFragment;
use super::StatementBuilder;

const COMPARISON: u8 = 3;

impl StatementBuilder<'_> {
    pub(crate) fn string_match(&mut self, func: &Function, args: &[Expr]) -> Result<SqlFragment> {
        let [subject, search] = args else {
            return Err(TranslateError::untranslatable(format!(
                "{func:?} takes 2 arguments, got {}",
                args.len()
            )));
        };
        match search {
            Expr::Constant(SqlValue::Text(text)) => self.literal_match(func, subject, text),
            Expr::Constant(other) => Err(TranslateError::untranslatable(format!(
                "{func:?} needs a text search value, got {}",
                other.kind()
            ))),
            _ => self.dynamic_match(func, subject, search),
        }
    }

    fn literal_match(
        &mut self,
        func: &Function,
        subject: &Expr,
        search: &str,
    ) -> Result<SqlFragment> {
        if search.is_empty() {
            return Ok(SqlFragment::raw(self.rules.tautology()).with_prec(COMPARISON));
        }
        let (leading, trailing) = match func {
            Function::StartsWith => (false, true),
            Function::EndsWith => (true, false),
            _ => (true, true),
        };
        let pattern = self.rules.like_pattern_literal(search, leading, trailing);
        let subject = self.value(subject)?.paren_below(COMPARISON + 1);
        Ok(subject.postfix(&format!("LIKE {pattern}"), COMPARISON))
    }

    fn dynamic_match(
        &mut self,
        func: &Function,
        subject: &Expr,
        search: &Expr,
    ) -> Result<SqlFragment> {
        let search = self.value(search)?;
        let subject = self.value(subject)?;
        let empty = SqlFragment::infix(
            search.clone().paren_below(COMPARISON + 1),
            "=",
            SqlFragment::raw("''"),
            COMPARISON,
        );
        let test = match func {
            Function::StartsWith | Function::EndsWith => {
                let side = if *func == Function::StartsWith {
                    "LEFT"
                } else {
                    "RIGHT"
                };
                let length = SqlFragment::call("LEN", vec![search.clone()]);
                let slice = SqlFragment::call(side, vec![subject, length]);
                SqlFragment::infix(slice, "=", search.paren_below(COMPARISON + 1), COMPARISON)
            }
            _ => {
                let position = SqlFragment::call(
                    "INSTR",
                    vec![SqlFragment::raw("1"), subject, search, SqlFragment::raw("1")],
                );
                SqlFragment::infix(position, ">", SqlFragment::raw("0"), COMPARISON)
            }
        };
        Ok(SqlFragment::infix(empty, "OR", test, 1).paren())
    }
}

//! INSERT, UPDATE and DELETE statements.
//!
//! Jet runs one statement per command, so each command renders exactly one
//! statement here. The `SELECT @@IDENTITY` that follows an INSERT with
//! identity retrieval is appended by `Translator::translate_command`.

use crate::ast::{Assignment, DeleteCommand, Expr, InsertCommand, UpdateCommand};
use crate::error::{Result, TranslateError};

use super::fragment::SqlFragment;
use super::StatementBuilder;

impl StatementBuilder<'_> {
    pub(crate) fn insert(&mut self, insert: &InsertCommand) -> Result<SqlFragment> {
        if insert.values.is_empty() {
            return Err(TranslateError::untranslatable(format!(
                "INSERT INTO {} has no values",
                insert.table
            )));
        }
        self.open_scope(&[insert.table.as_str()])?;
        let rendered = self.insert_values(insert);
        self.scopes.pop();
        rendered
    }

    fn insert_values(&mut self, insert: &InsertCommand) -> Result<SqlFragment> {
        let columns = insert
            .values
            .iter()
            .map(|a| self.quote(&a.column))
            .collect::<Vec<_>>()
            .join(", ");
        let values = insert
            .values
            .iter()
            .map(|a| self.value(&a.value))
            .collect::<Result<Vec<_>>>()?;
        let mut sql = SqlFragment::raw(format!(
            "INSERT INTO {} ({columns})\nVALUES (",
            self.quote(&insert.table)
        ));
        sql.push(SqlFragment::join(values, ", "));
        sql.push_str(")");
        Ok(sql)
    }

    pub(crate) fn update(&mut self, update: &UpdateCommand) -> Result<SqlFragment> {
        if update.assignments.is_empty() {
            return Err(TranslateError::untranslatable(format!(
                "UPDATE {} has no assignments",
                update.table
            )));
        }
        self.open_scope(&[update.table.as_str()])?;
        let rendered = self.update_set(update);
        self.scopes.pop();
        rendered
    }

    fn update_set(&mut self, update: &UpdateCommand) -> Result<SqlFragment> {
        let mut sql = SqlFragment::raw(format!("UPDATE {} SET ", self.quote(&update.table)));
        let assignments = update
            .assignments
            .iter()
            .map(|a| self.assignment(a))
            .collect::<Result<Vec<_>>>()?;
        sql.push(SqlFragment::join(assignments, ", "));
        self.where_clause(&mut sql, update.predicate.as_ref())?;
        Ok(sql)
    }

    pub(crate) fn delete(&mut self, delete: &DeleteCommand) -> Result<SqlFragment> {
        self.open_scope(&[delete.table.as_str()])?;
        let mut sql = SqlFragment::raw(format!("DELETE FROM {}", self.quote(&delete.table)));
        let rendered = self.where_clause(&mut sql, delete.predicate.as_ref());
        self.scopes.pop();
        rendered.map(|()| sql)
    }

    fn assignment(&mut self, assignment: &Assignment) -> Result<SqlFragment> {
        let mut sql = SqlFragment::raw(format!("{} = ", self.quote(&assignment.column)));
        sql.push(self.value(&assignment.value)?);
        Ok(sql)
    }

    fn where_clause(&mut self, sql: &mut SqlFragment, predicate: Option<&Expr>) -> Result<()> {
        if let Some(predicate) = predicate {
            sql.push_str("\nWHERE ");
            sql.push(self.predicate(predicate)?);
        }
        Ok(())
    }
}

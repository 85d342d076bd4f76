//! INSERT, UPDATE and DELETE builders using the typestate pattern.
//!
//! `build()` only exists once a statement is complete: an INSERT needs a
//! value, an UPDATE an assignment, and a DELETE either a predicate or an
//! explicit `all_rows()`.

use std::marker::PhantomData;

use crate::ast::{Assignment, Command, DeleteCommand, Expr, InsertCommand, UpdateCommand};

// Typestate markers

/// Marker: no column value yet.
pub struct NoValues;
/// Marker: at least one column value.
pub struct HasValues;
/// Marker: no SET assignment yet.
pub struct NoSet;
/// Marker: at least one SET assignment.
pub struct HasSet;
/// Marker: rows to delete not chosen yet.
pub struct NoWhere;
/// Marker: rows to delete chosen.
pub struct HasWhere;

/// An INSERT builder.
pub struct Insert<Values> {
    table: String,
    values: Vec<Assignment>,
    select_identity: bool,
    _state: PhantomData<Values>,
}

impl Insert<NoValues> {
    /// Starts an INSERT into `table`.
    #[must_use]
    pub fn into_table(table: &str) -> Self {
        Self {
            table: String::from(table),
            values: vec![],
            select_identity: false,
            _state: PhantomData,
        }
    }
}

impl<Values> Insert<Values> {
    /// Sets a column value.
    #[must_use]
    pub fn value(mut self, column: &str, value: impl Into<Expr>) -> Insert<HasValues> {
        self.values.push(Assignment {
            column: String::from(column),
            value: value.into(),
        });
        Insert {
            table: self.table,
            values: self.values,
            select_identity: self.select_identity,
            _state: PhantomData,
        }
    }
}

impl Insert<HasValues> {
    /// Retrieves the generated identity with a follow-up statement.
    #[must_use]
    pub const fn select_identity(mut self) -> Self {
        self.select_identity = true;
        self
    }

    /// Builds the command.
    #[must_use]
    pub fn build(self) -> Command {
        Command::Insert(InsertCommand {
            table: self.table,
            values: self.values,
            select_identity: self.select_identity,
        })
    }
}

/// An UPDATE builder.
pub struct Update<Set> {
    table: String,
    assignments: Vec<Assignment>,
    predicate: Option<Expr>,
    _state: PhantomData<Set>,
}

impl Update<NoSet> {
    /// Starts an UPDATE of `table`.
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self {
            table: String::from(table),
            assignments: vec![],
            predicate: None,
            _state: PhantomData,
        }
    }
}

impl<Set> Update<Set> {
    /// Adds a SET assignment.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Expr>) -> Update<HasSet> {
        self.assignments.push(Assignment {
            column: String::from(column),
            value: value.into(),
        });
        Update {
            table: self.table,
            assignments: self.assignments,
            predicate: self.predicate,
            _state: PhantomData,
        }
    }
}

impl Update<HasSet> {
    /// Adds a WHERE predicate, ANDed with any previous one.
    #[must_use]
    pub fn where_clause(mut self, predicate: impl Into<Expr>) -> Self {
        let predicate = predicate.into();
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Builds the command.
    #[must_use]
    pub fn build(self) -> Command {
        Command::Update(UpdateCommand {
            table: self.table,
            assignments: self.assignments,
            predicate: self.predicate,
        })
    }
}

/// A DELETE builder.
pub struct Delete<Where> {
    table: String,
    predicate: Option<Expr>,
    _state: PhantomData<Where>,
}

impl Delete<NoWhere> {
    /// Starts a DELETE from `table`.
    #[must_use]
    pub fn from_table(table: &str) -> Self {
        Self {
            table: String::from(table),
            predicate: None,
            _state: PhantomData,
        }
    }

    /// Deletes every row.
    #[must_use]
    pub fn all_rows(self) -> Delete<HasWhere> {
        Delete {
            table: self.table,
            predicate: None,
            _state: PhantomData,
        }
    }
}

impl<Where> Delete<Where> {
    /// Restricts the deleted rows, ANDed with any previous predicate.
    #[must_use]
    pub fn where_clause(self, predicate: impl Into<Expr>) -> Delete<HasWhere> {
        let predicate = predicate.into();
        Delete {
            table: self.table,
            predicate: Some(match self.predicate {
                Some(existing) => existing.and(predicate),
                None => predicate,
            }),
            _state: PhantomData,
        }
    }
}

impl Delete<HasWhere> {
    /// Builds the command.
    #[must_use]
    pub fn build(self) -> Command {
        Command::Delete(DeleteCommand {
            table: self.table,
            predicate: self.predicate,
        })
    }
}

//! Source aliases: generation and scope resolution.

use std::collections::BTreeSet;

use crate::ast::{Expr, QueryShape, SetOperation, SourceKind};
use crate::error::{Result, TranslateError};

/// Hands out `t`, `t0`, `t1`, ... skipping every alias the caller used
/// anywhere in the plan.
#[derive(Debug, Default)]
pub(crate) struct AliasGenerator {
    taken: BTreeSet<String>,
    next: Option<usize>,
}

impl AliasGenerator {
    /// Creates a generator that avoids the aliases used in `shape`.
    pub fn for_shape(shape: &QueryShape) -> Self {
        let mut taken = BTreeSet::new();
        collect_shape(shape, &mut taken);
        Self { taken, next: None }
    }

    /// Creates a generator that avoids the aliases used in subqueries of
    /// `exprs`.
    pub fn for_exprs<'e>(exprs: impl IntoIterator<Item = &'e Expr>) -> Self {
        let mut taken = BTreeSet::new();
        for expr in exprs {
            collect_expr(expr, &mut taken);
        }
        Self { taken, next: None }
    }

    /// Returns the next free alias.
    pub fn fresh(&mut self) -> String {
        loop {
            let alias = match self.next {
                None => String::from("t"),
                Some(n) => format!("t{n}"),
            };
            self.next = Some(self.next.map_or(0, |n| n + 1));
            if self.taken.insert(alias.clone()) {
                return alias;
            }
        }
    }
}

/// Nested alias scopes. Correlated subqueries see enclosing scopes.
#[derive(Debug, Default)]
pub(crate) struct Scopes {
    stack: Vec<Vec<String>>,
}

impl Scopes {
    pub fn push(&mut self) {
        self.stack.push(Vec::new());
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Declares an alias in the innermost scope.
    pub fn declare(&mut self, alias: &str) -> Result<()> {
        let Some(scope) = self.stack.last_mut() else {
            return Err(TranslateError::untranslatable("no open scope"));
        };
        if scope.iter().any(|a| a == alias) {
            return Err(TranslateError::AmbiguousAliasCollision(String::from(alias)));
        }
        scope.push(String::from(alias));
        Ok(())
    }

    /// Checks that `alias` is visible from the innermost scope.
    pub fn resolve(&self, alias: &str, column: &str) -> Result<()> {
        if self.stack.iter().rev().flatten().any(|a| a == alias) {
            Ok(())
        } else {
            Err(TranslateError::UnresolvedColumn {
                alias: String::from(alias),
                column: String::from(column),
            })
        }
    }
}

fn collect_shape(shape: &QueryShape, taken: &mut BTreeSet<String>) {
    for source in &shape.sources {
        if let Some(alias) = &source.alias {
            taken.insert(alias.clone());
        }
        if let SourceKind::Derived(inner) = &source.kind {
            collect_shape(inner, taken);
        }
        if let Some(on) = &source.on {
            collect_expr(on, taken);
        }
    }
    for projection in &shape.projections {
        collect_expr(&projection.expr, taken);
    }
    for expr in shape
        .predicate
        .iter()
        .chain(shape.having.iter())
        .chain(shape.group_by.iter())
        .chain(shape.order_by.iter().map(|o| &o.expr))
    {
        collect_expr(expr, taken);
    }
    if let Some(set) = &shape.set_operation {
        let SetOperation { left, right, .. } = set.as_ref();
        collect_shape(left, taken);
        collect_shape(right, taken);
    }
}

fn collect_expr(expr: &Expr, taken: &mut BTreeSet<String>) {
    match expr {
        Expr::Exists(query) | Expr::Subquery(query) => collect_shape(query, taken),
        Expr::InSubquery { expr, query, .. } => {
            collect_expr(expr, taken);
            collect_shape(query, taken);
        }
        Expr::Unary { operand, .. } => collect_expr(operand, taken),
        Expr::Binary { left, right, .. } => {
            collect_expr(left, taken);
            collect_expr(right, taken);
        }
        Expr::Function { args, .. } => args.iter().for_each(|a| collect_expr(a, taken)),
        Expr::Case {
            operand,
            when_clauses,
            else_clause,
        } => {
            operand.iter().for_each(|e| collect_expr(e, taken));
            for (w, t) in when_clauses {
                collect_expr(w, taken);
                collect_expr(t, taken);
            }
            else_clause.iter().for_each(|e| collect_expr(e, taken));
        }
        Expr::InList { expr, list, .. } => {
            collect_expr(expr, taken);
            list.iter().for_each(|e| collect_expr(e, taken));
        }
        Expr::IsNull { expr, .. } | Expr::Cast { expr, .. } | Expr::Collate { expr, .. } => {
            collect_expr(expr, taken);
        }
        Expr::Like { expr, pattern, .. } => {
            collect_expr(expr, taken);
            collect_expr(pattern, taken);
        }
        Expr::Column(_) | Expr::Constant(_) | Expr::Parameter(_) | Expr::Closure(_) => {}
    }
}

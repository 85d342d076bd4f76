//! SQL text fragments with the parameters they reference.

use crate::statement::Parameter;

/// Precedence of fragments that never need parentheses: literals, columns,
/// placeholders, function calls and parenthesized groups.
pub(crate) const ATOM: u8 = u8::MAX;

/// Precedence of prefix operators (`-x`, `BNOT x`).
pub(crate) const PREFIX: u8 = 10;

/// Precedence of `NOT`, which binds looser than comparisons in Jet.
pub(crate) const NOT: u8 = 3;

/// A piece of SQL text plus the parameters it references, in text order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SqlFragment {
    pub sql: String,
    pub params: Vec<Parameter>,
    /// Precedence of the outermost operator.
    pub prec: u8,
}

impl SqlFragment {
    /// Creates a parameterless atom.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
            prec: ATOM,
        }
    }

    /// Creates an atom holding one parameter placeholder.
    pub fn placeholder(sql: String, param: Parameter) -> Self {
        Self {
            sql,
            params: vec![param],
            prec: ATOM,
        }
    }

    /// Creates a fragment with the given precedence.
    pub fn with_prec(mut self, prec: u8) -> Self {
        self.prec = prec;
        self
    }

    /// Joins two fragments with an infix operator.
    pub fn infix(left: Self, op: &str, right: Self, prec: u8) -> Self {
        let mut params = left.params;
        params.extend(right.params);
        Self {
            sql: format!("{} {op} {}", left.sql, right.sql),
            params,
            prec,
        }
    }

    /// Prepends a prefix operator, parenthesizing anything but an atom.
    ///
    /// A negative literal under `-` is parenthesized too, since `--` starts
    /// a line comment.
    pub fn prefix(op: &str, operand: Self, prec: u8) -> Self {
        let operand = if op.ends_with('-') && operand.sql.starts_with('-') {
            operand.paren()
        } else {
            operand.paren_unless_atom()
        };
        Self {
            sql: format!("{op}{}", operand.sql),
            params: operand.params,
            prec,
        }
    }

    /// Appends a postfix keyword.
    pub fn postfix(self, keyword: &str, prec: u8) -> Self {
        Self {
            sql: format!("{} {keyword}", self.sql),
            params: self.params,
            prec,
        }
    }

    /// Renders `name(arg, ...)`.
    pub fn call(name: &str, args: Vec<Self>) -> Self {
        let mut params = Vec::new();
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(arg.sql);
            params.extend(arg.params);
        }
        Self {
            sql: format!("{name}({})", parts.join(", ")),
            params,
            prec: ATOM,
        }
    }

    /// Joins fragments with a separator, keeping parameter order.
    pub fn join(parts: Vec<Self>, separator: &str) -> Self {
        let mut params = Vec::new();
        let mut sql = Vec::with_capacity(parts.len());
        for part in parts {
            sql.push(part.sql);
            params.extend(part.params);
        }
        Self {
            sql: sql.join(separator),
            params,
            prec: ATOM,
        }
    }

    /// Wraps the fragment in parentheses.
    pub fn paren(self) -> Self {
        Self {
            sql: format!("({})", self.sql),
            params: self.params,
            prec: ATOM,
        }
    }

    /// Wraps the fragment in parentheses unless it is an atom.
    pub fn paren_unless_atom(self) -> Self {
        if self.prec == ATOM {
            self
        } else {
            self.paren()
        }
    }

    /// Wraps the fragment in parentheses if it binds looser than `prec`.
    pub fn paren_below(self, prec: u8) -> Self {
        if self.prec < prec {
            self.paren()
        } else {
            self
        }
    }

    /// Appends text and parameters of another fragment.
    pub fn push(&mut self, other: Self) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }

    /// Appends plain text.
    pub fn push_str(&mut self, text: &str) {
        self.sql.push_str(text);
    }
}

//! Error types for statement translation.

/// Errors that can occur while translating a plan into Jet SQL.
///
/// A translation either produces a complete statement or fails with one of
/// these; partially built SQL is never returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslateError {
    /// A value has no literal or parameter representation in the dialect.
    #[error("Unsupported literal type: {type_name} ({reason})")]
    UnsupportedLiteralType {
        /// Name of the value kind that failed.
        type_name: &'static str,
        /// Why it cannot be rendered.
        reason: String,
    },

    /// An operator or function has no mapping in the dialect.
    #[error("Untranslatable expression: {0}")]
    UntranslatableExpression(String),

    /// A raw SQL fragment cannot be used as a derived table.
    #[error("Raw SQL is not composable: {reason}")]
    NonComposableRawSql {
        /// What made the fragment non-composable.
        reason: String,
    },

    /// Two sources in the same scope claim the same alias.
    #[error("Alias '{0}' is declared more than once in the same scope")]
    AmbiguousAliasCollision(String),

    /// The entity type is not part of the model.
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    /// A qualified column refers to an alias that is not in scope.
    #[error("Column '{column}' refers to alias '{alias}' which is not in scope")]
    UnresolvedColumn {
        /// The alias the column was qualified with.
        alias: String,
        /// The column name.
        column: String,
    },

    /// The branches of a set operation project a different number of columns.
    #[error("Set operation branches project {left} and {right} columns")]
    SetOperationArity {
        /// Column count of the left branch.
        left: usize,
        /// Column count of the right branch.
        right: usize,
    },
}

impl TranslateError {
    /// Creates an untranslatable-expression error.
    #[must_use]
    pub fn untranslatable(message: impl Into<String>) -> Self {
        Self::UntranslatableExpression(message.into())
    }

    /// Creates an unsupported-literal error.
    #[must_use]
    pub fn unsupported(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::UnsupportedLiteralType {
            type_name,
            reason: reason.into(),
        }
    }

    /// Creates a non-composable raw SQL error.
    #[must_use]
    pub fn non_composable(reason: impl Into<String>) -> Self {
        Self::NonComposableRawSql {
            reason: reason.into(),
        }
    }
}

/// Result type for translation operations.
pub type Result<T> = std::result::Result<T, TranslateError>;

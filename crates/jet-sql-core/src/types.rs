//! Jet store types and their static categories.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslateError};
use crate::value::SqlValue;

/// Longest text that still fits a `varchar` column.
pub const MAX_VARCHAR: u32 = 255;

/// Longest binary that still fits a `varbinary` column.
pub const MAX_VARBINARY: u32 = 510;

/// A column or parameter type as Jet declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// `bit` (Yes/No).
    Bit,
    /// `byte`.
    Byte,
    /// `smallint` (Integer).
    SmallInt,
    /// `integer` (Long Integer).
    Integer,
    /// `decimal(p, s)`.
    Decimal {
        /// Total digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// `single`.
    Single,
    /// `double`.
    Double,
    /// `currency`.
    Currency,
    /// `varchar(n)` (Short Text).
    VarChar(u32),
    /// `longchar` (Long Text / Memo).
    LongChar,
    /// `varbinary(n)`.
    VarBinary(u32),
    /// `longbinary` (OLE Object).
    LongBinary,
    /// `datetime`.
    DateTime,
    /// `guid` (Replication ID).
    Guid,
}

/// The static category of an expression, used for operator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    /// Yes/No values.
    Boolean,
    /// Whole numbers.
    Integral,
    /// Floating point and exact decimals.
    Real,
    /// Strings.
    Text,
    /// Byte arrays.
    Binary,
    /// Dates and times.
    Temporal,
    /// Replication IDs.
    Guid,
}

impl StoreType {
    /// Returns the Jet DDL name of the type.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Bit => String::from("bit"),
            Self::Byte => String::from("byte"),
            Self::SmallInt => String::from("smallint"),
            Self::Integer => String::from("integer"),
            Self::Decimal { precision, scale } => format!("decimal({precision},{scale})"),
            Self::Single => String::from("single"),
            Self::Double => String::from("double"),
            Self::Currency => String::from("currency"),
            Self::VarChar(n) => format!("varchar({n})"),
            Self::LongChar => String::from("longchar"),
            Self::VarBinary(n) => format!("varbinary({n})"),
            Self::LongBinary => String::from("longbinary"),
            Self::DateTime => String::from("datetime"),
            Self::Guid => String::from("guid"),
        }
    }

    /// Returns the static category of the type.
    #[must_use]
    pub const fn category(&self) -> TypeCategory {
        match self {
            Self::Bit => TypeCategory::Boolean,
            Self::Byte | Self::SmallInt | Self::Integer => TypeCategory::Integral,
            Self::Decimal { .. } | Self::Single | Self::Double | Self::Currency => {
                TypeCategory::Real
            }
            Self::VarChar(_) | Self::LongChar => TypeCategory::Text,
            Self::VarBinary(_) | Self::LongBinary => TypeCategory::Binary,
            Self::DateTime => TypeCategory::Temporal,
            Self::Guid => TypeCategory::Guid,
        }
    }

    /// Returns the byte size a driver binds for this type.
    ///
    /// Variable-length types report their declared length, the long types
    /// report `-1`, fixed-size types report nothing.
    #[must_use]
    pub fn size(&self) -> Option<i32> {
        match self {
            Self::VarChar(n) | Self::VarBinary(n) => i32::try_from(*n).ok(),
            Self::LongChar | Self::LongBinary => Some(-1),
            _ => None,
        }
    }

    /// Infers the store type a parameter of this value binds as.
    pub fn infer(value: &SqlValue) -> Result<Self> {
        let ty = match value {
            SqlValue::Null => Self::VarChar(MAX_VARCHAR),
            SqlValue::Bool(_) => Self::Bit,
            SqlValue::Int(n) => {
                if i32::try_from(*n).is_ok() {
                    Self::Integer
                } else {
                    Self::Decimal {
                        precision: 20,
                        scale: 0,
                    }
                }
            }
            SqlValue::Float(_) => Self::Double,
            SqlValue::Decimal(text) => Self::Decimal {
                precision: 28,
                scale: decimal_scale(text),
            },
            SqlValue::Text(s) => {
                if s.chars().count() <= MAX_VARCHAR as usize {
                    Self::VarChar(MAX_VARCHAR)
                } else {
                    Self::LongChar
                }
            }
            SqlValue::Blob(b) => {
                if b.len() <= MAX_VARBINARY as usize {
                    Self::VarBinary(MAX_VARBINARY)
                } else {
                    Self::LongBinary
                }
            }
            SqlValue::Date(_)
            | SqlValue::Time(_)
            | SqlValue::DateTime(_)
            | SqlValue::DateTimeOffset(_) => Self::DateTime,
            SqlValue::Guid(_) => Self::Guid,
            SqlValue::Interval(_) => {
                return Err(TranslateError::unsupported(
                    "interval",
                    "Jet has no interval type to bind elapsed time to",
                ));
            }
            SqlValue::List(_) => {
                return Err(TranslateError::unsupported(
                    "list",
                    "a list cannot be bound as a single parameter",
                ));
            }
        };
        Ok(ty)
    }
}

impl TypeCategory {
    /// Returns the category of a value, if it has one.
    #[must_use]
    pub const fn of_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bool(_) => Some(Self::Boolean),
            SqlValue::Int(_) => Some(Self::Integral),
            SqlValue::Float(_) | SqlValue::Decimal(_) => Some(Self::Real),
            SqlValue::Text(_) => Some(Self::Text),
            SqlValue::Blob(_) => Some(Self::Binary),
            SqlValue::Date(_)
            | SqlValue::Time(_)
            | SqlValue::DateTime(_)
            | SqlValue::DateTimeOffset(_) => Some(Self::Temporal),
            SqlValue::Guid(_) => Some(Self::Guid),
            SqlValue::Null | SqlValue::Interval(_) | SqlValue::List(_) => None,
        }
    }

    /// Returns true for integral and real categories.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integral | Self::Real)
    }
}

fn decimal_scale(text: &str) -> u8 {
    text.split_once('.')
        .map_or(0, |(_, frac)| u8::try_from(frac.len()).unwrap_or(u8::MAX))
}

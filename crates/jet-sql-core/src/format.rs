//! Literal formatting and value normalization.

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use tracing::trace;

use crate::dialect::{DialectRules, OffsetPolicy, SubSecondPolicy};
use crate::error::{Result, TranslateError};
use crate::types::StoreType;
use crate::value::SqlValue;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NIL_GUID: &str = "00000000-0000-0000-0000-000000000000";

impl DialectRules {
    /// Renders a value as an inline Jet literal.
    pub fn format_literal(&self, value: &SqlValue) -> Result<String> {
        let sql = match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(b) => String::from(self.bool_literal(*b)),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) => format_float(*f)?,
            SqlValue::Decimal(text) => format_decimal(text)?,
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::Blob(bytes) => {
                let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("0x{hex}")
            }
            SqlValue::Date(d) => format!("#{}#", d.format(DATE_FORMAT)),
            SqlValue::Time(t) => format!("#{}#", self.adjust_time(*t).format(TIME_FORMAT)),
            SqlValue::DateTime(dt) => {
                format!("#{}#", self.adjust_sub_second(*dt).format(DATETIME_FORMAT))
            }
            SqlValue::DateTimeOffset(dto) => {
                let local = self.normalize_timestamp(dto);
                format!("#{}#", local.format(DATETIME_FORMAT))
            }
            SqlValue::Guid(g) => format!("{{guid {{{}}}}}", validate_guid(g)?),
            SqlValue::Interval(_) => {
                return Err(TranslateError::unsupported(
                    "interval",
                    "Jet has no interval literal",
                ));
            }
            SqlValue::List(_) => {
                return Err(TranslateError::unsupported(
                    "list",
                    "a list is only valid as the right side of IN",
                ));
            }
        };
        Ok(sql)
    }

    /// Renders a NULL carrying the given store type.
    ///
    /// The result is `IIF(False, <sample of the type>, NULL)`. A converted
    /// NULL such as `CLNG(NULL)` raises an error in Jet.
    pub fn typed_null(&self, store_type: StoreType) -> Result<String> {
        let sample = match store_type {
            StoreType::Bit => String::from(self.bool_literal(false)),
            StoreType::Byte => String::from("CBYTE(0)"),
            StoreType::SmallInt => String::from("CINT(0)"),
            StoreType::Integer => String::from("CLNG(0)"),
            StoreType::Decimal { .. } => String::from("CDEC(0)"),
            StoreType::Single => String::from("CSNG(0)"),
            StoreType::Double => String::from("CDBL(0)"),
            StoreType::Currency => String::from("CCUR(0)"),
            StoreType::VarChar(_) | StoreType::LongChar => String::from("''"),
            StoreType::VarBinary(_) | StoreType::LongBinary => {
                self.format_literal(&SqlValue::Blob(vec![0]))?
            }
            StoreType::DateTime => String::from("CDATE(0)"),
            StoreType::Guid => self.format_literal(&SqlValue::Guid(String::from(NIL_GUID)))?,
        };
        Ok(format!("IIF({}, {sample}, NULL)", self.bool_literal(false)))
    }

    /// Renders a value as a literal of the given declared type.
    ///
    /// Integers declared as `bit` become boolean keywords; everything else
    /// renders as [`format_literal`](Self::format_literal) would.
    pub fn format_typed_literal(&self, value: &SqlValue, declared: StoreType) -> Result<String> {
        match (value, declared) {
            (SqlValue::Int(n), StoreType::Bit) => Ok(String::from(self.bool_literal(*n != 0))),
            _ => self.format_literal(value),
        }
    }

    /// Converts an offset-aware timestamp into Jet's offset-naive `datetime`.
    ///
    /// This conversion loses the offset, and with [`SubSecondPolicy`] also
    /// the fraction of a second.
    #[must_use]
    pub fn normalize_timestamp(&self, value: &DateTime<FixedOffset>) -> NaiveDateTime {
        let naive = match self.offset_policy {
            OffsetPolicy::Utc => value.naive_utc(),
            OffsetPolicy::WallClock => value.naive_local(),
        };
        trace!(
            input = %value,
            normalized = %naive,
            "dropping timestamp offset"
        );
        self.adjust_sub_second(naive)
    }

    /// Normalizes a value before it is bound as a parameter.
    ///
    /// Offset-aware timestamps become naive ones, and naive timestamps get
    /// the sub-second policy applied, so bound values match literals.
    #[must_use]
    pub fn normalize_value(&self, value: SqlValue) -> SqlValue {
        match value {
            SqlValue::DateTimeOffset(dto) => SqlValue::DateTime(self.normalize_timestamp(&dto)),
            SqlValue::DateTime(dt) => SqlValue::DateTime(self.adjust_sub_second(dt)),
            SqlValue::Time(t) => SqlValue::Time(self.adjust_time(t)),
            other => other,
        }
    }

    fn adjust_sub_second(&self, value: NaiveDateTime) -> NaiveDateTime {
        let nanos = value.nanosecond();
        let whole = value.with_nanosecond(0).unwrap_or(value);
        match self.sub_second {
            SubSecondPolicy::Truncate => whole,
            SubSecondPolicy::Round if nanos >= 500_000_000 => whole
                .checked_add_signed(TimeDelta::seconds(1))
                .unwrap_or(whole),
            SubSecondPolicy::Round => whole,
        }
    }

    fn adjust_time(&self, value: NaiveTime) -> NaiveTime {
        let nanos = value.nanosecond();
        let whole = value.with_nanosecond(0).unwrap_or(value);
        match self.sub_second {
            SubSecondPolicy::Round if nanos >= 500_000_000 => {
                whole.overflowing_add_signed(TimeDelta::seconds(1)).0
            }
            _ => whole,
        }
    }
}

fn format_float(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(TranslateError::unsupported(
            "float",
            format!("{value} has no Jet literal"),
        ));
    }
    if value.fract() == 0.0 && value.abs() < 1e16 {
        Ok(format!("{value:.1}"))
    } else {
        Ok(format!("{value}"))
    }
}

fn format_decimal(text: &str) -> Result<String> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next().unwrap_or("0");
    let valid = !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && !frac.is_empty()
        && frac.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(String::from(text))
    } else {
        Err(TranslateError::unsupported(
            "decimal",
            format!("'{text}' is not a decimal number"),
        ))
    }
}

fn validate_guid(text: &str) -> Result<&str> {
    let groups: Vec<&str> = text.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    let valid = groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(text)
    } else {
        Err(TranslateError::unsupported(
            "guid",
            format!("'{text}' is not a hyphenated GUID"),
        ))
    }
}

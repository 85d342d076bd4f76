//! Raw SQL fragments supplied by the caller.
//!
//! A raw fragment may reference its positional arguments as `{0}`, `{1}`,
//! ...; each reference becomes a bound parameter. A fragment used as a row
//! source has to be a single plain SELECT so it can be wrapped as a derived
//! table.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslateError};
use crate::value::SqlValue;

fn leading_trivia() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\s+|--[^\n]*(?:\n|$)|/\*[\s\S]*?\*/)*").expect("valid trivia regex")
    })
}

fn first_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_]+").expect("valid keyword regex"))
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("valid placeholder regex"))
}

/// A raw SQL fragment and its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSql {
    /// Fragment text.
    pub sql: String,
    /// Arguments referenced as `{0}`, `{1}`, ...
    #[serde(default)]
    pub parameters: Vec<SqlValue>,
}

/// A piece of a raw fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSegment<'a> {
    /// Verbatim text.
    Text(&'a str),
    /// Reference to an argument by index.
    Argument(usize),
}

impl RawSql {
    /// Creates a fragment without arguments.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: vec![],
        }
    }

    /// Sets the positional arguments.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<SqlValue>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Checks that the fragment can be wrapped as a derived table and
    /// returns its text without a trailing semicolon.
    pub fn composable_text(&self) -> Result<&str> {
        let body = strip_trailing_semicolon(&self.sql);
        let rest = &body[leading_trivia().find(body).map_or(0, |m| m.end())..];
        let keyword = first_keyword()
            .find(rest)
            .map(|m| m.as_str().to_ascii_uppercase());
        match keyword.as_deref() {
            Some("SELECT") => {}
            Some("WITH") => {
                return Err(TranslateError::non_composable(
                    "common table expressions cannot be used as a derived table",
                ));
            }
            Some(other) => {
                return Err(TranslateError::non_composable(format!(
                    "a statement starting with {other} cannot be composed over"
                )));
            }
            None => {
                return Err(TranslateError::non_composable(
                    "the fragment does not start with SELECT",
                ));
            }
        }
        if has_statement_separator(body) {
            return Err(TranslateError::non_composable(
                "the fragment contains more than one statement",
            ));
        }
        Ok(body)
    }

    /// Splits `text` into verbatim pieces and argument references.
    ///
    /// Every reference must name an existing argument.
    pub fn segments<'a>(&self, text: &'a str) -> Result<Vec<RawSegment<'a>>> {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in placeholder().captures_iter(text) {
            let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let index: usize = index.as_str().parse().map_err(|_| {
                TranslateError::untranslatable(format!(
                    "raw SQL argument reference {} is out of range",
                    whole.as_str()
                ))
            })?;
            if index >= self.parameters.len() {
                return Err(TranslateError::untranslatable(format!(
                    "raw SQL references argument {{{index}}} but only {} were supplied",
                    self.parameters.len()
                )));
            }
            if whole.start() > last {
                segments.push(RawSegment::Text(&text[last..whole.start()]));
            }
            segments.push(RawSegment::Argument(index));
            last = whole.end();
        }
        if last < text.len() {
            segments.push(RawSegment::Text(&text[last..]));
        }
        Ok(segments)
    }
}

fn strip_trailing_semicolon(sql: &str) -> &str {
    let trimmed = sql.trim_end();
    trimmed.strip_suffix(';').map_or(trimmed, str::trim_end)
}

/// Returns true if a `;` outside string literals and bracketed names is
/// followed by more text.
fn has_statement_separator(sql: &str) -> bool {
    let mut in_string = false;
    let mut in_brackets = false;
    for (i, c) in sql.char_indices() {
        match c {
            '\'' if !in_brackets => in_string = !in_string,
            '[' if !in_string => in_brackets = true,
            ']' if !in_string => in_brackets = false,
            ';' if !in_string && !in_brackets => {
                return !sql[i + 1..].trim().is_empty();
            }
            _ => {}
        }
    }
    false
}

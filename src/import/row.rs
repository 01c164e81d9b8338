//! Row normalization: one delimited line into a [`SourceRow`].

use crate::error::{ImportError, ImportResult};
use chrono::NaiveDateTime;

/// Number of fields every input record must have.
pub const FIELD_COUNT: usize = 6;

/// Format of the expiry column, fractional seconds excluded.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One input record: `Contract, License, Key, Quantity, ExpiryDate, User`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line number in the input file.
    pub line: usize,
    pub contract: Option<String>,
    pub license: Option<String>,
    pub key: Option<String>,
    pub quantity: Option<String>,
    pub expiry: Option<String>,
    pub user: Option<String>,
}

impl SourceRow {
    /// Contract and License named on the same row.
    pub fn has_contract_and_license(&self) -> bool {
        self.contract.is_some() && self.license.is_some()
    }
}

/// Splits raw lines and maps null markers to absent values.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    delimiter: char,
    null_marker: String,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new(';', "null")
    }
}

impl RowNormalizer {
    pub fn new(delimiter: char, null_marker: &str) -> Self {
        Self {
            delimiter,
            null_marker: null_marker.trim().to_lowercase(),
        }
    }

    /// Parse one line. Fails without side effects when the arity is wrong.
    pub fn normalize(&self, line: usize, raw: &str) -> ImportResult<SourceRow> {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let fields = split_record(raw, self.delimiter);
        if fields.len() != FIELD_COUNT {
            return Err(ImportError::MalformedRow {
                line,
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }

        let mut cleaned = fields.into_iter().map(|field| self.clean(field));
        let mut next = || cleaned.next().flatten();
        Ok(SourceRow {
            line,
            contract: next(),
            license: next(),
            key: next(),
            quantity: next(),
            expiry: next(),
            user: next(),
        })
    }

    /// Trim a field; the null marker and empty text both mean "absent".
    fn clean(&self, field: String) -> Option<String> {
        let trimmed = field.trim();
        if trimmed.is_empty() || trimmed.to_lowercase() == self.null_marker {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Split a single-line record on `delimiter`.
///
/// Fields may be wrapped in double quotes, in which case the delimiter is
/// literal inside them and `""` stands for one quote.
pub fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' && current.trim().is_empty() {
            current.clear();
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

/// Parse `YYYY-MM-DD HH:MM:SS[.fraction]`; the fraction is dropped unparsed.
pub fn parse_expiry(line: usize, raw: &str) -> ImportResult<NaiveDateTime> {
    let whole_seconds = raw.split('.').next().unwrap_or(raw).trim();
    NaiveDateTime::parse_from_str(whole_seconds, EXPIRY_FORMAT).map_err(|_| {
        ImportError::InvalidDate {
            line,
            value: raw.to_string(),
        }
    })
}

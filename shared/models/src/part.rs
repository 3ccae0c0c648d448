//! Catalog part models.
//!
//! A part record is a single row of the master parts list. Beyond its
//! identifier the row is an open attribute bag: description, package quantity,
//! unit cost, supplier and whatever other columns the catalog carries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// One row of the parts catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PartRecord {
    #[validate(length(min = 1, max = 200, message = "Part number must be between 1 and 200 characters"))]
    pub identifier: String,
    /// Remaining catalog columns keyed by lower-cased header.
    pub attributes: HashMap<String, String>,
}

impl PartRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute setter, mostly handy in tests and fixtures.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Non-blank attribute value for a column, matched case-insensitively.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(&key.to_lowercase())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Numeric attribute value.
    ///
    /// `None` means the column is absent or blank; `Some(Err(raw))` means a value
    /// is present but does not parse as a number.
    pub fn numeric_attribute(&self, key: &str) -> Option<Result<f64, String>> {
        self.attribute(key).map(|raw| parse_number(raw).ok_or_else(|| raw.to_string()))
    }
}

/// Parse a spreadsheet number, tolerating a leading currency sign and thousands separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

//! Assembly tables: one per assembly, each a list of line items.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// A single line item of an assembly table.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AssemblyRow {
    /// Source row number (1-based, header row included) for diagnostics.
    pub row_number: usize,
    #[validate(length(min = 1, max = 200, message = "Item number must be between 1 and 200 characters"))]
    pub identifier: String,
    /// Per-unit quantity of `identifier` inside the owning assembly.
    pub quantity: f64,
    pub attributes: HashMap<String, String>,
}

impl AssemblyRow {
    pub fn new(row_number: usize, identifier: impl Into<String>, quantity: f64) -> Self {
        Self {
            row_number,
            identifier: identifier.into(),
            quantity,
            attributes: HashMap::new(),
        }
    }

    pub fn has_valid_quantity(&self) -> bool {
        self.quantity.is_finite() && self.quantity > 0.0
    }
}

/// All line items of one assembly, keyed by the assembly's name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssemblyTable {
    pub name: String,
    pub rows: Vec<AssemblyRow>,
}

impl AssemblyTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Append a row, numbering it after the header line.
    pub fn with_row(mut self, identifier: impl Into<String>, quantity: f64) -> Self {
        let row_number = self.rows.len() + 2;
        self.rows.push(AssemblyRow::new(row_number, identifier, quantity));
        self
    }

    /// Local quantity recorded for `identifier` in this table.
    ///
    /// Rows naming the same identifier more than once are summed. Returns `None`
    /// when the identifier is not a row of this table.
    pub fn quantity_of(&self, identifier: &str) -> Option<f64> {
        self.rows
            .iter()
            .filter(|row| row.identifier == identifier)
            .map(|row| row.quantity)
            .reduce(|a, b| a + b)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

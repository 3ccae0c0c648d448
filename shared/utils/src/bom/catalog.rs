//! Parts Catalog
//!
//! In-memory index of the master parts list keyed by part number.

use std::collections::{BTreeSet, HashMap};

use bomtree_models::PartRecord;

use crate::error::{BomError, BomResult};

/// Identifier-keyed catalog that keeps the source row order.
#[derive(Debug, Clone, Default)]
pub struct PartStore {
    records: Vec<PartRecord>,
    index: HashMap<String, usize>,
    columns: Vec<String>,
}

impl PartStore {
    /// Build the store; pass-through columns are the sorted union of attribute keys.
    pub fn load(records: Vec<PartRecord>) -> BomResult<Self> {
        let columns: BTreeSet<String> = records
            .iter()
            .flat_map(|record| record.attributes.keys().cloned())
            .collect();
        Self::with_columns(records, columns.into_iter().collect())
    }

    /// Build the store with an explicit pass-through column order (the catalog's
    /// header order).
    pub fn with_columns(records: Vec<PartRecord>, columns: Vec<String>) -> BomResult<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index.insert(record.identifier.clone(), position).is_some() {
                return Err(BomError::duplicate(&record.identifier, "parts catalog"));
            }
        }

        tracing::debug!(parts = records.len(), "Parts catalog loaded");
        Ok(Self { records, index, columns })
    }

    /// Record for `identifier`; a miss is a normal outcome, not an error.
    pub fn lookup(&self, identifier: &str) -> Option<&PartRecord> {
        self.index.get(identifier).map(|&position| &self.records[position])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    /// Catalog position of `identifier`, used to order flattened output.
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.index.get(identifier).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartRecord> {
        self.records.iter()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

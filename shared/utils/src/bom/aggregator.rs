//! BOM Aggregator
//!
//! Propagates local quantities down the resolved tree and produces the
//! flattened purchase table.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use bomtree_models::{NodeId, NodeKind};

use super::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use super::tree::BomTree;
use crate::config::BomConfig;

/// Part identifier to total required quantity.
pub type Totals = BTreeMap<String, f64>;

/// Catalog columns used for purchase and cost figures.
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub package_quantity_column: String,
    pub package_price_column: String,
    pub unit_cost_column: String,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self::from(&BomConfig::default())
    }
}

impl From<&BomConfig> for FlattenOptions {
    fn from(config: &BomConfig) -> Self {
        Self {
            package_quantity_column: config.package_quantity_column.clone(),
            package_price_column: config.package_price_column.clone(),
            unit_cost_column: config.unit_cost_column.clone(),
        }
    }
}

/// One line of the flattened BOM.
#[derive(Debug, Clone, Serialize)]
pub struct FlatRow {
    pub identifier: String,
    pub attributes: HashMap<String, String>,
    pub total_quantity: f64,
    pub purchase_quantity: f64,
    pub subtotal: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlatTable {
    /// Pass-through catalog columns, in catalog order.
    pub columns: Vec<String>,
    pub rows: Vec<FlatRow>,
    pub diagnostics: Diagnostics,
}

impl FlatTable {
    /// Sum of all known subtotals.
    pub fn total_cost(&self) -> f64 {
        self.rows.iter().filter_map(|row| row.subtotal).sum()
    }
}

/// Quantity roll-up over one tree; results for assemblies are memoised, so a
/// sub-assembly used many times is expanded only once.
pub struct Aggregator<'a> {
    tree: &'a BomTree,
    cache: HashMap<NodeId, Totals>,
}

impl<'a> Aggregator<'a> {
    pub fn new(tree: &'a BomTree) -> Self {
        Self {
            tree,
            cache: HashMap::new(),
        }
    }

    /// Local per-unit quantity of `child_id` in the table of `assembly`.
    pub fn quantity_of(&self, assembly: NodeId, child_id: &str) -> Option<f64> {
        self.tree.quantity_of(assembly, child_id)
    }

    /// Total quantity of every leaf part under `id`.
    ///
    /// A part counts itself once; a reference counts its target; an assembly
    /// sums each child scaled by the quantity of the row that lists it.
    pub fn aggregate(&mut self, id: NodeId) -> Totals {
        let node = self.tree.node(id);
        match &node.kind {
            NodeKind::Part => Totals::from([(node.identifier.clone(), 1.0)]),
            NodeKind::Reference { target } => self.aggregate(*target),
            NodeKind::Assembly { children, .. } => {
                if let Some(cached) = self.cache.get(&id) {
                    return cached.clone();
                }

                let mut totals = Totals::new();
                for edge in children {
                    let Some(quantity) = self.tree.edge_quantity(node, edge) else {
                        continue;
                    };
                    for (identifier, count) in self.aggregate(edge.node) {
                        *totals.entry(identifier).or_insert(0.0) += count * quantity;
                    }
                }

                debug!(assembly = %node.identifier, parts = totals.len(), "Aggregated assembly");
                self.cache.insert(id, totals.clone());
                totals
            }
        }
    }

    /// Aggregate under `id` joined with the catalog, plus purchase and cost figures.
    pub fn flatten(&mut self, id: NodeId, options: &FlattenOptions) -> FlatTable {
        let tree = self.tree;
        let parts = tree.parts();
        let totals = self.aggregate(id);
        let mut diagnostics = Diagnostics::new();
        let mut rows = Vec::with_capacity(totals.len());

        for (identifier, total_quantity) in totals {
            let Some(record) = parts.lookup(&identifier) else {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::MissingCatalogRecord,
                        format!("No catalog record for \"{}\"; row omitted", identifier),
                    )
                    .with_identifier(identifier),
                );
                continue;
            };

            let purchase_quantity = match record.numeric_attribute(&options.package_quantity_column) {
                None => total_quantity,
                Some(Ok(package)) if package > 0.0 => packages_needed(total_quantity, package),
                Some(Ok(_)) | Some(Err(_)) => {
                    diagnostics.push(missing_attribute(&identifier, &options.package_quantity_column, record));
                    total_quantity
                }
            };

            let price = match record.numeric_attribute(&options.package_price_column) {
                Some(price) => Some((price, &options.package_price_column)),
                None => record
                    .numeric_attribute(&options.unit_cost_column)
                    .map(|price| (price, &options.unit_cost_column)),
            };
            let subtotal = match price {
                Some((Ok(price), _)) => Some(purchase_quantity * price),
                Some((Err(_), column)) => {
                    diagnostics.push(missing_attribute(&identifier, column, record));
                    None
                }
                None => None,
            };

            rows.push(FlatRow {
                identifier,
                attributes: record.attributes.clone(),
                total_quantity,
                purchase_quantity,
                subtotal,
            });
        }

        rows.sort_by_key(|row| parts.position(&row.identifier));

        FlatTable {
            columns: parts.columns().to_vec(),
            rows,
            diagnostics,
        }
    }
}

/// Whole packages covering `total`; the ratio is rounded to 1e-9 first so that
/// float noise in summed quantities does not buy an extra package.
fn packages_needed(total: f64, package: f64) -> f64 {
    ((total / package * 1e9).round() / 1e9).ceil()
}

fn missing_attribute(identifier: &str, column: &str, record: &bomtree_models::PartRecord) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::MissingCatalogAttribute,
        format!(
            "\"{}\" has unusable {} '{}'",
            identifier,
            column,
            record.attribute(column).unwrap_or_default()
        ),
    )
    .with_identifier(identifier)
    .with_suggestion(format!("Set {} to a positive number", column))
}

impl BomTree {
    pub fn aggregate(&self, id: NodeId) -> Totals {
        Aggregator::new(self).aggregate(id)
    }

    pub fn flatten(&self, id: NodeId, options: &FlattenOptions) -> FlatTable {
        Aggregator::new(self).flatten(id, options)
    }
}

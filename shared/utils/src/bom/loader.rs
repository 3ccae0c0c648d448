//! BOM Source Loader
//!
//! Turns a folder of table files, or a single multi-sheet workbook, into the
//! catalog rows and named assembly tables the resolver consumes.
//!
//! Folder layout: every `.csv`, `.xlsx`, `.xls` or `.xml` file is a table named
//! after its file stem; the one matching the configured parts file name is the
//! catalog. Files starting with `_` or `~` are ignored.
//!
//! Workbook layout: the first sheet is the catalog, every further sheet is an
//! assembly named after the sheet.

use std::path::Path;

use tracing::info;

use bomtree_models::{AssemblyRow, AssemblyTable, PartRecord};

use super::catalog::PartStore;
use super::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use super::parser::{ParsedTable, TableFormat, TableParser};
use super::resolver::Resolver;
use super::tree::BomTree;
use crate::config::BomConfig;
use crate::error::{BomError, BomResult};
use crate::validation::{validate_model, validate_quantity};

/// Catalog and assemblies ready for resolution.
#[derive(Debug, Clone, Default)]
pub struct BomSource {
    pub catalog: Vec<PartRecord>,
    /// Catalog headers in file order, identifier column excluded.
    pub catalog_columns: Vec<String>,
    pub assemblies: Vec<AssemblyTable>,
    pub diagnostics: Diagnostics,
}

impl BomSource {
    /// Resolve into a tree; load-time diagnostics are carried into the tree.
    pub fn resolve(self) -> BomResult<BomTree> {
        let parts = PartStore::with_columns(self.catalog, self.catalog_columns)?;
        Resolver::new()
            .with_diagnostics(self.diagnostics)
            .resolve(parts, self.assemblies)
    }
}

pub struct BomLoader {
    config: BomConfig,
    parser: TableParser,
}

impl Default for BomLoader {
    fn default() -> Self {
        Self::new(BomConfig::default())
    }
}

impl BomLoader {
    pub fn new(config: BomConfig) -> Self {
        let parser = TableParser::new(&config.identifier_columns, &config.quantity_columns);
        Self { config, parser }
    }

    /// Load a folder or a workbook, depending on what `path` is.
    pub fn load(&self, path: &Path) -> BomResult<BomSource> {
        if path.is_dir() {
            self.load_folder(path)
        } else {
            self.load_workbook(path)
        }
    }

    pub fn load_folder(&self, dir: &Path) -> BomResult<BomSource> {
        let mut files = Vec::new();
        let mut skipped = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(format) = TableFormat::from_extension(&path) else {
                continue;
            };
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) if name.starts_with('_') || name.starts_with('~') => skipped.push(name.to_string()),
                Some(_) => files.push((path, format)),
                None => {}
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        skipped.sort();

        let mut catalog = None;
        let mut assemblies = Vec::new();
        for (path, format) in files {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let data = std::fs::read(&path)?;
            let table = self
                .parser
                .parse_bytes(&stem, &data, format)
                .map_err(|e| BomError::load(path.display().to_string(), format!("{:#}", e)))?;

            if stem.eq_ignore_ascii_case(&self.config.parts_file_name) {
                if catalog.is_some() {
                    return Err(BomError::duplicate(stem, "parts list files"));
                }
                catalog = Some(table);
            } else {
                assemblies.push(table);
            }
        }

        let catalog = catalog.ok_or_else(|| {
            BomError::load(
                dir.display().to_string(),
                format!("parts list '{}' not found", self.config.parts_file_name),
            )
        })?;

        let mut source = self.from_tables(catalog, assemblies);
        let mut diagnostics = Diagnostics::new();
        for name in skipped {
            diagnostics.push(
                Diagnostic::info(DiagnosticKind::SkippedFile, format!("Skipped {}", name)).with_identifier(name),
            );
        }
        diagnostics.extend(std::mem::take(&mut source.diagnostics));
        source.diagnostics = diagnostics;

        info!(
            path = %dir.display(),
            parts = source.catalog.len(),
            assemblies = source.assemblies.len(),
            "Loaded BOM folder"
        );
        Ok(source)
    }

    pub fn load_workbook(&self, path: &Path) -> BomResult<BomSource> {
        let mut sheets = self
            .parser
            .parse_workbook(path)
            .map_err(|e| BomError::load(path.display().to_string(), format!("{:#}", e)))?
            .into_iter();

        let catalog = sheets.next();
        let assemblies: Vec<ParsedTable> = sheets.collect();
        let catalog = match catalog {
            Some(catalog) if !assemblies.is_empty() => catalog,
            _ => {
                return Err(BomError::load(
                    path.display().to_string(),
                    "a single-file BOM needs a parts sheet followed by at least one assembly sheet",
                ))
            }
        };

        let source = self.from_tables(catalog, assemblies);
        info!(
            path = %path.display(),
            parts = source.catalog.len(),
            assemblies = source.assemblies.len(),
            "Loaded BOM workbook"
        );
        Ok(source)
    }

    /// Convert already-parsed tables into catalog records and assembly tables.
    pub fn from_tables(&self, catalog: ParsedTable, assemblies: Vec<ParsedTable>) -> BomSource {
        let mut diagnostics = Diagnostics::new();

        let catalog_columns = catalog
            .column_headers
            .iter()
            .filter(|h| !h.is_empty() && !self.parser.is_identifier_column(h))
            .cloned()
            .collect();
        let records = self.catalog_records(catalog, &mut diagnostics);
        let tables = assemblies
            .into_iter()
            .map(|table| self.assembly_table(table, &mut diagnostics))
            .collect();

        BomSource {
            catalog: records,
            catalog_columns,
            assemblies: tables,
            diagnostics,
        }
    }

    fn catalog_records(&self, table: ParsedTable, diagnostics: &mut Diagnostics) -> Vec<PartRecord> {
        report_parse_warnings(&table, diagnostics);

        let mut records = Vec::with_capacity(table.rows.len());
        for row in table.rows {
            let Some(identifier) = self.parser.identifier(&row) else {
                diagnostics.push(
                    Diagnostic::warning(DiagnosticKind::InvalidRow, "Catalog row has no part number")
                        .at(&table.name, row.row_number),
                );
                continue;
            };

            let mut values = row.values;
            values.retain(|header, _| !self.parser.is_identifier_column(header));
            let record = PartRecord {
                identifier,
                attributes: values,
            };

            match validate_model(&record) {
                Ok(()) => records.push(record),
                Err(message) => diagnostics.push(
                    Diagnostic::warning(DiagnosticKind::InvalidRow, message)
                        .with_identifier(record.identifier)
                        .at(&table.name, row.row_number),
                ),
            }
        }
        records
    }

    fn assembly_table(&self, table: ParsedTable, diagnostics: &mut Diagnostics) -> AssemblyTable {
        report_parse_warnings(&table, diagnostics);

        let mut assembly = AssemblyTable::new(table.name.clone());
        for row in table.rows {
            let Some(identifier) = self.parser.identifier(&row) else {
                diagnostics.push(
                    Diagnostic::warning(DiagnosticKind::InvalidRow, "Row has no item number")
                        .at(&table.name, row.row_number),
                );
                continue;
            };

            let raw_quantity = self.parser.quantity(&row).unwrap_or_default();
            let quantity = match validate_quantity(&raw_quantity) {
                Ok(quantity) => quantity,
                Err(message) => {
                    diagnostics.push(
                        Diagnostic::warning(DiagnosticKind::InvalidRow, message)
                            .with_identifier(identifier)
                            .at(&table.name, row.row_number)
                            .with_suggestion("Quantities must be positive numbers"),
                    );
                    continue;
                }
            };

            let mut values = row.values;
            values.retain(|header, _| {
                !self.parser.is_identifier_column(header) && !self.parser.is_quantity_column(header)
            });
            assembly.rows.push(AssemblyRow {
                row_number: row.row_number,
                identifier,
                quantity,
                attributes: values,
            });
        }
        assembly
    }
}

fn report_parse_warnings(table: &ParsedTable, diagnostics: &mut Diagnostics) {
    for warning in &table.parse_warnings {
        diagnostics.push(Diagnostic::warning(DiagnosticKind::ParseWarning, warning.clone()).in_table(&table.name));
    }
}

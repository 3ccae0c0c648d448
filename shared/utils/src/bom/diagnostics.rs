//! BOM Diagnostics
//!
//! Non-fatal problems found while loading, resolving or flattening a BOM. They
//! never abort the run; they travel alongside the best-effort result.

use serde::Serialize;
use tracing::{info, warn};

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Row identifier matches neither a catalog part nor an assembly.
    UnresolvedReference,
    /// Identifier is both an assembly name and a catalog part.
    AmbiguousIdentifier,
    /// Row skipped at load time (missing identifier, bad quantity).
    InvalidRow,
    /// Aggregated identifier has no catalog record.
    MissingCatalogRecord,
    /// Catalog value needed for purchase or cost figures is unusable.
    MissingCatalogAttribute,
    /// Reader-level problem reported by a table parser.
    ParseWarning,
    /// Table file left out of a folder load on purpose (`_` or `~` prefix).
    SkippedFile,
}

/// Single diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub identifier: Option<String>,
    pub table: Option<String>,
    pub row: Option<usize>,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            identifier: None,
            table: None,
            row: None,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::warning(kind, message)
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn at(mut self, table: impl Into<String>, row: usize) -> Self {
        self.table = Some(table.into());
        self.row = Some(row);
        self
    }

    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.table, self.row) {
            (Some(table), Some(row)) => write!(f, "{} row {}: {}", table, row, self.message),
            (Some(table), None) => write!(f, "{}: {}", table, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Ordered collection of diagnostics; every entry is logged as it is recorded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!(
                kind = ?diagnostic.kind,
                identifier = diagnostic.identifier.as_deref(),
                "{}", diagnostic
            ),
            Severity::Info => info!(kind = ?diagnostic.kind, "{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        // already logged when first recorded
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn warning_count(&self) -> usize {
        self.entries.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

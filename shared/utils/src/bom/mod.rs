//! BOM (Bill of Materials) Processing Module
//!
//! Loads a parts catalog and assembly tables (CSV, Excel or XML), resolves them
//! into a single rooted tree and rolls quantities up into a flat purchase list.

pub mod aggregator;
pub mod catalog;
pub mod diagnostics;
pub mod loader;
pub mod parser;
pub mod resolver;
pub mod tree;


pub use aggregator::{Aggregator, FlatRow, FlatTable, FlattenOptions, Totals};
pub use catalog::PartStore;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use loader::{BomLoader, BomSource};
pub use parser::{ParsedTable, RawRow, TableFormat, TableParser};
pub use resolver::{resolve, Classification, Resolver};
pub use tree::{BomTree, Edge, EdgeKind, Visit, Walk};

//! bomtree Pipeline Integration Tests
//!
//! Folders of CSV/XML/Excel tables and single workbooks on disk through load,
//! resolve, aggregate and flatten.

use std::fs;
use std::path::Path;

use bomtree_utils::{BomConfig, BomError, BomLoader, DiagnosticKind, FlattenOptions, Severity};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

/// Cart uses 2 Frames and 4 Wheels; each Frame uses 3 Brackets; every Bracket
/// and the Cart itself need Bolts.
fn cart_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Parts list.csv",
        "PN,Description,Pkg QTY,Pkg Price,Cost\n\
         W-1,Wheel,4,10.00,\n\
         B-1,Bolt,25,$5.00,\n\
         T-1,Tube,,,3.50\n",
    );
    write(dir.path(), "Cart.csv", "PN,QTY\nFrame,2\nW-1,4\nB-1,4\n");
    write(dir.path(), "Frame.csv", "PN,QTY,Note\nBracket,3,welded\nT-1,2,\n");
    write(
        dir.path(),
        "Bracket.xml",
        "<bom><row><PN>B-1</PN><QTY>2</QTY></row></bom>",
    );
    dir
}

#[test]
fn test_folder_resolves_and_aggregates() {
    let dir = cart_folder();
    let tree = BomLoader::default().load(dir.path()).unwrap().resolve().unwrap();

    assert_eq!(tree.node(tree.root()).identifier, "Cart");
    assert!(tree.diagnostics().is_empty());

    let totals = tree.aggregate(tree.root());
    assert_eq!(totals.get("W-1"), Some(&4.0));
    assert_eq!(totals.get("T-1"), Some(&4.0));
    // 4 direct + 2 frames * 3 brackets * 2 bolts
    assert_eq!(totals.get("B-1"), Some(&16.0));
}

#[test]
fn test_flatten_from_folder() {
    let dir = cart_folder();
    let tree = BomLoader::default().load(dir.path()).unwrap().resolve().unwrap();

    let table = tree.flatten(tree.root(), &FlattenOptions::default());
    assert_eq!(table.columns, vec!["description", "pkg qty", "pkg price", "cost"]);

    let ids: Vec<&str> = table.rows.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["W-1", "B-1", "T-1"]);

    assert_eq!(table.rows[0].purchase_quantity, 1.0);
    assert_eq!(table.rows[0].subtotal, Some(10.0));
    assert_eq!(table.rows[1].purchase_quantity, 1.0);
    assert_eq!(table.rows[1].subtotal, Some(5.0));
    assert_eq!(table.rows[2].purchase_quantity, 4.0);
    assert_eq!(table.rows[2].subtotal, Some(14.0));
    assert_eq!(table.total_cost(), 29.0);
}

#[test]
fn test_subtree_by_identifier() {
    let dir = cart_folder();
    let tree = BomLoader::default().load(dir.path()).unwrap().resolve().unwrap();

    let frame = tree.require("Frame").unwrap();
    let totals = tree.aggregate(frame);
    assert_eq!(totals.get("B-1"), Some(&6.0));
    assert!(!totals.contains_key("W-1"));

    assert!(matches!(tree.require("Trolley"), Err(BomError::UnknownNode { .. })));
}

#[test]
fn test_ignored_and_unsupported_files() {
    let dir = cart_folder();
    write(dir.path(), "_scratch.csv", "PN,QTY\nGhost,1\n");
    write(dir.path(), "~lock.csv", "PN,QTY\nGhost,1\n");
    write(dir.path(), "README.txt", "not a table");

    let source = BomLoader::default().load(dir.path()).unwrap();
    let mut names: Vec<&str> = source.assemblies.iter().map(|a| a.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Bracket", "Cart", "Frame"]);

    // prefixed tables are reported, but only as info
    let skipped: Vec<_> = source.diagnostics.of_kind(DiagnosticKind::SkippedFile).collect();
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0].identifier.as_deref(), Some("_scratch.csv"));
    assert_eq!(skipped[1].severity, Severity::Info);
    assert_eq!(source.diagnostics.warning_count(), 0);

    let tree = source.resolve().unwrap();
    assert_eq!(tree.diagnostics().of_kind(DiagnosticKind::SkippedFile).count(), 2);
}

#[test]
fn test_missing_parts_list_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Cart.csv", "PN,QTY\nW-1,4\n");

    let err = BomLoader::default().load(dir.path()).unwrap_err();
    assert!(matches!(err, BomError::Load { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_custom_parts_file_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "catalog.csv", "PN\nW-1\n");
    write(dir.path(), "Cart.csv", "PN,QTY\nW-1,4\n");

    let config = BomConfig {
        parts_file_name: "Catalog".to_string(),
        ..BomConfig::default()
    };
    let tree = BomLoader::new(config).load(dir.path()).unwrap().resolve().unwrap();
    assert_eq!(tree.aggregate(tree.root()).get("W-1"), Some(&4.0));
}

#[test]
fn test_cycle_across_files_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Parts list.csv", "PN\nW-1\n");
    write(dir.path(), "Cart.csv", "PN,QTY\nFrame,1\n");
    write(dir.path(), "Frame.csv", "PN,QTY\nCart,1\nW-1,2\n");

    let err = BomLoader::default().load(dir.path()).unwrap().resolve().unwrap_err();
    assert!(matches!(err, BomError::CycleDetected { .. }));
}

#[test]
fn test_problems_surface_as_diagnostics() {
    let dir = cart_folder();
    write(dir.path(), "Cart.csv", "PN,QTY\nFrame,2\nW-1,4\nB-1,four\nX-9,1\n");

    let tree = BomLoader::default().load(dir.path()).unwrap().resolve().unwrap();
    let diagnostics = tree.diagnostics();
    assert_eq!(diagnostics.of_kind(DiagnosticKind::InvalidRow).count(), 1);

    let unresolved: Vec<_> = diagnostics.of_kind(DiagnosticKind::UnresolvedReference).collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].identifier.as_deref(), Some("X-9"));
    assert_eq!(unresolved[0].row, Some(5));

    // the result is still usable
    assert_eq!(tree.aggregate(tree.root()).get("B-1"), Some(&12.0));
}

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn test_excel_tables_in_folder() {
    for file_name in ["Frame.xlsx", "Frame.xls"] {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Parts list.csv", "PN,Description\nW-1,Wheel\nB-1,Bolt\nT-1,Tube\n");
        write(dir.path(), "Cart.csv", "PN,QTY\nFrame,2\nW-1,4\n");
        // the reader follows the file content, whatever the extension says
        fs::copy(fixture("frame.xlsx"), dir.path().join(file_name)).unwrap();

        let tree = BomLoader::default().load(dir.path()).unwrap().resolve().unwrap();
        let totals = tree.aggregate(tree.root());
        assert_eq!(totals.get("B-1"), Some(&12.0), "{}", file_name);
        assert_eq!(totals.get("T-1"), Some(&4.0), "{}", file_name);
    }
}

#[test]
fn test_single_workbook_resolves_and_aggregates() {
    let source = BomLoader::default().load(&fixture("cart.xlsx")).unwrap();
    assert_eq!(source.catalog.len(), 3);
    assert_eq!(source.catalog_columns, vec!["description", "pkg qty"]);
    let names: Vec<&str> = source.assemblies.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Cart", "Frame"]);

    let tree = source.resolve().unwrap();
    assert_eq!(tree.node(tree.root()).identifier, "Cart");
    assert!(tree.diagnostics().is_empty());

    let totals = tree.aggregate(tree.root());
    assert_eq!(totals.get("W-1"), Some(&4.0));
    assert_eq!(totals.get("B-1"), Some(&12.0));
    assert_eq!(totals.get("T-1"), Some(&4.0));

    let table = tree.flatten(tree.root(), &FlattenOptions::default());
    let purchase: Vec<(&str, f64)> = table
        .rows
        .iter()
        .map(|r| (r.identifier.as_str(), r.purchase_quantity))
        .collect();
    assert_eq!(purchase, vec![("W-1", 1.0), ("B-1", 1.0), ("T-1", 4.0)]);
}

#[test]
fn test_single_sheet_workbook_is_a_load_error() {
    let err = BomLoader::default().load(&fixture("parts_only.xlsx")).unwrap_err();
    assert!(matches!(err, BomError::Load { .. }));
    assert_eq!(err.exit_code(), 2);
}

//! Text renderings of a resolved BOM: ASCII tree, Graphviz DOT and CSV tables.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Result;
use bomtree_models::{NodeId, NodeKind};
use bomtree_utils::{BomTree, Diagnostics, EdgeKind, FlatTable, Totals};

/// Indented tree with box-drawing connectors, one node per line.
pub fn write_tree<W: Write>(tree: &BomTree, start: NodeId, out: &mut W) -> Result<()> {
    // is_last flag of every ancestor above the current line
    let mut lasts: Vec<bool> = Vec::new();

    for visit in tree.walk(start) {
        let mut line = String::new();
        if visit.depth > 0 {
            lasts.truncate(visit.depth - 1);
            for &last in &lasts {
                line.push_str(if last { "    " } else { "│   " });
            }
            line.push_str(if visit.is_last { "└── " } else { "├── " });
            lasts.push(visit.is_last);
        }

        if let Some(quantity) = visit.quantity {
            line.push_str(&format!("{} x ", quantity));
        }
        line.push_str(&visit.node.to_string());
        if let Some(description) = tree.record(visit.id).and_then(|r| r.attribute("description")) {
            line.push_str(&format!(" ({})", description));
        }
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Directed graph of the subtree; reference edges are dashed. Reference targets
/// owned outside the subtree are declared too.
pub fn write_dot<W: Write>(tree: &BomTree, start: NodeId, out: &mut W) -> Result<()> {
    writeln!(out, "digraph bom {{")?;
    writeln!(out, "    node [shape=box];")?;

    let edges = tree.edges_from(start);
    let mut declared = BTreeSet::new();
    let subtree = tree.walk(start).map(|visit| visit.id);
    let targets = edges.iter().map(|edge| edge.child);
    for id in subtree.chain(targets) {
        let node = tree.node(id);
        let shape = match node.kind {
            NodeKind::Assembly { .. } => "box",
            NodeKind::Part => "ellipse",
            NodeKind::Reference { .. } => continue,
        };
        if declared.insert(id) {
            writeln!(
                out,
                "    n{} [label=\"{}\", shape={}];",
                id.index(),
                escape(&node.identifier),
                shape
            )?;
        }
    }

    for edge in &edges {
        let style = match edge.kind {
            EdgeKind::Owned => "",
            EdgeKind::Reference => ", style=dashed",
        };
        writeln!(
            out,
            "    n{} -> n{} [label=\"{}\"{}];",
            edge.parent.index(),
            edge.child.index(),
            edge.quantity,
            style
        )?;
    }

    writeln!(out, "}}")?;
    Ok(())
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn write_totals_csv<W: Write>(totals: &Totals, out: &mut W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["PN", "Total QTY"])?;
    for (identifier, quantity) in totals {
        writer.write_record([identifier.clone(), quantity.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Catalog columns followed by total, purchase and subtotal figures.
pub fn write_summary_csv<W: Write>(table: &FlatTable, out: &mut W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["PN".to_string()];
    header.extend(table.columns.iter().cloned());
    header.extend(["Total QTY", "Purchase QTY", "Subtotal"].map(String::from));
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.identifier.clone()];
        record.extend(
            table
                .columns
                .iter()
                .map(|column| row.attributes.get(column).cloned().unwrap_or_default()),
        );
        record.push(row.total_quantity.to_string());
        record.push(row.purchase_quantity.to_string());
        record.push(row.subtotal.map(|s| format!("{:.2}", s)).unwrap_or_default());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_diagnostics<W: Write>(diagnostics: &Diagnostics, out: &mut W) -> Result<()> {
    for diagnostic in diagnostics.iter() {
        write!(out, "{:?}: {}", diagnostic.severity, diagnostic)?;
        if let Some(suggestion) = &diagnostic.suggestion {
            write!(out, " ({})", suggestion)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{} diagnostic(s), {} warning(s)", diagnostics.len(), diagnostics.warning_count())?;
    Ok(())
}

//! BOM Resolver
//!
//! Links the rows of every assembly table to catalog parts or to other
//! assemblies and assembles them into a single rooted [`BomTree`].
//!
//! Ownership goes to the first assembly (in table order, then row order) that
//! uses a node; every later use becomes a reference node pointing at it. When a
//! name is both an assembly and a catalog part, the assembly wins and a warning
//! is recorded.

use std::collections::HashMap;

use tracing::{debug, info};

use bomtree_models::{AssemblyTable, ChildEdge, Node, NodeId, NodeKind, PartRecord};

use super::catalog::PartStore;
use super::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use super::tree::BomTree;
use crate::error::{BomError, BomResult};

/// What a row identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Assembly(NodeId),
    Part,
    Unresolved,
}

/// Resolve a catalog and named assembly tables into a tree.
pub fn resolve(catalog: Vec<PartRecord>, assemblies: Vec<AssemblyTable>) -> BomResult<BomTree> {
    Resolver::new().resolve(PartStore::load(catalog)?, assemblies)
}

#[derive(Debug, Default)]
pub struct Resolver {
    diagnostics: Diagnostics,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from diagnostics gathered earlier (e.g. while loading files) so
    /// that the tree reports everything in one list.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn resolve(self, parts: PartStore, assemblies: Vec<AssemblyTable>) -> BomResult<BomTree> {
        let mut linker = Linker {
            nodes: Vec::with_capacity(assemblies.len()),
            assemblies: HashMap::with_capacity(assemblies.len()),
            part_nodes: HashMap::new(),
            parts: &parts,
            diagnostics: self.diagnostics,
        };

        linker.create_assemblies(assemblies)?;
        linker.link_rows();
        detect_cycles(&linker.nodes)?;
        let root = find_root(&linker.nodes)?;

        let Linker { nodes, diagnostics, .. } = linker;
        info!(
            root = %nodes[root.index()].identifier,
            nodes = nodes.len(),
            warnings = diagnostics.warning_count(),
            "BOM resolved"
        );
        Ok(BomTree::new(nodes, root, parts, diagnostics))
    }
}

struct Linker<'a> {
    nodes: Vec<Node>,
    /// Assembly name to its node, in table order.
    assemblies: HashMap<String, NodeId>,
    /// Catalog part to its owned node, created on first use.
    part_nodes: HashMap<String, NodeId>,
    parts: &'a PartStore,
    diagnostics: Diagnostics,
}

impl Linker<'_> {
    fn create_assemblies(&mut self, tables: Vec<AssemblyTable>) -> BomResult<()> {
        for table in tables {
            if self.assemblies.contains_key(&table.name) {
                return Err(BomError::duplicate(&table.name, "assembly tables"));
            }
            if self.parts.contains(&table.name) {
                self.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::AmbiguousIdentifier,
                        format!("'{}' is both an assembly and a catalog part; using the assembly", table.name),
                    )
                    .with_identifier(&table.name)
                    .with_suggestion("Rename the assembly or remove the part from the catalog"),
                );
            }
            let id = self.push(Node::assembly(table));
            self.assemblies.insert(self.nodes[id.index()].identifier.clone(), id);
        }
        Ok(())
    }

    fn link_rows(&mut self) {
        let owners: Vec<NodeId> = (0..self.nodes.len()).map(NodeId).collect();
        for owner in owners {
            let rows: Vec<(usize, String, usize)> = match self.nodes[owner.index()].table() {
                Some(table) => table
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(index, row)| (index, row.identifier.clone(), row.row_number))
                    .collect(),
                None => continue,
            };

            for (row, identifier, row_number) in rows {
                match self.classify(&identifier) {
                    Classification::Assembly(target) => self.link(owner, target, row),
                    Classification::Part => {
                        let target = match self.part_nodes.get(&identifier) {
                            Some(&existing) => existing,
                            None => {
                                let created = self.push(Node::part(identifier.clone(), owner));
                                self.part_nodes.insert(identifier.clone(), created);
                                self.attach(owner, created, row);
                                continue;
                            }
                        };
                        self.link(owner, target, row);
                    }
                    Classification::Unresolved => {
                        let table = self.nodes[owner.index()].identifier.clone();
                        self.diagnostics.push(
                            Diagnostic::warning(
                                DiagnosticKind::UnresolvedReference,
                                format!("Unable to find part \"{}\"", identifier),
                            )
                            .with_identifier(identifier)
                            .at(table, row_number)
                            .with_suggestion("Add the item to the parts list or create an assembly table for it"),
                        );
                    }
                }
            }
        }
    }

    /// Assembly names take precedence over catalog parts.
    fn classify(&self, identifier: &str) -> Classification {
        let classification = if let Some(&id) = self.assemblies.get(identifier) {
            Classification::Assembly(id)
        } else if self.parts.contains(identifier) {
            Classification::Part
        } else {
            Classification::Unresolved
        };
        debug!(identifier, ?classification, "Classified row");
        classification
    }

    /// Claim `target` for `owner`, or add a reference if it is already owned.
    fn link(&mut self, owner: NodeId, target: NodeId, row: usize) {
        if self.nodes[target.index()].parent.is_none() {
            self.nodes[target.index()].parent = Some(owner);
            self.attach(owner, target, row);
        } else {
            let identifier = self.nodes[target.index()].identifier.clone();
            let reference = self.push(Node::reference(identifier, owner, target));
            self.attach(owner, reference, row);
        }
    }

    fn attach(&mut self, owner: NodeId, child: NodeId, row: usize) {
        if let NodeKind::Assembly { children, .. } = &mut self.nodes[owner.index()].kind {
            children.push(ChildEdge { node: child, row });
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Reject any assembly that uses itself, through owned children or references.
fn detect_cycles(nodes: &[Node]) -> BomResult<()> {
    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut path = Vec::new();

    for (index, node) in nodes.iter().enumerate() {
        if node.is_assembly() && marks[index] == Mark::Unvisited {
            visit(nodes, NodeId(index), &mut marks, &mut path)?;
        }
    }
    Ok(())
}

fn visit(nodes: &[Node], id: NodeId, marks: &mut [Mark], path: &mut Vec<NodeId>) -> BomResult<()> {
    marks[id.index()] = Mark::InProgress;
    path.push(id);

    for edge in nodes[id.index()].children() {
        let next = nodes[edge.node.index()].target().unwrap_or(edge.node);
        if !nodes[next.index()].is_assembly() {
            continue;
        }
        match marks[next.index()] {
            Mark::InProgress => {
                let start = path.iter().position(|&p| p == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|p| nodes[p.index()].identifier.clone())
                    .collect();
                cycle.push(nodes[next.index()].identifier.clone());
                return Err(BomError::CycleDetected { path: cycle });
            }
            Mark::Unvisited => visit(nodes, next, marks, path)?,
            Mark::Done => {}
        }
    }

    path.pop();
    marks[id.index()] = Mark::Done;
    Ok(())
}

fn find_root(nodes: &[Node]) -> BomResult<NodeId> {
    let roots: Vec<NodeId> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.is_assembly() && node.is_root())
        .map(|(index, _)| NodeId(index))
        .collect();

    match roots.as_slice() {
        [] => Err(BomError::NoRoot),
        [root] => Ok(*root),
        _ => Err(BomError::AmbiguousRoot {
            candidates: roots.iter().map(|id| nodes[id.index()].identifier.clone()).collect(),
        }),
    }
}

//! Resolved BOM Tree
//!
//! Arena of [`Node`]s produced by the resolver, with the parts catalog and the
//! diagnostics gathered on the way. Also provides the traversal used by the
//! tree and graph renderers.

use serde::Serialize;

use bomtree_models::{ChildEdge, Node, NodeId, NodeKind, PartRecord};

use super::catalog::PartStore;
use super::diagnostics::Diagnostics;
use crate::error::{BomError, BomResult};

#[derive(Debug, Clone)]
pub struct BomTree {
    nodes: Vec<Node>,
    root: NodeId,
    parts: PartStore,
    diagnostics: Diagnostics,
}

/// One step of a depth-first, parent-before-children walk.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub depth: usize,
    pub id: NodeId,
    pub node: &'a Node,
    /// Local quantity of the edge leading into this node; `None` for the start node.
    pub quantity: Option<f64>,
    /// Last child of its parent (the start node counts as last).
    pub is_last: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Owned,
    Reference,
}

/// Parent/child pair for graph export. Reference edges point at the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
    pub quantity: f64,
    pub kind: EdgeKind,
}

impl BomTree {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId, parts: PartStore, diagnostics: Diagnostics) -> Self {
        Self {
            nodes,
            root,
            parts,
            diagnostics,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node by id. Ids are only handed out by this tree, so they are always in range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Owned assembly or part node with this identifier (references are skipped).
    pub fn find(&self, identifier: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.identifier == identifier && node.target().is_none())
            .map(NodeId)
    }

    /// Like [`find`](Self::find) but an unknown identifier is an error.
    pub fn require(&self, identifier: &str) -> BomResult<NodeId> {
        self.find(identifier).ok_or_else(|| BomError::unknown_node(identifier))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parts(&self) -> &PartStore {
        &self.parts
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Catalog record behind a part node, or behind a reference to one.
    pub fn record(&self, id: NodeId) -> Option<&PartRecord> {
        let node = self.node(self.resolve_reference(id));
        match node.kind {
            NodeKind::Part => self.parts.lookup(&node.identifier),
            _ => None,
        }
    }

    /// Follow a reference to its target; other nodes map to themselves.
    pub fn resolve_reference(&self, id: NodeId) -> NodeId {
        self.node(id).target().unwrap_or(id)
    }

    /// Local quantity recorded for `child_id` in the table of `assembly`.
    pub fn quantity_of(&self, assembly: NodeId, child_id: &str) -> Option<f64> {
        self.node(assembly).table()?.quantity_of(child_id)
    }

    /// Quantity carried by one child edge of `parent`.
    pub fn edge_quantity(&self, parent: &Node, edge: &ChildEdge) -> Option<f64> {
        parent.table()?.rows.get(edge.row).map(|row| row.quantity)
    }

    /// Owning chain from `id` up to the root, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |&current| self.node(current).parent)
    }

    /// Depth-first walk over owned edges starting at `start`.
    pub fn walk(&self, start: NodeId) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![(start, 0, None, true)],
        }
    }

    /// Every parent/child edge under the root, in walk order.
    pub fn edges(&self) -> Vec<Edge> {
        self.edges_from(self.root)
    }

    /// Every parent/child edge under `start`, in walk order.
    pub fn edges_from(&self, start: NodeId) -> Vec<Edge> {
        let mut edges = Vec::new();
        for visit in self.walk(start) {
            for edge in visit.node.children() {
                let child = self.node(edge.node);
                let (target, kind) = match child.target() {
                    Some(target) => (target, EdgeKind::Reference),
                    None => (edge.node, EdgeKind::Owned),
                };
                edges.push(Edge {
                    parent: visit.id,
                    child: target,
                    quantity: self.edge_quantity(visit.node, edge).unwrap_or_default(),
                    kind,
                });
            }
        }
        edges
    }
}

pub struct Walk<'a> {
    tree: &'a BomTree,
    stack: Vec<(NodeId, usize, Option<f64>, bool)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth, quantity, is_last) = self.stack.pop()?;
        let node = self.tree.node(id);

        let children = node.children();
        for (position, edge) in children.iter().enumerate().rev() {
            let quantity = self.tree.edge_quantity(node, edge);
            self.stack.push((edge.node, depth + 1, quantity, position + 1 == children.len()));
        }

        Some(Visit {
            depth,
            id,
            node,
            quantity,
            is_last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::resolver::resolve;
    use bomtree_models::{AssemblyTable, ItemType};

    fn cart() -> BomTree {
        let catalog = vec![PartRecord::new("Wheel"), PartRecord::new("Axle"), PartRecord::new("Bolt")];
        let assemblies = vec![
            AssemblyTable::new("Cart")
                .with_row("Frame", 1.0)
                .with_row("Wheel", 4.0)
                .with_row("Axle", 2.0),
            AssemblyTable::new("Frame").with_row("Bolt", 8.0).with_row("Axle", 1.0),
        ];
        resolve(catalog, assemblies).unwrap()
    }

    #[test]
    fn test_walk_is_parent_before_children() {
        let tree = cart();
        let visits: Vec<(usize, String, Option<f64>)> = tree
            .walk(tree.root())
            .map(|v| (v.depth, v.node.identifier.clone(), v.quantity))
            .collect();

        assert_eq!(
            visits,
            vec![
                (0, "Cart".to_string(), None),
                (1, "Frame".to_string(), Some(1.0)),
                (2, "Bolt".to_string(), Some(8.0)),
                (2, "Axle".to_string(), Some(1.0)),
                (1, "Wheel".to_string(), Some(4.0)),
                (1, "Axle".to_string(), Some(2.0)),
            ]
        );
    }

    #[test]
    fn test_walk_marks_last_children() {
        let tree = cart();
        let last: Vec<bool> = tree.walk(tree.root()).map(|v| v.is_last).collect();
        assert_eq!(last, vec![true, false, false, true, false, true]);
    }

    #[test]
    fn test_reference_edges_point_at_target() {
        let tree = cart();
        let axle = tree.find("Axle").unwrap();
        let frame = tree.find("Frame").unwrap();

        let edges = tree.edges();
        let reference_edges: Vec<&Edge> = edges.iter().filter(|e| e.kind == EdgeKind::Reference).collect();
        assert_eq!(reference_edges.len(), 1);
        assert_eq!(reference_edges[0].parent, frame);
        assert_eq!(reference_edges[0].child, axle);
        assert_eq!(reference_edges[0].quantity, 1.0);
        assert_eq!(edges.len(), 5);
    }

    #[test]
    fn test_find_skips_references() {
        let tree = cart();
        let axle = tree.find("Axle").unwrap();
        assert_eq!(tree.node(axle).item_type(), ItemType::Part);
        // first use in table order owns the part
        assert_eq!(tree.node(axle).parent, Some(tree.root()));
        assert!(tree.require("Handle").is_err());
    }

    #[test]
    fn test_ancestors_and_records() {
        let tree = cart();
        let bolt = tree.find("Bolt").unwrap();
        let chain: Vec<&str> = tree.ancestors(bolt).map(|id| tree.node(id).identifier.as_str()).collect();
        assert_eq!(chain, vec!["Frame", "Cart"]);
        assert_eq!(tree.record(bolt).map(|r| r.identifier.as_str()), Some("Bolt"));
        assert!(tree.record(tree.root()).is_none());
    }

    #[test]
    fn test_quantity_of() {
        let tree = cart();
        let frame = tree.find("Frame").unwrap();
        assert_eq!(tree.quantity_of(tree.root(), "Wheel"), Some(4.0));
        assert_eq!(tree.quantity_of(frame, "Bolt"), Some(8.0));
        assert_eq!(tree.quantity_of(frame, "Wheel"), None);
        assert_eq!(tree.quantity_of(tree.find("Wheel").unwrap(), "Wheel"), None);
    }
}

//! Resolved BOM tree nodes.
//!
//! Nodes live in an arena owned by the tree and point at each other through
//! [`NodeId`]s. Ownership is expressed by `parent`; additional uses of an
//! already-owned node are separate [`NodeKind::Reference`] nodes that only name
//! their target.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assembly::AssemblyTable;

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owned child of an assembly together with the table row that introduced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEdge {
    pub node: NodeId,
    /// Index into the parent assembly's `table.rows`.
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Assembly {
        children: Vec<ChildEdge>,
        table: AssemblyTable,
    },
    Part,
    Reference {
        target: NodeId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Assembly,
    Part,
    Reference,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assembly => "assembly",
            Self::Part => "part",
            Self::Reference => "reference",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub identifier: String,
    /// Owning assembly. `None` only for the root (and for assemblies that have
    /// not been claimed yet while resolution is in progress).
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn assembly(table: AssemblyTable) -> Self {
        Self {
            identifier: table.name.clone(),
            parent: None,
            kind: NodeKind::Assembly {
                children: Vec::new(),
                table,
            },
        }
    }

    pub fn part(identifier: impl Into<String>, parent: NodeId) -> Self {
        Self {
            identifier: identifier.into(),
            parent: Some(parent),
            kind: NodeKind::Part,
        }
    }

    pub fn reference(identifier: impl Into<String>, parent: NodeId, target: NodeId) -> Self {
        Self {
            identifier: identifier.into(),
            parent: Some(parent),
            kind: NodeKind::Reference { target },
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self.kind {
            NodeKind::Assembly { .. } => ItemType::Assembly,
            NodeKind::Part => ItemType::Part,
            NodeKind::Reference { .. } => ItemType::Reference,
        }
    }

    pub fn is_assembly(&self) -> bool {
        matches!(self.kind, NodeKind::Assembly { .. })
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Owned child edges; empty for parts and references.
    pub fn children(&self) -> &[ChildEdge] {
        match &self.kind {
            NodeKind::Assembly { children, .. } => children,
            _ => &[],
        }
    }

    /// Source row table of an assembly.
    pub fn table(&self) -> Option<&AssemblyTable> {
        match &self.kind {
            NodeKind::Assembly { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Reference { target } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item_type() {
            ItemType::Assembly => write!(f, "Assembly {}", self.identifier),
            ItemType::Part => write!(f, "Part {}", self.identifier),
            ItemType::Reference => write!(f, "Reference {}", self.identifier),
        }
    }
}

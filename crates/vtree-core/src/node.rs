//! Tree node and taxonomy types.

use serde::{Deserialize, Serialize};

/// The fixed four-level node taxonomy.
///
/// Serialized tags are part of the storage format: exactly
/// `EQUIPMENT_TYPE`, `EQUIPMENT`, `ASSEMBLY`, and `COMPONENT`, no others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    EquipmentType,
    Equipment,
    Assembly,
    Component,
}

impl NodeKind {
    /// The wire tag for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EquipmentType => "EQUIPMENT_TYPE",
            Self::Equipment => "EQUIPMENT",
            Self::Assembly => "ASSEMBLY",
            Self::Component => "COMPONENT",
        }
    }

    /// The taxonomy level one step below this one.
    ///
    /// Components are the bottom level; their children (if a caller ever
    /// creates any) stay components.
    #[must_use]
    pub const fn child_kind(&self) -> Self {
        match self {
            Self::EquipmentType => Self::Equipment,
            Self::Equipment => Self::Assembly,
            Self::Assembly | Self::Component => Self::Component,
        }
    }
}

/// An ordered list of root nodes. Insertion order is display order.
pub type Forest = Vec<TreeNode>;

/// A node in the vessel equipment hierarchy.
///
/// The `id` is opaque, caller-generated, and immutable once the node is
/// constructed. `name` and `children` are mutable; children are owned
/// outright and kept in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a leaf node.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Add a child node (builder style).
    #[must_use]
    pub fn child(mut self, node: TreeNode) -> Self {
        self.children.push(node);
        self
    }

    /// Set children from a vec (builder style).
    #[must_use]
    pub fn with_children(mut self, nodes: Vec<TreeNode>) -> Self {
        self.children = nodes;
        self
    }

    /// The node's immutable identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display name. May be empty while the node is being edited.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the display name in place.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The taxonomy level of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The ordered child list.
    #[must_use]
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Mutable access to the ordered child list.
    pub fn children_mut(&mut self) -> &mut Vec<TreeNode> {
        &mut self.children
    }

    /// Append a child as the new last entry.
    pub fn push_child(&mut self, node: TreeNode) {
        self.children.push(node);
    }

    /// Whether this node has any children.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Total node count of this subtree, including this node.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

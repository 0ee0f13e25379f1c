//! Default seed forest.
//!
//! The reference vessel hierarchy shipped with the editor. Ids are stable:
//! persisted snapshots taken against this data must keep resolving after a
//! reload, so changing an id here is a breaking change to stored state.

use crate::node::{Forest, NodeKind, TreeNode};

/// Build the default vessel equipment forest.
#[must_use]
pub fn seed_forest() -> Forest {
    vec![
        TreeNode::new("root-1", "Equipments", NodeKind::EquipmentType)
            .child(
                TreeNode::new("cat-1", "Engine", NodeKind::EquipmentType)
                    .child(
                        TreeNode::new("eq-1", "Main Engine & Propulsion", NodeKind::Equipment)
                            .child(
                                TreeNode::new("sub-eq-1", "Main Engine", NodeKind::Equipment)
                                    .child(
                                        TreeNode::new(
                                            "asm-1",
                                            "Air & Exhaust System",
                                            NodeKind::Assembly,
                                        )
                                        .child(TreeNode::new(
                                            "comp-1",
                                            "ME Turbocharger",
                                            NodeKind::Component,
                                        ))
                                        .child(TreeNode::new(
                                            "comp-2",
                                            "Exhaust Valve",
                                            NodeKind::Component,
                                        )),
                                    )
                                    .child(TreeNode::new(
                                        "asm-2",
                                        "Fuel System",
                                        NodeKind::Assembly,
                                    )),
                            )
                            .child(TreeNode::new("sub-eq-2", "Propeller", NodeKind::Equipment)),
                    )
                    .child(TreeNode::new("eq-2", "Power Generation", NodeKind::Equipment))
                    .child(TreeNode::new("eq-3", "Aux Boiler", NodeKind::Equipment)),
            )
            .child(TreeNode::new("cat-2", "Deck", NodeKind::EquipmentType)),
    ]
}

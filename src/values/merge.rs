//! Override layering.
//!
//! Override keys take precedence at every depth: nested mappings merge
//! recursively, scalars and sequences replace wholesale. Base key order is
//! preserved; keys only present in the overlay are appended in overlay
//! order. A key present in both layers keeps the overlay's key mark, so
//! navigation lands in the override file.

use crate::values::tree::{MappingEntry, MappingNode, ValueNode};
use indexmap::IndexMap;

pub fn merge_trees(base: ValueNode, overlay: ValueNode) -> ValueNode {
    match (base, overlay) {
        (ValueNode::Mapping(base_map), ValueNode::Mapping(overlay_map)) => {
            let mut remaining = overlay_map.entries;
            let mut merged = IndexMap::with_capacity(base_map.entries.len());

            for (key, base_entry) in base_map.entries {
                match remaining.shift_remove(&key) {
                    Some(overlay_entry) => {
                        merged.insert(
                            key,
                            MappingEntry {
                                key_mark: overlay_entry.key_mark,
                                node: merge_trees(base_entry.node, overlay_entry.node),
                            },
                        );
                    }
                    None => {
                        merged.insert(key, base_entry);
                    }
                }
            }
            for (key, overlay_entry) in remaining {
                merged.insert(key, overlay_entry);
            }

            ValueNode::Mapping(MappingNode {
                entries: merged,
                mark: base_map.mark,
            })
        }
        (_, overlay) => overlay,
    }
}

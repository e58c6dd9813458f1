pub mod cache;
pub mod merge;
pub mod resolution;
pub mod tree;

pub use cache::{OverrideSelection, ValuesCache};
pub use resolution::{
    find_archive_value_position, find_value_position, find_value_position_in_chain,
    ValuePosition,
};
pub use tree::{Mark, MappingEntry, MappingNode, ScalarNode, SequenceNode, ValueNode, ValuesFile};

// mod.rs - Data structures module

pub mod loaders;
pub mod tree;

// Re-export main types for convenience
pub use loaders::{parse_weights, read_weights_file};
pub use tree::{Node, NodeId, PhyloTree};

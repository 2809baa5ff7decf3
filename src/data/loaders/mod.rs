// mod.rs - Input loaders

pub mod newick;
pub mod weights;

pub use weights::{parse_weights, read_weights_file};

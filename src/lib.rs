// lib.rs - strainchoosr library root

//! # strainchoosr - Phylogenetically diverse strain selection
//!
//! This library picks representative subsets of leaves (strains) from a
//! rooted phylogenetic tree with branch lengths.
//!
//! ## Features
//!
//! - **Greedy diversity selection**: grow a leaf subset that maximizes
//!   phylogenetic diversity (total branch length of the spanning subtree)
//! - **Cluster representatives**: partition leaves by a distance-threshold
//!   cut of a linkage dendrogram and pick one leaf per cluster
//! - **Nearest neighbors**: rank leaves by patristic distance to a reference
//! - **Branch weighting**: scale leaf branch lengths from a weights file
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use strainchoosr::prelude::*;
//!
//! let tree = PhyloTree::from_newick_file(std::path::Path::new("tree.nwk"))?;
//!
//! // Five maximally diverse strains
//! let strains = select_diverse_leaves(&tree, 5, &[])?;
//!
//! // Five clusters with their central strains
//! let partition = build_partition(&tree, 5, LinkageMethod::Average, DEFAULT_STEP_SIZE)?;
//! let representatives =
//!     choose_representatives(&tree, &partition, RepresentativeMethod::Closest, &[])?;
//! # Ok::<(), strainchoosr::error::ChoosrError>(())
//! ```

pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{build_partition, choose_representatives, nearest_leaves};
    pub use crate::core::{select_diverse_leaves, select_diverse_leaves_with_progress};
    pub use crate::core::{DiverseSelection, Neighbor, Partition, RepresentativeChoice};
    pub use crate::core::{LinkageMethod, RepresentativeMethod, DEFAULT_STEP_SIZE};
    pub use crate::data::{read_weights_file, PhyloTree};
    pub use crate::error::ChoosrError;
    pub use crate::output::{write_neighbors, write_partitions, write_selections, OutputFormat};
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use core::{LinkageMethod, Partition, RepresentativeMethod};
pub use data::PhyloTree;
pub use error::ChoosrError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "strainchoosr v{} - Phylogenetically diverse strain selection",
        VERSION
    )
}

// mod.rs - Core selection algorithms

pub mod clustering;
pub mod diversity;
pub mod linkage;
pub mod neighbors;

// Re-export main types for convenience
pub use clustering::{
    build_partition, choose_representative, choose_representatives, cut_dendrogram,
    partition_matrix, DistanceMatrix, Partition, RepresentativeChoice, RepresentativeMethod,
    DEFAULT_STEP_SIZE, INITIAL_CUTOFF,
};
pub use diversity::{
    next_leaf, select_diverse_leaves, select_diverse_leaves_with_progress, starting_leaves,
    DiverseSelection,
};
pub use linkage::{linkage, Dendrogram, LinkageMethod, Merge};
pub use neighbors::{nearest_leaves, Neighbor};

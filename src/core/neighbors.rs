// neighbors.rs - Nearest-leaf queries

use crate::data::PhyloTree;
use crate::error::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub name: String,
    pub distance: f64,
}

/// The `count` leaves closest to `reference`, nearest first.
///
/// Equal distances are ordered by name. Asking for more neighbors than the
/// tree has returns every other leaf.
pub fn nearest_leaves(tree: &PhyloTree, reference: &str, count: usize) -> Result<Vec<Neighbor>> {
    let reference_id = tree.find_leaf(reference)?;

    let mut neighbors = tree
        .leaf_ids()
        .par_iter()
        .filter(|&&id| id != reference_id)
        .map(|&id| {
            tree.node_distance(reference_id, id).map(|distance| Neighbor {
                name: tree.leaf_name(id).to_string(),
                distance,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    neighbors.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.name.cmp(&b.name))
    });
    neighbors.truncate(count);
    Ok(neighbors)
}

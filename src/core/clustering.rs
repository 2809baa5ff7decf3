// clustering.rs - Distance-threshold partitioning and cluster representatives

use crate::core::linkage::{linkage, Dendrogram, LinkageMethod};
use crate::data::PhyloTree;
use crate::error::{ChoosrError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Cutoff distance the partition search starts from
pub const INITIAL_CUTOFF: f64 = 0.9;

/// Default decrement applied to the cutoff between attempts
pub const DEFAULT_STEP_SIZE: f64 = 0.00003;

/// How a cluster representative is picked from intra-cluster distance sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepresentativeMethod {
    /// Member with the smallest total distance to the others
    Closest,
    /// Member with the largest total distance to the others
    Farthest,
}

impl RepresentativeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepresentativeMethod::Closest => "closest",
            RepresentativeMethod::Farthest => "farthest",
        }
    }
}

impl FromStr for RepresentativeMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "closest" => Ok(RepresentativeMethod::Closest),
            "farthest" => Ok(RepresentativeMethod::Farthest),
            _ => Err(format!(
                "Invalid representative method: {}. Use: closest, farthest",
                s
            )),
        }
    }
}

/// Symmetric leaf-by-leaf distance matrix in leaf enumeration order
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Compute all pairwise leaf distances; rows are filled in parallel.
    pub fn from_tree(tree: &PhyloTree) -> Result<Self> {
        let leaves = tree.leaf_ids();
        let n = leaves.len();
        let names = leaves
            .iter()
            .map(|&id| tree.leaf_name(id).to_string())
            .collect();

        let upper_triangle: Vec<(usize, usize, f64)> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| (i + 1..n).map(move |j| (i, j)))
            .map(|(i, j)| tree.node_distance(leaves[i], leaves[j]).map(|d| (i, j, d)))
            .collect::<Result<Vec<_>>>()?;

        let mut values = vec![vec![0.0; n]; n];
        for (i, j, distance) in upper_triangle {
            values[i][j] = distance;
            values[j][i] = distance;
        }
        Ok(Self { names, values })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Upper triangle in row-major order, the layout linkage expects
    pub fn condensed(&self) -> Vec<f64> {
        let n = self.len();
        let mut condensed = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            condensed.extend_from_slice(&self.values[i][i + 1..]);
        }
        condensed
    }
}

/// Flat partition of every leaf into disjoint clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub desired_clusters: usize,
    /// Cutoff at which the dendrogram was cut
    pub cutoff: f64,
    /// Clusters ordered by their first leaf; members keep leaf enumeration order
    pub clusters: Vec<Vec<String>>,
}

impl Partition {
    fn from_labels(names: &[String], labels: &[usize], desired_clusters: usize, cutoff: f64) -> Self {
        let count = labels.iter().max().map_or(0, |&m| m + 1);
        let mut clusters = vec![Vec::new(); count];
        for (name, &label) in names.iter().zip(labels) {
            clusters[label].push(name.clone());
        }
        Self {
            desired_clusters,
            cutoff,
            clusters,
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Index of the cluster holding `leaf`
    pub fn cluster_of(&self, leaf: &str) -> Option<usize> {
        self.clusters
            .iter()
            .position(|cluster| cluster.iter().any(|member| member == leaf))
    }
}

fn find_root(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

/// Cut a dendrogram into flat clusters at `cutoff`.
///
/// A merge is kept when the highest merge inside its subtree is at most
/// `cutoff`, which also handles non-monotone dendrograms (centroid,
/// median). Returns one label per observation; labels are numbered by
/// first appearance.
pub fn cut_dendrogram(dendrogram: &Dendrogram, cutoff: f64) -> Vec<usize> {
    let n = dendrogram.observations;
    let merges = &dendrogram.merges;

    let mut subtree_height = vec![0.0_f64; n + merges.len()];
    let mut member: Vec<usize> = (0..n).chain(std::iter::repeat(0).take(merges.len())).collect();
    let mut parent: Vec<usize> = (0..n).collect();

    for (index, merge) in merges.iter().enumerate() {
        let label = n + index;
        let height = merge
            .height
            .max(subtree_height[merge.cluster1])
            .max(subtree_height[merge.cluster2]);
        subtree_height[label] = height;
        member[label] = member[merge.cluster1];

        if height <= cutoff {
            let a = find_root(&mut parent, member[merge.cluster1]);
            let b = find_root(&mut parent, member[merge.cluster2]);
            if a != b {
                parent[b] = a;
            }
        }
    }

    let mut root_label = vec![usize::MAX; n];
    let mut next_label = 0;
    let mut labels = Vec::with_capacity(n);
    for observation in 0..n {
        let root = find_root(&mut parent, observation);
        if root_label[root] == usize::MAX {
            root_label[root] = next_label;
            next_label += 1;
        }
        labels.push(root_label[root]);
    }
    labels
}

/// Search a distance matrix for the first cutoff giving at least `desired_clusters`.
///
/// The cutoff starts at [`INITIAL_CUTOFF`] and drops by `step_size` after
/// every attempt. The first partition reaching the target is returned even
/// when it has more clusters than requested.
pub fn partition_matrix(
    matrix: &DistanceMatrix,
    desired_clusters: usize,
    method: LinkageMethod,
    step_size: f64,
) -> Result<Partition> {
    let n = matrix.len();
    if desired_clusters == 0 || desired_clusters > n {
        return Err(ChoosrError::InvalidClusterCount {
            requested: desired_clusters,
            leaves: n,
        });
    }
    if !(step_size > 0.0 && step_size.is_finite()) {
        return Err(ChoosrError::NonTerminatingSearch {
            desired: desired_clusters,
            reached: 0,
            step_size,
        });
    }
    if n == 1 {
        return Ok(Partition::from_labels(&matrix.names, &[0], desired_clusters, INITIAL_CUTOFF));
    }

    let dendrogram = linkage(&matrix.condensed(), n, method);

    let mut cutoff = INITIAL_CUTOFF;
    let mut reached = 0;
    while cutoff > 0.0 {
        let labels = cut_dendrogram(&dendrogram, cutoff);
        let count = labels.iter().max().map_or(0, |&m| m + 1);
        if count >= desired_clusters {
            return Ok(Partition::from_labels(&matrix.names, &labels, desired_clusters, cutoff));
        }
        reached = reached.max(count);
        cutoff -= step_size;
    }

    Err(ChoosrError::NonTerminatingSearch {
        desired: desired_clusters,
        reached,
        step_size,
    })
}

/// Partition all leaves of `tree` into at least `desired_clusters` clusters.
pub fn build_partition(
    tree: &PhyloTree,
    desired_clusters: usize,
    method: LinkageMethod,
    step_size: f64,
) -> Result<Partition> {
    if desired_clusters == 0 || desired_clusters > tree.leaf_count() {
        return Err(ChoosrError::InvalidClusterCount {
            requested: desired_clusters,
            leaves: tree.leaf_count(),
        });
    }
    tree.ensure_unique_leaf_names()?;
    let matrix = DistanceMatrix::from_tree(tree)?;
    partition_matrix(&matrix, desired_clusters, method, step_size)
}

/// Representative picked for one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeChoice {
    pub leaf: String,
    /// Picked through the forced-inclusion list rather than by distance
    pub forced: bool,
    /// Intra-cluster distance sum of `leaf`; absent for forced picks
    pub distance_sum: Option<f64>,
    /// Forced leaves that ended up together in this cluster
    pub collisions: Vec<String>,
}

impl RepresentativeChoice {
    /// Warning text when several forced leaves share the cluster
    pub fn collision_warning(&self) -> Option<String> {
        if self.collisions.len() < 2 {
            return None;
        }
        Some(format!(
            "Leaves {} were all requested but fall in the same cluster; keeping '{}'",
            self.collisions.join(", "),
            self.leaf
        ))
    }
}

/// Choose one representative leaf for a cluster.
///
/// Forced leaves present in the cluster take precedence: one is returned
/// directly, several collide and the first of them in cluster order is
/// kept. Otherwise each member's summed distance to the rest of the cluster
/// decides, with ties going to the earliest member.
pub fn choose_representative(
    tree: &PhyloTree,
    cluster: &[String],
    method: RepresentativeMethod,
    forced_include: &[String],
) -> Result<RepresentativeChoice> {
    if cluster.is_empty() {
        return Err(ChoosrError::EmptyLeafSet);
    }

    if !forced_include.is_empty() {
        let present: Vec<String> = cluster
            .iter()
            .filter(|leaf| forced_include.contains(*leaf))
            .cloned()
            .collect();
        if let Some(first) = present.first() {
            return Ok(RepresentativeChoice {
                leaf: first.clone(),
                forced: true,
                distance_sum: None,
                collisions: if present.len() > 1 { present.clone() } else { Vec::new() },
            });
        }
    }

    let ids = cluster
        .iter()
        .map(|leaf| tree.find_leaf(leaf))
        .collect::<Result<Vec<_>>>()?;

    let mut best: Option<(usize, f64)> = None;
    for (i, &a) in ids.iter().enumerate() {
        let mut total = 0.0;
        for (j, &b) in ids.iter().enumerate() {
            if i != j {
                total += tree.node_distance(a, b)?;
            }
        }
        let better = match (best, method) {
            (None, _) => true,
            (Some((_, current)), RepresentativeMethod::Closest) => total < current,
            (Some((_, current)), RepresentativeMethod::Farthest) => total > current,
        };
        if better {
            best = Some((i, total));
        }
    }

    let (index, total) = best.ok_or(ChoosrError::EmptyLeafSet)?;
    Ok(RepresentativeChoice {
        leaf: cluster[index].clone(),
        forced: false,
        distance_sum: Some(total),
        collisions: Vec::new(),
    })
}

/// One representative per cluster, in cluster order.
pub fn choose_representatives(
    tree: &PhyloTree,
    partition: &Partition,
    method: RepresentativeMethod,
    forced_include: &[String],
) -> Result<Vec<RepresentativeChoice>> {
    partition
        .clusters
        .iter()
        .map(|cluster| choose_representative(tree, cluster, method, forced_include))
        .collect()
}

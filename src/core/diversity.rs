// diversity.rs - Greedy maximum phylogenetic diversity selection

use crate::data::{NodeId, PhyloTree};
use crate::error::{ChoosrError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome of one greedy selection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiverseSelection {
    pub target_size: usize,
    /// Leaves in the order they were chosen
    pub leaves: Vec<String>,
    /// Total branch length of the subtree spanning `leaves`
    pub phylogenetic_diversity: f64,
}

impl DiverseSelection {
    pub fn new(tree: &PhyloTree, target_size: usize, leaves: Vec<String>) -> Result<Self> {
        let phylogenetic_diversity = tree.total_branch_length(&leaves)?;
        Ok(Self {
            target_size,
            leaves,
            phylogenetic_diversity,
        })
    }
}

/// Leaves sorted by name, the evaluation order that fixes tie-breaking
fn leaves_by_name(tree: &PhyloTree) -> Vec<(&str, NodeId)> {
    let mut leaves: Vec<(&str, NodeId)> = tree
        .leaf_ids()
        .iter()
        .map(|&id| (tree.leaf_name(id), id))
        .collect();
    leaves.sort_by(|a, b| a.0.cmp(b.0));
    leaves
}

/// Mandatory leaves checked against the tree, repeated names dropped
fn mandatory_leaves(tree: &PhyloTree, mandatory: &[String]) -> Result<Vec<String>> {
    tree.ensure_unique_leaf_names()?;

    let mut subset: Vec<String> = Vec::with_capacity(mandatory.len().max(2));
    for name in mandatory {
        tree.find_leaf(name)?;
        if !subset.contains(name) {
            subset.push(name.clone());
        }
    }
    Ok(subset)
}

/// Smallest subset size a run can return: the distinct mandatory leaves, or a pair
fn minimum_target_size(mandatory: &[String]) -> usize {
    let distinct: HashSet<&str> = mandatory.iter().map(String::as_str).collect();
    if distinct.is_empty() {
        2
    } else {
        distinct.len()
    }
}

/// Initial subset for the greedy search.
///
/// * no mandatory leaves: the farthest pair, smallest `(p, q)` names on ties
/// * one mandatory leaf `s`: `s` plus the leaf farthest from it, smallest name on ties
/// * two or more: the mandatory leaves as given (repeated names dropped)
pub fn starting_leaves(tree: &PhyloTree, mandatory: &[String]) -> Result<Vec<String>> {
    let mut subset = mandatory_leaves(tree, mandatory)?;
    let leaves = leaves_by_name(tree);
    match subset.len() {
        0 => {
            if leaves.len() < 2 {
                return Err(ChoosrError::InsufficientLeaves {
                    requested: 2,
                    available: leaves.len(),
                });
            }
            let mut best: Option<(f64, usize, usize)> = None;
            for i in 0..leaves.len() {
                for j in (i + 1)..leaves.len() {
                    let distance = tree.node_distance(leaves[i].1, leaves[j].1)?;
                    if best.map_or(true, |(d, _, _)| distance > d) {
                        best = Some((distance, i, j));
                    }
                }
            }
            if let Some((_, i, j)) = best {
                subset.push(leaves[i].0.to_string());
                subset.push(leaves[j].0.to_string());
            }
        }
        1 => {
            let start = tree.find_leaf(&subset[0])?;
            let mut best: Option<(f64, &str)> = None;
            for &(name, id) in leaves.iter().filter(|(_, id)| *id != start) {
                let distance = tree.node_distance(start, id)?;
                if best.map_or(true, |(d, _)| distance > d) {
                    best = Some((distance, name));
                }
            }
            match best {
                Some((_, name)) => subset.push(name.to_string()),
                None => {
                    return Err(ChoosrError::InsufficientLeaves {
                        requested: 2,
                        available: leaves.len(),
                    })
                }
            }
        }
        _ => {}
    }

    Ok(subset)
}

/// The leaf whose addition gives the subset the largest phylogenetic diversity.
///
/// Every leaf outside the subset is evaluated by restricting the tree to
/// `subset + leaf`. Candidates are scored in parallel but scanned in name
/// order, so the smallest name wins a tie regardless of thread count.
pub fn next_leaf(tree: &PhyloTree, subset: &[String]) -> Result<String> {
    let chosen: HashSet<&str> = subset.iter().map(String::as_str).collect();
    let candidates: Vec<&str> = leaves_by_name(tree)
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| !chosen.contains(name))
        .collect();

    if candidates.is_empty() {
        return Err(ChoosrError::InsufficientLeaves {
            requested: subset.len() + 1,
            available: tree.leaf_count(),
        });
    }

    let scores: Vec<f64> = candidates
        .par_iter()
        .map(|&candidate| {
            let mut trial: Vec<&str> = Vec::with_capacity(subset.len() + 1);
            trial.extend(subset.iter().map(String::as_str));
            trial.push(candidate);
            tree.total_branch_length(&trial)
        })
        .collect::<Result<Vec<f64>>>()?;

    let mut best = 0;
    for (index, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = index;
        }
    }
    Ok(candidates[best].to_string())
}

/// Greedily grow a leaf subset of `target_size` with maximal phylogenetic diversity.
pub fn select_diverse_leaves(
    tree: &PhyloTree,
    target_size: usize,
    mandatory: &[String],
) -> Result<Vec<String>> {
    select_diverse_leaves_with_progress(tree, target_size, mandatory, |_, _| {})
}

/// Same as [`select_diverse_leaves`], calling `on_added(leaf, new_size)` after
/// each greedy step.
///
/// `target_size` must be at least the number of distinct mandatory leaves,
/// or 2 without any. A single mandatory leaf with `target_size == 1` is
/// returned alone.
pub fn select_diverse_leaves_with_progress<F>(
    tree: &PhyloTree,
    target_size: usize,
    mandatory: &[String],
    mut on_added: F,
) -> Result<Vec<String>>
where
    F: FnMut(&str, usize),
{
    if target_size > tree.leaf_count() {
        return Err(ChoosrError::InsufficientLeaves {
            requested: target_size,
            available: tree.leaf_count(),
        });
    }

    let minimum = minimum_target_size(mandatory);
    if target_size < minimum {
        return Err(ChoosrError::InvalidTargetSize {
            requested: target_size,
            minimum,
        });
    }

    let mut subset = if target_size == 1 {
        mandatory_leaves(tree, mandatory)?
    } else {
        starting_leaves(tree, mandatory)?
    };
    while subset.len() < target_size {
        let leaf = next_leaf(tree, &subset)?;
        subset.push(leaf);
        on_added(&subset[subset.len() - 1], subset.len());
    }
    Ok(subset)
}

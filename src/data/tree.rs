// tree.rs - Phylogenetic tree model: distances, common ancestors and restriction

use crate::error::{ChoosrError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Index of a node in the tree arena
pub type NodeId = usize;

/// A single node of a phylogenetic tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    /// Length of the incoming branch; `None` when the source lacked one
    pub branch_length: Option<f64>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: Option<String>, branch_length: Option<f64>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            branch_length,
            parent,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Immutable rooted tree stored as an arena of [`Node`]s.
///
/// Every operation that would modify the tree (restriction, weighting)
/// returns a new `PhyloTree`, so a single instance can be shared across
/// threads and repeated candidate evaluations.
///
/// Leaves are enumerated in preorder, which is the order they appear in
/// the Newick source. That order is the "leaf enumeration order" used by
/// the distance matrix and the partitioner.
#[derive(Debug, Clone, PartialEq)]
pub struct PhyloTree {
    nodes: Vec<Node>,
    root: NodeId,
    depths: Vec<usize>,
    leaves: Vec<NodeId>,
    leaf_index: HashMap<String, Vec<NodeId>>,
}

impl PhyloTree {
    /// Build a tree from a node arena, validating parent/child links.
    pub fn from_nodes(nodes: Vec<Node>, root: NodeId) -> Result<Self> {
        if nodes.is_empty() {
            return Err(ChoosrError::InvalidTree("tree has no nodes".to_string()));
        }
        let root_node = nodes
            .get(root)
            .ok_or_else(|| ChoosrError::InvalidTree(format!("root index {} out of range", root)))?;
        if root_node.parent.is_some() {
            return Err(ChoosrError::InvalidTree("root node has a parent".to_string()));
        }

        let mut depths = vec![usize::MAX; nodes.len()];
        let mut leaves = Vec::new();
        let mut stack = vec![root];
        depths[root] = 0;

        while let Some(id) = stack.pop() {
            let node = &nodes[id];
            if let Some(length) = node.branch_length {
                if !(length >= 0.0 && length.is_finite()) {
                    return Err(ChoosrError::InvalidTree(format!(
                        "node {} has invalid branch length {}",
                        id, length
                    )));
                }
            }
            if node.is_leaf() {
                leaves.push(id);
            }
            // Reverse so children are visited left to right
            for &child in node.children.iter().rev() {
                let child_node = nodes.get(child).ok_or_else(|| {
                    ChoosrError::InvalidTree(format!("child index {} out of range", child))
                })?;
                if child_node.parent != Some(id) {
                    return Err(ChoosrError::InvalidTree(format!(
                        "node {} is listed as child of {} but has a different parent",
                        child, id
                    )));
                }
                if depths[child] != usize::MAX {
                    return Err(ChoosrError::InvalidTree(format!(
                        "node {} is reachable by more than one path",
                        child
                    )));
                }
                depths[child] = depths[id] + 1;
                stack.push(child);
            }
        }

        if depths.iter().any(|&d| d == usize::MAX) {
            return Err(ChoosrError::InvalidTree(
                "some nodes are not reachable from the root".to_string(),
            ));
        }

        let mut leaf_index: HashMap<String, Vec<NodeId>> = HashMap::with_capacity(leaves.len());
        for &leaf in &leaves {
            let name = nodes[leaf].name.clone().unwrap_or_default();
            leaf_index.entry(name).or_default().push(leaf);
        }

        Ok(Self {
            nodes,
            root,
            depths,
            leaves,
            leaf_index,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Total number of nodes (internal and leaves)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Leaf ids in enumeration (preorder) order
    pub fn leaf_ids(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Name of a leaf; unnamed leaves report an empty string
    pub fn leaf_name(&self, id: NodeId) -> &str {
        self.nodes[id].name.as_deref().unwrap_or("")
    }

    /// Leaf names in enumeration order
    pub fn leaf_names(&self) -> Vec<&str> {
        self.leaves.iter().map(|&id| self.leaf_name(id)).collect()
    }

    /// Human readable label used in error messages
    fn node_label(&self, id: NodeId) -> String {
        match self.nodes[id].name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("#{}", id),
        }
    }

    /// Resolve a leaf name to its node, rejecting unknown and ambiguous names.
    pub fn find_leaf(&self, name: &str) -> Result<NodeId> {
        match self.leaf_index.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(ChoosrError::UnknownLeaf(name.to_string())),
            Some([id]) => Ok(*id),
            Some(ids) => Err(ChoosrError::DuplicateLeafName {
                name: name.to_string(),
                count: ids.len(),
            }),
        }
    }

    pub fn contains_leaf(&self, name: &str) -> bool {
        self.leaf_index.contains_key(name)
    }

    /// Fail with the first (in enumeration order) leaf name shared by several leaves.
    pub fn ensure_unique_leaf_names(&self) -> Result<()> {
        for &leaf in &self.leaves {
            let name = self.leaf_name(leaf);
            if let Some(ids) = self.leaf_index.get(name) {
                if ids.len() > 1 {
                    return Err(ChoosrError::DuplicateLeafName {
                        name: name.to_string(),
                        count: ids.len(),
                    });
                }
            }
        }
        Ok(())
    }

    fn pair_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let (mut a, mut b) = (a, b);
        while self.depths[a] > self.depths[b] {
            a = self.parent_of(a);
        }
        while self.depths[b] > self.depths[a] {
            b = self.parent_of(b);
        }
        while a != b {
            a = self.parent_of(a);
            b = self.parent_of(b);
        }
        a
    }

    fn parent_of(&self, id: NodeId) -> NodeId {
        // Only called below the root, where depth > 0 guarantees a parent
        self.nodes[id].parent.unwrap_or(self.root)
    }

    /// Lowest common ancestor of a set of nodes.
    ///
    /// Returns `None` for an empty input; a single node is its own ancestor.
    pub fn lowest_common_ancestor(&self, nodes: &[NodeId]) -> Option<NodeId> {
        let (&first, rest) = nodes.split_first()?;
        Some(rest.iter().fold(first, |acc, &id| self.pair_ancestor(acc, id)))
    }

    /// Sum of incoming branch lengths from `from` up to (excluding) `ancestor`
    fn path_length(&self, from: NodeId, ancestor: NodeId) -> Result<f64> {
        let mut total = 0.0;
        let mut current = from;
        while current != ancestor {
            let length = self.nodes[current]
                .branch_length
                .ok_or_else(|| ChoosrError::MissingLength {
                    node: self.node_label(current),
                })?;
            total += length;
            current = self.parent_of(current);
        }
        Ok(total)
    }

    /// Path length between two nodes through their lowest common ancestor.
    pub fn node_distance(&self, a: NodeId, b: NodeId) -> Result<f64> {
        if a == b {
            return Ok(0.0);
        }
        let ancestor = self.pair_ancestor(a, b);
        Ok(self.path_length(a, ancestor)? + self.path_length(b, ancestor)?)
    }

    /// Path length between two named leaves.
    pub fn distance(&self, a: &str, b: &str) -> Result<f64> {
        let a = self.find_leaf(a)?;
        let b = self.find_leaf(b)?;
        self.node_distance(a, b)
    }

    /// New tree spanning exactly the given leaves.
    ///
    /// Internal nodes left with a single retained child are collapsed and
    /// their branch length is added to the child's. The lowest common
    /// ancestor of the leaves becomes the new root. Repeated names are
    /// treated as one leaf.
    pub fn restrict_to_leaves<S: AsRef<str>>(&self, names: &[S]) -> Result<PhyloTree> {
        let mut selected = Vec::with_capacity(names.len());
        let mut seen = HashSet::with_capacity(names.len());
        for name in names {
            let id = self.find_leaf(name.as_ref())?;
            if seen.insert(id) {
                selected.push(id);
            }
        }
        let top = self
            .lowest_common_ancestor(&selected)
            .ok_or(ChoosrError::EmptyLeafSet)?;

        let mut retained = vec![0usize; self.nodes.len()];
        for &id in &selected {
            let mut current = Some(id);
            while let Some(node) = current {
                retained[node] += 1;
                if node == top {
                    break;
                }
                current = self.nodes[node].parent;
            }
        }

        let mut new_nodes: Vec<Node> = Vec::new();
        // (source node, parent in new tree, accumulated branch length)
        let mut stack: Vec<(NodeId, Option<NodeId>, Option<f64>)> = vec![(top, None, None)];

        while let Some((source, parent, length)) = stack.pop() {
            let new_id = new_nodes.len();
            new_nodes.push(Node::new(self.nodes[source].name.clone(), length, parent));
            if let Some(parent) = parent {
                new_nodes[parent].children.push(new_id);
            }

            let kept_children: Vec<NodeId> = self.nodes[source]
                .children
                .iter()
                .copied()
                .filter(|&c| retained[c] > 0)
                .collect();

            for &child in kept_children.iter().rev() {
                let mut current = child;
                let mut length = self.nodes[child].branch_length;
                loop {
                    let mut next = self.nodes[current]
                        .children
                        .iter()
                        .copied()
                        .filter(|&c| retained[c] > 0);
                    match (next.next(), next.next()) {
                        (Some(only), None) => {
                            length = match (length, self.nodes[only].branch_length) {
                                (Some(above), Some(below)) => Some(above + below),
                                _ => None,
                            };
                            current = only;
                        }
                        _ => break,
                    }
                }
                stack.push((current, Some(new_id), length));
            }
        }

        PhyloTree::from_nodes(new_nodes, 0)
    }

    /// Sum of every branch length below the root.
    pub fn branch_length_sum(&self) -> Result<f64> {
        let mut total = 0.0;
        for (id, node) in self.nodes.iter().enumerate() {
            if id == self.root {
                continue;
            }
            total += node.branch_length.ok_or_else(|| ChoosrError::MissingLength {
                node: self.node_label(id),
            })?;
        }
        Ok(total)
    }

    /// Phylogenetic diversity of a leaf set: total branch length of its spanning subtree.
    pub fn total_branch_length<S: AsRef<str>>(&self, names: &[S]) -> Result<f64> {
        self.restrict_to_leaves(names)?.branch_length_sum()
    }

    /// New tree where each listed leaf's incoming branch is multiplied by its weight.
    ///
    /// Unlisted leaves keep their length. The source tree is left untouched.
    pub fn with_leaf_weights(&self, weights: &BTreeMap<String, f64>) -> Result<PhyloTree> {
        let mut weighted = self.clone();
        for (name, &weight) in weights {
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(ChoosrError::InvalidWeight {
                    leaf: name.clone(),
                    weight,
                });
            }
            let id = self.find_leaf(name)?;
            let length = self.nodes[id]
                .branch_length
                .ok_or_else(|| ChoosrError::MissingLength {
                    node: self.node_label(id),
                })?;
            weighted.nodes[id].branch_length = Some(length * weight);
        }
        Ok(weighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(newick: &str) -> PhyloTree {
        PhyloTree::from_newick_str(newick).unwrap()
    }

    #[test]
    fn test_distance_basics() {
        let t = tree("((A:1,B:2)ab:0.5,(C:3,D:4):1.5);");
        assert_eq!(t.distance("A", "A").unwrap(), 0.0);
        assert_eq!(t.distance("A", "B").unwrap(), 3.0);
        assert_eq!(t.distance("A", "C").unwrap(), 6.0);
        assert_eq!(t.distance("C", "A").unwrap(), t.distance("A", "C").unwrap());
        assert_eq!(t.distance("B", "D").unwrap(), 8.0);
    }

    #[test]
    fn test_distance_errors() {
        let t = tree("((A:1,B:2):0.5,(C,D:4):1.5);");
        assert_eq!(
            t.distance("A", "Z"),
            Err(ChoosrError::UnknownLeaf("Z".to_string()))
        );
        assert!(matches!(
            t.distance("A", "C"),
            Err(ChoosrError::MissingLength { .. })
        ));
        // Missing length off the path is not an error
        assert_eq!(t.distance("A", "D").unwrap(), 7.0);
    }

    #[test]
    fn test_lowest_common_ancestor() {
        let t = tree("((A:1,B:2)ab:0.5,(C:3,D:4)cd:1.5)root;");
        let a = t.find_leaf("A").unwrap();
        let b = t.find_leaf("B").unwrap();
        let c = t.find_leaf("C").unwrap();

        assert_eq!(t.lowest_common_ancestor(&[]), None);
        assert_eq!(t.lowest_common_ancestor(&[a]), Some(a));

        let ab = t.lowest_common_ancestor(&[a, b]).unwrap();
        assert_eq!(t.node(ab).name.as_deref(), Some("ab"));

        let all = t.lowest_common_ancestor(&[a, b, c]).unwrap();
        assert_eq!(all, t.root());
        assert_eq!(t.lowest_common_ancestor(&[ab, a]), Some(ab));
    }

    #[test]
    fn test_restrict_sums_collapsed_lengths() {
        let t = tree("(((A:1,B:1):2,C:4):3,D:10);");
        let pruned = t.restrict_to_leaves(&["A", "C"]).unwrap();

        assert_eq!(pruned.leaf_count(), 2);
        assert_eq!(pruned.distance("A", "C").unwrap(), 7.0);
        let a = pruned.find_leaf("A").unwrap();
        assert_eq!(pruned.node(a).branch_length, Some(3.0));
        assert_eq!(pruned.branch_length_sum().unwrap(), 7.0);

        // Source tree is unchanged
        assert_eq!(t.leaf_count(), 4);
        assert_eq!(t.total_branch_length(&["A", "B", "C", "D"]).unwrap(), 21.0);
    }

    #[test]
    fn test_restrict_single_leaf() {
        let t = tree("((A:1,B:1):2,C:4);");
        let pruned = t.restrict_to_leaves(&["B"]).unwrap();
        assert_eq!(pruned.leaf_count(), 1);
        assert_eq!(pruned.node_count(), 1);
        assert_eq!(pruned.branch_length_sum().unwrap(), 0.0);
    }

    #[test]
    fn test_restrict_is_idempotent() {
        let t = tree("((A:0.1,(B:0.2,C:0.3):0.05):0.4,(D:0.7,(E:0.11,F:0.13):0.17):0.19);");
        let first = t.restrict_to_leaves(&["A", "C", "E", "F"]).unwrap();
        let names: Vec<String> = first.leaf_names().iter().map(|s| s.to_string()).collect();
        let second = first.restrict_to_leaves(&names).unwrap();
        assert_eq!(
            first.branch_length_sum().unwrap(),
            second.branch_length_sum().unwrap()
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_restrict_rejects_bad_names() {
        let t = tree("((A:1,B:1):1,(A:1,C:1):1);");
        assert_eq!(
            t.restrict_to_leaves(&["B", "Q"]),
            Err(ChoosrError::UnknownLeaf("Q".to_string()))
        );
        assert_eq!(
            t.restrict_to_leaves(&["B", "A"]),
            Err(ChoosrError::DuplicateLeafName {
                name: "A".to_string(),
                count: 2
            })
        );
        assert!(t.ensure_unique_leaf_names().is_err());
        let empty: [&str; 0] = [];
        assert_eq!(t.restrict_to_leaves(&empty), Err(ChoosrError::EmptyLeafSet));
    }

    #[test]
    fn test_total_branch_length_missing_length() {
        let t = tree("((A:1,B):1,C:1);");
        assert!(matches!(
            t.total_branch_length(&["A", "B"]),
            Err(ChoosrError::MissingLength { .. })
        ));
        assert_eq!(t.total_branch_length(&["A", "C"]).unwrap(), 3.0);
    }

    #[test]
    fn test_leaf_weights() {
        let t = tree("((strain1:0.00002,strain2:0.5):1,strain3:0.25);");
        let mut weights = BTreeMap::new();
        weights.insert("strain1".to_string(), 2.0);

        let weighted = t.with_leaf_weights(&weights).unwrap();
        let s1 = weighted.find_leaf("strain1").unwrap();
        assert_eq!(weighted.node(s1).branch_length, Some(0.00004));

        let original = t.find_leaf("strain1").unwrap();
        assert_eq!(t.node(original).branch_length, Some(0.00002));

        let s2 = weighted.find_leaf("strain2").unwrap();
        assert_eq!(weighted.node(s2).branch_length, Some(0.5));
    }

    #[test]
    fn test_leaf_weight_errors() {
        let t = tree("((A:1,B:1):1,(A:1,C:1):1);");

        let mut unknown = BTreeMap::new();
        unknown.insert("Z".to_string(), 2.0);
        assert_eq!(
            t.with_leaf_weights(&unknown),
            Err(ChoosrError::UnknownLeaf("Z".to_string()))
        );

        let mut ambiguous = BTreeMap::new();
        ambiguous.insert("A".to_string(), 2.0);
        assert!(matches!(
            t.with_leaf_weights(&ambiguous),
            Err(ChoosrError::DuplicateLeafName { .. })
        ));

        let mut negative = BTreeMap::new();
        negative.insert("B".to_string(), -1.0);
        assert!(matches!(
            t.with_leaf_weights(&negative),
            Err(ChoosrError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_from_nodes_rejects_broken_links() {
        let mut root = Node::new(None, None, None);
        root.children = vec![1, 2];
        let leaf = Node::new(Some("A".to_string()), Some(1.0), Some(0));
        let orphan = Node::new(Some("B".to_string()), Some(1.0), Some(1));
        let result = PhyloTree::from_nodes(vec![root, leaf, orphan], 0);
        assert!(matches!(result, Err(ChoosrError::InvalidTree(_))));
    }
}

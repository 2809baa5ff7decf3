// linkage.rs - Agglomerative hierarchical clustering over a condensed distance matrix

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Agglomerative linkage criterion used to build the dendrogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkageMethod {
    /// Nearest pair of members
    Single,
    /// Farthest pair of members
    Complete,
    /// Size-weighted mean of member distances (UPGMA)
    Average,
    /// Unweighted mean of the two merged clusters' distances (WPGMA)
    Weighted,
    Centroid,
    Median,
    Ward,
}

impl LinkageMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkageMethod::Single => "single",
            LinkageMethod::Complete => "complete",
            LinkageMethod::Average => "average",
            LinkageMethod::Weighted => "weighted",
            LinkageMethod::Centroid => "centroid",
            LinkageMethod::Median => "median",
            LinkageMethod::Ward => "ward",
        }
    }

    fn to_kodama(self) -> kodama::Method {
        match self {
            LinkageMethod::Single => kodama::Method::Single,
            LinkageMethod::Complete => kodama::Method::Complete,
            LinkageMethod::Average => kodama::Method::Average,
            LinkageMethod::Weighted => kodama::Method::Weighted,
            LinkageMethod::Centroid => kodama::Method::Centroid,
            LinkageMethod::Median => kodama::Method::Median,
            LinkageMethod::Ward => kodama::Method::Ward,
        }
    }
}

impl FromStr for LinkageMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(LinkageMethod::Single),
            "complete" => Ok(LinkageMethod::Complete),
            "average" | "upgma" => Ok(LinkageMethod::Average),
            "weighted" | "wpgma" => Ok(LinkageMethod::Weighted),
            "centroid" => Ok(LinkageMethod::Centroid),
            "median" => Ok(LinkageMethod::Median),
            "ward" => Ok(LinkageMethod::Ward),
            _ => Err(format!(
                "Invalid linkage method: {}. Use: single, complete, average, weighted, centroid, median, ward",
                s
            )),
        }
    }
}

/// One agglomeration step.
///
/// Observations are labelled `0..n`; the cluster created by step `i` is
/// labelled `n + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub cluster1: usize,
    pub cluster2: usize,
    pub height: f64,
    /// Number of observations in the merged cluster
    pub size: usize,
}

/// Full merge history of `observations` points
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    pub observations: usize,
    pub merges: Vec<Merge>,
}

/// Build a dendrogram from a condensed (row-major upper triangle) distance matrix.
///
/// Fewer than two observations give an empty merge history.
pub fn linkage(condensed: &[f64], observations: usize, method: LinkageMethod) -> Dendrogram {
    if observations < 2 {
        return Dendrogram {
            observations,
            merges: Vec::new(),
        };
    }

    // kodama overwrites its input while merging
    let mut working = condensed.to_vec();
    let dendrogram = kodama::linkage(&mut working, observations, method.to_kodama());

    let merges = dendrogram
        .steps()
        .iter()
        .map(|step| Merge {
            cluster1: step.cluster1,
            cluster2: step.cluster2,
            height: step.dissimilarity,
            size: step.size,
        })
        .collect();

    Dendrogram {
        observations,
        merges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(merge: &Merge) -> (usize, usize) {
        (merge.cluster1.min(merge.cluster2), merge.cluster1.max(merge.cluster2))
    }

    #[test]
    fn test_average_linkage_merges() {
        let condensed = [0.02, 2.0, 2.0, 2.0, 2.0, 0.5];
        let dendrogram = linkage(&condensed, 4, LinkageMethod::Average);
        assert_eq!(dendrogram.observations, 4);
        assert_eq!(dendrogram.merges.len(), 3);

        assert_eq!(pair(&dendrogram.merges[0]), (0, 1));
        assert_eq!(dendrogram.merges[0].height, 0.02);
        assert_eq!(pair(&dendrogram.merges[1]), (2, 3));
        assert_eq!(dendrogram.merges[1].height, 0.5);
        assert_eq!(pair(&dendrogram.merges[2]), (4, 5));
        assert_eq!(dendrogram.merges[2].height, 2.0);
        assert_eq!(dendrogram.merges[2].size, 4);
    }

    #[test]
    fn test_linkage_heights_by_method() {
        // Points on a line at 0, 1, 3
        let condensed = [1.0, 3.0, 2.0];
        let height = |method| linkage(&condensed, 3, method).merges[1].height;
        assert_eq!(height(LinkageMethod::Single), 2.0);
        assert_eq!(height(LinkageMethod::Complete), 3.0);
        assert_eq!(height(LinkageMethod::Average), 2.5);
        assert_eq!(height(LinkageMethod::Weighted), 2.5);
    }

    #[test]
    fn test_input_is_untouched() {
        let condensed = vec![1.0, 3.0, 2.0];
        linkage(&condensed, 3, LinkageMethod::Ward);
        assert_eq!(condensed, vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_trivial_inputs() {
        assert!(linkage(&[], 1, LinkageMethod::Average).merges.is_empty());
        assert!(linkage(&[], 0, LinkageMethod::Average).merges.is_empty());
    }

    #[test]
    fn test_linkage_method_from_str() {
        assert_eq!(LinkageMethod::from_str("average").unwrap(), LinkageMethod::Average);
        assert_eq!(LinkageMethod::from_str("WARD").unwrap(), LinkageMethod::Ward);
        assert_eq!(LinkageMethod::from_str("upgma").unwrap(), LinkageMethod::Average);
        assert!(LinkageMethod::from_str("nearest").is_err());
        assert_eq!(LinkageMethod::Median.as_str(), "median");
    }
}

// error.rs - Error types for tree queries and strain selection

use std::fmt;

/// Errors raised by the tree model, the loaders and the selection algorithms.
///
/// Every variant describes malformed input or an unsatisfiable request.
/// None of them is retried internally.
#[derive(Debug, Clone, PartialEq)]
pub enum ChoosrError {
    /// A branch on a required path has no length.
    MissingLength { node: String },
    /// A requested leaf name is not present in the tree.
    UnknownLeaf(String),
    /// A requested leaf name matches more than one leaf.
    DuplicateLeafName { name: String, count: usize },
    /// More leaves were requested than the tree can provide.
    InsufficientLeaves { requested: usize, available: usize },
    /// Requested subset size is below what the starting leaves already fill.
    InvalidTargetSize { requested: usize, minimum: usize },
    /// Requested cluster count is zero or larger than the leaf count.
    InvalidClusterCount { requested: usize, leaves: usize },
    /// The cutoff scan reached zero without producing enough clusters.
    NonTerminatingSearch { desired: usize, reached: usize, step_size: f64 },
    /// A leaf weight is not a positive finite number.
    InvalidWeight { leaf: String, weight: f64 },
    /// An operation received an empty set of leaves.
    EmptyLeafSet,
    /// The node arena does not describe a single rooted tree.
    InvalidTree(String),
    /// Newick input could not be parsed.
    NewickSyntax { position: usize, message: String },
    /// A weights file line is malformed.
    MalformedWeights { line: usize, message: String },
    /// File access failed.
    Io { path: String, message: String },
}

impl fmt::Display for ChoosrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLength { node } => {
                write!(f, "branch length missing above node '{}'", node)
            }
            Self::UnknownLeaf(name) => write!(f, "leaf '{}' not found in tree", name),
            Self::DuplicateLeafName { name, count } => {
                write!(f, "leaf name '{}' is ambiguous ({} leaves share it)", name, count)
            }
            Self::InsufficientLeaves { requested, available } => write!(
                f,
                "requested {} leaves but only {} are available",
                requested, available
            ),
            Self::InvalidTargetSize { requested, minimum } => write!(
                f,
                "invalid subset size {} (must be at least {})",
                requested, minimum
            ),
            Self::InvalidClusterCount { requested, leaves } => write!(
                f,
                "invalid cluster count {} (must be between 1 and {})",
                requested, leaves
            ),
            Self::NonTerminatingSearch { desired, reached, step_size } => write!(
                f,
                "cutoff search reached zero before finding {} clusters (best: {}, step size: {})",
                desired, reached, step_size
            ),
            Self::InvalidWeight { leaf, weight } => {
                write!(f, "weight {} for leaf '{}' must be positive", weight, leaf)
            }
            Self::EmptyLeafSet => write!(f, "at least one leaf is required"),
            Self::InvalidTree(msg) => write!(f, "invalid tree: {}", msg),
            Self::NewickSyntax { position, message } => {
                write!(f, "Newick syntax error at byte {}: {}", position, message)
            }
            Self::MalformedWeights { line, message } => {
                write!(f, "weights file line {}: {}", line, message)
            }
            Self::Io { path, message } => write!(f, "failed to read '{}': {}", path, message),
        }
    }
}

impl std::error::Error for ChoosrError {}

pub type Result<T> = std::result::Result<T, ChoosrError>;

// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub treefile: Option<String>,
    pub output: Option<String>,
    pub format: Option<String>,

    // Selection
    pub mode: Option<String>,
    pub number: Option<Vec<usize>>,
    pub starting_strains: Option<Vec<String>>,
    pub starting_strains_list: Option<String>,
    pub weight_file: Option<String>,
    pub reference: Option<String>,

    // Clustering
    pub linkage: Option<String>,
    pub representative: Option<String>,
    pub step_size: Option<f64>,
    pub include: Option<Vec<String>>,
    pub include_list: Option<String>,

    // Runtime
    pub threads: Option<usize>,
    pub verbosity: Option<String>,
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# strainchoosr.toml - Configuration file for strainchoosr
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Path to Newick tree file
treefile = "/path/to/tree.nwk"

# Output report file (omit for a summary on stdout)
output = "selection.tsv"

# Output format: tsv, csv, json
format = "tsv"

# =============================================================================
# SELECTION
# =============================================================================

# Run mode: diversity, cluster, nearest
mode = "diversity"

# Numbers of strains (diversity), clusters (cluster) or neighbors (nearest)
number = [5, 10]

# Leaves that must be part of every selection
# starting_strains = ["strain_A", "strain_B"]

# File with mandatory leaves (one per line)
# starting_strains_list = "mandatory.txt"

# Tab-separated leaf name / branch length multiplier file
# weight_file = "weights.tsv"

# Reference leaf for nearest mode
# reference = "strain_A"

# =============================================================================
# CLUSTERING
# =============================================================================

# Linkage criterion: single, complete, average, weighted, centroid, median, ward
linkage = "average"

# Representative choice: closest, farthest
representative = "closest"

# Cutoff decrement between partition attempts
step_size = 0.00003

# Leaves forced to represent their clusters
# include = ["strain_C"]
# include_list = "include.txt"

# =============================================================================
# RUNTIME
# =============================================================================

# Number of threads (omit for auto-detection)
threads = 8

# Verbosity: debug, info, warning
verbosity = "info"

# Validate inputs and list leaves without selecting
dry_run = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.treefile.as_deref(), Some("/path/to/tree.nwk"));
        assert_eq!(config.number, Some(vec![5, 10]));
        assert_eq!(config.step_size, Some(0.00003));
        assert_eq!(config.starting_strains, None);
        assert_eq!(config.dry_run, Some(false));
    }

    #[test]
    fn test_config_file_round_trip() {
        let config = Config {
            treefile: Some("tree.nwk".to_string()),
            mode: Some("cluster".to_string()),
            include: Some(vec!["A".to_string()]),
            ..Config::default()
        };
        let path = std::env::temp_dir().join(format!("strainchoosr_config_{}.toml", std::process::id()));
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::from_file("/nonexistent/strainchoosr.toml").unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }
}

// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::{LinkageMethod, RepresentativeMethod};
use crate::data::read_weights_file;
use crate::output::OutputFormat;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// What a run computes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Greedy maximum phylogenetic diversity selection
    Diversity,
    /// Distance-threshold partition with one representative per cluster
    Cluster,
    /// Closest leaves to a reference
    Nearest,
}

impl RunMode {
    pub fn description(&self) -> &'static str {
        match self {
            RunMode::Diversity => "maximum phylogenetic diversity",
            RunMode::Cluster => "cluster representatives",
            RunMode::Nearest => "nearest neighbors",
        }
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "diversity" => Ok(RunMode::Diversity),
            "cluster" => Ok(RunMode::Cluster),
            "nearest" => Ok(RunMode::Nearest),
            _ => Err(format!("Invalid mode: {}. Use: diversity, cluster, nearest", s)),
        }
    }
}

/// Console reporting level, ordered from chattiest to quietest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Debug,
    Info,
    Warning,
}

impl Verbosity {
    pub fn shows_info(&self) -> bool {
        *self <= Verbosity::Info
    }

    pub fn shows_debug(&self) -> bool {
        *self == Verbosity::Debug
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Verbosity::Debug),
            "info" => Ok(Verbosity::Info),
            "warning" | "warn" => Ok(Verbosity::Warning),
            _ => Err(format!("Invalid verbosity: {}. Use: debug, info, warning", s)),
        }
    }
}

#[derive(Debug)]
pub struct ValidationResult {
    pub mode: RunMode,
    pub linkage: LinkageMethod,
    pub representative: RepresentativeMethod,
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Requested sizes, duplicates removed, in the order given
    pub targets: Vec<usize>,
    pub starting_strains: Vec<String>,
    pub forced_include: Vec<String>,
    pub weights: Option<BTreeMap<String, f64>>,
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    let mode = RunMode::from_str(&args.mode)?;
    let linkage = LinkageMethod::from_str(&args.linkage)?;
    let representative = RepresentativeMethod::from_str(&args.representative)?;
    let format = OutputFormat::from_str(&args.format)?;
    let verbosity = Verbosity::from_str(&args.verbosity)?;

    if args.treefile.is_none() {
        return Err("--treefile is required".to_string());
    }

    let mut targets: Vec<usize> = Vec::with_capacity(args.number.len());
    for &n in &args.number {
        if !targets.contains(&n) {
            targets.push(n);
        }
    }
    if targets.is_empty() && !args.dry_run {
        return Err("at least one -n/--number is required".to_string());
    }
    if targets.contains(&0) {
        return Err("-n/--number must be at least 1".to_string());
    }

    if !(args.step_size > 0.0 && args.step_size.is_finite()) {
        return Err(format!("--step-size must be a positive number, got {}", args.step_size));
    }

    if args.threads == Some(0) {
        return Err("--threads must be at least 1".to_string());
    }

    // Mode incompatibilities
    match mode {
        RunMode::Diversity => {
            if !args.include.is_empty() || args.include_list.is_some() {
                return Err("--include is only used in cluster mode".to_string());
            }
            if args.reference.is_some() {
                return Err("--reference is only used in nearest mode".to_string());
            }
        }
        RunMode::Cluster => {
            if !args.starting_strain.is_empty() || args.starting_strains_list.is_some() {
                return Err(
                    "--starting-strain is not compatible with --mode cluster (use --include)".to_string(),
                );
            }
            if args.reference.is_some() {
                return Err("--reference is only used in nearest mode".to_string());
            }
        }
        RunMode::Nearest => {
            if args.reference.is_none() && !args.dry_run {
                return Err("--reference is required with --mode nearest".to_string());
            }
            if !args.starting_strain.is_empty() || args.starting_strains_list.is_some() {
                return Err("--starting-strain is not compatible with --mode nearest".to_string());
            }
            if !args.include.is_empty() || args.include_list.is_some() {
                return Err("--include is only used in cluster mode".to_string());
            }
        }
    }

    let mut starting_strains = args.starting_strain.clone();
    if let Some(file_path) = &args.starting_strains_list {
        starting_strains.extend(load_list_from_file(file_path)?);
    }

    let mut forced_include = args.include.clone();
    if let Some(file_path) = &args.include_list {
        forced_include.extend(load_list_from_file(file_path)?);
    }

    let weights = match &args.weight_file {
        Some(file_path) => Some(read_weights_file(Path::new(file_path)).map_err(|e| e.to_string())?),
        None => None,
    };

    Ok(ValidationResult {
        mode,
        linkage,
        representative,
        format,
        verbosity,
        targets,
        starting_strains,
        forced_include,
        weights,
    })
}

/// Load leaf names from a file (one per line, blank lines ignored, order kept)
pub fn load_list_from_file(file_path: &str) -> Result<Vec<String>, String> {
    let file = File::open(file_path)
        .map_err(|e| format!("Failed to open list file '{}': {}", file_path, e))?;

    let reader = BufReader::new(file);
    let mut names = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            format!("Failed to read line {} from '{}': {}", line_num + 1, file_path, e)
        })?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            names.push(trimmed.to_string());
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn parse(arguments: &[&str]) -> Args {
        Args::from_args(&["strainchoosr"], arguments).unwrap()
    }

    fn temp_file(name: &str, content: &str) -> String {
        let path = std::env::temp_dir().join(format!("strainchoosr_{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_defaults() {
        let result = validate_args(&parse(&["-t", "tree.nwk", "-n", "3"])).unwrap();
        assert_eq!(result.mode, RunMode::Diversity);
        assert_eq!(result.linkage, LinkageMethod::Average);
        assert_eq!(result.representative, RepresentativeMethod::Closest);
        assert_eq!(result.format, OutputFormat::Tsv);
        assert_eq!(result.verbosity, Verbosity::Info);
        assert_eq!(result.targets, vec![3]);
        assert!(result.weights.is_none());
        assert!(format!("{:?}", result).contains("Diversity"));
    }

    #[test]
    fn test_targets_deduplicated_in_order() {
        let result = validate_args(&parse(&["-t", "t.nwk", "-n", "5", "-n", "2", "-n", "5"])).unwrap();
        assert_eq!(result.targets, vec![5, 2]);
    }

    #[test]
    fn test_required_and_invalid_values() {
        assert!(validate_args(&parse(&["-n", "3"])).unwrap_err().contains("--treefile"));
        assert!(validate_args(&parse(&["-t", "t.nwk"])).is_err());
        assert!(validate_args(&parse(&["-t", "t.nwk", "-n", "0"])).is_err());
        assert!(validate_args(&parse(&["-t", "t.nwk", "-n", "2", "--mode", "random"])).is_err());
        assert!(validate_args(&parse(&["-t", "t.nwk", "-n", "2", "--step-size", "0"])).is_err());
        assert!(validate_args(&parse(&["-t", "t.nwk", "-n", "2", "--threads", "0"])).is_err());

        // Dry run only needs the tree
        assert!(validate_args(&parse(&["-t", "t.nwk", "--dry-run"])).is_ok());
    }

    #[test]
    fn test_mode_incompatibilities() {
        assert!(validate_args(&parse(&["-t", "t.nwk", "-n", "2", "--include", "A"])).is_err());
        assert!(validate_args(&parse(&[
            "-t", "t.nwk", "-n", "2", "--mode", "cluster", "-s", "A"
        ]))
        .is_err());
        assert!(validate_args(&parse(&["-t", "t.nwk", "-n", "2", "--mode", "nearest"])).is_err());

        let result = validate_args(&parse(&[
            "-t", "t.nwk", "-n", "2", "--mode", "nearest", "--reference", "A",
        ]))
        .unwrap();
        assert_eq!(result.mode, RunMode::Nearest);
    }

    #[test]
    fn test_lists_and_weights_loaded() {
        let strains = temp_file("strains.txt", "B\n\n  A  \n");
        let weights = temp_file("weights.tsv", "A\t2\nB\t0.5\n");
        let result = validate_args(&parse(&[
            "-t",
            "t.nwk",
            "-n",
            "3",
            "-s",
            "C",
            "--starting-strains-list",
            &strains,
            "--weight-file",
            &weights,
        ]))
        .unwrap();
        std::fs::remove_file(&strains).ok();
        std::fs::remove_file(&weights).ok();

        assert_eq!(result.starting_strains, vec!["C", "B", "A"]);
        let weights = result.weights.unwrap();
        assert_eq!(weights.get("A"), Some(&2.0));
        assert_eq!(weights.get("B"), Some(&0.5));
    }

    #[test]
    fn test_missing_list_file() {
        let err = load_list_from_file("/nonexistent/list.txt").unwrap_err();
        assert!(err.contains("Failed to open list file"));
    }

    #[test]
    fn test_verbosity_levels() {
        assert!(Verbosity::Debug.shows_info());
        assert!(Verbosity::Info.shows_info());
        assert!(!Verbosity::Warning.shows_info());
        assert!(!Verbosity::Info.shows_debug());
        assert_eq!(Verbosity::from_str("WARN").unwrap(), Verbosity::Warning);
    }
}

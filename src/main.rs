// main.rs - CLI entry point

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::path::Path;
use std::time::Instant;
use strainchoosr::cli::{Config, RunMode, Verbosity};
use strainchoosr::core::{choose_representatives, nearest_leaves, DiverseSelection};
use strainchoosr::output::{
    write_neighbors, write_neighbors_to, write_partitions, write_partitions_to, write_selections,
    write_selections_to, ClusteringReport,
};
use strainchoosr::prelude::*;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

/// Status reporting. Lines move to stderr when the report itself goes to stdout.
#[derive(Debug, Clone, Copy)]
struct Console {
    verbosity: Verbosity,
    use_stderr: bool,
}

impl Console {
    fn new(verbosity: Verbosity, report_on_stdout: bool) -> Self {
        Self {
            verbosity,
            use_stderr: report_on_stdout,
        }
    }

    fn line(&self, message: impl Display) {
        if self.use_stderr {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }

    fn info(&self, message: impl Display) {
        if self.verbosity.shows_info() {
            self.line(message);
        }
    }

    fn debug(&self, message: impl Display) {
        if self.verbosity.shows_debug() {
            self.line(message);
        }
    }

    /// Warnings are shown at every verbosity level, always on stderr
    fn warn(&self, message: impl Display) {
        eprintln!("⚠️  {}", message);
    }
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        eprintln!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    let config_path = args.config.clone();
    if let Some(path) = &config_path {
        args = args.with_config_file(path)?;
    }

    let validation = validate_args(&args)?;
    let console = Console::new(validation.verbosity, args.output.is_none());
    let treefile = args.treefile.as_ref().ok_or("--treefile is required")?;

    if let Some(path) = &config_path {
        console.info(format!("📄 Loaded configuration from: {}", path));
    }
    console.info(format!("🚀 {}", strainchoosr::get_info()));
    console.info(format!("🎯 Mode: {}", validation.mode.description()));

    // Configure thread pool
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        console.info(format!("🧵 Threads: {}", n));
    } else {
        console.info(format!(
            "🧵 Threads: {} (auto-detected)",
            rayon::current_num_threads()
        ));
    }

    let total_start = Instant::now();

    // Load tree
    let tree = PhyloTree::from_newick_file(Path::new(treefile)).map_err(|e| e.to_string())?;
    console.info(format!("🌳 Loaded tree '{}': {} leaves", treefile, tree.leaf_count()));

    let tree = match &validation.weights {
        Some(weights) => {
            let weighted = tree.with_leaf_weights(weights).map_err(|e| e.to_string())?;
            console.info(format!("⚖️  Applied {} branch length weights", weights.len()));
            weighted
        }
        None => tree,
    };

    if args.dry_run {
        print_leaf_report(&tree);
        console.info("✅ Dry run completed successfully");
        return Ok(());
    }

    match validation.mode {
        RunMode::Diversity => run_diversity(&tree, &validation, &args, console, &command_line)?,
        RunMode::Cluster => run_cluster(&tree, &validation, &args, console, &command_line)?,
        RunMode::Nearest => run_nearest(&tree, &validation, &args, console, &command_line)?,
    }

    console.info(format!(
        "\n⏱️  Total execution time: {:.2}s",
        total_start.elapsed().as_secs_f64()
    ));
    Ok(())
}

fn print_leaf_report(tree: &PhyloTree) {
    println!("📋 Tree has {} leaves:", tree.leaf_count());
    for name in tree.leaf_names() {
        println!("  • {}", name);
    }
}

fn progress_bar(len: usize, verbosity: Verbosity) -> Result<ProgressBar, String> {
    if !verbosity.shows_info() {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| format!("Invalid progress template: {}", e))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn run_diversity(
    tree: &PhyloTree,
    validation: &ValidationResult,
    args: &Args,
    console: Console,
    command_line: &str,
) -> Result<(), String> {
    let verbosity = validation.verbosity;
    if !validation.starting_strains.is_empty() {
        console.info(format!(
            "📌 Starting strains: {}",
            validation.starting_strains.join(", ")
        ));
    }

    let mut selections = Vec::with_capacity(validation.targets.len());
    for &target in &validation.targets {
        let start = Instant::now();
        let pb = progress_bar(target, verbosity)?;
        pb.set_position(validation.starting_strains.len().min(target) as u64);

        let leaves = select_diverse_leaves_with_progress(
            tree,
            target,
            &validation.starting_strains,
            |leaf, size| {
                pb.set_message(leaf.to_string());
                pb.set_position(size as u64);
            },
        )
        .map_err(|e| e.to_string())?;
        pb.finish_and_clear();

        let selection = DiverseSelection::new(tree, target, leaves).map_err(|e| e.to_string())?;
        console.info(format!(
            "✅ Selected {} strains (phylogenetic diversity {:.6}) in {:.2}s",
            selection.leaves.len(),
            selection.phylogenetic_diversity,
            start.elapsed().as_secs_f64()
        ));
        console.debug(format!("🔍 Selection order: {}", selection.leaves.join(", ")));
        selections.push(selection);
    }

    match &args.output {
        Some(path) => {
            write_selections(path, validation.format, &selections, command_line)?;
            console.info(format!("💾 Selections written to: {}", path));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            write_selections_to(&mut stdout, validation.format, &selections, command_line)?;
        }
    }
    Ok(())
}

fn run_cluster(
    tree: &PhyloTree,
    validation: &ValidationResult,
    args: &Args,
    console: Console,
    command_line: &str,
) -> Result<(), String> {
    console.info(format!(
        "🔗 Linkage: {} | Representative: {} | Step size: {}",
        validation.linkage.as_str(),
        validation.representative.as_str(),
        args.step_size
    ));
    for name in &validation.forced_include {
        tree.find_leaf(name).map_err(|e| e.to_string())?;
    }

    let mut results = Vec::with_capacity(validation.targets.len());
    for &target in &validation.targets {
        let start = Instant::now();
        let partition = build_partition(tree, target, validation.linkage, args.step_size)
            .map_err(|e| e.to_string())?;
        let representatives = choose_representatives(
            tree,
            &partition,
            validation.representative,
            &validation.forced_include,
        )
        .map_err(|e| e.to_string())?;

        console.info(format!(
            "✅ {} clusters requested, {} found at cutoff {:.6} in {:.2}s",
            target,
            partition.len(),
            partition.cutoff,
            start.elapsed().as_secs_f64()
        ));
        if partition.len() > target {
            console.warn(format!(
                "Cutoff search overshot: {} clusters instead of {}",
                partition.len(),
                target
            ));
        }
        for warning in representatives.iter().filter_map(|r| r.collision_warning()) {
            console.warn(warning);
        }
        results.push((partition, representatives));
    }

    let reports: Vec<ClusteringReport<'_>> = results
        .iter()
        .map(|(partition, representatives)| ClusteringReport {
            partition,
            representatives,
        })
        .collect();

    match &args.output {
        Some(path) => {
            write_partitions(path, validation.format, &reports, command_line)?;
            console.info(format!("💾 Clusters written to: {}", path));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            write_partitions_to(&mut stdout, validation.format, &reports, command_line)?;
        }
    }
    Ok(())
}

fn run_nearest(
    tree: &PhyloTree,
    validation: &ValidationResult,
    args: &Args,
    console: Console,
    command_line: &str,
) -> Result<(), String> {
    let reference = args
        .reference
        .as_ref()
        .ok_or("--reference is required with --mode nearest")?;
    let count = validation.targets.iter().copied().max().unwrap_or(1);

    let neighbors = nearest_leaves(tree, reference, count).map_err(|e| e.to_string())?;
    console.info(format!("✅ {} nearest leaves to '{}'", neighbors.len(), reference));

    match &args.output {
        Some(path) => {
            write_neighbors(path, validation.format, reference, &neighbors, command_line)?;
            console.info(format!("💾 Neighbors written to: {}", path));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            write_neighbors_to(&mut stdout, validation.format, reference, &neighbors, command_line)?;
        }
    }
    Ok(())
}

// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// strainchoosr - Pick the most phylogenetically diverse strains from a tree
pub struct Args {
    /// path to Newick tree file
    #[argh(option, short = 't')]
    pub treefile: Option<String>,

    /// number of strains (diversity), clusters (cluster) or neighbors (nearest); repeatable
    #[argh(option, short = 'n')]
    pub number: Vec<usize>,

    /// run mode: diversity, cluster, nearest (default: diversity)
    #[argh(option, default = "String::from(\"diversity\")")]
    pub mode: String,

    /// leaf that must be part of the selection; repeatable
    #[argh(option, short = 's')]
    pub starting_strain: Vec<String>,

    /// file with leaves that must be part of the selection (one per line)
    #[argh(option)]
    pub starting_strains_list: Option<String>,

    /// tab-separated file of leaf names and branch length multipliers
    #[argh(option)]
    pub weight_file: Option<String>,

    /// leaf forced to represent its cluster in cluster mode; repeatable
    #[argh(option)]
    pub include: Vec<String>,

    /// file with leaves forced to represent their clusters (one per line)
    #[argh(option)]
    pub include_list: Option<String>,

    /// reference leaf for nearest mode
    #[argh(option)]
    pub reference: Option<String>,

    /// linkage criterion: single, complete, average, weighted, centroid, median, ward (default: average)
    #[argh(option, default = "String::from(\"average\")")]
    pub linkage: String,

    /// representative choice: closest, farthest (default: closest)
    #[argh(option, default = "String::from(\"closest\")")]
    pub representative: String,

    /// cutoff decrement between partition attempts (default: 0.00003)
    #[argh(option, default = "0.00003")]
    pub step_size: f64,

    /// output report file (default: summary on stdout)
    #[argh(option, short = 'o')]
    pub output: Option<String>,

    /// output format: tsv, csv, json (default: tsv)
    #[argh(option, default = "String::from(\"tsv\")")]
    pub format: String,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// verbosity: debug, info, warning (default: info)
    #[argh(option, short = 'v', default = "String::from(\"info\")")]
    pub verbosity: String,

    /// validate inputs and list tree leaves without selecting (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}

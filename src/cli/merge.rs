// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.treefile.is_none() {
            self.treefile = config.treefile;
        }
        if self.output.is_none() {
            self.output = config.output;
        }
        if self.format == "tsv" {
            if let Some(format) = config.format {
                self.format = format;
            }
        }

        // Selection (only override defaults, not explicit CLI values)
        if self.mode == "diversity" {
            if let Some(mode) = config.mode {
                self.mode = mode;
            }
        }
        if self.number.is_empty() {
            self.number = config.number.unwrap_or_default();
        }
        if self.starting_strain.is_empty() {
            self.starting_strain = config.starting_strains.unwrap_or_default();
        }
        if self.starting_strains_list.is_none() {
            self.starting_strains_list = config.starting_strains_list;
        }
        if self.weight_file.is_none() {
            self.weight_file = config.weight_file;
        }
        if self.reference.is_none() {
            self.reference = config.reference;
        }

        // Clustering
        if self.linkage == "average" {
            if let Some(linkage) = config.linkage {
                self.linkage = linkage;
            }
        }
        if self.representative == "closest" {
            if let Some(representative) = config.representative {
                self.representative = representative;
            }
        }
        if self.step_size == crate::core::DEFAULT_STEP_SIZE {
            if let Some(step_size) = config.step_size {
                self.step_size = step_size;
            }
        }
        if self.include.is_empty() {
            self.include = config.include.unwrap_or_default();
        }
        if self.include_list.is_none() {
            self.include_list = config.include_list;
        }

        // Runtime
        if self.threads.is_none() {
            self.threads = config.threads;
        }
        if self.verbosity == "info" {
            if let Some(verbosity) = config.verbosity {
                self.verbosity = verbosity;
            }
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn parse(arguments: &[&str]) -> Args {
        Args::from_args(&["strainchoosr"], arguments).unwrap()
    }

    #[test]
    fn test_config_fills_unset_values() {
        let args = parse(&["-n", "3"]);
        let config = Config {
            treefile: Some("tree.nwk".to_string()),
            number: Some(vec![10]),
            mode: Some("cluster".to_string()),
            step_size: Some(0.001),
            include: Some(vec!["A".to_string()]),
            dry_run: Some(true),
            ..Config::default()
        };
        let merged = args.merge_with_config(config);
        assert_eq!(merged.treefile.as_deref(), Some("tree.nwk"));
        assert_eq!(merged.number, vec![3]);
        assert_eq!(merged.mode, "cluster");
        assert_eq!(merged.step_size, 0.001);
        assert_eq!(merged.include, vec!["A".to_string()]);
        assert!(merged.dry_run);
    }

    #[test]
    fn test_cli_values_take_precedence() {
        let args = parse(&["--treefile", "cli.nwk", "--linkage", "single", "--format", "json"]);
        let config = Config {
            treefile: Some("config.nwk".to_string()),
            linkage: Some("ward".to_string()),
            format: Some("csv".to_string()),
            ..Config::default()
        };
        let merged = args.merge_with_config(config);
        assert_eq!(merged.treefile.as_deref(), Some("cli.nwk"));
        assert_eq!(merged.linkage, "single");
        assert_eq!(merged.format, "json");
    }
}

// mod.rs - Output writers for selections, partitions and neighbor lists

use crate::core::{DiverseSelection, Neighbor, Partition, RepresentativeChoice};
use csv::{Terminator, Writer, WriterBuilder};
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tsv,
    Csv,
    Json,
}

impl OutputFormat {
    fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            _ => b'\t',
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unsupported output format: {}. Use: tsv, csv, json", s)),
        }
    }
}

/// One clustering run: the partition and a representative per cluster
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringReport<'a> {
    pub partition: &'a Partition,
    pub representatives: &'a [RepresentativeChoice],
}

#[derive(Serialize)]
struct JsonReport<'a, T: Serialize> {
    tool: &'static str,
    version: &'static str,
    generated: String,
    command: &'a str,
    results: T,
}

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &str) -> Result<(), String> {
    if let Some(parent) = Path::new(file_path).parent() {
        create_dir_all(parent)
            .map_err(|e| format!("Failed to create parent directory '{}': {}", parent.display(), e))?;
    }
    Ok(())
}

fn create_writer(file_path: &str) -> Result<BufWriter<File>, String> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path)
        .map_err(|e| format!("Failed to create output file '{}': {}", file_path, e))?;
    Ok(BufWriter::new(file))
}

fn write_err(e: std::io::Error) -> String {
    format!("Write error: {}", e)
}

fn generated_at() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn write_header<W: Write>(writer: &mut W, command_line: &str) -> Result<(), String> {
    writeln!(writer, "# Command: {}", command_line).map_err(write_err)?;
    writeln!(writer, "# Generated: {}", generated_at()).map_err(write_err)?;
    writeln!(writer, "# strainchoosr v{}", env!("CARGO_PKG_VERSION")).map_err(write_err)?;
    Ok(())
}

fn csv_err(e: csv::Error) -> String {
    format!("Write error: {}", e)
}

/// Delimited table writer; fields holding the delimiter, quotes or line breaks are quoted
fn table_writer<W: Write>(writer: W, format: OutputFormat) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(format.delimiter())
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer)
}

fn write_json<W: Write, T: Serialize>(writer: &mut W, command_line: &str, results: T) -> Result<(), String> {
    let report = JsonReport {
        tool: "strainchoosr",
        version: env!("CARGO_PKG_VERSION"),
        generated: generated_at(),
        command: command_line,
        results,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    writeln!(writer).map_err(write_err)
}

/// Write diversity selections (one row per chosen leaf, in selection order)
pub fn write_selections_to<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    selections: &[DiverseSelection],
    command_line: &str,
) -> Result<(), String> {
    if format == OutputFormat::Json {
        return write_json(writer, command_line, selections);
    }
    write_header(writer, command_line)?;
    for selection in selections {
        writeln!(
            writer,
            "# Target {}: phylogenetic diversity {}",
            selection.target_size, selection.phylogenetic_diversity
        )
        .map_err(write_err)?;
    }

    let mut table = table_writer(&mut *writer, format);
    table.write_record(["target_size", "rank", "leaf"]).map_err(csv_err)?;
    for selection in selections {
        let target = selection.target_size.to_string();
        for (rank, leaf) in selection.leaves.iter().enumerate() {
            let rank = (rank + 1).to_string();
            table.write_record([target.as_str(), rank.as_str(), leaf.as_str()]).map_err(csv_err)?;
        }
    }
    table.flush().map_err(write_err)
}

/// Write partitions with their representatives (one row per leaf)
pub fn write_partitions_to<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    reports: &[ClusteringReport<'_>],
    command_line: &str,
) -> Result<(), String> {
    if format == OutputFormat::Json {
        return write_json(writer, command_line, reports);
    }
    write_header(writer, command_line)?;
    for report in reports {
        writeln!(
            writer,
            "# Desired {}: {} clusters at cutoff {:.6}",
            report.partition.desired_clusters,
            report.partition.len(),
            report.partition.cutoff
        )
        .map_err(write_err)?;
    }

    let mut table = table_writer(&mut *writer, format);
    table
        .write_record(["desired_clusters", "cluster", "leaf", "representative"])
        .map_err(csv_err)?;
    for report in reports {
        let desired = report.partition.desired_clusters.to_string();
        for (index, cluster) in report.partition.clusters.iter().enumerate() {
            let number = (index + 1).to_string();
            let representative = report.representatives.get(index).map(|r| r.leaf.as_str());
            for leaf in cluster {
                let is_representative = representative == Some(leaf.as_str());
                table
                    .write_record([
                        desired.as_str(),
                        number.as_str(),
                        leaf.as_str(),
                        if is_representative { "yes" } else { "no" },
                    ])
                    .map_err(csv_err)?;
            }
        }
    }
    table.flush().map_err(write_err)
}

/// Write a ranked neighbor list
pub fn write_neighbors_to<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    reference: &str,
    neighbors: &[Neighbor],
    command_line: &str,
) -> Result<(), String> {
    if format == OutputFormat::Json {
        #[derive(Serialize)]
        struct NeighborReport<'a> {
            reference: &'a str,
            neighbors: &'a [Neighbor],
        }
        return write_json(writer, command_line, NeighborReport { reference, neighbors });
    }
    write_header(writer, command_line)?;
    writeln!(writer, "# Reference: {}", reference).map_err(write_err)?;

    let mut table = table_writer(&mut *writer, format);
    table.write_record(["rank", "leaf", "distance"]).map_err(csv_err)?;
    for (rank, neighbor) in neighbors.iter().enumerate() {
        table
            .write_record([
                (rank + 1).to_string(),
                neighbor.name.clone(),
                neighbor.distance.to_string(),
            ])
            .map_err(csv_err)?;
    }
    table.flush().map_err(write_err)
}

/// Write diversity selections to a file
pub fn write_selections(
    file_path: &str,
    format: OutputFormat,
    selections: &[DiverseSelection],
    command_line: &str,
) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    write_selections_to(&mut writer, format, selections, command_line)?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

/// Write partitions and representatives to a file
pub fn write_partitions(
    file_path: &str,
    format: OutputFormat,
    reports: &[ClusteringReport<'_>],
    command_line: &str,
) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    write_partitions_to(&mut writer, format, reports, command_line)?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

/// Write a neighbor list to a file
pub fn write_neighbors(
    file_path: &str,
    format: OutputFormat,
    reference: &str,
    neighbors: &[Neighbor],
    command_line: &str,
) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    write_neighbors_to(&mut writer, format, reference, neighbors, command_line)?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> DiverseSelection {
        DiverseSelection {
            target_size: 3,
            leaves: vec!["L3".to_string(), "L6".to_string(), "L2".to_string()],
            phylogenetic_diversity: 15.0,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("TSV").unwrap(), OutputFormat::Tsv);
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("phylip").is_err());
    }

    #[test]
    fn test_selection_tsv() {
        let mut buffer = Vec::new();
        write_selections_to(&mut buffer, OutputFormat::Tsv, &[selection()], "strainchoosr -n 3").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(rows, vec!["target_size\trank\tleaf", "3\t1\tL3", "3\t2\tL6", "3\t3\tL2"]);
        assert!(text.contains("# Command: strainchoosr -n 3"));
    }

    #[test]
    fn test_selection_json() {
        let mut buffer = Vec::new();
        write_selections_to(&mut buffer, OutputFormat::Json, &[selection()], "cmd").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["tool"], "strainchoosr");
        assert_eq!(value["results"][0]["leaves"][1], "L6");
        assert_eq!(value["results"][0]["phylogenetic_diversity"], 15.0);
    }

    #[test]
    fn test_partition_csv() {
        let partition = Partition {
            desired_clusters: 2,
            cutoff: 0.9,
            clusters: vec![
                vec!["A".to_string(), "B,1".to_string()],
                vec!["C".to_string()],
            ],
        };
        let representatives = vec![
            RepresentativeChoice {
                leaf: "B,1".to_string(),
                forced: true,
                distance_sum: None,
                collisions: Vec::new(),
            },
            RepresentativeChoice {
                leaf: "C".to_string(),
                forced: false,
                distance_sum: Some(0.0),
                collisions: Vec::new(),
            },
        ];
        let reports = [ClusteringReport {
            partition: &partition,
            representatives: &representatives,
        }];

        let mut buffer = Vec::new();
        write_partitions_to(&mut buffer, OutputFormat::Csv, &reports, "cmd").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(
            rows,
            vec![
                "desired_clusters,cluster,leaf,representative",
                "2,1,A,no",
                "2,1,\"B,1\",yes",
                "2,2,C,yes",
            ]
        );
    }

    #[test]
    fn test_awkward_leaf_names_stay_in_one_field() {
        let selection = DiverseSelection {
            target_size: 2,
            leaves: vec!["strain\t7".to_string(), "line\nbreak".to_string()],
            phylogenetic_diversity: 1.0,
        };

        let mut buffer = Vec::new();
        write_selections_to(&mut buffer, OutputFormat::Tsv, &[selection], "cmd").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let table: String = text
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(|l| format!("{}\n", l))
            .collect();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(table.as_bytes());
        let leaves: Vec<String> = reader
            .records()
            .map(|record| record.unwrap()[2].to_string())
            .collect();
        assert_eq!(leaves, vec!["strain\t7", "line\nbreak"]);
        assert!(text.contains("\"strain\t7\""));
    }

    #[test]
    fn test_neighbors_file() {
        let neighbors = vec![
            Neighbor {
                name: "L2".to_string(),
                distance: 0.1,
            },
            Neighbor {
                name: "L3".to_string(),
                distance: 0.2,
            },
        ];
        let path = std::env::temp_dir()
            .join(format!("strainchoosr_neighbors_{}", std::process::id()))
            .join("neighbors.tsv");
        let path_str = path.to_string_lossy().to_string();
        write_neighbors(&path_str, OutputFormat::Tsv, "L1", &neighbors, "cmd").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        if let Some(parent) = path.parent() {
            std::fs::remove_dir_all(parent).ok();
        }
        assert!(text.contains("# Reference: L1"));
        assert!(text.contains("1\tL2\t0.1"));
        assert!(text.contains("2\tL3\t0.2"));
    }
}

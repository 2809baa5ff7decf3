// weights.rs - Leaf weights file loader (leafname<TAB>weight)

use crate::error::{ChoosrError, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Parse tab-separated leaf weights from any reader.
///
/// Blank lines are skipped. Every other line must contain exactly two
/// fields, the second a number. A leaf listed twice keeps its last weight.
pub fn parse_weights<R: Read>(reader: R) -> Result<BTreeMap<String, f64>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut weights = BTreeMap::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| ChoosrError::MalformedWeights {
            line: e.position().map_or(index + 1, |p| p.line() as usize),
            message: e.to_string(),
        })?;
        let line = record.position().map_or(index + 1, |p| p.line() as usize);

        let fields: Vec<&str> = record.iter().map(str::trim_end).collect();
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if fields.len() != 2 {
            return Err(ChoosrError::MalformedWeights {
                line,
                message: format!(
                    "expected 'leafname<TAB>weight', found {} field(s) in '{}'",
                    fields.len(),
                    fields.join("\t")
                ),
            });
        }

        let weight: f64 = fields[1]
            .trim()
            .parse()
            .map_err(|_| ChoosrError::MalformedWeights {
                line,
                message: format!("weight '{}' for '{}' is not a number", fields[1], fields[0]),
            })?;
        weights.insert(fields[0].to_string(), weight);
    }

    Ok(weights)
}

/// Read a weights file from disk.
pub fn read_weights_file(path: &Path) -> Result<BTreeMap<String, f64>> {
    let file = std::fs::File::open(path).map_err(|e| ChoosrError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_weights(file)
}

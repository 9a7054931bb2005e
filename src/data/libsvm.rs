//! LibSVM format dataset loader
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Example:
//! +1 1:0.5 3:1.2 7:0.8
//! -1 2:0.3 5:2.1
//!
//! Missing indices are zeros; the input dimension is the largest index seen.

use crate::core::{Result, SVMError, Sample};
use crate::data::Dataset;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One parsed line: target and 0-based `(index, value)` pairs
type SparseLine = (f64, Vec<(usize, f64)>);

/// Loader for LibSVM text files
pub struct LibSvmLoader;

impl LibSvmLoader {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Dataset> {
        let mut lines = Vec::new();
        let mut dimension = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = Self::parse_line(line).map_err(|e| {
                SVMError::ParseError(format!("Error parsing line {}: {e}", line_num + 1))
            })?;
            if let Some(&(max_index, _)) = parsed.1.iter().max_by_key(|(i, _)| *i) {
                dimension = dimension.max(max_index + 1);
            }
            lines.push(parsed);
        }

        if lines.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        let mut inputs = Sample::new(dimension);
        let mut outputs = Sample::new(1);
        let mut row = vec![0.0; dimension];
        for (target, features) in lines {
            row.iter_mut().for_each(|v| *v = 0.0);
            for (index, value) in features {
                row[index] = value;
            }
            inputs.push(&row)?;
            outputs.push(&[target])?;
        }
        Dataset::new(inputs, outputs)
    }

    /// Parse a single line in libsvm format
    fn parse_line(line: &str) -> Result<SparseLine> {
        let mut parts = line.split_whitespace();
        let label_str = parts
            .next()
            .ok_or_else(|| SVMError::ParseError("Empty line".to_string()))?;
        let label = label_str
            .parse::<f64>()
            .map_err(|_| SVMError::ParseError(format!("Invalid label: {label_str}")))?;

        let mut features = Vec::new();
        for feature_str in parts {
            let (index, value) = feature_str.split_once(':').ok_or_else(|| {
                SVMError::ParseError(format!("Invalid feature format: {feature_str}"))
            })?;
            let index = index
                .parse::<usize>()
                .map_err(|_| SVMError::ParseError(format!("Invalid feature index: {index}")))?;
            let value = value
                .parse::<f64>()
                .map_err(|_| SVMError::ParseError(format!("Invalid feature value: {value}")))?;

            // libsvm uses 1-based indexing
            if index == 0 {
                return Err(SVMError::ParseError(
                    "Feature index must be positive: 0".to_string(),
                ));
            }
            features.push((index - 1, value));
        }
        Ok((label, features))
    }
}

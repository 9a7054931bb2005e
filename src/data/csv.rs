//! CSV dataset loader
//!
//! Supports files where:
//! - The last `n` columns are outputs (one column, the label, for classification)
//! - All other columns are inputs
//! - The first row can be headers (automatically detected)
//! - Lines starting with `#` are comments

use crate::core::{Result, SVMError, Sample};
use crate::data::Dataset;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Loader for comma-separated files
#[derive(Debug, Clone, Copy)]
pub struct CsvLoader {
    output_columns: usize,
    auto_detect_header: bool,
}

impl CsvLoader {
    /// Loader treating the last `output_columns` columns as outputs
    pub fn new(output_columns: usize) -> Self {
        Self {
            output_columns,
            auto_detect_header: true,
        }
    }

    pub fn with_header_detection(mut self, enabled: bool) -> Self {
        self.auto_detect_header = enabled;
        self
    }

    pub fn from_file<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let file = File::open(path)?;
        self.from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(&self, reader: R) -> Result<Dataset> {
        if self.output_columns == 0 {
            return Err(SVMError::InvalidParameter(
                "at least one output column is required".to_string(),
            ));
        }

        let mut inputs: Option<Sample> = None;
        let mut outputs = Sample::new(self.output_columns);
        let mut first_content = true;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if first_content {
                first_content = false;
                if self.auto_detect_header && Self::is_header_line(line) {
                    continue;
                }
            }

            let values = Self::parse_data_line(line)
                .map_err(|e| SVMError::ParseError(format!("line {}: {e}", line_num + 1)))?;
            if values.len() <= self.output_columns {
                return Err(SVMError::ParseError(format!(
                    "line {}: {} field(s), need more than {} output column(s)",
                    line_num + 1,
                    values.len(),
                    self.output_columns
                )));
            }

            let split = values.len() - self.output_columns;
            let target = inputs.get_or_insert_with(|| Sample::new(split));
            target.push(&values[..split])?;
            outputs.push(&values[split..])?;
        }

        let inputs = inputs.ok_or(SVMError::EmptyDataset)?;
        Dataset::new(inputs, outputs)
    }

    /// Check if a line appears to be a header
    fn is_header_line(line: &str) -> bool {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 2 {
            return false;
        }
        let non_numeric = fields
            .iter()
            .filter(|field| field.trim().parse::<f64>().is_err())
            .count();
        non_numeric > fields.len() / 2
    }

    fn parse_data_line(line: &str) -> Result<Vec<f64>> {
        line.split(',')
            .enumerate()
            .map(|(idx, field)| {
                let field = field.trim();
                field.parse::<f64>().map_err(|_| {
                    SVMError::ParseError(format!("invalid value at column {}: {field}", idx + 1))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_csv_basic() {
        let data = "1.0,2.0,1\n3.0,4.0,-1\n";
        let dataset = CsvLoader::new(1).from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.inputs.dim(), 2);
        assert_eq!(dataset.inputs.row(1), &[3.0, 4.0]);
        assert_eq!(dataset.labels(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_csv_multiple_outputs() {
        let data = "x,y1,y2\n1.0,2.0,3.0\n4.0,5.0,6.0\n";
        let dataset = CsvLoader::new(2).from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.inputs.dim(), 1);
        assert_eq!(dataset.outputs.dim(), 2);
        assert_eq!(dataset.outputs.row(1), &[5.0, 6.0]);
    }

    #[test]
    fn test_csv_labels_are_kept() {
        let data = "1.0,2.0,0.5\n3.0,4.0,7\n";
        let dataset = CsvLoader::new(1).from_reader(Cursor::new(data)).unwrap();
        assert_eq!(dataset.labels(), vec![0.5, 7.0]);
    }

    #[test]
    fn test_csv_empty_lines_and_comments() {
        let data = "# Comment\nf1,f2,label\n1.0,2.0,1\n\n3.0,4.0,-1\n";
        let dataset = CsvLoader::new(1).from_reader(Cursor::new(data)).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_csv_invalid_format() {
        assert!(CsvLoader::new(1).from_reader(Cursor::new("1.0\n")).is_err());
        assert!(matches!(
            CsvLoader::new(1).from_reader(Cursor::new("1.0,2.0\n1.0,abc\n")),
            Err(SVMError::ParseError(_))
        ));
        assert!(matches!(
            CsvLoader::new(1).from_reader(Cursor::new("1.0,2.0,3.0\n1.0,2.0\n")),
            Err(SVMError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            CsvLoader::new(1).from_reader(Cursor::new("# only a comment\n")),
            Err(SVMError::EmptyDataset)
        ));
    }

    #[test]
    fn test_csv_manual_header_control() {
        let data = "a,b,c\n1.0,2.0,1\n";
        assert!(CsvLoader::new(1)
            .with_header_detection(false)
            .from_reader(Cursor::new(data))
            .is_err());
    }

    #[test]
    fn test_is_header_line() {
        assert!(CsvLoader::is_header_line("feature1,feature2,label"));
        assert!(CsvLoader::is_header_line("x1,x2,x3,y"));
        assert!(!CsvLoader::is_header_line("1.0,2.0,3.0,1"));
        assert!(!CsvLoader::is_header_line("1"));
    }
}

//! Analytics dataset - the static CSV behind the charts
//!
//! Read fresh on every render; nothing is cached.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("{0} not found")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Location of the analytics file
#[derive(Debug, Clone)]
pub struct AnalyticsSource {
    path: PathBuf,
}

impl AnalyticsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used in warnings, e.g. `analytics.csv`
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<AnalyticsDataset, AnalyticsError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AnalyticsError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        AnalyticsDataset::from_reader(file)
    }
}

/// Parsed CSV: header row + string cells
#[derive(Debug, Clone)]
pub struct AnalyticsDataset {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl AnalyticsDataset {
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, AnalyticsError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Non-empty cells of a column, trimmed
    pub fn text_column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .collect(),
        )
    }

    /// Numeric cells of a column; blank or unparseable cells are dropped
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| parse_number(row.get(index)?))
                .collect(),
        )
    }

    /// Rows where both columns hold numbers
    pub fn numeric_pairs(&self, x: &str, y: &str) -> Option<Vec<(f64, f64)>> {
        let xi = self.column_index(x)?;
        let yi = self.column_index(y)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| Some((parse_number(row.get(xi)?)?, parse_number(row.get(yi)?)?)))
                .collect(),
        )
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
marker,R1:F, R1-PM1:V ,R1-PA1:VH
Natural,60.0,131000.5,-10.2
Attack,59.9,,12.5
Attack,,130500.0,x
";

    fn dataset() -> AnalyticsDataset {
        AnalyticsDataset::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_headers_trimmed() {
        let ds = dataset();
        assert_eq!(ds.len(), 3);
        assert!(ds.has_column("R1-PM1:V"));
        assert!(!ds.has_column("R2-PM1:V"));
    }

    #[test]
    fn test_text_column() {
        let ds = dataset();
        assert_eq!(ds.text_column("marker").unwrap(), vec!["Natural", "Attack", "Attack"]);
        assert!(ds.text_column("missing").is_none());
    }

    #[test]
    fn test_numeric_column_skips_blanks() {
        let ds = dataset();
        assert_eq!(ds.numeric_column("R1:F").unwrap(), vec![60.0, 59.9]);
        assert_eq!(ds.numeric_column("R1-PA1:VH").unwrap(), vec![-10.2, 12.5]);
    }

    #[test]
    fn test_numeric_pairs() {
        let ds = dataset();
        let pairs = ds.numeric_pairs("R1-PA1:VH", "R1-PM1:V").unwrap();
        assert_eq!(pairs, vec![(-10.2, 131000.5)]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = AnalyticsSource::new(dir.path().join("analytics.csv"));
        assert!(!source.exists());
        assert!(matches!(source.load(), Err(AnalyticsError::NotFound(_))));
        assert_eq!(source.display_name(), "analytics.csv");
    }

    #[test]
    fn test_load_reads_fresh_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.csv");
        let source = AnalyticsSource::new(&path);

        std::fs::write(&path, "marker\nNatural\n").unwrap();
        assert_eq!(source.load().unwrap().len(), 1);

        std::fs::write(&path, "marker\nNatural\nAttack\n").unwrap();
        assert_eq!(source.load().unwrap().len(), 2);
    }
}

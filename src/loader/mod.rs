//! CSV loader for the dashboard datasets.
//!
//! Turns a CSV file into [`RawRecord`]s. The header must contain every
//! required column; rows missing a required value or carrying an
//! unparseable timestamp are dropped, duplicate rows are flagged.

use crate::error::{PipelineError, Result};
use crate::models::{Dataset, RawRecord};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rows kept for display in [`Dataset::preview`] unless overridden.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Describes how a CSV file should be loaded.
#[derive(Debug, Clone)]
pub struct LoadSpec {
    /// Columns parsed as calendar timestamps. Implicitly required.
    pub timestamp_columns: Vec<String>,
    /// Columns that must be present in the header and non-blank in a row.
    pub required_columns: Vec<String>,
    /// Lower-case headers, replace spaces with `_` and strip parentheses.
    pub normalize_headers: bool,
    /// Kept rows copied into [`Dataset::preview`].
    pub preview_rows: usize,
}

impl Default for LoadSpec {
    fn default() -> Self {
        Self {
            timestamp_columns: Vec::new(),
            required_columns: Vec::new(),
            normalize_headers: false,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl LoadSpec {
    pub fn new(timestamp_columns: &[&str]) -> Self {
        Self {
            timestamp_columns: timestamp_columns.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn required(mut self, columns: &[&str]) -> Self {
        self.required_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn normalized(mut self) -> Self {
        self.normalize_headers = true;
        self
    }

    pub fn preview(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    fn all_required(&self) -> impl Iterator<Item = &String> {
        self.timestamp_columns
            .iter()
            .chain(self.required_columns.iter())
    }
}

/// Normalize a header the way the financial and social datasets expect.
///
/// `"Revenue (IDR)"` becomes `"revenue_idr"`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['(', ')'], "")
}

/// Parse a timestamp cell, accepting date-only and date-time layouts.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Load a CSV file into records.
pub fn load(path: &Path, spec: &LoadSpec) -> Result<Dataset> {
    info!("Loading dataset: {}", path.display());

    let file = File::open(path).map_err(|e| PipelineError::data_load(path, e.to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::data_load(path, format!("unreadable header: {e}")))?
        .clone();

    let columns: Vec<String> = headers
        .iter()
        .map(|h| {
            if spec.normalize_headers {
                normalize_header(h)
            } else {
                h.to_string()
            }
        })
        .collect();

    if columns.iter().all(|c| c.is_empty()) {
        return Err(PipelineError::data_load(path, "file has no header row"));
    }

    let missing: Vec<&str> = spec
        .all_required()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::data_load(
            path,
            format!("missing required column(s): {}", missing.join(", ")),
        ));
    }

    let mut records = Vec::new();
    let mut preview = Vec::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut duplicate_lines = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Quoted cells may span lines; idx + 2 only holds without them.
        let fallback_line = idx + 2;
        rows_read += 1;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                let line = e.position().map_or(fallback_line, |p| p.line() as usize);
                debug!("Line {}: dropping unparseable row: {}", line, e);
                rows_dropped += 1;
                continue;
            }
        };
        let line = row.position().map_or(fallback_line, |p| p.line() as usize);

        let cells: Vec<String> = row.iter().map(str::to_string).collect();

        if !seen.insert(cells.clone()) {
            duplicate_lines.push(line);
        }

        match build_record(line, &columns, &cells, spec) {
            Some(record) => {
                if preview.len() < spec.preview_rows {
                    preview.push(cells);
                }
                records.push(record);
            }
            None => {
                debug!("Line {}: dropping row with missing required field", line);
                rows_dropped += 1;
            }
        }
    }

    if !duplicate_lines.is_empty() {
        warn!(
            "{}: {} duplicate row(s) flagged at line(s) {:?}",
            path.display(),
            duplicate_lines.len(),
            duplicate_lines
        );
    }

    info!(
        "Loaded {} of {} row(s) from {} ({} dropped)",
        records.len(),
        rows_read,
        path.display(),
        rows_dropped
    );

    Ok(Dataset {
        path: path.to_path_buf(),
        columns,
        records,
        rows_read,
        rows_dropped,
        duplicate_lines,
        preview,
    })
}

/// Build a record from a row, `None` when a required value is missing.
fn build_record(
    line: usize,
    columns: &[String],
    cells: &[String],
    spec: &LoadSpec,
) -> Option<RawRecord> {
    let mut record = RawRecord::new(line);

    for (column, cell) in columns.iter().zip(cells.iter()) {
        record = record.with_field(column.clone(), cell.clone());
    }

    if spec
        .required_columns
        .iter()
        .any(|column| record.text(column).is_none())
    {
        return None;
    }

    for column in &spec.timestamp_columns {
        let value = record.text(column).and_then(parse_timestamp)?;
        record = record.with_timestamp(column.clone(), value);
    }

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Revenue (IDR)"), "revenue_idr");
        assert_eq!(normalize_header(" Post Date "), "post_date");
        assert_eq!(normalize_header("likes"), "likes");
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let jan = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        assert_eq!(parse_timestamp("2023-01-15"), jan.and_hms_opt(0, 0, 0));
        assert_eq!(parse_timestamp("01/15/2023"), jan.and_hms_opt(0, 0, 0));
        assert_eq!(
            parse_timestamp("2023-01-15 14:30:00"),
            jan.and_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_timestamp("2023-01-15T08:05:09"),
            jan.and_hms_opt(8, 5, 9)
        );
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_load_drops_rows_missing_required_fields() {
        let file = write_csv(
            "Order_ID,Price,Quantity,Order_Date\n\
             1,10.0,2,2023-01-05\n\
             2,,1,2023-01-06\n\
             3,5.0,1,\n\
             4,7.5,3,2023-02-01\n",
        );

        let spec = LoadSpec::new(&["Order_Date"]).required(&["Order_ID", "Price"]);
        let dataset = load(file.path(), &spec).unwrap();

        assert_eq!(dataset.rows_read, 4);
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.rows_dropped, 2);
        assert_eq!(dataset.records[0].line, 2);
        assert_eq!(dataset.records[1].number("Quantity"), Some(3.0));
        assert!(dataset.records[1].timestamp("Order_Date").is_some());
    }

    #[test]
    fn test_load_flags_duplicates_without_removing() {
        let file = write_csv(
            "id,amount,date\n\
             1,10,2023-01-01\n\
             1,10,2023-01-01\n\
             2,5,2023-01-02\n",
        );

        let dataset = load(file.path(), &LoadSpec::new(&["date"]).required(&["id"])).unwrap();

        assert_eq!(dataset.records.len(), 3);
        assert_eq!(dataset.duplicate_lines, vec![3]);
    }

    #[test]
    fn test_load_missing_required_column_is_error() {
        let file = write_csv("Order_ID,Price\n1,10\n");

        let spec = LoadSpec::new(&["Order_Date"]).required(&["Order_ID"]);
        let err = load(file.path(), &spec).unwrap_err();

        match err {
            PipelineError::DataLoad { reason, .. } => assert!(reason.contains("Order_Date")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = load(Path::new("/definitely/not/here.csv"), &LoadSpec::default()).unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
    }

    #[test]
    fn test_load_normalizes_headers() {
        let file = write_csv("Date,Revenue (IDR),Expenses\n2023-01-31,100,40\n");

        let spec = LoadSpec::new(&["date"]).required(&["revenue_idr"]).normalized();
        let dataset = load(file.path(), &spec).unwrap();

        assert_eq!(dataset.columns, vec!["date", "revenue_idr", "expenses"]);
        assert_eq!(dataset.records[0].number("revenue_idr"), Some(100.0));
    }

    #[test]
    fn test_preview_keeps_requested_row_count() {
        let mut content = String::from("id,date\n");
        for i in 0..120 {
            content.push_str(&format!("{i},2023-01-01\n"));
        }
        let file = write_csv(&content);

        let dataset = load(file.path(), &LoadSpec::new(&["date"]).preview(100)).unwrap();
        assert_eq!(dataset.preview.len(), 100);
        assert_eq!(dataset.summary(100).preview.len(), 100);

        let dataset = load(file.path(), &LoadSpec::new(&["date"])).unwrap();
        assert_eq!(dataset.preview.len(), DEFAULT_PREVIEW_ROWS);
    }

    #[test]
    fn test_line_numbers_account_for_multiline_cells() {
        let file = write_csv(
            "id,note,date\n\
             1,\"two\nlines\",2023-01-01\n\
             2,plain,2023-01-02\n\
             2,plain,2023-01-02\n",
        );

        let dataset = load(file.path(), &LoadSpec::new(&["date"])).unwrap();

        let lines: Vec<usize> = dataset.records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4, 5]);
        assert_eq!(dataset.duplicate_lines, vec![5]);
    }

    #[test]
    fn test_dataset_summary_limits_preview() {
        let file = write_csv("id,date\n1,2023-01-01\n2,2023-01-02\n3,2023-01-03\n");

        let dataset = load(file.path(), &LoadSpec::new(&["date"])).unwrap();
        let summary = dataset.summary(2);

        assert_eq!(summary.rows_kept, 3);
        assert_eq!(summary.preview.len(), 2);
        assert_eq!(summary.preview[0], vec!["1", "2023-01-01"]);
    }
}

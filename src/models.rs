//! Data models for the dashboard.
//!
//! This module contains the records produced by the loader, the summary
//! tables and fits produced by the analysis layer, and the page and
//! report structures handed to the renderer.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A dashboard page.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    /// Profile page, no dataset
    About,
    /// E-commerce sales analysis
    Ecommerce,
    /// Financial ratio analysis
    Financial,
    /// Social media engagement analysis
    Social,
}

impl Page {
    /// All pages in navigation order.
    pub const ALL: [Page; 4] = [Page::About, Page::Ecommerce, Page::Financial, Page::Social];

    /// Human readable page title.
    pub fn title(&self) -> &'static str {
        match self {
            Page::About => "About Me",
            Page::Ecommerce => "E-commerce Analytics for a Company's Sales Strategy",
            Page::Financial => "Financial Data Analysis",
            Page::Social => "Social Media Analysis",
        }
    }

    /// Markdown anchor for the page section.
    pub fn anchor(&self) -> &'static str {
        match self {
            Page::About => "about-me",
            Page::Ecommerce => "e-commerce-analytics",
            Page::Financial => "financial-data-analysis",
            Page::Social => "social-media-analysis",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::About => write!(f, "about"),
            Page::Ecommerce => write!(f, "ecommerce"),
            Page::Financial => write!(f, "financial"),
            Page::Social => write!(f, "social"),
        }
    }
}

/// A single row of a source dataset that survived loading.
///
/// Field values are kept as trimmed strings; columns declared as
/// timestamps are also available pre-parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-indexed line of the row in the source file.
    pub line: usize,
    fields: BTreeMap<String, String>,
    timestamps: BTreeMap<String, NaiveDateTime>,
}

impl RawRecord {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: BTreeMap::new(),
            timestamps: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, column: impl Into<String>, value: NaiveDateTime) -> Self {
        self.timestamps.insert(column.into(), value);
        self
    }

    /// Returns the field as text, `None` when absent or blank.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Returns the field parsed as a number.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.text(column).and_then(parse_number)
    }

    /// Returns a parsed timestamp column.
    pub fn timestamp(&self, column: &str) -> Option<NaiveDateTime> {
        self.timestamps.get(column).copied()
    }
}

/// Parses a numeric cell, tolerating currency signs and thousands separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Result of loading a CSV file.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// File the records came from.
    pub path: PathBuf,
    /// Column names after optional normalization.
    pub columns: Vec<String>,
    /// Records with every required field present.
    pub records: Vec<RawRecord>,
    /// Data rows read from the file (excluding the header).
    pub rows_read: usize,
    /// Rows excluded for missing or unparseable required fields.
    pub rows_dropped: usize,
    /// Lines of rows identical to an earlier row. Flagged only.
    pub duplicate_lines: Vec<usize>,
    /// Raw cell values of the first rows, for display.
    pub preview: Vec<Vec<String>>,
}

impl Dataset {
    /// Summarize the dataset for the report, keeping at most `preview_rows` rows.
    pub fn summary(&self, preview_rows: usize) -> DatasetSummary {
        DatasetSummary {
            path: self.path.display().to_string(),
            columns: self.columns.clone(),
            rows_read: self.rows_read,
            rows_kept: self.records.len(),
            rows_dropped: self.rows_dropped,
            duplicate_lines: self.duplicate_lines.clone(),
            preview: self.preview.iter().take(preview_rows).cloned().collect(),
        }
    }
}

/// Dataset statistics shown on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub path: String,
    pub columns: Vec<String>,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub duplicate_lines: Vec<usize>,
    pub preview: Vec<Vec<String>>,
}

/// One aggregation bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Key labels, one per key column.
    pub keys: Vec<String>,
    /// Totals, one per value column.
    pub values: Vec<f64>,
}

impl SummaryRow {
    pub fn new(keys: Vec<String>, values: Vec<f64>) -> Self {
        Self { keys, values }
    }

    /// The first key label.
    pub fn label(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or_default()
    }
}

/// A titled, ordered aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub title: String,
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(
        title: impl Into<String>,
        key_columns: &[&str],
        value_columns: &[&str],
        rows: Vec<SummaryRow>,
    ) -> Self {
        Self {
            title: title.into(),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            value_columns: value_columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First-key labels in row order.
    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.label().to_string()).collect()
    }

    /// Values of a named value column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.value_columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.values.get(idx).copied().unwrap_or_default())
                .collect(),
        )
    }

    /// Sum of a named value column.
    pub fn total(&self, name: &str) -> Option<f64> {
        self.column(name).map(|values| values.iter().sum())
    }
}

/// Parameters of an ordinary least-squares fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub slope: f64,
    pub intercept: f64,
    /// Valid x values used by the fit.
    pub xs: Vec<f64>,
    /// Valid y values used by the fit.
    pub ys: Vec<f64>,
    /// Fitted y for each x.
    pub predicted: Vec<f64>,
    /// Coefficient of determination; `None` when every y is identical.
    pub r_squared: Option<f64>,
}

impl FitResult {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Kind of chart to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
}

/// A named sequence of values aligned with the chart categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// A chart description. Drawing is left to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    /// X axis categories (pie slice labels for pie charts).
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl Chart {
    pub fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            x_label: None,
            y_label: None,
            categories: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }

    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn series(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.series.push(Series {
            name: name.into(),
            values,
        });
        self
    }
}

/// A headed bullet list (used by the profile page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletList {
    pub heading: String,
    pub items: Vec<String>,
}

/// Everything computed for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    pub page: Page,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<DatasetSummary>,
    pub tables: Vec<SummaryTable>,
    pub charts: Vec<Chart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitResult>,
    pub lists: Vec<BulletList>,
    /// Interpretive text shown after the tables.
    pub narrative: Vec<String>,
    /// Processing remarks (skipped fits, duplicates, ...).
    pub notes: Vec<String>,
    /// Error message if the page could not be built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageReport {
    /// Creates an empty page report.
    pub fn new(page: Page) -> Self {
        Self {
            page,
            title: page.title().to_string(),
            dataset: None,
            tables: Vec::new(),
            charts: Vec::new(),
            fit: None,
            lists: Vec::new(),
            narrative: Vec::new(),
            notes: Vec::new(),
            error: None,
        }
    }

    /// Creates a failed page result.
    pub fn failed(page: Page, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(page)
        }
    }

    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }
}

/// Metadata about a dashboard run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Directory the datasets were read from.
    pub data_dir: String,
    /// Number of pages rendered successfully.
    pub pages_rendered: usize,
    /// Number of pages that failed.
    pub pages_failed: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub pages: Vec<PageReport>,
}

impl DashboardReport {
    pub fn failed_pages(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|p| !p.is_successful())
    }
}

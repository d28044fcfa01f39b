//! Dashboard pages.
//!
//! Each page loads its dataset, runs the aggregations it needs and returns
//! a [`PageReport`] holding tables, charts and text. Nothing is rendered
//! here.

pub mod about;
pub mod ecommerce;
pub mod financial;
pub mod social;

use crate::analysis::{PERCENTAGE_COLUMN, TOTAL_COLUMN};
use crate::config::Config;
use crate::error::Result;
use crate::loader::LoadSpec;
use crate::models::{Chart, ChartKind, Dataset, Page, PageReport, SummaryTable};
use std::path::PathBuf;
use tracing::info;

/// Build one page from the configured datasets.
pub fn build(page: Page, config: &Config) -> Result<PageReport> {
    info!("Building page: {}", page);

    match page {
        Page::About => Ok(about::build(config)),
        Page::Ecommerce => ecommerce::build(config),
        Page::Financial => financial::build(config),
        Page::Social => social::build(config),
    }
}

/// Dataset path and load settings of a page, `None` for pages without data.
pub fn dataset_for(page: Page, config: &Config) -> Option<(PathBuf, LoadSpec)> {
    let (file_name, spec) = match page {
        Page::About => return None,
        Page::Ecommerce => (&config.datasets.ecommerce, ecommerce::load_spec()),
        Page::Financial => (&config.datasets.financial, financial::load_spec()),
        Page::Social => (&config.datasets.social, social::load_spec()),
    };

    Some((
        config.dataset_path(file_name),
        spec.preview(config.report.preview_rows),
    ))
}

/// Start a page report with the dataset summary filled in.
fn page_with_dataset(page: Page, dataset: &Dataset, config: &Config) -> PageReport {
    let mut report = PageReport::new(page);
    report.dataset = Some(dataset.summary(config.report.preview_rows));

    if dataset.rows_dropped > 0 {
        report.notes.push(format!(
            "{} row(s) with missing required fields were excluded.",
            dataset.rows_dropped
        ));
    }
    if !dataset.duplicate_lines.is_empty() {
        report.notes.push(format!(
            "{} duplicate row(s) detected and kept (lines {}).",
            dataset.duplicate_lines.len(),
            join_lines(&dataset.duplicate_lines)
        ));
    }

    report
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pie chart of a [`categorize`](crate::analysis::categorize) result.
fn distribution_pie(title: &str, table: &SummaryTable) -> Chart {
    Chart::new(ChartKind::Pie, title)
        .categories(table.labels())
        .series(TOTAL_COLUMN, table.column(TOTAL_COLUMN).unwrap_or_default())
}

/// Label with the largest share of a distribution.
fn dominant_label(table: &SummaryTable) -> Option<(String, f64)> {
    let shares = table.column(PERCENTAGE_COLUMN)?;
    table
        .rows
        .first()
        .map(|row| (row.label().to_string(), shares.first().copied().unwrap_or_default()))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryRow;

    #[test]
    fn test_dataset_for_about_has_no_data() {
        let config = Config::default();
        assert!(dataset_for(Page::About, &config).is_none());

        let (path, spec) = dataset_for(Page::Financial, &config).unwrap();
        assert_eq!(path, PathBuf::from("assets/financial_data.csv"));
        assert!(spec.normalize_headers);
        assert_eq!(spec.preview_rows, config.report.preview_rows);
    }

    #[test]
    fn test_build_reports_missing_dataset() {
        let mut config = Config::default();
        config.general.data_dir = PathBuf::from("/definitely/not/here");

        let err = build(Page::Ecommerce, &config).unwrap_err();
        assert!(err.to_string().contains("ecommerce_data.csv"));
    }

    #[test]
    fn test_distribution_pie_and_dominant_label() {
        let table = SummaryTable::new(
            "Payments",
            &["Payment_Method"],
            &[TOTAL_COLUMN, PERCENTAGE_COLUMN],
            vec![
                SummaryRow::new(vec!["Card".into()], vec![3.0, 75.0]),
                SummaryRow::new(vec!["Cash".into()], vec![1.0, 25.0]),
            ],
        );

        let chart = distribution_pie("Distribution", &table);
        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(chart.categories, vec!["Card", "Cash"]);
        assert_eq!(chart.series[0].values, vec![3.0, 1.0]);

        assert_eq!(dominant_label(&table), Some(("Card".to_string(), 75.0)));
    }
}

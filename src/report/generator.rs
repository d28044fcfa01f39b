//! Markdown and JSON report generation.
//!
//! The dashboard is rendered once, after every page has been computed.
//! Charts become Mermaid blocks; scatter plots, which Mermaid cannot draw,
//! become an actual-vs-predicted table.

use crate::models::{
    BulletList, Chart, ChartKind, DashboardReport, DatasetSummary, FitResult, PageReport,
    ReportMetadata, SummaryTable,
};
use anyhow::Result;

/// Markdown rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub include_charts: bool,
    pub include_narrative: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_charts: true,
            include_narrative: true,
        }
    }
}

impl From<&crate::config::ReportConfig> for RenderOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            include_charts: config.include_charts,
            include_narrative: config.include_narrative,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport, options: RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("# Dashfolio Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(&report.pages));

    for page in &report.pages {
        output.push_str(&generate_page_section(page, options));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Data Directory:** `{}`\n", metadata.data_dir));
    section.push_str(&format!(
        "- **Pages Rendered:** {}\n",
        metadata.pages_rendered
    ));
    if metadata.pages_failed > 0 {
        section.push_str(&format!("- **Pages Failed:** {}\n", metadata.pages_failed));
    }
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(pages: &[PageReport]) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    for page in pages {
        let marker = if page.is_successful() { "" } else { " (failed)" };
        toc.push_str(&format!(
            "- [{}](#{}){}\n",
            page.title,
            page.page.anchor(),
            marker
        ));
    }

    toc.push('\n');

    toc
}

/// Generate the section for one page.
fn generate_page_section(page: &PageReport, options: RenderOptions) -> String {
    let mut section = String::new();

    // GitHub ignores `{#id}` heading attributes, so the anchor is an explicit tag.
    section.push_str(&format!("<a id=\"{}\"></a>\n\n", page.page.anchor()));
    section.push_str(&format!("## {}\n\n", page.title));

    if let Some(ref error) = page.error {
        section.push_str(&format!("> ❌ **This page could not be built:** {}\n\n", error));
        section.push_str("---\n\n");
        return section;
    }

    if let Some(ref dataset) = page.dataset {
        section.push_str(&generate_dataset_section(dataset));
    }

    for list in &page.lists {
        section.push_str(&generate_list(list));
    }

    for table in &page.tables {
        section.push_str(&generate_table(table));
    }

    if options.include_charts {
        for chart in &page.charts {
            section.push_str(&generate_chart(chart));
        }
    }

    if let Some(ref fit) = page.fit {
        section.push_str(&generate_fit_section(fit));
    }

    if options.include_narrative && !page.narrative.is_empty() {
        section.push_str("### Insights\n\n");
        for paragraph in &page.narrative {
            section.push_str(paragraph);
            section.push_str("\n\n");
        }
    }

    if !page.notes.is_empty() {
        section.push_str("### Notes\n\n");
        for note in &page.notes {
            section.push_str(&format!("- {}\n", note));
        }
        section.push('\n');
    }

    section.push_str("---\n\n");

    section
}

/// Generate the dataset summary and preview.
fn generate_dataset_section(dataset: &DatasetSummary) -> String {
    let mut section = String::new();

    section.push_str("### Dataset\n\n");
    section.push_str(&format!(
        "*Source: `{}` | Rows read: {} | Rows kept: {} | Dropped: {} | Duplicates: {}*\n\n",
        dataset.path,
        dataset.rows_read,
        dataset.rows_kept,
        dataset.rows_dropped,
        dataset.duplicate_lines.len()
    ));

    if dataset.preview.is_empty() || dataset.columns.is_empty() {
        return section;
    }

    section.push_str(&table_header(&dataset.columns, &[]));
    for row in &dataset.preview {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate a headed bullet list.
fn generate_list(list: &BulletList) -> String {
    let mut section = format!("### {}\n\n", list.heading);
    for item in &list.items {
        section.push_str(&format!("- {}\n", item));
    }
    section.push('\n');
    section
}

fn table_header(key_columns: &[String], value_columns: &[String]) -> String {
    let names: Vec<String> = key_columns
        .iter()
        .chain(value_columns.iter())
        .map(|c| escape_cell(c))
        .collect();
    let align: Vec<&str> = key_columns
        .iter()
        .map(|_| ":---")
        .chain(value_columns.iter().map(|_| "---:"))
        .collect();

    format!("| {} |\n|{}|\n", names.join(" | "), align.join("|"))
}

/// Generate a Markdown table for a summary table.
fn generate_table(table: &SummaryTable) -> String {
    let mut section = String::new();

    if !table.title.is_empty() {
        section.push_str(&format!("### {}\n\n", table.title));
    }

    if table.is_empty() {
        section.push_str("*No rows.*\n\n");
        return section;
    }

    section.push_str(&table_header(&table.key_columns, &table.value_columns));
    for row in &table.rows {
        let cells: Vec<String> = row
            .keys
            .iter()
            .map(|k| escape_cell(k))
            .chain(row.values.iter().map(|v| format_value(*v)))
            .collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate a chart block.
fn generate_chart(chart: &Chart) -> String {
    if chart.categories.is_empty() || chart.series.is_empty() {
        return format!("#### {}\n\n*No data for chart.*\n\n", chart.title);
    }

    match chart.kind {
        ChartKind::Pie => generate_pie(chart),
        ChartKind::Line | ChartKind::Bar => generate_xychart(chart),
        ChartKind::Scatter => generate_scatter(chart),
    }
}

fn generate_pie(chart: &Chart) -> String {
    let mut block = String::from("```mermaid\n");
    block.push_str(&format!("pie title {}\n", mermaid_text(&chart.title)));

    let values = &chart.series[0].values;
    for (label, value) in chart.categories.iter().zip(values) {
        block.push_str(&format!(
            "    \"{}\" : {}\n",
            mermaid_text(label),
            plain_number(*value)
        ));
    }
    block.push_str("```\n\n");

    block
}

fn generate_xychart(chart: &Chart) -> String {
    let mark = match chart.kind {
        ChartKind::Bar => "bar",
        _ => "line",
    };

    let mut block = String::from("```mermaid\nxychart-beta\n");
    block.push_str(&format!("    title \"{}\"\n", mermaid_text(&chart.title)));

    let categories: Vec<String> = chart
        .categories
        .iter()
        .map(|c| format!("\"{}\"", mermaid_text(c)))
        .collect();
    let x_label = chart.x_label.as_deref().unwrap_or_default();
    block.push_str(&format!(
        "    x-axis \"{}\" [{}]\n",
        mermaid_text(x_label),
        categories.join(", ")
    ));
    if let Some(ref y_label) = chart.y_label {
        block.push_str(&format!("    y-axis \"{}\"\n", mermaid_text(y_label)));
    }

    for series in &chart.series {
        let values: Vec<String> = series.values.iter().map(|v| plain_number(*v)).collect();
        block.push_str(&format!("    {} [{}]\n", mark, values.join(", ")));
    }
    block.push_str("```\n\n");

    let legend: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
    if legend.len() > 1 {
        block.push_str(&format!("*Series: {}*\n\n", legend.join(", ")));
    }

    block
}

fn generate_scatter(chart: &Chart) -> String {
    let mut section = format!("#### {}\n\n", chart.title);

    let x_label = chart.x_label.clone().unwrap_or_else(|| "x".to_string());
    let names: Vec<String> = chart.series.iter().map(|s| s.name.clone()).collect();
    section.push_str(&table_header(&[x_label], &names));

    for (i, x) in chart.categories.iter().enumerate() {
        let cells: Vec<String> = std::iter::once(escape_cell(x))
            .chain(
                chart
                    .series
                    .iter()
                    .map(|s| s.values.get(i).map(|v| format_value(*v)).unwrap_or_default()),
            )
            .collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate the linear regression summary.
fn generate_fit_section(fit: &FitResult) -> String {
    let mut section = String::new();

    section.push_str("### Linear Regression Analysis\n\n");
    section.push_str(&format!("- **Slope (β1):** {:.2}\n", fit.slope));
    section.push_str(&format!("- **Intercept (β0):** {:.2}\n", fit.intercept));
    if let Some(r2) = fit.r_squared {
        section.push_str(&format!("- **R²:** {:.4}\n", r2));
    }
    section.push_str(&format!("- **Points:** {}\n\n", fit.xs.len()));

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("*Report generated by Dashfolio*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Format a number for a table cell: thousands separators, two decimals
/// unless the value is whole.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let whole = value.fract() == 0.0;
    let fixed = if whole {
        format!("{:.0}", value.abs())
    } else {
        format!("{:.2}", value.abs())
    };
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Number as Mermaid expects it: no separators.
fn plain_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn mermaid_text(text: &str) -> String {
    text.replace('"', "'")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, SummaryRow};
    use chrono::Utc;

    fn create_test_report() -> DashboardReport {
        let metadata = ReportMetadata {
            generated_at: Utc::now(),
            data_dir: "assets".to_string(),
            pages_rendered: 1,
            pages_failed: 1,
            duration_seconds: 0.25,
        };

        let mut page = PageReport::new(Page::Ecommerce);
        page.dataset = Some(DatasetSummary {
            path: "assets/ecommerce_data.csv".to_string(),
            columns: vec!["Order_ID".to_string(), "Price".to_string()],
            rows_read: 3,
            rows_kept: 2,
            rows_dropped: 1,
            duplicate_lines: vec![],
            preview: vec![vec!["1".to_string(), "10".to_string()]],
        });
        page.tables.push(SummaryTable::new(
            "Delivery Delay Analysis",
            &["Delay_Category"],
            &["Total", "Percentage"],
            vec![
                SummaryRow::new(vec!["4+ Days Late".into()], vec![3.0, 75.0]),
                SummaryRow::new(vec!["On Time or Early".into()], vec![1.0, 25.0]),
            ],
        ));
        page.charts.push(
            Chart::new(ChartKind::Pie, "Delivery Delay Distribution")
                .categories(vec!["4+ Days Late".into(), "On Time or Early".into()])
                .series("Total", vec![3.0, 1.0]),
        );
        page.charts.push(
            Chart::new(ChartKind::Line, "Sales trends every month")
                .axes("Month", "Total Sales")
                .categories(vec!["2023-01".into(), "2023-02".into()])
                .series("Total Sales", vec![1200.5, 980.0]),
        );
        page.narrative.push("Sales dipped in February.".to_string());

        DashboardReport {
            metadata,
            pages: vec![
                page,
                PageReport::failed(Page::Financial, "failed to load financial_data.csv".into()),
            ],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, RenderOptions::default());

        assert!(markdown.contains("# Dashfolio Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Pages Failed:** 1"));
        assert!(markdown.contains("(failed)"));
        assert!(markdown.contains("### Delivery Delay Analysis"));
        assert!(markdown.contains("| 4+ Days Late | 3 | 75 |"));
        assert!(markdown.contains("pie title Delivery Delay Distribution"));
        assert!(markdown.contains("    \"4+ Days Late\" : 3"));
        assert!(markdown.contains("xychart-beta"));
        assert!(markdown.contains("    line [1200.50, 980]"));
        assert!(markdown.contains("Sales dipped in February."));
        assert!(markdown.contains("could not be built"));

        assert!(markdown.contains(
            "<a id=\"e-commerce-analytics\"></a>\n\n## E-commerce Analytics for a Company's Sales Strategy\n\n"
        ));
        assert!(markdown.contains(
            "- [E-commerce Analytics for a Company's Sales Strategy](#e-commerce-analytics)\n"
        ));
        assert!(markdown.contains("<a id=\"financial-data-analysis\"></a>\n\n## Financial Data Analysis\n\n"));
        assert!(!markdown.contains("{#"));
    }

    #[test]
    fn test_render_options_hide_charts_and_narrative() {
        let report = create_test_report();
        let options = RenderOptions {
            include_charts: false,
            include_narrative: false,
        };
        let markdown = generate_markdown_report(&report, options);

        assert!(!markdown.contains("```mermaid"));
        assert!(!markdown.contains("### Insights"));
        assert!(markdown.contains("### Delivery Delay Analysis"));
    }

    #[test]
    fn test_generate_scatter_table() {
        let chart = Chart::new(ChartKind::Scatter, "Revenue against Expenses")
            .axes("Expenses", "Revenue")
            .categories(vec!["100.00".into(), "200.00".into()])
            .series("Actual Data", vec![210.0, 390.0])
            .series("Regression Line", vec![200.0, 400.0]);

        let block = generate_chart(&chart);

        assert!(block.contains("| Expenses | Actual Data | Regression Line |"));
        assert!(block.contains("| 100.00 | 210 | 200 |"));
    }

    #[test]
    fn test_empty_chart_placeholder() {
        let chart = Chart::new(ChartKind::Line, "Nothing");
        assert!(generate_chart(&chart).contains("No data for chart"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(1234567.0), "1,234,567");
        assert_eq!(format_value(-1234.5), "-1,234.50");
        assert_eq!(format_value(33.333), "33.33");
        assert_eq!(format_value(999.999), "1,000.00");
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"generated_at\""));
        assert!(json.contains("\"pages\""));
        assert!(json.contains("\"kind\": \"pie\""));
        assert!(json.contains("\"page\": \"financial\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["pages"][0]["tables"][0]["rows"][0]["values"][1], 75.0);
    }
}

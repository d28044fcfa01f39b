//! E-commerce sales page.
//!
//! Monthly sales trend, delivery delay distribution and payment method
//! distribution over the orders dataset.

use super::{distribution_pie, dominant_label, page_with_dataset};
use crate::analysis::{
    by_column, categorize, delay_classifier, group_by_period, Measure, MeasureExpr, PeriodLabel,
    PeriodSpec,
};
use crate::config::Config;
use crate::error::Result;
use crate::loader::{self, LoadSpec};
use crate::models::{Chart, ChartKind, Dataset, Page, PageReport};

const ORDER_DATE: &str = "Order_Date";
const DELIVERY_DATE: &str = "Delivery_Date";
const PAYMENT_METHOD: &str = "Payment_Method";
const SALES_COLUMN: &str = "sales_every_month";

pub fn load_spec() -> LoadSpec {
    LoadSpec::new(&[ORDER_DATE, DELIVERY_DATE]).required(&[
        "Order_ID",
        "Customer_ID",
        "Price",
        "Product_ID",
        "Product_Name",
    ])
}

pub fn build(config: &Config) -> Result<PageReport> {
    let path = config.dataset_path(&config.datasets.ecommerce);
    let dataset = loader::load(&path, &load_spec().preview(config.report.preview_rows))?;
    Ok(analyze(&dataset, config))
}

pub fn analyze(dataset: &Dataset, config: &Config) -> PageReport {
    let mut report = page_with_dataset(Page::Ecommerce, dataset, config);
    let records = &dataset.records;

    let monthly = group_by_period(
        records,
        &PeriodSpec::monthly(ORDER_DATE, "month", PeriodLabel::Numeric),
        &[Measure::new(
            SALES_COLUMN,
            MeasureExpr::product(&["Quantity", "Price"]),
        )],
    )
    .with_title("Sales trends every month");

    let delays = categorize(
        records,
        "Delay_Category",
        delay_classifier(ORDER_DATE, DELIVERY_DATE),
    )
    .with_title("Delivery Delay Analysis");

    let payments =
        categorize(records, PAYMENT_METHOD, by_column(PAYMENT_METHOD)).with_title("Payment Method Analysis");

    report.charts.push(
        Chart::new(ChartKind::Line, "Sales trends every month")
            .axes("Month", "Total Sales")
            .categories(monthly.labels())
            .series(
                "Total Sales",
                monthly.column(SALES_COLUMN).unwrap_or_default(),
            ),
    );
    report
        .charts
        .push(distribution_pie("Delivery Delay Distribution", &delays));

    report.narrative.push(format!(
        "Orders over {} month(s) add up to {:.2} in sales. The monthly trend shows \
         whether sales are growing or shrinking, and lets the company look for the \
         months where sales fell.",
        monthly.rows.len(),
        monthly.total(SALES_COLUMN).unwrap_or_default()
    ));
    if let Some((label, share)) = dominant_label(&delays) {
        report.narrative.push(format!(
            "The most common delivery outcome is \"{label}\" at {share:.2}% of orders. \
             Long waits between ordering and delivery are a likely contributor to \
             declining sales."
        ));
    }

    if payments.is_empty() {
        report
            .notes
            .push(format!("No {PAYMENT_METHOD} values found; payment analysis skipped."));
    } else {
        report
            .charts
            .push(distribution_pie("Distribution of Payment Methods", &payments));
        if let Some((label, share)) = dominant_label(&payments) {
            report.narrative.push(format!(
                "{label} is the most used payment method ({share:.2}% of orders). \
                 Offering several payment methods makes buying easier for customers \
                 who do not pay in cash."
            ));
        }
    }

    report.tables.push(monthly);
    report.tables.push(delays);
    if !payments.is_empty() {
        report.tables.push(payments);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{PERCENTAGE_COLUMN, TOTAL_COLUMN};
    use crate::pages::test_support::bundled_config;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Order_ID,Customer_ID,Product_ID,Product_Name,Price,Quantity,Order_Date,Delivery_Date,Payment_Method\n";

    fn load_csv(body: &str) -> Dataset {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        loader::load(file.path(), &load_spec()).unwrap()
    }

    #[test]
    fn test_analyze_small_dataset() {
        let dataset = load_csv(
            "1,C1,P1,Lamp,10,2,2023-12-30,2023-12-30,Credit Card\n\
             2,C2,P2,Desk,100,1,2023-12-31,2024-01-01,Cash\n\
             3,C1,P3,Chair,50,2,2024-01-02,2024-01-05,Credit Card\n\
             4,C3,P1,Lamp,10,1,2024-01-03,2024-01-10,Credit Card\n\
             5,,P1,Lamp,10,1,2024-01-03,2024-01-10,Cash\n",
        );
        let report = analyze(&dataset, &Config::default());

        let monthly = &report.tables[0];
        assert_eq!(monthly.labels(), vec!["2023-12", "2024-01"]);
        assert_eq!(monthly.column(SALES_COLUMN), Some(vec![120.0, 110.0]));

        let delays = &report.tables[1];
        assert_eq!(delays.total(TOTAL_COLUMN), Some(4.0));
        assert_eq!(delays.total(PERCENTAGE_COLUMN), Some(100.0));

        let payments = &report.tables[2];
        assert_eq!(payments.labels(), vec!["Credit Card", "Cash"]);
        assert_eq!(payments.column(PERCENTAGE_COLUMN), Some(vec![75.0, 25.0]));

        assert_eq!(report.charts.len(), 3);
        assert!(report.notes.iter().any(|n| n.contains("1 row(s)")));
    }

    #[test]
    fn test_missing_payment_column_skips_payment_analysis() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"Order_ID,Customer_ID,Product_ID,Product_Name,Price,Quantity,Order_Date,Delivery_Date\n\
              1,C1,P1,Lamp,10,2,2023-01-01,2023-01-02\n",
        )
        .unwrap();
        let dataset = loader::load(file.path(), &load_spec()).unwrap();

        let report = analyze(&dataset, &Config::default());

        assert_eq!(report.tables.len(), 2);
        assert!(report.notes.iter().any(|n| n.contains("payment analysis skipped")));
    }

    #[test]
    fn test_build_from_bundled_dataset() {
        let report = build(&bundled_config()).unwrap();

        assert!(report.is_successful());
        let dataset = report.dataset.as_ref().unwrap();
        assert!(dataset.rows_kept > 0);
        assert_eq!(dataset.duplicate_lines.len(), 1);

        let monthly = &report.tables[0];
        let mut sorted = monthly.labels();
        sorted.sort();
        assert_eq!(monthly.labels(), sorted);
    }

    #[test]
    fn test_preview_rows_beyond_fifty() {
        let mut config = bundled_config();
        config.report.preview_rows = 80;

        let report = build(&config).unwrap();

        assert_eq!(report.dataset.as_ref().unwrap().preview.len(), 80);
    }
}

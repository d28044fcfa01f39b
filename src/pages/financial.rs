//! Financial ratio page.
//!
//! Monthly revenue, expenses and profit, and a linear fit of revenue
//! against expenses.

use super::page_with_dataset;
use crate::analysis::{fit_linear_values, group_by_period, Measure, MeasureExpr, PeriodLabel, PeriodSpec};
use crate::config::Config;
use crate::error::Result;
use crate::loader::{self, LoadSpec};
use crate::models::{Chart, ChartKind, Dataset, Page, PageReport, SummaryTable};
use tracing::{debug, warn};

const DATE: &str = "date";
const REVENUE: &str = "total_revenue";
const EXPENSES: &str = "total_expenses";
const PROFIT: &str = "total_profit";

pub fn load_spec() -> LoadSpec {
    LoadSpec::new(&[DATE])
        .required(&["revenue", "expenses", "profit"])
        .normalized()
}

pub fn build(config: &Config) -> Result<PageReport> {
    let path = config.dataset_path(&config.datasets.financial);
    let dataset = loader::load(&path, &load_spec().preview(config.report.preview_rows))?;
    Ok(analyze(&dataset, config))
}

/// Monthly revenue, expenses and profit.
pub fn monthly_comparison(dataset: &Dataset) -> SummaryTable {
    group_by_period(
        &dataset.records,
        &PeriodSpec::monthly(DATE, "month_year", PeriodLabel::ShortMonth),
        &[
            Measure::new(REVENUE, MeasureExpr::column("revenue")),
            Measure::new(EXPENSES, MeasureExpr::column("expenses")),
            Measure::new(PROFIT, MeasureExpr::column("profit")),
        ],
    )
    .with_title("Comparison between Revenue, Expenses and Profit every month")
}

pub fn analyze(dataset: &Dataset, config: &Config) -> PageReport {
    let mut report = page_with_dataset(Page::Financial, dataset, config);
    let monthly = monthly_comparison(dataset);

    let revenue = monthly.column(REVENUE).unwrap_or_default();
    let expenses = monthly.column(EXPENSES).unwrap_or_default();
    let profit = monthly.column(PROFIT).unwrap_or_default();

    report.charts.push(
        Chart::new(
            ChartKind::Bar,
            "Comparison Between Revenue, Expenses and Profit Every Month",
        )
        .axes("Month", "Amount")
        .categories(monthly.labels())
        .series("Total Revenue", revenue.clone())
        .series("Total Expenses", expenses.clone())
        .series("Total Profit", profit),
    );
    report.charts.push(
        Chart::new(ChartKind::Bar, "Revenue and Expenses by Month")
            .axes("Month", "Amount")
            .categories(monthly.labels())
            .series("Total Revenue", revenue.clone())
            .series("Total Expenses", expenses.clone()),
    );

    report.narrative.push(
        "The monthly comparison shows where revenue, expenses and profit rose or \
         fell over the year, and serves as a reference for evaluating the ups and \
         downs of each month."
            .to_string(),
    );

    match fit_linear_values(&expenses, &revenue) {
        Ok(fit) => {
            debug!(
                "Revenue ~ expenses fit: slope={} intercept={}",
                fit.slope, fit.intercept
            );

            let categories = fit.xs.iter().map(|x| format!("{x:.2}")).collect();
            report.charts.push(
                Chart::new(ChartKind::Scatter, "Revenue against Expenses")
                    .axes("Expenses", "Revenue")
                    .categories(categories)
                    .series("Actual Data", fit.ys.clone())
                    .series("Regression Line", fit.predicted.clone()),
            );

            let direction = if fit.slope >= 0.0 { "increases" } else { "decreases" };
            report.narrative.push(format!(
                "Linear regression of monthly revenue on expenses gives a slope (β1) of \
                 {:.2} and an intercept (β0) of {:.2}: every additional unit of expenses \
                 {} revenue by about {:.2} units, and with zero expenses revenue is \
                 predicted at {:.2}.",
                fit.slope,
                fit.intercept,
                direction,
                fit.slope.abs(),
                fit.predict(0.0)
            ));
            if fit.slope > 1.0 {
                report.narrative.push(
                    "Revenue grows faster than expenses, so the business is profitable \
                     and the model can project income from planned expenses."
                        .to_string(),
                );
            }

            report.fit = Some(fit);
        }
        Err(e) => {
            warn!("Skipping revenue/expenses regression: {}", e);
            report
                .notes
                .push(format!("Linear regression skipped: {e}"));
        }
    }

    report.tables.push(monthly);
    report
}

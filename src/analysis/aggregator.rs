//! Record aggregation and statistics.
//!
//! Typed replacements for the GROUP BY queries the dashboard needs:
//! per-period totals and labelled distributions.

use crate::models::{RawRecord, SummaryRow, SummaryTable};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Bucket size for [`group_by_period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Month,
}

/// A calendar period. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Truncate a timestamp to the given granularity.
    pub fn truncate(ts: NaiveDateTime, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Month => Self {
                year: ts.year(),
                month: ts.month(),
            },
        }
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Format the period with the given label style.
    pub fn label(&self, style: PeriodLabel) -> String {
        let fmt = match style {
            PeriodLabel::Numeric => "%Y-%m",
            PeriodLabel::ShortMonth => "%b %Y",
            PeriodLabel::LongMonth => "%Y %B",
        };
        match self.first_day() {
            Some(day) => day.format(fmt).to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

/// How period buckets are labelled in the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodLabel {
    /// `2023-01`
    #[default]
    Numeric,
    /// `Jan 2023`
    ShortMonth,
    /// `2023 January`
    LongMonth,
}

/// A numeric expression over a record's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureExpr {
    /// Value of a single column.
    Column(String),
    /// Product of several columns (`Quantity * Price`).
    Product(Vec<String>),
    /// Sum of several columns (`likes + comments + shares`).
    Sum(Vec<String>),
}

impl MeasureExpr {
    pub fn column(name: &str) -> Self {
        MeasureExpr::Column(name.to_string())
    }

    pub fn product(columns: &[&str]) -> Self {
        MeasureExpr::Product(columns.iter().map(|c| c.to_string()).collect())
    }

    pub fn sum(columns: &[&str]) -> Self {
        MeasureExpr::Sum(columns.iter().map(|c| c.to_string()).collect())
    }

    /// Evaluate against a record. `None` if any operand is missing.
    pub fn eval(&self, record: &RawRecord) -> Option<f64> {
        match self {
            MeasureExpr::Column(c) => record.number(c),
            MeasureExpr::Product(cols) => cols
                .iter()
                .try_fold(1.0, |acc, c| record.number(c).map(|v| acc * v)),
            MeasureExpr::Sum(cols) => cols
                .iter()
                .try_fold(0.0, |acc, c| record.number(c).map(|v| acc + v)),
        }
    }
}

/// A measure together with its output column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    pub name: String,
    pub expr: MeasureExpr,
}

impl Measure {
    pub fn new(name: &str, expr: MeasureExpr) -> Self {
        Self {
            name: name.to_string(),
            expr,
        }
    }
}

/// Where the period of a record comes from and how it is labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSpec {
    pub column: String,
    pub granularity: Granularity,
    pub label: PeriodLabel,
    /// Output key column name.
    pub key_column: String,
}

impl PeriodSpec {
    pub fn monthly(column: &str, key_column: &str, label: PeriodLabel) -> Self {
        Self {
            column: column.to_string(),
            granularity: Granularity::Month,
            label,
            key_column: key_column.to_string(),
        }
    }
}

/// Sum each measure per period, ordered chronologically.
///
/// A record without a timestamp is skipped entirely; a record whose measure
/// cannot be evaluated contributes nothing to that measure's total.
pub fn group_by_period(
    records: &[RawRecord],
    period: &PeriodSpec,
    measures: &[Measure],
) -> SummaryTable {
    let mut buckets: BTreeMap<Period, Vec<f64>> = BTreeMap::new();

    for record in records {
        let Some(ts) = record.timestamp(&period.column) else {
            continue;
        };
        let totals = buckets
            .entry(Period::truncate(ts, period.granularity))
            .or_insert_with(|| vec![0.0; measures.len()]);

        for (total, measure) in totals.iter_mut().zip(measures) {
            if let Some(value) = measure.expr.eval(record) {
                *total += value;
            }
        }
    }

    let rows = buckets
        .into_iter()
        .map(|(p, totals)| SummaryRow::new(vec![p.label(period.label)], totals))
        .collect();

    SummaryTable {
        title: String::new(),
        key_columns: vec![period.key_column.clone()],
        value_columns: measures.iter().map(|m| m.name.clone()).collect(),
        rows,
    }
}

/// Value column names produced by [`categorize`].
pub const TOTAL_COLUMN: &str = "Total";
pub const PERCENTAGE_COLUMN: &str = "Percentage";

/// Count records per label and express each count as a share of the
/// labelled records.
///
/// Records the classifier leaves unlabelled are excluded from counts and
/// from the denominator, so percentages sum to 100 within rounding.
/// Ordered by descending percentage, then label.
pub fn categorize<F>(records: &[RawRecord], key_column: &str, classifier: F) -> SummaryTable
where
    F: Fn(&RawRecord) -> Option<String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut classified = 0usize;

    for record in records {
        if let Some(label) = classifier(record) {
            *counts.entry(label).or_default() += 1;
            classified += 1;
        }
    }

    let mut rows: Vec<SummaryRow> = counts
        .into_iter()
        .map(|(label, count)| {
            let pct = round2(count as f64 * 100.0 / classified as f64);
            SummaryRow::new(vec![label], vec![count as f64, pct])
        })
        .collect();

    rows.sort_by(|a, b| {
        b.values[1]
            .partial_cmp(&a.values[1])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.values[0].partial_cmp(&a.values[0]).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.label().cmp(b.label()))
    });

    SummaryTable {
        title: String::new(),
        key_columns: vec![key_column.to_string()],
        value_columns: vec![TOTAL_COLUMN.to_string(), PERCENTAGE_COLUMN.to_string()],
        rows,
    }
}

/// Classifier that labels a record by the value of a column.
pub fn by_column(column: &str) -> impl Fn(&RawRecord) -> Option<String> + '_ {
    move |record| record.text(column).map(str::to_string)
}

/// Delivery delay bucket, by whole days between order and delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayCategory {
    OnTimeOrEarly,
    OneDayLate,
    TwoToThreeDaysLate,
    FourPlusDaysLate,
}

impl DelayCategory {
    /// Classify a day count. A delivery dated before its order counts as
    /// early here; an equality-only bucket would leave such rows unlabelled
    /// and drop them from the percentage denominator instead.
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= 0 => DelayCategory::OnTimeOrEarly,
            1 => DelayCategory::OneDayLate,
            2..=3 => DelayCategory::TwoToThreeDaysLate,
            _ => DelayCategory::FourPlusDaysLate,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DelayCategory::OnTimeOrEarly => "On Time or Early",
            DelayCategory::OneDayLate => "1 Day Late",
            DelayCategory::TwoToThreeDaysLate => "2-3 Days Late",
            DelayCategory::FourPlusDaysLate => "4+ Days Late",
        }
    }
}

impl fmt::Display for DelayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifier for the delay between two timestamp columns.
///
/// Only calendar dates count; time of day is ignored.
pub fn delay_classifier<'a>(
    ordered: &'a str,
    delivered: &'a str,
) -> impl Fn(&RawRecord) -> Option<String> + 'a {
    move |record| {
        let start = record.timestamp(ordered)?.date();
        let end = record.timestamp(delivered)?.date();
        Some(DelayCategory::from_days((end - start).num_days()).to_string())
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Social media engagement page.

use super::page_with_dataset;
use crate::analysis::{
    group_by_period, hourly_activity, interactions_by_user_month, top_users, users_by_month,
    EngagementColumns, Measure, PeriodLabel, PeriodSpec,
};
use crate::config::Config;
use crate::error::Result;
use crate::loader::{self, LoadSpec};
use crate::models::{Chart, ChartKind, Dataset, Page, PageReport, RawRecord, SummaryTable};
use chrono::Datelike;
use std::collections::HashMap;

pub fn load_spec() -> LoadSpec {
    let cols = EngagementColumns::default();
    LoadSpec::new(&[cols.posted_at.as_str()])
        .required(&[cols.user.as_str(), cols.platform.as_str()])
        .normalized()
}

pub fn build(config: &Config) -> Result<PageReport> {
    let path = config.dataset_path(&config.datasets.social);
    let dataset = loader::load(&path, &load_spec().preview(config.report.preview_rows))?;
    Ok(analyze(&dataset, config))
}

/// Interactions per month for each platform, aligned to `months`.
fn platform_interactions(
    records: &[RawRecord],
    cols: &EngagementColumns,
    year: i32,
    platform: &str,
    months: &[String],
) -> Vec<f64> {
    let on_platform: Vec<RawRecord> = records
        .iter()
        .filter(|r| r.text(&cols.platform) == Some(platform))
        .filter(|r| r.timestamp(&cols.posted_at).map(|t| t.year()) == Some(year))
        .cloned()
        .collect();

    let table = group_by_period(
        &on_platform,
        &PeriodSpec::monthly(&cols.posted_at, "date", PeriodLabel::LongMonth),
        &[Measure::new("interactions", cols.interactions.clone())],
    );
    let by_month: HashMap<String, f64> = table
        .rows
        .into_iter()
        .map(|row| (row.label().to_string(), row.values[0]))
        .collect();

    months
        .iter()
        .map(|m| by_month.get(m).copied().unwrap_or_default())
        .collect()
}

fn platform_lines(
    title: &str,
    x_label: &str,
    y_label: &str,
    table: &SummaryTable,
    platforms: &[String],
    column_for: impl Fn(&str) -> String,
) -> Chart {
    platforms.iter().fold(
        Chart::new(ChartKind::Line, title)
            .axes(x_label, y_label)
            .categories(table.labels()),
        |chart, platform| {
            let values = table.column(&column_for(platform)).unwrap_or_default();
            chart.series(platform.clone(), values)
        },
    )
}

pub fn analyze(dataset: &Dataset, config: &Config) -> PageReport {
    let mut report = page_with_dataset(Page::Social, dataset, config);
    let cols = EngagementColumns::default();
    let records = &dataset.records;
    let year = config.social.year;
    let platforms = &config.social.platforms;

    let per_user = interactions_by_user_month(records, &cols, year)
        .with_title(format!("Total Interactions and Total Users per Month in {year}"));
    let monthly_users = users_by_month(records, &cols, year, platforms);
    let hourly = hourly_activity(records, &cols, year, platforms);
    let top = top_users(records, &cols, config.social.top_users);

    if monthly_users.is_empty() {
        report
            .notes
            .push(format!("No posts found in {year}; monthly and hourly charts are empty."));
    }

    let months = monthly_users.labels();
    let interactions_chart = platforms.iter().fold(
        Chart::new(ChartKind::Line, "Total Interactions per Month by Platform")
            .axes("Date", "Total Interactions")
            .categories(months.clone()),
        |chart, platform| {
            let values = platform_interactions(records, &cols, year, platform, &months);
            chart.series(platform.clone(), values)
        },
    );
    report.charts.push(interactions_chart);
    report.charts.push(platform_lines(
        &format!("Total Users per Platform per Month ({year})"),
        "Date",
        "Total Users",
        &monthly_users,
        platforms,
        |p| p.to_lowercase(),
    ));
    report.charts.push(platform_lines(
        &format!("Hourly Platform Usage in {year}"),
        "Hour",
        "Total Posts",
        &hourly,
        platforms,
        |p| p.to_string(),
    ));

    report.narrative.push(format!(
        "The tables above show how many users and interactions each platform \
         attracted from January to December {year}. Sharp monthly rises and falls \
         point to the trends that drove engagement, which helps a company plan \
         its marketing strategy."
    ));
    if let Some(peak) = busiest_hour(&hourly) {
        report.narrative.push(format!(
            "Posting activity peaks at {peak}:00, which suggests when advertising \
             is most likely to be seen."
        ));
    }
    if let Some(leader) = top.rows.first() {
        report.narrative.push(format!(
            "{} leads all users with {:.0} interactions on {}, making them a natural \
             influencer candidate for those platforms.",
            leader.keys[0], leader.values[0], leader.keys[1]
        ));
    }

    report.tables.push(per_user);
    report.tables.push(monthly_users);
    report.tables.push(hourly);
    report.tables.push(top);
    report
}

/// Hour with the most distinct users.
fn busiest_hour(hourly: &SummaryTable) -> Option<String> {
    let users = hourly.column("total_users")?;
    hourly
        .rows
        .iter()
        .zip(users)
        .fold(None::<(&str, f64)>, |best, (row, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((row.label(), n)),
        })
        .map(|(label, _)| label.to_string())
}

//! Social media engagement aggregations.
//!
//! Distinct-user and per-platform breakdowns over posts. Interactions are
//! summed the same way as [`group_by_period`](super::group_by_period)
//! totals: a post with a missing count contributes nothing.

use super::aggregator::{MeasureExpr, Period, PeriodLabel};
use crate::models::{RawRecord, SummaryRow, SummaryTable};
use chrono::{Datelike, Timelike};
use std::collections::{BTreeMap, BTreeSet};

/// Column layout of a posts dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementColumns {
    pub user: String,
    pub platform: String,
    pub posted_at: String,
    pub interactions: MeasureExpr,
}

impl Default for EngagementColumns {
    fn default() -> Self {
        Self {
            user: "username".to_string(),
            platform: "platform".to_string(),
            posted_at: "post_date".to_string(),
            interactions: MeasureExpr::sum(&["likes", "comments", "shares"]),
        }
    }
}

/// Running totals for one bucket.
#[derive(Debug, Default)]
struct Bucket {
    users: BTreeSet<String>,
    platforms: BTreeSet<String>,
    interactions: f64,
    posts_by_platform: BTreeMap<String, usize>,
    users_by_platform: BTreeMap<String, BTreeSet<String>>,
}

impl Bucket {
    fn add(&mut self, user: &str, platform: &str, interactions: Option<f64>) {
        self.users.insert(user.to_string());
        self.platforms.insert(platform.to_string());
        self.interactions += interactions.unwrap_or_default();
        *self.posts_by_platform.entry(platform.to_string()).or_default() += 1;
        self.users_by_platform
            .entry(platform.to_string())
            .or_default()
            .insert(user.to_string());
    }

    fn platform_list(&self) -> String {
        self.platforms.iter().cloned().collect::<Vec<_>>().join(",")
    }

    fn distinct_users_on(&self, platform: &str) -> f64 {
        self.users_by_platform
            .get(platform)
            .map(|u| u.len())
            .unwrap_or_default() as f64
    }

    fn posts_on(&self, platform: &str) -> f64 {
        self.posts_by_platform
            .get(platform)
            .copied()
            .unwrap_or_default() as f64
    }
}

/// A post with every field the engagement tables need.
struct Post<'a> {
    user: &'a str,
    platform: &'a str,
    posted_at: chrono::NaiveDateTime,
    interactions: Option<f64>,
}

fn posts<'a>(
    records: &'a [RawRecord],
    cols: &'a EngagementColumns,
    year: Option<i32>,
) -> impl Iterator<Item = Post<'a>> + 'a {
    records.iter().filter_map(move |r| {
        let post = Post {
            user: r.text(&cols.user)?,
            platform: r.text(&cols.platform)?,
            posted_at: r.timestamp(&cols.posted_at)?,
            interactions: cols.interactions.eval(r),
        };
        match year {
            Some(y) if post.posted_at.year() != y => None,
            _ => Some(post),
        }
    })
}

/// Interactions per user per month within `year`, with the platforms the
/// user posted on that month. Ordered by month, then user.
pub fn interactions_by_user_month(
    records: &[RawRecord],
    cols: &EngagementColumns,
    year: i32,
) -> SummaryTable {
    let mut buckets: BTreeMap<(Period, String), Bucket> = BTreeMap::new();

    for post in posts(records, cols, Some(year)) {
        let period = Period::truncate(post.posted_at, super::Granularity::Month);
        buckets
            .entry((period, post.user.to_string()))
            .or_default()
            .add(post.user, post.platform, post.interactions);
    }

    let rows = buckets
        .into_iter()
        .map(|((period, user), bucket)| {
            SummaryRow::new(
                vec![
                    user,
                    period.label(PeriodLabel::LongMonth),
                    bucket.platform_list(),
                ],
                vec![bucket.interactions],
            )
        })
        .collect();

    SummaryTable::new(
        format!("Interactions per user per month ({year})"),
        &["username", "date", "platforms"],
        &["total_interactions"],
        rows,
    )
}

/// Distinct users and interactions per month within `year`, with distinct
/// users per listed platform. Chronological.
pub fn users_by_month(
    records: &[RawRecord],
    cols: &EngagementColumns,
    year: i32,
    platforms: &[String],
) -> SummaryTable {
    let mut buckets: BTreeMap<Period, Bucket> = BTreeMap::new();

    for post in posts(records, cols, Some(year)) {
        buckets
            .entry(Period::truncate(post.posted_at, super::Granularity::Month))
            .or_default()
            .add(post.user, post.platform, post.interactions);
    }

    let rows = buckets
        .into_iter()
        .map(|(period, bucket)| {
            let mut values = vec![bucket.users.len() as f64, bucket.interactions];
            values.extend(platforms.iter().map(|p| bucket.distinct_users_on(p)));
            SummaryRow::new(
                vec![period.label(PeriodLabel::LongMonth), bucket.platform_list()],
                values,
            )
        })
        .collect();

    let mut value_columns = vec!["total_users".to_string(), "total_interactions".to_string()];
    value_columns.extend(platforms.iter().map(|p| p.to_lowercase()));

    SummaryTable {
        title: format!("Users per month ({year})"),
        key_columns: vec!["date".to_string(), "platforms".to_string()],
        value_columns,
        rows,
    }
}

/// Distinct users and post counts per platform for each hour of the day
/// that has posts within `year`.
pub fn hourly_activity(
    records: &[RawRecord],
    cols: &EngagementColumns,
    year: i32,
    platforms: &[String],
) -> SummaryTable {
    let mut buckets: BTreeMap<u32, Bucket> = BTreeMap::new();

    for post in posts(records, cols, Some(year)) {
        buckets
            .entry(post.posted_at.hour())
            .or_default()
            .add(post.user, post.platform, post.interactions);
    }

    let rows = buckets
        .into_iter()
        .map(|(hour, bucket)| {
            let mut values = vec![bucket.users.len() as f64];
            values.extend(platforms.iter().map(|p| bucket.posts_on(p)));
            SummaryRow::new(vec![hour.to_string()], values)
        })
        .collect();

    let mut value_columns = vec!["total_users".to_string()];
    value_columns.extend(platforms.iter().cloned());

    SummaryTable {
        title: format!("Hourly platform usage ({year})"),
        key_columns: vec!["hour".to_string()],
        value_columns,
        rows,
    }
}

/// Users with the most interactions across every post, highest first.
pub fn top_users(records: &[RawRecord], cols: &EngagementColumns, limit: usize) -> SummaryTable {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    for post in posts(records, cols, None) {
        buckets
            .entry(post.user.to_string())
            .or_default()
            .add(post.user, post.platform, post.interactions);
    }

    let mut ranked: Vec<(String, Bucket)> = buckets.into_iter().collect();
    // Stable sort keeps usernames ascending among ties.
    ranked.sort_by(|a, b| {
        b.1.interactions
            .partial_cmp(&a.1.interactions)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(limit);

    let rows = ranked
        .into_iter()
        .map(|(user, bucket)| {
            SummaryRow::new(vec![user, bucket.platform_list()], vec![bucket.interactions])
        })
        .collect();

    SummaryTable::new(
        format!("Top {limit} users by interactions"),
        &["username", "platforms"],
        &["total_interactions"],
        rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn post(line: usize, user: &str, platform: &str, ymd: (i32, u32, u32), hour: u32, likes: u32) -> RawRecord {
        let ts = NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        RawRecord::new(line)
            .with_field("username", user)
            .with_field("platform", platform)
            .with_field("likes", likes.to_string())
            .with_field("comments", "1")
            .with_field("shares", "0")
            .with_timestamp("post_date", ts)
    }

    fn sample() -> Vec<RawRecord> {
        vec![
            post(2, "ana", "Instagram", (2023, 1, 5), 9, 10),
            post(3, "ana", "Twitter", (2023, 1, 20), 9, 4),
            post(4, "ben", "Instagram", (2023, 1, 7), 18, 2),
            post(5, "ben", "Facebook", (2023, 2, 1), 18, 30),
            post(6, "cal", "Twitter", (2022, 12, 31), 9, 100),
        ]
    }

    fn platforms() -> Vec<String> {
        vec!["Facebook".into(), "Instagram".into(), "Twitter".into()]
    }

    #[test]
    fn test_interactions_by_user_month() {
        let table = interactions_by_user_month(&sample(), &EngagementColumns::default(), 2023);

        assert_eq!(table.rows.len(), 3);
        assert_eq!(
            table.rows[0].keys,
            vec!["ana", "2023 January", "Instagram,Twitter"]
        );
        assert_eq!(table.rows[0].values, vec![16.0]);
        assert_eq!(table.rows[1].keys[0], "ben");
        assert_eq!(table.rows[2].keys[1], "2023 February");
    }

    #[test]
    fn test_users_by_month_counts_distinct_users_per_platform() {
        let table = users_by_month(&sample(), &EngagementColumns::default(), 2023, &platforms());

        assert_eq!(table.labels(), vec!["2023 January", "2023 February"]);
        assert_eq!(
            table.value_columns,
            vec!["total_users", "total_interactions", "facebook", "instagram", "twitter"]
        );
        // January: ana twice, ben once; instagram has both users.
        assert_eq!(table.rows[0].values, vec![2.0, 19.0, 0.0, 2.0, 1.0]);
        assert_eq!(table.rows[1].values, vec![1.0, 31.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hourly_activity_excludes_other_years() {
        let table = hourly_activity(&sample(), &EngagementColumns::default(), 2023, &platforms());

        assert_eq!(table.labels(), vec!["9", "18"]);
        assert_eq!(table.rows[0].values, vec![1.0, 0.0, 1.0, 1.0]);
        assert_eq!(table.rows[1].values, vec![1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_top_users_ranks_all_years() {
        let table = top_users(&sample(), &EngagementColumns::default(), 2);

        assert_eq!(table.labels(), vec!["cal", "ben"]);
        assert_eq!(table.column("total_interactions"), Some(vec![101.0, 34.0]));
        assert_eq!(table.rows[1].keys[1], "Facebook,Instagram");
    }
}

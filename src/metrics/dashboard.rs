//! The standard set of repository charts.
//!
//! Every chart is computed over the full collection and then sliced down to the requested
//! period, so the values of a bucket never depend on the period chosen.

use super::builders::{
    close_rate_history, closed_count_history, fraction_history, new_count_history, open_age_quantile_history, open_count_history,
    quantile_history, resolution_duration_quantile_history, total_count_history,
};
use super::quantile::DEFAULT_EPSILON;
use super::{BucketWidth, Maintainers, MetricsError, Period, RecordFilter, ReleaseDownloads, Series, Timeline, start_of_day, top_downloads};
use crate::facts::RepoData;
use chrono::{DateTime, Utc};
use strum::{Display, EnumIter, IntoStaticStr};

const ISSUES: &str = "issues";
const PULL_REQUESTS: &str = "pull_requests";

/// Tunables for [`Dashboard::build`].
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub maintainers: Maintainers,
    pub top_releases: usize,
    pub open_age_quantiles: Vec<f64>,
    pub resolution_quantiles: Vec<f64>,
    pub quantile_epsilon: f64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            maintainers: Maintainers::default(),
            top_releases: 10,
            open_age_quantiles: vec![0.25, 0.5, 0.75],
            resolution_quantiles: vec![0.5, 0.9, 0.99],
            quantile_epsilon: DEFAULT_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ChartKind {
    TotalIssues,
    OpenIssues,
    OpenFraction,
    OpenAge,
    ResolutionDuration,
    NewIssues,
    NewExternalIssues,
    CloseRate,
    OpenExternalIssues,
}

impl ChartKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::TotalIssues => "Total Issues",
            Self::OpenIssues => "Open Issues",
            Self::OpenFraction => "Open Issues Fraction",
            Self::OpenAge => "Open Issue Age",
            Self::ResolutionDuration => "Issue Resolution Duration",
            Self::NewIssues => "New Issues",
            Self::NewExternalIssues => "New External Issues",
            Self::CloseRate => "Close:New Rate",
            Self::OpenExternalIssues => "Open External Issues",
        }
    }

    #[must_use]
    pub const fn y_label(self) -> &'static str {
        match self {
            Self::TotalIssues | Self::OpenIssues | Self::NewIssues | Self::NewExternalIssues | Self::OpenExternalIssues => "count",
            Self::OpenFraction => "fraction",
            Self::OpenAge | Self::ResolutionDuration => "days",
            Self::CloseRate => "log2(closed / new)",
        }
    }

    #[must_use]
    pub const fn width(self) -> BucketWidth {
        match self {
            Self::TotalIssues | Self::OpenIssues | Self::OpenFraction | Self::OpenAge | Self::OpenExternalIssues => BucketWidth::Day,
            Self::NewIssues | Self::NewExternalIssues | Self::CloseRate => BucketWidth::Week,
            Self::ResolutionDuration => BucketWidth::Month,
        }
    }
}

/// One named line of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub name: String,
    pub values: Vec<f64>,
}

/// A chart restricted to the buckets of a period.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub kind: ChartKind,
    pub width: BucketWidth,

    /// Start of the first bucket shown.
    pub first_bucket: DateTime<Utc>,

    pub bucket_starts: Vec<DateTime<Utc>>,
    pub lines: Vec<Line>,
}

impl Chart {
    fn new(kind: ChartKind, timeline: &Timeline, period: &Period, lines: Vec<(String, Series<f64>)>) -> Self {
        let range = period.index_range(timeline);

        Self {
            kind,
            width: timeline.width(),
            first_bucket: timeline.bucket_start(range.start),
            bucket_starts: range.clone().map(|k| timeline.bucket_start(k)).collect(),
            lines: lines
                .into_iter()
                .map(|(name, series)| Line {
                    name,
                    values: series.values()[range.clone()].to_vec(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.into()
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.kind.title()
    }

    #[must_use]
    pub const fn y_label(&self) -> &'static str {
        self.kind.y_label()
    }
}

/// Every chart and the release ranking for one repository and period.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub period: Period,
    pub charts: Vec<Chart>,
    pub top_releases: Vec<ReleaseDownloads>,
}

impl Dashboard {
    pub fn build(data: &RepoData, settings: &DashboardSettings, period: Period) -> Result<Self, MetricsError> {
        let anchor = start_of_day(data.collection_start());
        let end = data.collection_end();
        let timeline = |kind: ChartKind| Timeline::covering(anchor, end, kind.width());

        let issues = data.issues();
        let maintainers = &settings.maintainers;
        let epsilon = settings.quantile_epsilon;
        let mut charts = Vec::new();

        // Daily counts
        let daily = timeline(ChartKind::TotalIssues);
        let total_issues = total_count_history(issues, &daily, RecordFilter::issues())?;
        let total_prs = total_count_history(issues, &daily, RecordFilter::pull_requests())?;
        let open_issues = open_count_history(issues, &daily, RecordFilter::issues())?;
        let open_prs = open_count_history(issues, &daily, RecordFilter::pull_requests())?;
        let open_fraction = fraction_history(&open_issues, &total_issues)?;

        charts.push(Chart::new(
            ChartKind::TotalIssues,
            &daily,
            &period,
            vec![counts(ISSUES, &total_issues), counts(PULL_REQUESTS, &total_prs)],
        ));
        charts.push(Chart::new(
            ChartKind::OpenIssues,
            &daily,
            &period,
            vec![counts(ISSUES, &open_issues), counts(PULL_REQUESTS, &open_prs)],
        ));
        charts.push(Chart::new(
            ChartKind::OpenFraction,
            &daily,
            &period,
            vec![(ISSUES.to_string(), open_fraction)],
        ));

        // Quantiles
        let ages = open_age_quantile_history(issues, &daily, RecordFilter::issues(), &settings.open_age_quantiles, epsilon)?;
        charts.push(Chart::new(
            ChartKind::OpenAge,
            &daily,
            &period,
            quantile_lines(&ages, &settings.open_age_quantiles),
        ));

        let monthly = timeline(ChartKind::ResolutionDuration);
        let durations =
            resolution_duration_quantile_history(issues, &monthly, RecordFilter::issues(), &settings.resolution_quantiles, epsilon)?;
        charts.push(Chart::new(
            ChartKind::ResolutionDuration,
            &monthly,
            &period,
            quantile_lines(&durations, &settings.resolution_quantiles),
        ));

        // Weekly rates
        let weekly = timeline(ChartKind::NewIssues);
        let new_issues = new_count_history(issues, &weekly, RecordFilter::issues())?;
        let new_prs = new_count_history(issues, &weekly, RecordFilter::pull_requests())?;
        let new_external_issues = new_count_history(issues, &weekly, RecordFilter::issues().external(maintainers))?;
        let new_external_prs = new_count_history(issues, &weekly, RecordFilter::pull_requests().external(maintainers))?;
        let closed_issues = closed_count_history(issues, &weekly, RecordFilter::issues())?;
        let closed_prs = closed_count_history(issues, &weekly, RecordFilter::pull_requests())?;

        charts.push(Chart::new(
            ChartKind::NewIssues,
            &weekly,
            &period,
            vec![counts(ISSUES, &new_issues), counts(PULL_REQUESTS, &new_prs)],
        ));
        charts.push(Chart::new(
            ChartKind::NewExternalIssues,
            &weekly,
            &period,
            vec![counts(ISSUES, &new_external_issues), counts(PULL_REQUESTS, &new_external_prs)],
        ));
        charts.push(Chart::new(
            ChartKind::CloseRate,
            &weekly,
            &period,
            vec![
                (ISSUES.to_string(), close_rate_history(&closed_issues, &new_issues)?),
                (PULL_REQUESTS.to_string(), close_rate_history(&closed_prs, &new_prs)?),
            ],
        ));

        // External backlog
        let open_external_issues = open_count_history(issues, &daily, RecordFilter::issues().external(maintainers))?;
        let open_external_prs = open_count_history(issues, &daily, RecordFilter::pull_requests().external(maintainers))?;
        charts.push(Chart::new(
            ChartKind::OpenExternalIssues,
            &daily,
            &period,
            vec![counts(ISSUES, &open_external_issues), counts(PULL_REQUESTS, &open_external_prs)],
        ));

        Ok(Self {
            period,
            charts,
            top_releases: top_downloads(data.releases(), &period, settings.top_releases),
        })
    }

    #[must_use]
    pub fn chart(&self, kind: ChartKind) -> Option<&Chart> {
        self.charts.iter().find(|chart| chart.kind == kind)
    }
}

#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
fn counts(name: &str, series: &Series<u64>) -> (String, Series<f64>) {
    (name.to_string(), series.map(|&count| count as f64))
}

fn quantile_lines(sketches: &Series<super::QuantileSketch>, quantiles: &[f64]) -> Vec<(String, Series<f64>)> {
    quantiles
        .iter()
        .map(|&q| (quantile_label(q), quantile_history(sketches, q)))
        .collect()
}

/// `0.5` becomes `p50`, `0.999` becomes `p99.9`.
fn quantile_label(q: f64) -> String {
    let percent = (q * 100_000.0).round() / 1_000.0;
    format!("p{percent}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{Asset, IssueRecord, ReleaseRecord};
    use chrono::{TimeDelta, TimeZone};
    use strum::IntoEnumIterator;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap() + TimeDelta::days(n)
    }

    fn record(number: u64, created: i64, closed: Option<i64>, pull: bool, author: &str) -> IssueRecord {
        IssueRecord {
            number,
            created_at: day(created),
            closed_at: closed.map(day),
            is_pull_request: pull,
            author_login: author.into(),
        }
    }

    fn sample() -> RepoData {
        let issues = vec![
            record(1, 0, Some(3), false, "alice"),
            record(2, 1, None, false, "mallory"),
            record(3, 2, Some(9), true, "alice"),
            record(4, 8, None, true, "trent"),
            record(5, 20, Some(40), false, "trent"),
        ];
        let releases = vec![
            ReleaseRecord {
                tag_name: "v0.1".into(),
                created_at: day(5),
                assets: vec![Asset { download_count: 4 }],
            },
            ReleaseRecord {
                tag_name: "v0.2".into(),
                created_at: day(30),
                assets: vec![Asset { download_count: 9 }, Asset { download_count: 1 }],
            },
        ];

        RepoData::new(issues, releases, day(45))
    }

    fn settings() -> DashboardSettings {
        DashboardSettings {
            maintainers: ["alice"].into_iter().collect(),
            ..DashboardSettings::default()
        }
    }

    #[test]
    fn test_builds_every_chart() {
        let data = sample();
        let period = Period::new(None, None, data.collection_start(), data.collection_end());
        let dashboard = Dashboard::build(&data, &settings(), period).unwrap();

        let names: Vec<_> = dashboard.charts.iter().map(Chart::name).collect();
        let expected: Vec<String> = ChartKind::iter().map(|kind| kind.to_string()).collect();
        assert_eq!(names, expected);

        for chart in &dashboard.charts {
            assert_eq!(chart.width, chart.kind.width());
            for line in &chart.lines {
                assert_eq!(line.values.len(), chart.bucket_starts.len(), "{}", chart.name());
            }
        }
    }

    #[test]
    fn test_full_period_covers_whole_collection() {
        let data = sample();
        let period = Period::new(None, None, data.collection_start(), data.collection_end());
        let dashboard = Dashboard::build(&data, &settings(), period).unwrap();

        let total = dashboard.chart(ChartKind::TotalIssues).unwrap();
        assert_eq!(total.bucket_starts.len(), 46);
        assert_eq!(total.first_bucket, start_of_day(day(0)));
        assert_eq!(total.lines[0].values.last(), Some(&3.0));
        assert_eq!(total.lines[1].values.last(), Some(&2.0));

        let new = dashboard.chart(ChartKind::NewIssues).unwrap();
        assert_eq!(new.lines[0].values.iter().sum::<f64>(), 3.0);

        let external = dashboard.chart(ChartKind::NewExternalIssues).unwrap();
        assert_eq!(external.lines[0].values.iter().sum::<f64>(), 2.0);
        assert_eq!(external.lines[1].values.iter().sum::<f64>(), 1.0);

        let open_external = dashboard.chart(ChartKind::OpenExternalIssues).unwrap();
        assert_eq!(open_external.lines[0].values.last(), Some(&1.0));

        let age = dashboard.chart(ChartKind::OpenAge).unwrap();
        let labels: Vec<_> = age.lines.iter().map(|line| line.name.as_str()).collect();
        assert_eq!(labels, ["p25", "p50", "p75"]);

        let resolution = dashboard.chart(ChartKind::ResolutionDuration).unwrap();
        assert_eq!(resolution.bucket_starts.len(), 2);
    }

    #[test]
    fn test_period_slices_charts_and_releases() {
        let data = sample();
        let period = Period::new(Some(day(10)), Some(day(20)), data.collection_start(), data.collection_end());
        let dashboard = Dashboard::build(&data, &settings(), period).unwrap();

        let open = dashboard.chart(ChartKind::OpenIssues).unwrap();
        assert_eq!(open.bucket_starts.len(), 10);
        assert_eq!(open.first_bucket, start_of_day(day(10)));
        assert!(open.lines[0].values.iter().all(|v| *v == 1.0));

        assert!(dashboard.top_releases.is_empty());
    }

    #[test]
    fn test_top_releases() {
        let data = sample();
        let period = Period::new(None, None, data.collection_start(), data.collection_end());
        let dashboard = Dashboard::build(&data, &settings(), period).unwrap();

        assert_eq!(
            dashboard.top_releases,
            vec![
                ReleaseDownloads {
                    name: "v0.2".into(),
                    downloads: 10
                },
                ReleaseDownloads {
                    name: "v0.1".into(),
                    downloads: 4
                },
            ]
        );
    }

    #[test]
    fn test_empty_repository() {
        let data = RepoData::new(vec![], vec![], day(0));
        let period = Period::new(None, None, data.collection_start(), data.collection_end());
        let dashboard = Dashboard::build(&data, &DashboardSettings::default(), period).unwrap();

        for chart in &dashboard.charts {
            for line in &chart.lines {
                assert!(line.values.iter().all(|v| *v == 0.0), "{}", chart.name());
            }
        }
    }

    #[test]
    fn test_quantile_label() {
        assert_eq!(quantile_label(0.25), "p25");
        assert_eq!(quantile_label(0.5), "p50");
        assert_eq!(quantile_label(0.99), "p99");
        assert_eq!(quantile_label(0.999), "p99.9");
    }
}

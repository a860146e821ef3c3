use super::client::{Issue, Release};
use super::records::{IssueRecord, ReleaseRecord};
use chrono::{DateTime, Utc};

const LOG_TARGET: &str = " repo_data";

/// Everything known about a repository at one point in time.
///
/// Built once from the fetched data and then only read. Every timestamp is clamped to `now`,
/// so no record lies in the future of the capture.
#[derive(Debug, Clone)]
pub struct RepoData {
    issues: Vec<IssueRecord>,
    releases: Vec<ReleaseRecord>,
    now: DateTime<Utc>,
}

impl RepoData {
    #[must_use]
    pub fn new(mut issues: Vec<IssueRecord>, mut releases: Vec<ReleaseRecord>, now: DateTime<Utc>) -> Self {
        for issue in &mut issues {
            issue.clamp_to(now);
        }

        for release in &mut releases {
            release.clamp_to(now);
        }

        Self { issues, releases, now }
    }

    /// Validates the raw forge records, skipping the ones that lack a required field.
    #[must_use]
    pub fn from_wire(issues: &[Issue], releases: &[Release], now: DateTime<Utc>) -> Self {
        let issues = issues
            .iter()
            .filter_map(|issue| {
                IssueRecord::try_from(issue)
                    .inspect_err(|e| log::warn!(target: LOG_TARGET, "Skipping record: {e}"))
                    .ok()
            })
            .collect();

        let releases = releases
            .iter()
            .filter_map(|release| {
                ReleaseRecord::try_from(release)
                    .inspect_err(|e| log::warn!(target: LOG_TARGET, "Skipping record: {e}"))
                    .ok()
            })
            .collect();

        Self::new(issues, releases, now)
    }

    #[must_use]
    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    #[must_use]
    pub fn releases(&self) -> &[ReleaseRecord] {
        &self.releases
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Creation time of the earliest issue, or `now` when there are none.
    #[must_use]
    pub fn collection_start(&self) -> DateTime<Utc> {
        self.issues.iter().map(|issue| issue.created_at).min().unwrap_or(self.now)
    }

    #[must_use]
    pub const fn collection_end(&self) -> DateTime<Utc> {
        self.now
    }
}

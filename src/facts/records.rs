//! Validated records consumed by the metrics engine.
//!
//! The forge wire types in [`client`](super::client) tolerate missing fields. Converting them
//! into these records is where a missing field becomes a [`MetricsError::MissingRequiredField`].

use super::client::{Issue, Release};
use crate::metrics::MetricsError;
use chrono::{DateTime, Utc};

/// One issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub number: u64,
    pub created_at: DateTime<Utc>,

    /// Present iff the issue has been resolved.
    pub closed_at: Option<DateTime<Utc>>,

    pub is_pull_request: bool,
    pub author_login: String,
}

impl IssueRecord {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Pull timestamps back to `now` and keep the close at or after the creation.
    pub(crate) fn clamp_to(&mut self, now: DateTime<Utc>) {
        self.created_at = self.created_at.min(now);
        self.closed_at = self.closed_at.map(|closed| closed.clamp(self.created_at, now));
    }
}

impl TryFrom<&Issue> for IssueRecord {
    type Error = MetricsError;

    fn try_from(issue: &Issue) -> Result<Self, Self::Error> {
        let record = || format!("issue #{}", issue.number);

        let created_at = issue.created_at.ok_or_else(|| MetricsError::MissingRequiredField {
            record: record(),
            field: "created_at",
        })?;

        let author_login = issue
            .user
            .as_ref()
            .and_then(|user| user.login.clone())
            .ok_or_else(|| MetricsError::MissingRequiredField {
                record: record(),
                field: "user.login",
            })?;

        Ok(Self {
            number: issue.number,
            created_at,
            closed_at: issue.closed_at,
            is_pull_request: issue.pull_request.is_some(),
            author_login,
        })
    }
}

/// Download count of a single release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub download_count: u64,
}

/// One published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Display name used in rankings.
    pub tag_name: String,
    pub created_at: DateTime<Utc>,
    pub assets: Vec<Asset>,
}

impl ReleaseRecord {
    /// Sum of the download counts of every asset.
    #[must_use]
    pub fn downloads(&self) -> u64 {
        self.assets.iter().fold(0, |total, asset| total.saturating_add(asset.download_count))
    }

    pub(crate) fn clamp_to(&mut self, now: DateTime<Utc>) {
        self.created_at = self.created_at.min(now);
    }
}

impl TryFrom<&Release> for ReleaseRecord {
    type Error = MetricsError;

    fn try_from(release: &Release) -> Result<Self, Self::Error> {
        let tag_name = release
            .tag_name
            .clone()
            .or_else(|| release.name.clone())
            .ok_or_else(|| MetricsError::MissingRequiredField {
                record: format!("release {}", release.id),
                field: "tag_name",
            })?;

        let created_at = release.created_at.ok_or_else(|| MetricsError::MissingRequiredField {
            record: format!("release '{tag_name}'"),
            field: "created_at",
        })?;

        Ok(Self {
            tag_name,
            created_at,
            assets: release
                .assets
                .iter()
                .map(|asset| Asset {
                    download_count: asset.download_count,
                })
                .collect(),
        })
    }
}

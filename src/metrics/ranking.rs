use super::Period;
use crate::facts::ReleaseRecord;
use serde::Serialize;

/// Total downloads of one release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDownloads {
    pub name: String,
    pub downloads: u64,
}

/// The `k` most downloaded releases created within `period`, most downloaded first.
///
/// Releases with equal download counts keep their input order.
#[must_use]
pub fn top_downloads(releases: &[ReleaseRecord], period: &Period, k: usize) -> Vec<ReleaseDownloads> {
    let mut ranked: Vec<_> = releases
        .iter()
        .filter(|release| period.contains(release.created_at))
        .map(|release| ReleaseDownloads {
            name: release.tag_name.clone(),
            downloads: release.downloads(),
        })
        .collect();

    ranked.sort_by(|a, b| b.downloads.cmp(&a.downloads));
    ranked.truncate(k);
    ranked
}

//! Fixed-width time buckets.
//!
//! Buckets are fixed durations measured from an anchor timestamp: a day is 24 hours, a week
//! is 7 days, and a month is a flat 30 days. Every bucket of a series has the same width.

use super::MetricsError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Width of a single series bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BucketWidth {
    Day,
    Week,
    Month,
}

impl BucketWidth {
    /// Number of whole days covered by one bucket.
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
        }
    }

    #[must_use]
    pub const fn millis(self) -> i64 {
        self.days() * MILLIS_PER_DAY
    }

    #[must_use]
    pub const fn duration(self) -> TimeDelta {
        TimeDelta::days(self.days())
    }
}

/// Index of the bucket containing `t`, i.e. `floor((t - anchor) / width)`.
///
/// A timestamp sitting exactly on a boundary belongs to the bucket that starts there.
/// Timestamps before the anchor produce negative indices.
#[must_use]
pub fn bucket_index(t: DateTime<Utc>, anchor: DateTime<Utc>, width: BucketWidth) -> i64 {
    (t - anchor).num_milliseconds().div_euclid(width.millis())
}

/// Number of buckets needed to cover `[anchor, end)`, i.e. `ceil((end - anchor) / width)`.
///
/// Zero when `end` is not after `anchor`.
#[must_use]
pub fn bucket_count(anchor: DateTime<Utc>, end: DateTime<Utc>, width: BucketWidth) -> usize {
    let span = (end - anchor).num_milliseconds();
    if span <= 0 {
        return 0;
    }

    let count = (span + width.millis() - 1) / width.millis();
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// Start timestamp of bucket `k`, used to label chart axes.
#[must_use]
pub fn bucket_start(anchor: DateTime<Utc>, k: usize, width: BucketWidth) -> DateTime<Utc> {
    let k = i64::try_from(k).unwrap_or(i64::MAX);
    anchor + TimeDelta::days(k.saturating_mul(width.days()))
}

/// Midnight (UTC) of the day containing `t`.
#[must_use]
pub fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

/// The bucket layout shared by every value of a series.
///
/// `end` is the end of the observed data; the last bucket may extend past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    anchor: DateTime<Utc>,
    end: DateTime<Utc>,
    width: BucketWidth,
    len: usize,
}

impl Timeline {
    #[must_use]
    pub fn new(anchor: DateTime<Utc>, end: DateTime<Utc>, width: BucketWidth) -> Self {
        Self {
            anchor,
            end: end.max(anchor),
            width,
            len: bucket_count(anchor, end, width),
        }
    }

    /// A timeline whose last bucket contains `last`, even when `last` sits on a boundary.
    #[must_use]
    pub fn covering(anchor: DateTime<Utc>, last: DateTime<Utc>, width: BucketWidth) -> Self {
        let len = bucket_index(last, anchor, width).saturating_add(1);
        Self {
            anchor,
            end: last.max(anchor),
            width,
            len: usize::try_from(len).unwrap_or(0),
        }
    }

    #[must_use]
    pub const fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub const fn width(&self) -> BucketWidth {
        self.width
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn bucket_start(&self, k: usize) -> DateTime<Utc> {
        bucket_start(self.anchor, k, self.width)
    }

    /// Bucket containing `t`, failing when `t` falls outside of the series.
    pub fn index_of(&self, t: DateTime<Utc>) -> Result<usize, MetricsError> {
        let index = bucket_index(t, self.anchor, self.width);
        match usize::try_from(index) {
            Ok(i) if i < self.len => Ok(i),
            _ => Err(MetricsError::IndexOutOfRange { index, len: self.len }),
        }
    }

    /// Bucket containing `t`, clamped to `[0, len]`.
    ///
    /// Only suitable for exclusive upper bounds, which are never written.
    #[must_use]
    pub fn clamped_index(&self, t: DateTime<Utc>) -> usize {
        let index = bucket_index(t, self.anchor, self.width);
        usize::try_from(index).map_or(0, |i| i.min(self.len))
    }
}

use super::{Timeline, bucket_index};
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use core::ops::Range;

/// A reporting window within the collected data.
///
/// Both bounds are clamped to the collection bounds when the period is built, and a start
/// after the end collapses the period to an empty window at the start. A period only selects
/// buckets and releases; it never changes a computed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Period {
    /// Builds a period, defaulting a missing bound to the matching collection bound.
    #[must_use]
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        collection_start: DateTime<Utc>,
        collection_end: DateTime<Utc>,
    ) -> Self {
        let collection_end = collection_end.max(collection_start);
        let start = start.unwrap_or(collection_start).clamp(collection_start, collection_end);
        let end = end.unwrap_or(collection_end).clamp(collection_start, collection_end);

        Self {
            start,
            end: end.max(start),
        }
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `t` falls within `[start, end)`.
    #[must_use]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Index range of the buckets of `timeline` touched by this period.
    ///
    /// A non-empty period reaching the end of the timeline's data includes the trailing partial
    /// bucket, so the full collection period always selects every bucket. An empty period
    /// selects nothing.
    #[must_use]
    pub fn index_range(&self, timeline: &Timeline) -> Range<usize> {
        let len = timeline.len();
        let clamp = |index: i64| usize::try_from(index).map_or(0, |i| i.min(len));

        let first = clamp(bucket_index(self.start, timeline.anchor(), timeline.width()));
        if self.is_empty() {
            return first..first;
        }

        let last = if self.end >= timeline.end() {
            len
        } else {
            clamp(bucket_index(self.end, timeline.anchor(), timeline.width()))
        };

        first..last.max(first)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} to {}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{BucketWidth, Series};
    use chrono::{TimeDelta, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::days(n)
    }

    #[test]
    fn test_defaults_to_collection_bounds() {
        let period = Period::new(None, None, day(0), day(10));
        assert_eq!(period.start(), day(0));
        assert_eq!(period.end(), day(10));
    }

    #[test]
    fn test_clamps_to_collection_bounds() {
        let period = Period::new(Some(day(-5)), Some(day(50)), day(0), day(10));
        assert_eq!(period.start(), day(0));
        assert_eq!(period.end(), day(10));
    }

    #[test]
    fn test_inverted_bounds_collapse() {
        let period = Period::new(Some(day(8)), Some(day(2)), day(0), day(10));
        assert!(period.is_empty());
        assert_eq!(period.start(), day(8));
    }

    #[test]
    fn test_contains_is_half_open() {
        let period = Period::new(Some(day(2)), Some(day(4)), day(0), day(10));
        assert!(!period.contains(day(1)));
        assert!(period.contains(day(2)));
        assert!(period.contains(day(4) - TimeDelta::seconds(1)));
        assert!(!period.contains(day(4)));
    }

    #[test]
    fn test_full_period_slice_is_identity() {
        let collection_start = day(0) + TimeDelta::hours(13);
        let collection_end = day(20) + TimeDelta::hours(5);
        let timeline = Timeline::new(crate::metrics::start_of_day(collection_start), collection_end, BucketWidth::Day);

        let mut next = 0_u64;
        let series = Series::from_fn(timeline, || {
            next += 1;
            next
        });

        let period = Period::new(None, None, collection_start, collection_end);
        assert_eq!(series.slice(&period), series.values());

        let weekly = Timeline::new(crate::metrics::start_of_day(collection_start), collection_end, BucketWidth::Week);
        let weekly: Series<u64> = Series::zeroed(weekly);
        assert_eq!(weekly.slice(&period).len(), weekly.len());
    }

    #[test]
    fn test_partial_slice() {
        let timeline = Timeline::new(day(0), day(10), BucketWidth::Day);
        let mut next = 0_u64;
        let series = Series::from_fn(timeline, || {
            let v = next;
            next += 1;
            v
        });

        let period = Period::new(Some(day(3) + TimeDelta::hours(2)), Some(day(6)), day(0), day(10));
        assert_eq!(series.slice(&period), &[3, 4, 5]);
    }

    #[test]
    fn test_empty_period_slice() {
        let timeline = Timeline::new(day(0), day(10), BucketWidth::Day);
        let series: Series<u64> = Series::zeroed(timeline);
        let period = Period::new(Some(day(7)), Some(day(3)), day(0), day(10));
        assert!(series.slice(&period).is_empty());
    }

    #[test]
    fn test_empty_period_at_collection_end_slice() {
        let now = day(10) + TimeDelta::hours(5);
        let timeline = Timeline::covering(day(0), now, BucketWidth::Day);
        let series: Series<u64> = Series::zeroed(timeline);

        let period = Period::new(Some(day(400)), None, day(0), now);
        assert!(period.is_empty());
        assert!(series.slice(&period).is_empty());

        let full = Period::new(None, None, day(0), now);
        assert_eq!(series.slice(&full).len(), timeline.len());
    }

    #[test]
    fn test_display() {
        let period = Period::new(None, None, day(0), day(10));
        assert_eq!(period.to_string(), "2024-01-01 to 2024-01-11");
    }
}

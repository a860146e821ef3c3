//! Metric builders.
//!
//! Every builder walks the records once and returns one value per bucket of the supplied
//! timeline. A record whose creation falls outside of the timeline is an error rather than
//! being dropped, since it means the timeline was sized for a different collection.
//!
//! Ranges follow an exclusive close convention by default: an issue closed during bucket `k`
//! counts as open in the buckets before `k` but not in `k` itself.

use super::{MetricsError, QuantileSketch, RecordFilter, Series, Timeline};
use crate::facts::IssueRecord;
use core::ops::Range;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Where a record's contribution to a range metric stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    /// At the close bucket, or the series end for unresolved records.
    Closed,

    /// Always at the series end, whether or not the record was resolved.
    SeriesEnd,
}

/// Buckets spanned by a record, starting at its creation bucket.
fn record_span(
    record: &IssueRecord,
    timeline: &Timeline,
    end: RangeEnd,
    upper_bound_inclusive: bool,
) -> Result<Range<usize>, MetricsError> {
    let first = timeline.index_of(record.created_at)?;
    let last = match (end, record.closed_at) {
        (RangeEnd::Closed, Some(closed_at)) => {
            let close_index = timeline.clamped_index(closed_at);
            if upper_bound_inclusive {
                (close_index + 1).min(timeline.len())
            } else {
                close_index
            }
        }
        _ => timeline.len(),
    };

    Ok(first..last.max(first))
}

/// Number of matching records created in each bucket.
pub fn new_count_history(
    issues: &[IssueRecord],
    timeline: &Timeline,
    filter: RecordFilter<'_>,
) -> Result<Series<u64>, MetricsError> {
    let mut series = Series::zeroed(*timeline);
    let values = series.values_mut();
    for record in issues.iter().filter(|r| filter.matches(r)) {
        values[timeline.index_of(record.created_at)?] += 1;
    }

    Ok(series)
}

/// Number of matching records closed in each bucket. Unresolved records contribute nothing.
pub fn closed_count_history(
    issues: &[IssueRecord],
    timeline: &Timeline,
    filter: RecordFilter<'_>,
) -> Result<Series<u64>, MetricsError> {
    let mut series = Series::zeroed(*timeline);
    let values = series.values_mut();
    for record in issues.iter().filter(|r| filter.matches(r)) {
        if let Some(closed_at) = record.closed_at {
            values[timeline.index_of(closed_at)?] += 1;
        }
    }

    Ok(series)
}

/// Number of matching records alive in each bucket, from creation to `end`.
///
/// With `upper_bound_inclusive`, a record still counts in the bucket it was closed in.
pub fn range_count_history(
    issues: &[IssueRecord],
    timeline: &Timeline,
    filter: RecordFilter<'_>,
    end: RangeEnd,
    upper_bound_inclusive: bool,
) -> Result<Series<u64>, MetricsError> {
    let mut series = Series::zeroed(*timeline);
    let values = series.values_mut();
    for record in issues.iter().filter(|r| filter.matches(r)) {
        for value in &mut values[record_span(record, timeline, end, upper_bound_inclusive)?] {
            *value += 1;
        }
    }

    Ok(series)
}

/// Number of matching records open in each bucket.
pub fn open_count_history(
    issues: &[IssueRecord],
    timeline: &Timeline,
    filter: RecordFilter<'_>,
) -> Result<Series<u64>, MetricsError> {
    range_count_history(issues, timeline, filter, RangeEnd::Closed, false)
}

/// Number of matching records created so far, in each bucket.
pub fn total_count_history(
    issues: &[IssueRecord],
    timeline: &Timeline,
    filter: RecordFilter<'_>,
) -> Result<Series<u64>, MetricsError> {
    range_count_history(issues, timeline, filter, RangeEnd::SeriesEnd, false)
}

/// Distribution of open-record ages per bucket, in buckets since creation.
///
/// Each bucket `k` in which a record is open receives `k - first`, where `first` is the
/// record's creation bucket.
pub fn open_age_quantile_history(
    issues: &[IssueRecord],
    timeline: &Timeline,
    filter: RecordFilter<'_>,
    quantile_hints: &[f64],
    epsilon: f64,
) -> Result<Series<QuantileSketch>, MetricsError> {
    let mut series = Series::from_fn(*timeline, || QuantileSketch::with_hints(quantile_hints, epsilon));
    let sketches = series.values_mut();
    for record in issues.iter().filter(|r| filter.matches(r)) {
        let span = record_span(record, timeline, RangeEnd::Closed, false)?;
        let first = span.start;
        for k in span {
            sketches[k].insert(bucket_distance(first, k));
        }
    }

    Ok(series)
}

/// Distribution of resolution durations in days, keyed by creation bucket.
///
/// Unresolved records contribute the days elapsed until the timeline end, a lower bound on
/// their eventual resolution time.
pub fn resolution_duration_quantile_history(
    issues: &[IssueRecord],
    timeline: &Timeline,
    filter: RecordFilter<'_>,
    quantile_hints: &[f64],
    epsilon: f64,
) -> Result<Series<QuantileSketch>, MetricsError> {
    let mut series = Series::from_fn(*timeline, || QuantileSketch::with_hints(quantile_hints, epsilon));
    let sketches = series.values_mut();
    for record in issues.iter().filter(|r| filter.matches(r)) {
        let index = timeline.index_of(record.created_at)?;
        let resolved_at = record.closed_at.unwrap_or_else(|| timeline.end());
        sketches[index].insert(elapsed_days(record.created_at, resolved_at));
    }

    Ok(series)
}

/// Reads quantile `q` out of every bucket's sketch.
#[must_use]
pub fn quantile_history(sketches: &Series<QuantileSketch>, q: f64) -> Series<f64> {
    sketches.map(|sketch| sketch.query(q))
}

/// Share of `total` that is `open`, per bucket. Buckets with no records yield 0.
pub fn fraction_history(open: &Series<u64>, total: &Series<u64>) -> Result<Series<f64>, MetricsError> {
    open.zip_with(total, |&open, &total| {
        if total == 0 {
            0.0
        } else {
            as_f64(open) / as_f64(total)
        }
    })
}

/// `log2(closed / new)` per bucket, 0 where either count is 0.
///
/// Positive values mean the backlog shrank during the bucket.
pub fn close_rate_history(closed: &Series<u64>, new: &Series<u64>) -> Result<Series<f64>, MetricsError> {
    closed.zip_with(new, |&closed, &new| {
        if closed == 0 || new == 0 {
            0.0
        } else {
            (as_f64(closed) / as_f64(new)).log2()
        }
    })
}

#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
const fn as_f64(value: u64) -> f64 {
    value as f64
}

#[expect(clippy::cast_precision_loss, reason = "bucket indices are far below 2^52")]
const fn bucket_distance(first: usize, k: usize) -> f64 {
    (k - first) as f64
}

#[expect(clippy::cast_precision_loss, reason = "millisecond spans of real data fit in an f64 mantissa")]
fn elapsed_days(from: chrono::DateTime<chrono::Utc>, to: chrono::DateTime<chrono::Utc>) -> f64 {
    (to - from).num_milliseconds().max(0) as f64 / MILLIS_PER_DAY
}

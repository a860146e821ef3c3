use super::{MetricsError, Period, Timeline};
use core::ops::Range;

/// Per-bucket values bound to the timeline that produced them.
///
/// Value `k` describes the bucket `[anchor + k * width, anchor + (k + 1) * width)` of the
/// timeline. The number of values always equals the timeline length.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T> {
    timeline: Timeline,
    values: Vec<T>,
}

impl<T> Series<T> {
    /// Builds a series with one value per bucket produced by `f`.
    pub fn from_fn(timeline: Timeline, f: impl FnMut() -> T) -> Self {
        let mut values = Vec::with_capacity(timeline.len());
        values.resize_with(timeline.len(), f);
        Self { timeline, values }
    }

    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Applies `f` to every bucket, keeping the timeline.
    #[must_use]
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Series<U> {
        Series {
            timeline: self.timeline,
            values: self.values.iter().map(f).collect(),
        }
    }

    /// Combines two series bucket by bucket.
    pub fn zip_with<U, V>(&self, other: &Series<U>, mut f: impl FnMut(&T, &U) -> V) -> Result<Series<V>, MetricsError> {
        if self.timeline != other.timeline {
            return Err(MetricsError::TimelineMismatch);
        }

        Ok(Series {
            timeline: self.timeline,
            values: self.values.iter().zip(&other.values).map(|(a, b)| f(a, b)).collect(),
        })
    }

    /// Index range of the buckets covered by `period`.
    #[must_use]
    pub fn index_range(&self, period: &Period) -> Range<usize> {
        period.index_range(&self.timeline)
    }

    /// The values of the buckets covered by `period`.
    #[must_use]
    pub fn slice(&self, period: &Period) -> &[T] {
        &self.values[self.index_range(period)]
    }
}

impl<T: Clone + Default> Series<T> {
    /// A series with every bucket set to the default value.
    #[must_use]
    pub fn zeroed(timeline: Timeline) -> Self {
        Self {
            timeline,
            values: vec![T::default(); timeline.len()],
        }
    }
}

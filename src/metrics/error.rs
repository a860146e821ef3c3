use thiserror::Error;

/// Failures surfaced by the metrics engine.
///
/// Empty collections, empty sketches, and zero denominators are not errors; they degrade to
/// zero-valued output instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    /// A record lacks a field every metric depends on.
    #[error("{record} is missing required field '{field}'")]
    MissingRequiredField { record: String, field: &'static str },

    /// A timestamp mapped to a bucket outside of the series. The series was sized for a
    /// different collection than the one being aggregated.
    #[error("bucket index {index} is outside of a series with {len} bucket(s)")]
    IndexOutOfRange { index: i64, len: usize },

    /// Two series combined elementwise do not share the same timeline.
    #[error("series timelines do not match")]
    TimelineMismatch,
}

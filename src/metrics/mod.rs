//! Historical metrics over a repository's issues, pull requests, and releases
//!
//! This module turns a [`RepoData`](crate::facts::RepoData) snapshot into per-bucket time
//! series. It performs no I/O and never mutates its inputs.
//!
//! # Implementation Model
//!
//! Time is cut into fixed-width buckets measured from an anchor ([`Timeline`]). A builder
//! walks the records once and produces a [`Series`] holding one value per bucket:
//! - **Point metrics**: counts of records created or closed in each bucket
//! - **Range metrics**: counts of records alive across a span of buckets (open, total)
//! - **Quantile metrics**: one [`QuantileSketch`] per bucket for ages and resolution times
//! - **Derived metrics**: open fraction and close rate, combined bucket by bucket
//!
//! Series are always computed over the whole collection. A [`Period`] then selects the
//! buckets to report, which keeps values stable regardless of the window chosen.
//!
//! [`Dashboard`] assembles the standard chart set together with the most downloaded
//! releases of the period ([`top_downloads`]).

mod bucket;
pub mod builders;
mod dashboard;
mod error;
mod filter;
mod period;
mod quantile;
mod ranking;
mod series;

pub use bucket::{BucketWidth, Timeline, bucket_count, bucket_index, bucket_start, start_of_day};
pub use builders::RangeEnd;
pub use dashboard::{Chart, ChartKind, Dashboard, DashboardSettings, Line};
pub use error::MetricsError;
pub use filter::{AuthorOrigin, Maintainers, RecordFilter, RecordKind};
pub use period::Period;
pub use quantile::{DEFAULT_EPSILON, QuantileSketch};
pub use ranking::{ReleaseDownloads, top_downloads};
pub use series::Series;

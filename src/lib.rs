//! Core library for repo-stats
//!
//! This library fetches the issue, pull request, and release history of a single hosted
//! repository and turns it into time series suitable for charting.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`facts`]: Forge API access, caching, and the validated record model
//! - [`metrics`]: Time bucketing, streaming quantiles, metric builders, and window slicing
//! - [`reports`]: Report generation in multiple formats

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod facts;
pub mod metrics;
pub mod reports;

pub use crate::commands::{Host, run};

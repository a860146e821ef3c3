//! Multi-format report generation for repository charts
//!
//! This module turns a built [`Dashboard`](crate::metrics::Dashboard) into output for people
//! and for other programs.
//!
//! # Implementation Model
//!
//! Three report generators are provided, each accessed through a `generate` function:
//! - **Console**: Terminal summary with the latest value of every chart line and the release
//!   ranking, optionally colored
//! - **CSV**: Long-format rows (`chart,series,bucket_start,value`) with RFC 4180 escaping
//! - **JSON**: Every chart with its bucket starts and full series, plus the release ranking
//!
//! All generators operate on the same input, a [`ReportableRepo`], and write into any
//! `core::fmt::Write` sink so callers decide where the text ends up.

mod common;
mod console;
mod csv;
mod json;
mod reportable_repo;

pub use console::generate as generate_console;
pub use csv::generate as generate_csv;
pub use json::generate as generate_json;
pub use reportable_repo::ReportableRepo;

//! Repository data collection
//!
//! This module fetches the issue, pull request, and release listings of a repository from a
//! GitHub-compatible forge and turns them into the validated records the metrics engine
//! consumes.
//!
//! # Implementation Model
//!
//! The [`Provider`] pages through the forge listings with a small REST client, keeping the
//! raw responses in a TTL-aware JSON [`Cache`] so that repeated runs within a day do not
//! touch the network. The raw records are then validated into [`IssueRecord`] and
//! [`ReleaseRecord`] values; records missing a required field are logged and skipped.
//!
//! Everything ends up in one immutable [`RepoData`] snapshot, stamped with the capture time.

mod cache;
pub mod client;
mod provider;
mod records;
mod repo_data;
mod repo_spec;

pub use cache::{Cache, CacheEntry, CacheResult};
pub use provider::Provider;
pub use records::{Asset, IssueRecord, ReleaseRecord};
pub use repo_data::RepoData;
pub use repo_spec::RepoSpec;

//! Per-repository JSON file cache with TTL-aware loading.
//!
//! Entries live under `<dir>/<host>/<owner>/<repo>/<entry>.json`, each wrapped in an
//! envelope recording when it was written.

use super::RepoSpec;
use crate::Result;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::IntoAppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use strum::Display;

const LOG_TARGET: &str = "     cache";

/// The kinds of data cached per repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CacheEntry {
    Issues,
    Releases,
}

impl CacheEntry {
    fn file_name(self) -> String {
        format!("{self}.json")
    }
}

/// Result of loading an entry from the cache.
#[derive(Debug, Clone)]
pub enum CacheResult<T> {
    /// Cached data was found and is still fresh.
    Data(T),

    /// The data was previously found to be unavailable, for the given reason.
    NoData(String),

    /// Missing, expired, or unreadable, or the cache is being ignored.
    Miss,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct Envelope<T> {
    timestamp: DateTime<Utc>,
    payload: EnvelopePayload<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
enum EnvelopePayload<T> {
    Data(T),
    NoData(String),
}

/// A TTL-aware, directory-backed cache of forge responses.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
    now: DateTime<Utc>,
    ignore: bool,
}

impl Cache {
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>, cache_ttl: Duration, now: DateTime<Utc>, ignore_cache: bool) -> Self {
        Self {
            dir: cache_dir.into(),
            ttl: cache_ttl,
            now,
            ignore: ignore_cache,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The capture time stamped on every entry written.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Location of an entry, with every component made safe for the filesystem.
    #[must_use]
    pub fn entry_path(&self, repo: &RepoSpec, entry: CacheEntry) -> PathBuf {
        self.dir
            .join(sanitize_path_component(repo.host()))
            .join(sanitize_path_component(repo.owner()))
            .join(sanitize_path_component(repo.repo()))
            .join(entry.file_name())
    }

    #[must_use]
    pub fn load<T: DeserializeOwned>(&self, repo: &RepoSpec, entry: CacheEntry) -> CacheResult<T> {
        if self.ignore {
            return CacheResult::Miss;
        }

        let path = self.entry_path(repo, entry);
        let envelope: Envelope<T> = match File::open(&path).map(BufReader::new) {
            Ok(reader) => match serde_json::from_reader(reader) {
                Ok(envelope) => envelope,
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Cache miss for {entry} of '{repo}': {e:#}");
                    return CacheResult::Miss;
                }
            },
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Cache miss for {entry} of '{repo}': {e:#}");
                return CacheResult::Miss;
            }
        };

        let age = self.now.signed_duration_since(envelope.timestamp);
        if age.num_seconds() < 0 {
            log::debug!(target: LOG_TARGET, "Cached {entry} of '{repo}' were written in the future (clock skew), treating as fresh");
        } else {
            let age = age.to_std().unwrap_or(Duration::MAX);
            if age >= self.ttl {
                log::debug!(
                    target: LOG_TARGET,
                    "Cache expired for {entry} of '{repo}' (age: {:.1} hours, TTL: {:.1} hours)",
                    age.as_secs_f64() / 3600.0,
                    self.ttl.as_secs_f64() / 3600.0
                );
                return CacheResult::Miss;
            }

            log::debug!(target: LOG_TARGET, "Cache hit for {entry} of '{repo}' (age: {:.1} hours)", age.as_secs_f64() / 3600.0);
        }

        match envelope.payload {
            EnvelopePayload::Data(data) => CacheResult::Data(data),
            EnvelopePayload::NoData(reason) => CacheResult::NoData(reason),
        }
    }

    pub fn save<T: Serialize>(&self, repo: &RepoSpec, entry: CacheEntry, data: &T) -> Result<()> {
        Self::write_envelope(
            &self.entry_path(repo, entry),
            &Envelope {
                timestamp: self.now,
                payload: EnvelopePayload::Data(data),
            },
        )
    }

    /// Records that the data is unavailable, so later runs fail fast until the entry expires.
    pub fn save_no_data(&self, repo: &RepoSpec, entry: CacheEntry, reason: &str) -> Result<()> {
        Self::write_envelope(
            &self.entry_path(repo, entry),
            &Envelope::<()> {
                timestamp: self.now,
                payload: EnvelopePayload::NoData(reason.to_string()),
            },
        )
    }

    fn write_envelope<T: Serialize>(path: &Path, envelope: &Envelope<T>) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{}'", parent.display()))?;
        }

        let file = File::create(path).into_app_err_with(|| format!("creating cache file '{}'", path.display()))?;
        let mut writer = BufWriter::new(file);

        #[cfg(debug_assertions)]
        let result = serde_json::to_writer_pretty(&mut writer, envelope);
        #[cfg(not(debug_assertions))]
        let result = serde_json::to_writer(&mut writer, envelope);

        result.into_app_err_with(|| format!("writing cache file '{}'", path.display()))?;
        writer
            .flush()
            .into_app_err_with(|| format!("flushing cache file '{}'", path.display()))
    }
}

/// Replace path traversal sequences and characters that are unsafe in file names.
fn sanitize_path_component(s: &str) -> String {
    s.replace("..", "__").replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

//! Historical issue, pull request, and release statistics for a hosted repository.
//!
//! # Overview
//!
//! `repo-stats` downloads the complete issue and release listings of one GitHub (or
//! GitHub-compatible) repository and turns them into time series: how many issues and pull
//! requests were opened, closed, and left open, how old the open ones are, how long
//! resolution takes, and which releases were downloaded the most.
//!
//! # Quick Start
//!
//! ```bash
//! repo-stats report etcd-io/etcd
//! ```
//!
//! This prints a summary of every chart to the console. Use `--json` and `--csv` to write
//! the full series to files, and `--from` / `--to` to restrict the reported period:
//!
//! ```bash
//! repo-stats report etcd-io/etcd --from 2024-01-01 --to 2024-07-01 --json etcd.json
//! ```
//!
//! # Configuration
//!
//! `repo-stats init` writes a `repo-stats.toml` holding the defaults. List your
//! maintainers there so the external-contributor charts exclude them.
//!
//! # Authentication
//!
//! Set `GITHUB_TOKEN` (or pass `--github-token`) to lift the unauthenticated limit of 60
//! requests per hour. Downloaded listings are cached for a day by default.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use repo_stats::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that runs real OS commands.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}

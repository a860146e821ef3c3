use super::cache::{Cache, CacheEntry, CacheResult};
use super::client::{ApiResult, Client, Issue, RateLimitInfo, Release, has_next_page};
use super::{RepoData, RepoSpec};
use crate::Result;
use ohno::{EnrichableExt, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "  provider";
const PAGE_SIZE: u8 = 100;

/// Fetches and caches everything the metrics need about a repository.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Client,
    cache: Cache,
}

impl Provider {
    pub fn new(token: Option<&str>, api_url: &str, cache: Cache) -> Result<Self> {
        if token.is_none() {
            log::warn!(
                target: LOG_TARGET,
                "No API token supplied; unauthenticated requests are limited to 60 per hour. Set GITHUB_TOKEN or use --github-token"
            );
        }

        Ok(Self {
            client: Client::new(token, api_url)?,
            cache,
        })
    }

    /// Load the issues and releases of `repo`, from the cache when fresh.
    pub async fn get_repo_data(&self, repo: &RepoSpec) -> Result<RepoData> {
        let issues: Vec<Issue> = self.load_or_fetch(repo, CacheEntry::Issues, "issues?state=all&").await?;
        let releases: Vec<Release> = self.load_or_fetch(repo, CacheEntry::Releases, "releases?").await?;

        log::info!(
            target: LOG_TARGET,
            "Loaded {} issue(s) and pull request(s) and {} release(s) for '{repo}'",
            issues.len(),
            releases.len()
        );

        Ok(RepoData::from_wire(&issues, &releases, self.cache.now()))
    }

    async fn load_or_fetch<T>(&self, repo: &RepoSpec, entry: CacheEntry, query: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Serialize,
    {
        match self.cache.load::<Vec<T>>(repo, entry) {
            CacheResult::Data(items) => return Ok(items),
            CacheResult::NoData(reason) => bail!("{reason} (cached)"),
            CacheResult::Miss => {}
        }

        log::info!(target: LOG_TARGET, "Querying {} for the {entry} of '{repo}'", self.client.base_url());

        match self.fetch_all_pages(repo, query).await {
            ApiResult::Success(items, rate_limit) => {
                if let Some(rl) = rate_limit {
                    log::debug!(
                        target: LOG_TARGET,
                        "API rate limit: {} request(s) remaining, resets at {}",
                        rl.remaining,
                        rl.reset_at.with_timezone(&chrono::Local).format("%T")
                    );
                }

                if let Err(e) = self.cache.save(repo, entry, &items) {
                    log::debug!(target: LOG_TARGET, "Could not save cache for '{repo}': {e:#}");
                }

                Ok(items)
            }

            ApiResult::RateLimited(rate_limit) => match rate_limit {
                Some(rl) => bail!(
                    "API rate limit exceeded while fetching the {entry} of '{repo}'; the limit resets at {}",
                    rl.reset_at.with_timezone(&chrono::Local).format("%F %T")
                ),
                None => bail!("API request for the {entry} of '{repo}' was refused (rate limited or forbidden)"),
            },

            ApiResult::NotFound => {
                let reason = format!("repository '{repo}' not found");
                if let Err(e) = self.cache.save_no_data(repo, entry, &reason) {
                    log::debug!(target: LOG_TARGET, "Could not save cache for '{repo}': {e:#}");
                }
                bail!("{reason}");
            }

            ApiResult::Failed(e) => Err(e.enrich_with(|| format!("fetching the {entry} of '{repo}'"))),
        }
    }

    /// Follow `rel="next"` links until the listing is exhausted.
    async fn fetch_all_pages<T: DeserializeOwned>(&self, repo: &RepoSpec, query: &str) -> ApiResult<Vec<T>> {
        let mut all_items = Vec::new();
        let mut latest_rate_limit: Option<RateLimitInfo> = None;
        let mut page_num = 1_u32;

        loop {
            let url = format!(
                "{}/repos/{}/{}/{query}per_page={PAGE_SIZE}&page={page_num}",
                self.client.base_url(),
                repo.owner(),
                repo.repo()
            );

            let (resp, rate_limit) = match self.client.api_call(&url).await {
                ApiResult::Success(resp, rate_limit) => (resp, rate_limit),
                ApiResult::RateLimited(rate_limit) => return ApiResult::RateLimited(rate_limit),
                ApiResult::NotFound => return ApiResult::NotFound,
                ApiResult::Failed(e) => return ApiResult::Failed(e),
            };

            latest_rate_limit = [latest_rate_limit, rate_limit].into_iter().flatten().min_by_key(|rl| rl.remaining);
            let has_next = has_next_page(resp.headers());

            let items: Vec<T> = match resp.json().await {
                Ok(items) => items,
                Err(e) => return ApiResult::Failed(e.into()),
            };

            log::debug!(target: LOG_TARGET, "Fetched page {page_num} with {} item(s) for '{repo}'", items.len());

            if items.is_empty() {
                break;
            }

            all_items.extend(items);

            if !has_next {
                break;
            }

            page_num += 1;
        }

        ApiResult::Success(all_items, latest_rate_limit)
    }
}

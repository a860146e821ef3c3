use crate::Result;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::{IntoAppError, bail};
use url::Url;

const DEFAULT_HOST: &str = "github.com";

/// Identifies a hosted repository by host, owner, and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    url: Url,
    host: String,
    owner: String,
    repo: String,
}

impl RepoSpec {
    /// Extracts the repository from a URL, ignoring anything after the repository name.
    pub fn parse(url: &Url) -> Result<Self> {
        let segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();
        let (Some(owner), Some(repo)) = (segments.first(), segments.get(1)) else {
            bail!("invalid repository URL format: {url}");
        };

        let repo = repo.trim_end_matches(".git");
        if owner.is_empty() || repo.is_empty() {
            bail!("invalid repository URL: empty owner or repo name: {url}");
        }

        let Some(host) = url.host_str() else {
            bail!("invalid repository URL: missing host: {url}");
        };

        Self::from_parts(url.scheme(), host, owner, repo)
    }

    fn from_parts(scheme: &str, host: &str, owner: &str, repo: &str) -> Result<Self> {
        let url = Url::parse(&format!("{scheme}://{host}/{owner}/{repo}")).into_app_err("reconstructing repository URL")?;

        Ok(Self {
            url,
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

/// Accepts either a repository URL or the `owner/repo` shorthand for GitHub.
impl FromStr for RepoSpec {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains("://") {
            let url = Url::parse(s).into_app_err_with(|| format!("parsing repository URL '{s}'"))?;
            return Self::parse(&url);
        }

        match s.trim_end_matches('/').split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Self::from_parts("https", DEFAULT_HOST, owner, repo.trim_end_matches(".git"))
            }
            _ => bail!("invalid repository '{s}': expected 'owner/repo' or a repository URL"),
        }
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

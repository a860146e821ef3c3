use crate::Result;
use crate::metrics::{DashboardSettings, Maintainers};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "repo-stats.toml";

const LOG_TARGET: &str = "    config";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the GitHub-compatible REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Logins whose issues and pull requests are not counted as external
    #[serde(default)]
    pub maintainers: Vec<String>,

    /// Duration to keep downloaded listings before re-fetching
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,

    /// Number of releases in the download ranking
    #[serde(default = "default_top_releases")]
    pub top_releases: usize,

    /// Quantile targets charted for the age of open issues
    #[serde(default = "default_open_age_quantiles")]
    pub open_age_quantiles: Vec<f64>,

    /// Quantile targets charted for issue resolution durations
    #[serde(default = "default_resolution_quantiles")]
    pub resolution_quantiles: Vec<f64>,

    /// Rank error tolerated by the quantile estimator
    #[serde(default = "default_quantile_epsilon")]
    pub quantile_epsilon: f64,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_cache_ttl() -> Duration {
    Duration::from_hours(24)
}

fn default_top_releases() -> usize {
    DashboardSettings::default().top_releases
}

fn default_open_age_quantiles() -> Vec<f64> {
    DashboardSettings::default().open_age_quantiles
}

fn default_resolution_quantiles() -> Vec<f64> {
    DashboardSettings::default().resolution_quantiles
}

fn default_quantile_epsilon() -> f64 {
    DashboardSettings::default().quantile_epsilon
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `repo-stats.toml` in `base_dir` is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading repo-stats configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!(target: LOG_TARGET, "No configuration file at '{path}', using defaults");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading repo-stats configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range
    pub fn validate(&self) -> Result<()> {
        let _ = Url::parse(&self.api_url).into_app_err_with(|| format!("api_url '{}' is not a valid URL", self.api_url))?;

        if self.top_releases == 0 {
            return Err(app_err!("top_releases must be greater than 0"));
        }

        if !(self.quantile_epsilon > 0.0 && self.quantile_epsilon < 0.5) {
            return Err(app_err!("quantile_epsilon must be between 0 and 0.5 (exclusive), got {}", self.quantile_epsilon));
        }

        for (name, quantiles) in [
            ("open_age_quantiles", &self.open_age_quantiles),
            ("resolution_quantiles", &self.resolution_quantiles),
        ] {
            if let Some(q) = quantiles.iter().find(|q| !(**q > 0.0 && **q < 1.0)) {
                return Err(app_err!("{name} entries must be between 0 and 1 (exclusive), got {q}"));
            }
        }

        Ok(())
    }

    /// The dashboard tunables described by this configuration
    #[must_use]
    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            maintainers: self.maintainers.iter().map(String::as_str).collect::<Maintainers>(),
            top_releases: self.top_releases,
            open_age_quantiles: self.open_age_quantiles.clone(),
            resolution_quantiles: self.resolution_quantiles.clone(),
            quantile_epsilon: self.quantile_epsilon,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

use reqwest::Url;
use std::time::Duration;

use crate::services::error_handling::{MsmError, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the core API (tables, filters, auth)
    pub core_url: Option<Url>,

    /// Base URL of the MSM service
    pub msm_url: Option<Url>,

    /// Base URL of the Golam service
    pub golam_url: Option<Url>,

    /// Serve tables from bundled sample rows instead of the backend
    pub use_mocks: bool,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            core_url: None,
            msm_url: None,
            golam_url: None,
            use_mocks: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// `MSM_API_URL` is accepted as the core URL when `MSM_API_URL_CORE` is
    /// unset. Blank values count as unset.
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let core_url = match read("MSM_API_URL_CORE") {
            Some(value) => Some(parse_url("MSM_API_URL_CORE", &value)?),
            None => read("MSM_API_URL")
                .map(|value| parse_url("MSM_API_URL", &value))
                .transpose()?,
        };
        let msm_url = read("MSM_API_URL_MSM")
            .map(|value| parse_url("MSM_API_URL_MSM", &value))
            .transpose()?;
        let golam_url = read("MSM_API_URL_GOLAM")
            .map(|value| parse_url("MSM_API_URL_GOLAM", &value))
            .transpose()?;

        let use_mocks = read("MSM_USE_MOCKS")
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        let timeout = match read("MSM_HTTP_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.trim().parse::<u64>().map_err(|_| MsmError::Configuration {
                    message: format!("MSM_HTTP_TIMEOUT_SECS must be a whole number, got {value:?}"),
                })?;
                Duration::from_secs(secs.max(1))
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            core_url,
            msm_url,
            golam_url,
            use_mocks,
            timeout,
        })
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value.trim()).map_err(|error| MsmError::Configuration {
        message: format!("{name} is not a valid URL: {error}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(MsmError::Configuration {
            message: format!("{name} must use http or https"),
        });
    }
    Ok(url)
}

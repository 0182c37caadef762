use crate::error::ConfigError;
use std::env;
use std::fmt;
use percent_encoding::percent_decode_str;
use std::time::Duration;
use url::Url;

pub const DEFAULT_HOST: &str = "http://localhost:5000";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_JOB_NAME: &str = "default";

/// Path segments of the URL form that introduce a value
const URL_KEYS: [&str; 4] = ["api", "namespaces", "jobs", "runs"];

/// Where events go and which job they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub host: String,
    pub version: String,
    pub namespace: String,
    pub job_name: String,
    pub parent_run_id: Option<String>,
    pub api_key: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            job_name: DEFAULT_JOB_NAME.to_string(),
            parent_run_id: None,
            api_key: None,
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from a variable lookup.
    ///
    /// `LINEAGE_URL` wins when present; otherwise each field falls back to its
    /// own `LINEAGE_*` variable and then to the defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LINEAGE_URL") {
            let mut config = Self::parse_url(&url)?;
            if config.api_key.is_none() {
                config.api_key = lookup("LINEAGE_API_KEY");
            }
            return Ok(config);
        }

        let defaults = Self::default();
        Ok(Self {
            host: lookup("LINEAGE_HOST").unwrap_or(defaults.host),
            version: lookup("LINEAGE_API_VERSION").unwrap_or(defaults.version),
            namespace: lookup("LINEAGE_NAMESPACE").unwrap_or(defaults.namespace),
            job_name: lookup("LINEAGE_JOB_NAME").unwrap_or(defaults.job_name),
            parent_run_id: lookup("LINEAGE_PARENT_RUN_ID"),
            api_key: lookup("LINEAGE_API_KEY"),
        })
    }

    /// Parse the single-URL form:
    /// `{host}/api/{version}/namespaces/{ns}[/jobs/{job}[/runs/{runId}]][?api_key=...]`
    ///
    /// Path segments before the first `api`/`namespaces`/`jobs`/`runs` key stay
    /// part of the host, so a backend mounted under a prefix keeps it. Segments
    /// that are absent keep their defaults.
    pub fn parse_url(raw: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUri {
            uri: raw.to_string(),
            reason: e.to_string(),
        })?;

        let mut host = match (url.host_str(), url.port()) {
            (Some(h), Some(port)) => format!("{}://{}:{}", url.scheme(), h, port),
            (Some(h), None) => format!("{}://{}", url.scheme(), h),
            (None, _) => {
                return Err(ConfigError::InvalidUri {
                    uri: raw.to_string(),
                    reason: "missing host".to_string(),
                });
            }
        };

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        let keys_at = segments
            .iter()
            .position(|s| URL_KEYS.contains(s))
            .unwrap_or(segments.len());
        let (prefix, pairs) = segments.split_at(keys_at);
        for segment in prefix {
            host.push('/');
            host.push_str(segment);
        }

        let mut config = Self {
            host,
            ..Self::default()
        };
        for pair in pairs.chunks(2) {
            if let [key, value] = pair {
                let value = percent_decode_str(value).decode_utf8_lossy().into_owned();
                match *key {
                    "api" => config.version = value,
                    "namespaces" => config.namespace = value,
                    "jobs" => config.job_name = value,
                    "runs" => config.parent_run_id = Some(value),
                    _ => log::debug!("[LINEAGE] Ignoring url segment {}/{}", key, value),
                }
            }
        }

        config.api_key = url
            .query_pairs()
            .find(|(k, _)| k == "api_key")
            .map(|(_, v)| v.into_owned());

        Ok(config)
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RunConfig(host={}, version={}, namespace={}, job_name={}, parent_run_id={}, api_key={})",
            self.host,
            self.version,
            self.namespace,
            self.job_name,
            self.parent_run_id.as_deref().unwrap_or("none"),
            if self.api_key.is_some() { "***" } else { "none" }
        )
    }
}

/// Settings for the emission worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Threads in the pool that performs HTTP posts
    pub worker_threads: usize,
    /// Per-request timeout enforced by the HTTP client
    pub request_timeout: Duration,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EmitterConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            worker_threads: lookup("LINEAGE_EMIT_THREADS")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.worker_threads),
            request_timeout: lookup("LINEAGE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

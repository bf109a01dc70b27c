// Client configuration. The backend URL is baked in at build time through
// `DETECT_BACKEND_URL`; the same variable at runtime overrides it, and the
// CLI flags in `main.rs` override both.

use anyhow::{Context, Result};
use reqwest::Url;
use std::time::Duration;

/// Build-time default for the detection backend.
pub const BUILD_BACKEND_URL: Option<&str> = option_env!("DETECT_BACKEND_URL");
const FALLBACK_BACKEND_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Url,
    pub timeout: Duration,
    /// Retry once on connect errors and timeouts.
    pub retry: bool,
}

impl Config {
    /// Build a config from a base URL with the default timeout and retry.
    pub fn new(backend_url: &str) -> Result<Self> {
        Ok(Config {
            backend_url: parse_backend_url(backend_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: true,
        })
    }

    /// Read `DETECT_BACKEND_URL` and `DETECT_TIMEOUT_SECS` from the
    /// environment, falling back to the build-time URL and a 30s timeout.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("DETECT_BACKEND_URL")
            .ok()
            .or_else(|| BUILD_BACKEND_URL.map(str::to_string))
            .unwrap_or_else(|| FALLBACK_BACKEND_URL.into());
        let mut config = Config::new(&base_url)?;
        if let Ok(secs) = std::env::var("DETECT_TIMEOUT_SECS") {
            config.timeout = parse_timeout(&secs)?;
        }
        Ok(config)
    }

    /// The single endpoint this client talks to: `{backend_url}/detect`.
    pub fn detect_url(&self) -> Url {
        let base = self.backend_url.as_str().trim_end_matches('/');
        // base was validated on construction, appending a path keeps it valid
        Url::parse(&format!("{}/detect", base)).unwrap_or_else(|_| self.backend_url.clone())
    }
}

pub fn parse_backend_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid backend URL: {}", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Backend URL must be http or https: {}", raw);
    }
    Ok(url)
}

pub fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid timeout seconds: {}", raw))?;
    if secs == 0 {
        anyhow::bail!("Timeout must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}

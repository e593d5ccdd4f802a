//! HTTP fetching with retry.

use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::de::DeserializeOwned;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};
use url::Url;

/// Global timeout for a single HTTP request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum accepted response body (metadata indexes can be several MB).
pub const MAX_RESPONSE_SIZE: u64 = 50 * 1024 * 1024;

/// Retries after the first failed attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Fixed delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Create an HTTP agent configured with native-tls and a global timeout.
pub fn agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(HTTP_TIMEOUT))
        .build()
        .into()
}

/// Join `path` onto `base`, collapsing the slashes between them.
pub fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// A reusable HTTP client bound to an optional base URL.
#[derive(Clone)]
pub struct Fetcher {
    agent: Agent,
    base_url: Option<String>,
    retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("base_url", &self.base_url)
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            agent: agent(),
            base_url: None,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Resolve relative request paths against `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::new()
        }
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Start a GET request. Absolute URLs bypass the base URL.
    pub fn get(&self, path: &str) -> FetchRequest<'_> {
        let url = match &self.base_url {
            Some(base) if !path.starts_with("http://") && !path.starts_with("https://") => join_url(base, path),
            _ => path.to_string(),
        };
        FetchRequest {
            fetcher: self,
            url,
            query: Vec::new(),
            headers: Vec::new(),
        }
    }
}

/// A GET request under construction.
#[derive(Debug)]
pub struct FetchRequest<'a> {
    fetcher: &'a Fetcher,
    url: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl FetchRequest<'_> {
    /// Append a query pair.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The final URL, query included.
    pub fn url(&self) -> anyhow::Result<String> {
        let mut url = Url::parse(&self.url).with_context(|| format!("Invalid URL '{}'", self.url))?;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url.into())
    }

    /// Send the request and read the body as text.
    pub async fn text(self) -> anyhow::Result<String> {
        let url = self.url()?;
        let mut retries_left = self.fetcher.retries;
        loop {
            match self.attempt(&url).await {
                Ok(body) => return Ok(body),
                Err(err) if retries_left > 0 => {
                    log::warn!(
                        "Could not fetch from `{url}`. Will retry in `{}ms`. `{retries_left}` retries left.",
                        self.fetcher.retry_delay.as_millis()
                    );
                    log::debug!("fetch error for `{url}`: {err:#}");
                    retries_left -= 1;
                    tokio::time::sleep(self.fetcher.retry_delay).await;
                }
                Err(err) => return Err(err.context(format!("Could not fetch from `{url}`"))),
            }
        }
    }

    /// Send the request and decode the body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        let body = self.text().await?;
        serde_json::from_str(&body).context("Failed to decode JSON response")
    }

    async fn attempt(&self, url: &str) -> anyhow::Result<String> {
        let agent = self.fetcher.agent.clone();
        let url = url.to_string();
        let headers = self.headers.clone();
        tokio::task::spawn_blocking(move || read_text(&agent, &url, &headers))
            .await
            .map_err(|e| anyhow!("fetch task failed: {e}"))?
    }
}

fn read_text(agent: &Agent, url: &str, headers: &[(String, String)]) -> anyhow::Result<String> {
    let mut request = agent.get(url);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }
    let body = request
        .call()?
        .into_body()
        .with_config()
        .limit(MAX_RESPONSE_SIZE)
        .read_to_string()?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://fonts.bunny.net", "/list"), "https://fonts.bunny.net/list");
        assert_eq!(join_url("https://api.fontshare.com/v2/", "fonts"), "https://api.fontshare.com/v2/fonts");
        assert_eq!(join_url("", "/x"), "/x");
    }

    #[test]
    fn test_url_does_not_mutate_base() {
        let fetcher = Fetcher::with_base_url("https://fonts.googleapis.com");
        let request = fetcher.get("/css2").query("family", "test");
        assert_eq!(request.url().unwrap(), "https://fonts.googleapis.com/css2?family=test");
        assert_eq!(fetcher.base_url(), Some("https://fonts.googleapis.com"));
        assert_eq!(
            fetcher.get("/css2").url().unwrap(),
            "https://fonts.googleapis.com/css2"
        );
    }

    #[test]
    fn test_absolute_urls_bypass_base() {
        let fetcher = Fetcher::with_base_url("https://fonts.googleapis.com");
        let request = fetcher.get("https://typekit.com/api/v1/json/kits/abc/published");
        assert_eq!(
            request.url().unwrap(),
            "https://typekit.com/api/v1/json/kits/abc/published"
        );
    }

    #[test]
    fn test_invalid_url_is_an_error() {
        let fetcher = Fetcher::new();
        assert!(fetcher.get("not a url").url().is_err());
    }
}

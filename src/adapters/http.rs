use crate::core::PageFetcher;
use crate::utils::error::{LabelError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Raw `Cookie` header of a logged-in session.
    pub cookie: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
        }
    }
}

/// Loads order detail pages over HTTP with the operator's session cookie.
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,ru;q=0.9"));
        if let Some(cookie) = settings.cookie.as_deref().filter(|c| !c.is_empty()) {
            let value =
                HeaderValue::from_str(cookie).map_err(|e| LabelError::InvalidConfigValueError {
                    field: "fetch.cookie".to_string(),
                    value: "<redacted>".to_string(),
                    reason: e.to_string(),
                })?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        tracing::debug!("Fetching order page {}", url);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Request to {} failed: {}", url, e);
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("HTTP {} for {}", status, url);
            return Ok(None);
        }

        match response.text().await {
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                tracing::warn!("Failed to read body of {}: {}", url, e);
                Ok(None)
            }
        }
    }
}

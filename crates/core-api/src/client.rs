//! BaniDB HTTP client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use core_model::{ApiPage, PageNumber, SourceId};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{ContentApi, FetchError};

pub const DEFAULT_BASE_URL: &str = "https://api.banidb.com/v2/angs";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct BaniDbClient {
    http: Client,
    base_url: String,
}

impl BaniDbClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("banireader/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            http,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn page_url(&self, source: SourceId, page: PageNumber) -> String {
        format!("{}/{}/{}", self.base_url, page, source.code())
    }
}

#[async_trait]
impl ContentApi for BaniDbClient {
    async fn fetch_page(&self, source: SourceId, page: PageNumber) -> Result<ApiPage, FetchError> {
        let url = self.page_url(source, page);
        debug!(target: "api.fetch", %source, page, "request");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|error| FetchError::Transport { page, error })?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: "api.fetch", %source, page, status = status.as_u16(), "bad_status");
            return Err(FetchError::Status {
                page,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| FetchError::Transport { page, error })?;
        let parsed: ApiPage = serde_json::from_slice(&body).map_err(|error| {
            warn!(target: "api.fetch", %source, page, ?error, "decode_failed");
            FetchError::Decode { page, error }
        })?;

        debug!(
            target: "api.fetch",
            %source,
            page,
            lines = parsed.page.as_ref().map_or(0, Vec::len),
            bytes = body.len(),
            "response"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_has_page_then_source_code() {
        let client = BaniDbClient::new(ClientOptions {
            base_url: "http://localhost:9/v2/angs/".into(),
            ..ClientOptions::default()
        })
        .unwrap();
        assert_eq!(
            client.page_url(SourceId::Dasam, 12),
            "http://localhost:9/v2/angs/12/D"
        );
    }
}

//! reqwest-backed fetch client

use crate::config::NetworkConfig;
use crate::error::{BibleError, Result};
use crate::remote::BibleApi;
use async_trait::async_trait;
use std::time::Duration;

/// HTTP client for version payloads. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpBibleApi {
    client: reqwest::Client,
}

impl HttpBibleApi {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BibleError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BibleApi for HttpBibleApi {
    async fn download_version(&self, url: &str) -> Result<String> {
        log::info!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        log::info!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

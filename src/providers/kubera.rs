use super::util::{build_url, read_json};
use crate::core::config::KuberaConfig;
use crate::core::records::RawPortfolio;
use crate::core::source::PortfolioSource;
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Url;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

const PROVIDER: &str = "Kubera";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct PortfolioResponse {
    #[serde(default)]
    data: Option<RawPortfolio>,
    #[serde(rename = "errorCode", default)]
    error_code: i64,
}

/// HMAC-signed client for the Kubera v3 data API, bound to one portfolio.
pub struct KuberaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    portfolio_id: String,
}

impl KuberaClient {
    pub fn new(base_url: &str, api_key: &str, api_secret: &str, portfolio_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            portfolio_id: portfolio_id.to_string(),
        }
    }

    pub fn from_config(config: &KuberaConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.api_key,
            &config.api_secret,
            &config.portfolio_id,
        )
    }

    /// Hex HMAC-SHA256 over `api_key + timestamp + method + path_and_query`.
    pub fn sign(&self, timestamp: &str, method: &str, url: &Url) -> Result<String> {
        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }

        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| anyhow!("Invalid Kubera API secret: {e}"))?;
        mac.update(self.api_key.as_bytes());
        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(target.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = build_url(&self.base_url, path, &[])?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&timestamp, "GET", &url)?;
        debug!(%url, "Calling Kubera API");

        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .header("x-api-token", &self.api_key)
            .header("x-timestamp", &timestamp)
            .header("x-signature", &signature)
            .send()
            .await
            .context("Failed to call Kubera API")?;
        read_json(response, PROVIDER).await
    }
}

#[async_trait]
impl PortfolioSource for KuberaClient {
    async fn fetch_portfolio(&self) -> Result<RawPortfolio> {
        let path = format!("/v3/data/portfolio/{}", self.portfolio_id);
        let response: PortfolioResponse = self.get(&path).await?;
        if response.error_code > 0 {
            bail!("Kubera API error: {}", response.error_code);
        }
        response
            .data
            .ok_or_else(|| anyhow!("Kubera API response has no portfolio data"))
    }
}

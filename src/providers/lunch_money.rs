use super::util::{build_url, read_json};
use crate::core::config::LunchMoneyConfig;
use crate::core::date::DateRange;
use crate::core::records::{CategoryIndex, RawCategory, RawTag, RawTransaction, TagIndex};
use crate::core::source::TransactionSource;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const PROVIDER: &str = "Lunch Money";
const TRANSACTION_LIMIT: &str = "10000";

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<RawTransaction>,
    #[serde(default)]
    has_more: bool,
}

/// Bearer-token client for the Lunch Money v1 API.
pub struct LunchMoneyClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl LunchMoneyClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }

    pub fn from_config(config: &LunchMoneyConfig) -> Self {
        Self::new(&config.base_url, &config.token)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = build_url(&self.base_url, path, params)?;
        debug!(%url, "Calling Lunch Money API");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to call Lunch Money API")?;
        read_json(response, PROVIDER).await
    }
}

#[async_trait]
impl TransactionSource for LunchMoneyClient {
    async fn list_categories(&self) -> Result<CategoryIndex> {
        let response: CategoriesResponse =
            self.get("/v1/categories", &[("format", "nested")]).await?;
        Ok(CategoryIndex::from_nested(&response.categories))
    }

    async fn list_tags(&self) -> Result<TagIndex> {
        let tags: Vec<RawTag> = self.get("/v1/tags", &[]).await?;
        Ok(tags.into_iter().collect())
    }

    async fn list_transactions(&self, range: &DateRange) -> Result<Vec<RawTransaction>> {
        let start_date = range.start_date.to_string();
        let end_date = range.end_date.to_string();
        let response: TransactionsResponse = self
            .get(
                "/v1/transactions",
                &[
                    ("start_date", start_date.as_str()),
                    ("end_date", end_date.as_str()),
                    ("limit", TRANSACTION_LIMIT),
                ],
            )
            .await?;
        if response.has_more {
            bail!("too many transactions, try smaller time interval");
        }
        Ok(response.transactions)
    }
}

/// Token process template
///
/// The Lua source evaluated in every spawned asset process. It is fetched
/// from the gateway by transaction id and placeholders are substituted per
/// asset.
use crate::{
    error::{UploadError, UploadResult},
    metrics,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Raw template source stored under `template_id`
    async fn fetch(&self, template_id: &str) -> UploadResult<String>;
}

/// Reads transaction data from `<tx_endpoint>/<id>`
#[derive(Clone)]
pub struct GatewayTemplateSource {
    tx_endpoint: String,
    http_client: Client,
}

impl GatewayTemplateSource {
    pub fn new(tx_endpoint: impl Into<String>) -> UploadResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("atomic-uploader/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| UploadError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            tx_endpoint: tx_endpoint.into(),
            http_client,
        })
    }

    fn url(&self, template_id: &str) -> String {
        format!("{}/{}", self.tx_endpoint.trim_end_matches('/'), template_id)
    }
}

#[async_trait]
impl TemplateSource for GatewayTemplateSource {
    async fn fetch(&self, template_id: &str) -> UploadResult<String> {
        let url = self.url(template_id);
        debug!("Fetching token template from {}", url);

        let response = self.http_client.get(&url).send().await?;
        metrics::record_request("gateway", response.status().as_u16());

        if !response.status().is_success() {
            return Err(UploadError::NotFound(format!(
                "Token template {} unavailable: {}",
                template_id,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

/// Values substituted into the template for one asset
#[derive(Debug, Clone)]
pub struct TokenParams<'a> {
    /// Profile process that owns the asset
    pub owner: &'a str,
    pub name: &'a str,
    pub ticker: &'a str,
    pub denomination: &'a str,
    pub balance: u64,
}

/// Substitute placeholders: the first `[Owner]` becomes a one-element Lua
/// list, the others are replaced everywhere
pub fn render_token_source(source: &str, params: &TokenParams<'_>) -> String {
    source
        .replacen("[Owner]", &format!("['{}']", params.owner), 1)
        .replace("<NAME>", params.name)
        .replace("<TICKER>", params.ticker)
        .replace("<DENOMINATION>", params.denomination)
        .replace("<BALANCE>", &params.balance.to_string())
}

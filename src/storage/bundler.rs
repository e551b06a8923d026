/// Bundling node upload client
use crate::{
    error::{UploadError, UploadResult},
    metrics,
    storage::ContentUploader,
    tags::Tag,
    wallet::{DataItemSigner, UnsignedDataItem},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

#[derive(Deserialize)]
struct BundlerResponse {
    id: String,
}

/// Posts signed data items to `<node>/tx/arweave`
#[derive(Clone)]
pub struct BundlerClient {
    node_url: String,
    http_client: Client,
}

impl BundlerClient {
    pub fn new(node_url: impl Into<String>) -> UploadResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("atomic-uploader/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| UploadError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            node_url: node_url.into(),
            http_client,
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/tx/arweave", self.node_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ContentUploader for BundlerClient {
    async fn upload(
        &self,
        data: Vec<u8>,
        tags: Vec<Tag>,
        signer: &dyn DataItemSigner,
    ) -> UploadResult<String> {
        let size = data.len();
        let item = signer
            .sign_data_item(UnsignedDataItem {
                target: None,
                anchor: None,
                tags,
                data,
            })
            .await?;

        let response = self
            .http_client
            .post(self.upload_url())
            .header("Content-Type", "application/octet-stream")
            .body(item.raw)
            .send()
            .await
            .map_err(|e| UploadError::Storage(format!("Failed to reach bundler {}: {}", self.node_url, e)))?;
        metrics::record_request("bundler", response.status().as_u16());

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Storage(format!(
                "Bundler returned error {}: {}",
                status, body
            )));
        }

        let body: BundlerResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Storage(format!("Invalid bundler response: {}", e)))?;

        if body.id != item.id {
            tracing::warn!("Bundler id {} differs from signed item id {}", body.id, item.id);
        }

        info!("Uploaded {} bytes as {}", size, body.id);
        Ok(body.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_url() {
        let client = BundlerClient::new("https://node2.irys.xyz/").unwrap();
        assert_eq!(client.upload_url(), "https://node2.irys.xyz/tx/arweave");
    }
}

/// HTTP client for the AO messenger and compute units
use crate::{
    ao::{EvalResult, MessageRequest, ProcessClient, SpawnRequest},
    error::{UploadError, UploadResult},
    metrics,
    tags::Tag,
    wallet::{DataItemSigner, UnsignedDataItem},
};
use async_trait::async_trait;
use rand::RngCore;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const DATA_PROTOCOL: &str = "ao";
const VARIANT: &str = "ao.TN.1";
const SDK: &str = "atomic-uploader";

#[derive(Deserialize)]
struct MuResponse {
    id: Option<String>,
    message: Option<String>,
}

/// AO network client configuration
#[derive(Debug, Clone)]
pub struct AoClientConfig {
    pub mu_url: String,
    pub cu_url: String,
}

/// AO client speaking to a messenger unit (writes) and compute unit (reads)
#[derive(Clone)]
pub struct AoClient {
    config: AoClientConfig,
    http_client: Client,
}

impl AoClient {
    pub fn new(config: AoClientConfig) -> UploadResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("atomic-uploader/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| UploadError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    /// Random 32 character anchor
    fn anchor() -> Vec<u8> {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>().into_bytes()
    }

    fn protocol_tags(kind: &str) -> Vec<Tag> {
        vec![
            Tag::new("Data-Protocol", DATA_PROTOCOL),
            Tag::new("Variant", VARIANT),
            Tag::new("Type", kind),
        ]
    }

    /// Post a signed data item to the messenger unit
    async fn post_to_mu(&self, raw: Vec<u8>) -> UploadResult<MuResponse> {
        let response = self
            .http_client
            .post(format!("{}/", self.config.mu_url.trim_end_matches('/')))
            .header("Content-Type", "application/octet-stream")
            .header("Accept", "application/json")
            .body(raw)
            .send()
            .await
            .map_err(|e| UploadError::Process(format!("Failed to reach messenger unit: {}", e)))?;
        metrics::record_request("mu", response.status().as_u16());

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Process(format!(
                "Messenger unit returned error {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| UploadError::Process(format!("Invalid messenger unit response: {}", e)))
    }
}

#[async_trait]
impl ProcessClient for AoClient {
    async fn spawn(&self, request: SpawnRequest, signer: &dyn DataItemSigner) -> UploadResult<String> {
        let mut tags = Self::protocol_tags("Process");
        tags.push(Tag::new("Module", request.module));
        tags.push(Tag::new("Scheduler", request.scheduler));
        tags.push(Tag::new("SDK", SDK));
        tags.extend(request.tags);

        let item = signer
            .sign_data_item(UnsignedDataItem {
                target: None,
                anchor: Some(Self::anchor()),
                tags,
                data: request.data,
            })
            .await?;

        let response = self.post_to_mu(item.raw).await?;
        debug!("Spawn accepted by messenger unit: {:?}", response.message);
        let process_id = response.id.unwrap_or(item.id);

        info!("Spawned process {}", process_id);
        Ok(process_id)
    }

    async fn message(
        &self,
        request: MessageRequest,
        signer: &dyn DataItemSigner,
    ) -> UploadResult<String> {
        let mut tags = Self::protocol_tags("Message");
        tags.push(Tag::new("SDK", SDK));
        tags.extend(request.tags);

        let item = signer
            .sign_data_item(UnsignedDataItem {
                target: Some(request.process.clone()),
                anchor: Some(Self::anchor()),
                tags,
                data: request.data,
            })
            .await?;

        let response = self.post_to_mu(item.raw).await?;
        let message_id = response.id.unwrap_or(item.id);

        debug!("Sent message {} to process {}", message_id, request.process);
        Ok(message_id)
    }

    async fn result(&self, message: &str, process: &str) -> UploadResult<EvalResult> {
        let url = format!(
            "{}/result/{}?process-id={}",
            self.config.cu_url.trim_end_matches('/'),
            message,
            process
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| UploadError::Process(format!("Failed to reach compute unit: {}", e)))?;
        metrics::record_request("cu", response.status().as_u16());

        if !response.status().is_success() {
            return Err(UploadError::Process(format!(
                "Compute unit returned error for message {}: {}",
                message,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| UploadError::Process(format!("Invalid evaluation result: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_is_32_bytes() {
        let anchor = AoClient::anchor();
        assert_eq!(anchor.len(), 32);
        assert!(anchor.iter().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_protocol_tags() {
        let tags = AoClient::protocol_tags("Process");
        assert_eq!(tags[0], Tag::new("Data-Protocol", "ao"));
        assert_eq!(tags[2], Tag::new("Type", "Process"));
    }
}

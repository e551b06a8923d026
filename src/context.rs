/// Application context and dependency injection
use crate::{
    ao::{client::AoClientConfig, AoClient, ProcessClient},
    assets::{AssetsTable, AssetsTableConfig},
    config::UploaderConfig,
    error::UploadResult,
    gql::{GqlClient, QueryService},
    storage::{BundlerClient, ContentUploader},
    upload::{GatewayTemplateSource, TemplateSource, UploadSettings, Uploader},
    wallet::{ArweaveJwkSigner, DataItemSigner, WalletSession},
};
use std::sync::Arc;

/// Shared clients and the connected wallet
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<UploaderConfig>,
    pub query: Arc<dyn QueryService>,
    pub process: Arc<dyn ProcessClient>,
    pub templates: Arc<dyn TemplateSource>,
    // Images go through the transaction upload node, manifests through
    // the bundling node
    pub media: Arc<dyn ContentUploader>,
    pub manifests: Arc<dyn ContentUploader>,
    pub wallet: WalletSession,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: UploaderConfig) -> UploadResult<Self> {
        config.validate()?;

        let query: Arc<dyn QueryService> = Arc::new(GqlClient::new(config.upload.page_size)?);
        let process: Arc<dyn ProcessClient> = Arc::new(AoClient::new(AoClientConfig {
            mu_url: config.ao.mu_url.clone(),
            cu_url: config.ao.cu_url.clone(),
        })?);
        let templates: Arc<dyn TemplateSource> =
            Arc::new(GatewayTemplateSource::new(config.gateways.tx_endpoint.clone())?);
        let media: Arc<dyn ContentUploader> =
            Arc::new(BundlerClient::new(config.bundler.tx_upload_url.clone())?);
        let manifests: Arc<dyn ContentUploader> =
            Arc::new(BundlerClient::new(config.bundler.node_url.clone())?);

        let wallet = Self::connect_wallet(&config).await?;

        Ok(Self {
            config: Arc::new(config),
            query,
            process,
            templates,
            media,
            manifests,
            wallet,
        })
    }

    /// Signing session when a keyfile is configured, else watch-only on the
    /// configured address
    async fn connect_wallet(config: &UploaderConfig) -> UploadResult<WalletSession> {
        let profile_id = config.wallet.profile_id.clone();

        if let Some(keyfile) = &config.wallet.keyfile {
            let signer: Arc<dyn DataItemSigner> = Arc::new(ArweaveJwkSigner::from_keyfile(keyfile).await?);
            tracing::info!("Wallet connected: {}", signer.owner_address());
            return Ok(WalletSession::connected(signer, profile_id));
        }

        match &config.wallet.address {
            Some(address) => {
                tracing::info!("Watch-only wallet: {}", address);
                let mut session = WalletSession::watch_only(address.clone());
                session.profile_id = profile_id;
                Ok(session)
            }
            None => {
                tracing::info!("No wallet configured");
                Ok(WalletSession::default())
            }
        }
    }

    pub fn assets_table(&self) -> AssetsTable {
        AssetsTable::new(
            Arc::clone(&self.query),
            AssetsTableConfig {
                gateway: self.config.gateways.arweave.clone(),
                page_size: self.config.upload.page_size,
                ..Default::default()
            },
        )
    }

    pub fn uploader(&self) -> UploadResult<Uploader> {
        Ok(Uploader::new(
            Arc::clone(&self.process),
            Arc::clone(&self.query),
            Arc::clone(&self.templates),
            Arc::clone(&self.media),
            Arc::clone(&self.manifests),
            UploadSettings::from_config(&self.config)?,
        ))
    }
}

/// Configuration management for Atomic Uploader
use crate::error::{UploadError, UploadResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Main uploader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    pub gateways: GatewayConfig,
    pub ao: AoConfig,
    pub bundler: BundlerConfig,
    pub upload: UploadConfig,
    pub wallet: WalletConfig,
    pub logging: LoggingConfig,
}

/// Arweave gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway used for asset listing queries
    pub arweave: String,
    /// Gateway used to confirm freshly spawned processes
    pub goldsky: String,
    /// Base URL for raw transaction data (template source)
    pub tx_endpoint: String,
}

/// AO network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AoConfig {
    /// Messenger unit URL
    pub mu_url: String,
    /// Compute unit URL
    pub cu_url: String,
    pub module: String,
    pub scheduler: String,
    /// Transaction holding the token process source template
    pub token_template: Option<String>,
}

/// Bundling storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerConfig {
    /// Node receiving collection manifests
    pub node_url: String,
    /// Endpoint receiving raw content transactions (banner, thumbnail)
    pub tx_upload_url: String,
}

/// Listing and upload workflow tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub page_size: usize,
    pub poll_attempts: u32,
    pub poll_delay_ms: u64,
    pub ticker: String,
    pub denomination: String,
}

/// Wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Arweave JWK keyfile
    pub keyfile: Option<PathBuf>,
    /// Address to list assets for when no keyfile is configured
    pub address: Option<String>,
    /// Profile process receiving uploaded assets
    pub profile_id: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Crate log level used when `RUST_LOG` is not set
    pub level: String,
}

impl LoggingConfig {
    /// `EnvFilter` directive for the crate's own targets
    pub fn filter_directive(&self) -> String {
        format!("atomic_uploader={}", self.level)
    }
}

impl UploadConfig {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }
}

impl UploaderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> UploadResult<Self> {
        dotenv::dotenv().ok();

        let arweave = env::var("UPLOADER_GATEWAY_ARWEAVE").unwrap_or_else(|_| "arweave.net".to_string());
        let goldsky = env::var("UPLOADER_GATEWAY_GOLDSKY")
            .unwrap_or_else(|_| "arweave-search.goldsky.com".to_string());
        let tx_endpoint = env::var("UPLOADER_TX_ENDPOINT")
            .unwrap_or_else(|_| format!("https://{}", arweave));

        let mu_url = env::var("UPLOADER_AO_MU_URL").unwrap_or_else(|_| "https://mu.ao-testnet.xyz".to_string());
        let cu_url = env::var("UPLOADER_AO_CU_URL").unwrap_or_else(|_| "https://cu.ao-testnet.xyz".to_string());
        let module = env::var("UPLOADER_AO_MODULE")
            .unwrap_or_else(|_| "Pq2Zftrqut0hdisH_MC2pDOT6S4eQFoxGsFUzR6r350".to_string());
        let scheduler = env::var("UPLOADER_AO_SCHEDULER")
            .unwrap_or_else(|_| "_GQ33BkPtZrqxA84vM8Zk-N2aO0toNNu_C-l-rawrBA".to_string());
        let token_template = env::var("UPLOADER_AO_TOKEN_TEMPLATE").ok();

        let node_url = env::var("UPLOADER_BUNDLER_NODE_URL").unwrap_or_else(|_| "https://node2.irys.xyz".to_string());
        let tx_upload_url = env::var("UPLOADER_TX_UPLOAD_URL").unwrap_or_else(|_| node_url.clone());

        let page_size = parse_var("UPLOADER_PAGE_SIZE", 10, "page size")?;
        let poll_attempts = parse_var("UPLOADER_POLL_ATTEMPTS", 5, "poll attempt count")?;
        let poll_delay_ms = parse_var("UPLOADER_POLL_DELAY_MS", 2000, "poll delay")?;
        let ticker = env::var("UPLOADER_TICKER").unwrap_or_else(|_| "ATOMIC".to_string());
        let denomination = env::var("UPLOADER_DENOMINATION").unwrap_or_else(|_| "1".to_string());

        let keyfile = env::var("UPLOADER_WALLET_KEYFILE").ok().map(PathBuf::from);
        let address = env::var("UPLOADER_WALLET_ADDRESS").ok();
        let profile_id = env::var("UPLOADER_PROFILE_ID").ok();

        let log_level = env::var("UPLOADER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(UploaderConfig {
            gateways: GatewayConfig {
                arweave,
                goldsky,
                tx_endpoint,
            },
            ao: AoConfig {
                mu_url,
                cu_url,
                module,
                scheduler,
                token_template,
            },
            bundler: BundlerConfig {
                node_url,
                tx_upload_url,
            },
            upload: UploadConfig {
                page_size,
                poll_attempts,
                poll_delay_ms,
                ticker,
                denomination,
            },
            wallet: WalletConfig {
                keyfile,
                address,
                profile_id,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> UploadResult<()> {
        if self.gateways.arweave.is_empty() || self.gateways.goldsky.is_empty() {
            return Err(UploadError::Config("Gateways cannot be empty".to_string()));
        }

        if self.ao.mu_url.is_empty() || self.ao.cu_url.is_empty() {
            return Err(UploadError::Config("AO unit URLs cannot be empty".to_string()));
        }

        if self.upload.page_size == 0 {
            return Err(UploadError::Config("Page size must be greater than zero".to_string()));
        }

        if self.upload.poll_attempts == 0 {
            return Err(UploadError::Config(
                "Poll attempts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Numeric variable with a default; a value that does not parse is an error
fn parse_var<T: FromStr>(name: &str, default: T, what: &str) -> UploadResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| UploadError::Config(format!("Invalid {} in {}: {}", what, name, raw))),
        Err(_) => Ok(default),
    }
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            gateways: GatewayConfig {
                arweave: "arweave.net".to_string(),
                goldsky: "arweave-search.goldsky.com".to_string(),
                tx_endpoint: "https://arweave.net".to_string(),
            },
            ao: AoConfig {
                mu_url: "https://mu.ao-testnet.xyz".to_string(),
                cu_url: "https://cu.ao-testnet.xyz".to_string(),
                module: "Pq2Zftrqut0hdisH_MC2pDOT6S4eQFoxGsFUzR6r350".to_string(),
                scheduler: "_GQ33BkPtZrqxA84vM8Zk-N2aO0toNNu_C-l-rawrBA".to_string(),
                token_template: None,
            },
            bundler: BundlerConfig {
                node_url: "https://node2.irys.xyz".to_string(),
                tx_upload_url: "https://node2.irys.xyz".to_string(),
            },
            upload: UploadConfig {
                page_size: 10,
                poll_attempts: 5,
                poll_delay_ms: 2000,
                ticker: "ATOMIC".to_string(),
                denomination: "1".to_string(),
            },
            wallet: WalletConfig {
                keyfile: None,
                address: None,
                profile_id: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

/// Atomic Uploader
///
/// Lists the atomic assets owned by an Arweave wallet and uploads new
/// assets and collections to AO and Arweave bundlers.

pub mod ao;
pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod gql;
pub mod metrics;
pub mod storage;
pub mod tags;
pub mod upload;
pub mod wallet;

pub use config::UploaderConfig;
pub use context::AppContext;
pub use error::{UploadError, UploadResult};

/// Wallet and identity
///
/// The wallet supplies the connected address, the user's profile process
/// and the capability to sign ANS-104 data items.

pub mod data_item;
pub mod jwk;

pub use data_item::{SignedDataItem, UnsignedDataItem};
pub use jwk::ArweaveJwkSigner;

use crate::error::{UploadError, UploadResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Signs data items on behalf of the connected wallet
#[async_trait]
pub trait DataItemSigner: Send + Sync {
    /// Address of the signing wallet
    fn owner_address(&self) -> String;

    /// Sign and serialize a data item
    async fn sign_data_item(&self, item: UnsignedDataItem) -> UploadResult<SignedDataItem>;
}

/// Connected wallet state
#[derive(Clone, Default)]
pub struct WalletSession {
    pub address: Option<String>,
    pub profile_id: Option<String>,
    pub signer: Option<Arc<dyn DataItemSigner>>,
}

impl WalletSession {
    /// Session for a signing wallet; the address comes from the signer
    pub fn connected(signer: Arc<dyn DataItemSigner>, profile_id: Option<String>) -> Self {
        Self {
            address: Some(signer.owner_address()),
            profile_id,
            signer: Some(signer),
        }
    }

    /// Read-only session that can list assets but not sign
    pub fn watch_only(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            profile_id: None,
            signer: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.as_deref().map_or(false, |a| !a.is_empty())
    }

    pub fn signer(&self) -> UploadResult<&Arc<dyn DataItemSigner>> {
        self.signer
            .as_ref()
            .ok_or_else(|| UploadError::Wallet("No signing wallet connected".to_string()))
    }

    pub fn address(&self) -> UploadResult<&str> {
        self.address
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| UploadError::Wallet("Wallet address unavailable".to_string()))
    }

    pub fn profile_id(&self) -> UploadResult<&str> {
        self.profile_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| UploadError::Wallet("No profile associated with wallet".to_string()))
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("address", &self.address)
            .field("profile_id", &self.profile_id)
            .field("signer", &self.signer.is_some())
            .finish()
    }
}

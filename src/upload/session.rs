/// Upload session state
///
/// The state shared between asset selection and the upload workflow.
/// Updates are copy-on-write: every helper returns a new state.
use crate::{error::UploadResult, gql::AssetIdentifier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a batch produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    /// Atomic assets bundled into a collection manifest
    #[default]
    Collection,
    /// Standalone atomic assets
    Assets,
}

/// One pending file to turn into an atomic asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadContentItem {
    pub path: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl UploadContentItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: None,
            description: None,
            content_type: None,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// A license option that is either a plain value or value plus amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseAmount {
    pub value: String,
    #[serde(default)]
    pub amount: Option<String>,
}

/// A license option with terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseTerms {
    pub value: String,
    #[serde(default)]
    pub terms: Option<LicenseAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMode {
    pub value: String,
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Universal Data License options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(default)]
    pub access_fee: Option<LicenseAmount>,
    #[serde(default)]
    pub derivations: Option<LicenseTerms>,
    #[serde(default)]
    pub commercial_use: Option<LicenseTerms>,
    #[serde(default)]
    pub data_model_training: Option<LicenseTerms>,
    #[serde(default)]
    pub payment_mode: Option<PaymentMode>,
}

/// Session data entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub content_list: Vec<UploadContentItem>,
    /// Existing assets chosen for the collection
    pub id_list: Vec<AssetIdentifier>,
    pub has_license: bool,
    pub license: Option<License>,
    pub collection_code: Option<String>,
    pub use_fractional_tokens: bool,
    pub content_tokens: Option<u64>,
    /// Banner image as a data URL
    pub banner: Option<String>,
    /// Thumbnail image as a data URL
    pub thumbnail: Option<String>,
}

/// Shared upload session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSessionState {
    pub upload_active: bool,
    pub upload_type: UploadType,
    pub data: UploadData,
}

impl UploadSessionState {
    pub fn new(upload_type: UploadType, data: UploadData) -> Self {
        Self {
            upload_active: false,
            upload_type,
            data,
        }
    }

    pub fn with_active(&self, active: bool) -> Self {
        Self {
            upload_active: active,
            ..self.clone()
        }
    }

    /// Add `id` to the selection if absent, remove it if present
    pub fn with_id_toggled(&self, id: &str) -> Self {
        let mut next = self.clone();
        if let Some(pos) = next.data.id_list.iter().position(|existing| existing == id) {
            next.data.id_list.remove(pos);
        } else {
            next.data.id_list.push(id.to_string());
        }
        next
    }

    /// Fresh, inactive session keeping only the upload type
    pub fn cleared(&self) -> Self {
        Self::new(self.upload_type, UploadData::default())
    }

    pub fn with_upload_type(&self, upload_type: UploadType) -> Self {
        Self {
            upload_type,
            ..self.clone()
        }
    }

    /// Read a session manifest. Relative content paths resolve against
    /// the manifest's directory.
    pub async fn load(path: &Path) -> UploadResult<Self> {
        let raw = tokio::fs::read(path).await?;
        let mut session: Self = serde_json::from_slice(&raw)?;
        if let Some(base) = path.parent() {
            for item in &mut session.data.content_list {
                if item.path.is_relative() {
                    item.path = base.join(&item.path);
                }
            }
        }
        Ok(session)
    }

    pub async fn save(&self, path: &Path) -> UploadResult<()> {
        let raw = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, raw).await?;
        Ok(())
    }

    /// Token balance minted to the creator for each asset
    pub fn balance(&self) -> u64 {
        if self.data.use_fractional_tokens {
            self.data.content_tokens.unwrap_or(1)
        } else {
            1
        }
    }
}

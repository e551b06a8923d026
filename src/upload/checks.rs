/// Preconditions validated before a batch starts
use crate::{
    error::{UploadError, UploadResult},
    upload::{UploadSessionState, UploadType},
    wallet::WalletSession,
};

fn present(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

/// Every unmet precondition; empty when the batch may start
pub fn unmet_preconditions(session: &UploadSessionState, wallet: &WalletSession) -> Vec<String> {
    let mut reasons = Vec::new();
    let data = &session.data;

    if wallet.signer.is_none() {
        reasons.push("wallet not connected".to_string());
    }
    if !present(&wallet.address) {
        reasons.push("wallet address unavailable".to_string());
    }
    if !present(&wallet.profile_id) {
        reasons.push("no profile associated with wallet".to_string());
    }
    if data.topics.is_empty() {
        reasons.push("at least one topic is required".to_string());
    } else if data.topics.iter().any(|t| t.trim().is_empty()) {
        reasons.push("topics cannot be blank".to_string());
    }

    match session.upload_type {
        UploadType::Collection => {
            if !present(&data.title) {
                reasons.push("collection title is required".to_string());
            }
            if !present(&data.description) {
                reasons.push("collection description is required".to_string());
            }
            if data.content_list.is_empty() && data.id_list.is_empty() {
                reasons.push("collection needs new content or existing assets".to_string());
            }
        }
        UploadType::Assets => {
            if data.content_list.is_empty() {
                reasons.push("no content to upload".to_string());
            }
        }
    }

    reasons
}

/// `Precondition` error listing every unmet precondition
pub fn check_preconditions(session: &UploadSessionState, wallet: &WalletSession) -> UploadResult<()> {
    let reasons = unmet_preconditions(session, wallet);
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(UploadError::Precondition(reasons))
    }
}

/// Batch upload of atomic assets
///
/// Each content item runs its whole lifecycle before the next starts:
/// spawn the asset process with the file as data, wait for it to be
/// indexed, evaluate the token source in it and register it on the
/// profile. A failed item is recorded and the batch moves on.
use crate::{
    ao::{MessageRequest, ProcessClient, SpawnRequest},
    config::UploaderConfig,
    error::{UploadError, UploadResult},
    gql::{AssetIdentifier, QueryService},
    metrics,
    storage::{detect_content_type, ContentUploader},
    tags::values,
    upload::{
        checks::check_preconditions,
        collection::{assemble_collection, CollectionOutcome, CollectionRequest},
        metadata::{asset_tags, resolve_description, resolve_title},
        poll::{await_process, PollPolicy, Sleeper, TokioSleeper},
        template::{render_token_source, TemplateSource, TokenParams},
        UploadContentItem, UploadSessionState, UploadType,
    },
    wallet::{DataItemSigner, WalletSession},
};
use std::{fmt, sync::Arc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

/// Fixed parameters of every batch
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub module: String,
    pub scheduler: String,
    /// Transaction holding the token process source
    pub token_template: String,
    /// Gateway polled for spawned processes
    pub query_gateway: String,
    pub ticker: String,
    pub denomination: String,
    pub poll: PollPolicy,
}

impl UploadSettings {
    pub fn from_config(config: &UploaderConfig) -> UploadResult<Self> {
        let token_template = config
            .ao
            .token_template
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| UploadError::Config("UPLOADER_AO_TOKEN_TEMPLATE is not set".to_string()))?;

        Ok(Self {
            module: config.ao.module.clone(),
            scheduler: config.ao.scheduler.clone(),
            token_template,
            query_gateway: config.gateways.goldsky.clone(),
            ticker: config.upload.ticker.clone(),
            denomination: config.upload.denomination.clone(),
            poll: PollPolicy {
                attempts: config.upload.poll_attempts,
                delay: config.upload.poll_delay(),
            },
        })
    }
}

/// Result of one content item; `index` is 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Success { index: usize, asset_id: AssetIdentifier },
    Failure { index: usize, reason: String },
}

impl ItemOutcome {
    pub fn index(&self) -> usize {
        match self {
            ItemOutcome::Success { index, .. } | ItemOutcome::Failure { index, .. } => *index,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ItemOutcome::Failure { .. })
    }
}

/// Progress notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    ItemStarted {
        index: usize,
        total: usize,
        file_name: String,
    },
    ItemFinished(ItemOutcome),
    CollectionStarted,
    CollectionFinished(CollectionOutcome),
}

impl fmt::Display for UploadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadEvent::ItemStarted {
                index,
                total,
                file_name,
            } => write!(f, "Uploading file {} of {} ({})", index, total, file_name),
            UploadEvent::ItemFinished(ItemOutcome::Success { index, asset_id }) => {
                write!(f, "File {} created asset {}", index, asset_id)
            }
            UploadEvent::ItemFinished(ItemOutcome::Failure { index, reason }) => {
                write!(f, "File {} failed: {}", index, reason)
            }
            UploadEvent::CollectionStarted => write!(f, "Creating collection"),
            UploadEvent::CollectionFinished(CollectionOutcome::Created(id)) => {
                write!(f, "Collection created: {}", id)
            }
            UploadEvent::CollectionFinished(CollectionOutcome::Failed(reason)) => {
                write!(f, "Collection failed: {}", reason)
            }
        }
    }
}

/// Everything a batch produced, plus the session to keep afterwards
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub outcomes: Vec<ItemOutcome>,
    pub collection: Option<CollectionOutcome>,
    pub session: UploadSessionState,
}

impl UploadReport {
    pub fn created_ids(&self) -> Vec<AssetIdentifier> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ItemOutcome::Success { asset_id, .. } => Some(asset_id.clone()),
                ItemOutcome::Failure { .. } => None,
            })
            .collect()
    }

    /// Collection failure if any, else the last item failure
    pub fn last_error(&self) -> Option<&str> {
        if let Some(CollectionOutcome::Failed(reason)) = &self.collection {
            return Some(reason);
        }
        self.outcomes.iter().rev().find_map(|outcome| match outcome {
            ItemOutcome::Failure { reason, .. } => Some(reason.as_str()),
            ItemOutcome::Success { .. } => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.last_error().is_none()
    }
}

pub struct Uploader {
    process: Arc<dyn ProcessClient>,
    query: Arc<dyn QueryService>,
    templates: Arc<dyn TemplateSource>,
    /// Banner and thumbnail images
    media: Arc<dyn ContentUploader>,
    /// Collection manifests
    manifests: Arc<dyn ContentUploader>,
    sleeper: Arc<dyn Sleeper>,
    settings: UploadSettings,
    events: Option<UnboundedSender<UploadEvent>>,
}

impl Uploader {
    pub fn new(
        process: Arc<dyn ProcessClient>,
        query: Arc<dyn QueryService>,
        templates: Arc<dyn TemplateSource>,
        media: Arc<dyn ContentUploader>,
        manifests: Arc<dyn ContentUploader>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            process,
            query,
            templates,
            media,
            manifests,
            sleeper: Arc::new(TokioSleeper),
            settings,
            events: None,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<UploadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(events) = &self.events {
            // receiver may be gone; progress is best effort
            let _ = events.send(event);
        }
    }

    /// Run a batch. Fails up front with every unmet precondition; after
    /// that, failures are reported per item in the returned report.
    pub async fn run(
        &self,
        session: &UploadSessionState,
        wallet: &WalletSession,
    ) -> UploadResult<UploadReport> {
        check_preconditions(session, wallet)?;
        let signer = wallet.signer()?;
        let creator = wallet.address()?;
        let profile_id = wallet.profile_id()?;

        let active = session.with_active(true);
        let total = active.data.content_list.len();
        info!("Starting {:?} upload of {} file(s)", active.upload_type, total);

        let mut outcomes = Vec::with_capacity(total);
        for (position, item) in active.data.content_list.iter().enumerate() {
            let index = position + 1;
            self.emit(UploadEvent::ItemStarted {
                index,
                total,
                file_name: item.file_name(),
            });

            let outcome = match self
                .upload_item(&active, item, index, signer.as_ref(), profile_id)
                .await
            {
                Ok(asset_id) => {
                    info!("Asset {} of {} created: {}", index, total, asset_id);
                    metrics::record_item("success");
                    ItemOutcome::Success { index, asset_id }
                }
                Err(e) => {
                    error!("Asset {} of {} failed: {}", index, total, e);
                    metrics::record_item("failure");
                    ItemOutcome::Failure {
                        index,
                        reason: e.to_string(),
                    }
                }
            };
            self.emit(UploadEvent::ItemFinished(outcome.clone()));
            outcomes.push(outcome);
        }

        let any_failed = outcomes.iter().any(ItemOutcome::is_failure);
        let created: Vec<AssetIdentifier> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ItemOutcome::Success { asset_id, .. } => Some(asset_id.clone()),
                ItemOutcome::Failure { .. } => None,
            })
            .collect();

        let collection = match active.upload_type {
            UploadType::Collection if any_failed => {
                warn!("Skipping collection assembly after item failure");
                None
            }
            UploadType::Collection => {
                self.emit(UploadEvent::CollectionStarted);
                let date_created = chrono::Utc::now().timestamp_millis().to_string();
                let request = CollectionRequest {
                    session: &active,
                    creator,
                    profile_id,
                    ticker: &self.settings.ticker,
                    date_created: &date_created,
                    created: &created,
                };
                let outcome = assemble_collection(
                    &request,
                    self.media.as_ref(),
                    self.manifests.as_ref(),
                    signer.as_ref(),
                )
                .await;
                self.emit(UploadEvent::CollectionFinished(outcome.clone()));
                Some(outcome)
            }
            UploadType::Assets => None,
        };

        let completed = match active.upload_type {
            UploadType::Collection => matches!(collection, Some(CollectionOutcome::Created(_))),
            UploadType::Assets => !created.is_empty(),
        };
        let session = if completed {
            active.cleared()
        } else {
            active.with_active(false)
        };

        Ok(UploadReport {
            outcomes,
            collection,
            session,
        })
    }

    async fn upload_item(
        &self,
        session: &UploadSessionState,
        item: &UploadContentItem,
        index: usize,
        signer: &dyn DataItemSigner,
        profile_id: &str,
    ) -> UploadResult<AssetIdentifier> {
        let title = resolve_title(item, session, index);
        let description = resolve_description(item, session);
        let date_created = chrono::Utc::now().timestamp_millis().to_string();
        let balance = session.balance();

        let data = tokio::fs::read(&item.path).await?;
        let content_type = detect_content_type(&item.path, &data, item.content_type.as_deref());
        let tags = asset_tags(session, &content_type, &title, &description, &date_created);

        let template = self.templates.fetch(&self.settings.token_template).await?;
        let source = render_token_source(
            &template,
            &TokenParams {
                owner: profile_id,
                name: &title,
                ticker: &self.settings.ticker,
                denomination: &self.settings.denomination,
                balance,
            },
        );

        let process_id = self
            .process
            .spawn(
                SpawnRequest {
                    module: self.settings.module.clone(),
                    scheduler: self.settings.scheduler.clone(),
                    tags,
                    data,
                },
                signer,
            )
            .await?;
        info!("Spawned process {} for {}", process_id, title);

        await_process(
            self.query.as_ref(),
            &self.settings.query_gateway,
            &process_id,
            &self.settings.poll,
            self.sleeper.as_ref(),
        )
        .await?;

        let eval = self
            .process
            .message(MessageRequest::action(&process_id, values::EVAL, source), signer)
            .await?;
        let result = self.process.result(&eval, &process_id).await?;
        if let Some(reason) = result.error_message() {
            return Err(UploadError::Process(format!(
                "Evaluation failed in {}: {}",
                process_id, reason
            )));
        }

        let registration = serde_json::json!({ "Id": process_id, "Quantity": balance });
        let registered = self
            .process
            .message(
                MessageRequest::action(profile_id, values::ADD_UPLOADED_ASSET, registration.to_string()),
                signer,
            )
            .await?;
        info!("Registered {} on profile {} ({})", process_id, profile_id, registered);

        Ok(process_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_last_error_prefers_collection() {
        let report = UploadReport {
            outcomes: vec![
                ItemOutcome::Success {
                    index: 1,
                    asset_id: "a".to_string(),
                },
                ItemOutcome::Failure {
                    index: 2,
                    reason: "item".to_string(),
                },
            ],
            collection: Some(CollectionOutcome::Failed("collection".to_string())),
            session: UploadSessionState::default(),
        };
        assert_eq!(report.last_error(), Some("collection"));
        assert_eq!(report.created_ids(), vec!["a"]);
        assert!(!report.is_success());
    }

    #[test]
    fn test_event_display() {
        let event = UploadEvent::ItemStarted {
            index: 2,
            total: 3,
            file_name: "b.png".to_string(),
        };
        assert_eq!(event.to_string(), "Uploading file 2 of 3 (b.png)");
    }

    #[test]
    fn test_settings_require_template() {
        let mut config = UploaderConfig::default();
        config.ao.token_template = None;
        assert!(matches!(
            UploadSettings::from_config(&config),
            Err(UploadError::Config(_))
        ));

        config.ao.token_template = Some("tmpl".to_string());
        let settings = UploadSettings::from_config(&config).unwrap();
        assert_eq!(settings.poll, PollPolicy::default());
        assert_eq!(settings.ticker, "ATOMIC");
    }
}

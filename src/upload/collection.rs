/// Collection assembly
///
/// A collection is a JSON manifest listing asset ids, uploaded as a tagged
/// data item. Its `Init-State` tag seeds one unit to the creator.
use crate::{
    gql::AssetIdentifier,
    metrics,
    storage::{ContentUploader, DataUrl},
    tags::{keys, values, Tag},
    upload::UploadSessionState,
    wallet::DataItemSigner,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    Created(String),
    Failed(String),
}

impl CollectionOutcome {
    pub fn id(&self) -> Option<&str> {
        match self {
            CollectionOutcome::Created(id) => Some(id),
            CollectionOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionInitState<'a> {
    balances: BTreeMap<&'a str, u64>,
    creator: &'a str,
    name: &'a str,
    description: &'a str,
    ticker: &'a str,
    date_created: &'a str,
    claimable: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CollectionBody<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    items: Vec<&'a str>,
}

/// Inputs to one collection assembly
#[derive(Debug, Clone)]
pub struct CollectionRequest<'a> {
    pub session: &'a UploadSessionState,
    pub creator: &'a str,
    pub profile_id: &'a str,
    pub ticker: &'a str,
    /// Milliseconds since the epoch
    pub date_created: &'a str,
    /// Asset ids created by this batch
    pub created: &'a [AssetIdentifier],
}

impl CollectionRequest<'_> {
    fn name(&self) -> &str {
        self.session.data.title.as_deref().unwrap_or_default()
    }

    fn description(&self) -> &str {
        self.session.data.description.as_deref().unwrap_or_default()
    }

    pub fn init_state(&self) -> serde_json::Result<String> {
        serde_json::to_string(&CollectionInitState {
            balances: BTreeMap::from([(self.creator, 1)]),
            creator: self.creator,
            name: self.name(),
            description: self.description(),
            ticker: self.ticker,
            date_created: self.date_created,
            claimable: Vec::new(),
        })
    }

    /// Newly created ids first, then previously selected ones
    pub fn body(&self) -> serde_json::Result<Vec<u8>> {
        let items = self
            .created
            .iter()
            .chain(self.session.data.id_list.iter())
            .map(String::as_str)
            .collect();
        serde_json::to_vec(&CollectionBody {
            kind: values::COLLECTION,
            items,
        })
    }

    pub fn tags(&self, init_state: String, banner: Option<&str>, thumbnail: Option<&str>) -> Vec<Tag> {
        let mut tags = vec![
            Tag::new(keys::CONTENT_TYPE, values::JSON),
            Tag::new(keys::INIT_STATE, init_state),
            Tag::new(keys::CREATOR, self.creator),
            Tag::new(keys::PROFILE_CREATOR, self.profile_id),
            Tag::new(keys::DATA_PROTOCOL, values::COLLECTION),
            Tag::new(keys::TITLE, self.name()),
            Tag::new(keys::DESCRIPTION, self.description()),
            Tag::new(keys::TYPE, values::DOCUMENT),
            Tag::new(keys::DATE_CREATED, self.date_created),
            Tag::new(keys::NAME, self.name()),
        ];
        if let Some(banner) = banner {
            tags.push(Tag::new(keys::BANNER, banner));
        }
        if let Some(thumbnail) = thumbnail {
            tags.push(Tag::new(keys::THUMBNAIL, thumbnail));
        }
        tags
    }
}

/// Upload a data-URL image; any failure leaves the reference unset
pub async fn upload_media(
    uploader: &dyn ContentUploader,
    data_url: Option<&str>,
    label: &str,
    signer: &dyn DataItemSigner,
) -> Option<String> {
    let data_url = data_url.filter(|u| !u.is_empty())?;

    let image = match DataUrl::parse(data_url) {
        Ok(image) => image,
        Err(e) => {
            warn!("Skipping {}: {}", label, e);
            return None;
        }
    };

    let tags = vec![Tag::new(keys::CONTENT_TYPE, image.content_type.as_str())];
    match uploader.upload(image.data, tags, signer).await {
        Ok(id) => {
            info!("Uploaded {} as {}", label, id);
            Some(id)
        }
        Err(e) => {
            warn!("Failed to upload {}: {}", label, e);
            None
        }
    }
}

/// Upload banner and thumbnail, then the collection manifest
pub async fn assemble_collection(
    request: &CollectionRequest<'_>,
    media: &dyn ContentUploader,
    manifests: &dyn ContentUploader,
    signer: &dyn DataItemSigner,
) -> CollectionOutcome {
    let data = &request.session.data;
    let banner = upload_media(media, data.banner.as_deref(), "banner", signer).await;
    let thumbnail = upload_media(media, data.thumbnail.as_deref(), "thumbnail", signer).await;

    let prepared = request
        .init_state()
        .and_then(|init_state| Ok((init_state, request.body()?)));
    let (init_state, body) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("Failed to encode collection: {}", e);
            metrics::record_collection("failed");
            return CollectionOutcome::Failed(e.to_string());
        }
    };

    let tags = request.tags(init_state, banner.as_deref(), thumbnail.as_deref());
    match manifests.upload(body, tags, signer).await {
        Ok(id) => {
            info!("Collection created: {}", id);
            metrics::record_collection("created");
            CollectionOutcome::Created(id)
        }
        Err(e) => {
            error!("Collection upload failed: {}", e);
            metrics::record_collection("failed");
            CollectionOutcome::Failed(e.to_string())
        }
    }
}

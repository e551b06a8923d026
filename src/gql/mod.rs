/// Query service
///
/// Arweave GraphQL lookups of transactions by id, owner and tags, with
/// cursor pagination.

pub mod client;

pub use client::GqlClient;

use crate::{
    error::UploadResult,
    tags::{self, Tag},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque id of a network transaction or process
pub type AssetIdentifier = String;

/// Largest page the gateways accept
pub const MAX_PAGE_SIZE: usize = 100;

/// Metadata of one on-chain record, used for display only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetIdentifier,
    pub tags: Vec<Tag>,
    pub owner: Option<String>,
}

impl AssetRecord {
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        tags::tag_value(&self.tags, name)
    }
}

/// Match records carrying tag `name` with any of `values`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFilter {
    pub name: String,
    pub values: Vec<String>,
}

impl TagFilter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }
}

/// One GraphQL transactions query
#[derive(Debug, Clone, Default)]
pub struct GqlQuery {
    pub gateway: String,
    pub ids: Vec<AssetIdentifier>,
    pub owners: Vec<String>,
    pub tag_filters: Vec<TagFilter>,
    pub cursor: Option<String>,
    pub first: Option<usize>,
}

impl GqlQuery {
    pub fn by_ids(gateway: impl Into<String>, ids: &[AssetIdentifier]) -> Self {
        Self {
            gateway: gateway.into(),
            ids: ids.to_vec(),
            ..Default::default()
        }
    }

    pub fn by_owner(gateway: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            owners: vec![owner.into()],
            ..Default::default()
        }
    }
}

/// One page of results
#[derive(Debug, Clone, Default)]
pub struct GqlPage {
    pub data: Vec<AssetRecord>,
    /// Cursor of the following page, `None` on the last page
    pub next_cursor: Option<String>,
}

/// Query service consumed by the listing and upload workflows
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Run a single page query
    async fn query(&self, query: GqlQuery) -> UploadResult<GqlPage>;

    /// Run a query and follow cursors until the last page
    async fn query_all(&self, mut query: GqlQuery) -> UploadResult<Vec<AssetRecord>> {
        let mut records = Vec::new();
        loop {
            let page = self.query(query.clone()).await?;
            records.extend(page.data);
            match page.next_cursor {
                Some(cursor) => query.cursor = Some(cursor),
                None => break,
            }
        }
        Ok(records)
    }

    /// Fetch full records for the given ids
    async fn fetch_by_ids(
        &self,
        gateway: &str,
        ids: &[AssetIdentifier],
    ) -> UploadResult<Vec<AssetRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_all(GqlQuery::by_ids(gateway, ids)).await
    }

    /// Ids of every atomic asset owned by `owner`
    async fn asset_ids_by_owner(
        &self,
        gateway: &str,
        owner: &str,
    ) -> UploadResult<Vec<AssetIdentifier>> {
        let mut query = GqlQuery::by_owner(gateway, owner);
        query.tag_filters = vec![TagFilter::new(tags::keys::IMPLEMENTS, tags::values::ANS_VERSION)];
        query.first = Some(MAX_PAGE_SIZE);
        let records = self.query_all(query).await?;
        Ok(records.into_iter().map(|r| r.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves fixed pages keyed by cursor
    struct PagedFake {
        calls: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl QueryService for PagedFake {
        async fn query(&self, query: GqlQuery) -> UploadResult<GqlPage> {
            self.calls.lock().unwrap().push(query.cursor.clone());
            let record = |id: &str| AssetRecord {
                id: id.to_string(),
                tags: vec![],
                owner: None,
            };
            Ok(match query.cursor.as_deref() {
                None => GqlPage {
                    data: vec![record("a"), record("b")],
                    next_cursor: Some("c1".to_string()),
                },
                Some("c1") => GqlPage {
                    data: vec![record("c")],
                    next_cursor: None,
                },
                Some(_) => GqlPage::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_asset_ids_follow_cursors() {
        let fake = PagedFake {
            calls: Mutex::new(Vec::new()),
        };
        let ids = fake.asset_ids_by_owner("arweave.net", "owner").await.unwrap();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(
            *fake.calls.lock().unwrap(),
            vec![None, Some("c1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_fetch_by_ids_empty_skips_network() {
        let fake = PagedFake {
            calls: Mutex::new(Vec::new()),
        };
        let records = fake.fetch_by_ids("arweave.net", &[]).await.unwrap();
        assert!(records.is_empty());
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_record_tag_value() {
        let record = AssetRecord {
            id: "id".to_string(),
            tags: vec![Tag::new("Title", "Sunset")],
            owner: None,
        };
        assert_eq!(record.tag_value("Title"), Some("Sunset"));
    }
}

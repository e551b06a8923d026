/// Listing state for the assets owned by a wallet
use crate::{
    assets::pagination::{build_group_index, parse_index_label, GroupIndex, GroupingMode},
    error::{UploadError, UploadResult},
    gql::{AssetIdentifier, AssetRecord, QueryService},
    tags::keys,
    upload::UploadSessionState,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

const UNTITLED: &str = "Title not found";

/// Listing configuration
#[derive(Debug, Clone)]
pub struct AssetsTableConfig {
    pub gateway: String,
    pub page_size: usize,
    pub grouping: GroupingMode,
    /// Prefix of the public asset page, the id is appended
    pub asset_url_base: String,
}

impl Default for AssetsTableConfig {
    fn default() -> Self {
        Self {
            gateway: "arweave.net".to_string(),
            page_size: 10,
            grouping: GroupingMode::Positional,
            asset_url_base: "https://bazar.arweave.net/#/asset/".to_string(),
        }
    }
}

/// One displayable asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRow {
    pub id: AssetIdentifier,
    pub title: String,
    pub url: String,
    pub selected: bool,
}

/// The currently visible page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub total: usize,
    pub rows: Vec<AssetRow>,
    /// 1-based position of the first row in the full list
    pub first: usize,
    /// 1-based position of the last row in the full list
    pub last: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// What the listing shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    /// No wallet address, nothing was fetched
    ConnectRequired,
    Loading,
    /// Connected but nothing loaded yet
    NotLoaded,
    NoAssets,
    Page(PageView),
}

/// Paginated asset listing with an independent selected-asset fetch
pub struct AssetsTable {
    query: Arc<dyn QueryService>,
    config: AssetsTableConfig,
    wallet_address: Option<String>,
    group_index: Option<GroupIndex>,
    current_cursor: Option<String>,
    /// `None` until loaded, empty when the wallet owns nothing
    assets: Option<Vec<AssetRecord>>,
    selected_assets: Option<Vec<AssetRecord>>,
    id_count: usize,
    loading: bool,
}

impl AssetsTable {
    pub fn new(query: Arc<dyn QueryService>, config: AssetsTableConfig) -> Self {
        Self {
            query,
            config,
            wallet_address: None,
            group_index: None,
            current_cursor: None,
            assets: None,
            selected_assets: None,
            id_count: 0,
            loading: false,
        }
    }

    /// Re-fetch the owned id list; run on wallet change and whenever an
    /// upload starts or finishes
    pub async fn refresh(&mut self, wallet_address: Option<&str>) -> UploadResult<()> {
        self.wallet_address = wallet_address.filter(|a| !a.is_empty()).map(String::from);
        let Some(address) = self.wallet_address.clone() else {
            debug!("No wallet address, skipping asset fetch");
            return Ok(());
        };

        self.loading = true;
        let ids = match self.query.asset_ids_by_owner(&self.config.gateway, &address).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to fetch asset ids for {}: {}", address, e);
                self.loading = false;
                return Err(e);
            }
        };

        self.id_count = ids.len();
        let index = build_group_index(&ids, self.config.page_size, self.config.grouping);
        let first = index.first_label().map(String::from);
        self.group_index = Some(index);

        match first {
            Some(label) => self.select_page(&label).await,
            None => {
                self.current_cursor = None;
                self.assets = Some(Vec::new());
                self.loading = false;
                Ok(())
            }
        }
    }

    /// Fetch full records for just the page carrying `label`
    pub async fn select_page(&mut self, label: &str) -> UploadResult<()> {
        let index = self
            .group_index
            .as_ref()
            .ok_or_else(|| UploadError::Validation("Asset pages not loaded".to_string()))?;

        // Unknown labels leave the listing as it was
        let Some(group) = index.page(label) else {
            debug!("No asset page {}", label);
            return Ok(());
        };
        let ids = group.ids.clone();

        self.loading = true;
        let result = self.query.fetch_by_ids(&self.config.gateway, &ids).await;
        self.loading = false;

        match result {
            Ok(records) => {
                self.current_cursor = Some(label.to_string());
                self.assets = Some(order_like(records, &ids));
                Ok(())
            }
            Err(e) => {
                error!("Failed to fetch assets for page {}: {}", label, e);
                Err(e)
            }
        }
    }

    /// Move to the next page; `false` when already on the last one
    pub async fn next_page(&mut self) -> UploadResult<bool> {
        match self.next_cursor() {
            Some(label) => self.select_page(&label).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// Move to the previous page; `false` when already on the first one
    pub async fn previous_page(&mut self) -> UploadResult<bool> {
        match self.previous_cursor() {
            Some(label) => self.select_page(&label).await.map(|_| true),
            None => Ok(false),
        }
    }

    pub fn next_cursor(&self) -> Option<String> {
        let index = self.group_index.as_ref()?;
        index.next_label(self.current_cursor.as_deref()?)
    }

    pub fn previous_cursor(&self) -> Option<String> {
        let index = self.group_index.as_ref()?;
        index.previous_label(self.current_cursor.as_deref()?)
    }

    /// Fetch records for the externally selected ids. An empty selection
    /// resolves to an empty list without a network call.
    pub async fn refresh_selected(&mut self, ids: &[AssetIdentifier]) -> UploadResult<()> {
        if ids.is_empty() {
            self.selected_assets = Some(Vec::new());
            return Ok(());
        }

        match self.query.fetch_by_ids(&self.config.gateway, ids).await {
            Ok(records) => {
                self.selected_assets = Some(order_like(records, ids));
                Ok(())
            }
            Err(e) => {
                error!("Failed to fetch selected assets: {}", e);
                Err(e)
            }
        }
    }

    /// Add or remove an existing asset from the session selection
    pub fn toggle_selection(&self, session: &UploadSessionState, id: &str) -> UploadSessionState {
        session.with_id_toggled(id)
    }

    pub fn current_cursor(&self) -> Option<&str> {
        self.current_cursor.as_deref()
    }

    pub fn id_count(&self) -> usize {
        self.id_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn group_index(&self) -> Option<&GroupIndex> {
        self.group_index.as_ref()
    }

    /// Current listing view; `selection` marks selected rows
    pub fn view(&self, selection: &[AssetIdentifier]) -> TableView {
        if self.wallet_address.is_none() {
            return TableView::ConnectRequired;
        }
        if self.loading {
            return TableView::Loading;
        }

        match &self.assets {
            None => TableView::NotLoaded,
            Some(records) if records.is_empty() => TableView::NoAssets,
            Some(records) => {
                let position = self
                    .current_cursor
                    .as_deref()
                    .and_then(parse_index_label)
                    .unwrap_or(0);
                let offset = position * self.config.page_size;

                TableView::Page(PageView {
                    total: self.id_count,
                    rows: self.rows(records, selection),
                    first: offset + 1,
                    last: offset + records.len(),
                    next: self.next_cursor(),
                    previous: self.previous_cursor(),
                })
            }
        }
    }

    /// Fetched selected assets still present in `selection`
    pub fn selected_view(&self, selection: &[AssetIdentifier]) -> Vec<AssetRow> {
        match &self.selected_assets {
            Some(records) if !selection.is_empty() => {
                let current: Vec<AssetRecord> = records
                    .iter()
                    .filter(|r| selection.contains(&r.id))
                    .cloned()
                    .collect();
                self.rows(&current, selection)
            }
            _ => Vec::new(),
        }
    }

    fn rows(&self, records: &[AssetRecord], selection: &[AssetIdentifier]) -> Vec<AssetRow> {
        records
            .iter()
            .map(|record| AssetRow {
                id: record.id.clone(),
                title: display_title(record),
                url: format!("{}{}", self.config.asset_url_base, record.id),
                selected: selection.contains(&record.id),
            })
            .collect()
    }
}

/// `Title` tag, else the shortened id
pub fn display_title(record: &AssetRecord) -> String {
    match record.tag_value(keys::TITLE).filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => {
            let short = format_address(&record.id);
            if short.is_empty() {
                UNTITLED.to_string()
            } else {
                short
            }
        }
    }
}

/// `abcdef...uvwxyz1` style shortening of long ids
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 16 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 7..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Reorder `records` to follow `ids`; records not in `ids` go last
fn order_like(records: Vec<AssetRecord>, ids: &[AssetIdentifier]) -> Vec<AssetRecord> {
    let rank: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    let mut records = records;
    records.sort_by_key(|r| rank.get(r.id.as_str()).copied().unwrap_or(usize::MAX));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gql::{GqlPage, GqlQuery};
    use crate::tags::Tag;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Owns `owned` ids; answers id lookups with records titled by id
    struct FakeQuery {
        owned: Vec<String>,
        queries: Mutex<Vec<GqlQuery>>,
        fail_ids: AtomicBool,
    }

    impl FakeQuery {
        fn new(owned: usize) -> Self {
            Self {
                owned: (0..owned).map(|i| format!("asset{:02}", i)).collect(),
                queries: Mutex::new(Vec::new()),
                fail_ids: AtomicBool::new(false),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl QueryService for FakeQuery {
        async fn query(&self, query: GqlQuery) -> UploadResult<GqlPage> {
            self.queries.lock().unwrap().push(query.clone());
            if !query.owners.is_empty() {
                let data = self
                    .owned
                    .iter()
                    .map(|id| AssetRecord {
                        id: id.clone(),
                        tags: vec![],
                        owner: query.owners.first().cloned(),
                    })
                    .collect();
                return Ok(GqlPage {
                    data,
                    next_cursor: None,
                });
            }
            if self.fail_ids.load(Ordering::SeqCst) {
                return Err(UploadError::Query("gateway down".to_string()));
            }
            // reversed to check ordering is restored
            let data = query
                .ids
                .iter()
                .rev()
                .map(|id| AssetRecord {
                    id: id.clone(),
                    tags: vec![Tag::new("Title", format!("Title {}", id))],
                    owner: None,
                })
                .collect();
            Ok(GqlPage {
                data,
                next_cursor: None,
            })
        }
    }

    fn table(query: Arc<FakeQuery>) -> AssetsTable {
        AssetsTable::new(
            query,
            AssetsTableConfig {
                page_size: 10,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_no_wallet_means_no_fetch() {
        let query = Arc::new(FakeQuery::new(5));
        let mut table = table(query.clone());

        table.refresh(None).await.unwrap();
        assert_eq!(query.query_count(), 0);
        assert_eq!(table.view(&[]), TableView::ConnectRequired);
    }

    #[tokio::test]
    async fn test_empty_wallet_has_no_pages_and_no_record_fetch() {
        let query = Arc::new(FakeQuery::new(0));
        let mut table = table(query.clone());

        table.refresh(Some("owner")).await.unwrap();
        assert_eq!(query.query_count(), 1);
        assert!(table.group_index().unwrap().is_empty());
        assert_eq!(table.view(&[]), TableView::NoAssets);
    }

    #[tokio::test]
    async fn test_first_page_loaded_in_order() {
        let query = Arc::new(FakeQuery::new(25));
        let mut table = table(query.clone());

        table.refresh(Some("owner")).await.unwrap();
        assert_eq!(table.current_cursor(), Some("index-0"));

        let TableView::Page(page) = table.view(&["asset03".to_string()]) else {
            panic!("expected a page");
        };
        assert_eq!(page.total, 25);
        assert_eq!(page.rows.len(), 10);
        assert_eq!(page.rows[0].id, "asset00");
        assert_eq!(page.rows[0].title, "Title asset00");
        assert!(page.rows[3].selected);
        assert_eq!((page.first, page.last), (1, 10));
        assert_eq!(page.next.as_deref(), Some("index-1"));
        assert_eq!(page.previous, None);
    }

    #[tokio::test]
    async fn test_paging_forward_to_last_page() {
        let query = Arc::new(FakeQuery::new(25));
        let mut table = table(query.clone());
        table.refresh(Some("owner")).await.unwrap();

        assert!(table.next_page().await.unwrap());
        assert!(table.next_page().await.unwrap());
        assert!(!table.next_page().await.unwrap());

        let TableView::Page(page) = table.view(&[]) else {
            panic!("expected a page");
        };
        assert_eq!(page.rows.len(), 5);
        assert_eq!((page.first, page.last), (21, 25));
        assert_eq!(page.next, None);
        assert_eq!(page.previous.as_deref(), Some("index-1"));

        // only the visible page's ids were requested
        let last = query.queries.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.ids.len(), 5);
    }

    #[tokio::test]
    async fn test_selected_empty_skips_network() {
        let query = Arc::new(FakeQuery::new(3));
        let mut table = table(query.clone());

        table.refresh_selected(&[]).await.unwrap();
        assert_eq!(query.query_count(), 0);
        assert!(table.selected_view(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_selected_view_filters_by_live_selection() {
        let query = Arc::new(FakeQuery::new(3));
        let mut table = table(query.clone());

        let selection = vec!["x".to_string(), "y".to_string()];
        table.refresh_selected(&selection).await.unwrap();
        let rows = table.selected_view(&["y".to_string()]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "y");
        assert!(rows[0].selected);
    }

    #[tokio::test]
    async fn test_failed_page_fetch_clears_loading() {
        let query = Arc::new(FakeQuery::new(25));
        query.fail_ids.store(true, Ordering::SeqCst);
        let mut table = table(query.clone());

        assert!(table.refresh(Some("owner")).await.is_err());
        assert!(!table.is_loading());
        assert_eq!(table.view(&[]), TableView::NotLoaded);

        // a failure after a page has loaded keeps that page
        query.fail_ids.store(false, Ordering::SeqCst);
        table.refresh(Some("owner")).await.unwrap();
        let before = table.view(&[]);

        query.fail_ids.store(true, Ordering::SeqCst);
        assert!(table.next_page().await.is_err());
        assert!(!table.is_loading());
        assert_eq!(table.current_cursor(), Some("index-0"));
        assert_eq!(table.view(&[]), before);

        let TableView::Page(page) = before else {
            panic!("expected a page");
        };
        assert_eq!((page.first, page.last), (1, 10));
        assert_eq!(page.rows[0].id, "asset00");
    }

    #[tokio::test]
    async fn test_unknown_page_label_keeps_listing() {
        let query = Arc::new(FakeQuery::new(25));
        let mut table = table(query.clone());
        table.refresh(Some("owner")).await.unwrap();
        assert_eq!(table.group_index().unwrap().len(), 3);

        let before = table.view(&[]);
        let fetches = query.query_count();

        table.select_page("index-9").await.unwrap();
        assert_eq!(table.view(&[]), before);
        assert_eq!(table.current_cursor(), Some("index-0"));
        assert_eq!(query.query_count(), fetches);
        assert!(matches!(before, TableView::Page(_)));
    }

    #[test]
    fn test_toggle_selection_is_copy_on_write() {
        let table = table(Arc::new(FakeQuery::new(0)));
        let session = UploadSessionState::default();
        let next = table.toggle_selection(&session, "abc");
        assert_eq!(next.data.id_list, vec!["abc"]);
        assert!(session.data.id_list.is_empty());
    }

    #[test]
    fn test_display_title_fallbacks() {
        let record = AssetRecord {
            id: "0123456789abcdefghijklmnopqrstuvwxyzABCDEFG".to_string(),
            tags: vec![],
            owner: None,
        };
        assert_eq!(display_title(&record), "012345...ABCDEFG");

        let empty = AssetRecord {
            id: String::new(),
            tags: vec![],
            owner: None,
        };
        assert_eq!(display_title(&empty), UNTITLED);
    }
}

/// Asset listing tests
/// Pages through a wallet's assets served by a cursor-paginated fake gateway
use async_trait::async_trait;
use atomic_uploader::{
    assets::{AssetsTable, AssetsTableConfig, GroupingMode, TableView},
    error::UploadResult,
    gql::{AssetRecord, GqlPage, GqlQuery, QueryService},
    tags::Tag,
};
use std::sync::{Arc, Mutex};

/// Serves `owned` ids to owner queries two at a time, and records by id
struct PagedGateway {
    owned: Vec<String>,
    queries: Mutex<Vec<GqlQuery>>,
}

impl PagedGateway {
    fn new(count: usize) -> Self {
        Self {
            owned: (0..count).map(|i| format!("asset-{:02}", i)).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QueryService for PagedGateway {
    async fn query(&self, query: GqlQuery) -> UploadResult<GqlPage> {
        self.queries.lock().unwrap().push(query.clone());

        if !query.ids.is_empty() {
            // records come back in reverse to exercise reordering
            let data = query
                .ids
                .iter()
                .rev()
                .map(|id| AssetRecord {
                    id: id.clone(),
                    tags: vec![Tag::new("Title", format!("Title of {}", id))],
                    owner: None,
                })
                .collect();
            return Ok(GqlPage {
                data,
                next_cursor: None,
            });
        }

        let start: usize = query.cursor.as_deref().map_or(0, |c| c.parse().unwrap());
        let end = (start + 2).min(self.owned.len());
        let data = self.owned[start..end]
            .iter()
            .map(|id| AssetRecord {
                id: id.clone(),
                ..Default::default()
            })
            .collect();
        Ok(GqlPage {
            data,
            next_cursor: (end < self.owned.len()).then(|| end.to_string()),
        })
    }
}

fn table(gateway: Arc<PagedGateway>) -> AssetsTable {
    AssetsTable::new(
        gateway,
        AssetsTableConfig {
            gateway: "arweave.net".to_string(),
            page_size: 4,
            grouping: GroupingMode::Positional,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_walk_every_page() {
    let gateway = Arc::new(PagedGateway::new(9));
    let mut table = table(gateway.clone());

    table.refresh(Some("wallet")).await.unwrap();
    assert_eq!(table.id_count(), 9);
    assert_eq!(table.group_index().unwrap().len(), 3);

    let mut seen = Vec::new();
    loop {
        match table.view(&[]) {
            TableView::Page(view) => {
                assert_eq!(view.total, 9);
                seen.extend(view.rows.into_iter().map(|row| row.id));
            }
            other => panic!("unexpected view: {:?}", other),
        }
        if !table.next_page().await.unwrap() {
            break;
        }
    }

    let expected: Vec<String> = (0..9).map(|i| format!("asset-{:02}", i)).collect();
    assert_eq!(seen, expected);
    assert_eq!(table.current_cursor(), Some("index-2"));
    assert_eq!(table.next_cursor(), None);

    assert!(table.previous_page().await.unwrap());
    match table.view(&["asset-05".to_string()]) {
        TableView::Page(view) => {
            assert_eq!((view.first, view.last), (5, 8));
            assert_eq!(view.rows[0].title, "Title of asset-04");
            assert!(view.rows[1].selected);
            assert_eq!(view.previous.as_deref(), Some("index-0"));
            assert_eq!(view.next.as_deref(), Some("index-2"));
        }
        other => panic!("unexpected view: {:?}", other),
    }
}

#[tokio::test]
async fn test_record_fetches_only_cover_visible_page() {
    let gateway = Arc::new(PagedGateway::new(9));
    let mut table = table(gateway.clone());

    table.refresh(Some("wallet")).await.unwrap();

    let queries = gateway.queries.lock().unwrap();
    let id_queries: Vec<&GqlQuery> = queries.iter().filter(|q| !q.ids.is_empty()).collect();
    assert_eq!(id_queries.len(), 1);
    assert_eq!(id_queries[0].ids.len(), 4);

    let owner_queries = queries.iter().filter(|q| !q.owners.is_empty()).count();
    assert_eq!(owner_queries, 5);
}

#[tokio::test]
async fn test_disconnected_wallet_fetches_nothing() {
    let gateway = Arc::new(PagedGateway::new(3));
    let mut table = table(gateway.clone());

    table.refresh(None).await.unwrap();

    assert_eq!(table.view(&[]), TableView::ConnectRequired);
    assert!(gateway.queries.lock().unwrap().is_empty());
}

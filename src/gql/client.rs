/// GraphQL client for Arweave gateways
use crate::{
    error::{UploadError, UploadResult},
    gql::{AssetRecord, GqlPage, GqlQuery, QueryService, TagFilter},
    metrics,
    tags::Tag,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

const TRANSACTIONS_QUERY: &str = r#"
query ($ids: [ID!], $owners: [String!], $tags: [TagFilter!], $first: Int, $after: String) {
    transactions(ids: $ids, owners: $owners, tags: $tags, first: $first, after: $after) {
        pageInfo {
            hasNextPage
        }
        edges {
            cursor
            node {
                id
                tags {
                    name
                    value
                }
                owner {
                    address
                }
            }
        }
    }
}
"#;

#[derive(Serialize)]
struct GqlRequest<'a> {
    query: &'a str,
    variables: GqlVariables<'a>,
}

#[derive(Serialize)]
struct GqlVariables<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owners: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [TagFilter]>,
    first: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
}

#[derive(Deserialize)]
struct GqlResponse {
    data: Option<GqlData>,
    errors: Option<Vec<GqlErrorMessage>>,
}

#[derive(Deserialize)]
struct GqlErrorMessage {
    message: String,
}

#[derive(Deserialize)]
struct GqlData {
    transactions: Transactions,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Transactions {
    page_info: PageInfo,
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

#[derive(Deserialize)]
struct Edge {
    cursor: String,
    node: Node,
}

#[derive(Deserialize)]
struct Node {
    id: String,
    #[serde(default)]
    tags: Vec<Tag>,
    owner: Option<Owner>,
}

#[derive(Deserialize)]
struct Owner {
    address: String,
}

/// HTTP GraphQL query service
#[derive(Clone)]
pub struct GqlClient {
    http_client: Client,
    default_page_size: usize,
}

impl GqlClient {
    pub fn new(default_page_size: usize) -> UploadResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("atomic-uploader/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| UploadError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            default_page_size: default_page_size.clamp(1, super::MAX_PAGE_SIZE),
        })
    }

    fn endpoint(gateway: &str) -> String {
        if gateway.starts_with("http://") || gateway.starts_with("https://") {
            format!("{}/graphql", gateway.trim_end_matches('/'))
        } else {
            format!("https://{}/graphql", gateway)
        }
    }
}

fn non_empty<T>(values: &[T]) -> Option<&[T]> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

#[async_trait]
impl QueryService for GqlClient {
    async fn query(&self, query: GqlQuery) -> UploadResult<GqlPage> {
        let first = query
            .first
            .unwrap_or_else(|| query.ids.len().max(self.default_page_size))
            .clamp(1, super::MAX_PAGE_SIZE);

        let request = GqlRequest {
            query: TRANSACTIONS_QUERY,
            variables: GqlVariables {
                ids: non_empty(&query.ids),
                owners: non_empty(&query.owners),
                tags: non_empty(&query.tag_filters),
                first,
                after: query.cursor.as_deref(),
            },
        };

        let url = Self::endpoint(&query.gateway);
        debug!("GraphQL query to {} (first: {}, cursor: {:?})", url, first, query.cursor);

        let started = Instant::now();
        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| UploadError::Query(format!("Failed to reach gateway {}: {}", query.gateway, e)))?;
        metrics::record_request("gql", response.status().as_u16());

        if !response.status().is_success() {
            return Err(UploadError::Query(format!(
                "Gateway {} returned error: {}",
                query.gateway,
                response.status()
            )));
        }

        let body: GqlResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Query(format!("Invalid GraphQL response: {}", e)))?;
        metrics::observe_query(&query.gateway, started.elapsed().as_secs_f64());

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(UploadError::Query(messages.join("; ")));
        }

        let transactions = body
            .data
            .ok_or_else(|| UploadError::Query("GraphQL response missing data".to_string()))?
            .transactions;

        let next_cursor = if transactions.page_info.has_next_page {
            transactions.edges.last().map(|edge| edge.cursor.clone())
        } else {
            None
        };

        let data = transactions
            .edges
            .into_iter()
            .map(|edge| AssetRecord {
                id: edge.node.id,
                tags: edge.node.tags,
                owner: edge.node.owner.map(|o| o.address),
            })
            .collect();

        Ok(GqlPage { data, next_cursor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_host_or_url() {
        assert_eq!(GqlClient::endpoint("arweave.net"), "https://arweave.net/graphql");
        assert_eq!(
            GqlClient::endpoint("http://localhost:1984/"),
            "http://localhost:1984/graphql"
        );
    }

    #[test]
    fn test_variables_skip_empty_filters() {
        let ids = vec!["abc".to_string()];
        let request = GqlRequest {
            query: TRANSACTIONS_QUERY,
            variables: GqlVariables {
                ids: non_empty(&ids),
                owners: non_empty(&[]),
                tags: None,
                first: 10,
                after: None,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["variables"]["ids"][0], "abc");
        assert!(json["variables"].get("owners").is_none());
        assert!(json["variables"].get("after").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"data":{"transactions":{"pageInfo":{"hasNextPage":true},
            "edges":[{"cursor":"cur1","node":{"id":"tx1","tags":[{"name":"Title","value":"A"}],
            "owner":{"address":"me"}}}]}}}"#;
        let body: GqlResponse = serde_json::from_str(raw).unwrap();
        let transactions = body.data.unwrap().transactions;
        assert!(transactions.page_info.has_next_page);
        assert_eq!(transactions.edges[0].cursor, "cur1");
        assert_eq!(transactions.edges[0].node.tags[0].value, "A");
    }
}

//! Board API client.
//!
//! Fetches the items of a project-tracking board over GraphQL and
//! flattens each item's column values into a row record. Pagination
//! follows the `items_page` cursor up to a configured page count.

use crate::config::BoardConfig;
use crate::models::{CellValue, Record, Table};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Column under which the item's own name is stored.
pub const ITEM_NAME_COLUMN: &str = "Name";

const ITEM_FIELDS: &str = "items { name column_values { column { title } text } }";

/// GraphQL request body.
#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: String,
    variables: Value,
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BoardsData {
    #[serde(default)]
    boards: Vec<Board>,
}

#[derive(Debug, Deserialize)]
struct NextPageData {
    next_items_page: ItemsPage,
}

#[derive(Debug, Deserialize)]
struct Board {
    name: String,
    items_page: ItemsPage,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    cursor: Option<String>,
    #[serde(default)]
    items: Vec<Item>,
}

/// A board item with its column values.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub column_values: Vec<ColumnValue>,
}

/// One column value of an item.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnValue {
    pub column: ColumnRef,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRef {
    pub title: String,
}

/// Client for the board GraphQL API.
pub struct BoardClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    page_limit: usize,
    max_pages: usize,
}

impl BoardClient {
    /// Create a client from board settings and an API key.
    pub fn new(http_client: reqwest::Client, config: &BoardConfig, api_key: String) -> Self {
        Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key,
            page_limit: config.page_limit.max(1),
            max_pages: config.max_pages.max(1),
        }
    }

    /// Fetch every item of a board as a table.
    pub async fn fetch_table(&self, board_id: &str) -> Result<Table> {
        let query = format!(
            "query ($ids: [ID!], $limit: Int!) {{ boards(ids: $ids) {{ name items_page(limit: $limit) {{ cursor {} }} }} }}",
            ITEM_FIELDS
        );
        let variables = json!({ "ids": [board_id], "limit": self.page_limit });

        let data: BoardsData = self.execute(query, variables).await?;
        let board = data
            .boards
            .into_iter()
            .next()
            .with_context(|| format!("Board {} not found or not accessible", board_id))?;

        info!("Fetching board '{}' ({})", board.name, board_id);

        let mut items = board.items_page.items;
        let mut cursor = board.items_page.cursor;
        let mut pages = 1;

        while let Some(next) = cursor.take() {
            if pages >= self.max_pages {
                warn!(
                    "Board {} has more than {} pages; remaining items skipped",
                    board_id, self.max_pages
                );
                break;
            }

            let query = format!(
                "query ($cursor: String!, $limit: Int!) {{ next_items_page(cursor: $cursor, limit: $limit) {{ cursor {} }} }}",
                ITEM_FIELDS
            );
            let variables = json!({ "cursor": next, "limit": self.page_limit });

            let page: NextPageData = self.execute(query, variables).await?;
            items.extend(page.next_items_page.items);
            cursor = page.next_items_page.cursor;
            pages += 1;
        }

        debug!("Board {} yielded {} items over {} pages", board_id, items.len(), pages);

        Ok(flatten_items(items))
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        query: String,
        variables: Value,
    ) -> Result<T> {
        let request = GraphQlRequest { query, variables };

        let response = self
            .http_client
            .post(&self.api_url)
            .header("Authorization", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Board API request timed out")
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to board API at {}", self.api_url)
                } else {
                    anyhow::anyhow!("Failed to send board API request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Board API error {}: {}", status, body));
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .context("Failed to parse board API response")?;

        if !envelope.errors.is_empty() {
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(anyhow::anyhow!("Board API returned errors: {}", messages.join("; ")));
        }

        envelope
            .data
            .context("Board API response carried no data")
    }
}

/// Flatten board items into row records.
pub fn flatten_items(items: Vec<Item>) -> Table {
    let mut table = Table::with_columns(vec![ITEM_NAME_COLUMN.to_string()]);

    for item in items {
        let mut record = Record::new();
        record.insert(
            ITEM_NAME_COLUMN.to_string(),
            CellValue::from_raw(Some(item.name.as_str())),
        );
        for value in item.column_values {
            record.insert(value.column.title, CellValue::from_raw(value.text.as_deref()));
        }
        table.push(record);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items_json() -> Value {
        json!([
            {
                "name": "Alpha Mining",
                "column_values": [
                    { "column": { "title": "Sector" }, "text": "Mining" },
                    { "column": { "title": "Deal Value" }, "text": "1,200" },
                    { "column": { "title": "Close Date" }, "text": "" }
                ]
            },
            {
                "name": "Beta Rail",
                "column_values": [
                    { "column": { "title": "Sector" }, "text": null }
                ]
            }
        ])
    }

    fn client(server: &mockito::Server, max_pages: usize) -> BoardClient {
        let config = BoardConfig {
            api_url: server.url(),
            page_limit: 2,
            max_pages,
            ..Default::default()
        };
        BoardClient::new(reqwest::Client::new(), &config, "board-key".to_string())
    }

    #[test]
    fn test_flatten_items() {
        let items: Vec<Item> = serde_json::from_value(items_json()).unwrap();
        let table = flatten_items(items);

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns[0], ITEM_NAME_COLUMN);
        assert!(table.columns.contains(&"Deal Value".to_string()));
        assert_eq!(table.rows[0]["Sector"], CellValue::from("Mining"));
        assert_eq!(table.rows[0]["Close Date"], CellValue::Missing);
        assert_eq!(table.rows[1]["Sector"], CellValue::Missing);
        assert_eq!(table.cell(&table.rows[1], "Deal Value"), &CellValue::Missing);
    }

    #[tokio::test]
    async fn test_fetch_table_follows_cursor() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("POST", "/")
            .match_header("authorization", "board-key")
            .match_body(mockito::Matcher::Regex("boards".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "data": { "boards": [ {
                    "name": "Deals",
                    "items_page": { "cursor": "page-2", "items": items_json() }
                } ] } })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let second = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("next_items_page".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "data": { "next_items_page": {
                    "cursor": null,
                    "items": [ { "name": "Gamma", "column_values": [] } ]
                } } })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let table = client(&server, 5).fetch_table("123").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[2][ITEM_NAME_COLUMN], CellValue::from("Gamma"));
    }

    #[tokio::test]
    async fn test_fetch_table_stops_at_max_pages() {
        let mut server = mockito::Server::new_async().await;

        let _first = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                json!({ "data": { "boards": [ {
                    "name": "Deals",
                    "items_page": { "cursor": "page-2", "items": items_json() }
                } ] } })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let table = client(&server, 1).fetch_table("123").await.unwrap();
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_table_missing_board() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data": {"boards": []}}"#)
            .create_async()
            .await;

        let err = client(&server, 5).fetch_table("999").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_fetch_table_graphql_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"errors": [{"message": "Not Authenticated"}]}"#)
            .create_async()
            .await;

        let err = client(&server, 5).fetch_table("123").await.unwrap_err();
        assert!(err.to_string().contains("Not Authenticated"));
    }

    #[tokio::test]
    async fn test_fetch_table_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let err = client(&server, 5).fetch_table("123").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}

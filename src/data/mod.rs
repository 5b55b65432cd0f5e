//! Data source adapters.
//!
//! Tables are rebuilt from their source on every request: either the two
//! CSV exports on disk or the two boards behind the board API.

pub mod board;
pub mod csv_source;

use crate::config::{Config, SourceKind};
use crate::models::Table;
use anyhow::{Context, Result};
use board::BoardClient;
use tracing::info;

/// The deal funnel and work-order tracker for one request.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub deals: Table,
    pub work_orders: Table,
}

/// Load both tables from the configured source.
pub async fn load_tables(config: &Config, http_client: &reqwest::Client) -> Result<Tables> {
    match config.data.source {
        SourceKind::Csv => load_csv_tables(config).await,
        SourceKind::Board => load_board_tables(config, http_client).await,
    }
}

async fn load_csv_tables(config: &Config) -> Result<Tables> {
    let deals_path = config.data.deals_csv.clone();
    let work_orders_path = config.data.work_orders_csv.clone();

    info!(
        "Loading CSV exports: {} and {}",
        deals_path.display(),
        work_orders_path.display()
    );

    tokio::task::spawn_blocking(move || -> Result<Tables> {
        Ok(Tables {
            deals: csv_source::load_csv(&deals_path)?,
            work_orders: csv_source::load_csv(&work_orders_path)?,
        })
    })
    .await
    .context("CSV loading task failed")?
}

async fn load_board_tables(config: &Config, http_client: &reqwest::Client) -> Result<Tables> {
    let api_key = config
        .credentials
        .board_api_key
        .clone()
        .context("Board API key is not configured (MONDAY_API_KEY)")?;
    let deals_id = config
        .board
        .deals_board_id
        .as_deref()
        .context("Deals board id is not configured (DEALS_BOARD_ID)")?;
    let work_orders_id = config
        .board
        .work_orders_board_id
        .as_deref()
        .context("Work orders board id is not configured (WORK_ORDERS_BOARD_ID)")?;

    let client = BoardClient::new(http_client.clone(), &config.board, api_key);

    Ok(Tables {
        deals: client.fetch_table(deals_id).await?,
        work_orders: client.fetch_table(work_orders_id).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_csv_tables() {
        let dir = tempfile::tempdir().unwrap();
        let deals = dir.path().join("deals.csv");
        let orders = dir.path().join("orders.csv");
        std::fs::write(&deals, "Deal Name,Sector\nAlpha,Mining\n").unwrap();
        std::fs::write(&orders, "Order,Status\nWO-1,Open\nWO-2,Closed\n").unwrap();

        let mut config = Config::default();
        config.data.deals_csv = deals;
        config.data.work_orders_csv = orders;

        let tables = load_tables(&config, &reqwest::Client::new()).await.unwrap();
        assert_eq!(tables.deals.len(), 1);
        assert_eq!(tables.work_orders.len(), 2);
    }

    #[tokio::test]
    async fn test_load_csv_tables_missing_file() {
        let mut config = Config::default();
        config.data.deals_csv = "/nonexistent/deals.csv".into();

        assert!(load_tables(&config, &reqwest::Client::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_board_source_requires_key() {
        let mut config = Config::default();
        config.data.source = SourceKind::Board;
        config.board.deals_board_id = Some("1".to_string());
        config.board.work_orders_board_id = Some("2".to_string());

        let err = load_tables(&config, &reqwest::Client::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("MONDAY_API_KEY"));
    }

    #[tokio::test]
    async fn test_board_source_requires_board_ids() {
        let mut config = Config::default();
        config.data.source = SourceKind::Board;
        config.credentials.board_api_key = Some("key".to_string());

        let err = load_tables(&config, &reqwest::Client::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("DEALS_BOARD_ID"));
    }
}

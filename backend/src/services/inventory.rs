//! Inventory status service feeding the stock dashboard

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{classify_inventory_status, summarize_statuses, StatusClassification, StatusSummary, StockLevel};

/// Inventory service classifying on-hand stock per product
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Stock totals joined with the product master
#[derive(Debug, Clone, FromRow)]
pub struct StockRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub current_stock: i64,
    pub safety_stock: i64,
    pub reorder_point: i64,
}

impl StockRow {
    fn level(&self) -> StockLevel {
        StockLevel::new(self.current_stock, self.safety_stock, self.reorder_point)
    }
}

/// One dashboard row
#[derive(Debug, Clone, Serialize)]
pub struct ProductStockStatus {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub classification: StatusClassification,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn load_stock(&self, organization_id: Uuid) -> AppResult<Vec<StockRow>> {
        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT p.id AS product_id,
                   p.name AS product_name,
                   p.sku,
                   COALESCE(SUM(i.quantity), 0)::BIGINT AS current_stock,
                   COALESCE(p.safety_stock, 0)::BIGINT AS safety_stock,
                   COALESCE(p.reorder_point, 0)::BIGINT AS reorder_point
            FROM products p
            LEFT JOIN inventory i
                ON i.product_id = p.id AND i.organization_id = p.organization_id
            WHERE p.organization_id = $1 AND p.is_active = true
            GROUP BY p.id, p.name, p.sku, p.safety_stock, p.reorder_point
            ORDER BY p.name
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Classified stock for every active product, most urgent first
    pub async fn status_board(&self, organization_id: Uuid) -> AppResult<Vec<ProductStockStatus>> {
        let rows = self.load_stock(organization_id).await?;
        let board = classify_rows(rows);
        tracing::debug!(%organization_id, products = board.len(), "built status board");
        Ok(board)
    }

    /// Per-tier counts for dashboard tiles
    pub async fn summary(&self, organization_id: Uuid) -> AppResult<StatusSummary> {
        let rows = self.load_stock(organization_id).await?;
        let levels: Vec<StockLevel> = valid_rows(rows).map(|row| row.level()).collect();
        Ok(summarize_statuses(&levels))
    }
}

/// Drop rows with invalid snapshots, logging each one
fn valid_rows(rows: Vec<StockRow>) -> impl Iterator<Item = StockRow> {
    rows.into_iter().filter(|row| match shared::validate_stock_level(&row.level()) {
        Ok(()) => true,
        Err(reason) => {
            tracing::warn!(product_id = %row.product_id, reason, "skipping invalid stock snapshot");
            false
        }
    })
}

/// Classify rows and order them by urgency, then by tier
pub fn classify_rows(rows: Vec<StockRow>) -> Vec<ProductStockStatus> {
    let mut board: Vec<ProductStockStatus> = valid_rows(rows)
        .map(|row| {
            let classification = classify_inventory_status(&row.level());
            ProductStockStatus {
                product_id: row.product_id,
                product_name: row.product_name,
                sku: row.sku,
                classification,
            }
        })
        .collect();

    board.sort_by(|a, b| {
        b.classification
            .urgency
            .cmp(&a.classification.urgency)
            .then_with(|| a.classification.status.cmp(&b.classification.status))
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    board
}

//! Lot service: active lot lookup and FIFO/FEFO outbound deduction
//!
//! Deduction runs in one transaction. The product+warehouse lots are locked
//! with `FOR UPDATE`, so concurrent deductions for the same pair serialize,
//! and the batched update is additionally guarded by each lot's version.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    deduct_by_fifo, lots_expiring_within, DeductByFifoRequest, FifoPlan, InventoryLot, LotStatus,
};

const ACTIVE_LOTS_SQL: &str = r#"
    SELECT id, product_id, warehouse_id, lot_number, remaining_quantity, status,
           expiry_date, received_date, created_at, version
    FROM inventory_lots
    WHERE organization_id = $1 AND product_id = $2 AND warehouse_id = $3
      AND status = 'active' AND remaining_quantity > 0
    ORDER BY expiry_date ASC NULLS LAST, received_date ASC, created_at ASC
"#;

const ACTIVE_LOTS_FOR_UPDATE_SQL: &str = r#"
    SELECT id, product_id, warehouse_id, lot_number, remaining_quantity, status,
           expiry_date, received_date, created_at, version
    FROM inventory_lots
    WHERE organization_id = $1 AND product_id = $2 AND warehouse_id = $3
      AND status = 'active' AND remaining_quantity > 0
    ORDER BY expiry_date ASC NULLS LAST, received_date ASC, created_at ASC
    FOR UPDATE
"#;

/// Lot service for outbound deductions
#[derive(Clone)]
pub struct LotService {
    db: PgPool,
}

/// Input for an outbound deduction
#[derive(Debug, Deserialize, Validate)]
pub struct DeductStockInput {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
}

/// Row for lot queries
#[derive(Debug, FromRow)]
struct LotRow {
    id: Uuid,
    product_id: Uuid,
    warehouse_id: Uuid,
    lot_number: String,
    remaining_quantity: i64,
    status: String,
    expiry_date: Option<NaiveDate>,
    received_date: NaiveDate,
    created_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<LotRow> for InventoryLot {
    type Error = AppError;

    fn try_from(row: LotRow) -> Result<Self, Self::Error> {
        let status = LotStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown lot status '{}'", row.status)))?;
        let lot = InventoryLot {
            id: row.id,
            product_id: row.product_id,
            warehouse_id: row.warehouse_id,
            lot_number: row.lot_number,
            remaining_quantity: row.remaining_quantity,
            status,
            expiry_date: row.expiry_date,
            received_date: row.received_date,
            created_at: row.created_at,
            version: row.version,
        };
        shared::validate_lot(&lot)
            .map_err(|reason| AppError::Internal(format!("Lot {}: {}", lot.id, reason)))?;
        Ok(lot)
    }
}

async fn fetch_lots<'e, E>(
    executor: E,
    sql: &'static str,
    organization_id: Uuid,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> AppResult<Vec<InventoryLot>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, LotRow>(sql)
        .bind(organization_id)
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_all(executor)
        .await?;

    rows.into_iter().map(InventoryLot::try_from).collect()
}

/// Batched update columns, one entry per planned lot
#[derive(Debug, Default, PartialEq, Eq)]
struct LotUpdateBatch {
    ids: Vec<Uuid>,
    remaining: Vec<i64>,
    statuses: Vec<String>,
    versions: Vec<i64>,
    deducted: Vec<i64>,
}

impl LotUpdateBatch {
    fn from_plan(plan: &FifoPlan) -> Self {
        let mut batch = Self::default();
        for update in &plan.updates {
            batch.ids.push(update.lot_id);
            batch.remaining.push(update.remaining_quantity);
            batch.statuses.push(update.status.as_str().to_string());
            batch.versions.push(update.expected_version);
            batch.deducted.push(update.deducted);
        }
        batch
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

impl LotService {
    /// Create a new LotService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active lots for a product in a warehouse, in consumption order
    pub async fn active_lots(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<Vec<InventoryLot>> {
        fetch_lots(&self.db, ACTIVE_LOTS_SQL, organization_id, product_id, warehouse_id).await
    }

    /// Active lots expiring within `days` of `today`
    pub async fn expiring_lots(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        today: NaiveDate,
        days: i64,
    ) -> AppResult<Vec<InventoryLot>> {
        let lots = self.active_lots(organization_id, product_id, warehouse_id).await?;
        Ok(lots_expiring_within(&lots, today, days)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Deduct an outbound quantity across lots, FEFO then FIFO
    ///
    /// Either every planned lot update commits or none does.
    pub async fn deduct_by_fifo(
        &self,
        organization_id: Uuid,
        input: DeductStockInput,
    ) -> AppResult<FifoPlan> {
        input.validate()?;

        let request = DeductByFifoRequest {
            product_id: input.product_id,
            warehouse_id: input.warehouse_id,
            quantity: input.quantity,
        };

        let mut tx = self.db.begin().await?;

        let lots = fetch_lots(
            &mut *tx,
            ACTIVE_LOTS_FOR_UPDATE_SQL,
            organization_id,
            request.product_id,
            request.warehouse_id,
        )
        .await?;

        let plan = match deduct_by_fifo(&request, &lots) {
            Ok(plan) => plan,
            Err(err) => {
                tx.rollback().await?;
                tracing::warn!(
                    %organization_id,
                    product_id = %request.product_id,
                    warehouse_id = %request.warehouse_id,
                    error = %err,
                    "FIFO deduction rejected"
                );
                return Err(err.into());
            }
        };

        let batch = LotUpdateBatch::from_plan(&plan);
        let expected_rows = batch.len() as u64;

        let result = sqlx::query(
            r#"
            UPDATE inventory_lots AS l
            SET remaining_quantity = u.remaining_quantity,
                status = u.status,
                version = l.version + 1,
                updated_at = NOW()
            FROM UNNEST($1::uuid[], $2::bigint[], $3::text[], $4::bigint[], $5::bigint[])
                AS u(id, remaining_quantity, status, version, deducted)
            WHERE l.id = u.id
              AND l.organization_id = $6
              AND l.version = u.version
              AND l.remaining_quantity >= u.deducted
            "#,
        )
        .bind(batch.ids)
        .bind(batch.remaining)
        .bind(batch.statuses)
        .bind(batch.versions)
        .bind(batch.deducted)
        .bind(organization_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() != expected_rows {
            tx.rollback().await?;
            tracing::warn!(
                %organization_id,
                product_id = %request.product_id,
                expected = expected_rows,
                updated = result.rows_affected(),
                "lot update conflict, deduction rolled back"
            );
            return Err(AppError::Conflict(
                "Lots changed during deduction, please retry".to_string(),
            ));
        }

        tx.commit().await?;

        tracing::info!(
            %organization_id,
            product_id = %request.product_id,
            warehouse_id = %request.warehouse_id,
            quantity = plan.total_deducted,
            lots = plan.deductions.len(),
            "FIFO deduction committed"
        );

        Ok(plan)
    }
}

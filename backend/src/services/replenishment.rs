//! Replenishment scan: reorder plans for every product of an organization

use chrono::{Duration, NaiveDate};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::error::AppResult;
use crate::models::{average_daily_demand, build_reorder_plan, ReorderPlan, ReplenishmentItem};

/// Replenishment service driving the worker scan
#[derive(Clone)]
pub struct ReplenishmentService {
    db: PgPool,
    planning: PlanningConfig,
}

/// Product master, stock and recent outbound in one row
#[derive(Debug, Clone, FromRow)]
pub struct ReplenishmentRow {
    pub product_id: Uuid,
    pub current_stock: i64,
    pub safety_stock: i64,
    pub reorder_point: Option<i64>,
    pub lead_time_days: i64,
    pub eoq: Option<i64>,
    pub target_days_of_inventory: Option<i64>,
    pub min_order_quantity: Option<i64>,
    pub order_multiple: Option<i64>,
    pub outbound_quantity: i64,
}

/// Build plans and keep the products due for an order, most urgent first
pub fn plan_items(rows: Vec<ReplenishmentRow>, planning: &PlanningConfig) -> Vec<ReorderPlan> {
    let mut plans: Vec<ReorderPlan> = rows
        .into_iter()
        .filter(|row| match shared::validate_lead_time(row.lead_time_days) {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!(product_id = %row.product_id, reason, "skipping product");
                false
            }
        })
        .map(|row| {
            let target_days = match (row.eoq, row.target_days_of_inventory) {
                (None, None) => Some(planning.default_target_days),
                (_, target) => target,
            };
            let item = ReplenishmentItem {
                product_id: row.product_id,
                current_stock: row.current_stock,
                safety_stock: row.safety_stock,
                reorder_point: row.reorder_point,
                average_daily_demand: average_daily_demand(
                    row.outbound_quantity,
                    planning.demand_lookback_days,
                ),
                lead_time_days: row.lead_time_days,
                eoq: row.eoq,
                target_days_of_inventory: target_days,
                min_order_quantity: row.min_order_quantity,
                order_multiple: row.order_multiple,
            };
            build_reorder_plan(&item)
        })
        .filter(|plan| plan.should_reorder)
        .collect();

    plans.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| a.days_until_reorder.cmp(&b.days_until_reorder))
    });
    plans
}

impl ReplenishmentService {
    pub fn new(db: PgPool, planning: PlanningConfig) -> Self {
        Self { db, planning }
    }

    /// Organizations with at least one active product
    pub async fn active_organizations(&self) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT organization_id FROM products WHERE is_active = true",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    /// Reorder plans for every product needing an order
    pub async fn scan(&self, organization_id: Uuid, today: NaiveDate) -> AppResult<Vec<ReorderPlan>> {
        let since = lookback_start(today, self.planning.demand_lookback_days);

        let rows = sqlx::query_as::<_, ReplenishmentRow>(
            r#"
            SELECT p.id AS product_id,
                   COALESCE(stock.quantity, 0)::BIGINT AS current_stock,
                   COALESCE(p.safety_stock, 0)::BIGINT AS safety_stock,
                   p.reorder_point::BIGINT AS reorder_point,
                   COALESCE(p.lead_time_days, 0)::BIGINT AS lead_time_days,
                   p.eoq::BIGINT AS eoq,
                   p.target_days_of_inventory::BIGINT AS target_days_of_inventory,
                   p.min_order_quantity::BIGINT AS min_order_quantity,
                   p.order_multiple::BIGINT AS order_multiple,
                   COALESCE(sales.quantity, 0)::BIGINT AS outbound_quantity
            FROM products p
            LEFT JOIN (
                SELECT product_id, SUM(quantity) AS quantity
                FROM inventory
                WHERE organization_id = $1
                GROUP BY product_id
            ) stock ON stock.product_id = p.id
            LEFT JOIN (
                SELECT product_id, SUM(ABS(quantity)) AS quantity
                FROM inventory_transactions
                WHERE organization_id = $1
                  AND transaction_type = 'outbound'
                  AND transaction_date > $2 AND transaction_date <= $3
                GROUP BY product_id
            ) sales ON sales.product_id = p.id
            WHERE p.organization_id = $1 AND p.is_active = true
            "#,
        )
        .bind(organization_id)
        .bind(since)
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        let scanned = rows.len();
        let plans = plan_items(rows, &self.planning);

        tracing::info!(
            %organization_id,
            scanned,
            due = plans.len(),
            "replenishment scan completed"
        );
        for plan in &plans {
            tracing::debug!(
                product_id = %plan.product_id,
                status = %plan.status,
                reorder_point = plan.reorder_point,
                quantity = plan.order.as_ref().map(|o| o.recommended_quantity),
                "reorder due"
            );
        }

        Ok(plans)
    }
}

/// First excluded day of the demand history ending at `today`
///
/// Spans reaching past the calendar range start at its lower bound.
pub fn lookback_start(today: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days.max(0))
        .and_then(|span| today.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

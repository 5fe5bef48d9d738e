//! PSI service: purchase (inbound), sales (outbound) and stock per month

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    aggregate_psi, project_moving_average, MonthlyQuantities, Period, PsiInputs, PsiProduct,
    PsiResult, PsiWindow,
};

/// PSI table builder
#[derive(Clone)]
pub struct PsiService {
    db: PgPool,
    planning: PlanningConfig,
}

/// Product and its on-hand stock
#[derive(Debug, FromRow)]
struct ProductStockRow {
    product_id: Uuid,
    name: String,
    current_stock: i64,
}

/// One product-month quantity, month rendered as `YYYY-MM`
#[derive(Debug, Clone, FromRow)]
pub struct MonthlyRow {
    pub product_id: Uuid,
    pub period: String,
    pub quantity: i64,
}

/// Fold product-month rows into the keyed map, summing duplicates
pub fn monthly_from_rows(rows: Vec<MonthlyRow>) -> AppResult<MonthlyQuantities> {
    let mut monthly = MonthlyQuantities::new();
    for row in rows {
        let period = Period::from_str(&row.period)
            .map_err(|e| AppError::Internal(format!("Bad period from database: {}", e)))?;
        *monthly
            .entry(row.product_id)
            .or_default()
            .entry(period)
            .or_insert(0) += row.quantity;
    }
    Ok(monthly)
}

/// Sum two monthly maps
fn merge_monthly(mut into: MonthlyQuantities, other: MonthlyQuantities) -> MonthlyQuantities {
    for (product_id, months) in other {
        let target = into.entry(product_id).or_default();
        for (period, quantity) in months {
            *target.entry(period).or_insert(0) += quantity;
        }
    }
    into
}

/// Keep only the months after the anchor
///
/// Open purchase orders are expectations; past and current months show what
/// was actually received.
pub fn projected_only(planned: MonthlyQuantities, window: &PsiWindow) -> MonthlyQuantities {
    let anchor = window.current_period();
    planned
        .into_iter()
        .map(|(product_id, months)| {
            let future: HashMap<Period, i64> = months
                .into_iter()
                .filter(|(period, _)| *period > anchor)
                .collect();
            (product_id, future)
        })
        .filter(|(_, months)| !months.is_empty())
        .collect()
}

/// Moving-average forecast for the projected months of every product
pub fn forecast_from_sales(
    sales: &MonthlyQuantities,
    window: &PsiWindow,
    months: usize,
) -> MonthlyQuantities {
    sales
        .iter()
        .map(|(product_id, by_month)| {
            (*product_id, project_moving_average(by_month, window, months))
        })
        .filter(|(_, projected)| !projected.is_empty())
        .collect()
}

impl PsiService {
    pub fn new(db: PgPool, planning: PlanningConfig) -> Self {
        Self { db, planning }
    }

    async fn products(&self, organization_id: Uuid) -> AppResult<Vec<PsiProduct>> {
        let rows = sqlx::query_as::<_, ProductStockRow>(
            r#"
            SELECT p.id AS product_id,
                   p.name,
                   COALESCE(SUM(i.quantity), 0)::BIGINT AS current_stock
            FROM products p
            LEFT JOIN inventory i
                ON i.product_id = p.id AND i.organization_id = p.organization_id
            WHERE p.organization_id = $1 AND p.is_active = true
            GROUP BY p.id, p.name
            ORDER BY p.name
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PsiProduct {
                product_id: row.product_id,
                name: row.name,
                current_stock: row.current_stock,
            })
            .collect())
    }

    /// Monthly transaction totals of one type within the window
    async fn monthly_transactions(
        &self,
        organization_id: Uuid,
        transaction_type: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<MonthlyQuantities> {
        let rows = sqlx::query_as::<_, MonthlyRow>(
            r#"
            SELECT product_id,
                   TO_CHAR(transaction_date, 'YYYY-MM') AS period,
                   COALESCE(SUM(ABS(quantity)), 0)::BIGINT AS quantity
            FROM inventory_transactions
            WHERE organization_id = $1
              AND transaction_type = $2
              AND transaction_date >= $3 AND transaction_date < $4
            GROUP BY product_id, TO_CHAR(transaction_date, 'YYYY-MM')
            "#,
        )
        .bind(organization_id)
        .bind(transaction_type)
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        monthly_from_rows(rows)
    }

    /// Open purchase order lines by expected month
    async fn planned_inbound(
        &self,
        organization_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<MonthlyQuantities> {
        let rows = sqlx::query_as::<_, MonthlyRow>(
            r#"
            SELECT pol.product_id,
                   TO_CHAR(po.expected_date, 'YYYY-MM') AS period,
                   COALESCE(SUM(pol.quantity - pol.received_quantity), 0)::BIGINT AS quantity
            FROM purchase_order_lines pol
            JOIN purchase_orders po ON po.id = pol.purchase_order_id
            WHERE po.organization_id = $1
              AND po.status IN ('ordered', 'partially_received')
              AND po.expected_date >= $2 AND po.expected_date < $3
              AND pol.quantity > pol.received_quantity
            GROUP BY pol.product_id, TO_CHAR(po.expected_date, 'YYYY-MM')
            "#,
        )
        .bind(organization_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        monthly_from_rows(rows)
    }

    async fn manual_forecasts(
        &self,
        organization_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<MonthlyQuantities> {
        let rows = sqlx::query_as::<_, MonthlyRow>(
            r#"
            SELECT product_id,
                   TO_CHAR(period_start, 'YYYY-MM') AS period,
                   SUM(quantity)::BIGINT AS quantity
            FROM demand_forecasts
            WHERE organization_id = $1
              AND is_manual = true
              AND period_start >= $2 AND period_start < $3
            GROUP BY product_id, TO_CHAR(period_start, 'YYYY-MM')
            "#,
        )
        .bind(organization_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        monthly_from_rows(rows)
    }

    /// Build the PSI table around the month of `today`
    pub async fn build(&self, organization_id: Uuid, today: NaiveDate) -> AppResult<PsiResult> {
        let window = PsiWindow::around(
            today,
            self.planning.psi_past_months,
            self.planning.psi_future_months,
        );
        let (from, until) = window_bounds(&window)?;

        let products = self.products(organization_id).await?;
        let sales = self
            .monthly_transactions(organization_id, "outbound", from, until)
            .await?;
        let received = self
            .monthly_transactions(organization_id, "inbound", from, until)
            .await?;
        let planned = self.planned_inbound(organization_id, from, until).await?;
        let manual_forecast = self.manual_forecasts(organization_id, from, until).await?;

        let forecast = forecast_from_sales(&sales, &window, self.planning.forecast_window_months);

        let inputs = PsiInputs {
            sales,
            inbound: merge_monthly(received, projected_only(planned, &window)),
            forecast,
            manual_forecast,
        };

        let result = aggregate_psi(&products, &inputs, &window);

        tracing::info!(
            %organization_id,
            products = result.products.len(),
            months = result.periods.len(),
            warnings = result.warnings.len(),
            "PSI table built"
        );

        Ok(result)
    }
}

/// First day of the window and first day after it
fn window_bounds(window: &PsiWindow) -> AppResult<(NaiveDate, NaiveDate)> {
    let periods = window.periods();
    let (first, last) = match (periods.first(), periods.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(AppError::Internal("Empty PSI window".to_string())),
    };
    let from = first.first_day();
    let until = last.next().first_day();
    match (from, until) {
        (Some(from), Some(until)) => Ok((from, until)),
        _ => Err(AppError::Internal("PSI window out of calendar range".to_string())),
    }
}

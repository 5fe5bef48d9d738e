//! KPI service: cost metrics and supplier delivery compliance

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    analyze_delivery_compliance, calculate_cost_kpis, calculate_turnover, CostKpiInput, CostKpis,
    DateRange, DeliveryComplianceReport, DeliveryOrder, TurnoverKpis,
};

/// KPI service
#[derive(Clone)]
pub struct KpiService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct SalesTotalsRow {
    revenue: Decimal,
    cogs: Decimal,
}

/// Purchase order joined with its supplier
#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: Uuid,
    order_number: String,
    supplier_id: Option<Uuid>,
    supplier_name: Option<String>,
    order_date: Option<NaiveDate>,
    expected_date: Option<NaiveDate>,
    received_date: Option<NaiveDate>,
    lead_time_days: Option<i32>,
}

impl From<PurchaseOrderRow> for DeliveryOrder {
    fn from(row: PurchaseOrderRow) -> Self {
        DeliveryOrder {
            order_id: row.id,
            order_number: row.order_number,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            order_date: row.order_date,
            expected_date: row.expected_date,
            actual_date: row.received_date,
            standard_lead_time_days: row.lead_time_days.map(i64::from),
        }
    }
}

fn check_range(range: &DateRange) -> AppResult<()> {
    if range.end < range.start {
        return Err(AppError::validation(
            "range",
            "End date must not precede start date",
        ));
    }
    Ok(())
}

impl KpiService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn inventory_value(&self, organization_id: Uuid) -> AppResult<Decimal> {
        let value: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(i.quantity * COALESCE(p.unit_cost, 0))
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            WHERE i.organization_id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_one(&self.db)
        .await?;

        Ok(value.unwrap_or(Decimal::ZERO))
    }

    async fn sales_totals(&self, organization_id: Uuid, range: &DateRange) -> AppResult<SalesTotalsRow> {
        let totals = sqlx::query_as::<_, SalesTotalsRow>(
            r#"
            SELECT COALESCE(SUM(ABS(t.quantity) * COALESCE(p.unit_price, 0)), 0) AS revenue,
                   COALESCE(SUM(ABS(t.quantity) * COALESCE(p.unit_cost, 0)), 0) AS cogs
            FROM inventory_transactions t
            JOIN products p ON p.id = t.product_id
            WHERE t.organization_id = $1
              AND t.transaction_type = 'outbound'
              AND t.transaction_date BETWEEN $2 AND $3
            "#,
        )
        .bind(organization_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        Ok(totals)
    }

    /// Days in the range on which any product closed with zero stock
    async fn stockout_days(&self, organization_id: Uuid, range: &DateRange) -> AppResult<i64> {
        let days: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT snapshot_date)
            FROM inventory_snapshots
            WHERE organization_id = $1
              AND quantity <= 0
              AND snapshot_date BETWEEN $2 AND $3
            "#,
        )
        .bind(organization_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        Ok(days)
    }

    /// Holding cost, GMROI and stockout opportunity cost for the range
    pub async fn cost_kpis(&self, organization_id: Uuid, range: &DateRange) -> AppResult<CostKpis> {
        check_range(range)?;

        let totals = self.sales_totals(organization_id, range).await?;
        let input = CostKpiInput {
            total_inventory_value: self.inventory_value(organization_id).await?,
            total_revenue: totals.revenue,
            total_cogs: totals.cogs,
            stockout_days: self.stockout_days(organization_id, range).await?,
        };

        let kpis = calculate_cost_kpis(&input);
        tracing::debug!(%organization_id, ?kpis, "cost KPIs computed");
        Ok(kpis)
    }

    /// Turnover against the current inventory value
    pub async fn turnover(&self, organization_id: Uuid, range: &DateRange) -> AppResult<TurnoverKpis> {
        check_range(range)?;
        let totals = self.sales_totals(organization_id, range).await?;
        let value = self.inventory_value(organization_id).await?;
        Ok(calculate_turnover(totals.cogs, value))
    }

    /// Supplier delivery compliance for orders placed within the range
    pub async fn delivery_compliance(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> AppResult<DeliveryComplianceReport> {
        check_range(range)?;

        let rows = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            SELECT po.id,
                   po.order_number,
                   po.supplier_id,
                   s.name AS supplier_name,
                   po.order_date,
                   po.expected_date,
                   po.received_date,
                   s.lead_time_days
            FROM purchase_orders po
            LEFT JOIN suppliers s ON s.id = po.supplier_id
            WHERE po.organization_id = $1
              AND po.order_date BETWEEN $2 AND $3
              AND po.status <> 'cancelled'
            ORDER BY po.order_date
            "#,
        )
        .bind(organization_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        let orders: Vec<DeliveryOrder> = rows.into_iter().map(DeliveryOrder::from).collect();
        let report = analyze_delivery_compliance(&orders);

        tracing::info!(
            %organization_id,
            orders = report.overall.total_orders,
            on_time_rate = %report.overall.on_time_rate,
            "delivery compliance analysed"
        );

        Ok(report)
    }
}

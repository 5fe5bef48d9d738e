//! Supplier delivery compliance analysis

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::safe_math::{round_half_up, safe_divide};

/// Grouping key for orders without a supplier
pub const UNKNOWN_SUPPLIER_KEY: &str = "unknown";

/// Days late that still count as on time
pub const ON_TIME_GRACE_DAYS: i64 = 1;

/// Sort value for items whose delay is unknown, so they sort last
const UNKNOWN_DELAY_SORT: i64 = -999;

/// Flat purchase order record from the order collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
    pub standard_lead_time_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryItem {
    pub order_id: Uuid,
    pub order_number: String,
    pub supplier_key: String,
    pub supplier_name: Option<String>,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
    pub standard_lead_time_days: Option<i64>,
    pub actual_lead_time_days: Option<i64>,
    pub delay_days: Option<i64>,
    pub is_completed: bool,
    pub is_on_time: bool,
}

/// Aggregate delivery statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub total_orders: usize,
    pub completed_orders: usize,
    pub on_time_orders: usize,
    /// Percentage in `[0, 100]`, 0 when nothing has been delivered
    pub on_time_rate: Decimal,
    pub avg_actual_lead_time: Option<Decimal>,
    pub avg_standard_lead_time: Option<Decimal>,
    pub avg_delay_days: Option<Decimal>,
    pub max_delay_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierDeliverySummary {
    pub supplier_key: String,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    #[serde(flatten)]
    pub stats: DeliveryStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryComplianceReport {
    /// Worst delay first
    pub items: Vec<DeliveryItem>,
    /// Lowest on-time rate first
    pub supplier_summaries: Vec<SupplierDeliverySummary>,
    pub overall: DeliveryStats,
}

fn evaluate(order: &DeliveryOrder) -> Option<DeliveryItem> {
    let order_date = order.order_date?;

    let actual_lead_time = order
        .actual_date
        .map(|actual| (actual - order_date).num_days());

    let delay_days = match (order.actual_date, order.expected_date) {
        (Some(actual), Some(expected)) => Some((actual - expected).num_days()),
        (Some(_), None) => actual_lead_time
            .zip(order.standard_lead_time_days)
            .and_then(|(actual, standard)| actual.checked_sub(standard)),
        (None, _) => None,
    };

    Some(DeliveryItem {
        order_id: order.order_id,
        order_number: order.order_number.clone(),
        supplier_key: order
            .supplier_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| UNKNOWN_SUPPLIER_KEY.to_string()),
        supplier_name: order.supplier_name.clone(),
        order_date,
        expected_date: order.expected_date,
        actual_date: order.actual_date,
        standard_lead_time_days: order.standard_lead_time_days,
        actual_lead_time_days: actual_lead_time,
        delay_days,
        is_completed: order.actual_date.is_some(),
        is_on_time: delay_days.is_some_and(|delay| delay <= ON_TIME_GRACE_DAYS),
    })
}

fn average(values: &[i64]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let total: i64 = values.iter().sum();
    safe_divide(Decimal::from(total), Decimal::from(values.len() as i64))
        .map(|avg| round_half_up(avg, 1))
}

fn summarize(items: &[&DeliveryItem]) -> DeliveryStats {
    let completed = items.iter().filter(|item| item.is_completed).count();
    let on_time = items
        .iter()
        .filter(|item| item.is_completed && item.is_on_time)
        .count();

    let on_time_rate = if completed == 0 {
        Decimal::ZERO
    } else {
        safe_divide(
            Decimal::from(on_time as i64 * 100),
            Decimal::from(completed as i64),
        )
        .map(|rate| round_half_up(rate, 1))
        .unwrap_or(Decimal::ZERO)
    };

    let actual: Vec<i64> = items.iter().filter_map(|i| i.actual_lead_time_days).collect();
    let standard: Vec<i64> = items.iter().filter_map(|i| i.standard_lead_time_days).collect();
    let delays: Vec<i64> = items.iter().filter_map(|i| i.delay_days).collect();

    DeliveryStats {
        total_orders: items.len(),
        completed_orders: completed,
        on_time_orders: on_time,
        on_time_rate,
        avg_actual_lead_time: average(&actual),
        avg_standard_lead_time: average(&standard),
        avg_delay_days: average(&delays),
        max_delay_days: delays.iter().copied().max(),
    }
}

/// Lead-time and on-time statistics per order, per supplier and overall
///
/// Orders without an order date are excluded. Delay is measured against the
/// expected date when known, otherwise against the standard lead time.
pub fn analyze_delivery_compliance(orders: &[DeliveryOrder]) -> DeliveryComplianceReport {
    let mut items: Vec<DeliveryItem> = orders.iter().filter_map(evaluate).collect();
    items.sort_by(|a, b| {
        let a_delay = a.delay_days.unwrap_or(UNKNOWN_DELAY_SORT);
        let b_delay = b.delay_days.unwrap_or(UNKNOWN_DELAY_SORT);
        b_delay.cmp(&a_delay)
    });

    let mut groups: BTreeMap<&str, Vec<&DeliveryItem>> = BTreeMap::new();
    for item in &items {
        groups.entry(item.supplier_key.as_str()).or_default().push(item);
    }

    let mut supplier_summaries: Vec<SupplierDeliverySummary> = groups
        .into_iter()
        .map(|(key, group)| SupplierDeliverySummary {
            supplier_key: key.to_string(),
            supplier_id: key.parse().ok(),
            supplier_name: group.iter().find_map(|item| item.supplier_name.clone()),
            stats: summarize(&group),
        })
        .collect();
    supplier_summaries.sort_by(|a, b| {
        a.stats
            .on_time_rate
            .cmp(&b.stats.on_time_rate)
            .then_with(|| a.supplier_key.cmp(&b.supplier_key))
    });

    let all: Vec<&DeliveryItem> = items.iter().collect();
    let overall = summarize(&all);

    DeliveryComplianceReport {
        items,
        supplier_summaries,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn order(
        supplier: Option<Uuid>,
        ordered: Option<NaiveDate>,
        expected: Option<NaiveDate>,
        actual: Option<NaiveDate>,
        standard: Option<i64>,
    ) -> DeliveryOrder {
        DeliveryOrder {
            order_id: Uuid::new_v4(),
            order_number: "PO".to_string(),
            supplier_id: supplier,
            supplier_name: supplier.map(|_| "Acme".to_string()),
            order_date: ordered,
            expected_date: expected,
            actual_date: actual,
            standard_lead_time_days: standard,
        }
    }

    #[test]
    fn test_delay_against_expected_date() {
        let report = analyze_delivery_compliance(&[order(
            None,
            Some(date(3, 1)),
            Some(date(3, 10)),
            Some(date(3, 11)),
            Some(5),
        )]);
        let item = &report.items[0];
        assert_eq!(item.actual_lead_time_days, Some(10));
        assert_eq!(item.delay_days, Some(1));
        assert!(item.is_on_time);
        assert_eq!(item.supplier_key, UNKNOWN_SUPPLIER_KEY);
    }

    #[test]
    fn test_delay_against_standard_lead_time() {
        let report = analyze_delivery_compliance(&[order(
            None,
            Some(date(3, 1)),
            None,
            Some(date(3, 11)),
            Some(7),
        )]);
        let item = &report.items[0];
        assert_eq!(item.delay_days, Some(3));
        assert!(!item.is_on_time);
    }

    #[test]
    fn test_orders_without_order_date_are_excluded() {
        let report = analyze_delivery_compliance(&[
            order(None, None, Some(date(3, 10)), Some(date(3, 9)), None),
            order(None, Some(date(3, 1)), Some(date(3, 10)), Some(date(3, 9)), None),
        ]);
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.overall.total_orders, 1);
    }

    #[test]
    fn test_items_sorted_worst_first_incomplete_last() {
        let report = analyze_delivery_compliance(&[
            order(None, Some(date(3, 1)), Some(date(3, 10)), None, None),
            order(None, Some(date(3, 1)), Some(date(3, 10)), Some(date(3, 8)), None),
            order(None, Some(date(3, 1)), Some(date(3, 10)), Some(date(3, 20)), None),
        ]);
        let delays: Vec<Option<i64>> = report.items.iter().map(|i| i.delay_days).collect();
        assert_eq!(delays, vec![Some(10), Some(-2), None]);
    }

    #[test]
    fn test_supplier_summaries_sorted_by_on_time_rate() {
        let good = Uuid::new_v4();
        let bad = Uuid::new_v4();
        let report = analyze_delivery_compliance(&[
            order(Some(good), Some(date(3, 1)), Some(date(3, 10)), Some(date(3, 10)), None),
            order(Some(good), Some(date(3, 1)), Some(date(3, 10)), Some(date(3, 9)), None),
            order(Some(bad), Some(date(3, 1)), Some(date(3, 10)), Some(date(3, 15)), Some(7)),
            order(Some(bad), Some(date(3, 1)), Some(date(3, 10)), Some(date(3, 10)), Some(7)),
            order(Some(bad), Some(date(3, 1)), Some(date(3, 10)), None, Some(7)),
        ]);
        assert_eq!(report.supplier_summaries.len(), 2);
        let worst = &report.supplier_summaries[0];
        assert_eq!(worst.supplier_id, Some(bad));
        assert_eq!(worst.stats.total_orders, 3);
        assert_eq!(worst.stats.completed_orders, 2);
        assert_eq!(worst.stats.on_time_rate, Decimal::from(50));
        assert_eq!(worst.stats.max_delay_days, Some(5));
        assert_eq!(worst.stats.avg_standard_lead_time, Some(Decimal::from(7)));
        assert_eq!(report.supplier_summaries[1].stats.on_time_rate, Decimal::from(100));
        assert_eq!(report.overall.completed_orders, 4);
        assert_eq!(report.overall.on_time_orders, 3);
    }

    #[test]
    fn test_no_completed_orders_rate_is_zero() {
        let report = analyze_delivery_compliance(&[order(
            None,
            Some(date(3, 1)),
            Some(date(3, 10)),
            None,
            None,
        )]);
        assert_eq!(report.overall.completed_orders, 0);
        assert_eq!(report.overall.on_time_rate, Decimal::ZERO);
        assert_eq!(report.overall.avg_delay_days, None);
    }
}

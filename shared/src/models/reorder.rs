//! Reorder point, safety stock and order quantity planning

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{get_inventory_status, InventoryStatus};
use crate::safe_math::{
    ceil_quantity, floor_quantity, non_negative, non_negative_decimal, safe_divide, safe_sqrt,
    saturating_add, saturating_mul, saturating_sub,
};

/// Days of cover ordered when neither EOQ nor a target is configured
pub const DEFAULT_TARGET_DAYS: i64 = 30;

/// Inputs for the reorder point formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReorderPointInput {
    pub average_daily_demand: Decimal,
    pub lead_time_days: i64,
    pub safety_stock: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderPointResult {
    pub reorder_point: i64,
    /// Demand expected while a replenishment order is in transit
    pub lead_time_demand: i64,
    pub safety_stock: i64,
}

/// `reorder_point = ceil(demand * lead_time) + safety_stock`
pub fn calculate_reorder_point(input: &ReorderPointInput) -> ReorderPointResult {
    let demand = non_negative_decimal(input.average_daily_demand);
    let lead_time = non_negative(input.lead_time_days);
    let safety_stock = non_negative(input.safety_stock);

    let lead_time_demand = ceil_quantity(saturating_mul(demand, Decimal::from(lead_time)));

    ReorderPointResult {
        reorder_point: lead_time_demand.saturating_add(safety_stock),
        lead_time_demand,
        safety_stock,
    }
}

/// Reorder when stock is at or below the reorder point
///
/// Inclusive, unlike the classifier's strict caution boundary.
pub fn should_reorder(current_stock: i64, reorder_point: i64) -> bool {
    current_stock <= reorder_point
}

/// Whole days until stock falls to the reorder point
///
/// `Some(0)` when already at or below it, `None` when demand is zero or
/// negative and the horizon is undefined.
pub fn days_until_reorder(
    current_stock: i64,
    reorder_point: i64,
    average_daily_demand: Decimal,
) -> Option<i64> {
    if current_stock <= reorder_point {
        return Some(0);
    }
    if average_daily_demand <= Decimal::ZERO {
        return None;
    }
    let headroom = Decimal::from(current_stock) - Decimal::from(reorder_point);
    safe_divide(headroom, average_daily_demand).map(floor_quantity)
}

/// How the order quantity was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderMethod {
    Eoq,
    TargetDays,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderQuantityInput {
    pub current_stock: i64,
    pub reorder_point: i64,
    pub safety_stock: i64,
    pub average_daily_demand: Decimal,
    pub eoq: Option<i64>,
    pub target_days_of_inventory: Option<i64>,
    pub min_order_quantity: Option<i64>,
    pub order_multiple: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuantityResult {
    pub recommended_quantity: i64,
    pub method: OrderMethod,
    pub projected_stock: i64,
}

/// Recommend an order quantity
///
/// A positive EOQ wins outright. Otherwise the order tops stock up to
/// `demand * target_days + safety_stock`. The minimum order quantity then
/// lifts any non-zero need, and the order multiple rounds up.
pub fn calculate_order_quantity(input: &OrderQuantityInput) -> OrderQuantityResult {
    let (base, method) = match input.eoq.filter(|eoq| *eoq > 0) {
        Some(eoq) => (eoq, OrderMethod::Eoq),
        None => {
            let target_days =
                non_negative(input.target_days_of_inventory.unwrap_or(DEFAULT_TARGET_DAYS));
            let target_stock = saturating_add(
                saturating_mul(
                    non_negative_decimal(input.average_daily_demand),
                    Decimal::from(target_days),
                ),
                Decimal::from(non_negative(input.safety_stock)),
            );
            let need = saturating_sub(target_stock, Decimal::from(input.current_stock));
            (non_negative(ceil_quantity(need)), OrderMethod::TargetDays)
        }
    };

    let mut quantity = base;

    if let Some(moq) = input.min_order_quantity.filter(|moq| *moq > 0) {
        if quantity > 0 {
            quantity = quantity.max(moq);
        }
    }

    if let Some(multiple) = input.order_multiple.filter(|m| *m > 0) {
        quantity = round_up_to_multiple(quantity, multiple);
    }

    OrderQuantityResult {
        recommended_quantity: quantity,
        method,
        projected_stock: input.current_stock.saturating_add(quantity),
    }
}

fn round_up_to_multiple(quantity: i64, multiple: i64) -> i64 {
    if quantity <= 0 {
        return 0;
    }
    let packs = quantity / multiple + i64::from(quantity % multiple != 0);
    packs.saturating_mul(multiple)
}

/// Service-level z-score, stepped
pub fn z_score(service_level: Decimal) -> Decimal {
    let thresholds: [(i64, i64); 5] = [(99, 233), (98, 205), (95, 165), (90, 128), (85, 104)];
    for (level, z) in thresholds {
        if service_level >= Decimal::new(level, 2) {
            return Decimal::new(z, 2);
        }
    }
    Decimal::new(84, 2)
}

/// `ceil(z * demand_std_dev * sqrt(lead_time_days))`
pub fn calculate_safety_stock(
    service_level: Decimal,
    demand_std_dev: Decimal,
    lead_time_days: i64,
) -> i64 {
    let sigma = non_negative_decimal(demand_std_dev);
    let lead_time = Decimal::from(non_negative(lead_time_days));
    ceil_quantity(saturating_mul(
        saturating_mul(z_score(service_level), sigma),
        safe_sqrt(lead_time),
    ))
}

/// Economic order quantity, `ceil(sqrt(2DS / H))`
///
/// `None` when annual demand or the per-unit holding cost is not positive.
pub fn calculate_eoq(
    annual_demand: Decimal,
    ordering_cost: Decimal,
    holding_cost_per_unit: Decimal,
) -> Option<i64> {
    if annual_demand <= Decimal::ZERO || holding_cost_per_unit <= Decimal::ZERO {
        return None;
    }
    let ratio = safe_divide(
        saturating_mul(
            saturating_mul(Decimal::TWO, annual_demand),
            non_negative_decimal(ordering_cost),
        ),
        holding_cost_per_unit,
    )?;
    Some(ceil_quantity(safe_sqrt(ratio)))
}

/// Average units shipped per day over a lookback window
pub fn average_daily_demand(total_outbound: i64, days: i64) -> Decimal {
    if days <= 0 {
        return Decimal::ZERO;
    }
    safe_divide(Decimal::from(non_negative(total_outbound)), Decimal::from(days))
        .unwrap_or(Decimal::ZERO)
}

/// Planning parameters for one product, as gathered by the replenishment scan
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplenishmentItem {
    pub product_id: Uuid,
    pub current_stock: i64,
    pub safety_stock: i64,
    /// Configured reorder point; computed from demand when absent
    pub reorder_point: Option<i64>,
    pub average_daily_demand: Decimal,
    pub lead_time_days: i64,
    pub eoq: Option<i64>,
    pub target_days_of_inventory: Option<i64>,
    pub min_order_quantity: Option<i64>,
    pub order_multiple: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderPlan {
    pub product_id: Uuid,
    pub reorder_point: i64,
    pub lead_time_demand: i64,
    pub status: InventoryStatus,
    pub should_reorder: bool,
    pub days_until_reorder: Option<i64>,
    /// Present only when a reorder is due
    pub order: Option<OrderQuantityResult>,
}

/// Reorder point, status and, when due, an order recommendation
pub fn build_reorder_plan(item: &ReplenishmentItem) -> ReorderPlan {
    let computed = calculate_reorder_point(&ReorderPointInput {
        average_daily_demand: item.average_daily_demand,
        lead_time_days: item.lead_time_days,
        safety_stock: item.safety_stock,
    });
    let reorder_point = item
        .reorder_point
        .filter(|rp| *rp > 0)
        .unwrap_or(computed.reorder_point);

    let status = get_inventory_status(item.current_stock, item.safety_stock, reorder_point);
    let reorder = should_reorder(item.current_stock, reorder_point);

    let order = reorder.then(|| {
        calculate_order_quantity(&OrderQuantityInput {
            current_stock: item.current_stock,
            reorder_point,
            safety_stock: item.safety_stock,
            average_daily_demand: item.average_daily_demand,
            eoq: item.eoq,
            target_days_of_inventory: item.target_days_of_inventory,
            min_order_quantity: item.min_order_quantity,
            order_multiple: item.order_multiple,
        })
    });

    ReorderPlan {
        product_id: item.product_id,
        reorder_point,
        lead_time_demand: computed.lead_time_demand,
        status,
        should_reorder: reorder,
        days_until_reorder: days_until_reorder(
            item.current_stock,
            reorder_point,
            item.average_daily_demand,
        ),
        order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_reorder_point_basic() {
        let result = calculate_reorder_point(&ReorderPointInput {
            average_daily_demand: Decimal::from(10),
            lead_time_days: 7,
            safety_stock: 30,
        });
        assert_eq!(result.reorder_point, 100);
        assert_eq!(result.lead_time_demand, 70);
        assert_eq!(result.safety_stock, 30);
    }

    #[test]
    fn test_reorder_point_rounds_lead_time_demand_up() {
        let result = calculate_reorder_point(&ReorderPointInput {
            average_daily_demand: dec("2.3"),
            lead_time_days: 3,
            safety_stock: 5,
        });
        // 6.9 -> 7
        assert_eq!(result.lead_time_demand, 7);
        assert_eq!(result.reorder_point, 12);
    }

    #[test]
    fn test_reorder_point_zero_demand_or_lead_time() {
        let zero_demand = calculate_reorder_point(&ReorderPointInput {
            average_daily_demand: Decimal::ZERO,
            lead_time_days: 14,
            safety_stock: 40,
        });
        assert_eq!(zero_demand.reorder_point, 40);

        let zero_lead = calculate_reorder_point(&ReorderPointInput {
            average_daily_demand: Decimal::from(12),
            lead_time_days: 0,
            safety_stock: 40,
        });
        assert_eq!(zero_lead.reorder_point, 40);
        assert_eq!(zero_lead.lead_time_demand, 0);
    }

    #[test]
    fn test_should_reorder_inclusive() {
        assert!(should_reorder(100, 100));
        assert!(should_reorder(0, 100));
        assert!(!should_reorder(101, 100));
    }

    #[test]
    fn test_days_until_reorder() {
        assert_eq!(days_until_reorder(150, 100, Decimal::from(10)), Some(5));
        assert_eq!(days_until_reorder(150, 100, Decimal::ZERO), None);
        assert_eq!(days_until_reorder(150, 100, Decimal::from(-3)), None);
        assert_eq!(days_until_reorder(50, 100, Decimal::from(10)), Some(0));
        assert_eq!(days_until_reorder(100, 100, Decimal::ZERO), Some(0));
        assert_eq!(days_until_reorder(159, 100, Decimal::from(10)), Some(5));
    }

    #[test]
    fn test_order_quantity_eoq_wins() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 40,
            reorder_point: 100,
            safety_stock: 30,
            average_daily_demand: Decimal::from(10),
            eoq: Some(200),
            target_days_of_inventory: Some(60),
            ..Default::default()
        });
        assert_eq!(result.recommended_quantity, 200);
        assert_eq!(result.method, OrderMethod::Eoq);
        assert_eq!(result.projected_stock, 240);
    }

    #[test]
    fn test_order_quantity_target_days() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 50,
            reorder_point: 100,
            safety_stock: 30,
            average_daily_demand: Decimal::from(10),
            target_days_of_inventory: Some(30),
            ..Default::default()
        });
        // 10 * 30 + 30 - 50
        assert_eq!(result.recommended_quantity, 280);
        assert_eq!(result.method, OrderMethod::TargetDays);
        assert_eq!(result.projected_stock, 330);
    }

    #[test]
    fn test_order_quantity_defaults_to_target_days() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 0,
            average_daily_demand: Decimal::from(2),
            ..Default::default()
        });
        assert_eq!(result.method, OrderMethod::TargetDays);
        assert_eq!(result.recommended_quantity, 2 * DEFAULT_TARGET_DAYS);
    }

    #[test]
    fn test_order_quantity_no_need_stays_zero() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 500,
            safety_stock: 30,
            average_daily_demand: Decimal::from(10),
            target_days_of_inventory: Some(30),
            min_order_quantity: Some(100),
            order_multiple: Some(12),
            ..Default::default()
        });
        assert_eq!(result.recommended_quantity, 0);
        assert_eq!(result.projected_stock, 500);
    }

    #[test]
    fn test_order_quantity_moq_lifts_small_need() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 320,
            safety_stock: 30,
            average_daily_demand: Decimal::from(10),
            target_days_of_inventory: Some(30),
            min_order_quantity: Some(100),
            ..Default::default()
        });
        // need is 10, MOQ takes the max
        assert_eq!(result.recommended_quantity, 100);
    }

    #[test]
    fn test_order_quantity_moq_then_multiple() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 320,
            safety_stock: 30,
            average_daily_demand: Decimal::from(10),
            target_days_of_inventory: Some(30),
            min_order_quantity: Some(110),
            order_multiple: Some(100),
            ..Default::default()
        });
        assert_eq!(result.recommended_quantity, 200);
    }

    #[test]
    fn test_order_quantity_multiple_rounds_up() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 50,
            safety_stock: 30,
            average_daily_demand: Decimal::from(10),
            target_days_of_inventory: Some(30),
            order_multiple: Some(100),
            ..Default::default()
        });
        assert_eq!(result.recommended_quantity, 300);
    }

    #[test]
    fn test_order_quantity_fractional_demand_rounds_up() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 0,
            average_daily_demand: dec("0.5"),
            target_days_of_inventory: Some(7),
            ..Default::default()
        });
        assert_eq!(result.recommended_quantity, 4);
    }

    #[test]
    fn test_safety_stock_formula() {
        // 1.65 * 10 * sqrt(9) = 49.5 -> 50
        assert_eq!(calculate_safety_stock(dec("0.95"), Decimal::from(10), 9), 50);
        assert_eq!(calculate_safety_stock(dec("0.95"), Decimal::ZERO, 9), 0);
        assert_eq!(calculate_safety_stock(dec("0.99"), Decimal::from(10), 0), 0);
    }

    #[test]
    fn test_z_score_steps() {
        assert_eq!(z_score(dec("0.999")), dec("2.33"));
        assert_eq!(z_score(dec("0.95")), dec("1.65"));
        assert_eq!(z_score(dec("0.92")), dec("1.28"));
        assert_eq!(z_score(dec("0.5")), dec("0.84"));
    }

    #[test]
    fn test_eoq() {
        // sqrt(2 * 1000 * 50 / 2) = sqrt(50000) = 223.6 -> 224
        assert_eq!(
            calculate_eoq(Decimal::from(1000), Decimal::from(50), Decimal::from(2)),
            Some(224)
        );
        assert_eq!(calculate_eoq(Decimal::from(1000), Decimal::from(50), Decimal::ZERO), None);
        assert_eq!(calculate_eoq(Decimal::ZERO, Decimal::from(50), Decimal::ONE), None);
    }

    #[test]
    fn test_average_daily_demand() {
        assert_eq!(average_daily_demand(900, 90), Decimal::from(10));
        assert_eq!(average_daily_demand(900, 0), Decimal::ZERO);
        assert_eq!(average_daily_demand(-5, 10), Decimal::ZERO);
    }

    #[test]
    fn test_build_reorder_plan_due() {
        let plan = build_reorder_plan(&ReplenishmentItem {
            product_id: Uuid::nil(),
            current_stock: 80,
            safety_stock: 30,
            average_daily_demand: Decimal::from(10),
            lead_time_days: 7,
            order_multiple: Some(50),
            ..Default::default()
        });
        assert_eq!(plan.reorder_point, 100);
        assert!(plan.should_reorder);
        assert_eq!(plan.status, InventoryStatus::Caution);
        assert_eq!(plan.days_until_reorder, Some(0));
        let order = plan.order.unwrap();
        // 10 * 30 + 30 - 80 = 250
        assert_eq!(order.recommended_quantity, 250);
    }

    #[test]
    fn test_build_reorder_plan_not_due() {
        let plan = build_reorder_plan(&ReplenishmentItem {
            product_id: Uuid::nil(),
            current_stock: 150,
            safety_stock: 30,
            reorder_point: Some(120),
            average_daily_demand: Decimal::from(10),
            lead_time_days: 7,
            ..Default::default()
        });
        assert_eq!(plan.reorder_point, 120);
        assert!(!plan.should_reorder);
        assert_eq!(plan.days_until_reorder, Some(3));
        assert!(plan.order.is_none());
    }

    #[test]
    fn test_reorder_point_saturates_on_huge_demand() {
        let result = calculate_reorder_point(&ReorderPointInput {
            average_daily_demand: dec("100000000000000000000"),
            lead_time_days: 1_000_000_000_000,
            safety_stock: 10,
        });
        assert_eq!(result.lead_time_demand, i64::MAX);
        assert_eq!(result.reorder_point, i64::MAX);
    }

    #[test]
    fn test_order_quantity_saturates_on_huge_target() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: -5,
            safety_stock: i64::MAX,
            average_daily_demand: dec("1000000000000"),
            target_days_of_inventory: Some(i64::MAX),
            order_multiple: Some(7),
            ..Default::default()
        });
        assert_eq!(result.method, OrderMethod::TargetDays);
        assert!(result.recommended_quantity > 0);
        assert_eq!(result.recommended_quantity % 7, 0);
    }

    #[test]
    fn test_safety_stock_and_eoq_saturate() {
        assert_eq!(calculate_safety_stock(dec("0.99"), Decimal::MAX, 365), i64::MAX);
        let eoq = calculate_eoq(Decimal::MAX, Decimal::MAX, Decimal::ONE);
        assert!(eoq.is_some_and(|q| q > 0));
    }
}

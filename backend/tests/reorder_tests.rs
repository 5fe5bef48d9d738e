//! Reorder point and order quantity tests
//!
//! Covers:
//! - Reorder point from demand, lead time and safety stock
//! - Order quantity methods with MOQ and order multiples
//! - The replenishment scan planner

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    calculate_eoq, calculate_order_quantity, calculate_reorder_point, calculate_safety_stock,
    days_until_reorder, should_reorder, OrderMethod, OrderQuantityInput, ReorderPointInput,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use stockflow_backend::config::PlanningConfig;
    use stockflow_backend::services::replenishment::{plan_items, ReplenishmentRow};
    use uuid::Uuid;

    #[test]
    fn test_reorder_point_rounds_lead_time_demand_up() {
        let result = calculate_reorder_point(&ReorderPointInput {
            average_daily_demand: dec("2.5"),
            lead_time_days: 3,
            safety_stock: 10,
        });
        assert_eq!(result.lead_time_demand, 8);
        assert_eq!(result.reorder_point, 18);
    }

    #[test]
    fn test_should_reorder_is_inclusive() {
        assert!(should_reorder(18, 18));
        assert!(!should_reorder(19, 18));
    }

    #[test]
    fn test_days_until_reorder() {
        assert_eq!(days_until_reorder(100, 40, dec("7")), Some(8));
        assert_eq!(days_until_reorder(30, 40, dec("7")), Some(0));
        assert_eq!(days_until_reorder(100, 40, Decimal::ZERO), None);
    }

    #[test]
    fn test_target_days_with_moq_and_multiple() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 40,
            reorder_point: 60,
            safety_stock: 20,
            average_daily_demand: dec("3"),
            target_days_of_inventory: Some(10),
            min_order_quantity: Some(25),
            order_multiple: Some(12),
            ..Default::default()
        });
        // 3 * 10 + 20 - 40 = 10, lifted to 25, rounded to 36
        assert_eq!(result.recommended_quantity, 36);
        assert_eq!(result.method, OrderMethod::TargetDays);
        assert_eq!(result.projected_stock, 76);
    }

    #[test]
    fn test_eoq_method_wins() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 0,
            average_daily_demand: dec("100"),
            eoq: Some(150),
            target_days_of_inventory: Some(30),
            ..Default::default()
        });
        assert_eq!(result.recommended_quantity, 150);
        assert_eq!(result.method, OrderMethod::Eoq);
    }

    #[test]
    fn test_no_need_skips_moq() {
        let result = calculate_order_quantity(&OrderQuantityInput {
            current_stock: 500,
            safety_stock: 10,
            average_daily_demand: dec("1"),
            target_days_of_inventory: Some(30),
            min_order_quantity: Some(100),
            order_multiple: Some(10),
            ..Default::default()
        });
        assert_eq!(result.recommended_quantity, 0);
    }

    #[test]
    fn test_safety_stock_and_eoq() {
        // 1.65 * 10.5 * sqrt(4) = 34.65
        assert_eq!(calculate_safety_stock(dec("0.95"), dec("10.5"), 4), 35);
        // sqrt(2 * 1000 * 50 / 4) = sqrt(25000) = 158.11
        assert_eq!(calculate_eoq(dec("1000"), dec("50"), dec("4")), Some(159));
        assert_eq!(calculate_eoq(dec("1000"), dec("50"), Decimal::ZERO), None);
    }

    #[test]
    fn test_scan_planner_uses_override_reorder_point() {
        let row = ReplenishmentRow {
            product_id: Uuid::new_v4(),
            current_stock: 150,
            safety_stock: 20,
            reorder_point: Some(200),
            lead_time_days: 7,
            eoq: Some(500),
            target_days_of_inventory: None,
            min_order_quantity: None,
            order_multiple: Some(100),
            outbound_quantity: 900,
        };
        let plans = plan_items(vec![row], &PlanningConfig::default());
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].reorder_point, 200);
        let order = plans[0].order.as_ref().unwrap();
        assert_eq!(order.method, OrderMethod::Eoq);
        assert_eq!(order.recommended_quantity, 500);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn demand_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Reorder point never falls below safety stock
        #[test]
        fn prop_reorder_point_covers_safety_stock(
            demand in demand_strategy(),
            lead_time in 0i64..120,
            safety in 0i64..5_000
        ) {
            let result = calculate_reorder_point(&ReorderPointInput {
                average_daily_demand: demand,
                lead_time_days: lead_time,
                safety_stock: safety,
            });
            prop_assert!(result.reorder_point >= safety);
            prop_assert_eq!(result.reorder_point, result.lead_time_demand + safety);
            prop_assert!(Decimal::from(result.lead_time_demand) >= demand * Decimal::from(lead_time));
        }

        /// Order multiples only ever round up, to an exact multiple
        #[test]
        fn prop_order_multiple_rounds_up(
            current in 0i64..2_000,
            safety in 0i64..500,
            demand in demand_strategy(),
            target_days in 1i64..90,
            multiple in 1i64..250
        ) {
            let base = OrderQuantityInput {
                current_stock: current,
                safety_stock: safety,
                average_daily_demand: demand,
                target_days_of_inventory: Some(target_days),
                ..Default::default()
            };
            let unconstrained = calculate_order_quantity(&base);
            let rounded = calculate_order_quantity(&OrderQuantityInput {
                order_multiple: Some(multiple),
                ..base
            });

            prop_assert!(rounded.recommended_quantity >= unconstrained.recommended_quantity);
            prop_assert_eq!(rounded.recommended_quantity % multiple, 0);
            prop_assert!(rounded.recommended_quantity - unconstrained.recommended_quantity < multiple);
        }

        /// A positive order respects the minimum order quantity
        #[test]
        fn prop_moq_respected(
            current in 0i64..2_000,
            demand in demand_strategy(),
            moq in 1i64..1_000
        ) {
            let result = calculate_order_quantity(&OrderQuantityInput {
                current_stock: current,
                average_daily_demand: demand,
                target_days_of_inventory: Some(30),
                min_order_quantity: Some(moq),
                ..Default::default()
            });
            prop_assert!(result.recommended_quantity == 0 || result.recommended_quantity >= moq);
            prop_assert!(result.recommended_quantity >= 0);
        }
    }
}

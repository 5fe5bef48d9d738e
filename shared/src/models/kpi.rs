//! Inventory cost KPIs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::safe_math::{
    non_negative, non_negative_decimal, round_half_up, safe_divide, saturating_mul, saturating_sub,
};

/// Annual holding cost as a share of inventory value
pub const HOLDING_COST_RATE: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

pub const DAYS_PER_YEAR: i64 = 365;

/// Aggregated figures for one reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostKpiInput {
    pub total_inventory_value: Decimal,
    pub total_revenue: Decimal,
    pub total_cogs: Decimal,
    pub stockout_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostKpis {
    pub holding_cost: Decimal,
    /// Gross margin return on inventory; `None` when not meaningful
    pub gmroi: Option<Decimal>,
    pub stockout_opportunity_cost: Decimal,
}

/// Holding cost, GMROI and stockout opportunity cost
///
/// GMROI is `None` when inventory value is zero or gross profit is not
/// positive; callers show that as "not available", not as 0.
pub fn calculate_cost_kpis(input: &CostKpiInput) -> CostKpis {
    let inventory_value = non_negative_decimal(input.total_inventory_value);
    let holding_cost = round_half_up(saturating_mul(inventory_value, HOLDING_COST_RATE), 0);

    let gross_profit = saturating_sub(input.total_revenue, input.total_cogs);
    let gmroi = if inventory_value.is_zero() || gross_profit <= Decimal::ZERO {
        None
    } else {
        safe_divide(gross_profit, inventory_value).map(|ratio| round_half_up(ratio, 2))
    };

    let daily_revenue_lost = saturating_mul(
        non_negative_decimal(input.total_revenue),
        Decimal::from(non_negative(input.stockout_days)),
    );
    let stockout_opportunity_cost = safe_divide(daily_revenue_lost, Decimal::from(DAYS_PER_YEAR))
        .map(|cost| round_half_up(cost, 0))
        .unwrap_or(Decimal::ZERO);

    CostKpis {
        holding_cost,
        gmroi,
        stockout_opportunity_cost,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnoverKpis {
    pub turnover: Option<Decimal>,
    pub days_of_inventory: Option<Decimal>,
}

/// Inventory turnover (`cogs / average inventory value`) and days of supply
pub fn calculate_turnover(total_cogs: Decimal, average_inventory_value: Decimal) -> TurnoverKpis {
    let turnover = if average_inventory_value <= Decimal::ZERO {
        None
    } else {
        safe_divide(non_negative_decimal(total_cogs), average_inventory_value)
    };
    let days_of_inventory = turnover
        .filter(|t| *t > Decimal::ZERO)
        .and_then(|t| safe_divide(Decimal::from(DAYS_PER_YEAR), t))
        .map(|days| round_half_up(days, 1));

    TurnoverKpis {
        turnover: turnover.map(|t| round_half_up(t, 2)),
        days_of_inventory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_cost_kpis_basic() {
        let kpis = calculate_cost_kpis(&CostKpiInput {
            total_inventory_value: Decimal::from(1_000_000),
            total_revenue: Decimal::from(3_650_000),
            total_cogs: Decimal::from(2_500_000),
            stockout_days: 3,
        });
        assert_eq!(kpis.holding_cost, Decimal::from(250_000));
        assert_eq!(kpis.gmroi, Some(dec("1.15")));
        assert_eq!(kpis.stockout_opportunity_cost, Decimal::from(30_000));
    }

    #[test]
    fn test_holding_cost_rounds_half_up() {
        let kpis = calculate_cost_kpis(&CostKpiInput {
            total_inventory_value: Decimal::from(10),
            ..Default::default()
        });
        // 2.5 -> 3
        assert_eq!(kpis.holding_cost, Decimal::from(3));
    }

    #[test]
    fn test_gmroi_none_for_zero_inventory() {
        let kpis = calculate_cost_kpis(&CostKpiInput {
            total_inventory_value: Decimal::ZERO,
            total_revenue: Decimal::from(500),
            total_cogs: Decimal::from(100),
            stockout_days: 0,
        });
        assert_eq!(kpis.gmroi, None);
        assert_eq!(kpis.holding_cost, Decimal::ZERO);
    }

    #[test]
    fn test_gmroi_none_for_non_positive_profit() {
        let loss = calculate_cost_kpis(&CostKpiInput {
            total_inventory_value: Decimal::from(1000),
            total_revenue: Decimal::from(100),
            total_cogs: Decimal::from(200),
            stockout_days: 0,
        });
        assert_eq!(loss.gmroi, None);

        let flat = calculate_cost_kpis(&CostKpiInput {
            total_inventory_value: Decimal::from(1000),
            total_revenue: Decimal::from(200),
            total_cogs: Decimal::from(200),
            stockout_days: 0,
        });
        assert_eq!(flat.gmroi, None);
    }

    #[test]
    fn test_turnover() {
        let kpis = calculate_turnover(Decimal::from(730), Decimal::from(100));
        assert_eq!(kpis.turnover, Some(dec("7.30")));
        assert_eq!(kpis.days_of_inventory, Some(dec("50.0")));

        let empty = calculate_turnover(Decimal::from(730), Decimal::ZERO);
        assert_eq!(empty.turnover, None);
        assert_eq!(empty.days_of_inventory, None);

        let idle = calculate_turnover(Decimal::ZERO, Decimal::from(100));
        assert_eq!(idle.turnover, Some(Decimal::ZERO));
        assert_eq!(idle.days_of_inventory, None);
    }

    #[test]
    fn test_extreme_inputs_do_not_panic() {
        let kpis = calculate_cost_kpis(&CostKpiInput {
            total_inventory_value: Decimal::MAX,
            total_revenue: Decimal::MAX,
            total_cogs: Decimal::MIN,
            stockout_days: i64::MAX,
        });
        assert!(kpis.holding_cost > Decimal::ZERO);
        assert_eq!(kpis.gmroi, Some(Decimal::ONE));
        assert!(kpis.stockout_opportunity_cost > Decimal::ZERO);
    }
}

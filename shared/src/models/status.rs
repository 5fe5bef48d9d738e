//! Inventory status classification
//!
//! A single decision table maps a stock snapshot to one of seven ordered
//! tiers. Both public entry points (`get_inventory_status` and
//! `classify_inventory_status`) delegate to it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::safe_math::non_negative;

/// Below `safety_stock * 0.5` is critical
const CRITICAL_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
/// Below `safety_stock * 3` is still optimal
const OPTIMAL_CEILING_RATIO: Decimal = Decimal::from_parts(3, 0, 0, false, 0);
/// Below `safety_stock * 5` is excess, at or above is overstock
const EXCESS_CEILING_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Stock snapshot for one product
///
/// `safety_stock` and `reorder_point` of 0 mean "not configured".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockLevel {
    pub current_stock: i64,
    pub safety_stock: i64,
    pub reorder_point: i64,
}

impl StockLevel {
    pub fn new(current_stock: i64, safety_stock: i64, reorder_point: i64) -> Self {
        Self {
            current_stock,
            safety_stock,
            reorder_point,
        }
    }

    /// Copy with every field clamped at zero
    pub fn clamped(&self) -> Self {
        Self {
            current_stock: non_negative(self.current_stock),
            safety_stock: non_negative(self.safety_stock),
            reorder_point: non_negative(self.reorder_point),
        }
    }
}

/// Stock status tiers, ordered from emptiest to fullest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    OutOfStock,
    Critical,
    Shortage,
    Caution,
    Optimal,
    Excess,
    Overstock,
}

/// How urgently a status needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    None,
    Low,
    Medium,
    High,
}

impl UrgencyLevel {
    /// Numeric level, 0 (none) to 3 (high)
    pub fn level(&self) -> u8 {
        match self {
            UrgencyLevel::None => 0,
            UrgencyLevel::Low => 1,
            UrgencyLevel::Medium => 2,
            UrgencyLevel::High => 3,
        }
    }
}

impl InventoryStatus {
    pub const ALL: [InventoryStatus; 7] = [
        InventoryStatus::OutOfStock,
        InventoryStatus::Critical,
        InventoryStatus::Shortage,
        InventoryStatus::Caution,
        InventoryStatus::Optimal,
        InventoryStatus::Excess,
        InventoryStatus::Overstock,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            InventoryStatus::OutOfStock => "out_of_stock",
            InventoryStatus::Critical => "critical",
            InventoryStatus::Shortage => "shortage",
            InventoryStatus::Caution => "caution",
            InventoryStatus::Optimal => "optimal",
            InventoryStatus::Excess => "excess",
            InventoryStatus::Overstock => "overstock",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InventoryStatus::OutOfStock => "Out of Stock",
            InventoryStatus::Critical => "Critical",
            InventoryStatus::Shortage => "Shortage",
            InventoryStatus::Caution => "Caution",
            InventoryStatus::Optimal => "Optimal",
            InventoryStatus::Excess => "Excess",
            InventoryStatus::Overstock => "Overstock",
        }
    }

    pub fn urgency(&self) -> UrgencyLevel {
        match self {
            InventoryStatus::OutOfStock | InventoryStatus::Critical => UrgencyLevel::High,
            InventoryStatus::Shortage | InventoryStatus::Overstock => UrgencyLevel::Medium,
            InventoryStatus::Caution | InventoryStatus::Excess => UrgencyLevel::Low,
            InventoryStatus::Optimal => UrgencyLevel::None,
        }
    }

    pub fn needs_action(&self) -> bool {
        !matches!(self, InventoryStatus::Optimal)
    }

    /// Out of stock, critical, shortage or caution
    pub fn is_replenishment_tier(&self) -> bool {
        *self <= InventoryStatus::Caution
    }

    /// Excess or overstock
    pub fn is_overstock_tier(&self) -> bool {
        *self >= InventoryStatus::Excess
    }
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for InventoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InventoryStatus::ALL
            .into_iter()
            .find(|status| status.key() == s)
            .ok_or_else(|| format!("unknown inventory status '{}'", s))
    }
}

/// Status with its urgency metadata, for the rich accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusClassification {
    pub level: StockLevel,
    pub status: InventoryStatus,
    pub urgency: UrgencyLevel,
    pub needs_action: bool,
}

/// The decision table. First matching rule wins; all comparisons are
/// strict so boundary values fall into the higher-stock tier.
///
/// Negative inputs are clamped to zero first.
fn decide(level: StockLevel) -> InventoryStatus {
    let StockLevel {
        current_stock,
        safety_stock,
        reorder_point,
    } = level.clamped();

    if current_stock == 0 {
        return InventoryStatus::OutOfStock;
    }

    if safety_stock <= 0 {
        if reorder_point > 0 && current_stock < reorder_point {
            return InventoryStatus::Caution;
        }
        return InventoryStatus::Optimal;
    }

    let current = Decimal::from(current_stock);
    let safety = Decimal::from(safety_stock);

    if current < safety * CRITICAL_RATIO {
        InventoryStatus::Critical
    } else if current_stock < safety_stock {
        InventoryStatus::Shortage
    } else if current_stock < reorder_point {
        InventoryStatus::Caution
    } else if current < safety * OPTIMAL_CEILING_RATIO {
        InventoryStatus::Optimal
    } else if current < safety * EXCESS_CEILING_RATIO {
        InventoryStatus::Excess
    } else {
        InventoryStatus::Overstock
    }
}

/// Status tier for raw stock figures
pub fn get_inventory_status(
    current_stock: i64,
    safety_stock: i64,
    reorder_point: i64,
) -> InventoryStatus {
    decide(StockLevel::new(current_stock, safety_stock, reorder_point))
}

/// Status tier with urgency and action metadata
pub fn classify_inventory_status(level: &StockLevel) -> StatusClassification {
    let status = decide(*level);
    StatusClassification {
        level: *level,
        status,
        urgency: status.urgency(),
        needs_action: status.needs_action(),
    }
}

/// True for out of stock, critical, shortage and caution
pub fn needs_reorder(level: &StockLevel) -> bool {
    decide(*level).is_replenishment_tier()
}

/// True for excess and overstock
pub fn is_overstocked(level: &StockLevel) -> bool {
    decide(*level).is_overstock_tier()
}

/// Per-tier counts for dashboard tiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub counts: BTreeMap<InventoryStatus, usize>,
    pub total: usize,
    pub needs_reorder: usize,
    pub overstocked: usize,
}

impl StatusSummary {
    pub fn count(&self, status: InventoryStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// Classify every level and count the tiers
pub fn summarize_statuses<'a, I>(levels: I) -> StatusSummary
where
    I: IntoIterator<Item = &'a StockLevel>,
{
    let mut counts: BTreeMap<InventoryStatus, usize> =
        InventoryStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    let mut total = 0;

    for level in levels {
        *counts.entry(decide(*level)).or_insert(0) += 1;
        total += 1;
    }

    let needs_reorder = counts
        .iter()
        .filter(|(status, _)| status.is_replenishment_tier())
        .map(|(_, n)| n)
        .sum();
    let overstocked = counts
        .iter()
        .filter(|(status, _)| status.is_overstock_tier())
        .map(|(_, n)| n)
        .sum();

    StatusSummary {
        counts,
        total,
        needs_reorder,
        overstocked,
    }
}

//! Inventory lots and FIFO/FEFO deduction planning
//!
//! Deduction is computed as a plan against a snapshot of active lots. The
//! caller commits the plan; `apply_deduction_plan` shows the conditional
//! commit rules an in-memory or persisted store must follow.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of a lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    Active,
    Depleted,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Active => "active",
            LotStatus::Depleted => "depleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(LotStatus::Active),
            "depleted" => Some(LotStatus::Depleted),
            _ => None,
        }
    }
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A received lot of one product in one warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLot {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub lot_number: String,
    pub remaining_quantity: i64,
    pub status: LotStatus,
    pub expiry_date: Option<NaiveDate>,
    pub received_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Concurrency token, bumped on every committed deduction
    pub version: i64,
}

impl InventoryLot {
    /// Active with stock left
    pub fn is_available(&self) -> bool {
        self.status == LotStatus::Active && self.remaining_quantity > 0
    }

    fn belongs_to(&self, product_id: Uuid, warehouse_id: Uuid) -> bool {
        self.product_id == product_id && self.warehouse_id == warehouse_id
    }
}

/// Outbound request against one product in one warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductByFifoRequest {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: i64,
}

/// One line of a deduction plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoDeduction {
    pub lot_id: Uuid,
    pub lot_number: String,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
}

/// New state for a lot once the plan is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotUpdate {
    pub lot_id: Uuid,
    /// Version the plan was computed against
    pub expected_version: i64,
    pub deducted: i64,
    pub remaining_quantity: i64,
    pub status: LotStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoPlan {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub deductions: Vec<FifoDeduction>,
    pub updates: Vec<LotUpdate>,
    pub total_deducted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FifoError {
    #[error("Deduction quantity must be positive, got {requested}")]
    InvalidQuantity { requested: i64 },

    #[error("Insufficient lot stock: requested {requested}, available {available}")]
    InsufficientLotStock { requested: i64, available: i64 },

    #[error("Lot {lot_id} changed since the deduction was planned")]
    ConcurrentModification { lot_id: Uuid },
}

impl FifoError {
    /// Units missing for an insufficient-stock failure
    pub fn shortfall(&self) -> Option<i64> {
        match self {
            FifoError::InsufficientLotStock {
                requested,
                available,
            } => Some(requested - available),
            _ => None,
        }
    }
}

/// Consumption order: earliest expiry first (no expiry last), then earliest
/// received, then earliest created.
pub fn fefo_order(a: &InventoryLot, b: &InventoryLot) -> Ordering {
    let expiry = match (a.expiry_date, b.expiry_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    expiry
        .then_with(|| a.received_date.cmp(&b.received_date))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Total quantity available for a product in a warehouse
pub fn available_quantity(lots: &[InventoryLot], product_id: Uuid, warehouse_id: Uuid) -> i64 {
    lots.iter()
        .filter(|lot| lot.belongs_to(product_id, warehouse_id) && lot.is_available())
        .fold(0i64, |total, lot| total.saturating_add(lot.remaining_quantity))
}

/// Plan an outbound deduction across lots in FEFO-then-FIFO order
///
/// Availability is checked before any line is planned, so a failure never
/// yields a partial plan. Lots for other products or warehouses, depleted
/// lots and empty lots are ignored.
pub fn deduct_by_fifo(
    request: &DeductByFifoRequest,
    lots: &[InventoryLot],
) -> Result<FifoPlan, FifoError> {
    if request.quantity <= 0 {
        return Err(FifoError::InvalidQuantity {
            requested: request.quantity,
        });
    }

    let mut eligible: Vec<&InventoryLot> = lots
        .iter()
        .filter(|lot| lot.belongs_to(request.product_id, request.warehouse_id))
        .filter(|lot| lot.is_available())
        .collect();

    let available = eligible
        .iter()
        .fold(0i64, |total, lot| total.saturating_add(lot.remaining_quantity));
    if available < request.quantity {
        return Err(FifoError::InsufficientLotStock {
            requested: request.quantity,
            available,
        });
    }

    eligible.sort_by(|a, b| fefo_order(a, b));

    let mut outstanding = request.quantity;
    let mut deductions = Vec::new();
    let mut updates = Vec::new();

    for lot in eligible {
        if outstanding == 0 {
            break;
        }
        let take = outstanding.min(lot.remaining_quantity);
        let remaining = lot.remaining_quantity - take;
        outstanding -= take;

        deductions.push(FifoDeduction {
            lot_id: lot.id,
            lot_number: lot.lot_number.clone(),
            quantity: take,
            expiry_date: lot.expiry_date,
        });
        updates.push(LotUpdate {
            lot_id: lot.id,
            expected_version: lot.version,
            deducted: take,
            remaining_quantity: remaining,
            status: if remaining == 0 {
                LotStatus::Depleted
            } else {
                LotStatus::Active
            },
        });
    }

    Ok(FifoPlan {
        product_id: request.product_id,
        warehouse_id: request.warehouse_id,
        deductions,
        updates,
        total_deducted: request.quantity,
    })
}

/// Commit a plan to in-memory lots, all or nothing
///
/// Every target lot must still be active, carry the version the plan was
/// computed against and hold at least the deducted quantity. Otherwise no
/// lot is touched and `ConcurrentModification` names the first stale lot.
pub fn apply_deduction_plan(lots: &mut [InventoryLot], plan: &FifoPlan) -> Result<(), FifoError> {
    let index: HashMap<Uuid, usize> = lots
        .iter()
        .enumerate()
        .map(|(i, lot)| (lot.id, i))
        .collect();

    for update in &plan.updates {
        let current = index.get(&update.lot_id).map(|&i| &lots[i]);
        let fresh = current.is_some_and(|lot| {
            lot.status == LotStatus::Active
                && lot.version == update.expected_version
                && lot.remaining_quantity >= update.deducted
        });
        if !fresh {
            return Err(FifoError::ConcurrentModification {
                lot_id: update.lot_id,
            });
        }
    }

    for update in &plan.updates {
        if let Some(&i) = index.get(&update.lot_id) {
            let lot = &mut lots[i];
            lot.remaining_quantity -= update.deducted;
            lot.status = if lot.remaining_quantity == 0 {
                LotStatus::Depleted
            } else {
                LotStatus::Active
            };
            lot.version += 1;
        }
    }

    Ok(())
}

/// Available lots expiring on or before `today + days`, soonest first
///
/// A horizon past the calendar range covers every lot with an expiry date.
pub fn lots_expiring_within(
    lots: &[InventoryLot],
    today: NaiveDate,
    days: i64,
) -> Vec<&InventoryLot> {
    let horizon = Duration::try_days(days.max(0)).and_then(|span| today.checked_add_signed(span));
    let mut expiring: Vec<&InventoryLot> = lots
        .iter()
        .filter(|lot| lot.is_available())
        .filter(|lot| match (lot.expiry_date, horizon) {
            (Some(expiry), Some(horizon)) => expiry <= horizon,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .collect();
    expiring.sort_by(|a, b| fefo_order(a, b));
    expiring
}

//! Snapshot validation for the Stockflow planning core
//!
//! Collaborators run these checks on rows read from the store before
//! handing them to the calculators, so malformed snapshots are rejected
//! rather than guessed at.

use rust_decimal::Decimal;

use crate::models::{InventoryLot, LotStatus, StockLevel};

// ============================================================================
// Stock Validations
// ============================================================================

/// Validate that a stock snapshot has no negative figures
pub fn validate_stock_level(level: &StockLevel) -> Result<(), &'static str> {
    if level.current_stock < 0 {
        return Err("Current stock cannot be negative");
    }
    if level.safety_stock < 0 {
        return Err("Safety stock cannot be negative");
    }
    if level.reorder_point < 0 {
        return Err("Reorder point cannot be negative");
    }
    Ok(())
}

/// Validate average daily demand is a usable rate
pub fn validate_daily_demand(demand: Decimal) -> Result<(), &'static str> {
    if demand < Decimal::ZERO {
        return Err("Average daily demand cannot be negative");
    }
    Ok(())
}

/// Validate lead time in days
pub fn validate_lead_time(days: i64) -> Result<(), &'static str> {
    if days < 0 {
        return Err("Lead time cannot be negative");
    }
    if days > 365 {
        return Err("Lead time exceeds one year");
    }
    Ok(())
}

/// Validate order constraints (MOQ and order multiple)
pub fn validate_order_constraints(
    min_order_quantity: Option<i64>,
    order_multiple: Option<i64>,
) -> Result<(), &'static str> {
    if min_order_quantity.is_some_and(|moq| moq < 0) {
        return Err("Minimum order quantity cannot be negative");
    }
    if order_multiple.is_some_and(|m| m <= 0) {
        return Err("Order multiple must be positive");
    }
    Ok(())
}

// ============================================================================
// Lot Validations
// ============================================================================

/// Validate a lot row is internally consistent
pub fn validate_lot(lot: &InventoryLot) -> Result<(), &'static str> {
    if lot.lot_number.trim().is_empty() {
        return Err("Lot number is required");
    }
    if lot.remaining_quantity < 0 {
        return Err("Remaining quantity cannot be negative");
    }
    if lot.status == LotStatus::Depleted && lot.remaining_quantity != 0 {
        return Err("Depleted lot must have zero remaining quantity");
    }
    if lot.expiry_date.is_some_and(|expiry| expiry < lot.received_date) {
        return Err("Expiry date cannot precede received date");
    }
    Ok(())
}

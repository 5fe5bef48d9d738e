//! WebAssembly bindings for the Stockflow planning core
//!
//! Lets dashboards compute in the browser:
//! - Inventory status tiers and badge colors
//! - Reorder points and days until reorder
//! - Order quantity recommendations
//! - Cost KPIs
//! - FIFO/FEFO deduction previews
//!
//! Numbers arriving from JavaScript may be NaN or infinite; they are coerced
//! to zero before reaching the core.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use shared::{
    safe_math::{non_negative, to_decimal, to_quantity},
    CostKpiInput, DeductByFifoRequest, InventoryLot, OrderQuantityInput, ReorderPointInput,
    StockLevel,
};

mod display;

pub use display::{status_display, StatusDisplay};

fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Coerce a JS number to a whole quantity, warning on non-finite input
fn quantity(name: &str, value: f64) -> i64 {
    if !value.is_finite() {
        warn(&format!("{} is not a finite number, using 0", name));
    }
    to_quantity(value)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

fn stock_level(current_stock: f64, safety_stock: f64, reorder_point: f64) -> StockLevel {
    StockLevel::new(
        quantity("current_stock", current_stock),
        quantity("safety_stock", safety_stock),
        quantity("reorder_point", reorder_point),
    )
}

/// Status key (`out_of_stock` .. `overstock`) for raw stock figures
#[wasm_bindgen]
pub fn get_inventory_status(current_stock: f64, safety_stock: f64, reorder_point: f64) -> String {
    let level = stock_level(current_stock, safety_stock, reorder_point);
    shared::get_inventory_status(level.current_stock, level.safety_stock, level.reorder_point)
        .key()
        .to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBadge {
    status: &'static str,
    label: &'static str,
    urgency: u8,
    needs_action: bool,
    color: &'static str,
    bg_color: &'static str,
}

/// Status with urgency and badge colors, as JSON
#[wasm_bindgen]
pub fn classify_inventory_status(
    current_stock: f64,
    safety_stock: f64,
    reorder_point: f64,
) -> Result<String, JsValue> {
    let classification =
        shared::classify_inventory_status(&stock_level(current_stock, safety_stock, reorder_point));
    let display = status_display(classification.status);

    to_json(&StatusBadge {
        status: classification.status.key(),
        label: display.label,
        urgency: classification.urgency.level(),
        needs_action: classification.needs_action,
        color: display.color,
        bg_color: display.bg_color,
    })
}

/// Reorder point from average daily demand, lead time and safety stock
#[wasm_bindgen]
pub fn calculate_reorder_point(average_daily_demand: f64, lead_time_days: f64, safety_stock: f64) -> f64 {
    let result = shared::calculate_reorder_point(&ReorderPointInput {
        average_daily_demand: to_decimal(average_daily_demand),
        lead_time_days: quantity("lead_time_days", lead_time_days),
        safety_stock: quantity("safety_stock", safety_stock),
    });
    result.reorder_point as f64
}

/// Whole days until the reorder point, `undefined` when demand is zero
#[wasm_bindgen]
pub fn days_until_reorder(current_stock: f64, reorder_point: f64, average_daily_demand: f64) -> Option<f64> {
    shared::days_until_reorder(
        quantity("current_stock", current_stock),
        quantity("reorder_point", reorder_point),
        to_decimal(average_daily_demand),
    )
    .map(|days| days as f64)
}

/// Order quantity arguments as sent by the dashboard
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OrderQuantityArgs {
    current_stock: f64,
    reorder_point: f64,
    safety_stock: f64,
    average_daily_demand: f64,
    eoq: Option<f64>,
    target_days_of_inventory: Option<f64>,
    min_order_quantity: Option<f64>,
    order_multiple: Option<f64>,
}

impl From<OrderQuantityArgs> for OrderQuantityInput {
    fn from(args: OrderQuantityArgs) -> Self {
        OrderQuantityInput {
            current_stock: quantity("currentStock", args.current_stock),
            reorder_point: quantity("reorderPoint", args.reorder_point),
            safety_stock: quantity("safetyStock", args.safety_stock),
            average_daily_demand: to_decimal(args.average_daily_demand),
            eoq: args.eoq.map(|v| quantity("eoq", v)),
            target_days_of_inventory: args
                .target_days_of_inventory
                .map(|v| quantity("targetDaysOfInventory", v)),
            min_order_quantity: args.min_order_quantity.map(|v| quantity("minOrderQuantity", v)),
            order_multiple: args.order_multiple.map(|v| quantity("orderMultiple", v)),
        }
    }
}

/// Recommended order quantity for a JSON argument object
#[wasm_bindgen]
pub fn calculate_order_quantity(args_json: &str) -> Result<String, JsValue> {
    let args: OrderQuantityArgs = serde_json::from_str(args_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid order quantity JSON: {}", e)))?;
    to_json(&shared::calculate_order_quantity(&args.into()))
}

/// Holding cost, GMROI and stockout opportunity cost, as JSON
#[wasm_bindgen]
pub fn calculate_cost_kpis(
    total_inventory_value: f64,
    total_revenue: f64,
    total_cogs: f64,
    stockout_days: f64,
) -> Result<String, JsValue> {
    let kpis = shared::calculate_cost_kpis(&CostKpiInput {
        total_inventory_value: to_decimal(total_inventory_value),
        total_revenue: to_decimal(total_revenue),
        total_cogs: to_decimal(total_cogs),
        stockout_days: non_negative(quantity("stockout_days", stockout_days)),
    });
    to_json(&kpis)
}

/// Preview which lots an outbound quantity would consume
///
/// Nothing is persisted; the returned plan is informational.
#[wasm_bindgen]
pub fn preview_fifo_deduction(lots_json: &str, request_json: &str) -> Result<String, JsValue> {
    let lots: Vec<InventoryLot> = serde_json::from_str(lots_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid lots JSON: {}", e)))?;
    let request: DeductByFifoRequest = serde_json::from_str(request_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid request JSON: {}", e)))?;

    let plan = shared::deduct_by_fifo(&request, &lots).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_json(&plan)
}

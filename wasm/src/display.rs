//! Presentation table for inventory status badges

use serde::Serialize;
use shared::InventoryStatus;

/// Badge colors for one status tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub color: &'static str,
    pub bg_color: &'static str,
}

pub fn status_display(status: InventoryStatus) -> StatusDisplay {
    let (color, bg_color) = match status {
        InventoryStatus::OutOfStock => ("#991b1b", "#fee2e2"),
        InventoryStatus::Critical => ("#c2410c", "#ffedd5"),
        InventoryStatus::Shortage => ("#b45309", "#fef3c7"),
        InventoryStatus::Caution => ("#a16207", "#fef9c3"),
        InventoryStatus::Optimal => ("#15803d", "#dcfce7"),
        InventoryStatus::Excess => ("#1d4ed8", "#dbeafe"),
        InventoryStatus::Overstock => ("#6d28d9", "#ede9fe"),
    };
    StatusDisplay {
        label: status.label(),
        color,
        bg_color,
    }
}

//! Planning services backed by PostgreSQL

pub mod inventory;
pub mod kpi;
pub mod lot;
pub mod psi;
pub mod replenishment;

pub use inventory::InventoryService;
pub use kpi::KpiService;
pub use lot::LotService;
pub use psi::PsiService;
pub use replenishment::ReplenishmentService;

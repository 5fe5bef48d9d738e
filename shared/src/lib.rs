//! Shared planning core for the Stockflow inventory platform
//!
//! This crate holds the pure computation used by the backend services, the
//! replenishment worker and the browser (via WASM): status classification,
//! reorder math, FIFO/FEFO lot deduction, PSI reconstruction and KPI
//! calculators. Nothing in here performs I/O.

pub mod models;
pub mod safe_math;
pub mod types;
pub mod validation;

pub use models::*;
pub use safe_math::*;
pub use types::*;
pub use validation::*;

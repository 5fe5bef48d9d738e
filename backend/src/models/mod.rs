//! Domain models for the Stockflow backend
//!
//! Re-exports the planning models from the shared crate

pub use shared::models::*;
pub use shared::types::*;

//! Planning models and calculators for the Stockflow platform

mod delivery;
mod forecast;
mod kpi;
mod lot;
mod psi;
mod reorder;
mod status;

pub use delivery::*;
pub use forecast::*;
pub use kpi::*;
pub use lot::*;
pub use psi::*;
pub use reorder::*;
pub use status::*;

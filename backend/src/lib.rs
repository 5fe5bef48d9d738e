//! Stockflow backend
//!
//! Postgres-backed collaborators for the planning core: stock status boards,
//! lot deduction, PSI tables, KPI reports and the replenishment scan.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

/// State shared by the worker tasks
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}

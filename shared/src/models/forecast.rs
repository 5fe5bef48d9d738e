//! Simple demand forecasting from monthly history

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::psi::PsiWindow;
use crate::safe_math::{non_negative, round_half_up, safe_divide};
use crate::types::Period;

/// Default number of past months averaged into a forecast
pub const DEFAULT_FORECAST_WINDOW: usize = 3;

/// Mean of the last `window` values, rounded half up
///
/// `None` for an empty history or a zero window.
pub fn moving_average_forecast(history: &[i64], window: usize) -> Option<i64> {
    if window == 0 || history.is_empty() {
        return None;
    }
    let recent = &history[history.len().saturating_sub(window)..];
    let total = recent
        .iter()
        .map(|&quantity| non_negative(quantity))
        .fold(0i64, i64::saturating_add);
    let mean = safe_divide(Decimal::from(total), Decimal::from(recent.len() as i64))?;
    round_half_up(mean, 0).to_i64()
}

/// Forecast every projected month of the window
///
/// Uses the moving average of the complete months before the anchor; the
/// anchor month itself is still in progress and is left out.
pub fn project_moving_average(
    sales_by_month: &HashMap<Period, i64>,
    window: &PsiWindow,
    months: usize,
) -> HashMap<Period, i64> {
    let periods = window.periods();
    let anchor = window.current_index();
    let history: Vec<i64> = periods[..anchor]
        .iter()
        .map(|period| sales_by_month.get(period).copied().unwrap_or(0))
        .collect();

    match moving_average_forecast(&history, months) {
        Some(forecast) => periods[anchor + 1..]
            .iter()
            .map(|period| (*period, forecast))
            .collect(),
        None => HashMap::new(),
    }
}

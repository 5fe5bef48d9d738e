//! PSI (purchase, sales, inventory) monthly stock reconstruction
//!
//! The current month is anchored at the product's on-hand stock. Earlier
//! months are rebuilt by undoing each later month's net movement; later
//! months are projected from forecasts and planned inbound.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Period;

/// Quantities keyed by product, then by month
pub type MonthlyQuantities = HashMap<Uuid, HashMap<Period, i64>>;

/// Longest reach of a window on either side of the anchor month
pub const MAX_WINDOW_MONTHS: u32 = 120;

/// A fixed run of consecutive months with one anchor month
///
/// Only built through [`PsiWindow::around`] or [`PsiWindow::from_periods`],
/// so the anchor index always points into `periods`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PsiWindow {
    periods: Vec<Period>,
    current_index: usize,
    /// The current month was not in the window and the midpoint was used
    anchor_fallback: bool,
}

impl PsiWindow {
    /// `past_months` before and `future_months` after the month of `today`
    ///
    /// Each side is capped at [`MAX_WINDOW_MONTHS`].
    pub fn around(today: NaiveDate, past_months: u32, future_months: u32) -> Self {
        let current = Period::from_date(today);
        let past = past_months.min(MAX_WINDOW_MONTHS);
        let future = future_months.min(MAX_WINDOW_MONTHS);
        let periods = (-(past as i32)..=future as i32)
            .map(|offset| current.offset(offset))
            .collect();
        Self {
            periods,
            current_index: past as usize,
            anchor_fallback: false,
        }
    }

    /// Window over explicit periods
    ///
    /// When the month of `today` is not among them the midpoint becomes the
    /// anchor and the window remembers the fallback so the result can carry
    /// a warning. `None` for an empty list.
    pub fn from_periods(periods: Vec<Period>, today: NaiveDate) -> Option<Self> {
        if periods.is_empty() {
            return None;
        }
        let current = Period::from_date(today);
        let (current_index, anchor_fallback) = match periods.iter().position(|p| *p == current) {
            Some(index) => (index, false),
            None => (periods.len() / 2, true),
        };
        Some(Self {
            periods,
            current_index,
            anchor_fallback,
        })
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_period(&self) -> Period {
        self.periods[self.current_index]
    }

    pub fn is_anchor_fallback(&self) -> bool {
        self.anchor_fallback
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Product snapshot entering the aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsiProduct {
    pub product_id: Uuid,
    pub name: String,
    pub current_stock: i64,
}

/// Month-keyed inputs for every product
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsiInputs {
    pub sales: MonthlyQuantities,
    pub inbound: MonthlyQuantities,
    pub forecast: MonthlyQuantities,
    pub manual_forecast: MonthlyQuantities,
}

impl PsiInputs {
    fn lookup(map: &MonthlyQuantities, product_id: Uuid, period: Period) -> Option<i64> {
        map.get(&product_id).and_then(|months| months.get(&period)).copied()
    }

    fn sales(&self, product_id: Uuid, period: Period) -> i64 {
        Self::lookup(&self.sales, product_id, period).unwrap_or(0)
    }

    fn inbound(&self, product_id: Uuid, period: Period) -> i64 {
        Self::lookup(&self.inbound, product_id, period).unwrap_or(0)
    }

    fn forecast(&self, product_id: Uuid, period: Period) -> Option<i64> {
        Self::lookup(&self.forecast, product_id, period)
    }

    fn manual_forecast(&self, product_id: Uuid, period: Period) -> Option<i64> {
        Self::lookup(&self.manual_forecast, product_id, period)
    }

    /// Manual forecast overrides the computed one
    fn effective_forecast(&self, product_id: Uuid, period: Period) -> i64 {
        self.manual_forecast(product_id, period)
            .or_else(|| self.forecast(product_id, period))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsiMonthData {
    pub period: Period,
    pub beginning_stock: i64,
    pub inbound: i64,
    pub outbound: i64,
    pub ending_stock: i64,
    pub forecast: Option<i64>,
    pub manual_forecast: Option<i64>,
    /// After the anchor month, driven by forecast rather than history
    pub projected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPsi {
    pub product_id: Uuid,
    pub name: String,
    pub months: Vec<PsiMonthData>,
}

/// Diagnostics raised while rebuilding the series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PsiWarning {
    /// Current month outside the window; the midpoint was used as anchor
    AnchorOutsideWindow { anchor: Period },
    /// A reconstructed stock went negative and was clamped to zero
    NegativeStockClamped {
        product_id: Uuid,
        period: Period,
        raw: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsiResult {
    pub periods: Vec<Period>,
    pub current_index: usize,
    pub products: Vec<ProductPsi>,
    pub warnings: Vec<PsiWarning>,
}

fn clamp_stock(
    raw: i64,
    product_id: Uuid,
    period: Period,
    warnings: &mut Vec<PsiWarning>,
) -> i64 {
    if raw < 0 {
        warnings.push(PsiWarning::NegativeStockClamped {
            product_id,
            period,
            raw,
        });
        0
    } else {
        raw
    }
}

/// Build the PSI table for every product over the window
pub fn aggregate_psi(products: &[PsiProduct], inputs: &PsiInputs, window: &PsiWindow) -> PsiResult {
    let mut warnings = Vec::new();

    if window.is_anchor_fallback() {
        tracing::warn!(
            anchor = %window.current_period(),
            "current month outside PSI window, anchoring at midpoint"
        );
        warnings.push(PsiWarning::AnchorOutsideWindow {
            anchor: window.current_period(),
        });
    }

    let rows = products
        .iter()
        .map(|product| build_product(product, inputs, window, &mut warnings))
        .collect();

    PsiResult {
        periods: window.periods().to_vec(),
        current_index: window.current_index(),
        products: rows,
        warnings,
    }
}

fn build_product(
    product: &PsiProduct,
    inputs: &PsiInputs,
    window: &PsiWindow,
    warnings: &mut Vec<PsiWarning>,
) -> ProductPsi {
    let id = product.product_id;
    let periods = window.periods();
    let anchor = window.current_index();
    let mut ending = vec![0i64; periods.len()];

    ending[anchor] = clamp_stock(product.current_stock, id, periods[anchor], warnings);

    for i in (0..anchor).rev() {
        let later = periods[i + 1];
        let raw = ending[i + 1]
            .saturating_add(inputs.sales(id, later))
            .saturating_sub(inputs.inbound(id, later));
        ending[i] = clamp_stock(raw, id, periods[i], warnings);
    }

    for i in anchor + 1..periods.len() {
        let period = periods[i];
        let raw = ending[i - 1]
            .saturating_sub(inputs.effective_forecast(id, period))
            .saturating_add(inputs.inbound(id, period));
        ending[i] = clamp_stock(raw, id, period, warnings);
    }

    let months = periods
        .iter()
        .enumerate()
        .map(|(i, &period)| {
            let inbound = inputs.inbound(id, period);
            let outbound = inputs.sales(id, period);
            let beginning_stock = if i == 0 {
                let raw = ending[0].saturating_add(outbound).saturating_sub(inbound);
                clamp_stock(raw, id, period, warnings)
            } else {
                ending[i - 1]
            };
            PsiMonthData {
                period,
                beginning_stock,
                inbound,
                outbound,
                ending_stock: ending[i],
                forecast: inputs.forecast(id, period),
                manual_forecast: inputs.manual_forecast(id, period),
                projected: i > anchor,
            }
        })
        .collect();

    tracing::debug!(product_id = %id, months = periods.len(), "built PSI series");

    ProductPsi {
        product_id: id,
        name: product.name.clone(),
        months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn product(stock: i64) -> PsiProduct {
        PsiProduct {
            product_id: Uuid::nil(),
            name: "Widget".to_string(),
            current_stock: stock,
        }
    }

    fn series(entries: &[(&str, i64)]) -> MonthlyQuantities {
        let months = entries.iter().map(|(k, v)| (p(k), *v)).collect();
        HashMap::from([(Uuid::nil(), months)])
    }

    #[test]
    fn test_window_around_today() {
        let window = PsiWindow::around(today(), 6, 6);
        assert_eq!(window.len(), 13);
        assert_eq!(window.current_index(), 6);
        assert_eq!(window.current_period(), p("2024-06"));
        assert_eq!(window.periods()[0], p("2023-12"));
        assert_eq!(window.periods()[12], p("2024-12"));
        assert!(!window.is_anchor_fallback());
    }

    #[test]
    fn test_window_reach_is_capped() {
        let window = PsiWindow::around(today(), u32::MAX, u32::MAX);
        let reach = MAX_WINDOW_MONTHS as usize;
        assert_eq!(window.len(), reach * 2 + 1);
        assert_eq!(window.current_index(), reach);
        assert_eq!(window.current_period(), p("2024-06"));
        assert_eq!(window.periods()[0], p("2014-06"));
        assert_eq!(window.periods()[reach * 2], p("2034-06"));
    }

    #[test]
    fn test_window_fallback_to_midpoint() {
        let periods = vec![p("2023-01"), p("2023-02"), p("2023-03"), p("2023-04")];
        let window = PsiWindow::from_periods(periods, today()).unwrap();
        assert_eq!(window.current_index(), 2);
        assert!(window.is_anchor_fallback());

        let result = aggregate_psi(&[product(10)], &PsiInputs::default(), &window);
        assert!(result
            .warnings
            .contains(&PsiWarning::AnchorOutsideWindow { anchor: p("2023-03") }));
        assert!(PsiWindow::from_periods(Vec::new(), today()).is_none());
    }

    #[test]
    fn test_backward_reconstruction_and_forward_projection() {
        let window = PsiWindow::around(today(), 2, 2);
        let inputs = PsiInputs {
            sales: series(&[("2024-05", 30), ("2024-06", 20)]),
            inbound: series(&[("2024-05", 50), ("2024-06", 10), ("2024-08", 40)]),
            forecast: series(&[("2024-07", 25), ("2024-08", 25)]),
            manual_forecast: series(&[("2024-08", 60)]),
        };
        let result = aggregate_psi(&[product(100)], &inputs, &window);
        let months = &result.products[0].months;
        let ending: Vec<i64> = months.iter().map(|m| m.ending_stock).collect();

        // 2024-06 anchor 100; 2024-05 = 100 + 20 - 10 = 110; 2024-04 = 110 + 30 - 50 = 90
        // 2024-07 = 100 - 25 = 75; 2024-08 = 75 - 60 + 40 = 55
        assert_eq!(ending, vec![90, 110, 100, 75, 55]);
        assert_eq!(months[0].beginning_stock, 90);
        assert_eq!(months[1].beginning_stock, 90);
        assert_eq!(months[4].manual_forecast, Some(60));
        assert_eq!(months[4].forecast, Some(25));
        assert!(months[3].projected);
        assert!(!months[2].projected);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_past_months_balance() {
        let window = PsiWindow::around(today(), 3, 0);
        let inputs = PsiInputs {
            sales: series(&[("2024-04", 15), ("2024-05", 30), ("2024-06", 20)]),
            inbound: series(&[("2024-04", 40), ("2024-05", 50), ("2024-06", 10)]),
            ..Default::default()
        };
        let result = aggregate_psi(&[product(100)], &inputs, &window);
        for month in &result.products[0].months {
            assert_eq!(
                month.ending_stock,
                month.beginning_stock + month.inbound - month.outbound,
                "{}",
                month.period
            );
        }
    }

    #[test]
    fn test_negative_reconstruction_is_clamped_with_warning() {
        let window = PsiWindow::around(today(), 1, 1);
        let inputs = PsiInputs {
            inbound: series(&[("2024-06", 80)]),
            forecast: series(&[("2024-07", 500)]),
            ..Default::default()
        };
        let result = aggregate_psi(&[product(20)], &inputs, &window);
        let months = &result.products[0].months;
        assert_eq!(months[0].ending_stock, 0);
        assert_eq!(months[2].ending_stock, 0);
        assert!(months.iter().all(|m| m.ending_stock >= 0 && m.beginning_stock >= 0));
        assert!(result.warnings.contains(&PsiWarning::NegativeStockClamped {
            product_id: Uuid::nil(),
            period: p("2024-05"),
            raw: -60,
        }));
        assert!(result.warnings.contains(&PsiWarning::NegativeStockClamped {
            product_id: Uuid::nil(),
            period: p("2024-07"),
            raw: -480,
        }));
    }

    #[test]
    fn test_continuity_between_months() {
        let window = PsiWindow::around(today(), 6, 6);
        let inputs = PsiInputs {
            sales: series(&[("2024-02", 12), ("2024-05", 40)]),
            inbound: series(&[("2024-03", 70), ("2024-10", 30)]),
            forecast: series(&[("2024-09", 20), ("2024-11", 15)]),
            ..Default::default()
        };
        let result = aggregate_psi(&[product(55)], &inputs, &window);
        let months = &result.products[0].months;
        for pair in months.windows(2) {
            assert_eq!(pair[0].ending_stock, pair[1].beginning_stock);
        }
    }
}

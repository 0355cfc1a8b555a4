//! Grand total display.

use rust_decimal::{Decimal, RoundingStrategy};

/// Digits after the decimal point in a displayed total.
pub const DISPLAY_DECIMALS: u32 = 4;

/// Default label in front of the total.
pub const DEFAULT_TOTAL_LABEL: &str = "Total Rewards";

/// Default unit after the total.
pub const DEFAULT_UNIT_LABEL: &str = "ICP";

/// Rounds `total` to [`DISPLAY_DECIMALS`] places, halves away from zero,
/// and fixes the scale so trailing zeros are kept.
#[must_use]
pub fn round_total(total: Decimal) -> Decimal {
    let mut rounded =
        total.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DISPLAY_DECIMALS);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Renders a total as `"<label>: <total> <unit>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalFormat {
    label: String,
    unit: String,
}

impl TotalFormat {
    /// Creates a format with custom labels.
    pub fn new(label: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            unit: unit.into(),
        }
    }

    /// The text for `total`.
    #[must_use]
    pub fn render(&self, total: Decimal) -> String {
        format!("{}: {} {}", self.label, round_total(total), self.unit)
    }
}

impl Default for TotalFormat {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_LABEL, DEFAULT_UNIT_LABEL)
    }
}

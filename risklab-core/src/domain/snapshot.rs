//! Per-period portfolio snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Portfolio state recorded at the end of each period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub total_value: f64,
    pub open_positions: usize,
}

impl PortfolioSnapshot {
    /// Fraction of equity held as cash at this period.
    pub fn cash_ratio(&self) -> f64 {
        if self.total_value > 0.0 {
            self.cash / self.total_value
        } else {
            0.0
        }
    }
}

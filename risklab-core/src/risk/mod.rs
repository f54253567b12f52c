//! Pure risk functions shared by every driver variant.
//!
//! The legacy system duplicated this logic across the daily backtest, the
//! minute backtest, and the live monitor, and the copies drifted. Everything
//! here is a pure function of its arguments so the daily driver, the
//! minute-refined driver, and a live decision loop cannot diverge.

pub mod sizing;
pub mod trailing_stop;
pub mod whipsaw;

pub use sizing::{entry_fill_price, entry_ratio, size_entry};
pub use trailing_stop::stepped_stop;
pub use whipsaw::{detect_whipsaw, WhipsawCheck};

//! BacktestConfig — validated once at construction, immutable afterwards.

use serde::{Deserialize, Serialize};

/// How buy candidates are ordered when free slots are scarce.
///
/// The legacy modules disagreed with each other here; the ordering is an
/// explicit config choice instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// Sort descending by the supplied ranking metric; missing metrics and
    /// ties fall back to symbol order.
    #[default]
    Ranked,
    /// Pure symbol (encounter) order, ignoring any ranking metric.
    SignalOrder,
}

/// Errors produced by config validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("initial_cash must be positive, got {0}")]
    NonPositiveCash(f64),
    #[error("max_positions must be at least 1")]
    ZeroMaxPositions,
    #[error("slippage must be in (0, 0.1], got {0}")]
    SlippageOutOfRange(f64),
    #[error("{name} must be positive, got {value}")]
    NonPositiveParam { name: &'static str, value: f64 },
}

/// Full configuration for one simulation run.
///
/// Construct via [`BacktestConfig::new`] or [`BacktestConfig::from_toml`];
/// both validate and fail fast before any simulation step runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub max_positions: usize,
    /// Fractional execution cost, applied against every modeled fill.
    pub slippage: f64,
    /// Trailing-stop step size (fraction of entry price per step).
    #[serde(default = "default_std_risk")]
    pub std_risk: f64,
    /// Minimum stop distance below the entry price.
    #[serde(default = "default_init_risk")]
    pub init_risk: f64,
    /// Profit level at which half the position is banked.
    #[serde(default = "default_half_sell_threshold")]
    pub half_sell_threshold: f64,
    /// Stop-step widening factor applied after a half-sell.
    #[serde(default = "default_half_sell_risk_multiplier")]
    pub half_sell_risk_multiplier: f64,
    #[serde(default = "default_true")]
    pub enable_whipsaw: bool,
    #[serde(default = "default_true")]
    pub enable_half_sell: bool,
    #[serde(default)]
    pub enable_rebuying: bool,
    #[serde(default)]
    pub candidate_order: CandidateOrder,
}

fn default_std_risk() -> f64 {
    0.05
}

fn default_init_risk() -> f64 {
    0.03
}

fn default_half_sell_threshold() -> f64 {
    0.20
}

fn default_half_sell_risk_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

impl BacktestConfig {
    /// Create a config with default risk parameters, validating immediately.
    pub fn new(initial_cash: f64, max_positions: usize, slippage: f64) -> Result<Self, ConfigError> {
        let config = Self {
            initial_cash,
            max_positions,
            slippage,
            std_risk: default_std_risk(),
            init_risk: default_init_risk(),
            half_sell_threshold: default_half_sell_threshold(),
            half_sell_risk_multiplier: default_half_sell_risk_multiplier(),
            enable_whipsaw: true,
            enable_half_sell: true,
            enable_rebuying: false,
            candidate_order: CandidateOrder::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML document and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(ConfigError::NonPositiveCash(self.initial_cash));
        }
        if self.max_positions == 0 {
            return Err(ConfigError::ZeroMaxPositions);
        }
        if !(self.slippage > 0.0 && self.slippage <= 0.1) {
            return Err(ConfigError::SlippageOutOfRange(self.slippage));
        }
        for (name, value) in [
            ("std_risk", self.std_risk),
            ("init_risk", self.init_risk),
            ("half_sell_threshold", self.half_sell_threshold),
            ("half_sell_risk_multiplier", self.half_sell_risk_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveParam { name, value });
            }
        }
        Ok(())
    }
}

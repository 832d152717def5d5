//! Liquidation risk model
//!
//! Maps where a position is in the round, and how it is held, to a per-candle
//! probability of forced closure. Composition order:
//!
//! - grace period: no liquidations at all
//! - base risk ramping linearly up to a floor after the grace period
//! - time risk for holding past a duration threshold (power 1.8 ramp)
//! - size risk for oversized positions
//! - greed risk for sitting on large unrealized gains
//!
//! The sum is scaled by a random multiplier and capped.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a position is currently held, as seen by the risk model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exposure {
    /// Candles since entry
    pub hold_duration: usize,
    /// Fraction of balance committed to the position
    pub size_ratio: f64,
    /// Floating PnL relative to player balance (0.3 = +30%)
    pub pnl_percent: f64,
}

/// Anything that can price the chance of a forced liquidation
pub trait RiskModel: Send + Sync {
    /// Probability of liquidation at `candle_index`.
    ///
    /// `exposure` is `None` for an idle check (no open position).
    fn liquidation_probability<R: Rng + ?Sized>(
        &self,
        candle_index: usize,
        exposure: Option<&Exposure>,
        rng: &mut R,
    ) -> f64;

    /// Draw once against the liquidation probability
    fn check_liquidation<R: Rng + ?Sized>(
        &self,
        candle_index: usize,
        exposure: Option<&Exposure>,
        rng: &mut R,
    ) -> bool {
        let probability = self.liquidation_probability(candle_index, exposure, rng);
        rng.gen::<f64>() < probability
    }
}

/// Parameters for the liquidation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParams {
    /// Candles at round start with zero liquidation risk
    pub grace_period: usize,
    /// Candles over which base risk ramps from 0 to `base_risk`
    pub ramp_up: usize,
    /// Per-candle floor risk after the ramp
    pub base_risk: f64,

    /// Hold duration after which time risk applies
    pub time_threshold: usize,
    /// Divisor applied to the excess duration before the power ramp
    pub time_scale: f64,
    pub time_exponent: f64,
    pub time_weight: f64,
    pub time_cap: f64,

    /// Position size ratio after which size risk applies
    pub size_threshold: f64,
    pub size_weight: f64,
    pub size_cap: f64,

    /// Floating PnL% after which greed risk applies
    pub greed_threshold: f64,
    pub greed_weight: f64,
    pub greed_cap: f64,

    /// Random multiplier range applied after the grace period
    pub multiplier_min: f64,
    pub multiplier_max: f64,
    /// Absolute per-candle ceiling
    pub max_probability: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            grace_period: 150, // 10 seconds
            ramp_up: 75,       // 5 seconds
            base_risk: 0.0003,
            time_threshold: 60, // 4 seconds
            time_scale: 200.0,
            time_exponent: 1.8,
            time_weight: 0.006,
            time_cap: 0.004,
            size_threshold: 0.7,
            size_weight: 0.0005,
            size_cap: 0.0005,
            greed_threshold: 0.3,
            greed_weight: 0.001,
            greed_cap: 0.0008,
            multiplier_min: 0.7,
            multiplier_max: 1.5,
            max_probability: 0.01,
        }
    }
}

/// Time-ramped liquidation model
#[derive(Debug, Clone, Default)]
pub struct LiquidationModel {
    params: RiskParams,
}

impl LiquidationModel {
    pub fn new(params: RiskParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RiskParams {
        &self.params
    }

    /// Base risk at `candle_index`, ignoring any open position
    pub fn base_risk(&self, candle_index: usize) -> f64 {
        let p = &self.params;
        if candle_index < p.grace_period {
            return 0.0;
        }

        let since_grace = candle_index - p.grace_period;
        if since_grace < p.ramp_up {
            p.base_risk * since_grace as f64 / p.ramp_up as f64
        } else {
            p.base_risk
        }
    }

    pub fn time_risk(&self, hold_duration: usize) -> f64 {
        let p = &self.params;
        if hold_duration <= p.time_threshold {
            return 0.0;
        }
        let excess = (hold_duration - p.time_threshold) as f64 / p.time_scale;
        (excess.powf(p.time_exponent) * p.time_weight).min(p.time_cap)
    }

    pub fn size_risk(&self, size_ratio: f64) -> f64 {
        let p = &self.params;
        if size_ratio <= p.size_threshold {
            return 0.0;
        }
        ((size_ratio - p.size_threshold) * p.size_weight).min(p.size_cap)
    }

    pub fn greed_risk(&self, pnl_percent: f64) -> f64 {
        let p = &self.params;
        if pnl_percent <= p.greed_threshold {
            return 0.0;
        }
        ((pnl_percent - p.greed_threshold) * p.greed_weight).min(p.greed_cap)
    }

    /// Sum of all risk terms before the random multiplier and ceiling
    pub fn composed_risk(&self, candle_index: usize, exposure: Option<&Exposure>) -> f64 {
        if candle_index < self.params.grace_period {
            return 0.0;
        }

        let mut total = self.base_risk(candle_index);
        if let Some(exposure) = exposure {
            total += self.time_risk(exposure.hold_duration);
            total += self.size_risk(exposure.size_ratio);
            total += self.greed_risk(exposure.pnl_percent);
        }
        total
    }
}

impl RiskModel for LiquidationModel {
    fn liquidation_probability<R: Rng + ?Sized>(
        &self,
        candle_index: usize,
        exposure: Option<&Exposure>,
        rng: &mut R,
    ) -> f64 {
        let p = &self.params;
        if candle_index < p.grace_period {
            return 0.0;
        }

        let multiplier = p.multiplier_min + rng.gen::<f64>() * (p.multiplier_max - p.multiplier_min);
        (self.composed_risk(candle_index, exposure) * multiplier).clamp(0.0, p.max_probability)
    }
}

//! Configuration for simulation runs

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::market::CandleParams;
use crate::risk::RiskParams;
use crate::strategy::{Bounds, Strategy, StrategyParams};

/// How the house books revenue for a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseProfitPolicy {
    /// Only trading fees are house revenue; liquidations are a player-side loss
    FeesOnly,
    /// Liquidated position sizes are also booked as house revenue
    FeesAndLiquidations,
}

impl Default for HouseProfitPolicy {
    fn default() -> Self {
        Self::FeesOnly
    }
}

impl std::fmt::Display for HouseProfitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FeesOnly => write!(f, "fees_only"),
            Self::FeesAndLiquidations => write!(f, "fees_and_liquidations"),
        }
    }
}

impl std::str::FromStr for HouseProfitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fees_only" | "fees" => Ok(Self::FeesOnly),
            "fees_and_liquidations" | "all" => Ok(Self::FeesAndLiquidations),
            other => Err(format!("unknown house profit policy: {}", other)),
        }
    }
}

/// Rules of the game itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Candles per round
    pub round_duration: usize,
    /// Starting balance of every player
    pub initial_balance: f64,
    /// Fee charged on position size at a normal exit
    pub fee_rate: f64,
    /// Fraction of balance committed per trade
    pub position_size_ratio: f64,
    pub risk: RiskParams,
    pub candles: CandleParams,
    pub strategies: StrategyParams,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration: 470,    // 30 seconds at ~15.6 candles/sec
            initial_balance: 1000.0,
            fee_rate: 0.002,        // 0.2% of position size
            position_size_ratio: 0.2,
            risk: RiskParams::default(),
            candles: CandleParams::default(),
            strategies: StrategyParams::default(),
        }
    }
}

impl GameConfig {
    /// Fee for a position of `size`
    pub fn fee_for(&self, size: f64) -> f64 {
        size * self.fee_rate
    }

    /// Shortest round that leaves room for every strategy's entries
    pub fn min_round_duration(&self) -> usize {
        let s = &self.strategies;
        let tail = s
            .random_entry_margin
            .max(s.scalper_entry_margin)
            .max(s.buy_hold_entry_delay + 1);
        self.risk.grace_period + tail
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("initial_balance", self.initial_balance)?;
        in_range("fee_rate", self.fee_rate, 0.0, 1.0, "in [0, 1)", false)?;
        in_range("position_size_ratio", self.position_size_ratio, 0.0, 1.0, "in (0, 1]", true)?;

        let c = &self.candles;
        positive("candles.start_price_min", c.start_price_min)?;
        positive("candles.price_floor", c.price_floor)?;
        non_negative("candles.start_price_span", c.start_price_span)?;
        non_negative("candles.volatility_min", c.volatility_min)?;
        non_negative("candles.volatility_span", c.volatility_span)?;
        for wave in &c.waves {
            positive("candles.waves.period_min", wave.period_min)?;
        }

        let r = &self.risk;
        if r.ramp_up == 0 {
            return Err(ConfigError::OutOfRange {
                name: "risk.ramp_up",
                expected: "positive",
                value: 0.0,
            });
        }
        positive("risk.time_scale", r.time_scale)?;
        non_negative("risk.multiplier_min", r.multiplier_min)?;
        if r.multiplier_max < r.multiplier_min {
            return Err(ConfigError::OutOfRange {
                name: "risk.multiplier_max",
                expected: "at least risk.multiplier_min",
                value: r.multiplier_max,
            });
        }
        in_range("risk.max_probability", r.max_probability, 0.0, 1.0, "in [0, 1]", true)?;

        let s = &self.strategies;
        if !s.random_trade_weights.iter().any(|&w| w > 0) {
            return Err(ConfigError::NoTradeWeights);
        }
        ordered("strategies.random_hold", s.random_hold)?;
        ordered("strategies.scalper_trades", s.scalper_trades)?;
        ordered("strategies.scalper_hold", s.scalper_hold)?;
        ordered("strategies.dip_hold", s.dip_hold)?;
        in_range(
            "strategies.scalper_size_multiplier",
            s.scalper_size_multiplier,
            0.0,
            1.0,
            "in (0, 1]",
            true,
        )?;
        in_range("strategies.dip_drop_threshold", s.dip_drop_threshold, 0.0, 1.0, "in [0, 1)", false)?;

        let required = self.min_round_duration();
        if self.round_duration < required {
            return Err(ConfigError::RoundTooShort {
                duration: self.round_duration,
                required,
            });
        }

        Ok(())
    }
}

/// A full simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub rounds: usize,
    pub players_per_strategy: usize,
    /// Round r is seeded with `seed + r`
    pub seed: u64,
    pub strategies: Vec<Strategy>,
    pub house_policy: HouseProfitPolicy,
    pub game: GameConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rounds: 1000,
            players_per_strategy: 25,
            seed: 0,
            strategies: Strategy::ALL.to_vec(),
            house_policy: HouseProfitPolicy::FeesOnly,
            game: GameConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        if self.players_per_strategy == 0 {
            return Err(ConfigError::NoPlayers);
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::NoStrategies);
        }
        self.game.validate()
    }

    pub fn total_players(&self) -> usize {
        self.players_per_strategy * self.strategies.len()
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, expected: "positive", value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, expected: "non-negative", value })
    }
}

/// `value` in (lo, hi] when `upper_inclusive`, otherwise [lo, hi)
fn in_range(
    name: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
    expected: &'static str,
    upper_inclusive: bool,
) -> Result<(), ConfigError> {
    let ok = if upper_inclusive {
        value > lo && value <= hi
    } else {
        value >= lo && value < hi
    };
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, expected, value })
    }
}

fn ordered(name: &'static str, bounds: Bounds) -> Result<(), ConfigError> {
    if bounds.min <= bounds.max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { name, min: bounds.min, max: bounds.max })
    }
}

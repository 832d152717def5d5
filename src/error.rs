use thiserror::Error;

/// Rejected simulation configuration.
///
/// Returned by [`SimConfig::validate`](crate::config::SimConfig::validate)
/// before any round is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("round count must be positive")]
    NoRounds,
    #[error("players per strategy must be positive")]
    NoPlayers,
    #[error("at least one strategy must be enabled")]
    NoStrategies,
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f64,
    },
    #[error("round of {duration} candles is too short: need at least {required} for grace period and strategy margins")]
    RoundTooShort { duration: usize, required: usize },
    #[error("random trader trade-count weights need at least one positive weight")]
    NoTradeWeights,
    #[error("{name} range is inverted: {min} > {max}")]
    InvertedRange {
        name: &'static str,
        min: usize,
        max: usize,
    },
}

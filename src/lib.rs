// Library crate - crash game economics simulation

pub mod config;
pub mod error;
pub mod estimate;
pub mod market;
pub mod player;
pub mod report;
pub mod risk;
pub mod simulator;
pub mod strategy;

// Re-export commonly used types
pub use config::{GameConfig, HouseProfitPolicy, SimConfig};
pub use error::ConfigError;
pub use market::{Candle, PriceSource, WaveGenerator};
pub use player::{Player, RoundActivity, Trade};
pub use report::SimulationReport;
pub use risk::{Exposure, LiquidationModel, RiskModel};
pub use simulator::{RoundSummary, SimulationOutcome, Simulator};
pub use strategy::Strategy;

//! Round Simulator
//!
//! Runs the configured number of rounds over one player population. Each round
//! gets a fresh candle sequence seeded from `seed + round`; every active player
//! then plays that sequence. Players only read the shared candles and only
//! mutate themselves, so a round's players run in parallel with Rayon.
//!
//! Randomness is fully explicit: the candle generator draws from ChaCha8
//! stream 0 of the round seed and player `i` draws from stream `i + 1`, so
//! results do not depend on thread scheduling.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{HouseProfitPolicy, SimConfig};
use crate::error::ConfigError;
use crate::market::{PriceSource, WaveGenerator};
use crate::player::{Player, RoundActivity};
use crate::risk::{LiquidationModel, RiskModel};
use crate::strategy::RoundContext;

/// Aggregates for one simulated round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub index: usize,
    pub seed: u64,
    /// Players that still had a positive balance at round start
    pub active_players: usize,
    pub trades: usize,
    pub fees_collected: f64,
    pub liquidations: u32,
    pub liquidation_losses: f64,
    pub had_liquidation: bool,
    /// House revenue under the configured policy
    pub house_profit: f64,
    pub start_price: f64,
    pub end_price: f64,
    pub price_change: f64,
}

/// Everything a run produces: the final population and the round series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub players: Vec<Player>,
    pub rounds: Vec<RoundSummary>,
}

/// Drives full simulation runs
pub struct Simulator<P = WaveGenerator, M = LiquidationModel> {
    config: SimConfig,
    prices: P,
    risk: M,
}

impl Simulator {
    /// Simulator with the wave price generator and the standard liquidation model
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let prices = WaveGenerator::new(config.game.candles.clone());
        let risk = LiquidationModel::new(config.game.risk.clone());
        Self::with_components(config, prices, risk)
    }
}

impl<P: PriceSource, M: RiskModel> Simulator<P, M> {
    /// Simulator with a custom price source and risk model
    pub fn with_components(config: SimConfig, prices: P, risk: M) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, prices, risk })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Fresh population: `players_per_strategy` players for each enabled strategy
    pub fn build_population(&self) -> Vec<Player> {
        self.config
            .strategies
            .iter()
            .flat_map(|&strategy| std::iter::repeat(strategy).take(self.config.players_per_strategy))
            .enumerate()
            .map(|(id, strategy)| Player::new(id, strategy, self.config.game.initial_balance))
            .collect()
    }

    pub fn run(&self) -> SimulationOutcome {
        let mut players = self.build_population();

        info!(
            "Running simulation: {} rounds, {} players, seed {}",
            self.config.rounds,
            players.len(),
            self.config.seed
        );

        let rounds = (0..self.config.rounds)
            .map(|index| {
                if index % 100 == 0 {
                    debug!("Round {}/{}", index, self.config.rounds);
                }
                self.play_round(index, &mut players)
            })
            .collect::<Vec<_>>();

        let liquidations: u64 = rounds.iter().map(|r| r.liquidations as u64).sum();
        let fees: f64 = rounds.iter().map(|r| r.fees_collected).sum();
        info!(
            "Simulation complete: {:.2} fees collected, {} liquidations",
            fees, liquidations
        );

        SimulationOutcome { players, rounds }
    }

    /// Play round `index` for every active player in `players`
    pub fn play_round(&self, index: usize, players: &mut [Player]) -> RoundSummary {
        let seed = self.config.seed.wrapping_add(index as u64);
        let game = &self.config.game;
        let candles = self.prices.generate(seed, game.round_duration);
        let ctx = RoundContext::new(&candles, game, &self.risk);

        let activities: Vec<RoundActivity> = players
            .par_iter_mut()
            .filter(|player| player.is_active())
            .map(|player| {
                let mut rng = player_rng(seed, player.id);
                let strategy = player.strategy;
                strategy.execute(player, &ctx, &mut rng)
            })
            .collect();

        let fees_collected: f64 = activities.iter().map(RoundActivity::fees).sum();
        let liquidations: u32 = activities.iter().map(|a| a.liquidations).sum();
        let liquidation_losses: f64 = activities.iter().map(|a| a.liquidation_losses).sum();

        let house_profit = match self.config.house_policy {
            HouseProfitPolicy::FeesOnly => fees_collected,
            HouseProfitPolicy::FeesAndLiquidations => fees_collected + liquidation_losses,
        };

        let start_price = candles.first().map(|c| c.close).unwrap_or(0.0);
        let end_price = candles.last().map(|c| c.close).unwrap_or(0.0);
        let price_change = if start_price > 0.0 {
            (end_price - start_price) / start_price
        } else {
            0.0
        };

        let summary = RoundSummary {
            index,
            seed,
            active_players: activities.len(),
            trades: activities.iter().map(|a| a.trades.len()).sum(),
            fees_collected,
            liquidations,
            liquidation_losses,
            had_liquidation: liquidations > 0,
            house_profit,
            start_price,
            end_price,
            price_change,
        };

        debug!(
            round = index,
            fees = summary.fees_collected,
            liquidations = summary.liquidations,
            "round complete"
        );

        summary
    }
}

/// Independent, reproducible stream for one player in one round
pub fn player_rng(round_seed: u64, player_id: usize) -> ChaCha8Rng {
    stream_rng(round_seed, player_id as u64 + 1)
}

pub fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

//! Quick Monte Carlo estimators
//!
//! Coarse alternatives to the full candle-by-candle simulation:
//! - `quick_estimate`: sampled trade counts and hold times per strategy
//!   profile, liquidation checked every few candles, fixed stake per trade
//! - `rug_estimate`: an idle player facing only base liquidation risk, with
//!   assumed round returns for rugged and clean rounds
//!
//! Both book liquidated stakes as house revenue.

use anyhow::{ensure, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GameConfig;
use crate::report::ratio;
use crate::risk::{Exposure, LiquidationModel, RiskModel};
use crate::simulator::stream_rng;
use crate::strategy::Strategy;

/// Average behaviour of one strategy in the quick estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickProfile {
    pub strategy: Strategy,
    pub trades_per_round: f64,
    pub avg_hold: f64,
    /// Scales the per-candle liquidation probability
    pub liquidation_modifier: f64,
}

impl QuickProfile {
    pub fn defaults() -> Vec<QuickProfile> {
        vec![
            QuickProfile { strategy: Strategy::RandomTrader, trades_per_round: 2.0, avg_hold: 50.0, liquidation_modifier: 1.0 },
            QuickProfile { strategy: Strategy::BuyAndHold, trades_per_round: 1.0, avg_hold: 300.0, liquidation_modifier: 2.0 },
            QuickProfile { strategy: Strategy::Scalper, trades_per_round: 8.0, avg_hold: 15.0, liquidation_modifier: 0.3 },
            QuickProfile { strategy: Strategy::DipBuyer, trades_per_round: 1.0, avg_hold: 80.0, liquidation_modifier: 1.2 },
        ]
    }
}

/// Quick estimator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickParams {
    pub rounds: usize,
    pub players_per_strategy: usize,
    pub seed: u64,
    /// Liquidation is checked every N held candles
    pub check_interval: usize,
    /// Entries stop this many candles before round end
    pub entry_margin: usize,
    pub min_hold: usize,
    /// Hold-time standard deviation as a fraction of the mean
    pub hold_std_ratio: f64,
    pub trades_std: f64,
    pub win_probability: f64,
    /// Assumed player result per position when projecting balances
    pub avg_trade_result: f64,
    /// Assumed player loss per liquidation when projecting balances
    pub avg_liquidation_loss: f64,
}

impl Default for QuickParams {
    fn default() -> Self {
        Self {
            rounds: 1000,
            players_per_strategy: 50,
            seed: 0,
            check_interval: 10,
            entry_margin: 70,
            min_hold: 5,
            hold_std_ratio: 0.3,
            trades_std: 1.0,
            win_probability: 0.48, // slightly negative expected value
            avg_trade_result: -2.0,
            avg_liquidation_loss: 200.0,
        }
    }
}

/// Quick estimator outcome for one strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickResults {
    pub positions: u64,
    pub liquidations: u64,
    pub winning_trades: u64,
    pub total_fees: f64,
    pub liquidation_losses: f64,
}

impl QuickResults {
    fn merge(mut self, other: &QuickResults) -> Self {
        self.positions += other.positions;
        self.liquidations += other.liquidations;
        self.winning_trades += other.winning_trades;
        self.total_fees += other.total_fees;
        self.liquidation_losses += other.liquidation_losses;
        self
    }

    pub fn liquidation_rate_pct(&self) -> f64 {
        ratio(self.liquidations as f64, self.positions as f64) * 100.0
    }

    pub fn win_rate_pct(&self) -> f64 {
        ratio(self.winning_trades as f64, self.positions as f64) * 100.0
    }

    pub fn house_profit(&self) -> f64 {
        self.total_fees + self.liquidation_losses
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickStrategyReport {
    pub profile: QuickProfile,
    pub results: QuickResults,
    pub liquidation_rate_pct: f64,
    pub win_rate_pct: f64,
    pub house_profit: f64,
    /// Capital put at stake across all positions
    pub staked_capital: f64,
    /// House profit relative to staked capital, in percent
    pub house_edge_pct: f64,
    pub starting_balance: f64,
    /// Projected from the assumed per-position and per-liquidation results
    pub player_net_loss: f64,
    pub roi_pct: f64,
}

/// House profitability tier by player loss over starting capital
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profitability {
    Highly,
    Profitable,
    Marginal,
    Unprofitable,
}

impl Profitability {
    pub fn from_house_edge(edge_pct: f64) -> Self {
        if edge_pct > 1.5 {
            Self::Highly
        } else if edge_pct > 0.5 {
            Self::Profitable
        } else if edge_pct > 0.0 {
            Self::Marginal
        } else {
            Self::Unprofitable
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Highly => "HIGHLY PROFITABLE - house edge above 1.5%",
            Self::Profitable => "PROFITABLE - house edge above 0.5%",
            Self::Marginal => "MARGINALLY PROFITABLE - low house edge",
            Self::Unprofitable => "NOT PROFITABLE - negative house edge",
        }
    }
}

/// Player loss over starting capital across all strategies, in percent
pub fn quick_house_edge(reports: &[QuickStrategyReport]) -> f64 {
    let loss: f64 = reports.iter().map(|r| r.player_net_loss).sum();
    let start: f64 = reports.iter().map(|r| r.starting_balance).sum();
    ratio(loss, start) * 100.0
}

/// Run the quick estimator for every profile
pub fn quick_estimate(
    game: &GameConfig,
    params: &QuickParams,
    profiles: &[QuickProfile],
) -> Result<Vec<QuickStrategyReport>> {
    ensure!(params.rounds > 0, "quick estimate needs at least one round");
    ensure!(params.players_per_strategy > 0, "quick estimate needs at least one player");
    ensure!(params.check_interval > 0, "check interval must be positive");
    game.validate()?;

    let risk = LiquidationModel::new(game.risk.clone());
    let stake = game.initial_balance * game.position_size_ratio;

    let mut reports = Vec::with_capacity(profiles.len());
    for (i, profile) in profiles.iter().enumerate() {
        let results = simulate_profile(game, params, profile, i as u64, &risk)?;
        let staked_capital = results.positions as f64 * stake;
        let starting_balance = params.players_per_strategy as f64 * game.initial_balance;
        let player_net_loss = -(results.positions as f64 * params.avg_trade_result)
            + results.liquidations as f64 * params.avg_liquidation_loss;
        debug!(
            strategy = %profile.strategy,
            positions = results.positions,
            liquidations = results.liquidations,
            "quick profile complete"
        );

        reports.push(QuickStrategyReport {
            profile: profile.clone(),
            liquidation_rate_pct: results.liquidation_rate_pct(),
            win_rate_pct: results.win_rate_pct(),
            house_profit: results.house_profit(),
            staked_capital,
            house_edge_pct: ratio(results.house_profit(), staked_capital) * 100.0,
            starting_balance,
            player_net_loss,
            roi_pct: ratio(-player_net_loss, starting_balance) * 100.0,
            results,
        });
    }

    Ok(reports)
}

fn simulate_profile(
    game: &GameConfig,
    params: &QuickParams,
    profile: &QuickProfile,
    profile_index: u64,
    risk: &LiquidationModel,
) -> Result<QuickResults> {
    let trade_dist = Normal::new(profile.trades_per_round, params.trades_std)?;
    let hold_dist = Normal::new(profile.avg_hold, profile.avg_hold * params.hold_std_ratio)?;

    let grace = game.risk.grace_period;
    let last_entry = game.round_duration.saturating_sub(params.entry_margin).max(grace);
    let stake = game.initial_balance * game.position_size_ratio;
    let fee = game.fee_for(stake);
    let players = params.players_per_strategy as u64;

    let per_round: Vec<QuickResults> = (0..params.rounds)
        .into_par_iter()
        .map(|round| {
            let mut tally = QuickResults::default();
            let round_seed = params.seed.wrapping_add(round as u64);

            for player in 0..players {
                let mut rng = stream_rng(round_seed, profile_index * players + player + 1);
                let trades = (trade_dist.sample(&mut rng) as i64).max(1);

                for _ in 0..trades {
                    let entry = rng.gen_range(grace..=last_entry);
                    let hold = (hold_dist.sample(&mut rng) as i64).max(params.min_hold as i64) as usize;

                    tally.positions += 1;
                    if quick_liquidated(game, params, profile, risk, entry, hold, &mut rng) {
                        tally.liquidations += 1;
                        tally.liquidation_losses += stake;
                        continue;
                    }

                    tally.total_fees += fee;
                    if rng.gen::<f64>() < params.win_probability {
                        tally.winning_trades += 1;
                    }
                }
            }
            tally
        })
        .collect();

    Ok(per_round.iter().fold(QuickResults::default(), QuickResults::merge))
}

/// Sampled liquidation check over a hold, time risk only
fn quick_liquidated<R: Rng + ?Sized>(
    game: &GameConfig,
    params: &QuickParams,
    profile: &QuickProfile,
    risk: &LiquidationModel,
    entry: usize,
    hold: usize,
    rng: &mut R,
) -> bool {
    for offset in (0..hold).step_by(params.check_interval) {
        let candle = entry + offset;
        if candle >= game.round_duration {
            break;
        }

        let exposure = Exposure {
            hold_duration: offset,
            size_ratio: game.position_size_ratio,
            pnl_percent: 0.0,
        };
        let probability = risk.liquidation_probability(candle, Some(&exposure), rng)
            * profile.liquidation_modifier;
        if rng.gen::<f64>() < probability {
            return true;
        }
    }
    false
}

/// Idle rug estimator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RugParams {
    pub simulations: usize,
    pub seed: u64,
    pub candles_per_round: usize,
    pub base_rug_chance: f64,
    pub multiplier_min: f64,
    pub multiplier_max: f64,
    pub max_probability: f64,
    /// Chance the player is holding when a rug hits
    pub hold_probability: f64,
    /// Fractional loss when rugged while holding
    pub loss_when_rugged: f64,
    /// Fractional profit in a round without a rug
    pub profit_without_rug: f64,
}

impl Default for RugParams {
    fn default() -> Self {
        Self {
            simulations: 10_000,
            seed: 0,
            candles_per_round: 470,
            base_rug_chance: 0.0001,
            multiplier_min: 0.5,
            multiplier_max: 2.0,
            max_probability: 0.01,
            hold_probability: 0.5,
            loss_when_rugged: 0.75,
            profit_without_rug: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RugReport {
    pub simulations: usize,
    /// Rounds in which a rug happened at all
    pub rugged_rounds: usize,
    /// Rugged rounds where the player was holding
    pub losing_rounds: usize,
    pub rug_frequency: f64,
    pub mean_return: f64,
    pub house_edge: f64,
    pub rtp: f64,
    pub variance: f64,
    pub avg_profit_non_rug: f64,
    pub avg_loss_rug: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RugRound {
    Clean,
    RuggedFlat,
    RuggedHolding,
}

pub fn rug_estimate(params: &RugParams) -> Result<RugReport> {
    ensure!(params.simulations > 0, "rug estimate needs at least one simulation");
    ensure!(
        params.multiplier_min <= params.multiplier_max,
        "multiplier range is inverted: {} > {}",
        params.multiplier_min,
        params.multiplier_max
    );

    let multiplier = Uniform::new_inclusive(params.multiplier_min, params.multiplier_max);

    let outcomes: Vec<RugRound> = (0..params.simulations)
        .into_par_iter()
        .map(|i| {
            let mut rng = stream_rng(params.seed, i as u64);
            for _ in 0..params.candles_per_round {
                let p = (params.base_rug_chance * multiplier.sample(&mut rng)).min(params.max_probability);
                if rng.gen::<f64>() < p {
                    return if rng.gen::<f64>() < params.hold_probability {
                        RugRound::RuggedHolding
                    } else {
                        RugRound::RuggedFlat
                    };
                }
            }
            RugRound::Clean
        })
        .collect();

    let returns: Vec<f64> = outcomes
        .iter()
        .map(|outcome| match outcome {
            RugRound::Clean => params.profit_without_rug,
            RugRound::RuggedFlat => 0.0,
            RugRound::RuggedHolding => -params.loss_when_rugged,
        })
        .collect();

    let n = returns.len() as f64;
    let clean = outcomes.iter().filter(|o| **o == RugRound::Clean).count();
    let losing = outcomes.iter().filter(|o| **o == RugRound::RuggedHolding).count();
    let rugged = outcomes.len() - clean;

    let mean_return = returns.iter().sum::<f64>() / n;
    let variance = if returns.len() < 2 {
        0.0
    } else {
        returns.iter().map(|r| (r - mean_return).powi(2)).sum::<f64>() / (n - 1.0)
    };

    Ok(RugReport {
        simulations: params.simulations,
        rugged_rounds: rugged,
        losing_rounds: losing,
        rug_frequency: rugged as f64 / n,
        mean_return,
        house_edge: -mean_return,
        rtp: 1.0 + mean_return,
        variance,
        avg_profit_non_rug: ratio(clean as f64 * params.profit_without_rug, clean as f64),
        avg_loss_rug: ratio(losing as f64 * params.loss_when_rugged, losing as f64),
    })
}

/// Print quick estimator results
pub fn print_quick_results(reports: &[QuickStrategyReport], params: &QuickParams) {
    println!("\n{}", "=".repeat(70));
    println!("QUICK ESTIMATE");
    println!("Rounds: {}, Players per strategy: {}", params.rounds, params.players_per_strategy);
    println!("{}", "=".repeat(70));

    println!("\n  {:15} {:>10} {:>10} {:>10} {:>10} {:>14} {:>10}",
        "Strategy", "Positions", "ROI", "Liq Rate", "Win Rate", "House $", "Edge");
    println!("  {}", "-".repeat(84));

    for r in reports {
        println!(
            "  {:15} {:>10} {:>+9.1}% {:>9.1}% {:>9.1}% {:>14.0} {:>9.2}%",
            r.profile.strategy.name(),
            r.results.positions,
            r.roi_pct,
            r.liquidation_rate_pct,
            r.win_rate_pct,
            r.house_profit,
            r.house_edge_pct
        );
    }

    let total_profit: f64 = reports.iter().map(|r| r.house_profit).sum();
    let total_staked: f64 = reports.iter().map(|r| r.staked_capital).sum();
    println!("\n  Total house profit: ${:.0}", total_profit);
    println!("  House edge on staked capital: {:.2}%", ratio(total_profit, total_staked) * 100.0);

    let edge = quick_house_edge(reports);
    let player_loss: f64 = reports.iter().map(|r| r.player_net_loss).sum();
    println!("  Projected player losses: ${:.0}", player_loss);
    println!("  House edge on starting capital: {:.2}%", edge);
    println!("  {}", Profitability::from_house_edge(edge).describe());
}

/// Print rug estimator results
pub fn print_rug_report(report: &RugReport) {
    println!("\n{}", "=".repeat(60));
    println!("IDLE RUG ESTIMATE ({} rounds)", report.simulations);
    println!("{}", "=".repeat(60));
    println!("  Rug frequency:        {:.4}", report.rug_frequency);
    println!("  Rugged while holding: {}", report.losing_rounds);
    println!("  Mean return:          {:+.4}", report.mean_return);
    println!("  House edge:           {:+.4}", report.house_edge);
    println!("  RTP:                  {:.4}", report.rtp);
    println!("  Variance:             {:.4}", report.variance);
    println!("  Avg profit (no rug):  {:.4}", report.avg_profit_non_rug);
    println!("  Avg loss (rug):       {:.4}", report.avg_loss_rug);
}

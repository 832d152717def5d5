//! Results aggregation
//!
//! Reduces the final player population and the per-round series into a
//! [`SimulationReport`]. Nothing here is random; every ratio with a zero
//! denominator reports 0.

use std::io::Write;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{HouseProfitPolicy, SimConfig};
use crate::player::Player;
use crate::simulator::{RoundSummary, SimulationOutcome};
use crate::strategy::Strategy;

/// Per-strategy outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub strategy: Strategy,
    pub players: usize,
    /// Players that ended at or below zero balance
    pub eliminated: usize,
    pub avg_balance: f64,
    pub median_balance: f64,
    pub min_balance: f64,
    pub max_balance: f64,
    /// Average balance relative to the initial balance, in percent
    pub roi_pct: f64,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub win_rate_pct: f64,
    pub positions_opened: u32,
    pub liquidations: u32,
    /// Liquidations per position opened, in percent
    pub liquidation_rate_pct: f64,
    /// Liquidations per player, in percent
    pub liquidations_per_player_pct: f64,
    pub total_fees_paid: f64,
    pub liquidation_losses: f64,
}

/// House-wide outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseStats {
    pub policy: HouseProfitPolicy,
    pub rounds: usize,
    pub total_house_profit: f64,
    pub avg_profit_per_round: f64,
    pub total_fees: f64,
    pub total_liquidation_events: u64,
    pub rounds_with_liquidation: usize,
    pub total_liquidation_losses: f64,
    pub starting_balance: f64,
    pub ending_balance: f64,
    pub player_net_loss: f64,
    /// Player net loss relative to starting capital, in percent
    pub house_edge_pct: f64,
    /// Ending player capital relative to starting capital, in percent
    pub return_to_player_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub players_per_strategy: usize,
    pub strategies: Vec<StrategyStats>,
    pub house: HouseStats,
}

impl SimulationReport {
    pub fn from_outcome(outcome: &SimulationOutcome, config: &SimConfig) -> Self {
        let strategies = config
            .strategies
            .iter()
            .map(|&strategy| {
                let group: Vec<&Player> = outcome
                    .players
                    .iter()
                    .filter(|p| p.strategy == strategy)
                    .collect();
                strategy_stats(strategy, &group, config.game.initial_balance)
            })
            .collect();

        Self {
            seed: config.seed,
            players_per_strategy: config.players_per_strategy,
            strategies,
            house: house_stats(&outcome.players, &outcome.rounds, config.house_policy),
        }
    }

    pub fn strategy(&self, strategy: Strategy) -> Option<&StrategyStats> {
        self.strategies.iter().find(|s| s.strategy == strategy)
    }
}

fn strategy_stats(strategy: Strategy, players: &[&Player], initial_balance: f64) -> StrategyStats {
    let balances = sorted(players.iter().map(|p| p.balance));

    let total_trades: u32 = players.iter().map(|p| p.total_trades).sum();
    let winning_trades: u32 = players.iter().map(|p| p.winning_trades).sum();
    let positions_opened: u32 = players.iter().map(|p| p.positions_opened).sum();
    let liquidations: u32 = players.iter().map(|p| p.liquidations).sum();

    let avg_balance = mean(&balances);

    StrategyStats {
        strategy,
        players: players.len(),
        eliminated: players.iter().filter(|p| !p.is_active()).count(),
        avg_balance,
        median_balance: median(&balances),
        min_balance: balances.first().copied().unwrap_or(0.0),
        max_balance: balances.last().copied().unwrap_or(0.0),
        roi_pct: ratio(avg_balance - initial_balance, initial_balance) * 100.0,
        total_trades,
        winning_trades,
        win_rate_pct: ratio(winning_trades as f64, total_trades as f64) * 100.0,
        positions_opened,
        liquidations,
        liquidation_rate_pct: ratio(liquidations as f64, positions_opened as f64) * 100.0,
        liquidations_per_player_pct: ratio(liquidations as f64, players.len() as f64) * 100.0,
        total_fees_paid: players.iter().map(|p| p.total_fees_paid).sum(),
        liquidation_losses: players.iter().map(|p| p.liquidation_losses).sum(),
    }
}

fn house_stats(players: &[Player], rounds: &[RoundSummary], policy: HouseProfitPolicy) -> HouseStats {
    let total_house_profit: f64 = rounds.iter().map(|r| r.house_profit).sum();
    let starting_balance: f64 = players.iter().map(|p| p.initial_balance).sum();
    let ending_balance: f64 = players.iter().map(|p| p.balance).sum();
    let player_net_loss = starting_balance - ending_balance;

    HouseStats {
        policy,
        rounds: rounds.len(),
        total_house_profit,
        avg_profit_per_round: ratio(total_house_profit, rounds.len() as f64),
        total_fees: rounds.iter().map(|r| r.fees_collected).sum(),
        total_liquidation_events: rounds.iter().map(|r| r.liquidations as u64).sum(),
        rounds_with_liquidation: rounds.iter().filter(|r| r.had_liquidation).count(),
        total_liquidation_losses: rounds.iter().map(|r| r.liquidation_losses).sum(),
        starting_balance,
        ending_balance,
        player_net_loss,
        house_edge_pct: ratio(player_net_loss, starting_balance) * 100.0,
        return_to_player_pct: ratio(ending_balance, starting_balance) * 100.0,
    }
}

/// `num / den`, or 0 when the denominator is 0
pub fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return 0.0;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Median of an already sorted slice
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn sorted(vals: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = vals.collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    v
}

/// Write the round series as CSV
pub fn write_rounds_csv<W: Write>(rounds: &[RoundSummary], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for round in rounds {
        wtr.serialize(round)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Print the report as console text
pub fn print_report(report: &SimulationReport) {
    let house = &report.house;

    println!("\n{}", "=".repeat(80));
    println!("TRADING GAME SIMULATION RESULTS");
    println!("{}", "=".repeat(80));

    println!("\nHOUSE PERFORMANCE ({}):", house.policy);
    println!("  Total rounds:             {}", house.rounds);
    println!("  Total house profit:       ${:.2}", house.total_house_profit);
    println!("  Average profit per round: ${:.2}", house.avg_profit_per_round);
    println!("  Total fees collected:     ${:.2}", house.total_fees);
    println!("  Total liquidation events: {}", house.total_liquidation_events);
    println!("  Rounds with liquidations: {}", house.rounds_with_liquidation);
    println!("  Liquidated capital:       ${:.2}", house.total_liquidation_losses);

    println!("\nPLAYER PERFORMANCE BY STRATEGY:");
    for stats in &report.strategies {
        println!("\n{}:", stats.strategy.name().to_uppercase());
        println!("  Average balance:  ${:.2}", stats.avg_balance);
        println!("  Median balance:   ${:.2}", stats.median_balance);
        println!("  Balance range:    ${:.2} - ${:.2}", stats.min_balance, stats.max_balance);
        println!("  Average ROI:      {:+.1}%", stats.roi_pct);
        println!("  Total trades:     {}", stats.total_trades);
        println!("  Win rate:         {:.1}%", stats.win_rate_pct);
        println!("  Liquidation rate: {:.1}% ({} of {} positions)",
            stats.liquidation_rate_pct, stats.liquidations, stats.positions_opened);
        println!("  Liquidations per player: {:.1}%", stats.liquidations_per_player_pct);
        println!("  Eliminated:       {} of {}", stats.eliminated, stats.players);
        println!("  Total fees paid:  ${:.2}", stats.total_fees_paid);
    }

    println!("\nOVERALL STATISTICS:");
    println!("  Total player starting balance: ${:.2}", house.starting_balance);
    println!("  Total player ending balance:   ${:.2}", house.ending_balance);
    println!("  Player net loss:               ${:.2}", house.player_net_loss);
    println!("  House edge:                    {:.2}%", house.house_edge_pct);
    println!("  Return to player:              {:.2}%", house.return_to_player_pct);
}

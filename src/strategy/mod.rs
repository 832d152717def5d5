//! Strategy Engine - how simulated players trade a round
//!
//! Four behaviours share one position lifecycle:
//! - Random trader: a handful of random entries and holds
//! - Buy and hold: one entry right after the grace period, held to the end
//! - Scalper: many short trades at reduced size
//! - Dip buyer: waits for a drawdown from a recent high, then holds for a bounce
//!
//! Every held candle is checked against the risk model. A liquidation forfeits
//! the whole position and produces no [`Trade`]; a normal exit settles gross
//! P&L minus the trading fee.

pub mod buy_and_hold;
pub mod dip_buyer;
pub mod random_trader;
pub mod scalper;

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::market::Candle;
use crate::player::{Player, RoundActivity, Trade};
use crate::risk::{Exposure, RiskModel};

/// Trading behaviour of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    RandomTrader,
    BuyAndHold,
    Scalper,
    DipBuyer,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::RandomTrader,
        Strategy::BuyAndHold,
        Strategy::Scalper,
        Strategy::DipBuyer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RandomTrader => "random_trader",
            Self::BuyAndHold => "buy_and_hold",
            Self::Scalper => "scalper",
            Self::DipBuyer => "dip_buyer",
        }
    }

    /// Play one round for `player`, mutating its balance and counters
    pub fn execute<M, R>(&self, player: &mut Player, ctx: &RoundContext<'_, M>, rng: &mut R) -> RoundActivity
    where
        M: RiskModel,
        R: Rng + ?Sized,
    {
        if !player.is_active() || ctx.candles.is_empty() {
            return RoundActivity::default();
        }

        match self {
            Self::RandomTrader => random_trader::execute(player, ctx, rng),
            Self::BuyAndHold => buy_and_hold::execute(player, ctx, rng),
            Self::Scalper => scalper::execute(player, ctx, rng),
            Self::DipBuyer => dip_buyer::execute(player, ctx, rng),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "random_trader" | "random" => Ok(Self::RandomTrader),
            "buy_and_hold" | "hodl" | "buy_hold" => Ok(Self::BuyAndHold),
            "scalper" => Ok(Self::Scalper),
            "dip_buyer" => Ok(Self::DipBuyer),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// Inclusive integer range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

impl Bounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min..=self.max)
    }
}

/// Per-strategy behaviour constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Relative weight of making 0, 1, 2, ... trades in a round
    pub random_trade_weights: Vec<u32>,
    /// Random entries stop this many candles before round end
    pub random_entry_margin: usize,
    pub random_hold: Bounds,

    /// Buy and hold enters this many candles after the grace period
    pub buy_hold_entry_delay: usize,

    pub scalper_trades: Bounds,
    pub scalper_entry_margin: usize,
    pub scalper_hold: Bounds,
    /// Fraction of the standard position size ratio used by the scalper
    pub scalper_size_multiplier: f64,

    /// Candles scanned for the recent high
    pub dip_lookback: usize,
    /// Drop from the recent high that counts as a dip (0.05 = 5%)
    pub dip_drop_threshold: f64,
    /// Dips are not taken within this many candles of round end
    pub dip_exit_margin: usize,
    pub dip_hold: Bounds,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            random_trade_weights: vec![10, 30, 25, 20, 10, 5],
            random_entry_margin: 50,
            random_hold: Bounds::new(10, 100),
            buy_hold_entry_delay: 10,
            scalper_trades: Bounds::new(5, 15),
            scalper_entry_margin: 20,
            scalper_hold: Bounds::new(5, 30),
            scalper_size_multiplier: 0.5,
            dip_lookback: 20,
            dip_drop_threshold: 0.05,
            dip_exit_margin: 30,
            dip_hold: Bounds::new(30, 80),
        }
    }
}

/// Shared, read-only view of the round every strategy plays against
pub struct RoundContext<'a, M> {
    pub candles: &'a [Candle],
    pub game: &'a GameConfig,
    pub risk: &'a M,
}

impl<'a, M: RiskModel> RoundContext<'a, M> {
    pub fn new(candles: &'a [Candle], game: &'a GameConfig, risk: &'a M) -> Self {
        Self { candles, game, risk }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.game.strategies
    }

    pub fn grace_period(&self) -> usize {
        self.game.risk.grace_period
    }

    pub fn last_index(&self) -> usize {
        self.candles.len().saturating_sub(1)
    }

    /// Entries from the end of the grace period up to `margin` candles before round end
    pub(crate) fn entry_window(&self, margin: usize) -> Option<RangeInclusive<usize>> {
        let start = self.grace_period();
        let end = self.candles.len().checked_sub(margin)?.min(self.last_index());
        (start <= end).then_some(start..=end)
    }

    /// Exit after `hold` candles, clamped to the last candle
    pub(crate) fn exit_after(&self, entry: usize, hold: usize) -> usize {
        (entry + hold).min(self.last_index())
    }
}

/// Open a position at `entry`, hold it through `exit`, and settle it.
///
/// Returns `true` when the position was liquidated. A completed trade is
/// pushed onto `activity.trades`.
pub(crate) fn hold_position<M, R>(
    player: &mut Player,
    ctx: &RoundContext<'_, M>,
    entry: usize,
    exit: usize,
    size_ratio: f64,
    activity: &mut RoundActivity,
    rng: &mut R,
) -> bool
where
    M: RiskModel,
    R: Rng + ?Sized,
{
    let entry_price = ctx.candles[entry].close;
    let size = player.balance * size_ratio;
    let units = size / entry_price;

    player.positions_opened += 1;
    activity.positions_opened += 1;

    for (offset, candle) in ctx.candles[entry..=exit].iter().enumerate() {
        let floating = (candle.close - entry_price) * units;
        let exposure = Exposure {
            hold_duration: offset,
            size_ratio,
            pnl_percent: floating / player.balance,
        };

        if ctx.risk.check_liquidation(entry + offset, Some(&exposure), rng) {
            player.liquidate(size);
            activity.liquidations += 1;
            activity.liquidation_losses += size;
            return true;
        }
    }

    let exit_price = ctx.candles[exit].close;
    let gross_pnl = (exit_price - entry_price) * units;
    let fee = size * ctx.game.fee_rate;
    let trade = Trade {
        entry_candle: entry,
        exit_candle: exit,
        entry_price,
        exit_price,
        size,
        gross_pnl,
        fee,
        net_pnl: gross_pnl - fee,
    };

    player.settle(&trade);
    activity.trades.push(trade);
    false
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>(), Ok(strategy));
        }
        assert_eq!("hodl".parse::<Strategy>(), Ok(Strategy::BuyAndHold));
        assert_eq!("dip-buyer".parse::<Strategy>(), Ok(Strategy::DipBuyer));
        assert!("martingale".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_normal_exit_accounting() {
        let game = GameConfig::default();
        let candles = linear_candles(470, 10.0, 0.01);
        let ctx = RoundContext::new(&candles, &game, &NoRisk);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut player = Player::new(0, Strategy::RandomTrader, 1000.0);
        let mut activity = RoundActivity::default();

        let liquidated = hold_position(&mut player, &ctx, 200, 250, 0.2, &mut activity, &mut rng);
        assert!(!liquidated);
        let trade = &activity.trades[0];

        assert_eq!(trade.size, 200.0);
        assert_eq!(trade.fee, trade.size * game.fee_rate);
        assert_eq!(trade.net_pnl, trade.gross_pnl - trade.fee);
        assert_eq!(trade.entry_price, candles[200].close);
        assert_eq!(trade.exit_price, candles[250].close);
        assert!(trade.gross_pnl > 0.0);
        assert_eq!(player.balance, 1000.0 + trade.net_pnl);
        assert_eq!(player.total_trades, 1);
        assert_eq!(player.winning_trades, 1);
        assert_eq!(activity.trades.len(), 1);
        assert_eq!(activity.positions_opened, 1);
    }

    #[test]
    fn test_liquidation_forfeits_size_only() {
        let game = GameConfig::default();
        let candles = linear_candles(470, 10.0, 0.01);
        let risk = CertainRisk { grace_period: 150 };
        let ctx = RoundContext::new(&candles, &game, &risk);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut player = Player::new(0, Strategy::RandomTrader, 1000.0);
        let mut activity = RoundActivity::default();

        let liquidated = hold_position(&mut player, &ctx, 200, 250, 0.2, &mut activity, &mut rng);

        assert!(liquidated);
        assert_eq!(player.balance, 800.0);
        assert_eq!(player.liquidations, 1);
        assert_eq!(player.total_trades, 0);
        assert_eq!(player.total_fees_paid, 0.0);
        assert!(activity.trades.is_empty());
        assert_eq!(activity.liquidation_losses, 200.0);
    }

    #[test]
    fn test_inactive_player_skips_round() {
        let game = GameConfig::default();
        let candles = linear_candles(470, 10.0, 0.01);
        let ctx = RoundContext::new(&candles, &game, &NoRisk);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut player = Player::new(0, Strategy::Scalper, 1000.0);
        player.balance = 0.0;

        for strategy in Strategy::ALL {
            let activity = strategy.execute(&mut player, &ctx, &mut rng);
            assert_eq!(activity, RoundActivity::default());
        }
    }

    #[test]
    fn test_entry_window() {
        let game = GameConfig::default();
        let candles = linear_candles(470, 10.0, 0.01);
        let ctx = RoundContext::new(&candles, &game, &NoRisk);

        assert_eq!(ctx.entry_window(50), Some(150..=420));
        assert_eq!(ctx.exit_after(440, 100), 469);

        let short = linear_candles(160, 10.0, 0.01);
        let ctx = RoundContext::new(&short, &game, &NoRisk);
        assert_eq!(ctx.entry_window(50), None);
    }
}

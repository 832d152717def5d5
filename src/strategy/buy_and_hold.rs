//! Buy and hold: enter right after the grace period, hold until round end

use rand::Rng;

use super::{hold_position, RoundContext};
use crate::player::{Player, RoundActivity};
use crate::risk::RiskModel;

pub fn execute<M, R>(player: &mut Player, ctx: &RoundContext<'_, M>, rng: &mut R) -> RoundActivity
where
    M: RiskModel,
    R: Rng + ?Sized,
{
    let mut activity = RoundActivity::default();

    let entry = ctx.grace_period() + ctx.params().buy_hold_entry_delay;
    if entry >= ctx.candles.len() {
        return activity;
    }

    hold_position(player, ctx, entry, ctx.last_index(), ctx.game.position_size_ratio, &mut activity, rng);
    activity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::strategy::test_support::{linear_candles, CertainRisk, NoRisk};
    use crate::strategy::Strategy;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_single_trade_to_last_candle() {
        let game = GameConfig::default();
        let candles = linear_candles(470, 10.0, -0.005);
        let ctx = RoundContext::new(&candles, &game, &NoRisk);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut player = Player::new(0, Strategy::BuyAndHold, 1000.0);

        let activity = execute(&mut player, &ctx, &mut rng);

        assert_eq!(activity.trades.len(), 1);
        let trade = &activity.trades[0];
        assert_eq!(trade.entry_candle, 160);
        assert_eq!(trade.exit_candle, 469);
        // Falling path loses money
        assert!(trade.net_pnl < 0.0);
        assert_eq!(player.winning_trades, 0);
    }

    #[test]
    fn test_liquidated_on_entry_candle() {
        let game = GameConfig::default();
        let candles = linear_candles(470, 10.0, 0.01);
        let risk = CertainRisk { grace_period: 150 };
        let ctx = RoundContext::new(&candles, &game, &risk);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut player = Player::new(0, Strategy::BuyAndHold, 1000.0);

        let activity = execute(&mut player, &ctx, &mut rng);

        assert!(activity.trades.is_empty());
        assert_eq!(activity.liquidations, 1);
        assert_eq!(player.balance, 800.0);
    }

    #[test]
    fn test_round_shorter_than_entry() {
        let game = GameConfig::default();
        let candles = linear_candles(155, 10.0, 0.01);
        let ctx = RoundContext::new(&candles, &game, &NoRisk);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut player = Player::new(0, Strategy::BuyAndHold, 1000.0);

        assert_eq!(execute(&mut player, &ctx, &mut rng), RoundActivity::default());
        assert_eq!(player.balance, 1000.0);
    }
}

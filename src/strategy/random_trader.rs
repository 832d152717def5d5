//! Random trader: random entries after the grace period with random holds

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::{hold_position, RoundContext};
use crate::player::{Player, RoundActivity};
use crate::risk::RiskModel;

pub fn execute<M, R>(player: &mut Player, ctx: &RoundContext<'_, M>, rng: &mut R) -> RoundActivity
where
    M: RiskModel,
    R: Rng + ?Sized,
{
    let params = ctx.params();
    let mut activity = RoundActivity::default();

    // Index into the weight table is the trade count
    let num_trades = WeightedIndex::new(&params.random_trade_weights)
        .map(|weights| weights.sample(rng))
        .unwrap_or(0);

    let Some(window) = ctx.entry_window(params.random_entry_margin) else {
        return activity;
    };

    for _ in 0..num_trades {
        if !player.is_active() {
            break;
        }

        let entry = rng.gen_range(window.clone());
        let hold = params.random_hold.sample(rng);
        let exit = ctx.exit_after(entry, hold);

        hold_position(player, ctx, entry, exit, ctx.game.position_size_ratio, &mut activity, rng);
    }

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
    fn test_trades_stay_in_window() {
        let game = GameConfig::default();
        let candles = linear_candles(470, 10.0, 0.001);
        let ctx = RoundContext::new(&candles, &game, &NoRisk);
        let mut total = 0;

        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut player = Player::new(0, Strategy::RandomTrader, 1000.0);
            let activity = execute(&mut player, &ctx, &mut rng);

            assert!(activity.trades.len() <= 5);
            assert_eq!(activity.trades.len() as u32, activity.positions_opened);
            for trade in &activity.trades {
                assert!(trade.entry_candle >= 150 && trade.entry_candle <= 420);
                let hold = trade.exit_candle - trade.entry_candle;
                assert!((10..=100).contains(&hold));
            }
            total += activity.trades.len();
        }

        // Weighted toward one or two trades per round
        let mean = total as f64 / 200.0;
        assert!(mean > 1.5 && mean < 3.0, "mean trades {}", mean);
    }

    #[test]
    fn test_every_position_liquidated_under_certain_risk() {
        let game = GameConfig::default();
        let candles = linear_candles(470, 10.0, 0.001);
        let risk = CertainRisk { grace_period: 150 };
        let ctx = RoundContext::new(&candles, &game, &risk);

        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut player = Player::new(0, Strategy::RandomTrader, 1000.0);
            let activity = execute(&mut player, &ctx, &mut rng);

            assert!(activity.trades.is_empty());
            assert_eq!(activity.liquidations, activity.positions_opened);
            assert_eq!(player.liquidations, player.positions_opened);
        }
    }
}

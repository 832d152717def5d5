//! Dip buyer: buy the first drawdown from a recent high, hold for a bounce

use rand::Rng;

use super::{hold_position, RoundContext, StrategyParams};
use crate::market::Candle;
use crate::player::{Player, RoundActivity};
use crate::risk::RiskModel;

/// First candle whose close sits more than the threshold below the highest
/// high of the preceding lookback window
pub fn find_dip(candles: &[Candle], grace_period: usize, params: &StrategyParams) -> Option<usize> {
    if params.dip_lookback == 0 {
        return None;
    }

    let start = grace_period + params.dip_lookback;
    let end = candles.len().saturating_sub(params.dip_exit_margin);

    (start..end).find(|&i| {
        let recent_high = candles[i - params.dip_lookback..i]
            .iter()
            .map(|c| c.high)
            .fold(f64::MIN, f64::max);
        if recent_high <= 0.0 {
            return false;
        }
        (recent_high - candles[i].close) / recent_high > params.dip_drop_threshold
    })
}

pub fn execute<M, R>(player: &mut Player, ctx: &RoundContext<'_, M>, rng: &mut R) -> RoundActivity
where
    M: RiskModel,
    R: Rng + ?Sized,
{
    let mut activity = RoundActivity::default();

    let Some(entry) = find_dip(ctx.candles, ctx.grace_period(), ctx.params()) else {
        return activity;
    };

    let hold = ctx.params().dip_hold.sample(rng);
    let exit = ctx.exit_after(entry, hold);

    hold_position(player, ctx, entry, exit, ctx.game.position_size_ratio, &mut activity, rng);
    activity
}

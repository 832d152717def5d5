//! Scalper: many short trades at a fraction of the standard position size

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

    let num_trades = params.scalper_trades.sample(rng);
    let size_ratio = ctx.game.position_size_ratio * params.scalper_size_multiplier;

    let Some(window) = ctx.entry_window(params.scalper_entry_margin) else {
        return activity;
    };

    for _ in 0..num_trades {
        if !player.is_active() {
            break;
        }

        let entry = rng.gen_range(window.clone());
        let hold = params.scalper_hold.sample(rng);
        let exit = ctx.exit_after(entry, hold);

        hold_position(player, ctx, entry, exit, size_ratio, &mut activity, rng);
    }

    activity
}

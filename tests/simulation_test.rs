//! End-to-end simulation scenarios

use std::io::Write;

use crash_game_sim::market::CandleParams;
use crash_game_sim::strategy::RoundContext;
use crash_game_sim::{
    Exposure, GameConfig, Player, PriceSource, RiskModel, SimConfig, SimulationReport, Simulator,
    Strategy, WaveGenerator,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Never liquidates
struct ZeroRisk;

impl RiskModel for ZeroRisk {
    fn liquidation_probability<R: Rng + ?Sized>(&self, _: usize, _: Option<&Exposure>, _: &mut R) -> f64 {
        0.0
    }
}

/// Liquidates every position on its first candle
struct AlwaysLiquidate;

impl RiskModel for AlwaysLiquidate {
    fn liquidation_probability<R: Rng + ?Sized>(&self, _: usize, _: Option<&Exposure>, _: &mut R) -> f64 {
        1.0
    }
}

fn config(rounds: usize, players: usize, seed: u64) -> SimConfig {
    SimConfig {
        rounds,
        players_per_strategy: players,
        seed,
        ..Default::default()
    }
}

#[test]
fn test_buy_and_hold_without_risk() {
    let game = GameConfig::default();
    let candles = WaveGenerator::new(CandleParams::default()).generate(42, game.round_duration);
    let ctx = RoundContext::new(&candles, &game, &ZeroRisk);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut player = Player::new(0, Strategy::BuyAndHold, 1000.0);

    let activity = Strategy::BuyAndHold.execute(&mut player, &ctx, &mut rng);

    assert_eq!(activity.trades.len(), 1);
    let trade = &activity.trades[0];
    assert_eq!(trade.entry_candle, 160);
    assert_eq!(trade.exit_candle, 469);
    assert_eq!(trade.size, 200.0);
    assert!((trade.fee - 0.4).abs() < 1e-12);
    assert!((trade.net_pnl - (trade.gross_pnl - trade.fee)).abs() < 1e-12);
    assert!((player.balance - (1000.0 + trade.net_pnl)).abs() < 1e-9);
}

#[test]
fn test_single_round_buy_and_hold_simulation() {
    let sim_config = SimConfig {
        strategies: vec![Strategy::BuyAndHold],
        ..config(1, 1, 42)
    };
    let game = sim_config.game.clone();
    let sim = Simulator::with_components(sim_config, WaveGenerator::new(game.candles.clone()), ZeroRisk).unwrap();
    let outcome = sim.run();

    assert_eq!(outcome.players.len(), 1);
    assert_eq!(outcome.rounds.len(), 1);

    let round = &outcome.rounds[0];
    assert_eq!(round.trades, 1);
    assert_eq!(round.liquidations, 0);
    assert!(!round.had_liquidation);
    assert!((round.fees_collected - 0.4).abs() < 1e-12);

    let player = &outcome.players[0];
    assert_eq!(player.total_trades, 1);
    assert_eq!(player.positions_opened, 1);
}

#[test]
fn test_always_liquidate_leaves_no_trades() {
    let sim_config = config(5, 3, 9);
    let game = sim_config.game.clone();
    let sim = Simulator::with_components(sim_config, WaveGenerator::new(game.candles), AlwaysLiquidate).unwrap();
    let outcome = sim.run();

    for round in &outcome.rounds {
        assert_eq!(round.trades, 0);
        assert_eq!(round.fees_collected, 0.0);
    }

    for player in &outcome.players {
        assert_eq!(player.total_trades, 0);
        assert_eq!(player.total_fees_paid, 0.0);
        assert_eq!(player.liquidations, player.positions_opened);
    }

    let report = SimulationReport::from_outcome(&outcome, sim.config());
    for stats in &report.strategies {
        if stats.positions_opened > 0 {
            assert!((stats.liquidation_rate_pct - 100.0).abs() < 1e-9);
        }
    }
}

#[test]
fn test_reports_are_deterministic() {
    let first = Simulator::new(config(30, 4, 1234)).unwrap().run();
    let second = Simulator::new(config(30, 4, 1234)).unwrap().run();

    let a = SimulationReport::from_outcome(&first, &config(30, 4, 1234));
    let b = SimulationReport::from_outcome(&second, &config(30, 4, 1234));
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());

    let other = Simulator::new(config(30, 4, 1235)).unwrap().run();
    let c = SimulationReport::from_outcome(&other, &config(30, 4, 1235));
    assert_ne!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&c).unwrap());
}

#[test]
fn test_balance_conservation() {
    let outcome = Simulator::new(config(100, 10, 5)).unwrap().run();

    for player in &outcome.players {
        let expected = player.initial_balance + player.realized_pnl - player.liquidation_losses;
        assert!(
            (player.balance - expected).abs() < 1e-6,
            "player {}: {} vs {}",
            player.id,
            player.balance,
            expected
        );
    }

    let starting: f64 = outcome.players.iter().map(|p| p.initial_balance).sum();
    let ending: f64 = outcome.players.iter().map(|p| p.balance).sum();
    let realized: f64 = outcome.players.iter().map(|p| p.realized_pnl).sum();
    let lost: f64 = outcome.players.iter().map(|p| p.liquidation_losses).sum();
    assert!((ending - (starting + realized - lost)).abs() < 1e-6);
}

#[test]
fn test_generated_rounds_are_well_formed() {
    let generator = WaveGenerator::new(CandleParams::default());

    for seed in 0..20 {
        let candles = generator.generate(seed, 470);
        assert_eq!(candles.len(), 470);
        for (i, candle) in candles.iter().enumerate() {
            assert_eq!(candle.index, i);
            assert!(candle.is_well_formed(), "seed {} candle {}: {:?}", seed, i, candle);
        }
        for pair in candles.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
        }
    }
}

#[test]
fn test_config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"rounds": 3, "players_per_strategy": 2, "seed": 8, "strategies": ["dip_buyer", "scalper"]}}"#
    )
    .unwrap();

    let loaded: SimConfig = serde_json::from_reader(file.reopen().unwrap()).unwrap();
    assert_eq!(loaded.total_players(), 4);

    let outcome = Simulator::new(loaded).unwrap().run();
    assert_eq!(outcome.rounds.len(), 3);
    assert!(outcome.players.iter().all(|p| matches!(p.strategy, Strategy::DipBuyer | Strategy::Scalper)));
}

//! Synthetic price path generation
//!
//! Each round gets its own candle sequence. The default [`WaveGenerator`]
//! layers three sine waves of random period and phase into a slow trend
//! bias, then adds a random-sized move per candle in a direction nudged by
//! that bias. Every sequence re-randomizes its own wave parameters, so no
//! state carries from one round to the next.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::candle::Candle;

/// Anything that can produce a round's candle sequence from a seed.
///
/// Implementations must be deterministic: the same seed and length always
/// yield the same candles.
pub trait PriceSource: Send + Sync {
    fn generate(&self, seed: u64, len: usize) -> Vec<Candle>;
}

/// One sine component of the trend bias
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveLayer {
    /// Minimum period in candles
    pub period_min: f64,
    /// Random extra period added on top of the minimum
    pub period_span: f64,
    /// Contribution of this wave to the trend bias
    pub amplitude: f64,
}

/// Configuration for the wave candle generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandleParams {
    /// Lowest starting price
    pub start_price_min: f64,
    /// Starting price is drawn from [min, min + span]
    pub start_price_span: f64,
    /// Hard floor for close and low prices
    pub price_floor: f64,
    /// Slow, medium and fast trend waves
    pub waves: [WaveLayer; 3],
    /// Per-candle move as a fraction of price: [min, min + span]
    pub volatility_min: f64,
    pub volatility_span: f64,
    /// Weight of the uniform noise term in the direction decision
    pub noise_weight: f64,
    /// Wick length as a fraction of the move: [min, min + span]
    pub wick_min: f64,
    pub wick_span: f64,
}

impl Default for CandleParams {
    fn default() -> Self {
        Self {
            start_price_min: 10.0,
            start_price_span: 5.0,
            price_floor: 0.01,
            waves: [
                WaveLayer { period_min: 100.0, period_span: 100.0, amplitude: 0.15 },
                WaveLayer { period_min: 30.0, period_span: 20.0, amplitude: 0.08 },
                WaveLayer { period_min: 8.0, period_span: 8.0, amplitude: 0.04 },
            ],
            volatility_min: 0.02, // 2-8% moves
            volatility_span: 0.06,
            noise_weight: 0.3,
            wick_min: 0.3,
            wick_span: 0.4,
        }
    }
}

/// Wave-driven OHLC generator
#[derive(Debug, Clone, Default)]
pub struct WaveGenerator {
    params: CandleParams,
}

/// Period and phase drawn for one wave layer
struct Wave {
    period: f64,
    phase: f64,
    amplitude: f64,
}

impl Wave {
    fn value(&self, step: usize) -> f64 {
        (step as f64 * TAU / self.period + self.phase).sin() * self.amplitude
    }
}

impl WaveGenerator {
    pub fn new(params: CandleParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CandleParams {
        &self.params
    }

    fn draw_waves<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Wave> {
        let periods: Vec<f64> = self
            .params
            .waves
            .iter()
            .map(|layer| layer.period_min + rng.gen::<f64>() * layer.period_span)
            .collect();

        self.params
            .waves
            .iter()
            .zip(periods)
            .map(|(layer, period)| Wave {
                period,
                phase: rng.gen::<f64>() * TAU,
                amplitude: layer.amplitude,
            })
            .collect()
    }

    /// Build the next candle from the previous close
    fn next_candle<R: Rng + ?Sized>(&self, index: usize, price: f64, trend: f64, rng: &mut R) -> Candle {
        let p = &self.params;

        let volatility = p.volatility_min + rng.gen::<f64>() * p.volatility_span;
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let noise = (rng.gen::<f64>() - 0.5) * 2.0;

        let bias = direction + trend + noise * p.noise_weight;
        let movement = price * volatility * bias.signum();

        let open = price;
        let fill = 0.5 + rng.gen::<f64>() * 0.5;
        let close = (open + movement * fill).max(p.price_floor);

        let wick = p.wick_min + rng.gen::<f64>() * p.wick_span;
        let high = open.max(close) + movement.abs() * wick * rng.gen::<f64>();
        let low = (open.min(close) - movement.abs() * wick * rng.gen::<f64>()).max(p.price_floor);

        Candle { index, open, high, low, close }
    }
}

impl PriceSource for WaveGenerator {
    fn generate(&self, seed: u64, len: usize) -> Vec<Candle> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut price = (self.params.start_price_min
            + rng.gen::<f64>() * self.params.start_price_span)
            .max(self.params.price_floor);
        let waves = self.draw_waves(&mut rng);

        let mut candles = Vec::with_capacity(len);
        for i in 0..len {
            let trend: f64 = waves.iter().map(|w| w.value(i)).sum();
            let candle = self.next_candle(i, price, trend, &mut rng);
            price = candle.close;
            candles.push(candle);
        }

        candles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candles_well_formed() {
        let generator = WaveGenerator::default();

        for seed in 0..50 {
            let candles = generator.generate(seed, 470);
            assert_eq!(candles.len(), 470);

            for (i, candle) in candles.iter().enumerate() {
                assert_eq!(candle.index, i);
                assert!(candle.is_well_formed(), "seed {} candle {}: {:?}", seed, i, candle);
                assert!(candle.open > 0.0 && candle.close > 0.0 && candle.high > 0.0);
            }
        }
    }

    #[test]
    fn test_close_feeds_next_open() {
        let candles = WaveGenerator::default().generate(7, 200);
        for pair in candles.windows(2) {
            assert_eq!(pair[0].close, pair[1].open);
        }
    }

    #[test]
    fn test_start_price_band() {
        let generator = WaveGenerator::default();
        for seed in 0..100 {
            let first = generator.generate(seed, 1)[0];
            assert!(first.open >= 10.0 && first.open <= 15.0);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let generator = WaveGenerator::default();
        assert_eq!(generator.generate(42, 470), generator.generate(42, 470));
        assert_ne!(generator.generate(42, 470), generator.generate(43, 470));
    }

    #[test]
    fn test_price_floor_holds_under_crash() {
        // Huge moves drive price toward zero; the floor must hold
        let params = CandleParams {
            start_price_min: 0.02,
            start_price_span: 0.0,
            volatility_min: 0.9,
            volatility_span: 0.1,
            ..Default::default()
        };
        let candles = WaveGenerator::new(params).generate(3, 300);
        for candle in &candles {
            assert!(candle.low >= 0.01);
            assert!(candle.close >= 0.01);
            assert!(candle.is_well_formed());
        }
    }

    #[test]
    fn test_empty_sequence() {
        assert!(WaveGenerator::default().generate(1, 0).is_empty());
    }
}

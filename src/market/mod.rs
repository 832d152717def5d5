//! Market - synthetic candle sequences for each round

pub mod candle;
pub mod generator;

pub use candle::Candle;
pub use generator::{CandleParams, PriceSource, WaveGenerator, WaveLayer};

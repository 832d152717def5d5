//! OHLC candle type

use serde::{Deserialize, Serialize};

/// One OHLC observation in a round's price path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Position in the round (0-based)
    pub index: usize,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// True when the wicks enclose the body and every price is positive
    pub fn is_well_formed(&self) -> bool {
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);

        self.low > 0.0 && self.low <= body_low && body_high <= self.high
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

//! Players, completed trades and per-round activity records

use serde::{Deserialize, Serialize};

use crate::strategy::Strategy;

/// Completed (non-liquidated) trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_candle: usize,
    pub exit_candle: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Capital committed to the position
    pub size: f64,
    /// P&L before the trading fee
    pub gross_pnl: f64,
    pub fee: f64,
    /// gross_pnl - fee
    pub net_pnl: f64,
}

/// A simulated player following one strategy for the whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: usize,
    pub strategy: Strategy,
    pub initial_balance: f64,
    /// Current balance; at or below zero the player is eliminated
    pub balance: f64,
    /// Trades that reached a normal exit
    pub total_trades: u32,
    pub winning_trades: u32,
    pub total_fees_paid: f64,
    pub liquidations: u32,
    /// Every position opened, liquidated or not
    pub positions_opened: u32,
    /// Sum of net P&L over normal exits
    pub realized_pnl: f64,
    /// Sum of position sizes lost to liquidation
    pub liquidation_losses: f64,
}

impl Player {
    pub fn new(id: usize, strategy: Strategy, initial_balance: f64) -> Self {
        Self {
            id,
            strategy,
            initial_balance,
            balance: initial_balance,
            total_trades: 0,
            winning_trades: 0,
            total_fees_paid: 0.0,
            liquidations: 0,
            positions_opened: 0,
            realized_pnl: 0.0,
            liquidation_losses: 0.0,
        }
    }

    /// Eliminated players sit out every remaining round
    pub fn is_active(&self) -> bool {
        self.balance > 0.0
    }

    /// Settle a normal exit against the balance
    pub(crate) fn settle(&mut self, trade: &Trade) {
        self.balance += trade.net_pnl;
        self.realized_pnl += trade.net_pnl;
        self.total_fees_paid += trade.fee;
        self.total_trades += 1;
        if trade.net_pnl > 0.0 {
            self.winning_trades += 1;
        }
    }

    /// Forfeit the full position size; no fee is charged
    pub(crate) fn liquidate(&mut self, size: f64) {
        self.balance -= size;
        self.liquidation_losses += size;
        self.liquidations += 1;
    }
}

/// What one player did during one round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundActivity {
    pub trades: Vec<Trade>,
    pub positions_opened: u32,
    pub liquidations: u32,
    pub liquidation_losses: f64,
}

impl RoundActivity {
    pub fn fees(&self) -> f64 {
        self.trades.iter().map(|t| t.fee).sum()
    }

    pub fn was_liquidated(&self) -> bool {
        self.liquidations > 0
    }
}

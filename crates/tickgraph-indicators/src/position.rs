//! Isolated positions held by a strategy slot.

use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Side implied by a signal: positive is long, negative is short.
    pub fn from_signal(signal: f64) -> Option<Self> {
        if signal > 0.0 {
            Some(Side::Long)
        } else if signal < 0.0 {
            Some(Side::Short)
        } else {
            None
        }
    }

    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

/// A single position with its own margin. `amount` is signed: positive for
/// long, negative for short, zero when flat.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IsolatedPosition {
    pub entry_price: f64,
    pub amount: f64,
}

impl IsolatedPosition {
    pub fn open(entry_price: f64, amount: f64) -> Self {
        Self { entry_price, amount }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.amount != 0.0
    }

    pub fn side(&self) -> Option<Side> {
        Side::from_signal(self.amount)
    }

    /// Profit of closing the whole position at `exit_price`.
    #[inline]
    pub fn pnl(&self, exit_price: f64) -> f64 {
        self.amount * (exit_price - self.entry_price)
    }
}

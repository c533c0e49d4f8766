//! Exit conditions for open positions.

use crate::position::{IsolatedPosition, Side};
use serde::{Deserialize, Serialize};
use std::fmt;
use tickgraph_core::error::NodeError;
use tickgraph_core::traits::Indicator;
use tickgraph_core::types::Inputs;

/// Decides, tick by tick, whether an open position should be closed.
pub trait ExitCondition: Send + fmt::Debug {
    /// Observe this tick's price. `position` is `None` while flat.
    fn should_exit(&mut self, price: f64, position: Option<&IsolatedPosition>) -> bool;

    /// Forget everything tracked for the previous position.
    fn reset(&mut self) {}
}

/// Trailing stop that tightens as the position moves into profit.
///
/// For a long entered at `e` with best price `h` since entry, the stop sits
/// at `min(bad_ratio * h / e, (h / e + 1) / 2) * e`. Shorts mirror this
/// around the lowest price since entry.
#[derive(Debug, Clone)]
pub struct TrailingStop {
    bad_ratio: f64,
    highest: f64,
    lowest: f64,
    tracked: Option<(f64, Side)>,
}

impl TrailingStop {
    pub fn new(bad_ratio: f64) -> Self {
        assert!(bad_ratio > 0.0 && bad_ratio < 1.0, "Bad ratio must be in (0, 1)");
        Self {
            bad_ratio,
            highest: f64::NEG_INFINITY,
            lowest: f64::INFINITY,
            tracked: None,
        }
    }

    /// Stop level for `position` given the extremes seen so far.
    fn stop_level(&self, position: &IsolatedPosition, side: Side) -> f64 {
        let entry = position.entry_price;
        match side {
            Side::Long => {
                let ratio = self.highest / entry;
                (self.bad_ratio * ratio).min((ratio + 1.0) / 2.0) * entry
            }
            Side::Short => {
                let ratio = self.lowest / entry;
                (ratio / self.bad_ratio).max((ratio + 1.0) / 2.0) * entry
            }
        }
    }
}

impl Default for TrailingStop {
    fn default() -> Self {
        Self::new(0.98)
    }
}

impl ExitCondition for TrailingStop {
    fn should_exit(&mut self, price: f64, position: Option<&IsolatedPosition>) -> bool {
        let Some((position, side)) = position.and_then(|p| p.side().map(|side| (p, side))) else {
            ExitCondition::reset(self);
            return false;
        };

        // A new entry restarts tracking from the current price.
        if self.tracked != Some((position.entry_price, side)) {
            self.highest = price;
            self.lowest = price;
            self.tracked = Some((position.entry_price, side));
        }
        self.highest = self.highest.max(price);
        self.lowest = self.lowest.min(price);

        let stop = self.stop_level(position, side);
        match side {
            Side::Long => price <= stop,
            Side::Short => price >= stop,
        }
    }

    fn reset(&mut self) {
        self.highest = f64::NEG_INFINITY;
        self.lowest = f64::INFINITY;
        self.tracked = None;
    }
}

/// Graph form over `(price, entry_price, direction)`. A zero or NaN
/// direction means flat. Yields `1.0` when the stop is hit.
impl Indicator for TrailingStop {
    fn name(&self) -> &str {
        "trailing_stop"
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let price = inputs.arg(0).current();
        let entry = inputs.arg(1).current();
        let position = Side::from_signal(inputs.arg(2).current())
            .filter(|_| entry.is_finite())
            .map(|side| IsolatedPosition::open(entry, side.sign()));

        let hit = self.should_exit(price, position.as_ref());
        Ok(if hit { 1.0 } else { 0.0 })
    }

    fn reset(&mut self) {
        ExitCondition::reset(self);
    }
}

/// Close once price has moved `threshold` in the position's favour.
#[derive(Debug, Clone)]
pub struct TakeProfit {
    threshold: f64,
}

impl TakeProfit {
    pub fn new(threshold: f64) -> Self {
        assert!(threshold > 0.0, "Threshold must be positive");
        Self { threshold }
    }
}

impl ExitCondition for TakeProfit {
    fn should_exit(&mut self, price: f64, position: Option<&IsolatedPosition>) -> bool {
        match position.and_then(|p| p.side().map(|side| (p.entry_price, side))) {
            Some((entry, Side::Long)) => price >= entry + self.threshold,
            Some((entry, Side::Short)) => price <= entry - self.threshold,
            None => false,
        }
    }
}

/// Exit rule applied to every slot of a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExitRule {
    /// Positions only close on a flat or opposite signal.
    SignalOnly,
    TrailingStop { bad_ratio: f64 },
    TakeProfit { threshold: f64 },
}

impl Default for ExitRule {
    fn default() -> Self {
        ExitRule::TrailingStop { bad_ratio: 0.98 }
    }
}

impl ExitRule {
    /// A fresh exit condition for one slot.
    pub fn build(&self) -> Option<Box<dyn ExitCondition>> {
        match self {
            ExitRule::SignalOnly => None,
            ExitRule::TrailingStop { bad_ratio } => Some(Box::new(TrailingStop::new(*bad_ratio))),
            ExitRule::TakeProfit { threshold } => Some(Box::new(TakeProfit::new(*threshold))),
        }
    }
}

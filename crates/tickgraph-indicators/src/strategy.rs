//! Signal-driven strategy ledger.
//!
//! A strategy reads a price line and one signal line per slot. Each slot
//! holds at most one isolated position with its own balance:
//! - positive signal goes long, negative goes short
//! - zero holds the current position
//! - NaN closes the slot
//!
//! The slot's exit condition is checked against the position held before
//! the tick's signal is applied. An opposite signal closes the position
//! and immediately opens the new side at the same price.

use crate::exit::{ExitCondition, ExitRule};
use crate::position::{IsolatedPosition, Side};
use serde::{Deserialize, Serialize};
use tickgraph_core::error::{ComputationError, NodeError};
use tickgraph_core::traits::Indicator;
use tickgraph_core::types::Inputs;
use tickgraph_engine::Expr;
use tracing::{debug, trace};

/// Strategy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Starting balance per slot. Empty splits a balance of 1 equally.
    pub initial_balances: Vec<f64>,
    /// Fee rate charged on notional at entry and at close.
    pub fee: f64,
    /// Fractional price penalty applied to every fill.
    pub slippage: f64,
    pub exit: ExitRule,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            initial_balances: Vec::new(),
            fee: 0.0,
            slippage: 0.0,
            exit: ExitRule::default(),
        }
    }
}

impl StrategyConfig {
    pub fn with_exit(mut self, exit: ExitRule) -> Self {
        self.exit = exit;
        self
    }

    pub fn with_fee(mut self, fee: f64) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_initial_balances(mut self, balances: impl Into<Vec<f64>>) -> Self {
        self.initial_balances = balances.into();
        self
    }

    fn balances(&self, slots: usize) -> Vec<f64> {
        if self.initial_balances.is_empty() {
            vec![1.0 / slots as f64; slots]
        } else {
            self.initial_balances.clone()
        }
    }

    fn fill_price(&self, price: f64, buying: bool) -> f64 {
        if buying {
            price * (1.0 + self.slippage)
        } else {
            price * (1.0 - self.slippage)
        }
    }
}

/// Which ledger figure a strategy node reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMetric {
    /// Sum of closed-trade PnL.
    RealizedPnl,
    /// Sum of slot balances, net of fees.
    Balance,
    /// Realized PnL plus the open positions marked at the current price.
    TotalPnl,
}

#[derive(Debug)]
struct Slot {
    position: IsolatedPosition,
    balance: f64,
    unrealized: f64,
    exit: Option<Box<dyn ExitCondition>>,
}

impl Slot {
    fn enter(&mut self, side: Side, price: f64, config: &StrategyConfig) {
        let fill = config.fill_price(price, side == Side::Long);
        let amount = self.balance / fill * side.sign();
        let fee = config.fee * fill * amount.abs();
        self.balance -= fee;
        self.position = IsolatedPosition::open(fill, amount);
    }

    /// Close the open position and return its PnL.
    fn close(&mut self, price: f64, config: &StrategyConfig) -> f64 {
        let fill = config.fill_price(price, self.position.side() == Some(Side::Short));
        let pnl = self.position.pnl(fill);
        let fee = config.fee * fill * self.position.amount.abs();
        self.balance += pnl - fee;
        self.unrealized = 0.0;
        self.position = IsolatedPosition::default();
        pnl
    }
}

/// Strategy ledger node over `(price, signal_0, .., signal_n)`.
///
/// Every node built from the same inputs and config replays the same
/// ledger, so one node per reported metric stays consistent.
#[derive(Debug)]
pub struct Strategy {
    metric: StrategyMetric,
    config: StrategyConfig,
    signals: usize,
    slots: Vec<Slot>,
    realized_pnl: f64,
    trades: u64,
}

impl Strategy {
    pub fn new(metric: StrategyMetric, signals: usize, config: StrategyConfig) -> Self {
        assert!(signals > 0, "Strategy needs at least one signal");
        assert!(
            config.initial_balances.is_empty() || config.initial_balances.len() == signals,
            "Initial balances must match the number of signals"
        );
        assert!(config.fee >= 0.0, "Fee must not be negative");
        assert!((0.0..1.0).contains(&config.slippage), "Slippage must be in [0, 1)");

        let mut strategy = Self {
            metric,
            config,
            signals,
            slots: Vec::new(),
            realized_pnl: 0.0,
            trades: 0,
        };
        strategy.rebuild();
        strategy
    }

    fn rebuild(&mut self) {
        self.slots = self
            .config
            .balances(self.signals)
            .into_iter()
            .map(|balance| Slot {
                position: IsolatedPosition::default(),
                balance,
                unrealized: 0.0,
                exit: self.config.exit.build(),
            })
            .collect();
        self.realized_pnl = 0.0;
        self.trades = 0;
    }

    fn close(&mut self, index: usize, price: f64, reason: &str) {
        let pnl = self.slots[index].close(price, &self.config);
        self.realized_pnl += pnl;
        debug!(slot = index, price, pnl, reason, realized = self.realized_pnl, "Closed position");
    }

    fn enter(&mut self, index: usize, side: Side, price: f64) {
        self.slots[index].enter(side, price, &self.config);
        self.trades += 1;
        let position = &self.slots[index].position;
        debug!(
            slot = index,
            trade = self.trades,
            ?side,
            entry = position.entry_price,
            amount = position.amount,
            "Entered position"
        );
    }

    fn value(&self) -> f64 {
        match self.metric {
            StrategyMetric::RealizedPnl => self.realized_pnl,
            StrategyMetric::Balance => self.slots.iter().map(|slot| slot.balance).sum(),
            StrategyMetric::TotalPnl => {
                self.realized_pnl + self.slots.iter().map(|slot| slot.unrealized).sum::<f64>()
            }
        }
    }
}

impl Indicator for Strategy {
    fn name(&self) -> &str {
        match self.metric {
            StrategyMetric::RealizedPnl => "strategy_pnl",
            StrategyMetric::Balance => "strategy_balance",
            StrategyMetric::TotalPnl => "strategy_total_pnl",
        }
    }

    fn arity(&self) -> Option<usize> {
        Some(1 + self.signals)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let price = inputs.arg(0).current();
        if !price.is_finite() || price <= 0.0 {
            return Err(ComputationError::Domain {
                operation: "strategy price",
                value: price,
            }
            .into());
        }

        for index in 0..self.signals {
            let signal = inputs.arg(index + 1).current();
            let slot = &mut self.slots[index];
            let held = slot.position.is_open().then_some(slot.position);
            let exit_hit = slot
                .exit
                .as_mut()
                .is_some_and(|exit| exit.should_exit(price, held.as_ref()));

            if signal.is_nan() {
                if held.is_some() {
                    self.close(index, price, "signal cleared");
                }
            } else if exit_hit {
                if held.is_some() {
                    self.close(index, price, "exit condition");
                }
            } else if let Some(side) = Side::from_signal(signal) {
                match held.and_then(|position| position.side()) {
                    None => self.enter(index, side, price),
                    Some(current) if current != side => {
                        self.close(index, price, "opposite signal");
                        self.enter(index, side, price);
                    }
                    Some(_) => {}
                }
            }

            let slot = &mut self.slots[index];
            slot.unrealized = slot.position.pnl(price);
        }

        let value = self.value();
        trace!(metric = ?self.metric, value, "Strategy updated");
        Ok(value)
    }

    fn reset(&mut self) {
        self.rebuild();
    }
}

/// Strategy output lines.
#[derive(Debug, Clone, Copy)]
pub struct StrategyLines<'g> {
    /// Realized PnL
    pub pnl: Expr<'g>,
    /// Sum of slot balances
    pub balance: Expr<'g>,
    /// Realized plus unrealized PnL
    pub total_pnl: Expr<'g>,
}

/// Strategy trading `price` on one slot per signal.
pub fn strategy<'g>(price: Expr<'g>, signals: &[Expr<'g>], config: &StrategyConfig) -> StrategyLines<'g> {
    let graph = price.graph();
    let operands: Vec<Expr<'g>> = std::iter::once(price).chain(signals.iter().copied()).collect();
    let line = |metric: StrategyMetric, label: &str| {
        graph
            .node(Strategy::new(metric, signals.len(), config.clone()), operands.iter().copied())
            .named(label)
    };

    StrategyLines {
        pnl: line(StrategyMetric::RealizedPnl, "strategy_pnl"),
        balance: line(StrategyMetric::Balance, "strategy_balance"),
        total_pnl: line(StrategyMetric::TotalPnl, "strategy_total_pnl"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickgraph_core::types::TickRecord;
    use tickgraph_engine::{generate_sync, IndicatorGraph};

    fn run(prices: Vec<f64>, signals: Vec<f64>, config: StrategyConfig) -> Vec<TickRecord> {
        let graph = IndicatorGraph::new();
        let price = graph.raw_series("price", prices).unwrap();
        let signal = graph.raw_series("signal", signals).unwrap();
        let lines = strategy(price, &[signal], &config);
        let roots = [
            ("pnl", lines.pnl.id()),
            ("balance", lines.balance.id()),
            ("total_pnl", lines.total_pnl.id()),
        ];

        generate_sync(graph, roots).unwrap().map(|record| record.unwrap()).collect()
    }

    fn value(record: &TickRecord, root: &str) -> f64 {
        record.value(root).unwrap()
    }

    #[test]
    fn test_strategy_trades_signals() {
        let prices = vec![1000.0, 1001.0, 1002.0, 1003.0, 1004.0, 1005.0, 1006.0, 1007.0];
        let signals = vec![1.0, 0.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0];
        let config = StrategyConfig::default().with_exit(ExitRule::TakeProfit { threshold: 2.0 });
        let records = run(prices, signals, config);
        assert_eq!(records.len(), 8);

        // Long opened, nothing realized yet
        assert_eq!(value(&records[0], "pnl"), 0.0);
        assert!(value(&records[1], "total_pnl") > 0.0);

        // Take profit closes the long
        assert!(value(&records[2], "pnl") > 0.0);
        assert_eq!(value(&records[2], "total_pnl"), value(&records[2], "pnl"));
        assert!((value(&records[2], "balance") - 1002.0 / 1000.0).abs() < 1e-12);

        // Opposite signal closes the long and opens a short
        let expected = 1002.0 / 1000.0 * 1005.0 / 1004.0;
        assert!((value(&records[5], "balance") - expected).abs() < 1e-12);

        // Short is under water as price keeps rising
        let last = &records[7];
        assert!(value(last, "total_pnl") - value(last, "pnl") < 0.0);
    }

    #[test]
    fn test_fees_reduce_balance() {
        let config = StrategyConfig::default()
            .with_exit(ExitRule::SignalOnly)
            .with_fee(0.001);
        let records = run(vec![100.0, 100.0], vec![1.0, f64::NAN], config);

        // 0.001 * 100 * 0.01 paid on each side
        assert!((value(&records[0], "balance") - 0.99999).abs() < 1e-12);
        assert!((value(&records[1], "balance") - 0.99998).abs() < 1e-12);
        assert_eq!(value(&records[1], "pnl"), 0.0);
    }

    #[test]
    fn test_slippage_worsens_fills() {
        let config = StrategyConfig::default()
            .with_exit(ExitRule::SignalOnly)
            .with_slippage(0.01);
        let records = run(vec![100.0, 100.0], vec![1.0, f64::NAN], config);

        // Bought at 101, sold at 99
        assert!((value(&records[1], "balance") - 99.0 / 101.0).abs() < 1e-12);
        assert!(value(&records[1], "pnl") < 0.0);
    }

    #[test]
    fn test_trailing_stop_exits_long() {
        let prices = vec![100.0, 120.0, 109.0, 108.0];
        let signals = vec![1.0, 0.0, 0.0, 0.0];
        let records = run(prices, signals, StrategyConfig::default());

        // Stop at 110 after the run up to 120
        assert!((value(&records[2], "pnl") - 0.09).abs() < 1e-12);
        assert_eq!(value(&records[3], "pnl"), value(&records[2], "pnl"));
        assert_eq!(value(&records[3], "total_pnl"), value(&records[3], "pnl"));
    }

    #[test]
    fn test_slots_split_balance() {
        let graph = IndicatorGraph::new();
        let price = graph.raw_series("price", vec![10.0, 11.0]).unwrap();
        let long = graph.raw_series("long", vec![1.0, 0.0]).unwrap();
        let short = graph.raw_series("short", vec![-1.0, 0.0]).unwrap();
        let config = StrategyConfig::default().with_exit(ExitRule::SignalOnly);
        let lines = strategy(price, &[long, short], &config);
        let total = lines.total_pnl.id();

        let records: Vec<TickRecord> = generate_sync(graph, [("total", total)])
            .unwrap()
            .map(|record| record.unwrap())
            .collect();
        // Half long and half short cancel out
        assert!(value(&records[1], "total").abs() < 1e-12);
    }

    #[test]
    fn test_invalid_price_is_a_fault() {
        let config = StrategyConfig::default();
        let records = run(vec![100.0, 0.0], vec![1.0, 0.0], config);
        assert!(records[1].fault("balance").is_some());
    }

    #[test]
    #[should_panic(expected = "at least one signal")]
    fn test_requires_signals() {
        let graph = IndicatorGraph::new();
        let price = graph.raw_series("price", vec![1.0]).unwrap();
        strategy(price, &[], &StrategyConfig::default());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: StrategyConfig = serde_json::from_str(r#"{"fee": 0.0005}"#).unwrap();
        assert_eq!(config.fee, 0.0005);
        assert_eq!(config.exit, ExitRule::TrailingStop { bad_ratio: 0.98 });
        assert!(config.initial_balances.is_empty());
    }
}

//! Momentum indicators.

use crate::moving_average::{Ema, Sma};
use tickgraph_core::error::NodeError;
use tickgraph_core::traits::Indicator;
use tickgraph_core::types::Inputs;
use tickgraph_engine::Expr;

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent changes to evaluate
/// overbought or oversold conditions. Gains and losses are averaged with
/// Wilder's smoothing, kept as private state.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    avg_gain: f64,
    avg_loss: f64,
    changes: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            avg_gain: 0.0,
            avg_loss: 0.0,
            changes: 0,
        }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let series = inputs.arg(0);
        let previous = series.get(1).ok_or(NodeError::InsufficientHistory {
            required: self.period + 1,
            available: series.len(),
        })?;
        let change = series.current() - previous;
        let (gain, loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };

        let period = self.period as f64;
        self.changes += 1;
        if self.changes < self.period {
            self.avg_gain += gain;
            self.avg_loss += loss;
            return Err(NodeError::InsufficientHistory {
                required: self.period + 1,
                available: self.changes + 1,
            });
        } else if self.changes == self.period {
            // Initial average
            self.avg_gain = (self.avg_gain + gain) / period;
            self.avg_loss = (self.avg_loss + loss) / period;
        } else {
            // Wilder's smoothing: avg = (prev_avg * (period-1) + value) / period
            self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
        }

        if self.avg_loss == 0.0 {
            Ok(100.0)
        } else {
            Ok(100.0 - (100.0 / (1.0 + self.avg_gain / self.avg_loss)))
        }
    }

    fn reset(&mut self) {
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
        self.changes = 0;
    }
}

/// Number of consecutive ticks on which the argument has been truthy.
///
/// Reads its own previous output; resets to zero on a falsy tick.
#[derive(Debug, Clone, Default)]
pub struct Aging;

impl Indicator for Aging {
    fn name(&self) -> &str {
        "aging"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn own_history(&self) -> usize {
        1
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let value = inputs.arg(0).current();
        if value != 0.0 && !value.is_nan() {
            Ok(inputs.own().latest().unwrap_or(0.0) + 1.0)
        } else {
            Ok(0.0)
        }
    }
}

/// %K of the stochastic oscillator over `high`, `low` and `close`.
#[derive(Debug, Clone)]
pub struct StochasticK {
    period: usize,
}

impl StochasticK {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for StochasticK {
    fn name(&self) -> &str {
        "stochastic_k"
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let (high, low, close) = (inputs.arg(0), inputs.arg(1), inputs.arg(2));
        high.require(self.period - 1)?;
        low.require(self.period - 1)?;

        let highest = high.values().fold(f64::NEG_INFINITY, f64::max);
        let lowest = low.values().fold(f64::INFINITY, f64::min);
        let range = highest - lowest;
        if range == 0.0 {
            Ok(50.0)
        } else {
            Ok((close.current() - lowest) / range * 100.0)
        }
    }
}

/// MACD output lines.
#[derive(Debug, Clone, Copy)]
pub struct Macd<'g> {
    /// Fast EMA - slow EMA
    pub line: Expr<'g>,
    /// EMA of the MACD line
    pub signal: Expr<'g>,
    /// Line - signal
    pub histogram: Expr<'g>,
}

/// MACD built from three EMAs. Conventional periods are (12, 26, 9).
pub fn macd(source: Expr<'_>, fast: usize, slow: usize, signal: usize) -> Macd<'_> {
    assert!(fast > 0 && slow > 0 && signal > 0);
    assert!(fast < slow, "Fast period must be less than slow period");
    let graph = source.graph();

    let fast_ema = graph.node(Ema::new(fast), [source]);
    let slow_ema = graph.node(Ema::new(slow), [source]);
    let line = (fast_ema - slow_ema).named("macd_line");
    let signal = graph.node(Ema::new(signal), [line]).named("macd_signal");

    Macd {
        line,
        signal,
        histogram: (line - signal).named("macd_histogram"),
    }
}

/// Stochastic oscillator output lines.
#[derive(Debug, Clone, Copy)]
pub struct Stochastic<'g> {
    pub k: Expr<'g>,
    /// SMA of %K
    pub d: Expr<'g>,
}

pub fn stochastic<'g>(
    high: Expr<'g>,
    low: Expr<'g>,
    close: Expr<'g>,
    k_period: usize,
    d_period: usize,
) -> Stochastic<'g> {
    let graph = close.graph();
    let k = graph.node(StochasticK::new(k_period), [high, low, close]);
    let d = graph.node(Sma::new(d_period), [k]).named("stochastic_d");
    Stochastic { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::outputs;
    use crate::IndicatorExt;
    use tickgraph_engine::{generate_sync, IndicatorGraph};

    #[test]
    fn test_rsi_basic() {
        // Alternating up/down moves
        let data: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.5).sin() * 5.0).collect();
        let result = outputs(&data, |x| x.rsi(14));

        assert_eq!(result.iter().filter(|v| v.is_some()).count(), 30 - 14);
        for value in result.iter().flatten() {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
    }

    #[test]
    fn test_rsi_all_gains() {
        let result = outputs(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], |x| x.rsi(5));

        assert_eq!(result[4], None);
        assert!((result[5].unwrap() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_all_losses() {
        let result = outputs(&[7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0], |x| x.rsi(5));
        assert!(result[5].unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_aging_counts_consecutive_truthy() {
        let result = outputs(&[1.0, 1.0, 0.0, 2.0, 3.0, 4.0, 0.0], |x| x.aging());
        assert_eq!(
            result,
            vec![Some(1.0), Some(2.0), Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(0.0)]
        );
    }

    #[test]
    fn test_macd_uptrend() {
        let graph = IndicatorGraph::new();
        let price = graph.raw_series("price", (0..50).map(|i| 100.0 + i as f64)).unwrap();
        let lines = macd(price, 12, 26, 9);
        let roots = [("line", lines.line.id()), ("histogram", lines.histogram.id())];

        let records: Vec<_> = generate_sync(graph, roots).unwrap().map(Result::unwrap).collect();
        assert_eq!(records.len(), 50);
        // In an uptrend the fast EMA leads the slow one.
        assert!(records.last().unwrap().value("line").unwrap() > 0.0);
    }

    #[test]
    fn test_stochastic_at_high() {
        let graph = IndicatorGraph::new();
        let high_values = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0];
        let low_values = vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let high = graph.raw_series("high", high_values.clone()).unwrap();
        let low = graph.raw_series("low", low_values).unwrap();
        // Close at highs
        let close = graph.raw_series("close", high_values).unwrap();
        let lines = stochastic(high, low, close, 5, 3);
        let roots = [("k", lines.k.id()), ("d", lines.d.id())];

        let records: Vec<_> = generate_sync(graph, roots).unwrap().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        let last = records.last().unwrap();
        assert!((last.value("k").unwrap() - 100.0).abs() < 1e-10);
        assert!((last.value("d").unwrap() - 100.0).abs() < 1e-10);
    }
}

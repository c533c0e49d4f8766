//! Moving average indicators.

use tickgraph_core::error::NodeError;
use tickgraph_core::traits::Indicator;
use tickgraph_core::types::Inputs;

/// Simple Moving Average (SMA).
///
/// Arithmetic mean of the last `period` values. Warms up until `period`
/// values have been seen.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let series = inputs.arg(0);
        series.require(self.period - 1)?;
        Ok(series.values().sum::<f64>() / self.period as f64)
    }
}

/// Exponential Moving Average (EMA).
///
/// Keeps a single running value as private state. The first input seeds the
/// average; every later input is blended in with the forward weight.
#[derive(Debug, Clone)]
pub struct Ema {
    weight: f64,
    current: Option<f64>,
}

impl Ema {
    /// Create a new EMA with the conventional weight `2 / (period + 1)`.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self::with_weight(2.0 / (period as f64 + 1.0))
    }

    /// Create an EMA with a custom forward weight.
    pub fn with_weight(weight: f64) -> Self {
        assert!(weight > 0.0 && weight <= 1.0, "Weight must be in (0, 1]");
        Self { weight, current: None }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Get the current EMA value.
    pub fn current(&self) -> Option<f64> {
        self.current
    }
}

impl Default for Ema {
    /// Weight 2/21, i.e. a 20-period EMA.
    fn default() -> Self {
        Self::new(20)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        "ema"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let value = inputs.arg(0).current();
        let next = match self.current {
            Some(previous) => previous * (1.0 - self.weight) + value * self.weight,
            None => value,
        };
        self.current = Some(next);
        Ok(next)
    }

    fn reset(&mut self) {
        self.current = None;
    }
}

/// Weighted Moving Average (WMA).
///
/// Gives linearly decreasing weights to older values.
#[derive(Debug, Clone)]
pub struct Wma {
    period: usize,
    weights_sum: f64,
}

impl Wma {
    /// Create a new WMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        // 1 + 2 + ... + n
        let weights_sum = (period * (period + 1)) as f64 / 2.0;
        Self { period, weights_sum }
    }
}

impl Indicator for Wma {
    fn name(&self) -> &str {
        "wma"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let series = inputs.arg(0);
        series.require(self.period - 1)?;
        let weighted: f64 = series
            .values()
            .enumerate()
            .map(|(i, value)| value * (i + 1) as f64)
            .sum();
        Ok(weighted / self.weights_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::outputs;
    use crate::IndicatorExt;

    #[test]
    fn test_sma() {
        let result = outputs(&[1.0, 2.0, 3.0, 4.0, 5.0], |x| x.sma(3));

        assert_eq!(result[..2], [None, None]);
        assert!((result[2].unwrap() - 2.0).abs() < 1e-10); // (1+2+3)/3
        assert!((result[3].unwrap() - 3.0).abs() < 1e-10); // (2+3+4)/3
        assert!((result[4].unwrap() - 4.0).abs() < 1e-10); // (3+4+5)/3
    }

    #[test]
    fn test_sma_insufficient_data() {
        let result = outputs(&[1.0, 2.0, 3.0], |x| x.sma(5));
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn test_sma_period_one_is_identity() {
        let result = outputs(&[4.0, 7.0], |x| x.sma(1));
        assert_eq!(result, vec![Some(4.0), Some(7.0)]);
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        // weight = 2/(3+1) = 0.5
        let result = outputs(&[2.0, 4.0, 6.0], |x| x.ema(3));

        assert_eq!(result[0], Some(2.0));
        assert!((result[1].unwrap() - 3.0).abs() < 1e-10);
        assert!((result[2].unwrap() - 4.5).abs() < 1e-10);
    }

    #[test]
    fn test_ema_reset() {
        let mut ema = Ema::with_weight(0.25);
        ema.current = Some(10.0);
        ema.reset();
        assert!(ema.current().is_none());
        assert_eq!(Ema::default().weight(), 2.0 / 21.0);
    }

    #[test]
    fn test_wma() {
        let result = outputs(&[1.0, 2.0, 3.0, 4.0, 5.0], |x| x.wma(3));

        assert_eq!(result.iter().filter(|v| v.is_some()).count(), 3);
        // Weights: 1, 2, 3; sum = 6
        // (1*1 + 2*2 + 3*3) / 6 = 14/6
        assert!((result[2].unwrap() - 14.0 / 6.0).abs() < 1e-10);
    }
}

//! Volatility indicators.

use crate::moving_average::Sma;
use tickgraph_core::error::NodeError;
use tickgraph_core::traits::Indicator;
use tickgraph_core::types::{Inputs, Series};
use tickgraph_engine::Expr;

fn population_variance(series: &Series<'_>, period: usize) -> f64 {
    let period_f64 = period as f64;
    let mean: f64 = series.values().sum::<f64>() / period_f64;
    series.values().map(|x| (x - mean).powi(2)).sum::<f64>() / period_f64
}

/// Population variance over the last `period` values.
#[derive(Debug, Clone)]
pub struct MovingVariance {
    period: usize,
}

impl MovingVariance {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for MovingVariance {
    fn name(&self) -> &str {
        "variance"
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
        Ok(population_variance(series, self.period))
    }
}

/// Standard Deviation.
#[derive(Debug, Clone)]
pub struct StdDev {
    period: usize,
}

impl StdDev {
    /// Create a new standard deviation indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for StdDev {
    fn name(&self) -> &str {
        "stddev"
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
        Ok(population_variance(series, self.period).sqrt())
    }
}

/// Bollinger Bands.
///
/// A middle band (SMA) with upper and lower bands a multiple of the
/// standard deviation away.
#[derive(Debug, Clone, Copy)]
pub struct BollingerBands<'g> {
    pub upper: Expr<'g>,
    pub middle: Expr<'g>,
    pub lower: Expr<'g>,
}

/// Build Bollinger bands over `source` from an SMA and a standard deviation
/// sharing the same `period`.
pub fn bollinger_bands(source: Expr<'_>, period: usize, std_dev_multiplier: f64) -> BollingerBands<'_> {
    assert!(std_dev_multiplier > 0.0, "Std dev multiplier must be positive");
    let graph = source.graph();
    let middle = graph.node(Sma::new(period), [source]);
    let width = graph.node(StdDev::new(period), [source]) * std_dev_multiplier;

    BollingerBands {
        upper: (middle + width).named("bollinger_upper"),
        middle: middle.named("bollinger_middle"),
        lower: (middle - width).named("bollinger_lower"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::outputs;
    use crate::IndicatorExt;
    use tickgraph_engine::{generate_sync, IndicatorGraph};

    #[test]
    fn test_std_dev() {
        let result = outputs(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], |x| x.stddev(8));

        assert_eq!(result.iter().filter(|v| v.is_some()).count(), 1);
        assert!((result[7].unwrap() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_variance() {
        let result = outputs(&[1.0, 2.0, 3.0, 4.0], |x| x.variance(2));

        assert_eq!(result[0], None);
        for value in &result[1..] {
            assert!((value.unwrap() - 0.25).abs() < 1e-10);
        }
    }

    #[test]
    fn test_bollinger_bands() {
        let graph = IndicatorGraph::new();
        let price = graph
            .raw_series("price", vec![20.0, 21.0, 22.0, 21.0, 20.0, 21.0, 22.0, 23.0, 22.0, 21.0])
            .unwrap();
        let bands = bollinger_bands(price, 5, 2.0);
        let roots = [
            ("upper", bands.upper.id()),
            ("middle", bands.middle.id()),
            ("lower", bands.lower.id()),
        ];

        let records: Vec<_> = generate_sync(graph, roots).unwrap().map(Result::unwrap).collect();
        assert_eq!(records.len(), 6);
        for record in &records {
            let upper = record.value("upper").unwrap();
            let middle = record.value("middle").unwrap();
            let lower = record.value("lower").unwrap();
            assert!(upper >= middle);
            assert!(middle >= lower);
            assert!(((upper - middle) - (middle - lower)).abs() < 1e-10);
        }
        // mean of 20, 21, 22, 21, 20
        assert!((records[0].value("middle").unwrap() - 20.8).abs() < 1e-10);
    }

    #[test]
    fn test_bollinger_shares_source() {
        let graph = IndicatorGraph::new();
        let price = graph.raw_series("price", vec![1.0]).unwrap();
        let bands = bollinger_bands(price, 20, 2.0);

        assert_eq!(bands.middle.name(), "bollinger_middle");
        let middle_deps = graph.dependencies_of(bands.middle.id()).unwrap();
        assert_eq!(middle_deps, vec![price.id()]);
    }
}

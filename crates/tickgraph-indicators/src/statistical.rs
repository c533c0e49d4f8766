//! Order statistics over a rolling window.

use serde::{Deserialize, Serialize};
use tickgraph_core::error::NodeError;
use tickgraph_core::traits::Indicator;
use tickgraph_core::types::Inputs;

/// Which order statistic to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extreme {
    Min,
    Max,
    Median,
}

/// Minimum, maximum or median of the last `period` values.
#[derive(Debug, Clone)]
pub struct HistoricalExtremes {
    period: usize,
    extreme: Extreme,
    sorted: Vec<f64>,
}

impl HistoricalExtremes {
    pub fn new(period: usize, extreme: Extreme) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            extreme,
            sorted: Vec::with_capacity(period),
        }
    }
}

impl Indicator for HistoricalExtremes {
    fn name(&self) -> &str {
        match self.extreme {
            Extreme::Min => "rolling_min",
            Extreme::Max => "rolling_max",
            Extreme::Median => "rolling_median",
        }
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

        self.sorted.clear();
        self.sorted.extend(series.values());
        self.sorted.sort_by(f64::total_cmp);

        let n = self.sorted.len();
        let value = match self.extreme {
            Extreme::Min => self.sorted[0],
            Extreme::Max => self.sorted[n - 1],
            Extreme::Median if n % 2 == 1 => self.sorted[n / 2],
            Extreme::Median => (self.sorted[n / 2 - 1] + self.sorted[n / 2]) / 2.0,
        };
        Ok(value)
    }

    fn reset(&mut self) {
        self.sorted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::outputs;
    use crate::IndicatorExt;

    #[test]
    fn test_rolling_extremes() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0];

        let min = outputs(&data, |x| x.rolling_min(3));
        let max = outputs(&data, |x| x.rolling_max(3));
        assert_eq!(min, vec![None, None, Some(1.0), Some(1.0), Some(1.0), Some(1.0)]);
        assert_eq!(max, vec![None, None, Some(4.0), Some(4.0), Some(5.0), Some(9.0)]);
    }

    #[test]
    fn test_rolling_median() {
        let odd = outputs(&[3.0, 1.0, 4.0, 1.0, 5.0], |x| x.rolling_median(3));
        assert_eq!(odd, vec![None, None, Some(3.0), Some(1.0), Some(4.0)]);

        let even = outputs(&[3.0, 1.0, 4.0, 2.0], |x| x.rolling_median(4));
        assert_eq!(even[3], Some(2.5));
    }

    #[test]
    fn test_extreme_deserializes() {
        let extreme: Extreme = serde_json::from_str("\"median\"").unwrap();
        assert_eq!(extreme, Extreme::Median);
    }
}

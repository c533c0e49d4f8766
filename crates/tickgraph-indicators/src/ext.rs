//! Method-call sugar for the built-in indicators.

use crate::momentum::{macd, Aging, Macd, Rsi};
use crate::moving_average::{Ema, Sma, Wma};
use crate::statistical::{Extreme, HistoricalExtremes};
use crate::volatility::{bollinger_bands, BollingerBands, MovingVariance, StdDev};
use tickgraph_engine::Expr;

/// Built-in indicators as methods on [`Expr`].
///
/// ```no_run
/// use tickgraph_engine::IndicatorGraph;
/// use tickgraph_indicators::IndicatorExt;
///
/// let graph = IndicatorGraph::new();
/// let price = graph.raw_series("price", vec![1.0, 2.0, 3.0]).unwrap();
/// let trend = price.ema(20) - price.sma(50);
/// ```
pub trait IndicatorExt<'g>: Sized {
    fn sma(self, period: usize) -> Expr<'g>;
    fn ema(self, period: usize) -> Expr<'g>;
    /// EMA with an explicit forward weight.
    fn ema_weighted(self, weight: f64) -> Expr<'g>;
    fn wma(self, period: usize) -> Expr<'g>;
    fn variance(self, period: usize) -> Expr<'g>;
    fn stddev(self, period: usize) -> Expr<'g>;
    fn rsi(self, period: usize) -> Expr<'g>;
    fn aging(self) -> Expr<'g>;
    fn rolling_min(self, period: usize) -> Expr<'g>;
    fn rolling_max(self, period: usize) -> Expr<'g>;
    fn rolling_median(self, period: usize) -> Expr<'g>;
    fn bollinger_bands(self, period: usize, std_dev_multiplier: f64) -> BollingerBands<'g>;
    fn macd(self, fast: usize, slow: usize, signal: usize) -> Macd<'g>;
}

impl<'g> IndicatorExt<'g> for Expr<'g> {
    fn sma(self, period: usize) -> Expr<'g> {
        self.graph().node(Sma::new(period), [self])
    }

    fn ema(self, period: usize) -> Expr<'g> {
        self.graph().node(Ema::new(period), [self])
    }

    fn ema_weighted(self, weight: f64) -> Expr<'g> {
        self.graph().node(Ema::with_weight(weight), [self])
    }

    fn wma(self, period: usize) -> Expr<'g> {
        self.graph().node(Wma::new(period), [self])
    }

    fn variance(self, period: usize) -> Expr<'g> {
        self.graph().node(MovingVariance::new(period), [self])
    }

    fn stddev(self, period: usize) -> Expr<'g> {
        self.graph().node(StdDev::new(period), [self])
    }

    fn rsi(self, period: usize) -> Expr<'g> {
        self.graph().node(Rsi::new(period), [self])
    }

    fn aging(self) -> Expr<'g> {
        self.graph().node(Aging, [self])
    }

    fn rolling_min(self, period: usize) -> Expr<'g> {
        self.graph().node(HistoricalExtremes::new(period, Extreme::Min), [self])
    }

    fn rolling_max(self, period: usize) -> Expr<'g> {
        self.graph().node(HistoricalExtremes::new(period, Extreme::Max), [self])
    }

    fn rolling_median(self, period: usize) -> Expr<'g> {
        self.graph().node(HistoricalExtremes::new(period, Extreme::Median), [self])
    }

    fn bollinger_bands(self, period: usize, std_dev_multiplier: f64) -> BollingerBands<'g> {
        bollinger_bands(self, period, std_dev_multiplier)
    }

    fn macd(self, fast: usize, slow: usize, signal: usize) -> Macd<'g> {
        macd(self, fast, slow, signal)
    }
}

//! Built-in indicator nodes.
//!
//! Every indicator here is written purely against the node contract in
//! `tickgraph-core`:
//! - Moving averages (SMA, EMA, WMA)
//! - Momentum indicators (RSI, MACD, Stochastic, Aging)
//! - Volatility indicators (variance, standard deviation, Bollinger Bands)
//! - Rolling order statistics (min, max, median)
//! - Signal-driven strategies with isolated positions and exit conditions
//!
//! Composite indicators such as Bollinger Bands and MACD are plain
//! expressions over the single-output nodes.

pub mod exit;
pub mod ext;
pub mod momentum;
pub mod moving_average;
pub mod position;
pub mod statistical;
pub mod strategy;
pub mod volatility;

pub use exit::{ExitCondition, ExitRule, TakeProfit, TrailingStop};
pub use ext::IndicatorExt;
pub use momentum::{macd, stochastic, Aging, Macd, Rsi, Stochastic, StochasticK};
pub use moving_average::{Ema, Sma, Wma};
pub use position::{IsolatedPosition, Side};
pub use statistical::{Extreme, HistoricalExtremes};
pub use strategy::{strategy, Strategy, StrategyConfig, StrategyLines, StrategyMetric};
pub use volatility::{bollinger_bands, BollingerBands, MovingVariance, StdDev};

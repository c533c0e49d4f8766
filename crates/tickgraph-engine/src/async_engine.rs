//! Asynchronous evaluation entry point.

use crate::compile::CompiledGraph;
use crate::driver::{Driver, Item};
use crate::evaluator::EvaluationStats;
use crate::graph::IndicatorGraph;
use crate::policy::EngineConfig;
use futures::future::BoxFuture;
use futures::stream::{FusedStream, Stream};
use futures::FutureExt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tickgraph_core::error::EngineError;
use tickgraph_core::types::NodeId;

/// Evaluate `roots` over `graph`, awaiting asynchronous sources.
///
/// Sync and async sources may be mixed. Nothing is fetched until the stream
/// is polled, and only one tick is in flight at a time.
pub fn generate_async<S, N>(
    graph: IndicatorGraph,
    roots: impl IntoIterator<Item = (S, N)>,
) -> Result<AsyncTicks, EngineError>
where
    S: Into<String>,
    N: Into<NodeId>,
{
    generate_async_with(graph, roots, EngineConfig::default())
}

pub fn generate_async_with<S, N>(
    graph: IndicatorGraph,
    roots: impl IntoIterator<Item = (S, N)>,
    config: EngineConfig,
) -> Result<AsyncTicks, EngineError>
where
    S: Into<String>,
    N: Into<NodeId>,
{
    let driver = Driver::new(graph, roots, config)?;
    Ok(AsyncTicks {
        compiled: driver.compiled().clone(),
        stats: driver.stats(),
        driver: Some(driver),
        in_flight: None,
    })
}

/// Records of an asynchronous evaluation.
pub struct AsyncTicks {
    compiled: CompiledGraph,
    /// Idle driver; `None` while a fetch is in flight or once finished.
    driver: Option<Driver>,
    in_flight: Option<BoxFuture<'static, (Driver, Option<Item>)>>,
    stats: EvaluationStats,
}

impl AsyncTicks {
    pub fn compiled(&self) -> &CompiledGraph {
        &self.compiled
    }

    /// Stats as of the last completed tick.
    pub fn stats(&self) -> EvaluationStats {
        match &self.driver {
            Some(driver) => driver.stats(),
            None => self.stats.clone(),
        }
    }

    /// Window fill of `node`; `None` while a tick is in flight or after the
    /// stream has ended.
    pub fn window_len(&self, node: NodeId) -> Option<usize> {
        self.driver.as_ref().and_then(|driver| driver.window_len(node))
    }
}

impl Stream for AsyncTicks {
    type Item = Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.in_flight.is_none() {
            let Some(mut driver) = this.driver.take() else {
                return Poll::Ready(None);
            };
            this.in_flight = Some(
                async move {
                    let item = driver.next_async().await;
                    (driver, item)
                }
                .boxed(),
            );
        }

        let Some(fetch) = this.in_flight.as_mut() else {
            return Poll::Ready(None);
        };
        match fetch.poll_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready((driver, item)) => {
                this.in_flight = None;
                this.stats = driver.stats();
                // The driver is fused internally; it is dropped on end of stream.
                if item.is_some() {
                    this.driver = Some(driver);
                }
                Poll::Ready(item)
            }
        }
    }
}

impl FusedStream for AsyncTicks {
    fn is_terminated(&self) -> bool {
        self.driver.is_none() && self.in_flight.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tickgraph_core::types::TickRecord;

    #[tokio::test]
    async fn test_two_async_sources() {
        let graph = IndicatorGraph::new();
        let a = graph.raw_stream("a", futures::stream::iter(vec![1.0, 2.0, 3.0])).unwrap();
        let b = graph.raw_stream("b", futures::stream::iter(vec![10.0, 20.0, 30.0])).unwrap();
        let total = a + b;
        let roots = [("total", total.id())];

        let records: Vec<TickRecord> = generate_async(graph, roots)
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;

        let totals: Vec<f64> = records.iter().filter_map(|r| r.value("total")).collect();
        assert_eq!(totals, vec![11.0, 22.0, 33.0]);
    }

    #[tokio::test]
    async fn test_channel_and_iterator_sources() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        let graph = IndicatorGraph::new();
        let live = graph
            .raw_stream("live", tokio_stream::wrappers::ReceiverStream::new(rx))
            .unwrap();
        let base = graph.raw_series("base", vec![100.0, 200.0]).unwrap();
        let spread = live - base;
        let roots = [("spread", spread.id())];

        tokio::spawn(async move {
            for value in [101.0, 205.0] {
                tx.send(value).await.unwrap();
            }
        });

        let records: Vec<TickRecord> = generate_async(graph, roots)
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;
        let spreads: Vec<f64> = records.iter().filter_map(|r| r.value("spread")).collect();
        assert_eq!(spreads, vec![1.0, 5.0]);
    }

    #[tokio::test]
    async fn test_async_desync_is_terminal() {
        let graph = IndicatorGraph::new();
        let a = graph.raw_stream("a", futures::stream::iter(vec![1.0, 2.0, 3.0])).unwrap();
        let b = graph.raw_series("b", (0..5).map(f64::from)).unwrap();
        let roots = [("a", a.id()), ("b", b.id())];

        let mut ticks = generate_async(graph, roots).unwrap();
        for _ in 0..3 {
            assert!(ticks.next().await.unwrap().is_ok());
        }
        assert!(matches!(
            ticks.next().await,
            Some(Err(EngineError::StreamDesync { tick: 3, .. }))
        ));
        assert!(ticks.next().await.is_none());
        assert!(ticks.is_terminated());
        assert_eq!(ticks.stats().ticks, 3);
    }

    #[tokio::test]
    async fn test_matches_sync_engine() {
        let build = || {
            let graph = IndicatorGraph::new();
            let x = graph.raw_series("x", (0..50).map(|i| f64::from(i).cos())).unwrap();
            let y = (x - x.lag(4)).abs();
            let roots = [("x", x.id()), ("y", y.id())];
            (graph, roots)
        };

        let (graph, roots) = build();
        let sync: Vec<TickRecord> = crate::generate_sync(graph, roots).unwrap().map(Result::unwrap).collect();
        let (graph, roots) = build();
        let from_async: Vec<TickRecord> = generate_async(graph, roots)
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(sync, from_async);
    }

    #[tokio::test]
    async fn test_stream_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let graph = IndicatorGraph::new();
        let x = graph.raw_series("x", vec![1.0]).unwrap();
        let roots = [("x", x.id())];
        let ticks = generate_async(graph, roots).unwrap();
        assert_send(&ticks);

        let handle = tokio::spawn(async move { ticks.count().await });
        assert_eq!(handle.await.unwrap(), 1);
    }
}

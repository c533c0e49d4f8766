//! Asynchronous tick sources backed by tokio primitives.

use async_trait::async_trait;
use std::time::Duration;
use tickgraph_core::traits::AsyncTickSource;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

/// Receiving end of a tick channel. Ends once every sender is dropped and
/// the buffer is drained.
#[derive(Debug)]
pub struct ChannelSource {
    stream: ReceiverStream<f64>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<f64>) -> Self {
        Self {
            stream: ReceiverStream::new(receiver),
        }
    }
}

#[async_trait]
impl AsyncTickSource for ChannelSource {
    async fn next_tick(&mut self) -> Option<f64> {
        self.stream.next().await
    }
}

/// Create a bounded tick channel.
pub fn channel(buffer: usize) -> (mpsc::Sender<f64>, ChannelSource) {
    let (tx, rx) = mpsc::channel(buffer);
    (tx, ChannelSource::new(rx))
}

/// Emits one value per timer period. The first value is immediate.
#[derive(Debug)]
pub struct IntervalSeries {
    values: std::vec::IntoIter<f64>,
    timer: Interval,
}

#[async_trait]
impl AsyncTickSource for IntervalSeries {
    async fn next_tick(&mut self) -> Option<f64> {
        let value = self.values.next()?;
        self.timer.tick().await;
        Some(value)
    }
}

/// Replay `values` at a fixed cadence.
///
/// Must be called from within a tokio runtime.
pub fn interval_series(values: impl IntoIterator<Item = f64>, period: Duration) -> IntervalSeries {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    IntervalSeries {
        values: values.into_iter().collect::<Vec<_>>().into_iter(),
        timer,
    }
}

//! Raw tick source trait definitions.

use async_trait::async_trait;
use futures::{Stream, StreamExt};

/// Blocking, pull-based raw stream. `None` marks the end of the stream.
pub trait TickSource: Send {
    /// Pull the next raw value.
    fn next_tick(&mut self) -> Option<f64>;
}

/// Pull-based raw stream whose fetch may suspend.
///
/// The engine keeps at most one outstanding `next_tick` per source.
#[async_trait]
pub trait AsyncTickSource: Send {
    /// Pull the next raw value.
    async fn next_tick(&mut self) -> Option<f64>;
}

/// Adapts any `Iterator<Item = f64>` into a [`TickSource`].
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    iter: I,
}

impl<I: Iterator<Item = f64>> IterSource<I> {
    pub fn new(values: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: values.into_iter(),
        }
    }
}

impl<I> TickSource for IterSource<I>
where
    I: Iterator<Item = f64> + Send,
{
    fn next_tick(&mut self) -> Option<f64> {
        self.iter.next()
    }
}

/// Adapts any `Stream<Item = f64>` into an [`AsyncTickSource`].
#[derive(Debug)]
pub struct StreamSource<S> {
    stream: S,
}

impl<S: Stream<Item = f64> + Unpin> StreamSource<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> AsyncTickSource for StreamSource<S>
where
    S: Stream<Item = f64> + Unpin + Send,
{
    async fn next_tick(&mut self) -> Option<f64> {
        self.stream.next().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_source() {
        let mut source = IterSource::new((0..3).map(f64::from));

        assert_eq!(source.next_tick(), Some(0.0));
        assert_eq!(source.next_tick(), Some(1.0));
        assert_eq!(source.next_tick(), Some(2.0));
        assert_eq!(source.next_tick(), None);
    }

    #[tokio::test]
    async fn test_stream_source() {
        let mut source = StreamSource::new(futures::stream::iter(vec![1.5, 2.5]));

        assert_eq!(source.next_tick().await, Some(1.5));
        assert_eq!(source.next_tick().await, Some(2.5));
        assert_eq!(source.next_tick().await, None);
    }
}

//! Per-tick fetching of raw source values.

use crate::graph::SourceHandle;
use std::collections::BTreeMap;
use tickgraph_core::error::EngineError;

/// Outcome of fetching one tick from every source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fetch {
    /// One value per source, in tag order.
    Tick(Vec<f64>),
    /// Every source ended on the same tick.
    Exhausted,
    /// Some sources ended while others still yielded.
    Desync { exhausted: Vec<String>, live: Vec<String> },
}

/// The sources a compiled graph reads, ordered by tag.
pub(crate) struct SourceSet {
    tags: Vec<String>,
    handles: Vec<SourceHandle>,
}

impl SourceSet {
    /// Keep only the sources named in `used`; the rest are dropped.
    pub fn select<'a>(mut all: BTreeMap<String, SourceHandle>, used: impl IntoIterator<Item = &'a String>) -> Self {
        let mut tags = Vec::new();
        let mut handles = Vec::new();
        for tag in used {
            if let Some(handle) = all.remove(tag) {
                tags.push(tag.clone());
                handles.push(handle);
            }
        }
        Self { tags, handles }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Fail if any source would need to suspend.
    pub fn ensure_sync(&self) -> Result<(), EngineError> {
        match self.tags.iter().zip(&self.handles).find(|(_, handle)| handle.is_async()) {
            Some((tag, _)) => Err(EngineError::AsyncSourceInSyncEngine { tag: tag.clone() }),
            None => Ok(()),
        }
    }

    /// Pull one value from every source without suspending.
    ///
    /// Async sources are never polled here; `ensure_sync` rules them out.
    pub fn fetch_sync(&mut self) -> Fetch {
        let pulled: Vec<Option<f64>> = self
            .handles
            .iter_mut()
            .map(|handle| match handle {
                SourceHandle::Sync(source) => source.next_tick(),
                SourceHandle::Async(_) => None,
            })
            .collect();
        self.classify(pulled)
    }

    /// Pull one value from every source, awaiting all async sources
    /// concurrently. Each source has at most one fetch in flight.
    pub async fn fetch_async(&mut self) -> Fetch {
        let pulled = futures::future::join_all(self.handles.iter_mut().map(|handle| async move {
            match handle {
                SourceHandle::Sync(source) => source.next_tick(),
                SourceHandle::Async(source) => source.next_tick().await,
            }
        }))
        .await;
        self.classify(pulled)
    }

    fn classify(&self, pulled: Vec<Option<f64>>) -> Fetch {
        if pulled.iter().all(Option::is_some) {
            if pulled.is_empty() {
                return Fetch::Exhausted;
            }
            return Fetch::Tick(pulled.into_iter().flatten().collect());
        }
        if pulled.iter().all(Option::is_none) {
            return Fetch::Exhausted;
        }

        let mut exhausted = Vec::new();
        let mut live = Vec::new();
        for (tag, value) in self.tags.iter().zip(&pulled) {
            match value {
                Some(_) => live.push(tag.clone()),
                None => exhausted.push(tag.clone()),
            }
        }
        Fetch::Desync { exhausted, live }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickgraph_core::traits::{IterSource, StreamSource};

    fn sync_set(sources: Vec<(&str, Vec<f64>)>) -> SourceSet {
        let all: BTreeMap<String, SourceHandle> = sources
            .into_iter()
            .map(|(tag, values)| (tag.to_string(), SourceHandle::Sync(Box::new(IterSource::new(values)))))
            .collect();
        let used: Vec<String> = all.keys().cloned().collect();
        SourceSet::select(all, &used)
    }

    #[test]
    fn test_fetch_in_tag_order() {
        let mut set = sync_set(vec![("b", vec![2.0]), ("a", vec![1.0])]);
        assert_eq!(set.tags(), &["a".to_string(), "b".to_string()]);
        assert_eq!(set.fetch_sync(), Fetch::Tick(vec![1.0, 2.0]));
        assert_eq!(set.fetch_sync(), Fetch::Exhausted);
    }

    #[test]
    fn test_desync_reports_tags() {
        let mut set = sync_set(vec![("long", vec![1.0, 2.0]), ("short", vec![1.0])]);
        assert!(matches!(set.fetch_sync(), Fetch::Tick(_)));
        assert_eq!(
            set.fetch_sync(),
            Fetch::Desync {
                exhausted: vec!["short".to_string()],
                live: vec!["long".to_string()],
            }
        );
    }

    #[test]
    fn test_no_sources_is_exhausted() {
        let mut set = sync_set(vec![]);
        assert_eq!(set.len(), 0);
        assert_eq!(set.fetch_sync(), Fetch::Exhausted);
    }

    #[test]
    fn test_unused_sources_dropped() {
        let mut all = BTreeMap::new();
        all.insert("x".to_string(), SourceHandle::Sync(Box::new(IterSource::new(vec![1.0]))));
        all.insert("y".to_string(), SourceHandle::Sync(Box::new(IterSource::new(vec![1.0]))));
        let set = SourceSet::select(all, &["y".to_string()]);
        assert_eq!(set.tags(), &["y".to_string()]);
    }

    #[test]
    fn test_ensure_sync_rejects_async() {
        let mut all = BTreeMap::new();
        all.insert(
            "feed".to_string(),
            SourceHandle::Async(Box::new(StreamSource::new(futures::stream::iter(vec![1.0])))),
        );
        let set = SourceSet::select(all, &["feed".to_string()]);
        assert_eq!(
            set.ensure_sync(),
            Err(EngineError::AsyncSourceInSyncEngine { tag: "feed".to_string() })
        );
    }

    #[tokio::test]
    async fn test_fetch_async_mixes_sources() {
        let mut all = BTreeMap::new();
        all.insert(
            "a".to_string(),
            SourceHandle::Async(Box::new(StreamSource::new(futures::stream::iter(vec![1.0, 2.0])))),
        );
        all.insert("b".to_string(), SourceHandle::Sync(Box::new(IterSource::new(vec![10.0, 20.0]))));
        let used: Vec<String> = all.keys().cloned().collect();
        let mut set = SourceSet::select(all, &used);

        assert_eq!(set.fetch_async().await, Fetch::Tick(vec![1.0, 10.0]));
        assert_eq!(set.fetch_async().await, Fetch::Tick(vec![2.0, 20.0]));
        assert_eq!(set.fetch_async().await, Fetch::Exhausted);
    }
}

//! Bounded sliding window of past node outputs.

use std::collections::VecDeque;

/// Per-node history buffer.
///
/// Capacity is fixed when the graph is compiled. A window with capacity 0
/// stores nothing; the node's latest value is only forwarded for the current
/// tick.
#[derive(Debug, Clone, Default)]
pub struct Window {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Window {
    /// Create a window holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest once at capacity.
    #[inline]
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Value `back` steps from the newest (0 = newest).
    #[inline]
    pub fn get(&self, back: usize) -> Option<f64> {
        let len = self.values.len();
        if back >= len {
            return None;
        }
        self.values.get(len - 1 - back).copied()
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + '_ {
        self.values.iter().copied()
    }

    /// The newest `n` values, oldest first.
    pub fn last_n(&self, n: usize) -> impl DoubleEndedIterator<Item = f64> + '_ {
        let start = self.values.len().saturating_sub(n);
        self.values.iter().skip(start).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = Window::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            window.push(v);
        }

        assert_eq!(window.len(), 3);
        assert!(window.is_full());
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(window.get(0), Some(4.0));
        assert_eq!(window.get(2), Some(2.0));
        assert_eq!(window.get(3), None);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut window = Window::new(0);
        window.push(1.0);
        window.push(2.0);

        assert!(window.is_empty());
        assert_eq!(window.get(0), None);
    }

    #[test]
    fn test_last_n() {
        let mut window = Window::new(5);
        for v in 1..=5 {
            window.push(v as f64);
        }

        assert_eq!(window.last_n(2).collect::<Vec<_>>(), vec![4.0, 5.0]);
        assert_eq!(window.last_n(10).count(), 5);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut window = Window::new(4);
        for i in 0..10_000 {
            window.push(i as f64);
            assert!(window.len() <= window.capacity());
        }
        assert_eq!(window.get(0), Some(9_999.0));
    }
}

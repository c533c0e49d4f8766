//! Read-only views handed to a node's `compute`.

use crate::error::NodeError;
use crate::types::Window;
use smallvec::SmallVec;

/// Prior values of a node, truncated to what the reader asked for.
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    window: Option<&'a Window>,
    limit: usize,
}

impl<'a> History<'a> {
    /// View at most `limit` of the newest values in `window`.
    pub fn new(window: &'a Window, limit: usize) -> Self {
        Self {
            window: Some(window),
            limit,
        }
    }

    /// A history with no values.
    pub fn empty() -> Self {
        Self {
            window: None,
            limit: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.window.map_or(0, |w| w.len().min(self.limit))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prior value `back` steps before the current tick (0 = previous tick).
    #[inline]
    pub fn get(&self, back: usize) -> Option<f64> {
        if back >= self.len() {
            return None;
        }
        self.window.and_then(|w| w.get(back))
    }

    /// Most recent prior value.
    #[inline]
    pub fn latest(&self) -> Option<f64> {
        self.get(0)
    }

    /// Oldest value that is still visible, i.e. the one leaving the view next.
    #[inline]
    pub fn oldest(&self) -> Option<f64> {
        match self.len() {
            0 => None,
            n => self.get(n - 1),
        }
    }

    /// Prior values, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = f64> + 'a {
        let len = self.len();
        self.window.into_iter().flat_map(move |w| w.last_n(len))
    }
}

/// One dependency as seen by its consumer: the current tick's value plus up
/// to the consumer's lookback of prior values.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    current: f64,
    history: History<'a>,
}

impl<'a> Series<'a> {
    pub fn new(current: f64, history: History<'a>) -> Self {
        Self { current, history }
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Value `back` ticks ago (0 = current tick).
    #[inline]
    pub fn get(&self, back: usize) -> Option<f64> {
        if back == 0 {
            Some(self.current)
        } else {
            self.history.get(back - 1)
        }
    }

    #[inline]
    pub fn history(&self) -> &History<'a> {
        &self.history
    }

    /// Number of visible values including the current one.
    #[inline]
    pub fn len(&self) -> usize {
        self.history.len() + 1
    }

    /// A series always carries its current value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All visible values, oldest first, ending with the current one.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = f64> + 'a {
        self.history.iter().chain(std::iter::once(self.current))
    }

    /// Fail with `InsufficientHistory` unless `prior` past values are visible.
    pub fn require(&self, prior: usize) -> Result<(), NodeError> {
        if self.history.len() < prior {
            return Err(NodeError::InsufficientHistory {
                required: prior + 1,
                available: self.len(),
            });
        }
        Ok(())
    }
}

/// Everything a node sees on one tick.
#[derive(Debug, Clone)]
pub struct Inputs<'a> {
    args: SmallVec<[Series<'a>; 4]>,
    own: History<'a>,
}

impl<'a> Inputs<'a> {
    pub fn new(args: impl IntoIterator<Item = Series<'a>>, own: History<'a>) -> Self {
        Self {
            args: args.into_iter().collect(),
            own,
        }
    }

    /// Argument at `position`, in the order the node was built with.
    ///
    /// # Panics
    /// Panics if `position` is out of range. Nodes are always called with
    /// the operands they were constructed from.
    #[inline]
    pub fn arg(&self, position: usize) -> &Series<'a> {
        &self.args[position]
    }

    #[inline]
    pub fn args(&self) -> &[Series<'a>] {
        &self.args
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Current values of all arguments.
    pub fn currents(&self) -> impl Iterator<Item = f64> + '_ {
        self.args.iter().map(Series::current)
    }

    /// The node's own prior outputs.
    #[inline]
    pub fn own(&self) -> &History<'a> {
        &self.own
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(values: &[f64], capacity: usize) -> Window {
        let mut window = Window::new(capacity);
        for &v in values {
            window.push(v);
        }
        window
    }

    #[test]
    fn test_history_truncated_to_limit() {
        let window = window_of(&[1.0, 2.0, 3.0, 4.0], 4);
        let history = History::new(&window, 2);

        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![3.0, 4.0]);
        assert_eq!(history.latest(), Some(4.0));
        assert_eq!(history.oldest(), Some(3.0));
        assert_eq!(history.get(2), None);
    }

    #[test]
    fn test_series_indexing() {
        let window = window_of(&[1.0, 2.0], 2);
        let series = Series::new(3.0, History::new(&window, 2));

        assert_eq!(series.get(0), Some(3.0));
        assert_eq!(series.get(1), Some(2.0));
        assert_eq!(series.get(2), Some(1.0));
        assert_eq!(series.get(3), None);
        assert_eq!(series.values().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_series_require() {
        let window = window_of(&[1.0], 3);
        let series = Series::new(2.0, History::new(&window, 3));

        assert!(series.require(1).is_ok());
        assert_eq!(
            series.require(2),
            Err(NodeError::InsufficientHistory {
                required: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_inputs() {
        let inputs = Inputs::new(
            [
                Series::new(1.0, History::empty()),
                Series::new(2.0, History::empty()),
            ],
            History::empty(),
        );

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.arg(1).current(), 2.0);
        assert_eq!(inputs.currents().sum::<f64>(), 3.0);
        assert!(inputs.own().is_empty());
    }
}

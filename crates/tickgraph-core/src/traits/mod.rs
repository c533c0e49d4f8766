//! Core traits for indicator graphs.

mod indicator;
mod source;

pub use indicator::{from_fn, FnIndicator, Indicator};
pub use source::{AsyncTickSource, IterSource, StreamSource, TickSource};

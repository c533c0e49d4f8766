//! Raw tick sources.
//!
//! - [`CsvColumn`]: one numeric column of a CSV file, as a blocking source
//! - [`ChannelSource`]: values pushed through a tokio channel
//! - [`interval_series`]: values replayed on a timer

mod channel;
mod csv_source;

pub use channel::{channel, interval_series, ChannelSource, IntervalSeries};
pub use csv_source::CsvColumn;

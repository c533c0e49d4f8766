//! Core data types for indicator graphs.

mod node_id;
mod record;
mod series;
mod window;

pub use node_id::NodeId;
pub use record::{NodeFault, RootOutput, TickRecord};
pub use series::{History, Inputs, Series};
pub use window::Window;

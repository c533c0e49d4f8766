//! Expression builder, dependency graph and execution engines.
//!
//! Indicator graphs are built in an [`IndicatorGraph`] arena through
//! [`Expr`] handles and operator overloading, compiled into a
//! [`CompiledGraph`] with a deterministic evaluation order, and driven one
//! tick at a time by [`generate_sync`] or [`generate_async`].
//!
//! ```no_run
//! use tickgraph_engine::{generate_sync, IndicatorGraph};
//!
//! let graph = IndicatorGraph::new();
//! let x = graph.raw_series("x", (0..5).map(f64::from)).unwrap();
//! let y = x * 2 + 50;
//! let roots = [("x", x.id()), ("y", y.id())];
//!
//! for record in generate_sync(graph, roots).unwrap() {
//!     println!("{:?}", record.unwrap());
//! }
//! ```

mod async_engine;
mod compile;
mod driver;
mod evaluator;
mod expr;
mod graph;
pub mod operators;
mod policy;
mod sources;
mod sync_engine;

pub use async_engine::{generate_async, generate_async_with, AsyncTicks};
pub use compile::CompiledGraph;
pub use evaluator::EvaluationStats;
pub use expr::{Expr, Operand};
pub use graph::IndicatorGraph;
pub use policy::{EngineConfig, ErrorPolicy, WarmupPolicy};
pub use sync_engine::{generate_sync, generate_sync_with, SyncTicks};

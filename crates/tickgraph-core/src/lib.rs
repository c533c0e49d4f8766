//! Core types and traits for indicator graphs.
//!
//! This crate provides the foundational building blocks including:
//! - Node identity and the bounded window store (NodeId, Window)
//! - Per-tick input views handed to nodes (Inputs, Series, History)
//! - Output records produced by the engines (TickRecord, RootOutput)
//! - Core traits for indicator nodes and raw tick sources
//! - The error taxonomy shared by every crate in the workspace

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TickGraphError, TickGraphResult};
pub use types::*;
pub use traits::*;

//! Runtime layer: adapter registry, tool dispatch, and outcome reporting.
//!
//! The runtime sits between the protocol surface and the individual service
//! adapters.  It owns the set of registered adapters, exposes their combined
//! tool catalog, routes each tool call to the owning adapter, and normalizes
//! results into a uniform JSON shape.

pub mod error;
pub mod outcome;
pub mod registry;

pub use error::{Result, RuntimeError};
pub use registry::{AdapterInfo, ToolRegistry};

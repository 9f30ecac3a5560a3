//! Tool adapters over third-party web services.
//!
//! Each adapter implements the [`Adapter`] trait: a small lifecycle
//! (connect, disconnect, health check) plus a catalog of named tools with
//! JSON-Schema parameter descriptions, executed against the remote service
//! over HTTP.  Configuration is resolved once at construction, so a missing
//! credential surfaces as a typed [`AdapterError::ConfigMissing`] before any
//! network traffic happens.

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod search;
pub mod traits;
pub mod weather;
pub mod workflow;

pub use chat::{ChatAdapter, ChatConfig};
pub use client::{RemoteClient, RemoteRequest};
pub use error::{AdapterError, Result};
pub use image::{ImageAdapter, ImageConfig};
pub use search::{SearchAdapter, SearchConfig};
pub use traits::{Adapter, AdapterType, HealthStatus, ToolDefinition};
pub use weather::{WeatherAdapter, WeatherConfig};
pub use workflow::{WorkflowAdapter, WorkflowConfig};

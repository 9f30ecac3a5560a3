//! MCP JSON-RPC server exposing the registered tool adapters over HTTP.

pub mod mcp;
pub mod server;

pub use server::{router, serve, ServerConfig};

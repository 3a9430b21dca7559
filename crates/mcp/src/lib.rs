//! Bookeo MCP (Model Context Protocol) Server
//!
//! This crate exposes read-only Bookeo booking lookups as MCP tools so agents
//! can search bookings, fetch one booking and inspect its payments.
//!
//! ## Architecture
//!
//! - `BookeoMcpServer`: tool router and `ServerHandler` over [`bookeo_core::BookingQueries`]
//! - `records`: output shapes returned by the tools
//! - `transport`: stdio and streamable HTTP (with `/health`)
//!
//! ## Example Usage
//!
//! ```no_run
//! use bookeo_core::config::{AppConfig, LoadOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(LoadOptions::default())?;
//!     let server = bookeo_mcp::build_server(&config)?;
//!     bookeo_mcp::transport::run_stdio(server).await
//! }
//! ```

mod bootstrap;
mod error;
pub mod health;
pub mod records;
mod server;
pub mod tools;
pub mod transport;

pub use bootstrap::build_server;
pub use error::ToolError;
pub use server::{BookeoMcpServer, BookingNumberInput, CustomerSearchInput, DateSearchInput};
pub use tools::*;

//! HTTP client for the Bookeo v2 REST API.
//!
//! [`BookeoClient`] implements [`bookeo_core::BookingSource`]. It splits date
//! windows into provider-sized chunks, follows pagination and maps upstream
//! status codes onto [`bookeo_core::SourceError`].

pub mod client;
mod wire;

pub use client::{BookeoClient, ClientBuildError, MAX_CHUNK_DAYS};

use std::sync::Arc;

use anyhow::{Context, Result};
use bookeo_client::BookeoClient;
use bookeo_core::clock::SystemClock;
use bookeo_core::config::AppConfig;
use bookeo_core::payments::PaymentClassifier;
use bookeo_core::query::BookingQueries;
use tracing::info;

use crate::server::BookeoMcpServer;

/// Wires the upstream client, clock and classifier from a validated config.
pub fn build_server(config: &AppConfig) -> Result<BookeoMcpServer> {
    let client = BookeoClient::new(&config.bookeo).context("failed to build bookeo client")?;
    let clock = SystemClock::new(client.timezone());
    let classifier = PaymentClassifier::new(&config.payments.card_processor_tokens);

    let queries = BookingQueries::new(Arc::new(client), Arc::new(clock), classifier);

    info!(
        event_name = "system.bootstrap.complete",
        base_url = %config.bookeo.base_url,
        timezone = %config.bookeo.timezone,
        card_processor_tokens = ?config.payments.card_processor_tokens,
        "bookeo MCP server wired"
    );
    Ok(BookeoMcpServer::new(Arc::new(queries)))
}

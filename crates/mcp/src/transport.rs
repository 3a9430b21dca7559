use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use rmcp::ServiceExt;
use tracing::info;

use crate::health;
use crate::server::BookeoMcpServer;

/// Serves MCP over stdin/stdout until the client disconnects.
pub async fn run_stdio(server: BookeoMcpServer) -> Result<()> {
    info!(event_name = "mcp.transport.start", transport = "stdio", "starting MCP server");

    let service = server.serve(stdio()).await?;
    let reason = service.waiting().await?;

    info!(event_name = "mcp.transport.stop", transport = "stdio", reason = ?reason, "MCP server shutdown complete");
    Ok(())
}

/// Serves streamable HTTP at `/mcp` and liveness at `/health` until Ctrl-C.
pub async fn run_http(server: BookeoMcpServer, bind_address: &str, port: u16) -> Result<()> {
    let address = format!("{bind_address}:{port}");
    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let app = health::router().nest_service("/mcp", mcp_service);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "mcp.transport.start",
        transport = "http",
        bind_address = %address,
        "starting MCP server"
    );

    axum::serve(listener, app).with_graceful_shutdown(wait_for_shutdown()).await?;

    info!(event_name = "mcp.transport.stop", transport = "http", "MCP server shutdown complete");
    Ok(())
}

async fn wait_for_shutdown() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

//! MCP Server Implementation
//!
//! Implements the Model Context Protocol tool surface over [`BookingQueries`].

use std::sync::Arc;

use bookeo_core::errors::{ErrorKind, QueryError};
use bookeo_core::query::{
    BookingQueries, CustomerSearch, DateSearch, DEFAULT_DAYS_BACK, MAX_DAYS_BACK,
};
use rmcp::{
    handler::server::{
        common::cached_schema_for_type, router::tool::ToolRouter, wrapper::Parameters,
    },
    model::*,
    schemars::{self, JsonSchema},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ToolError;
use crate::records::{BookingDetail, BookingSearchResult};
use crate::tools;

const INSTRUCTIONS: &str = "Bookeo booking lookup (read-only). \
    search_bookings_by_customer finds recent bookings by customer name or email fragment. \
    get_booking returns one booking by number. \
    search_bookings_by_date lists bookings between two YYYY-MM-DD dates. \
    get_booking_payments lists payments with manual vs card-processor labels and the total paid. \
    Failures come back as {\"error\": {kind, message, retryable, correlation_id}}.";

/// Main MCP server for Bookeo
#[derive(Clone)]
pub struct BookeoMcpServer {
    queries: Arc<BookingQueries>,
    tool_router: ToolRouter<Self>,
}

impl BookeoMcpServer {
    pub fn new(queries: Arc<BookingQueries>) -> Self {
        Self { queries, tool_router: Self::tool_router() }
    }

    /// Names of the registered tools, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router.list_all().into_iter().map(|tool| tool.name.to_string()).collect()
    }
}

// ============================================================================
// Tool inputs
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CustomerSearchInput {
    #[schemars(description = "Full or partial customer name to search for (case-insensitive)")]
    #[serde(default)]
    pub customer_name: Option<String>,

    #[schemars(description = "Full or partial email address to search for (case-insensitive)")]
    #[serde(default)]
    pub customer_email: Option<String>,

    #[schemars(
        description = "How many days back to search (default 90, max 365)",
        range(min = 0, max = 365)
    )]
    #[serde(default = "default_days_back")]
    pub days_back: Option<i64>,
}

fn default_days_back() -> Option<i64> {
    Some(i64::from(DEFAULT_DAYS_BACK))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BookingNumberInput {
    #[schemars(description = "The Bookeo booking number, e.g. \"123456789\"")]
    pub booking_number: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DateSearchInput {
    #[schemars(description = "Start date in YYYY-MM-DD format (inclusive)")]
    pub start_date: String,

    #[schemars(description = "End date in YYYY-MM-DD format (inclusive)")]
    pub end_date: String,

    #[schemars(description = "Whether to include canceled bookings (default false)")]
    #[serde(default)]
    pub include_canceled: bool,
}

// ============================================================================
// Tools
// ============================================================================

// Malformed arguments are reported as structured validation errors, never as protocol faults.
#[tool_router]
impl BookeoMcpServer {
    #[tool(
        name = "search_bookings_by_customer",
        description = "Search recent bookings by customer name or email. Matching is a case-insensitive substring match; canceled bookings are excluded.",
        input_schema = cached_schema_for_type::<CustomerSearchInput>()
    )]
    pub async fn search_bookings_by_customer(
        &self,
        Parameters(arguments): Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let tool = tools::SEARCH_BOOKINGS_BY_CUSTOMER;
        let input: CustomerSearchInput = match parse_arguments(tool, arguments) {
            Ok(input) => input,
            Err(error) => return Ok(error.into_call_tool_result()),
        };
        debug!(event_name = "mcp.tool.called", tool, days_back = ?input.days_back, "tool called");

        let days_back = match input.days_back.map(u32::try_from).transpose() {
            Ok(days_back) => days_back,
            Err(_) => {
                return Ok(ToolError::new(
                    ErrorKind::Validation,
                    format!("days_back must be between 0 and {MAX_DAYS_BACK}"),
                    false,
                )
                .into_call_tool_result())
            }
        };

        let search = CustomerSearch {
            customer_name: input.customer_name,
            customer_email: input.customer_email,
            days_back,
        };
        let outcome =
            self.queries.search_by_customer(search).await.map(BookingSearchResult::from);
        Ok(render(tool, outcome))
    }

    #[tool(
        name = "get_booking",
        description = "Look up a single booking by its booking number. Returns customer, pricing and product details.",
        input_schema = cached_schema_for_type::<BookingNumberInput>()
    )]
    pub async fn get_booking(
        &self,
        Parameters(arguments): Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let tool = tools::GET_BOOKING;
        let input: BookingNumberInput = match parse_arguments(tool, arguments) {
            Ok(input) => input,
            Err(error) => return Ok(error.into_call_tool_result()),
        };
        debug!(event_name = "mcp.tool.called", tool, booking_number = %input.booking_number, "tool called");

        let outcome = self.queries.get_booking(&input.booking_number).await.map(BookingDetail::from);
        Ok(render(tool, outcome))
    }

    #[tool(
        name = "search_bookings_by_date",
        description = "List bookings starting between two dates (YYYY-MM-DD, both inclusive, at most 365 days apart).",
        input_schema = cached_schema_for_type::<DateSearchInput>()
    )]
    pub async fn search_bookings_by_date(
        &self,
        Parameters(arguments): Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let tool = tools::SEARCH_BOOKINGS_BY_DATE;
        let input: DateSearchInput = match parse_arguments(tool, arguments) {
            Ok(input) => input,
            Err(error) => return Ok(error.into_call_tool_result()),
        };
        debug!(
            event_name = "mcp.tool.called",
            tool,
            start_date = %input.start_date,
            end_date = %input.end_date,
            include_canceled = input.include_canceled,
            "tool called"
        );

        let search = DateSearch {
            start_date: input.start_date,
            end_date: input.end_date,
            include_canceled: input.include_canceled,
        };
        let outcome = self.queries.search_by_date(search).await.map(BookingSearchResult::from);
        Ok(render(tool, outcome))
    }

    #[tool(
        name = "get_booking_payments",
        description = "Get the payments recorded against a booking, each labeled manual or card-processor, with the total paid.",
        input_schema = cached_schema_for_type::<BookingNumberInput>()
    )]
    pub async fn get_booking_payments(
        &self,
        Parameters(arguments): Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let tool = tools::GET_BOOKING_PAYMENTS;
        let input: BookingNumberInput = match parse_arguments(tool, arguments) {
            Ok(input) => input,
            Err(error) => return Ok(error.into_call_tool_result()),
        };
        debug!(event_name = "mcp.tool.called", tool, booking_number = %input.booking_number, "tool called");

        let outcome = self.queries.get_payments(&input.booking_number).await;
        Ok(render(tool, outcome))
    }
}

#[tool_handler]
impl ServerHandler for BookeoMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "bookeo-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn parse_arguments<T: DeserializeOwned>(
    tool: &str,
    arguments: JsonObject,
) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|error| ToolError::invalid_arguments(tool, &error))
}

fn render<T: Serialize>(tool: &str, outcome: Result<T, QueryError>) -> CallToolResult {
    let value = match outcome {
        Ok(value) => value,
        Err(error) => return ToolError::from_query(tool, &error).into_call_tool_result(),
    };

    match serde_json::to_value(&value) {
        Ok(payload) => {
            info!(event_name = "mcp.tool.completed", tool, "tool call completed");
            CallToolResult::structured(payload)
        }
        Err(error) => ToolError::unexpected(tool, error).into_call_tool_result(),
    }
}

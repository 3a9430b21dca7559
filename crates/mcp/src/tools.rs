//! Tool names exposed by [`crate::BookeoMcpServer`].

pub const SEARCH_BOOKINGS_BY_CUSTOMER: &str = "search_bookings_by_customer";
pub const GET_BOOKING: &str = "get_booking";
pub const SEARCH_BOOKINGS_BY_DATE: &str = "search_bookings_by_date";
pub const GET_BOOKING_PAYMENTS: &str = "get_booking_payments";

/// All tool names
pub const ALL_TOOL_NAMES: &[&str] =
    &[SEARCH_BOOKINGS_BY_CUSTOMER, GET_BOOKING, SEARCH_BOOKINGS_BY_DATE, GET_BOOKING_PAYMENTS];

/// Total number of tools
pub const TOTAL_TOOLS: usize = ALL_TOOL_NAMES.len();

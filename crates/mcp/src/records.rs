//! Output shapes returned by the tools.

use bookeo_core::domain::booking::{Booking, BookingNumber, BookingStatus, PriceBreakdown};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookingSummary {
    pub booking_number: BookingNumber,
    pub status: BookingStatus,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub product_name: Option<String>,
    pub customer: CustomerRecord,
    pub participants: u32,
    pub price: PriceBreakdown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub summary: BookingSummary,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub product_id: Option<String>,
    pub price_adjustments: Vec<Value>,
    pub creation_time: Option<DateTime<FixedOffset>>,
    pub source: Option<Value>,
}

/// Search results are wrapped so structured content is always an object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookingSearchResult {
    pub count: usize,
    pub bookings: Vec<BookingSummary>,
}

impl From<&Booking> for CustomerRecord {
    fn from(booking: &Booking) -> Self {
        Self {
            name: booking.customer.full_name(),
            email: booking.customer.email.clone(),
            phone: booking.customer.phone.clone(),
        }
    }
}

impl From<Booking> for BookingSummary {
    fn from(booking: Booking) -> Self {
        let customer = CustomerRecord::from(&booking);
        Self {
            booking_number: booking.booking_number,
            status: booking.status,
            start_time: booking.start_time,
            product_name: booking.product_name,
            customer,
            participants: booking.participants,
            price: booking.price,
        }
    }
}

impl From<Booking> for BookingDetail {
    fn from(booking: Booking) -> Self {
        let end_time = booking.end_time;
        let product_id = booking.product_id.clone();
        let price_adjustments = booking.price_adjustments.clone();
        let creation_time = booking.creation_time;
        let source = booking.source.clone();
        Self {
            summary: BookingSummary::from(booking),
            end_time,
            product_id,
            price_adjustments,
            creation_time,
            source,
        }
    }
}

impl From<Vec<Booking>> for BookingSearchResult {
    fn from(bookings: Vec<Booking>) -> Self {
        let bookings: Vec<BookingSummary> = bookings.into_iter().map(BookingSummary::from).collect();
        Self { count: bookings.len(), bookings }
    }
}

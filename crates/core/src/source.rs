use async_trait::async_trait;

use crate::domain::booking::Booking;
use crate::domain::payment::PaymentRecord;
use crate::domain::window::DateWindow;
use crate::errors::SourceError;

/// Read-only access to bookings owned by the upstream provider.
#[async_trait]
pub trait BookingSource: Send + Sync {
    /// Every booking starting inside `window`, with pagination already followed.
    async fn list_bookings(
        &self,
        window: DateWindow,
        include_canceled: bool,
    ) -> Result<Vec<Booking>, SourceError>;

    async fn get_booking(&self, booking_number: &str) -> Result<Booking, SourceError>;

    async fn get_payments(&self, booking_number: &str) -> Result<Vec<PaymentRecord>, SourceError>;
}

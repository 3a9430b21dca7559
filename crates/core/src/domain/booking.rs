use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::payment::Money;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingNumber(pub String);

impl BookingNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Canceled,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl Customer {
    /// First and last name joined by a space, trimmed when either is missing.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub total_gross: Option<Money>,
    pub total_paid: Option<Money>,
    pub balance_due: Option<Money>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_number: BookingNumber,
    pub status: BookingStatus,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub creation_time: Option<DateTime<FixedOffset>>,
    pub customer: Customer,
    pub participants: u32,
    pub price: PriceBreakdown,
    /// Provider-shaped adjustment entries, passed through untouched.
    pub price_adjustments: Vec<Value>,
    pub source: Option<Value>,
}

impl Booking {
    pub fn is_canceled(&self) -> bool {
        self.status == BookingStatus::Canceled
    }

    /// Case-insensitive substring match against the customer's full name.
    /// `needle` is expected to be lowercase already.
    pub fn name_contains(&self, needle: &str) -> bool {
        self.customer.full_name().to_lowercase().contains(needle)
    }

    /// Case-insensitive substring match against the customer's email.
    /// `needle` is expected to be lowercase already.
    pub fn email_contains(&self, needle: &str) -> bool {
        self.customer.email.to_lowercase().contains(needle)
    }
}

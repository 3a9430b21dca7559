//! Serde mirrors of the provider payloads and their conversion into domain types.

use bookeo_core::domain::booking::{Booking, BookingNumber, BookingStatus, Customer, PriceBreakdown};
use bookeo_core::domain::payment::{Money, PaymentRecord};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BookingPage {
    #[serde(default)]
    pub data: Vec<WireBooking>,
    #[serde(default)]
    pub info: Option<PageInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Paging {
    #[serde(rename = "nextPageURL")]
    pub next_page_url: Option<String>,
    pub page_navigation_token: Option<String>,
    pub current_page: Option<u32>,
}

/// Token and page number for the next request, when the provider reports one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NextPage {
    pub token: String,
    pub number: u32,
}

impl BookingPage {
    pub fn next_page(&self) -> Option<NextPage> {
        let paging = self.info.as_ref()?.paging.as_ref()?;
        paging.next_page_url.as_deref().filter(|url| !url.trim().is_empty())?;
        let token = paging.page_navigation_token.clone().filter(|token| !token.is_empty())?;
        Some(NextPage { token, number: paging.current_page.unwrap_or(1) + 1 })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBooking {
    pub booking_number: String,
    #[serde(default)]
    pub canceled: bool,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub creation_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub customer: Option<WireCustomer>,
    #[serde(default)]
    pub participants: Option<WireParticipants>,
    #[serde(default)]
    pub price: Option<WirePrice>,
    #[serde(default)]
    pub price_adjustments: Vec<Value>,
    #[serde(default)]
    pub source: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCustomer {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub phone_numbers: Vec<WirePhone>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WirePhone {
    #[serde(default)]
    pub number: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireParticipants {
    #[serde(default)]
    pub numbers: Vec<WireParticipantCount>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireParticipantCount {
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePrice {
    pub total_gross: Option<WireMoney>,
    pub total_paid: Option<WireMoney>,
    pub balance_due: Option<WireMoney>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireMoney {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
}

impl WireMoney {
    fn into_money(self) -> Option<Money> {
        let amount = self.amount?;
        Some(Money::new(amount, self.currency.unwrap_or_default()))
    }
}

impl From<WireBooking> for Booking {
    fn from(wire: WireBooking) -> Self {
        let customer = wire.customer.unwrap_or_default();
        let phone = customer.phone_numbers.into_iter().next().map(|phone| phone.number);
        let price = wire.price.unwrap_or_default();
        let participants = wire
            .participants
            .map(|participants| participants.numbers.iter().map(|count| count.number).sum())
            .unwrap_or(0);

        Booking {
            booking_number: BookingNumber(wire.booking_number),
            status: if wire.canceled { BookingStatus::Canceled } else { BookingStatus::Confirmed },
            product_name: wire.product_name,
            product_id: wire.product_id,
            start_time: wire.start_time,
            end_time: wire.end_time,
            creation_time: wire.creation_time,
            customer: Customer {
                first_name: customer.first_name,
                last_name: customer.last_name,
                email: customer.email_address,
                phone: phone.unwrap_or_default(),
            },
            participants,
            price: PriceBreakdown {
                total_gross: price.total_gross.and_then(WireMoney::into_money),
                total_paid: price.total_paid.and_then(WireMoney::into_money),
                balance_due: price.balance_due.and_then(WireMoney::into_money),
            },
            price_adjustments: wire.price_adjustments,
            source: wire.source,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PaymentList {
    #[serde(default)]
    pub data: Vec<WirePayment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePayment {
    pub id: Option<String>,
    #[serde(default)]
    pub amount: WireMoney,
    pub payment_method: Option<String>,
    pub payment_method_other: Option<String>,
    pub gateway_name: Option<String>,
    pub reason: Option<String>,
    pub agent: Option<String>,
    pub comment: Option<String>,
    pub received_time: Option<DateTime<FixedOffset>>,
}

impl From<WirePayment> for PaymentRecord {
    fn from(wire: WirePayment) -> Self {
        PaymentRecord {
            id: wire.id,
            amount: Money::new(
                wire.amount.amount.unwrap_or(Decimal::ZERO),
                wire.amount.currency.unwrap_or_default(),
            ),
            method: wire
                .payment_method
                .filter(|method| !method.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            method_other: wire.payment_method_other,
            gateway: wire.gateway_name,
            reason: wire.reason,
            agent: wire.agent,
            comment: wire.comment,
            received_time: wire.received_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use bookeo_core::domain::booking::{Booking, BookingStatus};
    use bookeo_core::domain::payment::PaymentRecord;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{BookingPage, NextPage, PaymentList};

    #[test]
    fn booking_payload_maps_to_domain() {
        let page: BookingPage = serde_json::from_value(json!({
            "data": [{
                "bookingNumber": "BK12345",
                "canceled": true,
                "productName": "Sunset Kayak Tour",
                "productId": "P-9",
                "startTime": "2024-03-15T10:00:00-07:00",
                "customer": {
                    "firstName": "Maria",
                    "lastName": "Garcia",
                    "emailAddress": "maria@example.com",
                    "phoneNumbers": [{"number": "555-0100"}, {"number": "555-0199"}]
                },
                "participants": {"numbers": [{"peopleCategoryId": "Cadults", "number": 2}, {"number": 1}]},
                "price": {
                    "totalGross": {"amount": "150.00", "currency": "USD"},
                    "totalPaid": {"amount": 150, "currency": "USD"}
                },
                "priceAdjustments": [{"type": "discount"}]
            }],
            "info": {"paging": {}}
        }))
        .expect("decode page");

        assert_eq!(page.next_page(), None);
        let booking: Booking = page.data.into_iter().next().expect("one booking").into();
        assert_eq!(booking.booking_number.as_str(), "BK12345");
        assert_eq!(booking.status, BookingStatus::Canceled);
        assert_eq!(booking.customer.full_name(), "Maria Garcia");
        assert_eq!(booking.customer.phone, "555-0100");
        assert_eq!(booking.participants, 3);
        assert_eq!(
            booking.price.total_gross.map(|money| money.amount),
            Some(Decimal::new(15_000, 2))
        );
        assert_eq!(booking.price.total_paid.map(|money| money.amount), Some(Decimal::new(150, 0)));
        assert!(booking.price.balance_due.is_none());
        assert_eq!(booking.price_adjustments.len(), 1);
    }

    #[test]
    fn next_page_needs_url_and_token() {
        let page: BookingPage = serde_json::from_value(json!({
            "data": [],
            "info": {"paging": {
                "nextPageURL": "https://api.bookeo.com/v2/bookings?pageNavigationToken=abc&pageNumber=3",
                "pageNavigationToken": "abc",
                "currentPage": 2
            }}
        }))
        .expect("decode page");
        assert_eq!(page.next_page(), Some(NextPage { token: "abc".to_string(), number: 3 }));

        let without_token: BookingPage = serde_json::from_value(json!({
            "info": {"paging": {"nextPageURL": "https://api.bookeo.com/v2/bookings"}}
        }))
        .expect("decode page");
        assert_eq!(without_token.next_page(), None);
    }

    #[test]
    fn payment_without_method_is_unknown() {
        let list: PaymentList = serde_json::from_value(json!({
            "data": [
                {"id": "p1", "amount": {"amount": "50.00", "currency": "USD"}, "paymentMethod": "cash"},
                {"id": "p2", "amount": {"amount": "100.00", "currency": "USD"}, "gatewayName": "Stripe"}
            ]
        }))
        .expect("decode payments");

        let records: Vec<PaymentRecord> = list.data.into_iter().map(PaymentRecord::from).collect();
        assert_eq!(records[0].method, "cash");
        assert_eq!(records[1].method, "unknown");
        assert_eq!(records[1].gateway_name(), Some("Stripe"));
        assert_eq!(records[1].amount.amount, Decimal::new(10_000, 2));
    }
}

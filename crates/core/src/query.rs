use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::clock::Clock;
use crate::domain::booking::Booking;
use crate::domain::window::DateWindow;
use crate::errors::QueryError;
use crate::payments::{PaymentClassifier, PaymentSummary};
use crate::source::BookingSource;

pub const DEFAULT_DAYS_BACK: u32 = 90;
pub const MAX_DAYS_BACK: u32 = 365;
pub const MAX_RANGE_DAYS: i64 = 365;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomerSearch {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub days_back: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateSearch {
    pub start_date: String,
    pub end_date: String,
    pub include_canceled: bool,
}

/// The four read operations exposed to agents.
#[derive(Clone)]
pub struct BookingQueries {
    source: Arc<dyn BookingSource>,
    clock: Arc<dyn Clock>,
    classifier: PaymentClassifier,
}

impl BookingQueries {
    pub fn new(
        source: Arc<dyn BookingSource>,
        clock: Arc<dyn Clock>,
        classifier: PaymentClassifier,
    ) -> Self {
        Self { source, clock, classifier }
    }

    pub async fn search_by_customer(
        &self,
        search: CustomerSearch,
    ) -> Result<Vec<Booking>, QueryError> {
        let name = normalized_pattern(search.customer_name.as_deref());
        let email = normalized_pattern(search.customer_email.as_deref());
        if name.is_none() && email.is_none() {
            return Err(QueryError::Validation(
                "provide customer_name or customer_email".to_string(),
            ));
        }

        let days_back = search.days_back.unwrap_or(DEFAULT_DAYS_BACK);
        if days_back > MAX_DAYS_BACK {
            return Err(QueryError::Validation(format!(
                "days_back must be at most {MAX_DAYS_BACK}, got {days_back}"
            )));
        }

        let window = DateWindow::trailing(self.clock.today(), days_back);
        let bookings = self.source.list_bookings(window, false).await?;
        let scanned = bookings.len();

        let matches: Vec<Booking> = bookings
            .into_iter()
            .filter(|booking| !booking.is_canceled())
            .filter(|booking| {
                let name_match = name.as_deref().is_some_and(|needle| booking.name_contains(needle));
                let email_match =
                    email.as_deref().is_some_and(|needle| booking.email_contains(needle));
                name_match || email_match
            })
            .collect();

        debug!(
            event_name = "query.search_by_customer.completed",
            window_start = %window.start(),
            window_end = %window.end(),
            scanned,
            matched = matches.len(),
            "customer search filtered upstream bookings"
        );

        Ok(matches)
    }

    pub async fn search_by_date(&self, search: DateSearch) -> Result<Vec<Booking>, QueryError> {
        let start = parse_date("start_date", &search.start_date)?;
        let end = parse_date("end_date", &search.end_date)?;
        let window = DateWindow::new(start, end)?;
        if window.len_days() > MAX_RANGE_DAYS {
            return Err(QueryError::Validation(format!(
                "date range cannot exceed {MAX_RANGE_DAYS} days, got {}",
                window.len_days()
            )));
        }

        let bookings = self.source.list_bookings(window, search.include_canceled).await?;
        let bookings: Vec<Booking> = bookings
            .into_iter()
            .filter(|booking| search.include_canceled || !booking.is_canceled())
            .collect();

        debug!(
            event_name = "query.search_by_date.completed",
            window_start = %window.start(),
            window_end = %window.end(),
            include_canceled = search.include_canceled,
            returned = bookings.len(),
            "date search completed"
        );

        Ok(bookings)
    }

    pub async fn get_booking(&self, booking_number: &str) -> Result<Booking, QueryError> {
        let booking_number = required_booking_number(booking_number)?;
        Ok(self.source.get_booking(booking_number).await?)
    }

    pub async fn get_payments(&self, booking_number: &str) -> Result<PaymentSummary, QueryError> {
        let booking_number = required_booking_number(booking_number)?;
        let booking = self.source.get_booking(booking_number).await?;
        let records = self.source.get_payments(booking_number).await?;

        let summary = self.classifier.summarize(
            booking.booking_number.clone(),
            booking.customer.full_name(),
            records,
        );
        debug!(
            event_name = "query.get_payments.completed",
            booking_number = %summary.booking_number,
            payment_count = summary.payment_count,
            "payments classified"
        );

        Ok(summary)
    }
}

fn normalized_pattern(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|pattern| !pattern.is_empty()).map(str::to_lowercase)
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        QueryError::Validation(format!("{field} must be a date in YYYY-MM-DD format, got `{raw}`"))
    })
}

fn required_booking_number(raw: &str) -> Result<&str, QueryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QueryError::Validation("booking_number is required".to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{BookingQueries, CustomerSearch, DateSearch};
    use crate::clock::FixedClock;
    use crate::domain::booking::{Booking, BookingNumber, BookingStatus, Customer, PriceBreakdown};
    use crate::domain::payment::{Money, PaymentClass, PaymentRecord};
    use crate::domain::window::DateWindow;
    use crate::errors::{ErrorKind, QueryError, SourceError};
    use crate::payments::PaymentClassifier;
    use crate::source::BookingSource;

    #[derive(Default)]
    struct FixtureSource {
        bookings: Vec<Booking>,
        payments: Vec<(String, PaymentRecord)>,
        last_window: Mutex<Option<(DateWindow, bool)>>,
    }

    #[async_trait]
    impl BookingSource for FixtureSource {
        async fn list_bookings(
            &self,
            window: DateWindow,
            include_canceled: bool,
        ) -> Result<Vec<Booking>, SourceError> {
            if let Ok(mut last) = self.last_window.lock() {
                *last = Some((window, include_canceled));
            }
            Ok(self.bookings.clone())
        }

        async fn get_booking(&self, booking_number: &str) -> Result<Booking, SourceError> {
            self.bookings
                .iter()
                .find(|booking| booking.booking_number.as_str() == booking_number)
                .cloned()
                .ok_or_else(|| SourceError::NotFound(booking_number.to_string()))
        }

        async fn get_payments(
            &self,
            booking_number: &str,
        ) -> Result<Vec<PaymentRecord>, SourceError> {
            Ok(self
                .payments
                .iter()
                .filter(|(number, _)| number == booking_number)
                .map(|(_, record)| record.clone())
                .collect())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date")
    }

    fn booking(number: &str, name: (&str, &str), email: &str, status: BookingStatus) -> Booking {
        Booking {
            booking_number: BookingNumber(number.to_string()),
            status,
            product_name: Some("Harbour Kayak Tour".to_string()),
            product_id: None,
            start_time: None,
            end_time: None,
            creation_time: None,
            customer: Customer {
                first_name: name.0.to_string(),
                last_name: name.1.to_string(),
                email: email.to_string(),
                phone: String::new(),
            },
            participants: 2,
            price: PriceBreakdown::default(),
            price_adjustments: Vec::new(),
            source: None,
        }
    }

    fn payment(method: &str, gateway: Option<&str>, dollars: i64) -> PaymentRecord {
        PaymentRecord {
            id: None,
            amount: Money::new(Decimal::new(dollars, 0), "USD"),
            method: method.to_string(),
            method_other: None,
            gateway: gateway.map(str::to_string),
            reason: None,
            agent: None,
            comment: None,
            received_time: None,
        }
    }

    fn fixture() -> Arc<FixtureSource> {
        Arc::new(FixtureSource {
            bookings: vec![
                booking("BK12345", ("Maria", "Garcia"), "maria.g@example.com", BookingStatus::Confirmed),
                booking("BK20001", ("John", "Smith"), "jsmith@corp.example", BookingStatus::Confirmed),
                booking("BK20002", ("Mariana", "Lopez"), "ml@example.org", BookingStatus::Canceled),
                booking("BK20003", ("Wei", "Chen"), "MARIA.FAN@example.net", BookingStatus::Confirmed),
            ],
            payments: vec![
                ("BK12345".to_string(), payment("cash", None, 50)),
                ("BK12345".to_string(), payment("creditCard", Some("Stripe"), 100)),
            ],
            last_window: Mutex::new(None),
        })
    }

    fn queries(source: Arc<FixtureSource>) -> BookingQueries {
        BookingQueries::new(source, Arc::new(FixedClock(today())), PaymentClassifier::default())
    }

    #[tokio::test]
    async fn customer_search_matches_name_or_email_case_insensitively() {
        let queries = queries(fixture());
        let results = queries
            .search_by_customer(CustomerSearch {
                customer_name: Some("MARIA".to_string()),
                customer_email: Some("Maria.Fan".to_string()),
                days_back: None,
            })
            .await
            .expect("search should succeed");

        let numbers: Vec<&str> = results.iter().map(|b| b.booking_number.as_str()).collect();
        assert_eq!(numbers, vec!["BK12345", "BK20003"]);
        for booking in &results {
            let name_hit = booking.name_contains("maria");
            let email_hit = booking.email_contains("maria.fan");
            assert!(name_hit || email_hit, "{} should match a pattern", booking.booking_number);
        }
    }

    #[tokio::test]
    async fn customer_search_defaults_to_ninety_days() {
        let source = fixture();
        let queries = queries(source.clone());
        queries
            .search_by_customer(CustomerSearch {
                customer_email: Some("example".to_string()),
                ..CustomerSearch::default()
            })
            .await
            .expect("search should succeed");

        let recorded = source.last_window.lock().expect("lock").take().expect("window recorded");
        assert_eq!(recorded.0, DateWindow::trailing(today(), 90));
        assert!(!recorded.1, "customer search excludes canceled bookings upstream");
    }

    #[tokio::test]
    async fn customer_search_requires_a_pattern() {
        let queries = queries(fixture());
        let error = queries
            .search_by_customer(CustomerSearch {
                customer_name: Some("   ".to_string()),
                customer_email: None,
                days_back: Some(30),
            })
            .await
            .expect_err("blank patterns should be rejected");
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn customer_search_rejects_days_back_over_limit() {
        let queries = queries(fixture());
        let error = queries
            .search_by_customer(CustomerSearch {
                customer_name: Some("maria".to_string()),
                customer_email: None,
                days_back: Some(366),
            })
            .await
            .expect_err("366 days should be rejected");
        assert!(matches!(error, QueryError::Validation(ref message) if message.contains("365")));

        queries
            .search_by_customer(CustomerSearch {
                customer_name: Some("maria".to_string()),
                customer_email: None,
                days_back: Some(365),
            })
            .await
            .expect("365 days is the inclusive limit");
    }

    #[tokio::test]
    async fn date_search_hides_canceled_unless_requested() {
        let queries = queries(fixture());
        let search = |include_canceled| DateSearch {
            start_date: "2024-06-01".to_string(),
            end_date: "2024-06-30".to_string(),
            include_canceled,
        };

        let without = queries.search_by_date(search(false)).await.expect("search");
        assert_eq!(without.len(), 3);
        assert!(without.iter().all(|booking| !booking.is_canceled()));

        let with = queries.search_by_date(search(true)).await.expect("search");
        assert_eq!(with.len(), 4);
        assert!(with.iter().any(Booking::is_canceled));
    }

    #[tokio::test]
    async fn date_search_validates_format_order_and_span() {
        let queries = queries(fixture());
        let cases = [
            ("2024/06/01", "2024-06-30"),
            ("2024-06-30", "2024-06-01"),
            ("2023-01-01", "2024-06-30"),
        ];
        for (start_date, end_date) in cases {
            let error = queries
                .search_by_date(DateSearch {
                    start_date: start_date.to_string(),
                    end_date: end_date.to_string(),
                    include_canceled: false,
                })
                .await
                .expect_err("invalid range should be rejected");
            assert_eq!(error.kind(), ErrorKind::Validation, "{start_date}..{end_date}");
        }
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let queries = queries(fixture());
        let error = queries.get_booking("BK99999").await.expect_err("should be missing");
        assert_eq!(error.kind(), ErrorKind::NotFound);

        let error = queries.get_booking("  ").await.expect_err("blank number");
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn payments_are_classified_and_totalled() {
        let queries = queries(fixture());
        let summary = queries.get_payments("BK12345").await.expect("payments");

        assert_eq!(summary.payment_count, 2);
        assert_eq!(summary.customer_name, "Maria Garcia");
        assert_eq!(summary.payments[0].classification, PaymentClass::Manual);
        assert_eq!(summary.payments[1].classification, PaymentClass::CardProcessor);
        assert_eq!(summary.total_paid, Decimal::new(150, 0));
    }

    #[tokio::test]
    async fn payments_for_unknown_booking_are_not_found() {
        let queries = queries(fixture());
        let error = queries.get_payments("BK00000").await.expect_err("missing booking");
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}

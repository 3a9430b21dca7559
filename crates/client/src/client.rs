use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use bookeo_core::config::{BookeoConfig, ConfigError};
use bookeo_core::domain::booking::{Booking, BookingNumber};
use bookeo_core::domain::payment::PaymentRecord;
use bookeo_core::domain::window::DateWindow;
use bookeo_core::errors::SourceError;
use bookeo_core::source::BookingSource;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::wire::{BookingPage, NextPage, PaymentList, WireBooking};

/// Longest window the provider accepts for a single booking search.
pub const MAX_CHUNK_DAYS: u32 = 30;

// Header names are case-insensitive; `HeaderMap` wants them lowercase.
const API_KEY_HEADER: &str = "x-bookeo-apikey";
const SECRET_KEY_HEADER: &str = "x-bookeo-secretkey";
const UPSTREAM_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid bookeo base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error(transparent)]
    InvalidTimezone(#[from] ConfigError),
    #[error("bookeo credentials contain characters that cannot be sent as a header")]
    InvalidCredentials,
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Read-only Bookeo API client. Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct BookeoClient {
    http: Client,
    base_url: Url,
    timezone: Tz,
    items_per_page: u32,
}

impl BookeoClient {
    pub fn new(config: &BookeoConfig) -> Result<Self, ClientBuildError> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|error| {
            ClientBuildError::InvalidBaseUrl { url: config.base_url.clone(), reason: error.to_string() }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        let timezone = config.tz()?;

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, sensitive_header(config.api_key.expose_secret())?);
        headers.insert(SECRET_KEY_HEADER, sensitive_header(config.api_secret.expose_secret())?);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("bookeo-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url, timezone, items_per_page: config.items_per_page.clamp(1, 100) })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Unexpected("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// UTC bounds for a chunk: local midnight of its first day through
    /// 23:59:59 local time of its last day.
    fn chunk_bounds(&self, chunk: &DateWindow) -> Result<(String, String), SourceError> {
        let start = local_instant(self.timezone, chunk.start(), NaiveTime::MIN, true)?;
        let end = local_instant(self.timezone, chunk.end(), DAY_END, false)?;
        Ok((
            start.format(UPSTREAM_TIME_FORMAT).to_string(),
            end.format(UPSTREAM_TIME_FORMAT).to_string(),
        ))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        booking_number: Option<&str>,
    ) -> Result<T, SourceError> {
        let path = url.path().to_string();
        let response =
            self.http.get(url).query(query).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error = status_error(response, booking_number).await;
            warn!(
                event_name = "bookeo.request.failed",
                path = %path,
                status = status.as_u16(),
                transient = error.is_transient(),
                "bookeo request failed"
            );
            return Err(error);
        }

        let body = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&body).map_err(|error| {
            SourceError::Unexpected(format!("could not decode response from {path}: {error}"))
        })
    }

    async fn fetch_chunk(
        &self,
        chunk: &DateWindow,
        include_canceled: bool,
        seen: &mut HashSet<BookingNumber>,
        bookings: &mut Vec<Booking>,
    ) -> Result<(), SourceError> {
        let (start_time, end_time) = self.chunk_bounds(chunk)?;
        let mut next_page: Option<NextPage> = None;
        let mut pages = 0_u32;

        loop {
            let mut query = vec![
                ("startTime", start_time.clone()),
                ("endTime", end_time.clone()),
                ("itemsPerPage", self.items_per_page.to_string()),
                ("expandCustomer", "true".to_string()),
                ("includeCanceled", include_canceled.to_string()),
            ];
            if let Some(page) = &next_page {
                query.push(("pageNavigationToken", page.token.clone()));
                query.push(("pageNumber", page.number.to_string()));
            }

            let page: BookingPage = self.get_json(self.endpoint(&["bookings"])?, &query, None).await?;
            pages += 1;
            let following = page.next_page();

            let received = page.data.len();
            for raw in page.data {
                let booking = Booking::from(raw);
                if seen.insert(booking.booking_number.clone()) {
                    bookings.push(booking);
                }
            }

            debug!(
                event_name = "bookeo.bookings.page_fetched",
                chunk_start = %chunk.start(),
                chunk_end = %chunk.end(),
                page = pages,
                received,
                has_next = following.is_some(),
                "fetched bookings page"
            );

            match following {
                Some(page) if next_page.as_ref() != Some(&page) => next_page = Some(page),
                Some(_) => {
                    return Err(SourceError::Unexpected(
                        "provider repeated the same page navigation token".to_string(),
                    ))
                }
                None => return Ok(()),
            }
        }
    }
}

#[async_trait]
impl BookingSource for BookeoClient {
    async fn list_bookings(
        &self,
        window: DateWindow,
        include_canceled: bool,
    ) -> Result<Vec<Booking>, SourceError> {
        let chunks = window.chunks(MAX_CHUNK_DAYS);
        let mut seen = HashSet::new();
        let mut bookings = Vec::new();

        for chunk in &chunks {
            self.fetch_chunk(chunk, include_canceled, &mut seen, &mut bookings).await?;
        }

        debug!(
            event_name = "bookeo.bookings.listed",
            window_start = %window.start(),
            window_end = %window.end(),
            chunks = chunks.len(),
            bookings = bookings.len(),
            "listed bookings for window"
        );
        Ok(bookings)
    }

    async fn get_booking(&self, booking_number: &str) -> Result<Booking, SourceError> {
        let url = self.endpoint(&["bookings", booking_number])?;
        let query = [("expandCustomer", "true".to_string())];
        let wire: WireBooking = self.get_json(url, &query, Some(booking_number)).await?;
        Ok(wire.into())
    }

    async fn get_payments(&self, booking_number: &str) -> Result<Vec<PaymentRecord>, SourceError> {
        let url = self.endpoint(&["bookings", booking_number, "payments"])?;
        let list: PaymentList = self.get_json(url, &[], Some(booking_number)).await?;
        Ok(list.data.into_iter().map(PaymentRecord::from).collect())
    }
}

fn sensitive_header(value: &str) -> Result<HeaderValue, ClientBuildError> {
    let mut header =
        HeaderValue::from_str(value.trim()).map_err(|_| ClientBuildError::InvalidCredentials)?;
    header.set_sensitive(true);
    Ok(header)
}

const DAY_END: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => panic!("23:59:59 is a valid time of day"),
};

/// Resolves a local wall-clock time to UTC. Ambiguous times pick the earliest
/// (window start) or latest (window end) mapping; times inside a DST gap move
/// one hour toward the inside of the window.
fn local_instant(
    timezone: Tz,
    date: NaiveDate,
    time: NaiveTime,
    is_start: bool,
) -> Result<DateTime<Utc>, SourceError> {
    let naive = NaiveDateTime::new(date, time);
    let pick = |candidate: NaiveDateTime| {
        let mapped = timezone.from_local_datetime(&candidate);
        if is_start {
            mapped.earliest()
        } else {
            mapped.latest()
        }
    };

    let shifted = if is_start {
        naive + chrono::Duration::hours(1)
    } else {
        naive - chrono::Duration::hours(1)
    };

    pick(naive)
        .or_else(|| pick(shifted))
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            SourceError::Unexpected(format!("{naive} does not exist in timezone {timezone}"))
        })
}

fn transport_error(error: reqwest::Error) -> SourceError {
    if error.is_decode() {
        return SourceError::Unexpected(error.to_string());
    }
    SourceError::Upstream {
        status: error.status().map(|status| status.as_u16()),
        message: error.without_url().to_string(),
    }
}

async fn status_error(response: Response, booking_number: Option<&str>) -> SourceError {
    let status = response.status();
    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    match (status, booking_number) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            SourceError::Auth { status: status.as_u16() }
        }
        (StatusCode::NOT_FOUND, Some(number)) => SourceError::NotFound(number.to_string()),
        (StatusCode::TOO_MANY_REQUESTS, _) => SourceError::RateLimited { retry_after_secs },
        _ => {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            let message = if preview.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                preview
            };
            SourceError::Upstream { status: Some(status.as_u16()), message }
        }
    }
}

#[cfg(test)]
mod tests {
    use bookeo_core::config::AppConfig;
    use bookeo_core::domain::window::DateWindow;
    use chrono::NaiveDate;
    use secrecy::SecretString;

    use super::{BookeoClient, ClientBuildError, DAY_END};

    fn config(base_url: &str, timezone: &str) -> bookeo_core::config::BookeoConfig {
        let mut bookeo = AppConfig::default().bookeo;
        bookeo.api_key = SecretString::from("key".to_string());
        bookeo.api_secret = SecretString::from("secret".to_string());
        bookeo.base_url = base_url.to_string();
        bookeo.timezone = timezone.to_string();
        bookeo
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn chunk_bounds_follow_local_day_in_standard_and_daylight_time() {
        let client = BookeoClient::new(&config("https://api.bookeo.com/v2", "America/Los_Angeles"))
            .expect("client");

        let winter = DateWindow::new(date(2024, 1, 10), date(2024, 1, 12)).expect("window");
        assert_eq!(
            client.chunk_bounds(&winter).expect("bounds"),
            ("2024-01-10T08:00:00Z".to_string(), "2024-01-13T07:59:59Z".to_string())
        );

        let summer = DateWindow::new(date(2024, 7, 4), date(2024, 7, 4)).expect("window");
        assert_eq!(
            client.chunk_bounds(&summer).expect("bounds"),
            ("2024-07-04T07:00:00Z".to_string(), "2024-07-05T06:59:59Z".to_string())
        );
    }

    #[test]
    fn window_end_is_last_second_of_the_day() {
        assert_eq!(DAY_END.to_string(), "23:59:59");

        let client = BookeoClient::new(&config("https://api.bookeo.com/v2", "UTC")).expect("client");
        let day = DateWindow::new(date(2024, 3, 1), date(2024, 3, 1)).expect("window");
        assert_eq!(
            client.chunk_bounds(&day).expect("bounds"),
            ("2024-03-01T00:00:00Z".to_string(), "2024-03-01T23:59:59Z".to_string())
        );
    }

    #[test]
    fn booking_number_is_a_single_escaped_path_segment() {
        let client =
            BookeoClient::new(&config("https://api.bookeo.com/v2/", "UTC")).expect("client");
        let url = client.endpoint(&["bookings", "BK 1/2", "payments"]).expect("url");
        assert_eq!(url.as_str(), "https://api.bookeo.com/v2/bookings/BK%201%2F2/payments");
    }

    #[test]
    fn rejects_unparseable_base_url_and_timezone() {
        assert!(matches!(
            BookeoClient::new(&config("not a url", "UTC")),
            Err(ClientBuildError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            BookeoClient::new(&config("https://api.bookeo.com/v2", "Nowhere/Special")),
            Err(ClientBuildError::InvalidTimezone(_))
        ));
        let message = BookeoClient::new(&config("https://api.bookeo.com/v2", "Nowhere/Special"))
            .err()
            .map(|error| error.to_string())
            .unwrap_or_default();
        assert!(message.contains("not a known IANA timezone"), "unexpected message: {message}");
    }
}

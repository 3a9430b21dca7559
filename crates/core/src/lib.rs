pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod payments;
pub mod query;
pub mod source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, TransportMode};
pub use domain::booking::{Booking, BookingNumber, BookingStatus, Customer, PriceBreakdown};
pub use domain::payment::{ClassifiedPayment, Money, PaymentClass, PaymentRecord};
pub use domain::window::DateWindow;
pub use errors::{ErrorKind, QueryError, SourceError};
pub use payments::{PaymentClassifier, PaymentSummary};
pub use query::{BookingQueries, CustomerSearch, DateSearch};
pub use source::BookingSource;

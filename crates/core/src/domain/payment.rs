use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self { amount, currency: currency.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Option<String>,
    pub amount: Money,
    /// Raw method string as recorded by the provider, e.g. `cash` or `creditCard`.
    pub method: String,
    pub method_other: Option<String>,
    pub gateway: Option<String>,
    pub reason: Option<String>,
    pub agent: Option<String>,
    pub comment: Option<String>,
    pub received_time: Option<DateTime<FixedOffset>>,
}

impl PaymentRecord {
    pub fn gateway_name(&self) -> Option<&str> {
        self.gateway.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentClass {
    Manual,
    CardProcessor,
}

impl PaymentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::CardProcessor => "card-processor",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPayment {
    #[serde(flatten)]
    pub record: PaymentRecord,
    pub classification: PaymentClass,
}

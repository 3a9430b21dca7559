use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::booking::BookingNumber;
use crate::domain::payment::{ClassifiedPayment, PaymentClass, PaymentRecord};

pub const DEFAULT_CARD_PROCESSOR_TOKENS: &[&str] = &["stripe"];

/// Labels payment records as manual or card-processor.
///
/// A record is a card-processor payment when it names a gateway, or when its
/// method string contains one of the configured tokens. Matching ignores case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentClassifier {
    tokens: Vec<String>,
}

impl Default for PaymentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CARD_PROCESSOR_TOKENS.iter().copied())
    }
}

impl PaymentClassifier {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .map(|token| token.as_ref().trim().to_lowercase())
            .filter(|token| !token.is_empty())
            .collect();
        Self { tokens }
    }

    pub fn classify(&self, record: &PaymentRecord) -> PaymentClass {
        if record.gateway_name().is_some() {
            return PaymentClass::CardProcessor;
        }

        let method = record.method.to_lowercase();
        if self.tokens.iter().any(|token| method.contains(token.as_str())) {
            PaymentClass::CardProcessor
        } else {
            PaymentClass::Manual
        }
    }

    pub fn summarize(
        &self,
        booking_number: BookingNumber,
        customer_name: String,
        records: Vec<PaymentRecord>,
    ) -> PaymentSummary {
        let payments: Vec<ClassifiedPayment> = records
            .into_iter()
            .map(|record| {
                let classification = self.classify(&record);
                ClassifiedPayment { record, classification }
            })
            .collect();

        let total_paid: Decimal = payments.iter().map(|payment| payment.record.amount.amount).sum();
        let currency = summary_currency(&booking_number, &payments);
        let payment_methods: BTreeSet<String> =
            payments.iter().map(|payment| payment.record.method.clone()).collect();

        PaymentSummary {
            booking_number,
            customer_name,
            payment_count: payments.len(),
            total_paid,
            currency,
            has_manual_payment: payments
                .iter()
                .any(|payment| payment.classification == PaymentClass::Manual),
            has_card_processor_payment: payments
                .iter()
                .any(|payment| payment.classification == PaymentClass::CardProcessor),
            payment_methods: payment_methods.into_iter().collect(),
            payments,
        }
    }
}

/// Currency shared by every payment. Mixed currencies leave the total unlabeled.
fn summary_currency(
    booking_number: &BookingNumber,
    payments: &[ClassifiedPayment],
) -> Option<String> {
    let first = &payments.first()?.record.amount.currency;
    let mixed = payments
        .iter()
        .any(|payment| !payment.record.amount.currency.eq_ignore_ascii_case(first));
    if mixed {
        warn!(
            event_name = "payments.currency.mixed",
            booking_number = %booking_number,
            "payments use more than one currency; total is not converted"
        );
        return None;
    }
    Some(first.clone())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub booking_number: BookingNumber,
    pub customer_name: String,
    pub payment_count: usize,
    pub total_paid: Decimal,
    pub currency: Option<String>,
    pub has_manual_payment: bool,
    pub has_card_processor_payment: bool,
    pub payment_methods: Vec<String>,
    pub payments: Vec<ClassifiedPayment>,
}

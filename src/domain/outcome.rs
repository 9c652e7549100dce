use super::invoice::{CustomerId, Invoice, InvoiceStatus};
use super::money::Money;
use serde::Serialize;
use std::fmt;

pub const SUCCESSFULLY_CHARGED: &str = "successfully-charged";
pub const ACCOUNT_DID_NOT_ALLOW_CHARGE: &str = "customer-account-did-not-allow-charge";
pub const CURRENCY_MISMATCH: &str = "currency-mismatch";
pub const CUSTOMER_NOT_FOUND: &str = "customer-not-found";
pub const NETWORK_ERROR: &str = "network-error";
/// Trace label written when a decision could not be persisted.
pub const PERSISTENCE_ERROR: &str = "persistence-error";

/// Normalized result of a single charge attempt.
///
/// Produced fresh by the payment adapter for every attempt and consumed
/// immediately by [`classify`]; never persisted.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentOutcome {
    Charged,
    Declined,
    CurrencyMismatch,
    CustomerNotFound,
    NetworkFailure,
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PaymentOutcome::Charged => "charged",
            PaymentOutcome::Declined => "declined",
            PaymentOutcome::CurrencyMismatch => "currency-mismatch",
            PaymentOutcome::CustomerNotFound => "customer-not-found",
            PaymentOutcome::NetworkFailure => "network-failure",
        };
        f.write_str(tag)
    }
}

/// What a charge outcome means for an invoice.
///
/// Computed once per attempt and applied once through the invoice store.
/// `new_status == None` leaves the invoice as it is while still recording
/// an event.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Decision {
    pub new_status: Option<InvoiceStatus>,
    pub event_label: &'static str,
    pub retryable: bool,
    /// Amount that was attempted, snapshotted into the event.
    pub amount: Money,
    pub customer_id: CustomerId,
}

impl Decision {
    /// Status the invoice holds once the decision is applied to `current`.
    pub fn resulting_status(&self, current: InvoiceStatus) -> InvoiceStatus {
        self.new_status.unwrap_or(current)
    }
}

/// Maps an outcome to the invoice transition it implies.
///
/// Reference-data failures (unknown customer, wrong currency) cannot succeed
/// without outside correction, so they fail the invoice. Declines and network
/// failures keep it pending for the next cycle.
pub fn classify(invoice: &Invoice, outcome: PaymentOutcome) -> Decision {
    let (new_status, event_label, retryable) = match outcome {
        PaymentOutcome::Charged => (Some(InvoiceStatus::Paid), SUCCESSFULLY_CHARGED, false),
        PaymentOutcome::Declined => (None, ACCOUNT_DID_NOT_ALLOW_CHARGE, true),
        PaymentOutcome::CurrencyMismatch => (Some(InvoiceStatus::Failed), CURRENCY_MISMATCH, false),
        PaymentOutcome::CustomerNotFound => {
            (Some(InvoiceStatus::Failed), CUSTOMER_NOT_FOUND, false)
        }
        PaymentOutcome::NetworkFailure => (None, NETWORK_ERROR, true),
    };

    Decision {
        new_status,
        event_label,
        retryable,
        amount: invoice.amount,
        customer_id: invoice.customer_id,
    }
}

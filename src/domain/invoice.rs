use super::money::{Currency, Money};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type InvoiceId = u32;
pub type CustomerId = u32;
pub type EventId = u64;

/// Event type recorded when an invoice is first stored.
pub const CREATED_EVENT: &str = "created";

/// Lifecycle status of an invoice.
///
/// `Pending` is the only status eligible for a charge attempt; `Paid` and
/// `Failed` are terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl InvoiceStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvoiceStatus::Pending)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PAID" => Ok(InvoiceStatus::Paid),
            "FAILED" => Ok(InvoiceStatus::Failed),
            _ => Err(format!("unknown invoice status '{s}'")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct Customer {
    pub id: CustomerId,
    /// Currency the customer is billed in.
    pub currency: Currency,
}

impl Customer {
    pub fn new(id: CustomerId, currency: Currency) -> Self {
        Self { id, currency }
    }
}

/// An amount owed by a customer together with its lifecycle status.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn is_pending(&self) -> bool {
        self.status == InvoiceStatus::Pending
    }
}

/// Immutable entry of an invoice's audit trail.
///
/// `status` is `None` for pure trace events that record an occurrence without
/// stating a lifecycle status. `amount` and `customer_id` snapshot what the
/// invoice looked like when the event was written.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct InvoiceEvent {
    pub id: EventId,
    pub invoice_id: InvoiceId,
    pub status: Option<InvoiceStatus>,
    pub event_type: String,
    pub event_time: DateTime<Utc>,
    pub amount: Option<Money>,
    pub customer_id: Option<CustomerId>,
}

/// Picks the timestamp for the next event of an invoice.
///
/// Keeps each invoice's log strictly increasing in time even when the clock
/// has not advanced (or went backwards) since the previous event.
pub fn next_event_time(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    }
}

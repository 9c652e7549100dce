use crate::application::billing::{BatchResult, Persistence};
use crate::domain::invoice::{Customer, CustomerId, EventId, Invoice, InvoiceEvent, InvoiceId, InvoiceStatus};
use crate::domain::money::Currency;
use crate::domain::outcome::PaymentOutcome;
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct BatchRow {
    invoice: InvoiceId,
    outcome: PaymentOutcome,
    status: InvoiceStatus,
    retryable: bool,
    persistence: &'static str,
    /// Empty when nothing was written for the attempt.
    event: Option<&'static str>,
    event_id: Option<EventId>,
}

#[derive(Serialize)]
struct InvoiceRow {
    invoice: InvoiceId,
    customer: CustomerId,
    amount: Decimal,
    currency: Currency,
    status: InvoiceStatus,
}

#[derive(Serialize)]
struct CustomerRow {
    customer: CustomerId,
    currency: Currency,
}

#[derive(Serialize)]
struct EventRow<'a> {
    event: EventId,
    invoice: InvoiceId,
    status: Option<InvoiceStatus>,
    r#type: &'a str,
    time: DateTime<Utc>,
    amount: Option<Decimal>,
    currency: Option<Currency>,
    customer: Option<CustomerId>,
}

/// Writes billing reports as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One row per charged invoice, in batch order.
    pub fn write_batch(&mut self, batch: &BatchResult) -> Result<()> {
        for entry in &batch.entries {
            let event = match entry.persistence {
                Persistence::Superseded => None,
                _ => Some(entry.event_label),
            };
            self.writer.serialize(BatchRow {
                invoice: entry.invoice_id,
                outcome: entry.outcome,
                status: entry.status,
                retryable: entry.retryable,
                persistence: entry.persistence.as_str(),
                event,
                event_id: entry.persistence.event_id(),
            })?;
        }
        self.flush()
    }

    pub fn write_invoices(&mut self, invoices: &[Invoice]) -> Result<()> {
        for invoice in invoices {
            self.writer.serialize(InvoiceRow {
                invoice: invoice.id,
                customer: invoice.customer_id,
                amount: invoice.amount.value,
                currency: invoice.amount.currency,
                status: invoice.status,
            })?;
        }
        self.flush()
    }

    pub fn write_customers(&mut self, customers: &[Customer]) -> Result<()> {
        for customer in customers {
            self.writer.serialize(CustomerRow {
                customer: customer.id,
                currency: customer.currency,
            })?;
        }
        self.flush()
    }

    pub fn write_events(&mut self, events: &[InvoiceEvent]) -> Result<()> {
        for event in events {
            self.writer.serialize(EventRow {
                event: event.id,
                invoice: event.invoice_id,
                status: event.status,
                r#type: &event.event_type,
                time: event.event_time,
                amount: event.amount.map(|m| m.value),
                currency: event.amount.map(|m| m.currency),
                customer: event.customer_id,
            })?;
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

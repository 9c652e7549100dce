use super::invoice::{Customer, CustomerId, EventId, Invoice, InvoiceEvent, InvoiceId, InvoiceStatus};
use super::money::Money;
use super::outcome::Decision;
use crate::error::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Failure conditions signalled by the raw payment capability.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("currency of invoice {invoice_id} does not match customer {customer_id}")]
    CurrencyMismatch {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
    },
    #[error("customer {0} was not found")]
    CustomerNotFound(CustomerId),
    #[error("network error while contacting the payment provider")]
    Network,
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// External capability able to charge a customer for an invoice.
///
/// Returns `Ok(true)` when the charge went through and `Ok(false)` when the
/// customer's account did not allow it.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn charge(&self, invoice: &Invoice) -> std::result::Result<bool, ProviderError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn store(&self, customer: Customer) -> Result<()>;
    async fn get(&self, customer_id: CustomerId) -> Result<Option<Customer>>;
    async fn get_all(&self) -> Result<Vec<Customer>>;
}

/// Persistence contract for invoices and their event log.
///
/// Every write that touches both an invoice row and its log must be atomic:
/// readers observe both effects or neither.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Stores a new invoice under the next free id and appends its `created` event.
    async fn create_invoice(
        &self,
        customer_id: CustomerId,
        amount: Money,
        status: InvoiceStatus,
    ) -> Result<Invoice>;
    async fn fetch_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>>;
    /// All invoices, ordered by id.
    async fn fetch_invoices(&self) -> Result<Vec<Invoice>>;
    /// Invoices in `status`, ordered by id.
    async fn fetch_invoices_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>>;
    /// Applies a classified charge outcome to a pending invoice.
    ///
    /// Updates the status when the decision carries one and appends an event
    /// holding the resulting status. Fails without writing anything when the
    /// invoice is unknown or no longer pending.
    async fn apply_decision(&self, invoice_id: InvoiceId, decision: &Decision) -> Result<EventId>;
    /// Appends a status-less event without touching the invoice.
    async fn append_trace_event(&self, invoice_id: InvoiceId, event_type: &str) -> Result<EventId>;
    /// The invoice's event log, oldest first.
    async fn fetch_events(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceEvent>>;
}

pub type PaymentProviderBox = Box<dyn PaymentProvider>;
pub type CustomerStoreBox = Box<dyn CustomerStore>;
pub type InvoiceStoreBox = Box<dyn InvoiceStore>;

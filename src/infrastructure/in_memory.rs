use crate::domain::invoice::{
    CREATED_EVENT, Customer, CustomerId, EventId, Invoice, InvoiceEvent, InvoiceId, InvoiceStatus,
    next_event_time,
};
use crate::domain::money::Money;
use crate::domain::outcome::Decision;
use crate::domain::ports::{CustomerStore, InvoiceStore};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for customers.
///
/// Uses `Arc<RwLock<BTreeMap<CustomerId, Customer>>>` to allow shared concurrent access.
#[derive(Default, Clone)]
pub struct InMemoryCustomerStore {
    customers: Arc<RwLock<BTreeMap<CustomerId, Customer>>>,
}

impl InMemoryCustomerStore {
    /// Creates a new, empty in-memory customer store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn store(&self, customer: Customer) -> Result<()> {
        let mut customers = self.customers.write().await;
        customers.insert(customer.id, customer);
        Ok(())
    }

    async fn get(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.get(&customer_id).copied())
    }

    async fn get_all(&self) -> Result<Vec<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.values().copied().collect())
    }
}

#[derive(Default)]
struct Ledger {
    invoices: BTreeMap<InvoiceId, Invoice>,
    events: BTreeMap<InvoiceId, Vec<InvoiceEvent>>,
    last_invoice_id: InvoiceId,
    last_event_id: EventId,
}

impl Ledger {
    fn append_event(
        &mut self,
        invoice_id: InvoiceId,
        status: Option<InvoiceStatus>,
        event_type: &str,
        snapshot: Option<(Money, CustomerId)>,
    ) -> EventId {
        self.last_event_id += 1;
        let log = self.events.entry(invoice_id).or_default();
        let event_time = next_event_time(log.last().map(|e| e.event_time), Utc::now());
        log.push(InvoiceEvent {
            id: self.last_event_id,
            invoice_id,
            status,
            event_type: event_type.to_string(),
            event_time,
            amount: snapshot.map(|(amount, _)| amount),
            customer_id: snapshot.map(|(_, customer)| customer),
        });
        self.last_event_id
    }
}

/// A thread-safe in-memory store for invoices and their event logs.
///
/// Invoices and events live behind one `RwLock`, so a status update and the
/// event recording it are published under the same write guard.
#[derive(Default, Clone)]
pub struct InMemoryInvoiceStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryInvoiceStore {
    /// Creates a new, empty in-memory invoice store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn create_invoice(
        &self,
        customer_id: CustomerId,
        amount: Money,
        status: InvoiceStatus,
    ) -> Result<Invoice> {
        let mut ledger = self.ledger.write().await;
        ledger.last_invoice_id += 1;
        let invoice = Invoice {
            id: ledger.last_invoice_id,
            customer_id,
            amount,
            status,
        };
        ledger.invoices.insert(invoice.id, invoice.clone());
        ledger.append_event(
            invoice.id,
            Some(status),
            CREATED_EVENT,
            Some((amount, customer_id)),
        );
        Ok(invoice)
    }

    async fn fetch_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>> {
        let ledger = self.ledger.read().await;
        Ok(ledger.invoices.get(&invoice_id).cloned())
    }

    async fn fetch_invoices(&self) -> Result<Vec<Invoice>> {
        let ledger = self.ledger.read().await;
        Ok(ledger.invoices.values().cloned().collect())
    }

    async fn fetch_invoices_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .invoices
            .values()
            .filter(|invoice| invoice.status == status)
            .cloned()
            .collect())
    }

    async fn apply_decision(&self, invoice_id: InvoiceId, decision: &Decision) -> Result<EventId> {
        let mut ledger = self.ledger.write().await;
        let invoice = ledger
            .invoices
            .get_mut(&invoice_id)
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

        if !invoice.is_pending() {
            return Err(BillingError::InvoiceNotPending {
                invoice_id,
                status: invoice.status,
            });
        }

        let status = decision.resulting_status(invoice.status);
        invoice.status = status;

        Ok(ledger.append_event(
            invoice_id,
            Some(status),
            decision.event_label,
            Some((decision.amount, decision.customer_id)),
        ))
    }

    async fn append_trace_event(&self, invoice_id: InvoiceId, event_type: &str) -> Result<EventId> {
        let mut ledger = self.ledger.write().await;
        if !ledger.invoices.contains_key(&invoice_id) {
            return Err(BillingError::InvoiceNotFound(invoice_id));
        }
        Ok(ledger.append_event(invoice_id, None, event_type, None))
    }

    async fn fetch_events(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceEvent>> {
        let ledger = self.ledger.read().await;
        Ok(ledger.events.get(&invoice_id).cloned().unwrap_or_default())
    }
}

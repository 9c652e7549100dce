use crate::domain::invoice::{Invoice, InvoiceEvent, InvoiceId, InvoiceStatus};
use crate::domain::ports::InvoiceStoreBox;
use crate::error::{BillingError, Result};

/// Read access to invoices for callers outside the billing cycle.
pub struct InvoiceService {
    store: InvoiceStoreBox,
}

impl InvoiceService {
    pub fn new(store: InvoiceStoreBox) -> Self {
        Self { store }
    }

    /// Looks an invoice up by id, failing with [`BillingError::InvoiceNotFound`].
    pub async fn fetch(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        self.store
            .fetch_invoice(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))
    }

    pub async fn fetch_all(&self) -> Result<Vec<Invoice>> {
        self.store.fetch_invoices().await
    }

    pub async fn fetch_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>> {
        self.store.fetch_invoices_by_status(status).await
    }

    /// Event log of an existing invoice, oldest first.
    pub async fn fetch_events(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceEvent>> {
        let invoice = self.fetch(invoice_id).await?;
        self.store.fetch_events(invoice.id).await
    }
}

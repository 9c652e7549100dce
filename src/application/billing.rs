use super::payment::PaymentAdapter;
use crate::config::BillingConfig;
use crate::domain::invoice::{EventId, Invoice, InvoiceId, InvoiceStatus};
use crate::domain::outcome::{PERSISTENCE_ERROR, PaymentOutcome, classify};
use crate::domain::ports::{InvoiceStoreBox, PaymentProviderBox};
use crate::error::{BillingError, Result};

/// Whether the decision for an invoice reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Applied { event_id: EventId },
    /// The decision was lost; `trace_event_id` is the `persistence-error`
    /// event written in its place, if that write succeeded.
    Failed { trace_event_id: Option<EventId> },
    /// Another writer finalised the invoice first; nothing was written.
    Superseded,
}

impl Persistence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persistence::Applied { .. } => "applied",
            Persistence::Failed { .. } => "failed",
            Persistence::Superseded => "superseded",
        }
    }

    /// Id of the event this attempt left in the log, if any.
    pub fn event_id(&self) -> Option<EventId> {
        match *self {
            Persistence::Applied { event_id } => Some(event_id),
            Persistence::Failed { trace_event_id } => trace_event_id,
            Persistence::Superseded => None,
        }
    }
}

/// Result of charging one invoice during a billing cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub invoice_id: InvoiceId,
    pub outcome: PaymentOutcome,
    /// Status of the invoice after the attempt.
    pub status: InvoiceStatus,
    /// Whether the invoice is still pending and will be charged again.
    pub retryable: bool,
    /// Label of the event recorded for this attempt: the decision's label, or
    /// `persistence-error` when the decision could not be stored.
    pub event_label: &'static str,
    pub persistence: Persistence,
}

/// Per-invoice results of one billing cycle, in the order invoices were charged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn invoice_ids(&self) -> Vec<InvoiceId> {
        self.entries.iter().map(|e| e.invoice_id).collect()
    }

    pub fn count_status(&self, status: InvoiceStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn persistence_failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.persistence, Persistence::Failed { .. }))
            .count()
    }
}

/// Charges every pending invoice once per cycle.
///
/// Each invoice goes through charge, classification and persistence strictly
/// in that order. Domain payment failures are recorded and the cycle moves
/// on; an unrecognized provider failure stops the cycle.
pub struct BillingService {
    payments: PaymentAdapter,
    store: InvoiceStoreBox,
}

impl BillingService {
    pub fn new(provider: PaymentProviderBox, store: InvoiceStoreBox, config: BillingConfig) -> Self {
        Self {
            payments: PaymentAdapter::new(provider, config.charge_timeout),
            store,
        }
    }

    /// Runs one billing cycle over the invoices pending right now.
    ///
    /// Invoices that become pending while the cycle runs wait for the next one.
    /// When the provider fails in a way that cannot be classified, the cycle
    /// stops and [`BillingError::CycleAborted`] carries the entries completed
    /// so far.
    pub async fn run_billing_cycle(&self) -> Result<BatchResult> {
        let pending = self
            .store
            .fetch_invoices_by_status(InvoiceStatus::Pending)
            .await?;
        tracing::info!(pending = pending.len(), "Starting billing cycle");

        let mut batch = BatchResult::default();
        for invoice in pending {
            match self.charge_invoice(&invoice).await {
                Ok(entry) => batch.entries.push(entry),
                Err(source) => {
                    tracing::error!(
                        invoice_id = invoice.id,
                        completed = batch.len(),
                        error = %source,
                        "Aborting billing cycle"
                    );
                    return Err(BillingError::CycleAborted {
                        completed: batch,
                        source: Box::new(source),
                    });
                }
            }
        }

        tracing::info!(
            attempted = batch.len(),
            paid = batch.count_status(InvoiceStatus::Paid),
            failed = batch.count_status(InvoiceStatus::Failed),
            retrying = batch.count_status(InvoiceStatus::Pending),
            persistence_failures = batch.persistence_failures(),
            "Billing cycle finished"
        );
        Ok(batch)
    }

    async fn charge_invoice(&self, invoice: &Invoice) -> Result<BatchEntry> {
        let outcome = self.payments.attempt_charge(invoice).await?;
        let decision = classify(invoice, outcome);

        let (status, retryable, event_label, persistence) =
            match self.store.apply_decision(invoice.id, &decision).await {
                Ok(event_id) => (
                    decision.resulting_status(invoice.status),
                    decision.retryable,
                    decision.event_label,
                    Persistence::Applied { event_id },
                ),
                Err(BillingError::InvoiceNotPending { status, .. }) => {
                    tracing::warn!(
                        invoice_id = invoice.id,
                        %status,
                        "Invoice was finalised by another writer, decision dropped"
                    );
                    (status, false, decision.event_label, Persistence::Superseded)
                }
                Err(e) => {
                    tracing::error!(
                        invoice_id = invoice.id,
                        label = decision.event_label,
                        error = %e,
                        "Failed to persist billing decision"
                    );
                    let trace_event_id = self
                        .store
                        .append_trace_event(invoice.id, PERSISTENCE_ERROR)
                        .await
                        .inspect_err(|e| {
                            tracing::error!(
                                invoice_id = invoice.id,
                                error = %e,
                                "Failed to record persistence error"
                            )
                        })
                        .ok();
                    // The invoice stays pending, so the next cycle charges it again.
                    (
                        invoice.status,
                        true,
                        PERSISTENCE_ERROR,
                        Persistence::Failed { trace_event_id },
                    )
                }
            };

        tracing::info!(
            invoice_id = invoice.id,
            %outcome,
            %status,
            label = event_label,
            retryable,
            persistence = persistence.as_str(),
            "Invoice processed"
        );

        Ok(BatchEntry {
            invoice_id: invoice.id,
            outcome,
            status,
            retryable,
            event_label,
            persistence,
        })
    }
}

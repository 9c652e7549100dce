use crate::domain::invoice::{Invoice, InvoiceId};
use crate::domain::ports::{CustomerStoreBox, PaymentProvider, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// Reply the simulated provider gives for a scripted invoice.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptedReply {
    Charged,
    Declined,
    NetworkError,
    /// A failure the billing core does not know how to classify.
    Fault,
    /// Never answers.
    Hang,
}

/// Stand-in for the external payment network.
///
/// Validates the charge against the customer reference data the way a real
/// provider would (unknown customer, currency mismatch), then answers with the
/// scripted reply for the invoice. Unscripted invoices are charged.
pub struct SimulatedProvider {
    customers: CustomerStoreBox,
    script: HashMap<InvoiceId, ScriptedReply>,
}

impl SimulatedProvider {
    pub fn new(customers: CustomerStoreBox) -> Self {
        Self {
            customers,
            script: HashMap::new(),
        }
    }

    pub fn with_script(mut self, script: impl IntoIterator<Item = (InvoiceId, ScriptedReply)>) -> Self {
        self.script.extend(script);
        self
    }
}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, ProviderError> {
        let customer = self
            .customers
            .get(invoice.customer_id)
            .await
            .map_err(|e| ProviderError::Other(Box::new(e)))?
            .ok_or(ProviderError::CustomerNotFound(invoice.customer_id))?;

        if customer.currency != invoice.amount.currency {
            return Err(ProviderError::CurrencyMismatch {
                invoice_id: invoice.id,
                customer_id: customer.id,
            });
        }

        match self.script.get(&invoice.id).copied() {
            None | Some(ScriptedReply::Charged) => Ok(true),
            Some(ScriptedReply::Declined) => Ok(false),
            Some(ScriptedReply::NetworkError) => Err(ProviderError::Network),
            Some(ScriptedReply::Fault) => Err(ProviderError::Other(
                format!("provider rejected invoice {} with an unknown error", invoice.id).into(),
            )),
            Some(ScriptedReply::Hang) => std::future::pending().await,
        }
    }
}

use crate::domain::invoice::Invoice;
use crate::domain::outcome::PaymentOutcome;
use crate::domain::ports::{PaymentProviderBox, ProviderError};
use crate::error::{BillingError, Result};
use std::time::Duration;

/// Normalizes the raw payment capability into a closed [`PaymentOutcome`].
///
/// Exactly one provider call is made per attempt; retries are left to later
/// billing cycles. Failures the provider signals but this adapter does not
/// recognize are returned as [`BillingError::UnrecognizedProviderFailure`].
pub struct PaymentAdapter {
    provider: PaymentProviderBox,
    charge_timeout: Duration,
}

impl PaymentAdapter {
    pub fn new(provider: PaymentProviderBox, charge_timeout: Duration) -> Self {
        Self {
            provider,
            charge_timeout,
        }
    }

    pub async fn attempt_charge(&self, invoice: &Invoice) -> Result<PaymentOutcome> {
        let charged =
            match tokio::time::timeout(self.charge_timeout, self.provider.charge(invoice)).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    tracing::warn!(
                        invoice_id = invoice.id,
                        timeout = ?self.charge_timeout,
                        "Charge attempt timed out"
                    );
                    return Ok(PaymentOutcome::NetworkFailure);
                }
            };

        let outcome = match charged {
            Ok(true) => PaymentOutcome::Charged,
            Ok(false) => PaymentOutcome::Declined,
            Err(ProviderError::CurrencyMismatch { .. }) => PaymentOutcome::CurrencyMismatch,
            Err(ProviderError::CustomerNotFound(_)) => PaymentOutcome::CustomerNotFound,
            Err(ProviderError::Network) => PaymentOutcome::NetworkFailure,
            Err(ProviderError::Other(source)) => {
                return Err(BillingError::UnrecognizedProviderFailure {
                    invoice_id: invoice.id,
                    source,
                });
            }
        };

        tracing::debug!(invoice_id = invoice.id, %outcome, "Charge attempted");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invoice::InvoiceStatus;
    use crate::domain::money::{Currency, Money};
    use crate::domain::ports::PaymentProvider;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Charged(bool),
        Mismatch,
        MissingCustomer,
        Network,
        Unknown,
        Hang,
    }

    struct StubProvider {
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PaymentProvider for StubProvider {
        async fn charge(&self, invoice: &Invoice) -> std::result::Result<bool, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Charged(charged) => Ok(charged),
                Reply::Mismatch => Err(ProviderError::CurrencyMismatch {
                    invoice_id: invoice.id,
                    customer_id: invoice.customer_id,
                }),
                Reply::MissingCustomer => Err(ProviderError::CustomerNotFound(invoice.customer_id)),
                Reply::Network => Err(ProviderError::Network),
                Reply::Unknown => Err(ProviderError::Other("card network exploded".into())),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn invoice() -> Invoice {
        Invoice {
            id: 1,
            customer_id: 1,
            amount: Money::new(dec!(1), Currency::Dkk),
            status: InvoiceStatus::Pending,
        }
    }

    fn adapter(reply: Reply) -> (PaymentAdapter, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = StubProvider {
            reply,
            calls: calls.clone(),
        };
        (
            PaymentAdapter::new(Box::new(provider), Duration::from_millis(50)),
            calls,
        )
    }

    #[tokio::test]
    async fn test_boolean_results_map_to_charged_and_declined() {
        let (charged, _) = adapter(Reply::Charged(true));
        assert_eq!(
            charged.attempt_charge(&invoice()).await.unwrap(),
            PaymentOutcome::Charged
        );

        let (declined, _) = adapter(Reply::Charged(false));
        assert_eq!(
            declined.attempt_charge(&invoice()).await.unwrap(),
            PaymentOutcome::Declined
        );
    }

    #[tokio::test]
    async fn test_recognized_failures_map_to_outcomes() {
        for (reply, expected) in [
            (Reply::Mismatch, PaymentOutcome::CurrencyMismatch),
            (Reply::MissingCustomer, PaymentOutcome::CustomerNotFound),
            (Reply::Network, PaymentOutcome::NetworkFailure),
        ] {
            let (adapter, calls) = adapter(reply);
            assert_eq!(adapter.attempt_charge(&invoice()).await.unwrap(), expected);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_unrecognized_failure_propagates_its_source() {
        let (adapter, _) = adapter(Reply::Unknown);
        let err = adapter.attempt_charge(&invoice()).await.unwrap_err();
        match err {
            BillingError::UnrecognizedProviderFailure { invoice_id, source } => {
                assert_eq!(invoice_id, 1);
                assert_eq!(source.to_string(), "card network exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_counts_as_network_failure() {
        let (adapter, calls) = adapter(Reply::Hang);
        assert_eq!(
            adapter.attempt_charge(&invoice()).await.unwrap(),
            PaymentOutcome::NetworkFailure
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

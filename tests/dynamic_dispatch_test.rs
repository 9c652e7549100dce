use billing_reconciler::domain::invoice::{Customer, Invoice, InvoiceStatus};
use billing_reconciler::domain::money::{Currency, Money};
use billing_reconciler::domain::outcome::{PaymentOutcome, classify};
use billing_reconciler::domain::ports::{CustomerStoreBox, InvoiceStore, InvoiceStoreBox};
use billing_reconciler::infrastructure::in_memory::{InMemoryCustomerStore, InMemoryInvoiceStore};
use rust_decimal_macros::dec;
use std::sync::Arc;

async fn pending_invoice(store: &InMemoryInvoiceStore) -> Invoice {
    store
        .create_invoice(1, Money::new(dec!(5), Currency::Eur), InvoiceStatus::Pending)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let customer_store: CustomerStoreBox = Box::new(InMemoryCustomerStore::new());
    let invoice_store: InvoiceStoreBox = Box::new(InMemoryInvoiceStore::new());

    // Verify Send + Sync by spawning tasks
    let cs_handle = tokio::spawn(async move {
        customer_store
            .store(Customer::new(1, Currency::Eur))
            .await
            .unwrap();
        customer_store.get(1).await.unwrap().unwrap()
    });

    let is_handle = tokio::spawn(async move {
        invoice_store
            .create_invoice(1, Money::new(dec!(100.0), Currency::Eur), InvoiceStatus::Pending)
            .await
            .unwrap()
    });

    assert_eq!(cs_handle.await.unwrap().id, 1);
    assert_eq!(is_handle.await.unwrap().id, 1);
}

#[tokio::test]
async fn test_concurrent_writers_cannot_finalise_an_invoice_twice() {
    let store = InMemoryInvoiceStore::new();
    let invoice = pending_invoice(&store).await;
    let shared: Arc<InvoiceStoreBox> = Arc::new(Box::new(store.clone()));

    let mut handles = Vec::new();
    for outcome in [PaymentOutcome::Charged, PaymentOutcome::CurrencyMismatch] {
        let store = shared.clone();
        let invoice_id = invoice.id;
        let decision = classify(&invoice, outcome);
        handles.push(tokio::spawn(async move {
            store.apply_decision(invoice_id, &decision).await.is_ok()
        }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap() {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    // created + exactly one terminal event
    assert_eq!(store.fetch_events(invoice.id).await.unwrap().len(), 2);
    assert!(store.fetch_invoice(invoice.id).await.unwrap().unwrap().status.is_terminal());
}

#![allow(dead_code)]

use billing_reconciler::application::billing::BillingService;
use billing_reconciler::config::BillingConfig;
use billing_reconciler::domain::invoice::{Customer, Invoice, InvoiceId, InvoiceStatus};
use billing_reconciler::domain::money::{Currency, Money};
use billing_reconciler::domain::ports::{CustomerStore, InvoiceStore};
use billing_reconciler::infrastructure::in_memory::{InMemoryCustomerStore, InMemoryInvoiceStore};
use billing_reconciler::infrastructure::simulated::{ScriptedReply, SimulatedProvider};
use rand::Rng;
use rust_decimal::Decimal;
use std::io::{Error, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

pub const CURRENCIES: [Currency; 5] = [
    Currency::Eur,
    Currency::Usd,
    Currency::Dkk,
    Currency::Sek,
    Currency::Gbp,
];

/// In-memory stores shared between the billing service and the assertions.
#[derive(Clone, Default)]
pub struct Fixture {
    pub customers: InMemoryCustomerStore,
    pub invoices: InMemoryInvoiceStore,
}

impl Fixture {
    pub async fn with_customer(self, id: u32, currency: Currency) -> Self {
        self.customers
            .store(Customer::new(id, currency))
            .await
            .unwrap();
        self
    }

    pub async fn pending_invoice(&self, customer: u32, value: Decimal, currency: Currency) -> Invoice {
        self.invoices
            .create_invoice(customer, Money::new(value, currency), InvoiceStatus::Pending)
            .await
            .unwrap()
    }

    pub fn billing(&self, script: &[(InvoiceId, ScriptedReply)]) -> BillingService {
        self.billing_with_timeout(script, Duration::from_secs(5))
    }

    pub fn billing_with_timeout(
        &self,
        script: &[(InvoiceId, ScriptedReply)],
        timeout: Duration,
    ) -> BillingService {
        let provider = SimulatedProvider::new(Box::new(self.customers.clone()))
            .with_script(script.iter().copied());
        BillingService::new(
            Box::new(provider),
            Box::new(self.invoices.clone()),
            BillingConfig::with_charge_timeout(timeout),
        )
    }

    pub async fn status_of(&self, id: InvoiceId) -> InvoiceStatus {
        self.invoices.fetch_invoice(id).await.unwrap().unwrap().status
    }

    pub async fn event_count(&self, id: InvoiceId) -> usize {
        self.invoices.fetch_events(id).await.unwrap().len()
    }
}

pub fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

/// Writes `customers` customers and ten invoices per customer, the first one
/// pending and the rest paid, with random amounts in the customer's currency.
pub fn generate_seed(customers_path: &Path, invoices_path: &Path, customers: u32) -> Result<(), Error> {
    let mut rng = rand::thread_rng();
    let mut customers_csv = csv::Writer::from_path(customers_path)?;
    let mut invoices_csv = csv::Writer::from_path(invoices_path)?;
    customers_csv.write_record(["customer", "currency"])?;
    invoices_csv.write_record(["customer", "amount", "currency", "status"])?;

    for customer in 1..=customers {
        let currency = CURRENCIES[rng.gen_range(0..CURRENCIES.len())].to_string();
        customers_csv.write_record([customer.to_string(), currency.clone()])?;

        for n in 0..10 {
            let cents: i64 = rng.gen_range(1_000..50_000);
            let status = if n == 0 { "PENDING" } else { "PAID" };
            invoices_csv.write_record([
                customer.to_string(),
                Decimal::new(cents, 2).to_string(),
                currency.clone(),
                status.to_string(),
            ])?;
        }
    }

    customers_csv.flush()?;
    invoices_csv.flush()?;
    Ok(())
}

use crate::domain::invoice::{Customer, CustomerId, InvoiceId, InvoiceStatus};
use crate::domain::money::{Currency, Money};
use crate::error::{BillingError, Result};
use crate::infrastructure::simulated::ScriptedReply;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::str::FromStr;

/// Row of a customers file: `customer, currency`.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct CustomerRecord {
    pub customer: CustomerId,
    pub currency: Currency,
}

impl From<CustomerRecord> for Customer {
    fn from(record: CustomerRecord) -> Self {
        Customer::new(record.customer, record.currency)
    }
}

/// Row of an invoices file: `customer, amount, currency[, status]`.
///
/// A missing or empty status seeds a pending invoice.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct InvoiceRecord {
    pub customer: CustomerId,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
    pub currency: Currency,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

impl InvoiceRecord {
    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status.unwrap_or_default()
    }
}

/// Parses the amount from its text so that every digit and the scale survive.
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    Decimal::from_str(&text).map_err(serde::de::Error::custom)
}

/// Row of an outcomes file: `invoice, outcome`.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct OutcomeRecord {
    pub invoice: InvoiceId,
    pub outcome: ScriptedReply,
}

/// Reads seed records from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<T>`
/// for any record type. It handles whitespace trimming and flexible record
/// lengths automatically.
pub struct SeedReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> SeedReader<R> {
    /// Creates a new `SeedReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes records.
    pub fn records<T: DeserializeOwned>(self) -> impl Iterator<Item = Result<T>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(BillingError::from))
    }

    pub fn customers(self) -> impl Iterator<Item = Result<CustomerRecord>> {
        self.records()
    }

    pub fn invoices(self) -> impl Iterator<Item = Result<InvoiceRecord>> {
        self.records()
    }

    pub fn outcomes(self) -> impl Iterator<Item = Result<OutcomeRecord>> {
        self.records()
    }
}

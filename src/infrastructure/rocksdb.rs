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
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing customers.
pub const CF_CUSTOMERS: &str = "customers";
/// Column Family for storing invoice rows.
pub const CF_INVOICES: &str = "invoices";
/// Column Family for the append-only invoice event log.
pub const CF_INVOICE_EVENTS: &str = "invoice_events";
/// Column Family for id sequences.
pub const CF_META: &str = "meta";

const LAST_INVOICE_ID: &[u8] = b"last_invoice_id";
const LAST_EVENT_ID: &[u8] = b"last_event_id";

/// A persistent store implementation using RocksDB.
///
/// Customers, invoices and invoice events live in separate Column Families.
/// Keys are big-endian so iteration follows id order. Event keys are the
/// invoice id followed by the event id, which makes one invoice's log a
/// contiguous, ordered key range.
///
/// Writes that touch more than one key go through a `WriteBatch` while holding
/// the writer lock, so an invoice update and its event land together and
/// concurrent writers of the same invoice are serialized.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

fn event_key(invoice_id: InvoiceId, event_id: EventId) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..4].copy_from_slice(&invoice_id.to_be_bytes());
    key[4..].copy_from_slice(&event_id.to_be_bytes());
    key
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_CUSTOMERS, CF_INVOICES, CF_INVOICE_EVENTS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| BillingError::InternalError(format!("{name} column family not found")))
    }

    fn last_id(&self, key: &[u8]) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => {
                let raw = <[u8; 8]>::try_from(&bytes[..]).map_err(|_| {
                    BillingError::InternalError("corrupt id sequence".to_string())
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn read_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>> {
        let cf = self.cf(CF_INVOICES)?;
        self.db
            .get_pinned_cf(cf, invoice_id.to_be_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn read_all<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let cf = self.cf(name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(decode(&value)?);
        }
        Ok(values)
    }

    fn last_event_time(&self, invoice_id: InvoiceId) -> Result<Option<chrono::DateTime<Utc>>> {
        let cf = self.cf(CF_INVOICE_EVENTS)?;
        let upper = event_key(invoice_id, EventId::MAX);
        let mut iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&upper, Direction::Reverse));
        match iter.next() {
            Some(item) => {
                let (key, value) = item?;
                if key.starts_with(&invoice_id.to_be_bytes()) {
                    let event: InvoiceEvent = decode(&value)?;
                    Ok(Some(event.event_time))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Stages the next event of `invoice_id` into `batch`, returning its id.
    ///
    /// The caller must hold the writer lock until the batch is written.
    fn stage_event(
        &self,
        batch: &mut WriteBatch,
        invoice_id: InvoiceId,
        status: Option<InvoiceStatus>,
        event_type: &str,
        snapshot: Option<(Money, CustomerId)>,
    ) -> Result<EventId> {
        let event_id = self.last_id(LAST_EVENT_ID)? + 1;
        let event = InvoiceEvent {
            id: event_id,
            invoice_id,
            status,
            event_type: event_type.to_string(),
            event_time: next_event_time(self.last_event_time(invoice_id)?, Utc::now()),
            amount: snapshot.map(|(amount, _)| amount),
            customer_id: snapshot.map(|(_, customer)| customer),
        };

        batch.put_cf(
            self.cf(CF_INVOICE_EVENTS)?,
            event_key(invoice_id, event_id),
            encode(&event)?,
        );
        batch.put_cf(self.cf(CF_META)?, LAST_EVENT_ID, event_id.to_be_bytes());
        Ok(event_id)
    }
}

#[async_trait]
impl CustomerStore for RocksDBStore {
    async fn store(&self, customer: Customer) -> Result<()> {
        let cf = self.cf(CF_CUSTOMERS)?;
        self.db
            .put_cf(cf, customer.id.to_be_bytes(), encode(&customer)?)?;
        Ok(())
    }

    async fn get(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        let cf = self.cf(CF_CUSTOMERS)?;
        self.db
            .get_pinned_cf(cf, customer_id.to_be_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    async fn get_all(&self) -> Result<Vec<Customer>> {
        self.read_all(CF_CUSTOMERS)
    }
}

#[async_trait]
impl InvoiceStore for RocksDBStore {
    async fn create_invoice(
        &self,
        customer_id: CustomerId,
        amount: Money,
        status: InvoiceStatus,
    ) -> Result<Invoice> {
        let _guard = self.writer.lock().await;

        let next_id = self.last_id(LAST_INVOICE_ID)? + 1;
        let id = InvoiceId::try_from(next_id)
            .map_err(|_| BillingError::InternalError("invoice ids exhausted".to_string()))?;
        let invoice = Invoice {
            id,
            customer_id,
            amount,
            status,
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_INVOICES)?, id.to_be_bytes(), encode(&invoice)?);
        batch.put_cf(self.cf(CF_META)?, LAST_INVOICE_ID, next_id.to_be_bytes());
        self.stage_event(
            &mut batch,
            id,
            Some(status),
            CREATED_EVENT,
            Some((amount, customer_id)),
        )?;
        self.db.write(batch)?;

        Ok(invoice)
    }

    async fn fetch_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>> {
        self.read_invoice(invoice_id)
    }

    async fn fetch_invoices(&self) -> Result<Vec<Invoice>> {
        self.read_all(CF_INVOICES)
    }

    async fn fetch_invoices_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>> {
        let invoices: Vec<Invoice> = self.read_all(CF_INVOICES)?;
        Ok(invoices
            .into_iter()
            .filter(|invoice| invoice.status == status)
            .collect())
    }

    async fn apply_decision(&self, invoice_id: InvoiceId, decision: &Decision) -> Result<EventId> {
        let _guard = self.writer.lock().await;

        let mut invoice = self
            .read_invoice(invoice_id)?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;
        if !invoice.is_pending() {
            return Err(BillingError::InvoiceNotPending {
                invoice_id,
                status: invoice.status,
            });
        }

        let mut batch = WriteBatch::default();
        invoice.status = decision.resulting_status(invoice.status);
        if decision.new_status.is_some() {
            batch.put_cf(
                self.cf(CF_INVOICES)?,
                invoice_id.to_be_bytes(),
                encode(&invoice)?,
            );
        }
        let event_id = self.stage_event(
            &mut batch,
            invoice_id,
            Some(invoice.status),
            decision.event_label,
            Some((decision.amount, decision.customer_id)),
        )?;
        self.db.write(batch)?;

        Ok(event_id)
    }

    async fn append_trace_event(&self, invoice_id: InvoiceId, event_type: &str) -> Result<EventId> {
        let _guard = self.writer.lock().await;

        if self.read_invoice(invoice_id)?.is_none() {
            return Err(BillingError::InvoiceNotFound(invoice_id));
        }

        let mut batch = WriteBatch::default();
        let event_id = self.stage_event(&mut batch, invoice_id, None, event_type, None)?;
        self.db.write(batch)?;

        Ok(event_id)
    }

    async fn fetch_events(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceEvent>> {
        let cf = self.cf(CF_INVOICE_EVENTS)?;
        let prefix = invoice_id.to_be_bytes();
        let start = event_key(invoice_id, 0);

        let mut events = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(&start, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            events.push(decode(&value)?);
        }
        Ok(events)
    }
}

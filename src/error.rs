use crate::application::billing::BatchResult;
use crate::domain::invoice::{CustomerId, InvoiceId, InvoiceStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Storage error: {0}")]
    InternalError(String),
    #[error("Invoice '{0}' was not found")]
    InvoiceNotFound(InvoiceId),
    #[error("Customer '{0}' was not found")]
    CustomerNotFound(CustomerId),
    #[error("Invoice '{invoice_id}' is {status} and can no longer be charged")]
    InvoiceNotPending {
        invoice_id: InvoiceId,
        status: InvoiceStatus,
    },
    #[error("Unrecognized payment provider failure for invoice '{invoice_id}': {source}")]
    UnrecognizedProviderFailure {
        invoice_id: InvoiceId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Billing cycle aborted after {} invoice(s): {source}", .completed.len())]
    CycleAborted {
        completed: BatchResult,
        #[source]
        source: Box<BillingError>,
    },
}

pub type Result<T> = std::result::Result<T, BillingError>;

use billing_reconciler::application::billing::BillingService;
use billing_reconciler::application::customers::CustomerService;
use billing_reconciler::application::invoices::InvoiceService;
use billing_reconciler::config::BillingConfig;
use billing_reconciler::domain::invoice::{CustomerId, InvoiceId, InvoiceStatus};
use billing_reconciler::domain::ports::{CustomerStore, InvoiceStore};
use billing_reconciler::error::BillingError;
use billing_reconciler::infrastructure::in_memory::{InMemoryCustomerStore, InMemoryInvoiceStore};
#[cfg(feature = "storage-rocksdb")]
use billing_reconciler::infrastructure::rocksdb::RocksDBStore;
use billing_reconciler::infrastructure::simulated::SimulatedProvider;
use billing_reconciler::interfaces::csv::report_writer::ReportWriter;
use billing_reconciler::interfaces::csv::seed_reader::SeedReader;
use billing_reconciler::telemetry::{self, LogFormat};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Customers CSV (`customer, currency`) to load before running the command
    #[arg(long, global = true)]
    customers: Option<PathBuf>,

    /// Invoices CSV (`customer, amount, currency[, status]`) to load before running the command
    #[arg(long, global = true)]
    invoices: Option<PathBuf>,

    /// Scripted provider replies CSV (`invoice, outcome`)
    #[arg(long, global = true)]
    outcomes: Option<PathBuf>,

    /// Time a single charge attempt may take before it counts as a network error
    #[arg(long, global = true, default_value_t = 10_000)]
    charge_timeout_ms: u64,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Charge every pending invoice once and print the batch report
    Run,
    /// List invoices, optionally filtered by status
    Invoices {
        #[arg(long)]
        status: Option<InvoiceStatus>,
    },
    /// Show a single invoice
    Invoice { id: InvoiceId },
    /// Show the event log of an invoice
    Events { id: InvoiceId },
    /// List customers
    Customers,
    /// Show a single customer
    Customer { id: CustomerId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    match cli.db_path.clone() {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            execute(cli, store.clone(), store).await
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            execute(cli, InMemoryCustomerStore::new(), InMemoryInvoiceStore::new()).await
        }
        None => execute(cli, InMemoryCustomerStore::new(), InMemoryInvoiceStore::new()).await,
    }
}

async fn execute<C, I>(cli: Cli, customers: C, invoices: I) -> Result<()>
where
    C: CustomerStore + Clone + 'static,
    I: InvoiceStore + Clone + 'static,
{
    seed(&cli, &customers, &invoices).await?;

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());

    match cli.command {
        Command::Run => {
            let mut provider = SimulatedProvider::new(Box::new(customers));
            if let Some(path) = &cli.outcomes {
                let file = File::open(path).into_diagnostic()?;
                let mut script = Vec::new();
                for record in SeedReader::new(file).outcomes() {
                    match record {
                        Ok(record) => script.push((record.invoice, record.outcome)),
                        Err(e) => tracing::warn!(error = %e, "Skipping malformed outcome record"),
                    }
                }
                provider = provider.with_script(script);
            }

            let config = BillingConfig::with_charge_timeout(Duration::from_millis(cli.charge_timeout_ms));
            let billing = BillingService::new(Box::new(provider), Box::new(invoices), config);

            match billing.run_billing_cycle().await {
                Ok(batch) => writer.write_batch(&batch).into_diagnostic()?,
                Err(BillingError::CycleAborted { completed, source }) => {
                    writer.write_batch(&completed).into_diagnostic()?;
                    return Err(BillingError::CycleAborted { completed, source }).into_diagnostic();
                }
                Err(e) => return Err(e).into_diagnostic(),
            }
        }
        Command::Invoices { status } => {
            let service = InvoiceService::new(Box::new(invoices));
            let listed = match status {
                Some(status) => service.fetch_by_status(status).await,
                None => service.fetch_all().await,
            }
            .into_diagnostic()?;
            writer.write_invoices(&listed).into_diagnostic()?;
        }
        Command::Invoice { id } => {
            let service = InvoiceService::new(Box::new(invoices));
            let invoice = service.fetch(id).await.into_diagnostic()?;
            writer.write_invoices(&[invoice]).into_diagnostic()?;
        }
        Command::Events { id } => {
            let service = InvoiceService::new(Box::new(invoices));
            let events = service.fetch_events(id).await.into_diagnostic()?;
            writer.write_events(&events).into_diagnostic()?;
        }
        Command::Customers => {
            let service = CustomerService::new(Box::new(customers));
            let listed = service.fetch_all().await.into_diagnostic()?;
            writer.write_customers(&listed).into_diagnostic()?;
        }
        Command::Customer { id } => {
            let service = CustomerService::new(Box::new(customers));
            let customer = service.fetch(id).await.into_diagnostic()?;
            writer.write_customers(&[customer]).into_diagnostic()?;
        }
    }

    Ok(())
}

/// Loads the seed files named on the command line into the stores.
///
/// Malformed rows are reported and skipped.
async fn seed<C: CustomerStore, I: InvoiceStore>(cli: &Cli, customers: &C, invoices: &I) -> Result<()> {
    if let Some(path) = &cli.customers {
        let file = File::open(path).into_diagnostic()?;
        let mut loaded = 0usize;
        for record in SeedReader::new(file).customers() {
            match record {
                Ok(record) => {
                    customers.store(record.into()).await.into_diagnostic()?;
                    loaded += 1;
                }
                Err(e) => tracing::warn!(error = %e, "Skipping malformed customer record"),
            }
        }
        tracing::info!(loaded, "Customers loaded");
    }

    if let Some(path) = &cli.invoices {
        let file = File::open(path).into_diagnostic()?;
        let mut loaded = 0usize;
        for record in SeedReader::new(file).invoices() {
            match record {
                Ok(record) => {
                    invoices
                        .create_invoice(record.customer, record.money(), record.status())
                        .await
                        .into_diagnostic()?;
                    loaded += 1;
                }
                Err(e) => tracing::warn!(error = %e, "Skipping malformed invoice record"),
            }
        }
        tracing::info!(loaded, "Invoices loaded");
    }

    Ok(())
}

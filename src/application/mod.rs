//! Application layer containing the billing orchestration.
//!
//! `BillingService` runs billing cycles over the injected stores and payment
//! provider; `InvoiceService` and `CustomerService` serve direct lookups;
//! `PaymentAdapter` turns raw provider replies into classified outcomes.

pub mod billing;
pub mod customers;
pub mod invoices;
pub mod payment;

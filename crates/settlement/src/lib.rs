//! Invoice settlement for the repair-shop workflow core.
//!
//! Derives an invoice from an approved quotation (at most once per repair)
//! and reconciles asynchronous payment-provider webhooks against it
//! idempotently, keyed by the provider's external payment reference.

pub mod error;
pub mod invoice;
pub mod service;
pub mod webhook;

pub use error::{Result, SettlementError};
pub use invoice::{Invoice, Payment, PaymentApplied};
pub use service::{InvoiceService, WebhookReceipt};
pub use webhook::{PaymentWebhook, SharedSecretVerifier, SignatureVerifier};

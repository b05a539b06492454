//! Settlement error types.

use common::{InvoiceId, QuotationId, RepairId};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during settlement operations.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// No APPROVATO quotation exists for the repair.
    #[error("No approved quotation for repair {0}")]
    NoApprovedQuotation(RepairId),

    /// The approved quotation's stored totals are internally inconsistent.
    #[error("Approved quotation {0} has inconsistent totals")]
    InvalidApprovedQuotation(QuotationId),

    /// An invoice already exists for this repair.
    #[error("Invoice already exists for repair {0}")]
    InvoiceAlreadyExists(RepairId),

    /// The webhook signature could not be verified.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// The webhook references an unknown invoice.
    #[error("Fattura not found: {0}")]
    FatturaNotFound(InvoiceId),

    /// Applying the payment would exceed the invoice total.
    #[error("Payment of {attempted} cents would exceed invoice total ({remaining} cents remaining)")]
    OverpaymentNotAllowed { attempted: i64, remaining: i64 },

    /// The webhook payload is malformed or carries an invalid amount.
    #[error("{0}")]
    Validation(String),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Webhook payload deserialization error.
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result type for settlement operations.
pub type Result<T> = std::result::Result<T, SettlementError>;

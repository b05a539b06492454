//! Shared types for the repair-shop workflow core.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CustomerId, InvoiceId, QuotationId, RepairId, UserId};

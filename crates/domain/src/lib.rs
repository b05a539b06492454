//! Domain layer for the repair-shop workflow core.
//!
//! This crate provides:
//! - The repair-order entity, its guarded state machine, and audit history
//! - The quotation entity, its state machine, and monetary totals
//! - The coupling between quotation transitions and the owning repair order
//! - Collaborator traits (customer directory, notification dispatch) with
//!   in-memory implementations for wiring and tests

pub mod customer;
pub mod error;
pub mod notify;
pub mod quotation;
pub mod repair;

pub use customer::{Customer, CustomerDirectory, InMemoryCustomerDirectory};
pub use error::DomainError;
pub use notify::{
    DispatchOutcome, InMemoryNotifier, Notification, NotificationDispatch, NotificationKind,
};
pub use quotation::{
    CreateQuotation, EditQuotation, LineItem, LineItemKind, Quotation, QuotationService,
    QuotationState, RespondQuotation, SendQuotation, TAX_RATE_BASIS_POINTS,
};
pub use repair::{
    CreateRepair, DeviceInfo, HistoryEntry, Priority, RepairOrder, RepairService, RepairState,
    Role, TransitionRepair,
};

//! Quotation entity, state machine, and lifecycle service.

mod quotation;
mod service;
mod state;

pub use quotation::{LineItem, LineItemKind, Quotation, TAX_RATE_BASIS_POINTS};
pub use service::{
    CreateQuotation, EditQuotation, QuotationService, RespondQuotation, SendQuotation,
};
pub use state::QuotationState;

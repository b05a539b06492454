//! Quotation state machine.

use serde::{Deserialize, Serialize};

/// The state of a quotation in its lifecycle.
///
/// State transitions:
/// ```text
/// BOZZA ──► INVIATO ──┬──► APPROVATO
///                     └──► RIFIUTATO
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotationState {
    /// Being drafted, line items can be edited.
    #[default]
    Bozza,

    /// Sent to the customer, awaiting a response.
    Inviato,

    /// Customer approved (terminal state).
    Approvato,

    /// Customer rejected (terminal state).
    Rifiutato,
}

impl QuotationState {
    /// Returns true if line items can be edited in this state.
    pub fn can_edit(&self) -> bool {
        matches!(self, QuotationState::Bozza)
    }

    /// Returns true if the quotation can be sent in this state.
    pub fn can_send(&self) -> bool {
        matches!(self, QuotationState::Bozza)
    }

    /// Returns true if a customer response can be recorded in this state.
    pub fn can_respond(&self) -> bool {
        matches!(self, QuotationState::Inviato)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuotationState::Approvato | QuotationState::Rifiutato)
    }

    /// Returns the state name as persisted and published.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationState::Bozza => "BOZZA",
            QuotationState::Inviato => "INVIATO",
            QuotationState::Approvato => "APPROVATO",
            QuotationState::Rifiutato => "RIFIUTATO",
        }
    }
}

impl std::fmt::Display for QuotationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Repair-order state machine.

use serde::{Deserialize, Serialize};

/// The state of a repair order in its lifecycle.
///
/// State transitions:
/// ```text
/// RICEVUTA ──► IN_DIAGNOSI ──► IN_LAVORAZIONE ──► PREVENTIVO_EMESSO
///                                                        │
///      ┌─────────────────────────────────────────────────┘
///      ▼
/// IN_ATTESA_APPROVAZIONE ──► APPROVATA ──► COMPLETATA ──► CONSEGNATA
///
/// ANNULLATA is reachable from every non-terminal state.
/// ```
///
/// `IN_ATTESA_APPROVAZIONE` is entered by sending the quotation;
/// `APPROVATA` and `ANNULLATA` are entered by the customer's recorded
/// response to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairState {
    /// Device received at the counter.
    #[default]
    Ricevuta,

    /// Under diagnosis by a technician.
    InDiagnosi,

    /// Billable work in progress.
    InLavorazione,

    /// A quotation has been drafted for the customer.
    PreventivoEmesso,

    /// Quotation sent, waiting for the customer's response.
    InAttesaApprovazione,

    /// Customer approved the quotation.
    Approvata,

    /// Work finished, device ready for pickup.
    Completata,

    /// Device handed back to the customer (terminal state).
    Consegnata,

    /// Repair was cancelled (terminal state).
    Annullata,
}

impl RepairState {
    /// Returns true if `target` is reachable from this state in one step.
    pub fn can_transition_to(&self, target: RepairState) -> bool {
        use RepairState::*;
        if target == Annullata {
            return !self.is_terminal();
        }
        matches!(
            (self, target),
            (Ricevuta, InDiagnosi)
                | (InDiagnosi, InLavorazione)
                | (InLavorazione, PreventivoEmesso)
                | (PreventivoEmesso, InAttesaApprovazione)
                | (InAttesaApprovazione, Approvata)
                | (Approvata, Completata)
                | (Completata, Consegnata)
        )
    }

    /// Returns true if this is a terminal state (no further transitions
    /// possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, RepairState::Consegnata | RepairState::Annullata)
    }

    /// Returns the state name as persisted and published.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairState::Ricevuta => "RICEVUTA",
            RepairState::InDiagnosi => "IN_DIAGNOSI",
            RepairState::InLavorazione => "IN_LAVORAZIONE",
            RepairState::PreventivoEmesso => "PREVENTIVO_EMESSO",
            RepairState::InAttesaApprovazione => "IN_ATTESA_APPROVAZIONE",
            RepairState::Approvata => "APPROVATA",
            RepairState::Completata => "COMPLETATA",
            RepairState::Consegnata => "CONSEGNATA",
            RepairState::Annullata => "ANNULLATA",
        }
    }
}

impl std::fmt::Display for RepairState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

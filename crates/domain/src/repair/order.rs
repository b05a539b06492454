//! Repair-order entity and audit history.

use chrono::{DateTime, Utc};
use common::{CustomerId, RepairId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::RepairState;

/// Priority assigned to a repair at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Bassa,
    #[default]
    Normale,
    Alta,
    Urgente,
}

/// Role of the actor requesting a transition.
///
/// Authorization is a capability check: a closed enum and a pure predicate,
/// not a hierarchy. `Sistema` is the internal actor used by workflows that
/// drive transitions on the customer's behalf (e.g. a recorded quotation
/// rejection cancelling the repair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Tecnico,
    Responsabile,
    Sistema,
}

impl Role {
    /// Returns true if this role may drive a repair to ANNULLATA.
    pub fn may_cancel(&self) -> bool {
        matches!(self, Role::Responsabile | Role::Sistema)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Tecnico => "TECNICO",
            Role::Responsabile => "RESPONSABILE",
            Role::Sistema => "SISTEMA",
        };
        write!(f, "{name}")
    }
}

/// Free-text descriptors of the device left for repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: String,
    pub brand: String,
    pub model: String,
    pub serial: Option<String>,
}

impl DeviceInfo {
    pub fn new(
        device_type: impl Into<String>,
        brand: impl Into<String>,
        model: impl Into<String>,
        serial: Option<String>,
    ) -> Self {
        Self {
            device_type: device_type.into(),
            brand: brand.into(),
            model: model.into(),
            serial,
        }
    }
}

/// One entry in a repair order's append-only audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state: RepairState,
    pub timestamp: DateTime<Utc>,
    pub acting_user: UserId,
    pub note: String,
}

/// A tracked device-repair job.
///
/// Created once, mutated only through guarded transitions, never deleted.
/// The history always holds at least the implicit initial entry, its
/// timestamps are monotonically non-decreasing, and its last entry's state
/// equals the order's current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairOrder {
    id: RepairId,
    code: String,
    customer_id: CustomerId,
    device: DeviceInfo,
    problem: String,
    accessories: Vec<String>,
    priority: Priority,
    state: RepairState,
    created_at: DateTime<Utc>,
    technician: Option<UserId>,
    history: Vec<HistoryEntry>,
}

impl RepairOrder {
    /// Creates a new repair order in RICEVUTA with the implicit initial
    /// history entry.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RepairId,
        code: String,
        customer_id: CustomerId,
        device: DeviceInfo,
        problem: String,
        accessories: Vec<String>,
        priority: Priority,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            code,
            customer_id,
            device,
            problem,
            accessories,
            priority,
            state: RepairState::Ricevuta,
            created_at: now,
            technician: None,
            history: vec![HistoryEntry {
                state: RepairState::Ricevuta,
                timestamp: now,
                acting_user: created_by,
                note: "Riparazione ricevuta".to_string(),
            }],
        }
    }

    /// Applies a guarded state transition, appending exactly one history
    /// entry on success.
    ///
    /// Fails with [`DomainError::InvalidTransition`] if `target` is not
    /// reachable from the current state, and [`DomainError::Forbidden`] if
    /// `target` is ANNULLATA and `role` lacks the cancel privilege. On any
    /// failure the order is left untouched.
    pub fn transition(
        &mut self,
        target: RepairState,
        acting_user: UserId,
        role: Role,
        note: impl Into<String>,
    ) -> Result<(), DomainError> {
        if !self.state.can_transition_to(target) {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }

        if target == RepairState::Annullata && !role.may_cancel() {
            return Err(DomainError::Forbidden {
                role,
                action: "cancel a repair",
            });
        }

        self.state = target;
        self.history.push(HistoryEntry {
            state: target,
            timestamp: Utc::now(),
            acting_user,
            note: note.into(),
        });
        Ok(())
    }

    /// Assigns (or reassigns) the technician. Not a state transition.
    pub fn assign_technician(&mut self, technician: UserId) {
        self.technician = Some(technician);
    }
}

// Query methods
impl RepairOrder {
    pub fn id(&self) -> RepairId {
        self.id
    }

    /// The human-facing sequential code, e.g. `RIP-20260209-0001`.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn problem(&self) -> &str {
        &self.problem
    }

    pub fn accessories(&self) -> &[String] {
        &self.accessories
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn state(&self) -> RepairState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn technician(&self) -> Option<UserId> {
        self.technician
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

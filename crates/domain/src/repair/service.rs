//! Repair lifecycle service.

use chrono::Utc;
use common::{CustomerId, RepairId, UserId};
use store::{Repo, Sequences, repair_code, repair_scope};

use crate::customer::CustomerDirectory;
use crate::error::DomainError;

use super::{DeviceInfo, HistoryEntry, Priority, RepairOrder, RepairState, Role};

/// Command to create a repair order.
#[derive(Debug, Clone)]
pub struct CreateRepair {
    pub customer_id: CustomerId,
    pub device: DeviceInfo,
    pub problem: String,
    pub accessories: Vec<String>,
    pub priority: Priority,
    pub created_by: UserId,
}

/// Command to transition a repair order.
#[derive(Debug, Clone)]
pub struct TransitionRepair {
    pub repair_id: RepairId,
    pub target: RepairState,
    pub acting_user: UserId,
    pub role: Role,
    pub note: String,
}

/// Service owning the repair-order lifecycle.
///
/// Generic over the injected repair store, customer directory, and
/// sequence allocator so tests construct fresh in-memory instances per
/// case.
pub struct RepairService<R, C, S> {
    repairs: R,
    customers: C,
    sequences: S,
}

impl<R, C, S> RepairService<R, C, S>
where
    R: Repo<RepairId, RepairOrder>,
    C: CustomerDirectory,
    S: Sequences,
{
    /// Creates a new repair service over the given stores.
    pub fn new(repairs: R, customers: C, sequences: S) -> Self {
        Self {
            repairs,
            customers,
            sequences,
        }
    }

    /// Creates a repair order: verifies the customer exists, allocates the
    /// day-scoped sequential code, and persists the order in RICEVUTA with
    /// its implicit initial history entry.
    #[tracing::instrument(skip(self, cmd), fields(customer_id = %cmd.customer_id))]
    pub async fn create(&self, cmd: CreateRepair) -> Result<RepairOrder, DomainError> {
        self.customers
            .resolve(cmd.customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", cmd.customer_id))?;

        let today = Utc::now().date_naive();
        let value = self.sequences.next(&repair_scope(today)).await?;
        let code = repair_code(today, value);

        let order = RepairOrder::new(
            RepairId::new(),
            code,
            cmd.customer_id,
            cmd.device,
            cmd.problem,
            cmd.accessories,
            cmd.priority,
            cmd.created_by,
        );
        self.repairs.insert(order.id(), order.clone()).await?;

        metrics::counter!("repairs_created_total").increment(1);
        tracing::info!(repair_id = %order.id(), code = order.code(), "repair order created");

        Ok(order)
    }

    /// Applies a guarded state transition and persists the result.
    ///
    /// A failed guard (unknown id, unreachable target, missing privilege)
    /// leaves state and history unchanged.
    #[tracing::instrument(skip(self, cmd), fields(repair_id = %cmd.repair_id, target = %cmd.target))]
    pub async fn transition(&self, cmd: TransitionRepair) -> Result<RepairOrder, DomainError> {
        let mut order = self
            .repairs
            .get(&cmd.repair_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Repair", cmd.repair_id))?;

        order.transition(cmd.target, cmd.acting_user, cmd.role, cmd.note)?;
        self.repairs.save(order.id(), order.clone()).await?;

        metrics::counter!("repair_transitions_total").increment(1);
        tracing::info!(state = %order.state(), "repair order transitioned");

        Ok(order)
    }

    /// Assigns a technician to the repair. Not a state transition: the
    /// audit history is unaffected.
    #[tracing::instrument(skip(self))]
    pub async fn assign_technician(
        &self,
        repair_id: RepairId,
        technician: UserId,
    ) -> Result<RepairOrder, DomainError> {
        let mut order = self
            .repairs
            .get(&repair_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Repair", repair_id))?;

        order.assign_technician(technician);
        self.repairs.save(order.id(), order.clone()).await?;

        Ok(order)
    }

    /// Loads a repair order by id. Returns None if it doesn't exist.
    pub async fn get(&self, repair_id: RepairId) -> Result<Option<RepairOrder>, DomainError> {
        Ok(self.repairs.get(&repair_id).await?)
    }

    /// Returns the full audit history of a repair order.
    pub async fn history(&self, repair_id: RepairId) -> Result<Vec<HistoryEntry>, DomainError> {
        let order = self
            .repairs
            .get(&repair_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Repair", repair_id))?;
        Ok(order.history().to_vec())
    }
}

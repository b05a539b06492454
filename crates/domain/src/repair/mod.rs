//! Repair-order entity, state machine, and lifecycle service.

mod order;
mod service;
mod state;

pub use order::{DeviceInfo, HistoryEntry, Priority, RepairOrder, Role};
pub use service::{CreateRepair, RepairService, TransitionRepair};
pub use state::RepairState;

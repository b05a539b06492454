//! Sequence allocation and public code formatting.
//!
//! Human-facing codes (`RIP-20260209-0001`, `ORD-000042`, ...) are rendered
//! from strictly increasing, gap-free per-scope integers. Allocation is the
//! only inherently concurrent resource in the core and must be serialized
//! per scope.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::Result;

/// Global scope for order codes.
pub const ORDER_SCOPE: &str = "order";

/// Global scope for client codes.
pub const CLIENT_SCOPE: &str = "client";

/// Global scope for supplier codes.
pub const SUPPLIER_SCOPE: &str = "supplier";

/// Returns the per-day scope for repair codes, e.g. `repair:2026-02-09`.
pub fn repair_scope(date: NaiveDate) -> String {
    format!("repair:{}", date.format("%Y-%m-%d"))
}

/// Renders a repair code, e.g. `RIP-20260209-0001`.
pub fn repair_code(date: NaiveDate, value: u64) -> String {
    format!("RIP-{}-{:04}", date.format("%Y%m%d"), value)
}

/// Renders an order code, e.g. `ORD-000042`.
pub fn order_code(value: u64) -> String {
    format!("ORD-{value:06}")
}

/// Renders a client code, e.g. `CLI-000007`.
pub fn client_code(value: u64) -> String {
    format!("CLI-{value:06}")
}

/// Renders a supplier code, e.g. `FOR-000003`.
pub fn supplier_code(value: u64) -> String {
    format!("FOR-{value:06}")
}

/// Per-scope sequence allocator.
///
/// For a given scope the returned values are exactly `1, 2, 3, ...` with no
/// duplicates and no gaps, even under concurrent callers. Implementations
/// backed by a durable counter must allocate within the same transaction
/// that persists the entity owning the value, so a crash between the two
/// can neither leak nor duplicate a code.
#[async_trait]
pub trait Sequences: Send + Sync {
    /// Returns the next value for `scope`: 1 for a previously-unseen scope,
    /// otherwise the previous value + 1.
    async fn next(&self, scope: &str) -> Result<u64>;
}

/// In-memory sequence allocator.
///
/// A single async mutex over the counter map serializes all allocations,
/// which is enough to make each scope's sequence linearizable.
#[derive(Debug, Clone, Default)]
pub struct InMemorySequences {
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl InMemorySequences {
    /// Creates a new allocator with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last issued value for `scope`, if any.
    pub async fn current(&self, scope: &str) -> Option<u64> {
        self.counters.lock().await.get(scope).copied()
    }
}

#[async_trait]
impl Sequences for InMemorySequences {
    async fn next(&self, scope: &str) -> Result<u64> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(scope.to_string()).or_insert(0);
        *counter += 1;
        tracing::debug!(scope, value = *counter, "sequence value allocated");
        Ok(*counter)
    }
}

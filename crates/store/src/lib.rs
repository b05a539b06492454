//! Injected state containers for the repair-shop workflow core.
//!
//! This crate provides:
//! - A generic [`Repo`] trait for entity storage with an in-memory
//!   implementation, constructed once per process or per test and passed
//!   by handle to each service (no ambient module state).
//! - The [`Sequences`] allocator for strictly increasing, gap-free
//!   per-scope integers, and the formatting of public codes.

pub mod error;
pub mod repo;
pub mod sequence;

pub use error::{Result, StoreError};
pub use repo::{InMemoryRepo, Repo};
pub use sequence::{
    CLIENT_SCOPE, InMemorySequences, ORDER_SCOPE, SUPPLIER_SCOPE, Sequences, client_code,
    order_code, repair_code, repair_scope, supplier_code,
};

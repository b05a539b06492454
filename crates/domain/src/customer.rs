//! Customer directory collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::CustomerId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::DomainError;

/// The slice of a customer the workflow core needs: existence, a display
/// name, and an optional email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Option<String>,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email,
        }
    }
}

/// Trait for resolving customer references.
///
/// The core only checks existence (repair creation) and email presence
/// (quotation send); the directory's internal shape is not assumed.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Resolves a customer by id, returning None if unknown.
    async fn resolve(&self, id: CustomerId) -> Result<Option<Customer>, DomainError>;
}

/// In-memory customer directory for wiring and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
}

impl InMemoryCustomerDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a customer to the directory.
    pub async fn add(&self, customer: Customer) {
        self.customers
            .write()
            .await
            .insert(customer.id, customer);
    }

    /// Convenience helper: adds a customer with a fresh id.
    pub async fn add_customer(&self, name: impl Into<String>, email: Option<String>) -> CustomerId {
        let id = CustomerId::new();
        self.add(Customer::new(id, name, email)).await;
        id
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn resolve(&self, id: CustomerId) -> Result<Option<Customer>, DomainError> {
        Ok(self.customers.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_known_customer() {
        let directory = InMemoryCustomerDirectory::new();
        let id = directory
            .add_customer("Mario Rossi", Some("mario@example.com".to_string()))
            .await;

        let customer = directory.resolve(id).await.unwrap().unwrap();
        assert_eq!(customer.name, "Mario Rossi");
        assert_eq!(customer.email.as_deref(), Some("mario@example.com"));
    }

    #[tokio::test]
    async fn test_directory_shared_across_clones() {
        let directory = InMemoryCustomerDirectory::new();
        let handle = directory.clone();
        let id = handle.add_customer("Luca Bianchi", None).await;

        assert!(directory.resolve(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_resolve_unknown_customer() {
        let directory = InMemoryCustomerDirectory::new();
        let result = directory.resolve(CustomerId::new()).await.unwrap();
        assert!(result.is_none());
    }
}

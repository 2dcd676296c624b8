// Branch management service.
// Mock in-memory CRUD backing the branch administration screens.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A store branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a branch; id and timestamps are assigned by the service.
#[derive(Debug, Clone)]
pub struct NewBranch {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BranchPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

/// Mock branch service with simulated request latency.
pub struct BranchService {
    branches: Mutex<Vec<Branch>>,
    next_id: AtomicU64,
    latency: Duration,
}

impl BranchService {
    pub fn new() -> Self {
        Self {
            branches: Mutex::new(seed_branches()),
            next_id: AtomicU64::new(4),
            latency: Duration::ZERO,
        }
    }

    /// Delay applied to every call, to mimic a remote API.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn list(&self) -> Result<Vec<Branch>> {
        self.simulate_latency().await;
        Ok(self.branches().clone())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Branch>> {
        self.simulate_latency().await;
        Ok(self.branches().iter().find(|b| b.id == id).cloned())
    }

    pub async fn create(&self, new: NewBranch) -> Result<Branch> {
        self.simulate_latency().await;
        let now = Utc::now();
        let branch = Branch {
            id: self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
            name: new.name,
            address: new.address,
            phone: new.phone,
            email: new.email,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.branches().push(branch.clone());
        Ok(branch)
    }

    pub async fn update(&self, id: &str, patch: BranchPatch) -> Result<Option<Branch>> {
        self.simulate_latency().await;
        let mut branches = self.branches();
        let Some(branch) = branches.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            branch.name = name;
        }
        if let Some(address) = patch.address {
            branch.address = address;
        }
        if let Some(phone) = patch.phone {
            branch.phone = phone;
        }
        if let Some(email) = patch.email {
            branch.email = email;
        }
        if let Some(is_active) = patch.is_active {
            branch.is_active = is_active;
        }
        branch.updated_at = Utc::now();
        Ok(Some(branch.clone()))
    }

    /// Remove a branch. Returns whether a row was actually deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.simulate_latency().await;
        let mut branches = self.branches();
        let before = branches.len();
        branches.retain(|b| b.id != id);
        Ok(branches.len() < before)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn branches(&self) -> MutexGuard<'_, Vec<Branch>> {
        self.branches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BranchService {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_branches() -> Vec<Branch> {
    let now = Utc::now();
    let branch = |id: &str, name: &str, address: &str, phone: &str, email: &str, active| Branch {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
        is_active: active,
        created_at: now,
        updated_at: now,
    };
    vec![
        branch(
            "1",
            "Main Branch",
            "123 Main St, City",
            "123-456-7890",
            "main@posoffline.com",
            true,
        ),
        branch(
            "2",
            "Downtown Branch",
            "456 Downtown Ave, City",
            "123-456-7891",
            "downtown@posoffline.com",
            true,
        ),
        branch(
            "3",
            "Airport Branch",
            "789 Airport Blvd, City",
            "123-456-7892",
            "airport@posoffline.com",
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_branches() {
        let service = BranchService::new();
        let branches = service.list().await.unwrap();

        assert_eq!(branches.len(), 3);
        assert_eq!(branches[0].name, "Main Branch");
        assert!(!branches[2].is_active);
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let service = BranchService::new();
        let created = service
            .create(NewBranch {
                name: "Harbor Branch".into(),
                address: "12 Pier Rd".into(),
                phone: "123-456-7893".into(),
                email: "harbor@posoffline.com".into(),
                is_active: true,
            })
            .await
            .unwrap();

        assert_eq!(created.id, "4");
        assert_eq!(service.list().await.unwrap().len(), 4);
        assert_eq!(
            service.get("4").await.unwrap().as_ref().map(|b| &b.name),
            Some(&"Harbor Branch".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_patches_and_bumps_timestamp() {
        let service = BranchService::new();
        let before = service.get("1").await.unwrap().unwrap();

        let updated = service
            .update(
                "1",
                BranchPatch {
                    phone: Some("999-000-1111".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.phone, "999-000-1111");
        assert_eq!(updated.name, before.name);
        assert!(updated.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_branch() {
        let service = BranchService::new();
        let result = service.update("99", BranchPatch::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_outcome() {
        let service = BranchService::new();

        assert!(service.delete("2").await.unwrap());
        assert!(!service.delete("2").await.unwrap());
        assert_eq!(service.list().await.unwrap().len(), 2);
    }
}

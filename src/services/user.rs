// User and role service.
// Mock in-memory CRUD backing the user management screens.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A permission role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub permissions: Vec<String>,
    pub branch_access: Vec<String>,
}

/// A staff account. `role` is populated from `role_id` on reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub branch_id: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a user; id and timestamps are assigned by the service.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role_id: String,
    pub branch_id: String,
    pub is_active: bool,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<String>,
    pub branch_id: Option<String>,
    pub is_active: Option<bool>,
}

/// Mock user service with a fixed role table and simulated request latency.
pub struct UserService {
    users: Mutex<Vec<User>>,
    roles: Vec<Role>,
    next_id: AtomicU64,
    latency: Duration,
}

impl UserService {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(seed_users()),
            roles: seed_roles(),
            next_id: AtomicU64::new(5),
            latency: Duration::ZERO,
        }
    }

    /// Delay applied to every call, to mimic a remote API.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// All users, with `role` populated from the role table.
    pub async fn list(&self) -> Result<Vec<User>> {
        self.simulate_latency().await;
        Ok(self.users().iter().map(|u| self.enrich(u)).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        self.simulate_latency().await;
        Ok(self
            .users()
            .iter()
            .find(|u| u.id == id)
            .map(|u| self.enrich(u)))
    }

    /// Users assigned to `branch_id`, including all-branch accounts.
    pub async fn list_by_branch(&self, branch_id: &str) -> Result<Vec<User>> {
        self.simulate_latency().await;
        Ok(self
            .users()
            .iter()
            .filter(|u| u.branch_id == branch_id || u.branch_id == "all")
            .map(|u| self.enrich(u))
            .collect())
    }

    pub async fn roles(&self) -> Result<Vec<Role>> {
        self.simulate_latency().await;
        Ok(self.roles.clone())
    }

    pub async fn create(&self, new: NewUser) -> Result<User> {
        self.simulate_latency().await;
        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
            username: new.username,
            full_name: new.full_name,
            email: new.email,
            role_id: new.role_id,
            role: None,
            branch_id: new.branch_id,
            is_active: new.is_active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        self.users().push(user.clone());
        Ok(self.enrich(&user))
    }

    pub async fn update(&self, id: &str, patch: UserPatch) -> Result<Option<User>> {
        self.simulate_latency().await;
        let mut users = self.users();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(role_id) = patch.role_id {
            user.role_id = role_id;
        }
        if let Some(branch_id) = patch.branch_id {
            user.branch_id = branch_id;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        let updated = user.clone();
        drop(users);
        Ok(Some(self.enrich(&updated)))
    }

    /// Remove a user. Returns whether a row was actually deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.simulate_latency().await;
        let mut users = self.users();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    fn enrich(&self, user: &User) -> User {
        let mut user = user.clone();
        user.role = self.roles.iter().find(|r| r.id == user.role_id).cloned();
        user
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn users(&self) -> MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for UserService {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_roles() -> Vec<Role> {
    let role = |id: &str, name: &str, permissions: &[&str], access: &[&str]| Role {
        id: id.to_string(),
        name: name.to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        branch_access: access.iter().map(|a| a.to_string()).collect(),
    };
    vec![
        role("1", "Administrator", &["all"], &["all"]),
        role(
            "2",
            "Branch Manager",
            &[
                "manage_branch",
                "view_reports",
                "manage_inventory",
                "create_sales",
                "manage_users",
            ],
            &["assigned"],
        ),
        role("3", "Cashier", &["create_sales"], &["assigned"]),
        role(
            "4",
            "Inventory Clerk",
            &["manage_inventory", "view_inventory_reports"],
            &["assigned"],
        ),
    ]
}

fn seed_users() -> Vec<User> {
    let now = Utc::now();
    let user = |id: &str,
                username: &str,
                full_name: &str,
                email: &str,
                role_id: &str,
                branch_id: &str,
                last_login: Option<DateTime<Utc>>| User {
        id: id.to_string(),
        username: username.to_string(),
        full_name: full_name.to_string(),
        email: email.to_string(),
        role_id: role_id.to_string(),
        role: None,
        branch_id: branch_id.to_string(),
        is_active: true,
        last_login,
        created_at: now,
        updated_at: now,
    };
    vec![
        user(
            "1",
            "admin",
            "Admin User",
            "admin@posoffline.com",
            "1",
            "all",
            Some(now),
        ),
        user(
            "2",
            "manager1",
            "Branch Manager",
            "manager@posoffline.com",
            "2",
            "1",
            Some(now),
        ),
        user(
            "3",
            "cashier1",
            "Cashier One",
            "cashier1@posoffline.com",
            "3",
            "1",
            Some(now),
        ),
        user(
            "4",
            "inventory1",
            "Inventory Clerk",
            "inventory@posoffline.com",
            "4",
            "1",
            None,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_enriches_roles() {
        let service = UserService::new();
        let users = service.list().await.unwrap();

        assert_eq!(users.len(), 4);
        assert_eq!(
            users[0].role.as_ref().map(|r| r.name.as_str()),
            Some("Administrator")
        );
        assert_eq!(
            users[2].role.as_ref().map(|r| r.name.as_str()),
            Some("Cashier")
        );
    }

    #[tokio::test]
    async fn test_list_by_branch_includes_all_branch_accounts() {
        let service = UserService::new();
        let users = service.list_by_branch("1").await.unwrap();

        // Three branch-1 users plus the all-branch admin
        assert_eq!(users.len(), 4);
        assert!(users.iter().any(|u| u.username == "admin"));

        let other = service.list_by_branch("2").await.unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].username, "admin");
    }

    #[tokio::test]
    async fn test_roles_table() {
        let service = UserService::new();
        let roles = service.roles().await.unwrap();

        assert_eq!(roles.len(), 4);
        assert!(roles[1].permissions.contains(&"create_sales".to_string()));
    }

    #[tokio::test]
    async fn test_create_enriches_and_assigns_id() {
        let service = UserService::new();
        let created = service
            .create(NewUser {
                username: "cashier2".into(),
                full_name: "Cashier Two".into(),
                email: "cashier2@posoffline.com".into(),
                role_id: "3".into(),
                branch_id: "2".into(),
                is_active: true,
            })
            .await
            .unwrap();

        assert_eq!(created.id, "5");
        assert_eq!(created.role.map(|r| r.name), Some("Cashier".to_string()));
        assert!(created.last_login.is_none());
    }

    #[tokio::test]
    async fn test_update_role_change_reflected_in_enrichment() {
        let service = UserService::new();
        let updated = service
            .update(
                "3",
                UserPatch {
                    role_id: Some("2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            updated.role.map(|r| r.name),
            Some("Branch Manager".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let service = UserService::new();

        assert!(service.delete("4").await.unwrap());
        assert!(service.get("4").await.unwrap().is_none());
        assert!(!service.delete("4").await.unwrap());
    }
}

//! User registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Starting reputation for every user. Nothing reads or updates it.
pub const DEFAULT_REPUTATION: i64 = 100;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: String,
    /// Unique username.
    pub username: String,
    /// Reputation score (inert).
    pub reputation: i64,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// State for registered users.
#[derive(Debug, Default)]
pub struct UserState {
    /// Users indexed by ID.
    users: HashMap<String, User>,
    /// Lowercased username to user ID.
    usernames: HashMap<String, String>,
    /// User IDs in registration order.
    order: Vec<String>,
}

impl UserState {
    /// Register a new user.
    pub fn register(&mut self, username: &str, now: DateTime<Utc>) -> crate::Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(crate::Error::validation("Username is required"));
        }

        let key = username.to_lowercase();
        if self.usernames.contains_key(&key) {
            return Err(crate::Error::duplicate(format!(
                "Username '{}' already registered",
                username
            )));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            reputation: DEFAULT_REPUTATION,
            created_at: now,
        };
        self.usernames.insert(key, user.id.clone());
        self.order.push(user.id.clone());
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// Get a user by ID or fail with a not-found error.
    pub fn require(&self, user_id: &str) -> crate::Result<&User> {
        self.get(user_id)
            .ok_or_else(|| crate::Error::not_found(format!("User '{}' not found", user_id)))
    }

    /// Check whether a user exists.
    pub fn contains(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// All users in registration order.
    pub fn list(&self) -> Vec<&User> {
        self.order.iter().filter_map(|id| self.users.get(id)).collect()
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if no users are registered.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

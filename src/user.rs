//! Session user record.
//!
//! This module defines the `User` struct returned by the login endpoint and
//! persisted under the `"user"` storage key so a session survives reloads.
//!
//! The JSON shape is exactly `{ "id": <number>, "username": <string> }`.

use serde::{Deserialize, Serialize};

/// Represents the authenticated portal user.
///
/// Produced by `POST /api/auth/login` on success and restored from durable
/// storage at startup.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Backend user identifier.
    pub id: u64,

    /// Portal account name, unique within a tenant.
    pub username: String,
}

impl User {
    /// Creates a new User.
    ///
    /// # Example
    ///
    /// ```
    /// # use portal_client::User;
    /// let user = User::new(1, "alice");
    /// assert_eq!(user.id, 1);
    /// assert_eq!(user.username, "alice");
    /// ```
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    /// Serializes the user into the persisted record format.
    pub fn to_record(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a persisted record.
    pub fn from_record(record: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(record)
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::errors::{LoanError, Result};
use crate::types::UserId;

/// coarse classification of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserLevel {
    #[default]
    Regular,
    Admin,
    Banned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub level: UserLevel,
}

impl UserProfile {
    pub fn new(id: UserId, username: impl Into<String>, level: UserLevel) -> Self {
        Self {
            id,
            username: username.into(),
            level,
        }
    }

    /// banned users cannot open new applications
    pub fn can_apply(&self) -> bool {
        self.level != UserLevel::Banned
    }

    /// evaluating and reviewing applications is staff work
    pub fn can_manage_loans(&self) -> bool {
        self.level == UserLevel::Admin
    }
}

/// resolves user identities to their profile
pub trait Directory: Send + Sync {
    /// `UserNotFound` for unknown ids
    fn lookup(&self, user_id: UserId) -> Result<UserProfile>;
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// add or replace a profile
    pub fn register(&self, profile: UserProfile) -> Result<()> {
        let mut users = self.users.write().map_err(|_| LoanError::Store {
            message: "lock poisoned".to_string(),
        })?;
        users.insert(profile.id, profile);
        Ok(())
    }
}

impl Directory for InMemoryDirectory {
    fn lookup(&self, user_id: UserId) -> Result<UserProfile> {
        let users = self.users.read().map_err(|_| LoanError::Store {
            message: "lock poisoned".to_string(),
        })?;
        users
            .get(&user_id)
            .cloned()
            .ok_or(LoanError::UserNotFound { id: user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_levels() {
        let regular = UserProfile::new(Uuid::new_v4(), "asha", UserLevel::Regular);
        let admin = UserProfile::new(Uuid::new_v4(), "ops", UserLevel::Admin);
        let banned = UserProfile::new(Uuid::new_v4(), "mallory", UserLevel::Banned);

        assert!(regular.can_apply() && !regular.can_manage_loans());
        assert!(admin.can_apply() && admin.can_manage_loans());
        assert!(!banned.can_apply() && !banned.can_manage_loans());
    }

    #[test]
    fn test_lookup() {
        let directory = InMemoryDirectory::new();
        let profile = UserProfile::new(Uuid::new_v4(), "asha", UserLevel::Regular);
        directory.register(profile.clone()).unwrap();

        assert_eq!(directory.lookup(profile.id).unwrap(), profile);

        let unknown = Uuid::new_v4();
        assert_eq!(
            directory.lookup(unknown).unwrap_err(),
            LoanError::UserNotFound { id: unknown }
        );
    }

    #[test]
    fn test_level_serde() {
        assert_eq!(serde_json::to_string(&UserLevel::Banned).unwrap(), "\"BANNED\"");
    }
}

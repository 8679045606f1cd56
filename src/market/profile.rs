//! External profile and status seams - enables mocking for tests
//!
//! The host runtime owns user registration, the stat model, and the status
//! flags; the market reaches them only through these traits.

use async_trait::async_trait;

use super::errors::MarketResult;
use super::types::UserProfile;

/// Profile store operations trait - can be mocked for testing
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a user's profile in a group; `None` when unregistered
    async fn get_user(&self, group_id: &str, user_id: &str) -> MarketResult<Option<UserProfile>>;

    /// Write a user's profile back to the store
    async fn store_user(
        &self,
        group_id: &str,
        user_id: &str,
        profile: &UserProfile,
    ) -> MarketResult<()>;

    /// Whether the plugin is enabled for the group
    async fn is_plugin_enabled(&self, group_id: &str) -> MarketResult<bool>;
}

/// Externally-owned user status checks
#[async_trait]
pub trait StatusOracle: Send + Sync {
    /// Whether the user is in the gender-surgery state lock
    async fn is_gender_surgery_active(&self, group_id: &str, user_id: &str) -> bool;

    /// Whether the user is currently working
    async fn is_user_working(&self, group_id: &str, user_id: &str) -> bool;
}

pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use tokio::sync::Mutex;

    type UserKey = (String, String);

    fn key(group_id: &str, user_id: &str) -> UserKey {
        (group_id.to_string(), user_id.to_string())
    }

    /// In-memory profile store for testing
    pub struct MemoryProfileStore {
        users: Mutex<HashMap<UserKey, UserProfile>>,
        enabled_groups: Mutex<HashSet<String>>,
        /// Users whose reads resolve to nothing (simulates a vanished seller)
        vanished: Mutex<HashSet<UserKey>>,
    }

    impl MemoryProfileStore {
        pub fn new() -> Self {
            Self {
                users: Mutex::new(HashMap::new()),
                enabled_groups: Mutex::new(HashSet::new()),
                vanished: Mutex::new(HashSet::new()),
            }
        }

        /// Register a user with the given profile
        pub async fn seed_user(&self, group_id: &str, user_id: &str, profile: UserProfile) {
            self.users.lock().await.insert(key(group_id, user_id), profile);
        }

        /// Inspect a user's stored profile
        pub async fn user(&self, group_id: &str, user_id: &str) -> Option<UserProfile> {
            self.users.lock().await.get(&key(group_id, user_id)).cloned()
        }

        pub async fn set_plugin_enabled(&self, group_id: &str, enabled: bool) {
            let mut groups = self.enabled_groups.lock().await;
            if enabled {
                groups.insert(group_id.to_string());
            } else {
                groups.remove(group_id);
            }
        }

        /// Make subsequent reads of this user resolve to nothing
        pub async fn vanish_user(&self, group_id: &str, user_id: &str) {
            self.vanished.lock().await.insert(key(group_id, user_id));
        }
    }

    impl Default for MemoryProfileStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryProfileStore {
        async fn get_user(
            &self,
            group_id: &str,
            user_id: &str,
        ) -> MarketResult<Option<UserProfile>> {
            if self.vanished.lock().await.contains(&key(group_id, user_id)) {
                return Ok(None);
            }
            Ok(self.users.lock().await.get(&key(group_id, user_id)).cloned())
        }

        async fn store_user(
            &self,
            group_id: &str,
            user_id: &str,
            profile: &UserProfile,
        ) -> MarketResult<()> {
            self.users
                .lock()
                .await
                .insert(key(group_id, user_id), profile.clone());
            Ok(())
        }

        async fn is_plugin_enabled(&self, group_id: &str) -> MarketResult<bool> {
            Ok(self.enabled_groups.lock().await.contains(group_id))
        }
    }

    /// Status oracle with settable flags
    pub struct StaticStatusOracle {
        surgery: Mutex<HashSet<UserKey>>,
        working: Mutex<HashSet<UserKey>>,
    }

    impl StaticStatusOracle {
        pub fn new() -> Self {
            Self {
                surgery: Mutex::new(HashSet::new()),
                working: Mutex::new(HashSet::new()),
            }
        }

        pub async fn set_gender_surgery(&self, group_id: &str, user_id: &str, active: bool) {
            let mut surgery = self.surgery.lock().await;
            if active {
                surgery.insert(key(group_id, user_id));
            } else {
                surgery.remove(&key(group_id, user_id));
            }
        }

        pub async fn set_working(&self, group_id: &str, user_id: &str, working: bool) {
            let mut set = self.working.lock().await;
            if working {
                set.insert(key(group_id, user_id));
            } else {
                set.remove(&key(group_id, user_id));
            }
        }
    }

    impl Default for StaticStatusOracle {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl StatusOracle for StaticStatusOracle {
        async fn is_gender_surgery_active(&self, group_id: &str, user_id: &str) -> bool {
            self.surgery.lock().await.contains(&key(group_id, user_id))
        }

        async fn is_user_working(&self, group_id: &str, user_id: &str) -> bool {
            self.working.lock().await.contains(&key(group_id, user_id))
        }
    }
}

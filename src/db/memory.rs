// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent hash maps.
//!
//! Provides:
//! - Users (keyed by ID, with unique e-mail and username indexes)
//! - Login ledgers (keyed by user ID and year)

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{LedgerStore, StoreError, UserStore};
use crate::models::{LoginActivity, StoredCredentials, User};

#[derive(Default)]
struct Inner {
    users: DashMap<Uuid, User>,
    /// Lower-cased e-mail -> user ID
    emails: DashMap<String, Uuid>,
    /// Lower-cased username -> user ID
    usernames: DashMap<String, Uuid>,
    ledgers: DashMap<(Uuid, i32), LoginActivity>,
    offline: AtomicBool,
}

/// Shared in-memory database. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that fails every operation.
    pub fn new_offline() -> Self {
        let db = Self::default();
        db.set_offline(true);
        db
    }

    /// Toggle offline mode. While offline all operations return `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Helper to fail fast when offline.
    fn check_online(&self) -> Result<&Inner, StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "Database not connected (offline mode)".to_string(),
            ));
        }
        Ok(&self.inner)
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn username_key(username: &str) -> String {
    username.trim().to_ascii_lowercase()
}

fn username_conflict() -> StoreError {
    StoreError::Conflict("A user with that username already exists.".to_string())
}

impl UserStore for MemoryDb {
    async fn lookup_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, StoreError> {
        let inner = self.check_online()?;
        let Some(user_id) = inner.emails.get(&email_key(email)).map(|id| *id) else {
            return Ok(None);
        };
        Ok(inner
            .users
            .get(&user_id)
            .map(|user| StoredCredentials::from(user.value())))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.check_online()?;
        let Some(user_id) = inner.usernames.get(&username_key(username)).map(|id| *id) else {
            return Ok(None);
        };
        Ok(inner.users.get(&user_id).map(|user| user.value().clone()))
    }

    async fn load_user_record(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.check_online()?;
        Ok(inner.users.get(&user_id).map(|user| user.value().clone()))
    }

    async fn save_user_record(&self, user: &User) -> Result<(), StoreError> {
        let inner = self.check_online()?;
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let inner = self.check_online()?;

        // Lock order is usernames, then emails, then users. The username slot
        // stays unclaimed if the e-mail is taken.
        let username_slot = match inner.usernames.entry(username_key(&user.username)) {
            Entry::Occupied(_) => return Err(username_conflict()),
            Entry::Vacant(slot) => slot,
        };

        match inner.emails.entry(email_key(&user.email)) {
            Entry::Occupied(_) => Err(StoreError::Conflict(
                "A user with that e-mail already exists.".to_string(),
            )),
            Entry::Vacant(email_slot) => {
                email_slot.insert(user.id);
                username_slot.insert(user.id);
                inner.users.insert(user.id, user.clone());
                Ok(())
            }
        }
    }

    async fn update_username(
        &self,
        user_id: Uuid,
        new_username: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.check_online()?;
        let Some(current) = inner.users.get(&user_id).map(|user| user.username.clone()) else {
            return Ok(None);
        };

        let old_key = username_key(&current);
        let new_key = username_key(new_username);
        if new_key != old_key {
            match inner.usernames.entry(new_key) {
                Entry::Occupied(_) => return Err(username_conflict()),
                Entry::Vacant(slot) => {
                    slot.insert(user_id);
                }
            }
            inner.usernames.remove(&old_key);
        }

        Ok(inner.users.get_mut(&user_id).map(|mut user| {
            user.username = new_username.to_string();
            user.clone()
        }))
    }
}

impl LedgerStore for MemoryDb {
    async fn load_ledger_entry(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> Result<Option<LoginActivity>, StoreError> {
        let inner = self.check_online()?;
        Ok(inner
            .ledgers
            .get(&(user_id, year))
            .map(|entry| entry.value().clone()))
    }

    async fn save_ledger_entry(&self, entry: &LoginActivity) -> Result<(), StoreError> {
        let inner = self.check_online()?;
        inner
            .ledgers
            .insert((entry.user_id, entry.year), entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;

    fn make_user(username: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            account_type: AccountType::Learner,
            login_streak: 0,
            last_login_date: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_email_is_case_insensitive() {
        let db = MemoryDb::new();
        let user = make_user("ada", "Ada@Example.com");
        db.insert_user(&user).await.unwrap();

        let creds = db
            .lookup_credentials("ada@example.com")
            .await
            .unwrap()
            .expect("credentials should be found");
        assert_eq!(creds.user_id, user.id);

        let by_name = db.find_by_username("ADA").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(db.find_by_username("grace").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let db = MemoryDb::new();
        db.insert_user(&make_user("ada", "ada@example.com"))
            .await
            .unwrap();

        let dup_email = db.insert_user(&make_user("grace", "ada@example.com")).await;
        assert!(matches!(dup_email, Err(StoreError::Conflict(_))));

        let dup_name = db.insert_user(&make_user("ADA", "other@example.com")).await;
        assert!(matches!(dup_name, Err(StoreError::Conflict(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_claim_username_once() {
        let db = MemoryDb::new();

        let mut handles = vec![];
        for i in 0..16 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.insert_user(&make_user("racer", &format!("racer{i}@example.com")))
                    .await
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => inserted += 1,
                Err(StoreError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(inserted, 1);

        // Losers left no e-mail claims behind
        let claimed = (0..16)
            .filter(|i| db.inner.emails.contains_key(&format!("racer{i}@example.com")))
            .count();
        assert_eq!(claimed, 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_releases_username() {
        let db = MemoryDb::new();
        db.insert_user(&make_user("ada", "ada@example.com"))
            .await
            .unwrap();

        let dup_email = db.insert_user(&make_user("grace", "ada@example.com")).await;
        assert!(matches!(dup_email, Err(StoreError::Conflict(_))));

        // "grace" was not left claimed by the failed insert
        db.insert_user(&make_user("grace", "grace@example.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_username_moves_index() {
        let db = MemoryDb::new();
        let ada = make_user("ada", "ada@example.com");
        db.insert_user(&ada).await.unwrap();
        db.insert_user(&make_user("grace", "grace@example.com"))
            .await
            .unwrap();

        let taken = db.update_username(ada.id, "Grace").await;
        assert!(matches!(taken, Err(StoreError::Conflict(_))));

        let updated = db.update_username(ada.id, "lovelace").await.unwrap().unwrap();
        assert_eq!(updated.username, "lovelace");
        assert!(db.find_by_username("ada").await.unwrap().is_none());
        assert_eq!(
            db.find_by_username("LOVELACE").await.unwrap().unwrap().id,
            ada.id
        );

        // Case-only change keeps the claim
        let recased = db.update_username(ada.id, "Lovelace").await.unwrap().unwrap();
        assert_eq!(recased.username, "Lovelace");

        assert!(db
            .update_username(Uuid::new_v4(), "nobody")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_offline_mode_fails_all_operations() {
        let db = MemoryDb::new_offline();
        assert!(matches!(
            db.load_user_record(Uuid::new_v4()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            db.load_ledger_entry(Uuid::new_v4(), 2024).await,
            Err(StoreError::Unavailable(_))
        ));

        db.set_offline(false);
        assert!(db.load_user_record(Uuid::new_v4()).await.unwrap().is_none());
    }
}

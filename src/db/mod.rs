// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer.
//!
//! The auth core only talks to storage through [`UserStore`] and
//! [`LedgerStore`]. [`MemoryDb`] implements both for the server binary and
//! tests.

pub mod memory;

pub use memory::MemoryDb;

use std::future::Future;
use uuid::Uuid;

use crate::models::{LoginActivity, StoredCredentials, User};

/// Storage failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// User records and credential lookup.
pub trait UserStore: Send + Sync + 'static {
    /// Find credential material by login e-mail.
    fn lookup_credentials(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<StoredCredentials>, StoreError>> + Send;

    /// Find a user by username, ignoring ASCII case.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Load a user record by ID.
    fn load_user_record(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Overwrite an existing user record.
    fn save_user_record(&self, user: &User) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Insert a new user, failing with `Conflict` on a duplicate e-mail or username.
    fn insert_user(&self, user: &User) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Rename a user, failing with `Conflict` if another user holds the name.
    /// Returns `None` when the user does not exist.
    fn update_username(
        &self,
        user_id: Uuid,
        new_username: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;
}

/// Per-user, per-year login ledgers.
pub trait LedgerStore: Send + Sync + 'static {
    fn load_ledger_entry(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> impl Future<Output = Result<Option<LoginActivity>, StoreError>> + Send;

    fn save_ledger_entry(
        &self,
        entry: &LoginActivity,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

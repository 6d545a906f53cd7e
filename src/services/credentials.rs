// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password credential checks.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use uuid::Uuid;

use crate::db::{StoreError, UserStore};
use crate::models::Principal;

/// Well-formed Argon2id hash that matches no password. Verified against when
/// the e-mail is unknown so both failure paths cost the same.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Credential check failure.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Unknown e-mail or wrong password. The two are deliberately not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Password hash primitive.
pub trait PasswordHashing: Send + Sync + 'static {
    fn hash_password(&self, plain: &str) -> Result<String, CredentialError>;

    /// `false` for a mismatch and for an unparseable hash.
    fn verify_password(&self, plain: &str, hash: &str) -> bool;
}

/// Argon2id with default parameters.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hashing;

impl PasswordHashing for Argon2Hashing {
    fn hash_password(&self, plain: &str) -> Result<String, CredentialError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;

        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    fn verify_password(&self, plain: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Checks submitted passwords against stored hashes.
#[derive(Clone)]
pub struct CredentialVerifier<S, H> {
    store: S,
    hasher: H,
}

impl<S: UserStore, H: PasswordHashing> CredentialVerifier<S, H> {
    pub fn new(store: S, hasher: H) -> Self {
        Self { store, hasher }
    }

    /// Resolve an e-mail/password pair to a principal.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Principal, CredentialError> {
        let stored = self.store.lookup_credentials(email.trim()).await?;

        match stored {
            Some(creds) if self.hasher.verify_password(password, &creds.password_hash) => {
                Ok(Principal {
                    user_id: creds.user_id.to_string(),
                    user_email: creds.email,
                    account_type: creds.account_type,
                })
            }
            Some(_) => Err(CredentialError::InvalidCredentials),
            None => {
                let _ = self.hasher.verify_password(password, DUMMY_PASSWORD_HASH);
                Err(CredentialError::InvalidCredentials)
            }
        }
    }

    /// Hash a new password for storage.
    pub fn hash_password(&self, plain: &str) -> Result<String, CredentialError> {
        self.hasher.hash_password(plain)
    }

    /// Replace a user's password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), CredentialError> {
        let mut user = self
            .store
            .load_user_record(user_id)
            .await?
            .ok_or(CredentialError::InvalidCredentials)?;

        if !self.hasher.verify_password(old_password, &user.password_hash) {
            return Err(CredentialError::InvalidCredentials);
        }

        user.password_hash = self.hasher.hash_password(new_password)?;
        self.store.save_user_record(&user).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

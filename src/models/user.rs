// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Marketplace account kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AccountType {
    Learner,
    Instructor,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Learner => "Learner",
            AccountType::Instructor => "Instructor",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown account type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Account type must be either Learner or Instructor")]
pub struct UnknownAccountType;

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    /// Case-insensitive, matching what clients historically sent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("learner") {
            Ok(AccountType::Learner)
        } else if s.eq_ignore_ascii_case("instructor") {
            Ok(AccountType::Instructor)
        } else {
            Err(UnknownAccountType)
        }
    }
}

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (also the storage key)
    pub id: Uuid,
    /// Unique display name
    pub username: String,
    /// Unique login e-mail
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub account_type: AccountType,
    /// Consecutive calendar days with at least one authenticated request
    #[serde(default)]
    pub login_streak: u32,
    /// Last calendar day (UTC) counted toward the streak
    #[serde(default)]
    pub last_login_date: Option<NaiveDate>,
    /// When the account was registered (RFC 3339)
    pub created_at: String,
}

/// Credential material returned by a lookup by e-mail.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub account_type: AccountType,
    pub password_hash: String,
}

impl From<&User> for StoredCredentials {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            account_type: user.account_type,
            password_hash: user.password_hash.clone(),
        }
    }
}

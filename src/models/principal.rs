// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolved caller identity.

use crate::models::AccountType;
use crate::services::token::ClaimSet;

/// Authenticated caller, attached to the request extensions by the session
/// gate and read by handlers via `Extension<Principal>`.
///
/// Lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// String form of the user's UUID, as carried in the token
    pub user_id: String,
    pub user_email: String,
    pub account_type: AccountType,
}

impl From<&ClaimSet> for Principal {
    fn from(claims: &ClaimSet) -> Self {
        Self {
            user_id: claims.user_id.clone(),
            user_email: claims.sub.clone(),
            account_type: claims.account_type,
        }
    }
}

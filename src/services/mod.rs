// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod credentials;
pub mod ledger;
pub mod token;

pub use activity::{ActivityLocks, ActivityRecorder, RecordOutcome, StreakUpdate};
pub use credentials::{Argon2Hashing, CredentialError, CredentialVerifier, PasswordHashing};
pub use ledger::{ActivityLedger, LedgerError};
pub use token::{ClaimSet, TokenCodec, TokenError, TokenType};

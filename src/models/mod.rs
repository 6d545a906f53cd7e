// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod login_activity;
pub mod principal;
pub mod user;

pub use login_activity::LoginActivity;
pub use principal::Principal;
pub use user::{AccountType, StoredCredentials, User};

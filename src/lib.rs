// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coursegate: stateless session authentication for a course marketplace.
//!
//! This crate provides the backend auth core: signed access/refresh tokens,
//! a request gate with silent access token renewal, password login, and a
//! per-user login-day ledger with streak tracking.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use dashmap::DashMap;
use db::MemoryDb;
use services::{ActivityRecorder, Argon2Hashing, CredentialVerifier, TokenCodec};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: MemoryDb,
    pub token_codec: TokenCodec,
    pub credentials: CredentialVerifier<MemoryDb, Argon2Hashing>,
    pub activity_recorder: ActivityRecorder<MemoryDb>,
}

impl AppState {
    /// Wire the services over one shared store.
    pub fn new(config: Config, db: MemoryDb) -> Self {
        let token_codec = TokenCodec::from_config(&config);
        let credentials = CredentialVerifier::new(db.clone(), Argon2Hashing);
        let activity_recorder = ActivityRecorder::new(db.clone(), Arc::new(DashMap::new()));

        Self {
            config,
            db,
            token_codec,
            credentials,
            activity_recorder,
        }
    }
}

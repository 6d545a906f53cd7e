// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (session gate, activity recording, cookies).

pub mod activity;
pub mod auth;
pub mod cookies;

pub use activity::record_activity;
pub use auth::{require_principal, session_gate};

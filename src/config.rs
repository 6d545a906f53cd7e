// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Token lifetimes and cookie attributes are read once at startup; the
//! signing key never leaves process memory.

use axum::http::HeaderName;
use std::env;
use std::str::FromStr;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "REFRESH_TOKEN";

/// Response header (`Refreshed-Token`) carrying a silently renewed access token.
pub const REFRESHED_TOKEN_HEADER: HeaderName = HeaderName::from_static("refreshed-token");

const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds (also the refresh cookie max-age)
    pub refresh_token_ttl_secs: i64,
    /// Whether the refresh cookie is only sent over HTTPS
    pub refresh_cookie_secure: bool,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            access_token_ttl_secs: parse_var(
                "ACCESS_TOKEN_TTL_SECS",
                DEFAULT_ACCESS_TOKEN_TTL_SECS,
            )?,
            refresh_token_ttl_secs: parse_var(
                "REFRESH_TOKEN_TTL_SECS",
                DEFAULT_REFRESH_TOKEN_TTL_SECS,
            )?,
            refresh_cookie_secure: parse_var("REFRESH_COOKIE_SECURE", true)?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        };

        config.validate()?;

        if !config.refresh_cookie_secure {
            tracing::warn!(
                "Refresh token cookie will be sent over both HTTP and HTTPS (REFRESH_COOKIE_SECURE=false)"
            );
        }

        Ok(config)
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            refresh_cookie_secure: false,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Check cross-field invariants.
    ///
    /// Refresh tokens must outlive access tokens, otherwise silent renewal
    /// can never succeed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_signing_key.is_empty() {
            return Err(ConfigError::Invalid(
                "JWT_SIGNING_KEY must not be empty".to_string(),
            ));
        }
        if self.access_token_ttl_secs < 0 {
            return Err(ConfigError::Invalid(
                "ACCESS_TOKEN_TTL_SECS must not be negative".to_string(),
            ));
        }
        if self.refresh_token_ttl_secs <= self.access_token_ttl_secs {
            return Err(ConfigError::Invalid(format!(
                "REFRESH_TOKEN_TTL_SECS ({}) must be greater than ACCESS_TOKEN_TTL_SECS ({})",
                self.refresh_token_ttl_secs, self.access_token_ttl_secs
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

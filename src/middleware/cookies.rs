// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh token cookie helpers.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::config::{Config, REFRESH_COOKIE_NAME};

/// Create the refresh token cookie issued at login.
pub fn refresh_cookie(config: &Config, token: &str) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, token.to_string()))
        .http_only(true)
        .secure(config.refresh_cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(config.refresh_token_ttl_secs))
        .build()
}

/// Create the removal cookie sent at logout.
///
/// Keeps the attributes of [`refresh_cookie`] so browsers match and drop it.
pub fn clear_refresh_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, ""))
        .http_only(true)
        .secure(config.refresh_cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Get the refresh token from cookies. An empty value counts as absent.
pub fn refresh_token_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().trim().to_string())
        .filter(|value| !value.is_empty())
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session gate: JWT authentication with silent access token renewal.
//!
//! Runs once per request. A valid bearer access token authenticates the
//! request. An expired or absent one falls back to the refresh cookie, and a
//! fresh access token is returned in the `Refreshed-Token` header. Missing
//! credentials never reject here; only a present-but-broken access token does.

use crate::config::REFRESHED_TOKEN_HEADER;
use crate::error::AppError;
use crate::middleware::cookies::refresh_token_from_jar;
use crate::models::Principal;
use crate::services::token::{ClaimSet, TokenCodec, TokenError, TokenType};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Credential state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    NoCredentials,
    AccessValid,
    AccessExpiredRefreshValid,
    AccessExpiredNoRefresh,
    AccessInvalid(TokenError),
}

/// Outcome of evaluating a request's credentials.
#[derive(Debug, Clone)]
pub struct GateDecision {
    pub state: GateState,
    /// Identity for this request, from the access token or, after renewal,
    /// from the refresh token.
    pub claims: Option<ClaimSet>,
    pub renewed_access_token: Option<String>,
}

impl GateDecision {
    fn unauthenticated(state: GateState) -> Self {
        Self {
            state,
            claims: None,
            renewed_access_token: None,
        }
    }

    pub fn principal(&self) -> Option<Principal> {
        self.claims.as_ref().map(Principal::from)
    }
}

/// Classify the presented credentials and mint a renewed access token when
/// the refresh token allows it.
pub fn evaluate(
    codec: &TokenCodec,
    bearer: Option<&str>,
    refresh: Option<&str>,
) -> anyhow::Result<GateDecision> {
    let access_expired = match bearer {
        Some(token) => match codec.verify_as(token, TokenType::Access) {
            Ok(claims) => {
                return Ok(GateDecision {
                    state: GateState::AccessValid,
                    claims: Some(claims),
                    renewed_access_token: None,
                })
            }
            Err(TokenError::Expired) => true,
            Err(kind) => {
                return Ok(GateDecision::unauthenticated(GateState::AccessInvalid(
                    kind,
                )))
            }
        },
        None => false,
    };

    let refresh_claims = refresh.and_then(|token| {
        codec
            .verify_as(token, TokenType::Refresh)
            .inspect_err(|kind| tracing::debug!(error = %kind, "Ignoring unusable refresh token"))
            .ok()
    });

    let Some(claims) = refresh_claims else {
        let state = if access_expired {
            GateState::AccessExpiredNoRefresh
        } else {
            GateState::NoCredentials
        };
        return Ok(GateDecision::unauthenticated(state));
    };

    let renewed = codec.issue(
        &claims.sub,
        &claims.user_id,
        claims.account_type,
        TokenType::Access,
    )?;

    Ok(GateDecision {
        state: GateState::AccessExpiredRefreshValid,
        claims: Some(claims),
        renewed_access_token: Some(renewed),
    })
}

/// Extract the bearer token. A non-Bearer or empty value counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that authenticates the request if credentials allow it.
///
/// Attaches a [`Principal`] extension on success. Requests that already
/// carry one are passed through untouched.
pub async fn session_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.extensions().get::<Principal>().is_some() {
        return Ok(next.run(request).await);
    }

    let refresh = refresh_token_from_jar(&jar);
    let decision = evaluate(
        &state.token_codec,
        bearer_token(request.headers()),
        refresh.as_deref(),
    )?;

    if let GateState::AccessInvalid(kind) = decision.state {
        tracing::warn!(
            error = %kind,
            path = %request.uri().path(),
            "Rejected invalid access token"
        );
        return Err(AppError::InvalidToken(kind));
    }

    if let Some(principal) = decision.principal() {
        request.extensions_mut().insert(principal);
    }

    let mut response = next.run(request).await;

    if let (Some(token), Some(claims)) = (&decision.renewed_access_token, &decision.claims) {
        tracing::info!(
            user_id = %claims.user_id,
            "Access token renewed from refresh cookie"
        );
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| anyhow::anyhow!("Invalid renewed token header: {e}"))?;
        response.headers_mut().insert(REFRESHED_TOKEN_HEADER, value);
    }

    Ok(response)
}

/// Middleware for the protected partition: rejects requests the session gate
/// did not authenticate.
pub async fn require_principal(request: Request, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<Principal>().is_none() {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed session tokens.
//!
//! Access and refresh tokens are HS256 JWTs carrying the same claim set and
//! differing only in `tokenType` and lifetime. Nothing is stored server-side.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::AccountType;

/// Which kind of token a claim set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Access,
    Refresh,
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSet {
    /// Subject (user e-mail)
    pub sub: String,
    /// String form of the user's UUID
    pub user_id: String,
    pub account_type: AccountType,
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl ClaimSet {
    /// Why this claim set is expired at `now`, if it is.
    pub fn expiry_reason(&self, now: i64) -> Option<String> {
        if self.exp <= now {
            Some(format!(
                "{:?} token expired {} second(s) ago",
                self.token_type,
                now - self.exp
            ))
        } else {
            None
        }
    }
}

/// Token verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token is malformed")]
    Malformed,

    #[error("token type or algorithm is not supported")]
    UnsupportedType,

    #[error("token is empty")]
    InvalidArgument,
}

impl From<&JwtError> for TokenError {
    fn from(err: &JwtError) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => TokenError::UnsupportedType,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenCodec {
    pub fn new(signing_key: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_signing_key,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        )
    }

    /// Lifetime in seconds for a token type.
    pub fn ttl(&self, token_type: TokenType) -> i64 {
        match token_type {
            TokenType::Access => self.access_ttl_secs,
            TokenType::Refresh => self.refresh_ttl_secs,
        }
    }

    /// Issue a token valid from now for `ttl(token_type)` seconds.
    pub fn issue(
        &self,
        subject: &str,
        user_id: &str,
        account_type: AccountType,
        token_type: TokenType,
    ) -> anyhow::Result<String> {
        self.issue_at(subject, user_id, account_type, token_type, now_unix())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        subject: &str,
        user_id: &str,
        account_type: AccountType,
        token_type: TokenType,
        issued_at: i64,
    ) -> anyhow::Result<String> {
        let claims = ClaimSet {
            sub: subject.to_string(),
            user_id: user_id.to_string(),
            account_type,
            token_type,
            iat: issued_at,
            exp: issued_at + self.ttl(token_type),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Check signature and expiry, returning the claim set.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let claims = self.decode_signed(token)?;
        if claims.expiry_reason(now_unix()).is_some() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Like [`verify`](Self::verify), additionally requiring a token type.
    pub fn verify_as(&self, token: &str, expected: TokenType) -> Result<ClaimSet, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(TokenError::UnsupportedType);
        }
        Ok(claims)
    }

    /// Reason the token is unusable because of its age, or because it could
    /// not be decoded at all. `None` means it is signed and still current.
    pub fn is_expired(&self, token: &str) -> Option<String> {
        match self.decode_signed(token) {
            Ok(claims) => claims.expiry_reason(now_unix()),
            Err(e) => Some(format!("token could not be decoded: {e}")),
        }
    }

    /// Verify the signature and decode, without enforcing expiry.
    fn decode_signed(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::InvalidArgument);
        }

        // Expiry is checked by the caller with zero leeway so that `exp == now`
        // already counts as expired.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<ClaimSet>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match TokenError::from(&e) {
                // A signature that cannot be an HS256 MAC means the token was
                // cut or mangled, not signed with another key.
                TokenError::BadSignature if !has_hs256_mac(token) => TokenError::Malformed,
                kind => kind,
            })
    }
}

/// Byte length of an HMAC-SHA256 tag.
const HS256_MAC_LEN: usize = 32;

fn has_hs256_mac(token: &str) -> bool {
    token
        .rsplit('.')
        .next()
        .and_then(|signature| URL_SAFE_NO_PAD.decode(signature).ok())
        .is_some_and(|mac| mac.len() == HS256_MAC_LEN)
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

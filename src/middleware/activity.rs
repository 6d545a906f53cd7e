// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login activity recording for authenticated requests.

use crate::models::Principal;
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Marker extension set once the recorder has run for a request.
#[derive(Debug, Clone, Copy)]
pub struct ActivityRecorded;

/// Middleware that records today's activity for the attached principal.
///
/// Store failures are logged and never fail the request.
pub async fn record_activity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<ActivityRecorded>().is_some() {
        return next.run(request).await;
    }

    if let Some(principal) = request.extensions().get::<Principal>().cloned() {
        if let Err(e) = state
            .activity_recorder
            .record(&principal, today_utc())
            .await
        {
            tracing::warn!(
                user_id = %principal.user_id,
                error = %e,
                "Failed to record login activity"
            );
        }
        request.extensions_mut().insert(ActivityRecorded);
    }

    next.run(request).await
}
